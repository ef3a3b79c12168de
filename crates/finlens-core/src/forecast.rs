//! Forecast post-processing: direction split over closing prices and chart
//! series assembly.

use crate::error::ForecastError;
use crate::model::ForecastMetrics;
use crate::model::ForecastSeries;
use crate::model::PriceSeries;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DirectionSplit {
    pub up_percent: u8,
    pub down_percent: u8,
}

/// Share of day-over-day rises across consecutive closes. `None` with fewer
/// than two points.
pub fn direction_split(closes: &PriceSeries) -> Option<DirectionSplit> {
    if closes.len() < 2 {
        return None;
    }
    let values: Vec<f64> = closes.values().collect();
    let steps = values.len() - 1;
    let ups = values.windows(2).filter(|pair| pair[1] > pair[0]).count();
    let up_percent = (100.0 * ups as f64 / steps as f64).round() as u8;
    Some(DirectionSplit {
        up_percent,
        down_percent: 100 - up_percent,
    })
}

pub fn merge_direction(metrics: &mut ForecastMetrics, forecast: &ForecastSeries) {
    if let Some(split) = forecast.close.as_ref().and_then(direction_split) {
        metrics.up_percent = Some(split.up_percent);
        metrics.down_percent = Some(split.down_percent);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeriesField {
    Open,
    High,
    Close,
}

impl SeriesField {
    pub const ALL: [SeriesField; 3] = [Self::Open, Self::High, Self::Close];

    pub fn label(self) -> &'static str {
        match self {
            Self::Open => "Open",
            Self::High => "High",
            Self::Close => "Close",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChartSeries {
    pub field: SeriesField,
    pub points: Vec<f64>,
}

/// Open/High/Close aligned on the Open date keys.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartData {
    pub labels: Vec<String>,
    pub series: Vec<ChartSeries>,
}

impl ChartData {
    pub fn from_forecast(forecast: &ForecastSeries) -> Result<Self, ForecastError> {
        let open = forecast
            .open
            .as_ref()
            .ok_or(ForecastError::MissingSeries("Open"))?;
        let high = forecast
            .high
            .as_ref()
            .ok_or(ForecastError::MissingSeries("High"))?;
        let close = forecast
            .close
            .as_ref()
            .ok_or(ForecastError::MissingSeries("Close"))?;

        ensure_aligned(open, high, "High")?;
        ensure_aligned(open, close, "Close")?;

        Ok(Self {
            labels: open.dates().map(str::to_string).collect(),
            series: vec![
                ChartSeries {
                    field: SeriesField::Open,
                    points: open.values().collect(),
                },
                ChartSeries {
                    field: SeriesField::High,
                    points: high.values().collect(),
                },
                ChartSeries {
                    field: SeriesField::Close,
                    points: close.values().collect(),
                },
            ],
        })
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Min and max across every series, `None` when there are no points.
    pub fn bounds(&self) -> Option<(f64, f64)> {
        self.series
            .iter()
            .flat_map(|s| s.points.iter().copied())
            .fold(None, |acc, value| match acc {
                None => Some((value, value)),
                Some((lo, hi)) => Some((lo.min(value), hi.max(value))),
            })
    }
}

fn ensure_aligned(
    open: &PriceSeries,
    other: &PriceSeries,
    field: &'static str,
) -> Result<(), ForecastError> {
    let mut left = open.dates();
    let mut right = other.dates();
    let mut position = 0;
    loop {
        match (left.next(), right.next()) {
            (None, None) => return Ok(()),
            (Some(a), Some(b)) if a == b => position += 1,
            _ => return Err(ForecastError::SeriesMismatch { field, position }),
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn series(points: &[(&str, f64)]) -> PriceSeries {
        PriceSeries::new(
            points
                .iter()
                .map(|(date, value)| (date.to_string(), *value))
                .collect(),
        )
    }

    fn forecast(open: PriceSeries, high: PriceSeries, close: PriceSeries) -> ForecastSeries {
        ForecastSeries {
            open: Some(open),
            high: Some(high),
            close: Some(close),
            ..ForecastSeries::default()
        }
    }

    #[test]
    fn split_counts_rises_between_consecutive_closes() {
        let closes = series(&[("d1", 10.0), ("d2", 12.0), ("d3", 11.0)]);
        assert_eq!(
            direction_split(&closes),
            Some(DirectionSplit {
                up_percent: 50,
                down_percent: 50
            })
        );
    }

    #[test]
    fn split_treats_flat_days_as_not_up() {
        let closes = series(&[("d1", 5.0), ("d2", 5.0), ("d3", 6.0), ("d4", 7.0)]);
        assert_eq!(
            direction_split(&closes),
            Some(DirectionSplit {
                up_percent: 67,
                down_percent: 33
            })
        );
    }

    #[test]
    fn split_is_skipped_below_two_points() {
        assert_eq!(direction_split(&series(&[])), None);
        assert_eq!(direction_split(&series(&[("d1", 1.0)])), None);
    }

    #[test]
    fn merge_direction_leaves_metrics_untouched_without_close() {
        let mut metrics = ForecastMetrics::default();
        merge_direction(&mut metrics, &ForecastSeries::default());
        assert_eq!(metrics.up_percent, None);
        assert_eq!(metrics.down_percent, None);
    }

    #[test]
    fn chart_uses_open_dates_as_labels() {
        let dates = [("2024-05-01", 1.0), ("2024-05-02", 2.0)];
        let chart = ChartData::from_forecast(&forecast(
            series(&dates),
            series(&[("2024-05-01", 3.0), ("2024-05-02", 4.0)]),
            series(&[("2024-05-01", 1.5), ("2024-05-02", 0.5)]),
        ))
        .expect("aligned series");
        assert_eq!(chart.labels, vec!["2024-05-01", "2024-05-02"]);
        assert_eq!(chart.series.len(), 3);
        assert_eq!(chart.series[1].points, vec![3.0, 4.0]);
        assert_eq!(chart.bounds(), Some((0.5, 4.0)));
    }

    #[test]
    fn chart_rejects_misaligned_dates() {
        let err = ChartData::from_forecast(&forecast(
            series(&[("d1", 1.0), ("d2", 2.0)]),
            series(&[("d1", 1.0), ("d2", 2.0)]),
            series(&[("d2", 1.0), ("d1", 2.0)]),
        ))
        .expect_err("reordered close dates");
        assert_eq!(
            err,
            ForecastError::SeriesMismatch {
                field: "Close",
                position: 0
            }
        );
    }

    #[test]
    fn chart_rejects_shorter_series() {
        let err = ChartData::from_forecast(&forecast(
            series(&[("d1", 1.0), ("d2", 2.0)]),
            series(&[("d1", 1.0)]),
            series(&[("d1", 1.0), ("d2", 2.0)]),
        ))
        .expect_err("short high series");
        assert_eq!(
            err,
            ForecastError::SeriesMismatch {
                field: "High",
                position: 1
            }
        );
    }

    #[test]
    fn chart_requires_all_three_series() {
        let partial = ForecastSeries {
            open: Some(series(&[("d1", 1.0)])),
            ..ForecastSeries::default()
        };
        assert_eq!(
            ChartData::from_forecast(&partial),
            Err(ForecastError::MissingSeries("High"))
        );
    }
}
