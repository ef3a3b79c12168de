//! Text building blocks shared by the dashboard and the one-shot commands.

use finlens_core::forecast::ChartData;
use finlens_core::history::preview;
use finlens_core::model::ForecastMetrics;
use finlens_core::model::MetricValue;
use finlens_core::model::QueryRecord;
use finlens_core::render::render;
use finlens_core::render::to_plain_text;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Neutral,
    Positive,
    Negative,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CardLine {
    pub text: String,
    pub tone: Tone,
}

impl CardLine {
    fn neutral(text: String) -> Self {
        Self {
            text,
            tone: Tone::Neutral,
        }
    }

    fn toned(text: String, tone: Tone) -> Self {
        Self { text, tone }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MetricCard {
    pub title: &'static str,
    pub lines: Vec<CardLine>,
}

/// Whole numbers print bare, fractions with at most two decimals.
pub fn format_number(value: Option<f64>) -> String {
    match value {
        None => "-".to_string(),
        Some(v) if v.fract() == 0.0 && v.abs() < 1e15 => format!("{}", v as i64),
        Some(v) => {
            let text = format!("{v:.2}");
            text.trim_end_matches('0').trim_end_matches('.').to_string()
        }
    }
}

/// Numeric metrics (including numeric strings) go through `format_number`;
/// anything else is shown as its rendered text on one line.
pub fn format_metric(value: Option<&MetricValue>) -> String {
    let Some(value) = value else {
        return "-".to_string();
    };
    if let Some(number) = value.as_f64() {
        return format_number(Some(number));
    }
    let text = match value {
        MetricValue::Other(raw) => to_plain_text(&render(raw)),
        MetricValue::Number(number) => number.to_string(),
    };
    let joined = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("; ");
    if joined.is_empty() {
        "-".to_string()
    } else {
        joined
    }
}

pub fn metric_cards(metrics: &ForecastMetrics) -> Vec<MetricCard> {
    let sentiment = metrics.news_sentiment.clone().unwrap_or_default();
    let confidence_tone = match sentiment.confidence.as_ref().and_then(MetricValue::as_f64) {
        Some(c) if c >= 0.5 => Tone::Positive,
        Some(_) => Tone::Negative,
        None => Tone::Neutral,
    };
    let probability = metrics.trend_probability.clone().unwrap_or_default();
    let trend = metrics.forecast_trend.clone().unwrap_or_default();
    let trend_share = trend
        .up_share_percent()
        .map(|share| format!("({share:.1}%)"))
        .unwrap_or_else(|| "(n/a)".to_string());

    let mut cards = vec![
        MetricCard {
            title: "News Sentiment",
            lines: vec![
                CardLine::neutral(format!(
                    "Sentiment: {}",
                    format_metric(sentiment.sentiment.as_ref())
                )),
                CardLine::toned(
                    format!("Confidence: {}", format_metric(sentiment.confidence.as_ref())),
                    confidence_tone,
                ),
            ],
        },
        MetricCard {
            title: "Reason",
            lines: vec![CardLine::neutral(format!(
                "Reason: {}",
                format_metric(sentiment.reason.as_ref())
            ))],
        },
        MetricCard {
            title: "Model Accuracy",
            lines: vec![
                CardLine::neutral(format!("Accuracy: {}%", format_metric(metrics.accuracy.as_ref()))),
                CardLine::neutral(format!("Precision: {}%", format_metric(metrics.precision.as_ref()))),
                CardLine::neutral(format!("Recall: {}%", format_metric(metrics.recall.as_ref()))),
            ],
        },
        MetricCard {
            title: "Up and Down Probability",
            lines: vec![
                CardLine::toned(
                    format!("▲ : {}%", format_metric(probability.up.as_ref())),
                    Tone::Positive,
                ),
                CardLine::toned(
                    format!("▼ : {}%", format_metric(probability.down.as_ref())),
                    Tone::Negative,
                ),
            ],
        },
        MetricCard {
            title: "Forecast Trend",
            lines: vec![
                CardLine::neutral(format!(
                    "Up Days: {}/{}",
                    format_metric(trend.up_days.as_ref()),
                    format_metric(trend.total_days.as_ref())
                )),
                CardLine::neutral(trend_share),
            ],
        },
    ];

    if let (Some(up), Some(down)) = (metrics.up_percent, metrics.down_percent) {
        cards.push(MetricCard {
            title: "Derived Direction",
            lines: vec![
                CardLine::toned(format!("Up: {up}%"), Tone::Positive),
                CardLine::toned(format!("Down: {down}%"), Tone::Negative),
            ],
        });
    }
    cards
}

/// Numbered previews, one record per line.
pub fn history_listing(records: &[QueryRecord]) -> String {
    let mut out = String::new();
    for (idx, record) in records.iter().enumerate() {
        out.push_str(&format!(
            "{:>3}. [{}] {}\n",
            idx + 1,
            record.id,
            preview(&record.user_query)
        ));
    }
    out
}

pub fn forecast_report(title: &str, chart: &ChartData, metrics: &ForecastMetrics) -> String {
    let mut out = format!("{title}\n\n");
    for card in metric_cards(metrics) {
        out.push_str(card.title);
        out.push('\n');
        for line in card.lines {
            out.push_str("  ");
            out.push_str(&line.text);
            out.push('\n');
        }
    }

    out.push('\n');
    let mut header = format!("{:<12}", "Date");
    for series in &chart.series {
        header.push_str(&format!("{:>12}", series.field.label()));
    }
    out.push_str(header.trim_end());
    out.push('\n');
    for (row, label) in chart.labels.iter().enumerate() {
        let mut line = format!("{label:<12}");
        for series in &chart.series {
            let value = series.points.get(row).copied().unwrap_or(f64::NAN);
            line.push_str(&format!("{value:>12.2}"));
        }
        out.push_str(&line);
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use finlens_core::model::ForecastTrend;
    use finlens_core::model::NewsSentiment;
    use finlens_core::model::RecordId;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    fn card<'a>(cards: &'a [MetricCard], title: &str) -> &'a MetricCard {
        cards
            .iter()
            .find(|card| card.title == title)
            .expect("card present")
    }

    #[test]
    fn numbers_drop_needless_decimals() {
        assert_eq!(format_number(Some(80.0)), "80");
        assert_eq!(format_number(Some(71.25)), "71.25");
        assert_eq!(format_number(Some(0.8)), "0.8");
        assert_eq!(format_number(None), "-");
    }

    #[test]
    fn confidence_tone_flips_at_one_half() {
        let mut metrics = ForecastMetrics {
            news_sentiment: Some(NewsSentiment {
                sentiment: Some("positive".into()),
                confidence: Some(0.5.into()),
                reason: None,
            }),
            ..ForecastMetrics::default()
        };
        let cards = metric_cards(&metrics);
        assert_eq!(card(&cards, "News Sentiment").lines[1].tone, Tone::Positive);

        if let Some(sentiment) = metrics.news_sentiment.as_mut() {
            sentiment.confidence = Some(0.49.into());
        }
        let cards = metric_cards(&metrics);
        assert_eq!(card(&cards, "News Sentiment").lines[1].tone, Tone::Negative);
    }

    #[test]
    fn trend_share_is_guarded_and_one_decimal() {
        let metrics = ForecastMetrics {
            forecast_trend: Some(ForecastTrend {
                up_days: Some(2.0.into()),
                total_days: Some(3.0.into()),
            }),
            ..ForecastMetrics::default()
        };
        let cards = metric_cards(&metrics);
        let trend = card(&cards, "Forecast Trend");
        assert_eq!(trend.lines[0].text, "Up Days: 2/3");
        assert_eq!(trend.lines[1].text, "(66.7%)");

        let cards = metric_cards(&ForecastMetrics::default());
        assert_eq!(card(&cards, "Forecast Trend").lines[1].text, "(n/a)");
    }

    #[test]
    fn metrics_of_other_types_are_shown_as_sent() {
        let metrics: ForecastMetrics = serde_json::from_value(json!({
            "accuracy": "85.30",
            "recall": { "macro": 0.7, "weighted": 0.75 },
            "news_sentiment": { "sentiment": "mixed", "confidence": "high", "reason": null }
        }))
        .expect("metrics");
        let cards = metric_cards(&metrics);

        let accuracy = card(&cards, "Model Accuracy");
        assert_eq!(accuracy.lines[0].text, "Accuracy: 85.3%");
        assert_eq!(accuracy.lines[2].text, "Recall: Macro: 0.7; Weighted: 0.75%");

        let sentiment = card(&cards, "News Sentiment");
        assert_eq!(sentiment.lines[0].text, "Sentiment: mixed");
        assert_eq!(sentiment.lines[1].text, "Confidence: high");
        assert_eq!(sentiment.lines[1].tone, Tone::Neutral);
        assert_eq!(card(&cards, "Reason").lines[0].text, "Reason: -");
    }

    #[test]
    fn derived_direction_only_when_computed() {
        assert!(metric_cards(&ForecastMetrics::default())
            .iter()
            .all(|card| card.title != "Derived Direction"));

        let metrics = ForecastMetrics {
            up_percent: Some(67),
            down_percent: Some(33),
            ..ForecastMetrics::default()
        };
        let cards = metric_cards(&metrics);
        assert_eq!(
            card(&cards, "Derived Direction")
                .lines
                .iter()
                .map(|line| line.text.as_str())
                .collect::<Vec<_>>(),
            vec!["Up: 67%", "Down: 33%"]
        );
    }

    #[test]
    fn history_listing_numbers_and_truncates() {
        let long = vec!["word"; 30].join(" ");
        let records = vec![
            QueryRecord {
                id: RecordId::Number(7),
                user_query: "short one".to_string(),
                ai_response: json!(null),
            },
            QueryRecord {
                id: RecordId::Text("b2".to_string()),
                user_query: long,
                ai_response: json!(null),
            },
        ];
        let listing = history_listing(&records);
        let lines: Vec<&str> = listing.lines().collect();
        assert_eq!(lines[0], "  1. [7] short one");
        assert!(lines[1].starts_with("  2. [b2] word word"));
        assert!(lines[1].ends_with("word..."));
    }
}
