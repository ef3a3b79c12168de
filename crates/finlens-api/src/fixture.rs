use std::sync::Mutex;

use chrono::Days;
use chrono::NaiveDate;
use finlens_core::model::ForecastMetrics;
use finlens_core::model::ForecastQuery;
use finlens_core::model::ForecastResponse;
use finlens_core::model::ForecastSeries;
use finlens_core::model::ForecastTrend;
use finlens_core::model::MetricValue;
use finlens_core::model::NewsSentiment;
use finlens_core::model::PriceSeries;
use finlens_core::model::QueryRecord;
use finlens_core::model::RecordId;
use finlens_core::model::TrendProbability;
use serde_json::json;
use serde_json::Value;

use crate::client::FinancialApi;
use crate::contracts::FORECAST_PATH;
use crate::contracts::HISTORY_PATH;
use crate::contracts::QUERY_PATH;
use crate::error::ApiError;

const SERIES_START: (i32, u32, u32) = (2024, 1, 1);

/// Synthetic series stop here however many days are requested.
pub const MAX_SYNTHETIC_DAYS: u64 = 366;

/// Deterministic in-process backend for `--offline` runs and tests. Submitted
/// queries are appended to the history like the real service stores them.
#[derive(Debug)]
pub struct FixtureFinancialApi {
    records: Mutex<Vec<QueryRecord>>,
    outage: bool,
}

impl Default for FixtureFinancialApi {
    fn default() -> Self {
        Self::with_records(sample_records())
    }
}

impl FixtureFinancialApi {
    pub fn with_records(records: Vec<QueryRecord>) -> Self {
        Self {
            records: Mutex::new(records),
            outage: false,
        }
    }

    /// Every call fails with HTTP 503.
    pub fn unavailable() -> Self {
        Self {
            records: Mutex::new(Vec::new()),
            outage: true,
        }
    }

    fn check(&self, path: &str) -> Result<(), ApiError> {
        if self.outage {
            return Err(ApiError::Status {
                status: 503,
                path: path.to_string(),
            });
        }
        Ok(())
    }

    fn records(&self) -> std::sync::MutexGuard<'_, Vec<QueryRecord>> {
        self.records.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl FinancialApi for FixtureFinancialApi {
    fn fetch_history(&self) -> Result<Vec<QueryRecord>, ApiError> {
        self.check(HISTORY_PATH)?;
        Ok(self.records().clone())
    }

    fn submit_query(&self, query: &str) -> Result<Value, ApiError> {
        self.check(QUERY_PATH)?;
        let analysis = canned_analysis(query);
        let mut records = self.records();
        let id = records.len() as i64 + 1;
        records.push(QueryRecord {
            id: RecordId::Number(id),
            user_query: query.to_string(),
            ai_response: analysis.clone(),
        });
        Ok(analysis)
    }

    fn fetch_forecast(&self, query: &ForecastQuery) -> Result<ForecastResponse, ApiError> {
        self.check(FORECAST_PATH)?;
        Ok(synthetic_forecast(query))
    }
}

fn canned_analysis(query: &str) -> Value {
    let words = query.split_whitespace().count();
    json!({
        "query_summary": query.trim(),
        "market_outlook": {
            "short_term": "Range-bound with mild upward bias",
            "long_term": "Constructive, subject to earnings delivery"
        },
        "key_points": [
            "Fixture response generated offline",
            format!("Prompt contained {words} words")
        ],
        "confidence": 0.62,
        "requires_review": true
    })
}

fn seed(symbol: &str) -> u64 {
    symbol.bytes().fold(17u64, |acc, b| acc.wrapping_mul(31).wrapping_add(u64::from(b)))
}

fn synthetic_forecast(query: &ForecastQuery) -> ForecastResponse {
    let seed = seed(&query.ticker);
    let base = 100.0 + (seed % 2_400) as f64;
    let start = NaiveDate::from_ymd_opt(SERIES_START.0, SERIES_START.1, SERIES_START.2)
        .unwrap_or_default();

    let mut open = Vec::new();
    let mut high = Vec::new();
    let mut close = Vec::new();
    let mut price = base;
    for day in 0..query.days.min(MAX_SYNTHETIC_DAYS) {
        let date = start
            .checked_add_days(Days::new(day))
            .unwrap_or(start)
            .format("%Y-%m-%d")
            .to_string();
        // Small deterministic swings in [-5, +5].
        let swing = ((seed.wrapping_add(day * 7)) % 11) as f64 - 5.0;
        let day_open = price;
        let day_close = (price + swing).max(1.0);
        open.push((date.clone(), day_open));
        close.push((date.clone(), day_close));
        high.push((date, day_open.max(day_close) + 1.5));
        price = day_close;
    }

    let closes: Vec<f64> = close.iter().map(|(_, v)| *v).collect();
    let up_days = closes.windows(2).filter(|w| w[1] > w[0]).count() as f64;
    let total_days = closes.len().saturating_sub(1) as f64;
    let up = if total_days > 0.0 { up_days / total_days } else { 0.5 };

    ForecastResponse {
        forecast: ForecastSeries {
            open: Some(PriceSeries::new(open)),
            high: Some(PriceSeries::new(high)),
            close: Some(PriceSeries::new(close)),
            extra: Default::default(),
        },
        metrics: ForecastMetrics {
            accuracy: Some(74.2.into()),
            precision: Some(71.8.into()),
            recall: Some(69.5.into()),
            news_sentiment: Some(NewsSentiment {
                sentiment: Some(if up >= 0.5 { "positive" } else { "negative" }.into()),
                confidence: Some(up.into()),
                reason: Some(format!("Offline fixture for {}", query.company).into()),
            }),
            trend_probability: Some(TrendProbability {
                up: Some(MetricValue::Number((up * 100.0).round())),
                down: Some(MetricValue::Number(((1.0 - up) * 100.0).round())),
            }),
            forecast_trend: Some(ForecastTrend {
                up_days: Some(up_days.into()),
                total_days: Some(total_days.into()),
            }),
            ..ForecastMetrics::default()
        },
    }
}

fn sample_records() -> Vec<QueryRecord> {
    vec![
        QueryRecord {
            id: RecordId::Number(1),
            user_query: "What is the outlook for Reliance Industries over the next quarter?"
                .to_string(),
            ai_response: json!({
                "summary": "Refining margins recovering; retail and telecom steady",
                "risk_factors": ["Crude price volatility", "Capex intensity"],
                "rating": "accumulate"
            }),
        },
        QueryRecord {
            id: RecordId::Number(2),
            user_query: "Compare TCS and Infosys on deal wins and margin trajectory".to_string(),
            ai_response: json!({
                "tcs": { "deal_wins": "strong", "margin_trend": "stable" },
                "infosys": { "deal_wins": "improving", "margin_trend": "under pressure" },
                "verdict": "TCS preferred on consistency"
            }),
        },
    ]
}
