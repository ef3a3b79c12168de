use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde::Deserializer;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value;

use crate::error::ForecastError;
use crate::tickers::Ticker;

/// One stored question/answer pair served by the history endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryRecord {
    #[serde(default, deserialize_with = "record_id")]
    pub id: RecordId,
    #[serde(default, deserialize_with = "text_or_empty")]
    pub user_query: String,
    #[serde(rename = "AI_Response", default)]
    pub ai_response: Value,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordId {
    Number(i64),
    Text(String),
}

impl Default for RecordId {
    fn default() -> Self {
        Self::Text(String::new())
    }
}

impl std::fmt::Display for RecordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Number(id) => write!(f, "{id}"),
            Self::Text(id) => f.write_str(id),
        }
    }
}

/// Integral numbers and strings are ids as sent; other JSON becomes its text.
fn record_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<RecordId, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::Number(number) => match number.as_i64() {
            Some(id) => RecordId::Number(id),
            None => RecordId::Text(number.to_string()),
        },
        Value::String(id) => RecordId::Text(id),
        Value::Null => RecordId::default(),
        other => RecordId::Text(other.to_string()),
    })
}

fn text_or_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::Null => String::new(),
        Value::String(text) => text,
        other => other.to_string(),
    })
}

/// Decodes `T` when the value has its shape and drops it otherwise.
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    if value.is_null() {
        return Ok(None);
    }
    match serde_json::from_value(value) {
        Ok(parsed) => Ok(Some(parsed)),
        Err(err) => {
            tracing::debug!(error = %err, "ignoring metric with unexpected shape");
            Ok(None)
        }
    }
}

/// Date-keyed prices in the order the backend sent them.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(try_from = "Map<String, Value>", into = "Map<String, Value>")]
pub struct PriceSeries {
    points: Vec<(String, f64)>,
}

impl PriceSeries {
    pub fn new(points: Vec<(String, f64)>) -> Self {
        Self { points }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn dates(&self) -> impl Iterator<Item = &str> {
        self.points.iter().map(|(date, _)| date.as_str())
    }

    pub fn values(&self) -> impl Iterator<Item = f64> + '_ {
        self.points.iter().map(|(_, value)| *value)
    }

}

impl TryFrom<Map<String, Value>> for PriceSeries {
    type Error = ForecastError;

    fn try_from(map: Map<String, Value>) -> Result<Self, Self::Error> {
        let mut points = Vec::with_capacity(map.len());
        for (date, value) in map {
            let Some(price) = value.as_f64() else {
                return Err(ForecastError::NonNumeric { date });
            };
            points.push((date, price));
        }
        Ok(Self { points })
    }
}

impl From<PriceSeries> for Map<String, Value> {
    fn from(series: PriceSeries) -> Self {
        series
            .points
            .into_iter()
            .map(|(date, price)| (date, Value::from(price)))
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ForecastSeries {
    #[serde(rename = "Open", default, skip_serializing_if = "Option::is_none")]
    pub open: Option<PriceSeries>,
    #[serde(rename = "High", default, skip_serializing_if = "Option::is_none")]
    pub high: Option<PriceSeries>,
    #[serde(rename = "Close", default, skip_serializing_if = "Option::is_none")]
    pub close: Option<PriceSeries>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One backend metric. Numbers stay numeric; any other JSON is kept as sent
/// and shown through the tree renderer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetricValue {
    Number(f64),
    Other(Value),
}

impl MetricValue {
    /// Numeric reading, accepting numbers sent as strings (`"85.3"`).
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(number) => Some(*number),
            Self::Other(Value::String(text)) => {
                text.trim().parse::<f64>().ok().filter(|n| n.is_finite())
            }
            Self::Other(_) => None,
        }
    }
}

impl From<f64> for MetricValue {
    fn from(number: f64) -> Self {
        Self::Number(number)
    }
}

impl From<&str> for MetricValue {
    fn from(text: &str) -> Self {
        Self::Other(Value::from(text))
    }
}

impl From<String> for MetricValue {
    fn from(text: String) -> Self {
        Self::Other(Value::from(text))
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct NewsSentiment {
    #[serde(default)]
    pub sentiment: Option<MetricValue>,
    #[serde(default)]
    pub confidence: Option<MetricValue>,
    #[serde(default)]
    pub reason: Option<MetricValue>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TrendProbability {
    #[serde(default)]
    pub up: Option<MetricValue>,
    #[serde(default)]
    pub down: Option<MetricValue>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ForecastTrend {
    #[serde(default)]
    pub up_days: Option<MetricValue>,
    #[serde(default)]
    pub total_days: Option<MetricValue>,
}

impl ForecastTrend {
    pub fn up_share_percent(&self) -> Option<f64> {
        let up = self.up_days.as_ref().and_then(MetricValue::as_f64)?;
        let total = self.total_days.as_ref().and_then(MetricValue::as_f64)?;
        (total > 0.0).then(|| up / total * 100.0)
    }
}

/// Backend metrics plus the client-derived day-over-day direction split.
/// Grouped fields that arrive in another shape are dropped, not fatal.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ForecastMetrics {
    #[serde(default)]
    pub accuracy: Option<MetricValue>,
    #[serde(default)]
    pub precision: Option<MetricValue>,
    #[serde(default)]
    pub recall: Option<MetricValue>,
    #[serde(default, deserialize_with = "lenient")]
    pub news_sentiment: Option<NewsSentiment>,
    #[serde(default, deserialize_with = "lenient")]
    pub trend_probability: Option<TrendProbability>,
    #[serde(default, deserialize_with = "lenient")]
    pub forecast_trend: Option<ForecastTrend>,
    #[serde(
        rename = "upPercent",
        default,
        deserialize_with = "lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub up_percent: Option<u8>,
    #[serde(
        rename = "downPercent",
        default,
        deserialize_with = "lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub down_percent: Option<u8>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Query parameters of one forecast request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ForecastQuery {
    pub ticker: String,
    pub days: u64,
    pub news: String,
    #[serde(rename = "Company")]
    pub company: String,
}

impl ForecastQuery {
    pub fn for_ticker(ticker: &Ticker, days: u64) -> Self {
        Self {
            ticker: ticker.symbol.to_string(),
            days,
            news: ticker.news.to_string(),
            company: ticker.name.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ForecastResponse {
    #[serde(default)]
    pub forecast: ForecastSeries,
    #[serde(default)]
    pub metrics: ForecastMetrics,
}
