use std::time::Duration;

use finlens_core::config::ApiConfig;
use finlens_core::model::ForecastQuery;
use finlens_core::model::ForecastResponse;
use finlens_core::model::QueryRecord;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::contracts::QueryRequest;
use crate::contracts::QueryResponse;
use crate::contracts::FORECAST_PATH;
use crate::contracts::HISTORY_PATH;
use crate::contracts::QUERY_PATH;
use crate::error::ApiError;

/// The three backend operations the dashboard depends on.
pub trait FinancialApi: Send + Sync {
    fn fetch_history(&self) -> Result<Vec<QueryRecord>, ApiError>;

    /// Returns the `data` member of the backend's answer.
    fn submit_query(&self, query: &str) -> Result<Value, ApiError>;

    fn fetch_forecast(&self, query: &ForecastQuery) -> Result<ForecastResponse, ApiError>;
}

#[derive(Debug, Clone)]
pub struct HttpFinancialApi {
    base_url: String,
    http: reqwest::blocking::Client,
}

impl HttpFinancialApi {
    /// `timeout: None` lets requests wait as long as the backend takes.
    pub fn new(base_url: impl Into<String>, timeout: Option<Duration>) -> Result<Self, ApiError> {
        let http = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("finlens/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(ApiError::Client)?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http,
        })
    }

    pub fn from_config(config: &ApiConfig) -> Result<Self, ApiError> {
        Self::new(
            config.base_url.clone(),
            config.timeout_secs.map(Duration::from_secs),
        )
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn read_json<T: DeserializeOwned>(
        path: &str,
        response: reqwest::blocking::Response,
    ) -> Result<T, ApiError> {
        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Status {
                status: status.as_u16(),
                path: path.to_string(),
            });
        }
        let body = response.text().map_err(|source| ApiError::Network {
            path: path.to_string(),
            source,
        })?;
        serde_json::from_str(&body).map_err(|source| ApiError::Decode {
            path: path.to_string(),
            source,
        })
    }

    fn network(path: &str) -> impl FnOnce(reqwest::Error) -> ApiError + '_ {
        move |source| ApiError::Network {
            path: path.to_string(),
            source,
        }
    }
}

impl FinancialApi for HttpFinancialApi {
    fn fetch_history(&self) -> Result<Vec<QueryRecord>, ApiError> {
        tracing::debug!(url = %self.url(HISTORY_PATH), "fetching history");
        let response = self
            .http
            .get(self.url(HISTORY_PATH))
            .send()
            .map_err(Self::network(HISTORY_PATH))?;
        Self::read_json(HISTORY_PATH, response)
    }

    fn submit_query(&self, query: &str) -> Result<Value, ApiError> {
        tracing::debug!(url = %self.url(QUERY_PATH), "submitting query");
        let response = self
            .http
            .post(self.url(QUERY_PATH))
            .json(&QueryRequest {
                user_query: query.to_string(),
            })
            .send()
            .map_err(Self::network(QUERY_PATH))?;
        let body: QueryResponse = Self::read_json(QUERY_PATH, response)?;
        Ok(body.data)
    }

    fn fetch_forecast(&self, query: &ForecastQuery) -> Result<ForecastResponse, ApiError> {
        tracing::debug!(
            url = %self.url(FORECAST_PATH),
            ticker = %query.ticker,
            days = query.days,
            "fetching forecast"
        );
        let response = self
            .http
            .get(self.url(FORECAST_PATH))
            .query(query)
            .send()
            .map_err(Self::network(FORECAST_PATH))?;
        Self::read_json(FORECAST_PATH, response)
    }
}
