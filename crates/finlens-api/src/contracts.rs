use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

pub const HISTORY_PATH: &str = "/api/Financial_ai_data/";
pub const QUERY_PATH: &str = "/api/process_financial_query/";
pub const FORECAST_PATH: &str = "/api/predict/";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryRequest {
    pub user_query: String,
}

/// `data` is whatever structure the backend produced; it is never validated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryResponse {
    #[serde(default)]
    pub data: Value,
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    #[test]
    fn query_request_uses_backend_field_name() {
        let body = serde_json::to_value(QueryRequest {
            user_query: "Is ITC a buy?".to_string(),
        })
        .expect("serialize");
        assert_eq!(body, json!({ "user_query": "Is ITC a buy?" }));
    }

    #[test]
    fn query_response_without_data_is_null() {
        let response: QueryResponse = serde_json::from_value(json!({})).expect("decode");
        assert_eq!(response.data, Value::Null);
    }
}
