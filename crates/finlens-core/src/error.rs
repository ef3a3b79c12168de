use thiserror::Error;

/// Input rejected before any request leaves the client.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Please enter your prompt.")]
    EmptyQuery,
    #[error("Days must be a positive whole number, got '{0}'.")]
    InvalidDays(String),
    #[error("Unknown ticker '{0}'.")]
    UnknownTicker(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ForecastError {
    #[error("forecast is missing the {0} series")]
    MissingSeries(&'static str),
    #[error("{field} series dates do not match Open (first difference at position {position})")]
    SeriesMismatch {
        field: &'static str,
        position: usize,
    },
    #[error("price for {date} is not a number")]
    NonNumeric { date: String },
}
