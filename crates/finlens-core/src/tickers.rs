use crate::error::ValidationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticker {
    pub symbol: &'static str,
    pub name: &'static str,
    pub news: &'static str,
}

pub const DEFAULT_TICKER: &str = "RELIANCE.NS";

pub const TICKERS: [Ticker; 10] = [
    Ticker {
        symbol: "RELIANCE.NS",
        name: "Reliance Industries",
        news: "Reliance",
    },
    Ticker {
        symbol: "TCS.NS",
        name: "Tata Consultancy Services",
        news: "TCS",
    },
    Ticker {
        symbol: "INFY.NS",
        name: "Infosys",
        news: "Infosys",
    },
    Ticker {
        symbol: "HDFCBANK.NS",
        name: "HDFC Bank",
        news: "HDFC Bank",
    },
    Ticker {
        symbol: "ICICIBANK.NS",
        name: "ICICI Bank",
        news: "ICICI Bank",
    },
    Ticker {
        symbol: "SBIN.NS",
        name: "State Bank of India",
        news: "SBI",
    },
    Ticker {
        symbol: "ITC.NS",
        name: "ITC Limited",
        news: "ITC",
    },
    Ticker {
        symbol: "BHARTIARTL.NS",
        name: "Bharti Airtel",
        news: "Airtel",
    },
    Ticker {
        symbol: "HINDUNILVR.NS",
        name: "Hindustan Unilever",
        news: "Hindustan Unilever",
    },
    Ticker {
        symbol: "TATAMOTORS.NS",
        name: "Tata Motors",
        news: "Tata Motors",
    },
];

pub fn find_ticker(symbol: &str) -> Result<&'static Ticker, ValidationError> {
    TICKERS
        .iter()
        .find(|ticker| ticker.symbol.eq_ignore_ascii_case(symbol.trim()))
        .ok_or_else(|| ValidationError::UnknownTicker(symbol.to_string()))
}

pub fn ticker_index(symbol: &str) -> Option<usize> {
    TICKERS
        .iter()
        .position(|ticker| ticker.symbol.eq_ignore_ascii_case(symbol.trim()))
}

/// Parses the free-text day count; any positive integer is accepted.
pub fn parse_days(input: &str) -> Result<u64, ValidationError> {
    match input.trim().parse::<u64>() {
        Ok(days) if days > 0 => Ok(days),
        _ => Err(ValidationError::InvalidDays(input.to_string())),
    }
}
