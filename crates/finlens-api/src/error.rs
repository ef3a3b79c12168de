use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("http client setup failed: {0}")]
    Client(#[source] reqwest::Error),
    #[error("request to {path} failed: {source}")]
    Network {
        path: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("HTTP {status} for {path}")]
    Status { status: u16, path: String },
    #[error("unexpected response body from {path}: {source}")]
    Decode {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

impl ApiError {
    pub fn path(&self) -> Option<&str> {
        match self {
            Self::Client(_) => None,
            Self::Network { path, .. } | Self::Status { path, .. } | Self::Decode { path, .. } => {
                Some(path)
            }
        }
    }
}
