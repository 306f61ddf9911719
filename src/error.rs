use thiserror::Error;

/// Structural violations of a `RawStatementTable`.
///
/// These indicate a bug in an extraction adapter and are surfaced instead of
/// being degraded to missing data.
#[derive(Debug, Error, PartialEq)]
pub enum TableError {
    #[error("table has no columns")]
    NoColumns,

    #[error("row {row} has {found} cells, expected {expected}")]
    RaggedRow {
        row: usize,
        found: usize,
        expected: usize,
    },
}

/// Failures while fetching raw statement data.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP {status} for {url}")]
    Status { status: u16, url: String },

    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("invalid url {0}")]
    Url(#[from] url::ParseError),

    #[error("selector `{0}` did not parse")]
    Selector(String),

    #[error("reading {path}: {source}")]
    Csv {
        path: String,
        #[source]
        source: csv::Error,
    },

    #[error(transparent)]
    Table(#[from] TableError),
}

impl FetchError {
    /// Rate limits, server errors and transport failures are worth another attempt.
    pub fn is_retryable(&self) -> bool {
        match self {
            FetchError::Status { status, .. } => *status == 429 || *status >= 500,
            FetchError::Transport { source, .. } => !source.is_builder(),
            _ => false,
        }
    }
}

/// Failures talking to the chat-completion endpoint.
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("no API key configured (set SCREENER__LLM__API_KEY or OPENAI_API_KEY)")]
    MissingApiKey,

    #[error("authentication rejected by {0}")]
    Unauthorized(String),

    #[error("rate limited: {0}")]
    RateLimited(String),

    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("unexpected response: {0}")]
    UnexpectedResponse(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_errors_retry_only_on_throttle_and_server_faults() {
        let status = |s| FetchError::Status { status: s, url: "https://x".into() };
        assert!(status(429).is_retryable());
        assert!(status(503).is_retryable());
        assert!(!status(404).is_retryable());
        assert!(!FetchError::Table(TableError::NoColumns).is_retryable());
    }
}
