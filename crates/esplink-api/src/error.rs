use thiserror::Error;

/// Top-level error type for the `esplink-api` crate.
///
/// Covers every way a single request to the device can fail.
/// `esplink-core` folds all of these into one transport failure.
#[derive(Debug, Error)]
pub enum Error {
    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, timeout, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Failed to build the underlying HTTP client.
    #[error("Failed to build HTTP client: {0}")]
    ClientBuild(String),

    // ── Device responses ────────────────────────────────────────────
    /// The device answered with a non-success HTTP status.
    #[error("Device returned HTTP {status} for {path}")]
    Status { status: u16, path: String },

    /// The response body was not a complete status document.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },

    /// Encoding a request body failed.
    #[error("Failed to encode request body: {0}")]
    Encode(#[from] serde_json::Error),
}

impl Error {
    /// HTTP status code attached to this error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Returns `true` if the request never reached the device or timed out.
    pub fn is_unreachable(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            _ => false,
        }
    }

    /// Returns `true` if the device answered but the body was unusable.
    pub fn is_malformed(&self) -> bool {
        matches!(self, Self::Deserialization { .. })
    }
}
