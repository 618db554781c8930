//! Client error taxonomy.
//!
//! ERROR HANDLING
//! ==============
//! Every fallible library call returns `ClientError`. The only place errors
//! are swallowed is `UserStatus::lazy_fetch_state`, which logs and returns so
//! navigation is never blocked by a failing backend.

/// Errors produced by client operations.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// A configuration value could not be parsed.
    #[error("config parse failed: {0}")]
    Config(String),

    /// The underlying HTTP client could not be constructed.
    #[error("HTTP client build failed: {0}")]
    HttpClientBuild(String),

    /// The HTTP request could not be sent or its body could not be read.
    #[error("request failed: {0}")]
    Request(String),

    /// A response or stored value could not be deserialized.
    #[error("parse failed: {0}")]
    Parse(String),

    /// The status endpoint returned a non-success HTTP status.
    /// Carries the server's `detail` message when one was present.
    #[error("{0}")]
    StateFetch(String),

    /// The server reported a status string outside the known lifecycle tags.
    #[error("unknown user status: {0}")]
    UnknownStatus(String),

    /// An applicant id was not a hyphenated UUID.
    #[error("invalid applicant id: {0}")]
    InvalidApplicantId(String),

    /// Reading or writing the persistent store failed.
    #[error("store I/O failed: {0}")]
    Store(#[from] std::io::Error),
}

impl ClientError {
    /// Whether a later attempt could plausibly succeed without user action.
    #[must_use]
    pub fn retryable(&self) -> bool {
        matches!(self, Self::Request(_) | Self::StateFetch(_))
    }
}
