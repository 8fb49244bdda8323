//! Translation error types.

/// Transport-level failure while talking to the provider.
///
/// Never returned to callers of the client: it is folded into
/// `TranslationOutcome::TransportError` at the client boundary.
#[derive(Debug, thiserror::Error)]
pub enum TranslationError {
    /// Connection or protocol error during the call.
    #[error("network error: {0}")]
    Network(#[source] reqwest::Error),

    /// The transport gave up waiting for the provider.
    #[error("request timed out")]
    Timeout,

    /// Provider answered with a non-success HTTP status.
    #[error("provider returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// Body was not the provider's JSON schema.
    #[error("invalid response body: {0}")]
    Parse(String),
}

impl From<reqwest::Error> for TranslationError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout
        } else {
            Self::Network(e)
        }
    }
}
