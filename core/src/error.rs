use thiserror::Error;

/// Errors surfaced by the catalog client, the router and the host sink.
///
/// The playback resolver never returns these to its caller; it records them
/// as a [`crate::player::FallbackReason`] and keeps the original reference.
#[derive(Debug, Error)]
pub enum VodError {
    #[error("request to {url} failed: {reason}")]
    Network { url: String, reason: String },

    #[error("HTTP {status} from {url}")]
    Http { url: String, status: u16 },

    #[error("could not decode {context}: {reason}")]
    Decode { context: String, reason: String },

    #[error("parse error: {reason}")]
    Parse { reason: String },

    #[error("invalid request: {reason}")]
    InvalidRequest { reason: String },

    #[error("host sink failed: {reason}")]
    Sink { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl VodError {
    pub fn network(url: &str, reason: impl Into<String>) -> Self {
        VodError::Network { url: url.to_string(), reason: reason.into() }
    }

    pub fn decode(context: impl Into<String>, reason: impl ToString) -> Self {
        VodError::Decode { context: context.into(), reason: reason.to_string() }
    }

    pub fn parse(reason: impl Into<String>) -> Self {
        VodError::Parse { reason: reason.into() }
    }

    pub fn invalid_request(reason: impl Into<String>) -> Self {
        VodError::InvalidRequest { reason: reason.into() }
    }
}

pub type Result<T> = std::result::Result<T, VodError>;
