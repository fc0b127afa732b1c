//! Error types shared by the remote client and the list controllers.

use thiserror::Error;

/// Errors produced while talking to the roster API.
///
/// The type is `Clone` so a single refresh outcome can be handed to every
/// request that was waiting on it.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ApiError {
    /// No response arrived: connection failure, DNS, or a timeout.
    #[error("transport error: {0}")]
    Transport(String),

    /// The session could not be refreshed; the user has to log in again.
    #[error("session expired, please log in again")]
    SessionExpired,

    /// The server answered with a non-success status other than a
    /// refreshable 401.
    #[error("server responded with {status}: {message}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body, or the canonical reason when the body is empty.
        message: String,
    },

    /// The response body did not match the expected envelope.
    #[error("failed to decode response: {0}")]
    Decode(String),

    /// Reading or writing the persisted session failed.
    #[error("session storage error: {0}")]
    Storage(String),
}

impl ApiError {
    /// Returns whether retrying the same request later may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport(_) => true,
            Self::Status { status, .. } => *status >= 500,
            Self::SessionExpired | Self::Decode(_) | Self::Storage(_) => false,
        }
    }

    /// Returns whether the caller must authenticate again before retrying.
    pub fn requires_login(&self) -> bool {
        matches!(self, Self::SessionExpired)
    }

    /// Returns a short message suitable for the terminal.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::Transport(_) => "Could not reach the server. Please try again.",
            Self::SessionExpired => "Your session has expired. Please log in again.",
            Self::Status { status, .. } if *status >= 500 => {
                "The server had a problem handling the request."
            }
            Self::Status { .. } => "The request was rejected by the server.",
            Self::Decode(_) => "The server sent an unexpected response.",
            Self::Storage(_) => "The local session could not be read or written.",
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ApiError::Decode(err.to_string())
        } else {
            ApiError::Transport(err.to_string())
        }
    }
}

/// Errors produced when mutating a view's filter selection.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FilterError {
    #[error("unknown filter `{key}`, expected one of: {allowed}")]
    UnknownKey { key: String, allowed: String },

    #[error("invalid filter expression `{0}`, expected key=value")]
    Malformed(String),
}

/// Error returned by the list controller's mutating operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ControlError {
    #[error(transparent)]
    Filter(#[from] FilterError),

    #[error(transparent)]
    Api(#[from] ApiError),
}
