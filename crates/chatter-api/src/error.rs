use reqwest::StatusCode;
use thiserror::Error;

/// Failure taxonomy surfaced to callers.
///
/// `Unauthorized` is special: by the time the caller sees it, the
/// session has already been torn down globally (see `ApiClient`).
#[derive(Debug, Error)]
pub enum ApiError {
    /// Network/transport failure before a status line was received.
    #[error("network error: {0}")]
    Transport(#[from] reqwest::Error),

    /// 401 from either backend; global logout has already happened.
    #[error("unauthorized")]
    Unauthorized,

    /// Any other non-2xx status, with the body the server sent.
    #[error("server returned {status}: {body}")]
    Status { status: StatusCode, body: String },

    /// Input rejected client-side before any request was built.
    #[error("invalid input: {0}")]
    Validation(#[from] validator::ValidationErrors),

    /// 2xx response whose body did not match the expected envelope.
    #[error("malformed response body: {0}")]
    Decode(#[from] serde_json::Error),
}

impl ApiError {
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ApiError::Unauthorized)
    }
}
