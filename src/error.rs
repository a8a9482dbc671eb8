#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// No response was received at all.
    #[error("network error: {0}")]
    Network(String),
    /// The request was rejected with 401 and could not be recovered by a
    /// refresh (no refresh token, or the retried request failed again).
    #[error("unauthorized")]
    Unauthorized,
    /// Token refresh itself failed; both tokens have been cleared and the
    /// caller should treat the session as over.
    #[error("session expired")]
    SessionExpired,
    /// Any non-401 error status, carrying the server-provided message.
    #[error("{message}")]
    Status { status: u16, message: String },
    #[error("invalid response body: {0}")]
    Decode(String),
}

impl ApiError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Server message for `Status` errors, None otherwise.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            ApiError::Status { message, .. } => Some(message),
            _ => None,
        }
    }
}
