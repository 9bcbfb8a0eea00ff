/// Errors produced by the API client. Server-supplied messages are carried
/// verbatim so views can surface them unchanged.
#[derive(Debug, Clone, PartialEq)]
pub enum ApiError {
    /// Network-level failure; no response was received.
    Transport(String),
    /// Non-2xx response. `message` is the server's error body message when
    /// present, otherwise an operation-specific fallback.
    Rejected { status: u16, message: String },
    /// Local validation failed; no request was issued.
    InvalidRequest(String),
    /// The response arrived but its body could not be decoded.
    Decode(String),
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiError::Transport(msg) => write!(f, "request failed: {}", msg),
            ApiError::Rejected { message, .. } => write!(f, "{}", message),
            ApiError::InvalidRequest(msg) => write!(f, "{}", msg),
            ApiError::Decode(msg) => write!(f, "invalid response body: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}
