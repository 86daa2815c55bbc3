use thiserror::Error;

pub type CopyResult<T> = Result<T, CopyError>;

#[derive(Debug, Error)]
pub enum CopyError {
    /// Nothing to describe; the model is not called.
    #[error("enter a title first so the description has context")]
    MissingTitle,

    #[error("no API key configured (set copywriter.api_key or GEMINI_API_KEY)")]
    MissingApiKey,

    #[error("invalid endpoint {endpoint}: {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },

    #[error("failed to build HTTP client: {0}")]
    Client(String),

    #[error("request failed: {0}")]
    Request(String),

    #[error("model returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("invalid model response: {0}")]
    InvalidResponse(String),

    #[error("model returned no text")]
    EmptyResponse,
}
