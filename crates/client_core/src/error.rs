use shared::error::ApiError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("server responded with status {status}: {body}")]
    Rejected { status: u16, body: String },
    #[error("malformed response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("invalid server url: {0}")]
    Url(#[from] url::ParseError),
}

impl ClientError {
    /// Text shown in the activity log. Rejections report the response body,
    /// unwrapped from the backend's `{"error": ...}` envelope when present.
    pub fn log_detail(&self) -> String {
        match self {
            ClientError::Rejected { body, .. } => match ApiError::parse(body) {
                Some(api_error) => api_error.error,
                None => body.clone(),
            },
            other => other.to_string(),
        }
    }

    pub fn is_rejection(&self) -> bool {
        matches!(self, ClientError::Rejected { .. })
    }
}
