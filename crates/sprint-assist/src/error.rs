use thiserror::Error;

#[derive(Debug, Error)]
pub enum AssistError {
    #[error("generation endpoint unreachable: {0}")]
    Http(#[from] reqwest::Error),

    #[error("generation request failed with status {0}")]
    Status(u16),

    #[error("malformed generation response: {0}")]
    MalformedResponse(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, AssistError>;
