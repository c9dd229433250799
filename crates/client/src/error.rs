use engine::FetchError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ClientError>;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("invalid base url: {0}")]
    InvalidUrl(String),
    #[error("not authenticated")]
    Unauthorized,
    #[error("access denied")]
    Forbidden,
    #[error("not found")]
    NotFound,
    #[error("validation error ({status}): {message}")]
    Validation { status: u16, message: String },
    #[error("server error ({status}): {message}")]
    Server { status: u16, message: String },
    #[error("network error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("malformed response: {0}")]
    Decode(String),
}

impl ClientError {
    pub(crate) fn from_status(status: u16, message: String) -> Self {
        match status {
            401 => Self::Unauthorized,
            403 => Self::Forbidden,
            404 => Self::NotFound,
            400 | 422 => Self::Validation { status, message },
            _ => Self::Server { status, message },
        }
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(value: serde_json::Error) -> Self {
        Self::Decode(value.to_string())
    }
}

impl From<ClientError> for FetchError {
    fn from(value: ClientError) -> Self {
        match value {
            ClientError::Unauthorized => FetchError::Unauthorized,
            ClientError::Forbidden => FetchError::Forbidden,
            ClientError::NotFound => FetchError::NotFound,
            ClientError::Validation { status, message } | ClientError::Server { status, message } => {
                FetchError::Rejected { status, message }
            }
            ClientError::Transport(err) => FetchError::Network(err.to_string()),
            ClientError::Decode(message) => FetchError::Malformed(message),
            ClientError::InvalidUrl(message) => FetchError::Network(message),
        }
    }
}
