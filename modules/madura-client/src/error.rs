use thiserror::Error;

pub type Result<T> = std::result::Result<T, ClientError>;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Unparseable response: {0}")]
    Unparseable(String),

    #[error("Record not found: {0}")]
    NotFound(String),
}

impl ClientError {
    /// Text to show a user: the backend's own words when it sent any.
    pub fn user_message(&self) -> String {
        match self {
            ClientError::Api { message, .. } if !message.trim().is_empty() => message.clone(),
            ClientError::Unparseable(text) if !text.trim().is_empty() => text.clone(),
            other => other.to_string(),
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        ClientError::Network(err.to_string())
    }
}
