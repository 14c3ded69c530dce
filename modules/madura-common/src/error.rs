use thiserror::Error;

pub type Result<T> = std::result::Result<T, MaduraError>;

#[derive(Error, Debug)]
pub enum MaduraError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Validation error: {0}")]
    Validation(String),
}
