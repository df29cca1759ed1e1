use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Navigation timed out after {0} ms")]
    NavigationTimeout(u64),

    #[error("Redirect limit exceeded while fetching {0}")]
    TooManyRedirects(String),

    #[error("Login form error: {0}")]
    LoginForm(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Other error: {0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, EngineError>;
