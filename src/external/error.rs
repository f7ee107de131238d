use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExternalError {
    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Ollama error: {0}")]
    OllamaError(String),

    #[error("Vector index error: {0}")]
    VectorIndexError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
