use thiserror::Error;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache store i/o: {0}")]
    Io(#[from] std::io::Error),

    #[error("cache store payload: {0}")]
    Payload(#[from] serde_json::Error),
}
