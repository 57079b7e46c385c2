use thiserror::Error;

#[derive(Debug, Error, Clone)]
pub enum GatewayError {
    /// Page exists but is not ready for script execution yet. Expected
    /// while a page is still loading; pollers retry these silently.
    #[error("transient injection failure: {0}")]
    Transient(String),

    /// Injection ran and reported a failure.
    #[error("injection failed: {0}")]
    Injection(String),

    /// The page handle no longer refers to a live page.
    #[error("page gone: {0}")]
    PageGone(String),
}

impl GatewayError {
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transient(_))
    }
}
