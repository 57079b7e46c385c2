use thiserror::Error;

use page_gateway::GatewayError;

#[derive(Debug, Error, Clone)]
pub enum DomActionError {
    /// The selector (or its interactive attribute) never showed up inside
    /// the polling window.
    #[error("wait timed out for {0}")]
    WaitTimeout(String),

    /// All click attempts were exhausted.
    #[error("click failed on {0}")]
    ClickFailed(String),

    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

impl DomActionError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::WaitTimeout(_))
    }
}
