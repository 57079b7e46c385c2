use thiserror::Error;

use dom_actions::DomActionError;
use page_gateway::GatewayError;

#[derive(Debug, Error, Clone)]
pub enum ScrapeError {
    /// The listing grid never produced a data row inside the wait window.
    #[error("practice list not ready")]
    ListNotReady,

    /// The detail flow reached the sub-section but the field was empty or
    /// missing.
    #[error("secondary code field missing for {0}")]
    FieldMissing(String),

    #[error(transparent)]
    Dom(#[from] DomActionError),

    #[error(transparent)]
    Gateway(#[from] GatewayError),
}
