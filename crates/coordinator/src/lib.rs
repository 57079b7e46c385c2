pub mod api;
pub mod errors;
pub mod matching;
pub mod metrics;

pub use api::{Coordinator, CoordinatorPolicy, RefreshPurpose};
pub use errors::CoordinatorError;
