pub mod errors;
pub mod fake;
pub mod model;
pub mod ports;

pub use errors::GatewayError;
pub use fake::FakeSite;
pub use model::{PageHandle, RawRow};
pub use ports::{PageBroker, PagePort};
