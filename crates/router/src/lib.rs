pub mod handler;
pub mod schema;

pub use handler::MessageRouter;
pub use schema::Request;
