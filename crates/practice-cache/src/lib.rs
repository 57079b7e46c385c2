pub mod cache;
pub mod errors;
pub mod policy;
pub mod store;

pub use cache::{LoadOutcome, PracticeCache};
pub use errors::CacheError;
pub use policy::CachePolicy;
pub use store::{CacheStore, FileCacheStore, MemoryCacheStore, PersistedCache};
