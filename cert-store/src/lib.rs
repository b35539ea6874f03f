//! Store Adapter
//!
//! A narrow interface ([`StoreApi`]) over the Store's sets, hashes, sorted
//! set, and pub/sub channel, with a production implementation
//! ([`RedisStore`]) and an in-memory test double ([`MemoryStore`]).

pub mod api;
pub mod memory;
pub mod redis_store;

pub use api::StoreApi;
pub use memory::MemoryStore;
pub use redis_store::RedisStore;
