//! Remote tier implementations.

pub mod memory;
pub mod redis;
pub mod traits;

pub use memory::MemoryKv;
pub use redis::RedisKv;
pub use traits::{CacheError, RemoteStore};
