//! Fast store access
//!
//! - `FastStore`: backend trait (Redis, in-process map)
//! - `ResilientStoreHandle`: bounded connect retry plus connected/degraded
//!   tracking; the only component that writes `ConnectionState`

mod backend;
mod factory;
mod handle;
mod memory;
mod redis_store;

pub use backend::FastStore;
pub use factory::{create_handle, create_store};
pub use handle::{ConnectionState, ResilientStoreHandle, RetryPolicy, Sleeper, TokioSleeper};
pub use memory::MemoryStore;
pub use redis_store::RedisStore;
