//! Verdant Store - the config-store boundary
//!
//! Every entity and secret Verdant resolves funnels through one operation:
//! a prefix-scoped key/value dump of a Vault-style store. This crate
//! provides:
//!
//! - **`KvStore`**: the store trait (`dump` a prefix, `read` one entry)
//! - **`HttpStore`**: Vault KV-v1 compatible HTTP client, env-configured
//! - **`MemoryStore`**: in-memory store with operation counters, for tests
//! - **Collections**: lazily-loaded, filtered, memoized views over the
//!   cloud and cluster prefixes

pub mod collections;
pub mod error;
pub mod http;
pub mod memory;
pub mod paths;
pub mod store;

pub use collections::{CloudCollection, ClusterCollection};
pub use error::{Result, StoreError};
pub use http::HttpStore;
pub use memory::{MemoryStore, OperationCounts};
pub use store::KvStore;
