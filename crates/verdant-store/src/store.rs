//! The `KvStore` trait - the one boundary all entity and secret loading
//! funnels through.

use indexmap::IndexMap;
use verdant_core::Attributes;

use crate::error::Result;

/// A prefix-scoped key/value reader.
///
/// Implementations must be Send + Sync so collections can be shared freely.
pub trait KvStore: Send + Sync {
    /// Enumerate every entry under `prefix`.
    ///
    /// Returned keys are relative to the prefix (the prefix itself is
    /// stripped); nested entries use `/`-joined relative paths. Order is the
    /// store's listing order.
    fn dump(&self, prefix: &str) -> Result<IndexMap<String, Attributes>>;

    /// Fetch a single entry's attribute map.
    ///
    /// This is the single-entity path used by lookup-by-name and secret
    /// bundle fetches; it never enumerates the surrounding prefix.
    fn read(&self, path: &str) -> Result<Attributes>;
}
