//! Per-namespace secret aggregation
//!
//! Every chart in a namespace contributes the secrets stored under its own
//! branch-scoped path. Merging is strict: a key written twice is a conflict
//! even when both writers agree on the value, because two charts owning the
//! same key is a store-layout bug that silent merging would hide.
//!
//! Keys are merged and checked in their stored form so diagnostics name the
//! key as it appears in the store. The environment-variable spelling
//! (dashes to underscores, uppercased) is produced only at the very end.

use indexmap::IndexMap;

use verdant_core::ChartSet;
use verdant_store::{paths, KvStore, StoreError};

use crate::error::{ConvergeError, Result};

/// Collect and validate the secrets for one namespace.
///
/// Reads the secret bundle of every chart in `namespace` that declares
/// secrets, merges them, then verifies every declared key arrived. All
/// missing keys are logged before the error returns, so one run surfaces
/// the whole gap instead of the first hole.
pub fn aggregate(
    store: &dyn KvStore,
    branch: &str,
    namespace: &str,
    charts: &ChartSet,
) -> Result<IndexMap<String, String>> {
    let mut merged: IndexMap<String, String> = IndexMap::new();
    // key -> chart that wrote it, for conflict diagnostics
    let mut provenance: IndexMap<String, String> = IndexMap::new();

    for chart in charts.in_namespace(namespace) {
        if !chart.requires_secrets() {
            continue;
        }
        let path = paths::chart_secrets(branch, namespace, &chart.name);
        tracing::debug!(chart = %chart.name, %path, "reading chart secrets");
        let bundle = match store.read(&path) {
            Ok(attrs) => attrs,
            // an absent bundle surfaces below as missing declared keys
            Err(StoreError::NoData { .. }) => continue,
            Err(e) => return Err(e.into()),
        };
        for (key, value) in bundle {
            if let Some(previous_chart) = provenance.get(&key) {
                return Err(ConvergeError::SecretConflict {
                    key,
                    namespace: namespace.to_string(),
                    chart: chart.name.clone(),
                    previous_chart: previous_chart.clone(),
                });
            }
            provenance.insert(key.clone(), chart.name.clone());
            merged.insert(key, value);
        }
    }

    // a key declared by several charts is still one missing key
    let mut missing = indexmap::IndexSet::new();
    for chart in charts.in_namespace(namespace) {
        for key in &chart.secrets {
            if !merged.contains_key(key) && missing.insert(key.clone()) {
                tracing::error!(chart = %chart.name, %namespace, %key, "declared secret not in store");
            }
        }
    }
    if !missing.is_empty() {
        return Err(ConvergeError::MissingSecrets {
            namespace: namespace.to_string(),
            keys: missing.into_iter().collect(),
        });
    }

    Ok(merged
        .into_iter()
        .map(|(key, value)| (env_key(&key), value))
        .collect())
}

/// The environment-variable spelling of a stored secret key.
fn env_key(key: &str) -> String {
    key.replace('-', "_").to_ascii_uppercase()
}
