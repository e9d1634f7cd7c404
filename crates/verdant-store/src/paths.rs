//! Store path layout
//!
//! ```text
//! secret/verdant/clouds/<name>                     cloud records
//! secret/verdant/clusters/<name>                   cluster records
//! secret/verdant/charts/<branch>/<ns>/<chart>      chart secret bundles
//! ```

/// Prefix under which cloud records live.
pub const CLOUDS_PREFIX: &str = "secret/verdant/clouds";

/// Prefix under which cluster records live.
pub const CLUSTERS_PREFIX: &str = "secret/verdant/clusters";

/// Prefix under which chart secret bundles live.
pub const CHARTS_PREFIX: &str = "secret/verdant/charts";

/// Branch assumed when a cluster carries no chart-branch subscription.
pub const DEFAULT_BRANCH: &str = "master";

/// Path of a single cloud record.
pub fn cloud(name: &str) -> String {
    format!("{CLOUDS_PREFIX}/{name}")
}

/// Path of a single cluster record.
pub fn cluster(name: &str) -> String {
    format!("{CLUSTERS_PREFIX}/{name}")
}

/// Path of one chart's secret bundle, scoped to (branch, namespace, chart).
pub fn chart_secrets(branch: &str, namespace: &str, chart: &str) -> String {
    format!("{CHARTS_PREFIX}/{branch}/{namespace}/{chart}")
}
