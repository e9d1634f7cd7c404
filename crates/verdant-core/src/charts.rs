//! Chart discovery and namespace selection
//!
//! Chart sources live under a root directory with one subdirectory per
//! provisioner plus a universal `all/` directory:
//!
//! ```text
//! charts/
//!   all/            applied to every cluster
//!   minikube/       applied only to minikube clusters
//!   terraform/      applied only to terraform clusters
//! ```

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::chart::Chart;
use crate::error::Result;
use crate::provisioner::Provisioner;

/// Directory of charts that apply to every cluster.
pub const COMMON_CHART_DIR: &str = "all";

/// The resolved set of charts applicable to one cluster.
#[derive(Debug, Clone, Default)]
pub struct ChartSet {
    charts: Vec<Chart>,
}

impl ChartSet {
    /// Discover the charts applying to a cluster of the given provisioner.
    ///
    /// Walks `<root>/all` and `<root>/<provisioner>` recursively for `*.yaml`
    /// definition files. A chart is included iff its declared namespace is a
    /// member of `selection`, or `selection` is EMPTY - empty means every
    /// namespace, not none.
    ///
    /// Sources are treated as immutable for one run; calling this again
    /// re-reads them.
    pub fn discover(root: &Path, provisioner: Provisioner, selection: &[String]) -> Result<Self> {
        let mut charts = Vec::new();
        for dir in [COMMON_CHART_DIR, provisioner.chart_dir()] {
            let dir = root.join(dir);
            if !dir.is_dir() {
                tracing::debug!(dir = %dir.display(), "chart directory absent, skipping");
                continue;
            }
            for entry in WalkDir::new(&dir)
                .sort_by_file_name()
                .into_iter()
                .filter_map(|e| e.ok())
            {
                if !entry.file_type().is_file() {
                    continue;
                }
                if entry.path().extension().and_then(|e| e.to_str()) != Some("yaml") {
                    continue;
                }
                let chart = Chart::from_file(entry.path())?;
                if selection.is_empty() || selection.iter().any(|ns| *ns == chart.namespace) {
                    charts.push(chart);
                }
            }
        }
        Ok(Self { charts })
    }

    /// All charts, in discovery order.
    pub fn charts(&self) -> &[Chart] {
        &self.charts
    }

    /// Unique namespaces, in the order they were first seen.
    pub fn namespaces(&self) -> Vec<String> {
        let mut seen = indexmap::IndexSet::new();
        for chart in &self.charts {
            seen.insert(chart.namespace.clone());
        }
        seen.into_iter().collect()
    }

    /// Charts belonging to one namespace, in discovery order.
    pub fn in_namespace<'a>(&'a self, namespace: &'a str) -> impl Iterator<Item = &'a Chart> {
        self.charts.iter().filter(move |c| c.namespace == namespace)
    }

    /// Source file paths of the charts in one namespace.
    pub fn paths_for(&self, namespace: &str) -> Vec<PathBuf> {
        self.in_namespace(namespace).map(|c| c.source.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.charts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.charts.is_empty()
    }
}
