//! Namespace deployment via landscaper
//!
//! One apply call per namespace, handing every chart file for that namespace
//! to the tool at once. Secrets travel in the invocation's own environment.

use std::path::PathBuf;

use indexmap::IndexMap;

use crate::error::Result;
use crate::exec::{Invocation, Runner};

/// Apply every chart of one namespace against a cluster context.
pub fn deploy_namespace(
    runner: &dyn Runner,
    context: &str,
    namespace: &str,
    chart_paths: &[PathBuf],
    env: &IndexMap<String, String>,
    dry_run: bool,
) -> Result<()> {
    if chart_paths.is_empty() {
        tracing::debug!(%namespace, "no charts, nothing to deploy");
        return Ok(());
    }

    let mut apply = Invocation::new("landscaper")
        .arg("apply")
        .arg("-v")
        .arg(format!("--namespace={namespace}"))
        .arg(format!("--context={context}"))
        .envs(env);
    for path in chart_paths {
        apply = apply.arg(path.display().to_string());
    }
    if dry_run {
        apply = apply.arg("--dry-run");
    }

    tracing::info!(%namespace, charts = chart_paths.len(), "deploying namespace");
    runner.run_checked(&apply)
}
