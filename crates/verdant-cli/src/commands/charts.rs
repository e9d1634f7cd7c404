//! Chart commands - list applicable charts and run the deploy pipeline

use std::path::{Path, PathBuf};

use console::style;

use verdant_core::{order_namespaces, ChartSet};
use verdant_converge::{ConvergePlan, Orchestrator, ShellRunner};
use verdant_store::{CloudCollection, ClusterCollection, KvStore};

use crate::error::Result;

pub fn list(
    store: &dyn KvStore,
    cluster: &str,
    charts_dir: &Path,
    namespaces: &[String],
) -> Result<()> {
    let cluster = ClusterCollection::load_named(store, cluster)?;
    let charts = ChartSet::discover(charts_dir, cluster.provisioner, namespaces)?;

    if charts.is_empty() {
        println!("{} no charts apply to {}", style("→").blue(), cluster.name);
        return Ok(());
    }

    println!(
        "{} {} chart(s) for {} in deploy order",
        style("→").blue(),
        charts.len(),
        cluster.name
    );
    for namespace in order_namespaces(&charts.namespaces()) {
        println!("  {} {}", style("•").green(), namespace);
        for chart in charts.in_namespace(&namespace) {
            if chart.requires_secrets() {
                println!("      {} ({} secret(s))", chart.name, chart.secrets.len());
            } else {
                println!("      {}", chart.name);
            }
        }
    }
    Ok(())
}

/// Arguments for a full chart convergence run.
pub struct ConvergeArgs {
    pub namespaces: Vec<String>,
    pub charts_dir: PathBuf,
    pub terraform_dir: PathBuf,
    pub converge_cloud: bool,
    pub converge_cluster: bool,
    pub converge_localmachine: bool,
    pub dry_run: bool,
}

pub fn converge(store: &dyn KvStore, cluster: &str, args: ConvergeArgs) -> Result<()> {
    let cluster = ClusterCollection::load_named(store, cluster)?;
    let cloud = CloudCollection::load_named(store, &cluster.cloud_id)?;

    let plan = ConvergePlan {
        converge_cloud: args.converge_cloud,
        converge_cluster: args.converge_cluster,
        converge_localmachine: args.converge_localmachine,
        dry_run: args.dry_run,
        namespaces: args.namespaces,
        charts_dir: args.charts_dir,
        terraform_dir: args.terraform_dir,
    };

    let runner = ShellRunner;
    Orchestrator::new(store, &runner).run(&cluster, &cloud, &plan)?;
    println!("{} cluster {} charts converged", style("✓").green(), cluster.name);
    Ok(())
}
