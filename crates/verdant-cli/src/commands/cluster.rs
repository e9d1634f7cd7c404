//! Cluster commands - list and converge clusters

use std::path::Path;
use std::sync::Arc;

use console::style;

use verdant_converge::{
    converge_cloud, converge_cluster, CloudOptions, ClusterOptions, ShellRunner,
};
use verdant_store::{CloudCollection, ClusterCollection, KvStore};

use crate::error::Result;

pub fn list(store: Arc<dyn KvStore>, cloud: Option<String>, branch: Option<String>) -> Result<()> {
    let collection = ClusterCollection::new(store, branch, cloud);
    let clusters = collection.clusters()?;

    if clusters.is_empty() {
        println!("{} no clusters found", style("→").blue());
        return Ok(());
    }

    println!("{} {} cluster(s)", style("→").blue(), clusters.len());
    for cluster in clusters {
        println!(
            "  {} {} (cloud {}, {})",
            style("•").green(),
            cluster.name,
            cluster.cloud_id,
            cluster.provisioner
        );
    }
    Ok(())
}

pub fn converge(
    store: &dyn KvStore,
    name: &str,
    converge_backing_cloud: bool,
    terraform_dir: &Path,
    dry_run: bool,
) -> Result<()> {
    let cluster = ClusterCollection::load_named(store, name)?;
    let cloud = CloudCollection::load_named(store, &cluster.cloud_id)?;
    let runner = ShellRunner;

    if converge_backing_cloud {
        let options = CloudOptions {
            dry_run,
            terraform_dir: terraform_dir.to_path_buf(),
        };
        converge_cloud(&cloud, &runner, &options)?;
    }

    let options = ClusterOptions {
        dry_run,
        poll_seconds: 2,
    };
    converge_cluster(&cluster, &cloud, &runner, &options)?;
    println!("{} cluster {} converged", style("✓").green(), cluster.name);
    Ok(())
}
