//! Cloud commands - list and converge clouds

use std::path::Path;
use std::sync::Arc;

use console::style;

use verdant_converge::{converge_cloud, CloudOptions, ShellRunner};
use verdant_store::{CloudCollection, KvStore};

use crate::error::Result;

pub fn list(store: Arc<dyn KvStore>, branch: Option<String>) -> Result<()> {
    let collection = CloudCollection::new(store, branch);
    let clouds = collection.clouds()?;

    if clouds.is_empty() {
        println!("{} no clouds found", style("→").blue());
        return Ok(());
    }

    println!("{} {} cloud(s)", style("→").blue(), clouds.len());
    for cloud in clouds {
        match cloud.branch.as_deref() {
            Some(branch) => println!(
                "  {} {} ({}, branch {})",
                style("•").green(),
                cloud.name,
                cloud.provisioner,
                branch
            ),
            None => println!("  {} {} ({})", style("•").green(), cloud.name, cloud.provisioner),
        }
    }
    Ok(())
}

pub fn converge(store: &dyn KvStore, name: &str, terraform_dir: &Path, dry_run: bool) -> Result<()> {
    let cloud = CloudCollection::load_named(store, name)?;
    let options = CloudOptions {
        dry_run,
        terraform_dir: terraform_dir.to_path_buf(),
    };
    converge_cloud(&cloud, &ShellRunner, &options)?;
    println!("{} cloud {} converged", style("✓").green(), cloud.name);
    Ok(())
}
