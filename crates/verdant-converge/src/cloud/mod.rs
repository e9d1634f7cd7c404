//! Cloud convergence, dispatched over the closed provisioner set
//!
//! All three variants converge through the same entry point; what differs
//! is everything behind it. Unmanaged clouds participate in the pipeline
//! uniformly but never cause side effects.

mod minikube;
mod terraform;
mod unmanaged;

use std::path::PathBuf;

use verdant_core::{Cloud, Provisioner};

use crate::error::Result;
use crate::exec::Runner;

/// Options for a cloud convergence pass.
#[derive(Debug, Clone)]
pub struct CloudOptions {
    /// Simulate: probe and plan, never initialize or apply
    pub dry_run: bool,
    /// Directory holding the declarative plan templates
    pub terraform_dir: PathBuf,
}

impl Default for CloudOptions {
    fn default() -> Self {
        Self {
            dry_run: false,
            terraform_dir: PathBuf::from("../terraform"),
        }
    }
}

/// Converge a cloud toward its declared state.
pub fn converge_cloud(cloud: &Cloud, runner: &dyn Runner, options: &CloudOptions) -> Result<()> {
    tracing::info!(cloud = %cloud.name, provisioner = %cloud.provisioner, "converging cloud");
    match cloud.provisioner {
        Provisioner::Minikube => minikube::converge(cloud, runner, options.dry_run),
        Provisioner::Terraform => terraform::converge(cloud, runner, options),
        Provisioner::Unmanaged => unmanaged::converge(cloud, options.dry_run),
    }
}
