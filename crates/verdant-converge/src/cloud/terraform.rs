//! Terraform clouds: a cloud-managed resource set
//!
//! Converging writes the cloud's credentials to a local key file, repairs
//! the remote-state linkage, initializes the backend, then plans - and,
//! outside dry-run, applies. Dry-run stops after the plan stage, always.

use std::path::PathBuf;

use verdant_core::Cloud;

use super::CloudOptions;
use crate::error::Result;
use crate::exec::{Invocation, Runner};
use crate::statefile::repair_state_link;

/// Attribute carrying the service-account credentials blob.
const ATTR_CREDENTIALS: &str = "credentials";
/// Attribute naming the managed cluster inside the plan (default "master").
const ATTR_CLUSTER_NAME: &str = "gke_cluster_name";
/// Attribute pinning the managed cluster version.
const ATTR_CLUSTER_VERSION: &str = "gke_cluster_version";

const DEFAULT_CLUSTER_NAME: &str = "master";
const DEFAULT_CLUSTER_VERSION: &str = "1.8.1-gke.0";

pub fn converge(cloud: &Cloud, runner: &dyn Runner, options: &CloudOptions) -> Result<()> {
    let credentials_file = write_credentials_file(cloud, options)?;
    let env_credentials = credentials_file.display().to_string();

    // The backend keeps a single well-known state path per directory; point
    // it at this cloud's state file before anything touches it.
    let link = options.terraform_dir.join(".terraform/terraform.tfstate");
    let state_file = format!("{}.tfstate", cloud.name);
    repair_state_link(&link, &state_file)?;

    if options.dry_run {
        tracing::info!(cloud = %cloud.name, "DRYRUN: skipping terraform init");
    } else {
        let init = terraform_cmd(options, &env_credentials)
            .arg("init")
            .arg(format!("-backend-config=bucket=tfstate-{}", cloud.name))
            .arg(format!("-backend-config=path=tfstate-{}", cloud.name))
            .arg(format!("-backend-config=project={}", cloud.name));
        runner.run_checked(&init)?;
    }

    let var_args = plan_variables(cloud);

    let validate = terraform_cmd(options, &env_credentials)
        .arg("validate")
        .args(var_args.clone());
    runner.run_checked(&validate)?;

    let plan = terraform_cmd(options, &env_credentials)
        .arg("plan")
        .args(var_args.clone())
        .arg(format!("-state={state_file}"));
    runner.run_checked(&plan)?;

    if options.dry_run {
        tracing::info!(cloud = %cloud.name, "DRYRUN: plan complete, skipping apply");
        return Ok(());
    }

    let apply = terraform_cmd(options, &env_credentials)
        .arg("apply")
        .args(var_args)
        .arg(format!("-state={state_file}"));
    runner.run_checked(&apply)
}

/// Templated `-var` flags identifying the logical environment.
fn plan_variables(cloud: &Cloud) -> Vec<String> {
    let cluster_name = cloud.attr(ATTR_CLUSTER_NAME).unwrap_or(DEFAULT_CLUSTER_NAME);
    let cluster_version = cloud
        .attr(ATTR_CLUSTER_VERSION)
        .unwrap_or(DEFAULT_CLUSTER_VERSION);
    vec![
        format!("-var=gce_project_id={}", cloud.name),
        format!("-var=gke_cluster1_name={cluster_name}"),
        format!("-var=gke_cluster1_version={cluster_version}"),
    ]
}

fn terraform_cmd(options: &CloudOptions, credentials_file: &str) -> Invocation {
    let tf_log = if tracing::enabled!(tracing::Level::DEBUG) {
        "TRACE"
    } else {
        "INFO"
    };
    Invocation::new("terraform")
        .current_dir(options.terraform_dir.clone())
        .env("GOOGLE_APPLICATION_CREDENTIALS", credentials_file)
        .env("TF_LOG", tf_log)
}

/// Write the credentials blob beside the plan templates for the duration of
/// the run.
fn write_credentials_file(cloud: &Cloud, options: &CloudOptions) -> Result<PathBuf> {
    let credentials = cloud.require_attr(ATTR_CREDENTIALS)?;
    let path = options
        .terraform_dir
        .join(format!("cloud-serviceaccount-{}.json", cloud.name));
    tracing::debug!(path = %path.display(), "writing application credentials");
    std::fs::write(&path, credentials)?;
    Ok(path)
}
