//! Cluster convergence
//!
//! Two stages for every variant: configure client credentials for the
//! cluster's context, then make sure the in-cluster deployment controller
//! (tiller) is up, bootstrapping its RBAC and initializing it if the probe
//! says it is not running. The readiness wait blocks without an internal
//! timeout; a hung cluster hangs the run, by design.

use std::time::Duration;

use verdant_core::{Cloud, Cluster, Provisioner};

use crate::error::{ConvergeError, Result};
use crate::exec::{Invocation, Runner};

const CONTROLLER_NAMESPACE: &str = "kube-system";
const CONTROLLER_ACCOUNT: &str = "tiller";
const RUNNING: &str = "Running";

/// Attribute names for unmanaged cluster credentials.
const ATTR_APISERVER: &str = "kubernetes_apiserver";
const ATTR_CLIENT_KEY: &str = "kubernetes_client_key";
const ATTR_CLIENT_CERT: &str = "kubernetes_client_certificate";
const ATTR_APISERVER_CA: &str = "kubernetes_apiserver_cacert";

/// Attribute names for managed cluster credential retrieval.
const ATTR_CLUSTER_ZONE: &str = "gke_cluster_zone";
const ATTR_CLUSTER_NAME: &str = "gke_cluster_name";

/// Options for a cluster convergence pass.
#[derive(Debug, Clone, Default)]
pub struct ClusterOptions {
    /// Simulate: log the probe, run nothing
    pub dry_run: bool,
    /// Seconds between readiness probes
    pub poll_seconds: u64,
}

impl ClusterOptions {
    fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_seconds.max(1))
    }
}

/// Converge a cluster: credentials, then controller readiness.
pub fn converge_cluster(
    cluster: &Cluster,
    cloud: &Cloud,
    runner: &dyn Runner,
    options: &ClusterOptions,
) -> Result<()> {
    tracing::info!(cluster = %cluster.name, provisioner = %cluster.provisioner, "converging cluster");
    configure_credentials(cluster, cloud, runner, options)?;
    bootstrap_controller(cluster, runner, options)
}

fn configure_credentials(
    cluster: &Cluster,
    cloud: &Cloud,
    runner: &dyn Runner,
    options: &ClusterOptions,
) -> Result<()> {
    match cluster.provisioner {
        Provisioner::Minikube => {
            // minikube start already wrote the kubeconfig entry
            tracing::info!("using minikube's pre-configured kubeconfig entry");
            Ok(())
        }
        Provisioner::Terraform => {
            configure_managed_credentials(cluster, cloud, runner, options)
        }
        Provisioner::Unmanaged => configure_unmanaged_credentials(cluster, runner, options),
    }
}

/// Authenticate the cloud SDK with the cloud's service account and pull
/// cluster credentials into the kubeconfig.
fn configure_managed_credentials(
    cluster: &Cluster,
    cloud: &Cloud,
    runner: &dyn Runner,
    options: &ClusterOptions,
) -> Result<()> {
    let credentials = cloud.require_attr("credentials")?;
    let key_file = std::env::temp_dir().join(format!("cluster-serviceaccount-{}.json", cluster.name));
    std::fs::write(&key_file, credentials)?;
    let key_file = key_file.display().to_string();

    let email = service_account_email(cloud, credentials)?;
    let auth = Invocation::new("gcloud")
        .arg("auth")
        .arg("activate-service-account")
        .arg(&email)
        .arg(format!("--key-file={key_file}"))
        .env("GOOGLE_APPLICATION_CREDENTIALS", &key_file);

    let zone = cluster.require_attr(ATTR_CLUSTER_ZONE)?;
    let managed_name = cluster.require_attr(ATTR_CLUSTER_NAME)?;
    let get_credentials = Invocation::new("gcloud")
        .arg("container")
        .arg("clusters")
        .arg("get-credentials")
        .arg(format!("--project={}", cluster.cloud_id))
        .arg(format!("--zone={zone}"))
        .arg(managed_name)
        .env("GOOGLE_APPLICATION_CREDENTIALS", &key_file);

    if options.dry_run {
        tracing::info!(command = %auth.command_line(), "DRYRUN: would authenticate");
        tracing::info!(command = %get_credentials.command_line(), "DRYRUN: would fetch credentials");
        return Ok(());
    }
    runner.run_checked(&auth)?;
    runner.run_checked(&get_credentials)
}

/// The service-account email inside a credentials blob.
fn service_account_email(cloud: &Cloud, credentials: &str) -> Result<String> {
    let parsed: serde_json::Value =
        serde_json::from_str(credentials).map_err(|e| ConvergeError::MalformedCredentials {
            cloud: cloud.name.clone(),
            message: e.to_string(),
        })?;
    parsed["client_email"]
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| ConvergeError::MalformedCredentials {
            cloud: cloud.name.clone(),
            message: "no client_email field".to_string(),
        })
}

/// Write kubeconfig user/cluster/context entries from the cluster's stored
/// credential attributes.
fn configure_unmanaged_credentials(
    cluster: &Cluster,
    runner: &dyn Runner,
    options: &ClusterOptions,
) -> Result<()> {
    let user_attrs = [
        ("client-certificate-data", cluster.require_attr(ATTR_CLIENT_CERT)?),
        ("client-key-data", cluster.require_attr(ATTR_CLIENT_KEY)?),
    ];
    let cluster_attrs = [
        ("server", cluster.require_attr(ATTR_APISERVER)?),
        ("certificate-authority-data", cluster.require_attr(ATTR_APISERVER_CA)?),
    ];
    let context_attrs = [("cluster", cluster.name.as_str()), ("user", cluster.name.as_str())];

    let mut commands = Vec::new();
    for (attr, value) in user_attrs {
        commands.push(config_set(format!("users.{}.{attr}", cluster.name), value));
    }
    for (attr, value) in cluster_attrs {
        commands.push(config_set(format!("clusters.{}.{attr}", cluster.name), value));
    }
    for (attr, value) in context_attrs {
        commands.push(config_set(format!("contexts.{}.{attr}", cluster.name), value));
    }

    for command in commands {
        if options.dry_run {
            tracing::info!(command = %command.command_line(), "DRYRUN: would set kubeconfig entry");
        } else {
            runner.run_checked(&command)?;
        }
    }
    Ok(())
}

fn config_set(path: String, value: &str) -> Invocation {
    Invocation::new("kubectl")
        .arg("config")
        .arg("set")
        .arg(path)
        .arg(value)
}

/// Probe the deployment controller; bootstrap it if absent; block until it
/// reports `Running`.
fn bootstrap_controller(cluster: &Cluster, runner: &dyn Runner, options: &ClusterOptions) -> Result<()> {
    let probe = controller_probe(cluster);
    if options.dry_run {
        tracing::info!(command = %probe.command_line(), "DRYRUN: would probe deployment controller");
        return Ok(());
    }

    let phase = runner.capture(&probe)?;
    if phase.stdout_trimmed() == RUNNING {
        tracing::info!("detected running deployment controller");
        return Ok(());
    }
    tracing::info!("deployment controller not detected, initializing");
    init_controller(cluster, runner)?;

    // Initialization returns before the controller accepts connections.
    loop {
        let phase = runner.capture(&probe)?;
        if phase.stdout_trimmed() == RUNNING {
            break;
        }
        tracing::info!(
            phase = phase.stdout_trimmed(),
            "waiting for deployment controller"
        );
        std::thread::sleep(options.poll_interval());
    }
    tracing::info!("deployment controller ready");
    Ok(())
}

fn controller_probe(cluster: &Cluster) -> Invocation {
    Invocation::new("kubectl")
        .arg("get")
        .arg("pod")
        .arg(format!("--context={}", cluster.name))
        .arg(format!("--namespace={CONTROLLER_NAMESPACE}"))
        .arg("-l")
        .arg("app=helm")
        .arg("-l")
        .arg("name=tiller")
        .arg("-o")
        .arg("jsonpath={.items[0].status.phase}")
}

/// Service account + cluster-admin binding, then controller install.
fn init_controller(cluster: &Cluster, runner: &dyn Runner) -> Result<()> {
    let create_account = Invocation::new("kubectl")
        .arg("create")
        .arg("serviceaccount")
        .arg(CONTROLLER_ACCOUNT)
        .arg(format!("--context={}", cluster.name))
        .arg(format!("--namespace={CONTROLLER_NAMESPACE}"));
    if runner.run(&create_account)? != 0 {
        tracing::warn!("service account creation failed (may already exist)");
    }

    let create_binding = Invocation::new("kubectl")
        .arg("create")
        .arg("clusterrolebinding")
        .arg(format!("verdant-{CONTROLLER_ACCOUNT}"))
        .arg(format!("--context={}", cluster.name))
        .arg("--clusterrole=cluster-admin")
        .arg(format!("--serviceaccount={CONTROLLER_NAMESPACE}:{CONTROLLER_ACCOUNT}"));
    if runner.run(&create_binding)? != 0 {
        tracing::warn!("clusterrolebinding creation failed (may already exist)");
    }

    let init = Invocation::new("helm")
        .arg("init")
        .arg(format!("--service-account={CONTROLLER_ACCOUNT}"))
        .arg(format!("--kube-context={}", cluster.name));
    runner.run_checked(&init)
}
