//! Minikube clouds: a self-hosted local VM
//!
//! Converging probes the VM's running state first; an already-running VM is
//! re-used, never restarted. The start sequence is idempotent but only runs
//! when the probe says the VM is not up.

use verdant_core::Cloud;

use crate::error::Result;
use crate::exec::{Invocation, Runner};

const RUNNING: &str = "Running";

/// Attribute enabling the VM clock-resync workaround after start.
/// Laptops that sleep leave the VM clock far enough behind to break TLS.
const ATTR_CLOCK_RESYNC: &str = "clock_resync";

pub fn converge(cloud: &Cloud, runner: &dyn Runner, dry_run: bool) -> Result<()> {
    let probe = Invocation::new("minikube")
        .arg("status")
        .arg("--format={{.Host}}");
    let status = runner.capture(&probe)?;
    tracing::debug!(state = status.stdout_trimmed(), "minikube VM state");

    if status.stdout_trimmed() == RUNNING {
        if dry_run {
            tracing::info!("DRYRUN: would be re-using previously provisioned VM");
        } else {
            tracing::info!("re-using previously provisioned VM");
        }
        return Ok(());
    }

    if dry_run {
        tracing::info!("DRYRUN: would be initializing minikube VM");
        return Ok(());
    }
    tracing::info!("initializing minikube VM");
    start_vm(cloud, runner)
}

/// Start the VM with fixed resource sizing and RBAC-enabled apiserver.
fn start_vm(cloud: &Cloud, runner: &dyn Runner) -> Result<()> {
    let start = Invocation::new("minikube")
        .arg("start")
        .arg("--kubernetes-version=v1.8.0")
        .arg("--dns-domain=cluster.local")
        .arg("--extra-config=apiserver.Authorization.Mode=RBAC")
        .arg("--cpus=8")
        .arg("--disk-size=20g")
        .arg("--memory=8192")
        .arg("--keep-context")
        .arg("-v=2");
    runner.run_checked(&start)?;

    if cloud.attr(ATTR_CLOCK_RESYNC) == Some("true") {
        let resync = Invocation::new("minikube")
            .arg("ssh")
            .arg("--")
            .arg("sudo hwclock -s");
        if runner.run(&resync)? != 0 {
            tracing::warn!("VM clock resync failed, continuing");
        }
    }
    Ok(())
}
