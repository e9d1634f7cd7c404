//! Convergence orchestration
//!
//! Stages run in a fixed order: cloud, cluster, then each namespace's
//! secrets and charts, then the local machine. Every stage is fail-fast;
//! nothing after a failed stage runs. Namespaces deploy priority-first,
//! so RBAC and system plumbing land before application workloads.

use std::path::{Path, PathBuf};

use verdant_core::{order_namespaces, ChartSet, Cloud, Cluster};
use verdant_store::{paths, KvStore};

use crate::cloud::{converge_cloud, CloudOptions};
use crate::cluster::{converge_cluster, ClusterOptions};
use crate::deploy::deploy_namespace;
use crate::error::{ConvergeError, Result};
use crate::exec::{Invocation, Runner};
use crate::localmachine::converge_localmachine;
use crate::secrets;

/// What one convergence run covers.
#[derive(Debug, Clone)]
pub struct ConvergePlan {
    /// Converge the backing cloud first
    pub converge_cloud: bool,
    /// Converge the cluster before deploying charts
    pub converge_cluster: bool,
    /// Converge local tooling after the charts
    pub converge_localmachine: bool,
    /// Simulate every stage
    pub dry_run: bool,
    /// Namespace selection; empty selects every namespace
    pub namespaces: Vec<String>,
    /// Root of the chart source tree
    pub charts_dir: PathBuf,
    /// Directory holding the declarative cloud templates
    pub terraform_dir: PathBuf,
}

impl Default for ConvergePlan {
    fn default() -> Self {
        Self {
            converge_cloud: false,
            converge_cluster: false,
            converge_localmachine: false,
            dry_run: false,
            namespaces: Vec::new(),
            charts_dir: PathBuf::from("."),
            terraform_dir: PathBuf::from("../terraform"),
        }
    }
}

/// Drives a full convergence run against one cluster.
pub struct Orchestrator<'a> {
    store: &'a dyn KvStore,
    runner: &'a dyn Runner,
}

impl<'a> Orchestrator<'a> {
    pub fn new(store: &'a dyn KvStore, runner: &'a dyn Runner) -> Self {
        Self { store, runner }
    }

    /// Run the plan's stages against `cluster` on `cloud`, stopping at the
    /// first failure.
    pub fn run(&self, cluster: &Cluster, cloud: &Cloud, plan: &ConvergePlan) -> Result<()> {
        if plan.converge_cloud {
            let options = CloudOptions {
                dry_run: plan.dry_run,
                terraform_dir: plan.terraform_dir.clone(),
            };
            converge_cloud(cloud, self.runner, &options)?;
        }

        if plan.converge_cluster {
            let options = ClusterOptions {
                dry_run: plan.dry_run,
                poll_seconds: 2,
            };
            converge_cluster(cluster, cloud, self.runner, &options)?;
        }

        // A branch-subscribed cluster must never receive another branch's
        // checkout; unsubscribed clusters take whatever is checked out.
        if let Some(subscribed) = cluster.branch.as_deref() {
            verify_charts_branch(self.runner, &plan.charts_dir, subscribed)?;
        }

        let charts = ChartSet::discover(&plan.charts_dir, cluster.provisioner, &plan.namespaces)?;
        let branch = cluster.branch.as_deref().unwrap_or(paths::DEFAULT_BRANCH);
        tracing::info!(
            cluster = %cluster.name,
            charts = charts.len(),
            %branch,
            "deploying charts"
        );

        for namespace in order_namespaces(&charts.namespaces()) {
            let env = secrets::aggregate(self.store, branch, &namespace, &charts)?;
            deploy_namespace(
                self.runner,
                &cluster.name,
                &namespace,
                &charts.paths_for(&namespace),
                &env,
                plan.dry_run,
            )?;
        }

        if plan.converge_localmachine {
            converge_localmachine(cluster, self.runner)?;
        }
        Ok(())
    }
}

/// Probe the charts checkout's git branch and compare it with the cluster's
/// subscription.
fn verify_charts_branch(runner: &dyn Runner, charts_dir: &Path, expected: &str) -> Result<()> {
    let probe = Invocation::new("git")
        .arg("-C")
        .arg(charts_dir.display().to_string())
        .arg("rev-parse")
        .arg("--abbrev-ref")
        .arg("HEAD");
    let output = runner.capture(&probe)?;
    if !output.success() {
        return Err(ConvergeError::CommandFailed {
            program: "git".to_string(),
            status: output.status,
        });
    }
    let actual = output.stdout_trimmed();
    if actual != expected {
        return Err(ConvergeError::ChartsBranchMismatch {
            expected: expected.to_string(),
            actual: actual.to_string(),
        });
    }
    tracing::debug!(branch = actual, "charts checkout matches subscription");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::path::Path;

    use crate::exec::RecordingRunner;
    use crate::ConvergeError;
    use verdant_core::Attributes;
    use verdant_store::MemoryStore;

    fn write_chart(root: &Path, rel: &str, body: &str) {
        let path = root.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        let mut f = std::fs::File::create(&path).unwrap();
        write!(f, "{body}").unwrap();
    }

    fn minikube_pair() -> (Cluster, Cloud) {
        let mut cloud_attrs = Attributes::new();
        cloud_attrs.insert("provisioner".to_string(), "minikube".to_string());
        let cloud = Cloud::from_attributes("minikube", cloud_attrs).unwrap();

        let mut cluster_attrs = Attributes::new();
        cluster_attrs.insert("cloud_id".to_string(), "minikube".to_string());
        let cluster = Cluster::from_attributes("minikube", cluster_attrs, &cloud).unwrap();
        (cluster, cloud)
    }

    fn charts_fixture() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        write_chart(
            dir.path(),
            "all/app/frontend.yaml",
            "name: frontend\nnamespace: app\nsecrets:\n  - db-pass\n",
        );
        write_chart(
            dir.path(),
            "all/kube-system/policy.yaml",
            "name: policy\nnamespace: kube-system\n",
        );
        write_chart(
            dir.path(),
            "all/auto-approve-csrs/approver.yaml",
            "name: approver\nnamespace: auto-approve-csrs\n",
        );
        dir
    }

    fn plan_for(dir: &Path) -> ConvergePlan {
        ConvergePlan {
            charts_dir: dir.to_path_buf(),
            ..ConvergePlan::default()
        }
    }

    #[test]
    fn namespaces_deploy_priority_first() {
        let dir = charts_fixture();
        let store = MemoryStore::new();
        store.put(
            &paths::chart_secrets("master", "app", "frontend"),
            [("db-pass", "s3cret")],
        );
        let runner = RecordingRunner::new();
        let (cluster, cloud) = minikube_pair();

        Orchestrator::new(&store, &runner)
            .run(&cluster, &cloud, &plan_for(dir.path()))
            .unwrap();

        let lines = runner.command_lines();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].contains("--namespace=auto-approve-csrs"));
        assert!(lines[1].contains("--namespace=kube-system"));
        assert!(lines[2].contains("--namespace=app"));
    }

    #[test]
    fn aggregated_secrets_reach_the_apply_invocation() {
        let dir = charts_fixture();
        let store = MemoryStore::new();
        store.put(
            &paths::chart_secrets("master", "app", "frontend"),
            [("db-pass", "s3cret")],
        );
        let runner = RecordingRunner::new();
        let (cluster, cloud) = minikube_pair();

        Orchestrator::new(&store, &runner)
            .run(&cluster, &cloud, &plan_for(dir.path()))
            .unwrap();

        let apply = runner
            .invocations()
            .into_iter()
            .find(|i| i.command_line().contains("--namespace=app"))
            .unwrap();
        assert_eq!(apply.environment()["DB_PASS"], "s3cret");
    }

    #[test]
    fn missing_secrets_abort_before_any_deploy_of_that_namespace() {
        let dir = charts_fixture();
        let store = MemoryStore::new(); // no secrets stored at all
        let runner = RecordingRunner::new();
        let (cluster, cloud) = minikube_pair();

        let err = Orchestrator::new(&store, &runner)
            .run(&cluster, &cloud, &plan_for(dir.path()))
            .unwrap_err();
        assert!(matches!(err, ConvergeError::MissingSecrets { .. }));

        // the secretless priority namespaces deployed before the failure
        let lines = runner.command_lines();
        assert_eq!(lines.len(), 2);
        assert!(!lines.iter().any(|l| l.contains("--namespace=app")));
    }

    #[test]
    fn failed_deploy_stops_the_run() {
        let dir = charts_fixture();
        let store = MemoryStore::new();
        store.put(
            &paths::chart_secrets("master", "app", "frontend"),
            [("db-pass", "s3cret")],
        );
        let runner = RecordingRunner::new();
        runner.push_status(1); // first landscaper apply fails
        let (cluster, cloud) = minikube_pair();

        let err = Orchestrator::new(&store, &runner)
            .run(&cluster, &cloud, &plan_for(dir.path()))
            .unwrap_err();
        assert_eq!(err.external_status(), Some(1));
        assert_eq!(runner.invocations().len(), 1);
    }

    #[test]
    fn selection_narrows_the_run_to_named_namespaces() {
        let dir = charts_fixture();
        let store = MemoryStore::new();
        let runner = RecordingRunner::new();
        let (cluster, cloud) = minikube_pair();

        let plan = ConvergePlan {
            namespaces: vec!["kube-system".to_string()],
            ..plan_for(dir.path())
        };
        Orchestrator::new(&store, &runner).run(&cluster, &cloud, &plan).unwrap();

        let lines = runner.command_lines();
        assert_eq!(lines.len(), 1);
        assert!(lines[0].contains("--namespace=kube-system"));
    }

    fn branch_subscribed_pair() -> (Cluster, Cloud) {
        let mut cloud_attrs = Attributes::new();
        cloud_attrs.insert("provisioner".to_string(), "minikube".to_string());
        let cloud = Cloud::from_attributes("minikube", cloud_attrs).unwrap();

        let mut cluster_attrs = Attributes::new();
        cluster_attrs.insert("cloud_id".to_string(), "minikube".to_string());
        cluster_attrs.insert("charts_branch".to_string(), "master".to_string());
        let cluster = Cluster::from_attributes("minikube", cluster_attrs, &cloud).unwrap();
        (cluster, cloud)
    }

    #[test]
    fn subscribed_cluster_deploys_a_matching_checkout() {
        let dir = charts_fixture();
        let store = MemoryStore::new();
        store.put(
            &paths::chart_secrets("master", "app", "frontend"),
            [("db-pass", "s3cret")],
        );
        let runner = RecordingRunner::new();
        runner.push_capture("master\n"); // git branch probe
        let (cluster, cloud) = branch_subscribed_pair();

        Orchestrator::new(&store, &runner)
            .run(&cluster, &cloud, &plan_for(dir.path()))
            .unwrap();

        let lines = runner.command_lines();
        assert!(lines[0].starts_with("git -C"));
        assert!(lines[1].contains("landscaper apply"));
    }

    #[test]
    fn checkout_on_the_wrong_branch_aborts_before_discovery() {
        let dir = charts_fixture();
        let store = MemoryStore::new();
        let runner = RecordingRunner::new();
        runner.push_capture("feature-x\n");
        let (cluster, cloud) = branch_subscribed_pair();

        let err = Orchestrator::new(&store, &runner)
            .run(&cluster, &cloud, &plan_for(dir.path()))
            .unwrap_err();
        assert!(matches!(
            err,
            ConvergeError::ChartsBranchMismatch { ref expected, ref actual }
                if expected == "master" && actual == "feature-x"
        ));
        // only the probe ran; nothing was deployed
        assert_eq!(runner.invocations().len(), 1);
    }

    #[test]
    fn unsubscribed_cluster_skips_the_branch_probe() {
        let dir = charts_fixture();
        let store = MemoryStore::new();
        store.put(
            &paths::chart_secrets("master", "app", "frontend"),
            [("db-pass", "s3cret")],
        );
        let runner = RecordingRunner::new();
        let (cluster, cloud) = minikube_pair();

        Orchestrator::new(&store, &runner)
            .run(&cluster, &cloud, &plan_for(dir.path()))
            .unwrap();
        assert!(!runner.command_lines().iter().any(|l| l.starts_with("git")));
    }

    #[test]
    fn optional_stages_run_when_enabled() {
        let dir = charts_fixture();
        let store = MemoryStore::new();
        store.put(
            &paths::chart_secrets("master", "app", "frontend"),
            [("db-pass", "s3cret")],
        );
        let runner = RecordingRunner::new();
        runner.push_capture("Running\n"); // minikube VM probe
        runner.push_capture("Running"); // controller probe
        let (cluster, cloud) = minikube_pair();

        let plan = ConvergePlan {
            converge_cloud: true,
            converge_cluster: true,
            converge_localmachine: true,
            ..plan_for(dir.path())
        };
        Orchestrator::new(&store, &runner).run(&cluster, &cloud, &plan).unwrap();

        let lines = runner.command_lines();
        assert!(lines[0].starts_with("minikube status"));
        assert!(lines.iter().any(|l| l.starts_with("kubectl get pod")));
        assert!(lines.iter().any(|l| l.starts_with("landscaper apply")));
        assert_eq!(lines.last().unwrap(), "helm init --client-only");
    }

    #[test]
    fn dry_run_reaches_apply_with_the_flag() {
        let dir = charts_fixture();
        let store = MemoryStore::new();
        store.put(
            &paths::chart_secrets("master", "app", "frontend"),
            [("db-pass", "s3cret")],
        );
        let runner = RecordingRunner::new();
        let (cluster, cloud) = minikube_pair();

        let plan = ConvergePlan {
            dry_run: true,
            ..plan_for(dir.path())
        };
        Orchestrator::new(&store, &runner).run(&cluster, &cloud, &plan).unwrap();
        assert!(runner.command_lines().iter().all(|l| l.ends_with("--dry-run")));
    }
}
