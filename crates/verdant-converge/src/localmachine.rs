//! Local-machine convergence
//!
//! The operator's workstation needs a client-side helm setup and,
//! optionally, the chart repository the cluster subscribes to.

use verdant_core::Cluster;

use crate::error::Result;
use crate::exec::{Invocation, Runner};

/// Attribute naming the chart repository as `<name>=<url>`.
const ATTR_CHART_REPO: &str = "chart_repo";

/// Prepare local tooling for a cluster: client-only helm init, plus the
/// cluster's chart repository when one is subscribed.
pub fn converge_localmachine(cluster: &Cluster, runner: &dyn Runner) -> Result<()> {
    tracing::info!(cluster = %cluster.name, "converging local machine");
    let init = Invocation::new("helm").arg("init").arg("--client-only");
    runner.run_checked(&init)?;

    if let Some(repo) = cluster.attr(ATTR_CHART_REPO) {
        match repo.split_once('=') {
            Some((name, url)) => {
                let add = Invocation::new("helm")
                    .arg("repo")
                    .arg("add")
                    .arg(name)
                    .arg(url);
                runner.run_checked(&add)?;
            }
            None => {
                tracing::warn!(value = repo, "chart_repo is not name=url, skipping");
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exec::RecordingRunner;
    use verdant_core::{Attributes, Cloud};

    fn cluster_with(attrs: &[(&str, &str)]) -> Cluster {
        let mut cloud_attrs = Attributes::new();
        cloud_attrs.insert("provisioner".to_string(), "minikube".to_string());
        let cloud = Cloud::from_attributes("minikube", cloud_attrs).unwrap();

        let mut cluster_attrs = Attributes::new();
        cluster_attrs.insert("cloud_id".to_string(), "minikube".to_string());
        for (k, v) in attrs {
            cluster_attrs.insert(k.to_string(), v.to_string());
        }
        Cluster::from_attributes("minikube", cluster_attrs, &cloud).unwrap()
    }

    #[test]
    fn client_only_init_always_runs() {
        let runner = RecordingRunner::new();
        converge_localmachine(&cluster_with(&[]), &runner).unwrap();
        assert_eq!(runner.command_lines(), vec!["helm init --client-only"]);
    }

    #[test]
    fn subscribed_repo_is_added() {
        let runner = RecordingRunner::new();
        let cluster = cluster_with(&[(ATTR_CHART_REPO, "internal=https://charts.corp.example")]);
        converge_localmachine(&cluster, &runner).unwrap();

        let lines = runner.command_lines();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1], "helm repo add internal https://charts.corp.example");
    }

    #[test]
    fn malformed_repo_value_is_skipped() {
        let runner = RecordingRunner::new();
        let cluster = cluster_with(&[(ATTR_CHART_REPO, "no-equals-sign")]);
        converge_localmachine(&cluster, &runner).unwrap();
        assert_eq!(runner.invocations().len(), 1);
    }
}
