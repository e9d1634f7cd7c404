//! Cluster records
//!
//! A cluster references its owning cloud by id only. The provisioner is
//! derived from the cloud at load time; the cluster record never declares
//! one of its own.

use crate::cloud::Cloud;
use crate::error::{CoreError, Result};
use crate::provisioner::Provisioner;
use crate::Attributes;

/// Attribute naming the owning cloud.
pub const ATTR_CLOUD_ID: &str = "cloud_id";
/// Attribute holding the chart branch the cluster subscribes to.
pub const ATTR_BRANCH: &str = "charts_branch";
/// Attribute holding the CSV list of subscribed namespaces.
pub const ATTR_NAMESPACES: &str = "namespaces";

/// A deployment target bound to exactly one cloud.
#[derive(Debug, Clone)]
pub struct Cluster {
    /// Unique name; doubles as the kubectl context name
    pub name: String,
    /// Owning cloud, by id (weak reference: lookup only, no ownership)
    pub cloud_id: String,
    /// Provisioner kind, always equal to the owning cloud's
    pub provisioner: Provisioner,
    /// Namespaces the cluster subscribes to
    pub namespaces: Vec<String>,
    /// Chart branch subscription, if branch-scoped
    pub branch: Option<String>,
    /// Remaining raw attributes (API endpoint, client credentials, ...)
    attributes: Attributes,
}

impl Cluster {
    /// Build a cluster from its raw store attributes and its resolved cloud.
    ///
    /// The cloud must be the one named by the record's `cloud_id`; the
    /// cluster inherits its provisioner from it.
    pub fn from_attributes(name: &str, mut attributes: Attributes, cloud: &Cloud) -> Result<Self> {
        let cloud_id =
            attributes
                .shift_remove(ATTR_CLOUD_ID)
                .ok_or_else(|| CoreError::MissingAttribute {
                    entity: format!("cluster {name:?}"),
                    attribute: ATTR_CLOUD_ID.to_string(),
                })?;
        debug_assert_eq!(cloud_id, cloud.name);
        let branch = attributes.shift_remove(ATTR_BRANCH);
        let namespaces = attributes
            .shift_remove(ATTR_NAMESPACES)
            .map(|csv| {
                csv.split(',')
                    .map(str::trim)
                    .filter(|ns| !ns.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();
        Ok(Self {
            name: name.to_string(),
            cloud_id,
            provisioner: cloud.provisioner,
            namespaces,
            branch,
            attributes,
        })
    }

    /// Peek at the `cloud_id` of a raw record without constructing a cluster.
    ///
    /// Loaders use this to resolve the owning cloud first.
    pub fn cloud_id_of(name: &str, attributes: &Attributes) -> Result<String> {
        attributes
            .get(ATTR_CLOUD_ID)
            .cloned()
            .ok_or_else(|| CoreError::MissingAttribute {
                entity: format!("cluster {name:?}"),
                attribute: ATTR_CLOUD_ID.to_string(),
            })
    }

    /// Look up a cluster-specific attribute.
    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }

    /// Look up an attribute that must be present for the cluster to converge.
    pub fn require_attr(&self, key: &str) -> Result<&str> {
        self.attr(key).ok_or_else(|| CoreError::MissingAttribute {
            entity: format!("cluster {:?}", self.name),
            attribute: key.to_string(),
        })
    }

    /// Whether the cluster subscribes to `selector` (unset matches all).
    pub fn matches_branch(&self, selector: Option<&str>) -> bool {
        match selector {
            None => true,
            Some(branch) => self.branch.as_deref() == Some(branch),
        }
    }
}

impl std::fmt::Display for Cluster {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attrs(pairs: &[(&str, &str)]) -> Attributes {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn minikube_cloud() -> Cloud {
        Cloud::from_attributes("minikube", attrs(&[("provisioner", "minikube")])).unwrap()
    }

    #[test]
    fn inherits_provisioner_from_cloud() {
        let cluster = Cluster::from_attributes(
            "minikube",
            attrs(&[("cloud_id", "minikube"), ("namespaces", "kube-system,app")]),
            &minikube_cloud(),
        )
        .unwrap();
        assert_eq!(cluster.provisioner, Provisioner::Minikube);
        assert_eq!(cluster.namespaces, vec!["kube-system", "app"]);
    }

    #[test]
    fn missing_cloud_id_is_an_error() {
        let err =
            Cluster::from_attributes("orphan", attrs(&[("namespaces", "app")]), &minikube_cloud())
                .unwrap_err();
        assert!(err.to_string().contains("cloud_id"));
    }

    #[test]
    fn namespace_csv_tolerates_whitespace_and_empties() {
        let cluster = Cluster::from_attributes(
            "minikube",
            attrs(&[("cloud_id", "minikube"), ("namespaces", " app , ,kube-system")]),
            &minikube_cloud(),
        )
        .unwrap();
        assert_eq!(cluster.namespaces, vec!["app", "kube-system"]);
    }
}
