//! Memoized, filtered entity collections
//!
//! A collection binds its filter criteria at construction and loads from
//! the store exactly once per process: first access populates an explicit
//! `OnceCell` cache, later accesses return the same data without touching
//! the store again.
//!
//! Resolving a single named entity goes through `load_named`, which reads
//! only that entity's record instead of enumerating the whole prefix.

use std::sync::Arc;

use once_cell::sync::OnceCell;
use verdant_core::{cluster, Cloud, Cluster};

use crate::error::{Result, StoreError};
use crate::paths;
use crate::store::KvStore;

/// Filtered view over the cloud prefix.
pub struct CloudCollection {
    store: Arc<dyn KvStore>,
    branch: Option<String>,
    cache: OnceCell<Vec<Cloud>>,
}

impl CloudCollection {
    /// Bind a collection to a branch selector (None matches every cloud).
    pub fn new(store: Arc<dyn KvStore>, branch: Option<String>) -> Self {
        Self {
            store,
            branch,
            cache: OnceCell::new(),
        }
    }

    /// All matching clouds, loaded on first call and memoized.
    pub fn clouds(&self) -> Result<&[Cloud]> {
        self.cache
            .get_or_try_init(|| self.load())
            .map(Vec::as_slice)
    }

    /// A single cloud out of the (possibly cached) collection.
    pub fn get(&self, name: &str) -> Result<&Cloud> {
        self.clouds()?
            .iter()
            .find(|c| c.name == name)
            .ok_or_else(|| StoreError::CloudNotFound {
                name: name.to_string(),
            })
    }

    /// Resolve one named cloud without enumerating the collection.
    pub fn load_named(store: &dyn KvStore, name: &str) -> Result<Cloud> {
        let attributes = store.read(&paths::cloud(name)).map_err(|e| match e {
            StoreError::NoData { .. } => StoreError::CloudNotFound {
                name: name.to_string(),
            },
            other => other,
        })?;
        Ok(Cloud::from_attributes(name, attributes)?)
    }

    fn load(&self) -> Result<Vec<Cloud>> {
        let entries = self.store.dump(paths::CLOUDS_PREFIX)?;
        tracing::debug!(count = entries.len(), "loaded cloud records");
        let mut clouds = Vec::new();
        for (name, attributes) in entries {
            let cloud = Cloud::from_attributes(&name, attributes)?;
            if cloud.matches_branch(self.branch.as_deref()) {
                clouds.push(cloud);
            }
        }
        Ok(clouds)
    }
}

/// Filtered view over the cluster prefix.
pub struct ClusterCollection {
    store: Arc<dyn KvStore>,
    branch: Option<String>,
    cloud: Option<String>,
    cache: OnceCell<Vec<Cluster>>,
}

impl ClusterCollection {
    /// Bind a collection to branch and cloud selectors (None matches all).
    pub fn new(store: Arc<dyn KvStore>, branch: Option<String>, cloud: Option<String>) -> Self {
        Self {
            store,
            branch,
            cloud,
            cache: OnceCell::new(),
        }
    }

    /// All matching clusters, loaded on first call and memoized.
    pub fn clusters(&self) -> Result<&[Cluster]> {
        self.cache
            .get_or_try_init(|| self.load())
            .map(Vec::as_slice)
    }

    /// A single cluster out of the (possibly cached) collection.
    pub fn get(&self, name: &str) -> Result<&Cluster> {
        self.clusters()?
            .iter()
            .find(|c| c.name == name)
            .ok_or_else(|| StoreError::ClusterNotFound {
                name: name.to_string(),
            })
    }

    /// Resolve one named cluster without enumerating the collection.
    ///
    /// Resolves the owning cloud too (another single-entity read), because
    /// the cluster's provisioner kind is derived from it.
    pub fn load_named(store: &dyn KvStore, name: &str) -> Result<Cluster> {
        let attributes = store.read(&paths::cluster(name)).map_err(|e| match e {
            StoreError::NoData { .. } => StoreError::ClusterNotFound {
                name: name.to_string(),
            },
            other => other,
        })?;
        let cloud_id = Cluster::cloud_id_of(name, &attributes)?;
        let cloud = CloudCollection::load_named(store, &cloud_id)?;
        Ok(Cluster::from_attributes(name, attributes, &cloud)?)
    }

    fn load(&self) -> Result<Vec<Cluster>> {
        let entries = self.store.dump(paths::CLUSTERS_PREFIX)?;
        tracing::debug!(count = entries.len(), "loaded cluster records");
        let mut clusters = Vec::new();
        for (name, attributes) in entries {
            // Filter on the raw record before resolving the owning cloud,
            // so filtered-out clusters cost no extra store reads.
            if let Some(branch) = self.branch.as_deref() {
                if attributes.get(cluster::ATTR_BRANCH).map(String::as_str) != Some(branch) {
                    continue;
                }
            }
            if let Some(cloud) = self.cloud.as_deref() {
                if attributes.get(cluster::ATTR_CLOUD_ID).map(String::as_str) != Some(cloud) {
                    continue;
                }
            }
            let cloud_id = Cluster::cloud_id_of(&name, &attributes)?;
            let cloud = CloudCollection::load_named(self.store.as_ref(), &cloud_id)?;
            clusters.push(Cluster::from_attributes(&name, attributes, &cloud)?);
        }
        Ok(clusters)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;
    use verdant_core::Provisioner;

    fn seeded_store() -> MemoryStore {
        let store = MemoryStore::new();
        store.put(
            "secret/verdant/clouds/minikube",
            [("provisioner", "minikube")],
        );
        store.put(
            "secret/verdant/clouds/staging-123456",
            [
                ("provisioner", "terraform"),
                ("provisioner_branch", "master"),
                ("credentials", "{}"),
            ],
        );
        store.put(
            "secret/verdant/clusters/minikube",
            [
                ("cloud_id", "minikube"),
                ("namespaces", "kube-system,app"),
            ],
        );
        store.put(
            "secret/verdant/clusters/staging-master",
            [
                ("cloud_id", "staging-123456"),
                ("charts_branch", "master"),
                ("namespaces", "app"),
            ],
        );
        store
    }

    #[test]
    fn second_access_does_not_requery_the_store() {
        let store = seeded_store();
        let collection = CloudCollection::new(Arc::new(store.clone()), None);
        let first = collection.clouds().unwrap().len();
        let dumps_after_first = store.operation_counts().dumps;
        let second = collection.clouds().unwrap().len();
        assert_eq!(first, second);
        assert_eq!(store.operation_counts().dumps, dumps_after_first);
    }

    #[test]
    fn branch_selector_filters_clouds() {
        let store = seeded_store();
        let collection =
            CloudCollection::new(Arc::new(store), Some("master".to_string()));
        let clouds = collection.clouds().unwrap();
        assert_eq!(clouds.len(), 1);
        assert_eq!(clouds[0].name, "staging-123456");
    }

    #[test]
    fn unset_selectors_match_everything() {
        let store = seeded_store();
        let clusters = ClusterCollection::new(Arc::new(store), None, None);
        assert_eq!(clusters.clusters().unwrap().len(), 2);
    }

    #[test]
    fn cloud_selector_filters_clusters() {
        let store = seeded_store();
        let clusters =
            ClusterCollection::new(Arc::new(store), None, Some("minikube".to_string()));
        let loaded = clusters.clusters().unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].name, "minikube");
    }

    #[test]
    fn cluster_inherits_provisioner_from_its_cloud() {
        let store = seeded_store();
        let cluster = ClusterCollection::load_named(&store, "staging-master").unwrap();
        assert_eq!(cluster.provisioner, Provisioner::Terraform);
        assert_eq!(cluster.cloud_id, "staging-123456");
    }

    #[test]
    fn load_named_uses_the_single_entity_path() {
        let store = seeded_store();
        let _ = CloudCollection::load_named(&store, "minikube").unwrap();
        let counts = store.operation_counts();
        assert_eq!(counts.dumps, 0);
        assert_eq!(counts.reads, 1);
    }

    #[test]
    fn unknown_provisioner_fails_the_whole_load() {
        let store = seeded_store();
        store.put("secret/verdant/clouds/weird", [("provisioner", "ansible")]);
        let collection = CloudCollection::new(Arc::new(store), None);
        let err = collection.clouds().unwrap_err();
        assert!(err.to_string().contains("ansible"));
    }

    #[test]
    fn missing_cluster_names_the_cluster() {
        let store = seeded_store();
        let err = ClusterCollection::load_named(&store, "ghost").unwrap_err();
        assert!(matches!(err, StoreError::ClusterNotFound { ref name } if name == "ghost"));
    }

    #[test]
    fn cluster_with_unresolvable_cloud_fails() {
        let store = seeded_store();
        store.put(
            "secret/verdant/clusters/orphan",
            [("cloud_id", "missing-cloud")],
        );
        let err = ClusterCollection::load_named(&store, "orphan").unwrap_err();
        assert!(matches!(err, StoreError::CloudNotFound { ref name } if name == "missing-cloud"));
    }
}
