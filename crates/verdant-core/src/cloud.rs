//! Cloud records
//!
//! A cloud is defined entirely by its attribute map in the store, e.g.:
//!
//! ```text
//! vault write secret/verdant/clouds/staging-123456 provisioner=terraform ...
//! vault write secret/verdant/clouds/minikube provisioner=minikube
//! ```

use crate::error::{CoreError, Result};
use crate::provisioner::Provisioner;
use crate::Attributes;

/// Attribute holding the branch a cloud subscribes to.
pub const ATTR_BRANCH: &str = "provisioner_branch";

/// A provisioned resource environment, immutable after construction.
#[derive(Debug, Clone)]
pub struct Cloud {
    /// Unique name identifying the cloud
    pub name: String,
    /// How the cloud is provisioned and converged
    pub provisioner: Provisioner,
    /// Branch subscription, if the cloud is branch-scoped
    pub branch: Option<String>,
    /// Remaining raw attributes (credentials blob, region/zone, ...)
    attributes: Attributes,
}

impl Cloud {
    /// Build a cloud from its raw store attributes.
    ///
    /// Fails when the `provisioner` discriminator is absent or unrecognized.
    pub fn from_attributes(name: &str, mut attributes: Attributes) -> Result<Self> {
        let discriminator =
            attributes
                .shift_remove("provisioner")
                .ok_or_else(|| CoreError::MissingAttribute {
                    entity: format!("cloud {name:?}"),
                    attribute: "provisioner".to_string(),
                })?;
        let provisioner = Provisioner::parse(&discriminator)?;
        let branch = attributes.shift_remove(ATTR_BRANCH);
        Ok(Self {
            name: name.to_string(),
            provisioner,
            branch,
            attributes,
        })
    }

    /// Look up a provisioner-specific attribute.
    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }

    /// Look up an attribute that must be present for the cloud to converge.
    pub fn require_attr(&self, key: &str) -> Result<&str> {
        self.attr(key).ok_or_else(|| CoreError::MissingAttribute {
            entity: format!("cloud {:?}", self.name),
            attribute: key.to_string(),
        })
    }

    /// Whether the cloud subscribes to `selector`. An unset selector matches
    /// every cloud.
    pub fn matches_branch(&self, selector: Option<&str>) -> bool {
        match selector {
            None => true,
            Some(branch) => self.branch.as_deref() == Some(branch),
        }
    }
}

impl std::fmt::Display for Cloud {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name)
    }
}
