//! Provisioner variants
//!
//! Every cloud record in the store carries a `provisioner` discriminator
//! attribute. The set is closed: an unrecognized value is a fatal
//! configuration error, never a fallback.

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

/// The tool that provisioned (and converges) a cloud.
///
/// A cluster never declares its own provisioner; it inherits the one of its
/// owning cloud.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provisioner {
    /// Self-hosted local VM, driven by minikube
    Minikube,
    /// Cloud-managed environment, driven by terraform
    Terraform,
    /// Provisioned outside of this tool; converge is a deliberate no-op
    Unmanaged,
}

impl Provisioner {
    /// Parse the store discriminator value.
    pub fn parse(value: &str) -> Result<Self> {
        match value {
            "minikube" => Ok(Self::Minikube),
            "terraform" => Ok(Self::Terraform),
            "unmanaged" => Ok(Self::Unmanaged),
            other => Err(CoreError::UnknownProvisioner {
                value: other.to_string(),
            }),
        }
    }

    /// Wire tag, as stored in the `provisioner` attribute.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Minikube => "minikube",
            Self::Terraform => "terraform",
            Self::Unmanaged => "unmanaged",
        }
    }

    /// Name of the provisioner-specific chart source directory.
    ///
    /// Charts under this directory apply only to clusters of this
    /// provisioner; charts under `all/` apply everywhere.
    pub const fn chart_dir(&self) -> &'static str {
        self.as_str()
    }
}

impl std::fmt::Display for Provisioner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_tags() {
        assert_eq!(Provisioner::parse("minikube").unwrap(), Provisioner::Minikube);
        assert_eq!(Provisioner::parse("terraform").unwrap(), Provisioner::Terraform);
        assert_eq!(Provisioner::parse("unmanaged").unwrap(), Provisioner::Unmanaged);
    }

    #[test]
    fn unknown_tag_is_fatal_and_names_the_value() {
        let err = Provisioner::parse("cloudformation").unwrap_err();
        assert!(err.to_string().contains("cloudformation"));
    }

    #[test]
    fn chart_dir_matches_wire_tag() {
        assert_eq!(Provisioner::Minikube.chart_dir(), "minikube");
        assert_eq!(Provisioner::Terraform.chart_dir(), "terraform");
        assert_eq!(Provisioner::Unmanaged.chart_dir(), "unmanaged");
    }
}
