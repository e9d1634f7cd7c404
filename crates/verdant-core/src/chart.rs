//! Chart definitions
//!
//! A chart is a landscaper-style YAML file declaring a release into one
//! namespace, optionally requiring secrets:
//!
//! ```yaml
//! name: openvpn
//! namespace: vpn
//! release:
//!   chart: stable/openvpn:1.0.2
//! secrets:
//!   - server-key
//!   - ca-cert
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{CoreError, Result};

/// Raw YAML shape of a chart definition file.
#[derive(Debug, Deserialize)]
struct ChartFile {
    name: String,
    namespace: String,
    #[serde(default)]
    secrets: Vec<String>,
}

/// A deployable bundle definition scoped to one namespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chart {
    /// Release name
    pub name: String,
    /// Namespace the chart deploys into, exactly as declared in its source
    pub namespace: String,
    /// Required secret keys, in declaration order (may be empty)
    pub secrets: Vec<String>,
    /// Path of the source definition file
    pub source: PathBuf,
}

impl Chart {
    /// Parse a chart definition file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let parsed: ChartFile =
            serde_yaml::from_str(&text).map_err(|e| CoreError::MalformedChart {
                path: path.display().to_string(),
                message: e.to_string(),
            })?;
        Ok(Self {
            name: parsed.name,
            namespace: parsed.namespace,
            secrets: parsed.secrets,
            source: path.to_path_buf(),
        })
    }

    /// Whether the chart declares any required secrets.
    pub fn requires_secrets(&self) -> bool {
        !self.secrets.is_empty()
    }
}

impl std::fmt::Display for Chart {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_chart(dir: &Path, file: &str, contents: &str) -> PathBuf {
        let path = dir.join(file);
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn parses_minimal_chart() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_chart(dir.path(), "dns.yaml", "name: kube-dns\nnamespace: kube-system\n");
        let chart = Chart::from_file(&path).unwrap();
        assert_eq!(chart.name, "kube-dns");
        assert_eq!(chart.namespace, "kube-system");
        assert!(!chart.requires_secrets());
    }

    #[test]
    fn parses_secret_list_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_chart(
            dir.path(),
            "vpn.yaml",
            "name: openvpn\nnamespace: vpn\nsecrets:\n  - server-key\n  - ca-cert\n",
        );
        let chart = Chart::from_file(&path).unwrap();
        assert_eq!(chart.secrets, vec!["server-key", "ca-cert"]);
        assert!(chart.requires_secrets());
    }

    #[test]
    fn malformed_yaml_names_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_chart(dir.path(), "bad.yaml", "name: [unterminated\n");
        let err = Chart::from_file(&path).unwrap_err();
        assert!(err.to_string().contains("bad.yaml"));
    }
}
