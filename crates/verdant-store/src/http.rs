//! Vault KV-v1 compatible HTTP store client
//!
//! Configured from the environment the same way the vault CLI is:
//! `VAULT_ADDR` and `VAULT_TOKEN` are required, `VAULT_CACERT` additionally
//! when the address is https. Listing uses `GET <addr>/v1/<path>?list=true`,
//! reads use `GET <addr>/v1/<path>`; both wrap their payload in a `data`
//! envelope.

use indexmap::IndexMap;
use serde_json::Value;
use url::Url;
use verdant_core::Attributes;

use crate::error::{Result, StoreError};
use crate::store::KvStore;

const ENV_ADDR: &str = "VAULT_ADDR";
const ENV_TOKEN: &str = "VAULT_TOKEN";
const ENV_CACERT: &str = "VAULT_CACERT";
const TOKEN_HEADER: &str = "X-Vault-Token";

/// Blocking HTTP client for a Vault-style KV store
pub struct HttpStore {
    base: Url,
    token: String,
    client: reqwest::blocking::Client,
}

impl HttpStore {
    /// Build a client from `VAULT_ADDR` / `VAULT_TOKEN` / `VAULT_CACERT`.
    pub fn from_env() -> Result<Self> {
        let addr = require_env(ENV_ADDR)?;
        let token = require_env(ENV_TOKEN)?;

        let mut builder = reqwest::blocking::Client::builder();
        if addr.starts_with("https://") {
            let cacert = require_env(ENV_CACERT)?;
            let pem = std::fs::read(&cacert)?;
            let cert = reqwest::Certificate::from_pem(&pem).map_err(|e| {
                StoreError::InvalidAddress {
                    address: addr.clone(),
                    reason: format!("bad {ENV_CACERT}: {e}"),
                }
            })?;
            builder = builder.add_root_certificate(cert);
        }
        let client = builder.build()?;

        Self::new(&addr, &token, client)
    }

    fn new(addr: &str, token: &str, client: reqwest::blocking::Client) -> Result<Self> {
        let base = Url::parse(addr).map_err(|e| StoreError::InvalidAddress {
            address: addr.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self {
            base,
            token: token.to_string(),
            client,
        })
    }

    fn data_url(&self, path: &str) -> Result<Url> {
        Ok(self.base.join(&format!("v1/{path}"))?)
    }

    /// Fetch the `data` envelope at a path, or None on 404.
    fn fetch(&self, path: &str, list: bool) -> Result<Option<Value>> {
        let mut url = self.data_url(path)?;
        if list {
            url.set_query(Some("list=true"));
        }
        tracing::debug!(%url, "store request");
        let response = self
            .client
            .get(url)
            .header(TOKEN_HEADER, &self.token)
            .send()?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(StoreError::HttpStatus {
                status: response.status().as_u16(),
                path: path.to_string(),
            });
        }
        let body: Value = response.json().map_err(|e| StoreError::MalformedPayload {
            path: path.to_string(),
            message: e.to_string(),
        })?;
        Ok(Some(body["data"].clone()))
    }

    /// Keys directly under a prefix; sub-prefixes keep their trailing `/`.
    fn list_keys(&self, prefix: &str) -> Result<Vec<String>> {
        match self.fetch(prefix, true)? {
            None => Ok(Vec::new()),
            Some(data) => data["keys"]
                .as_array()
                .ok_or_else(|| StoreError::MalformedPayload {
                    path: prefix.to_string(),
                    message: "list response without keys array".to_string(),
                })?
                .iter()
                .map(|k| {
                    k.as_str().map(str::to_string).ok_or_else(|| {
                        StoreError::MalformedPayload {
                            path: prefix.to_string(),
                            message: "non-string key in list response".to_string(),
                        }
                    })
                })
                .collect(),
        }
    }

    fn dump_into(
        &self,
        prefix: &str,
        relative: &str,
        out: &mut IndexMap<String, Attributes>,
    ) -> Result<()> {
        for key in self.list_keys(prefix)? {
            if let Some(sub) = key.strip_suffix('/') {
                let rel = join_relative(relative, sub);
                self.dump_into(&format!("{prefix}/{sub}"), &rel, out)?;
            } else {
                let rel = join_relative(relative, &key);
                let attrs = self.read(&format!("{prefix}/{key}"))?;
                out.insert(rel, attrs);
            }
        }
        Ok(())
    }
}

fn join_relative(base: &str, key: &str) -> String {
    if base.is_empty() {
        key.to_string()
    } else {
        format!("{base}/{key}")
    }
}

fn require_env(variable: &str) -> Result<String> {
    std::env::var(variable).map_err(|_| StoreError::MissingEnv {
        variable: variable.to_string(),
    })
}

impl KvStore for HttpStore {
    fn dump(&self, prefix: &str) -> Result<IndexMap<String, Attributes>> {
        let mut out = IndexMap::new();
        self.dump_into(prefix, "", &mut out)?;
        Ok(out)
    }

    fn read(&self, path: &str) -> Result<Attributes> {
        let data = self.fetch(path, false)?.ok_or_else(|| StoreError::NoData {
            path: path.to_string(),
        })?;
        let object = data.as_object().ok_or_else(|| StoreError::MalformedPayload {
            path: path.to_string(),
            message: "read response data is not an object".to_string(),
        })?;
        let mut attrs = Attributes::new();
        for (key, value) in object {
            let text = match value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            attrs.insert(key.clone(), text);
        }
        Ok(attrs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_paths_join_without_leading_slash() {
        assert_eq!(join_relative("", "minikube"), "minikube");
        assert_eq!(join_relative("vpn", "openvpn"), "vpn/openvpn");
    }
}
