//! Lab configuration
//!
//! An optional YAML lab file describes the cluster, registry and GitOps source.
//! Every field has a default, so a file only needs the values it changes;
//! explicit CLI flags win over the file.
//!
//! ```yaml
//! cluster:
//!   name: kubelab
//!   httpPort: 80
//! gitops:
//!   repoUrl: https://github.com/example/kubelab.git
//!   revision: main
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use kubelab_common::{DEFAULT_CLUSTER_NAME, LAB_HOSTNAMES};

use crate::{Error, Result};

/// Registry image used for the local pull-through registry
pub const REGISTRY_IMAGE: &str = "registry:2";

/// Port the registry container listens on inside the docker network
pub const REGISTRY_CONTAINER_PORT: u16 = 5000;

/// Full lab configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LabConfig {
    pub cluster: ClusterConfig,
    pub registry: RegistryConfig,
    pub gitops: GitopsConfig,
    /// Host names mapped to 127.0.0.1 in the hosts file
    pub hosts: Vec<String>,
    /// Upper bound for each add-on readiness wait
    pub wait_timeout_secs: u64,
}

impl Default for LabConfig {
    fn default() -> Self {
        Self {
            cluster: ClusterConfig::default(),
            registry: RegistryConfig::default(),
            gitops: GitopsConfig::default(),
            hosts: LAB_HOSTNAMES.iter().map(|h| h.to_string()).collect(),
            wait_timeout_secs: 300,
        }
    }
}

/// kind cluster settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ClusterConfig {
    pub name: String,
    /// Host port mapped to the ingress HTTP port
    pub http_port: u16,
    /// Host port mapped to the ingress HTTPS port
    pub https_port: u16,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            name: DEFAULT_CLUSTER_NAME.to_string(),
            http_port: 80,
            https_port: 443,
        }
    }
}

impl ClusterConfig {
    /// kubeconfig context kind creates for this cluster
    pub fn context(&self) -> String {
        format!("kind-{}", self.name)
    }
}

/// Local registry container settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RegistryConfig {
    pub name: String,
    /// Host port, bound on 127.0.0.1
    pub port: u16,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            name: "kind-registry".to_string(),
            port: 5001,
        }
    }
}

impl RegistryConfig {
    /// Address pushed to from the host, e.g. `localhost:5001`
    pub fn host_address(&self) -> String {
        format!("localhost:{}", self.port)
    }
}

/// Root GitOps application source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GitopsConfig {
    /// Repository Argo CD syncs from; required for `up`
    pub repo_url: Option<String>,
    pub revision: String,
    /// Path of the root app-of-apps chart inside the repository
    pub path: String,
    /// Pause between the Argo CD install and registering the root application
    pub registration_delay_secs: u64,
}

impl Default for GitopsConfig {
    fn default() -> Self {
        Self {
            repo_url: None,
            revision: "main".to_string(),
            path: "deploy/gitops/root".to_string(),
            registration_delay_secs: 30,
        }
    }
}

impl LabConfig {
    /// Load a lab file, or the defaults when no path is given
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        if !path.exists() {
            return Err(Error::ConfigNotFound {
                path: path.to_path_buf(),
            });
        }
        let content = std::fs::read_to_string(path)?;
        let config: LabConfig = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Check the settings `up` depends on
    pub fn validate(&self) -> Result<()> {
        if self.cluster.name.trim().is_empty() {
            return Err(Error::validation("cluster name must not be empty"));
        }
        if self.cluster.http_port == 0 || self.cluster.https_port == 0 {
            return Err(Error::validation("ingress host ports must be non-zero"));
        }
        if self.cluster.http_port == self.cluster.https_port {
            return Err(Error::validation(
                "ingress HTTP and HTTPS host ports must differ",
            ));
        }
        if self.registry.port == 0 {
            return Err(Error::validation("registry port must be non-zero"));
        }
        match self.gitops.repo_url.as_deref() {
            Some(url) if !url.trim().is_empty() => {}
            _ => {
                return Err(Error::validation(
                    "gitops repoUrl is required (lab file gitops.repoUrl or --repo-url)",
                ))
            }
        }
        if self.wait_timeout_secs == 0 {
            return Err(Error::validation("waitTimeoutSecs must be non-zero"));
        }
        Ok(())
    }

    /// Repository URL, valid only after [`LabConfig::validate`]
    pub fn repo_url(&self) -> &str {
        self.gitops.repo_url.as_deref().unwrap_or_default()
    }
}
