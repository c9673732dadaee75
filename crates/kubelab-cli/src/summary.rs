//! Post-install summary

use std::fmt;

use crate::config::LabConfig;

/// What `kubelab up` prints once everything is installed
#[derive(Debug, Clone)]
pub struct Summary {
    pub cluster: String,
    pub context: String,
    pub registry: String,
    pub urls: Vec<(String, String)>,
    /// Argo CD initial admin password, when the secret could be read
    pub argocd_password: Option<String>,
}

impl Summary {
    pub fn new(config: &LabConfig, argocd_password: Option<String>) -> Self {
        let port_suffix = match config.cluster.http_port {
            80 => String::new(),
            port => format!(":{}", port),
        };
        let urls = config
            .hosts
            .iter()
            .map(|host| {
                let label = match host.as_str() {
                    "argocd.local" => "Argo CD",
                    "todo-dev.local" => "todo-api (dev)",
                    "todo.local" => "todo-api (prod)",
                    other => other,
                };
                (label.to_string(), format!("http://{}{}", host, port_suffix))
            })
            .collect();

        Self {
            cluster: config.cluster.name.clone(),
            context: config.cluster.context(),
            registry: config.registry.host_address(),
            urls,
            argocd_password,
        }
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f)?;
        writeln!(f, "Lab cluster '{}' is ready.", self.cluster)?;
        writeln!(f)?;
        writeln!(f, "  kubectl context: {}", self.context)?;
        writeln!(f, "  Local registry:  {}", self.registry)?;
        writeln!(f)?;
        writeln!(f, "URLs:")?;
        for (label, url) in &self.urls {
            writeln!(f, "  {:<16} {}", label, url)?;
        }
        writeln!(f)?;
        match &self.argocd_password {
            Some(password) => writeln!(f, "Argo CD login: admin / {}", password)?,
            None => writeln!(
                f,
                "Argo CD login: admin (password unavailable, read secret argocd-initial-admin-secret)"
            )?,
        }
        writeln!(f)?;
        writeln!(f, "Next steps:")?;
        writeln!(
            f,
            "  1. Push images with: docker push {}/todo-api:<tag>",
            self.registry
        )?;
        writeln!(
            f,
            "  2. Watch sync status: kubectl --context {} -n argocd get applications",
            self.context
        )?;
        writeln!(f, "  3. Tear down with:   kubelab down")
    }
}
