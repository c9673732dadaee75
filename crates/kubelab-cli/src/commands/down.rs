//! Down command - Delete the lab cluster

use std::path::PathBuf;

use clap::Args;
use tracing::info;

use super::{check_prerequisites, DOCKER, KIND};
use crate::config::LabConfig;
use crate::kind;
use crate::runner::{run_checked, CommandRunner, ProcessRunner};
use crate::{Error, Result};

/// Delete the lab cluster
#[derive(Args, Debug)]
pub struct DownArgs {
    /// Path to a YAML lab file
    #[arg(short = 'f', long = "config", env = "KUBELAB_CONFIG")]
    pub config_file: Option<PathBuf>,

    /// kind cluster name
    #[arg(long, env = "KUBELAB_CLUSTER_NAME")]
    pub name: Option<String>,

    /// Also remove the local registry container
    #[arg(long)]
    pub purge_registry: bool,
}

/// Run the down command
pub async fn run(args: DownArgs) -> Result<()> {
    let mut config = LabConfig::load(args.config_file.as_deref())?;
    if let Some(name) = args.name {
        config.cluster.name = name;
    }

    teardown(&ProcessRunner, &config, args.purge_registry).await
}

/// Delete the cluster if it exists, and the registry when `purge_registry` is set
pub async fn teardown<R>(runner: &R, config: &LabConfig, purge_registry: bool) -> Result<()>
where
    R: CommandRunner + ?Sized,
{
    let tools = if purge_registry {
        vec![KIND, DOCKER]
    } else {
        vec![KIND]
    };
    check_prerequisites(runner, &tools).await?;

    let name = &config.cluster.name;
    let clusters = run_checked(runner, &kind::get_clusters()).await?;
    if kind::cluster_listed(&clusters.stdout, name) {
        info!("Deleting kind cluster: {}", name);
        run_checked(runner, &kind::delete_cluster(name)).await?;
    } else {
        info!("No kind cluster named {}", name);
    }

    if purge_registry {
        let registry = &config.registry;
        let removed = runner.run(&kind::registry_remove(registry)).await?;
        if removed.success {
            info!("Removed registry {}", registry.name);
        } else if removed.stderr.contains("No such container") {
            info!("No registry container named {}", registry.name);
        } else {
            return Err(Error::command_failed(format!(
                "failed to remove registry {}: {}",
                registry.name,
                removed.stderr.trim()
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::runner::{CommandOutput, MockCommandRunner};

    fn runner_with<F>(respond: F) -> (MockCommandRunner, Arc<Mutex<Vec<String>>>)
    where
        F: Fn(&str) -> CommandOutput + Send + 'static,
    {
        let log = Arc::new(Mutex::new(Vec::new()));
        let seen = log.clone();
        let mut runner = MockCommandRunner::new();
        runner.expect_run().returning(move |inv| {
            let line = inv.to_string();
            let output = respond(&line);
            seen.lock().unwrap().push(line);
            Ok(output)
        });
        (runner, log)
    }

    fn ok(stdout: &str) -> CommandOutput {
        CommandOutput {
            success: true,
            code: Some(0),
            stdout: stdout.to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn existing_cluster_is_deleted() {
        let (runner, log) = runner_with(|line| match line {
            "kind get clusters" => ok("kubelab\n"),
            _ => ok(""),
        });

        teardown(&runner, &LabConfig::default(), false).await.unwrap();

        let log = log.lock().unwrap();
        assert!(log.contains(&"kind delete cluster --name kubelab".to_string()));
        assert!(!log.iter().any(|l| l.starts_with("docker")));
    }

    #[tokio::test]
    async fn absent_cluster_is_not_an_error() {
        let (runner, log) = runner_with(|_| ok(""));

        teardown(&runner, &LabConfig::default(), false).await.unwrap();

        assert!(!log
            .lock()
            .unwrap()
            .iter()
            .any(|l| l.starts_with("kind delete")));
    }

    #[tokio::test]
    async fn purge_tolerates_missing_registry() {
        let (runner, log) = runner_with(|line| {
            if line.starts_with("docker rm") {
                CommandOutput {
                    success: false,
                    code: Some(1),
                    stderr: "Error response from daemon: No such container: kind-registry".to_string(),
                    ..Default::default()
                }
            } else {
                ok("")
            }
        });

        teardown(&runner, &LabConfig::default(), true).await.unwrap();
        assert!(log
            .lock()
            .unwrap()
            .contains(&"docker rm -f kind-registry".to_string()));
    }

    #[tokio::test]
    async fn purge_surfaces_other_docker_failures() {
        let (runner, _log) = runner_with(|line| {
            if line.starts_with("docker rm") {
                CommandOutput {
                    success: false,
                    code: Some(1),
                    stderr: "Cannot connect to the Docker daemon".to_string(),
                    ..Default::default()
                }
            } else {
                ok("")
            }
        });

        let err = teardown(&runner, &LabConfig::default(), true)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Docker daemon"));
    }
}
