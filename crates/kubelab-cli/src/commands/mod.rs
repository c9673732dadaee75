//! CLI commands

use std::fmt::Display;

use tracing::{debug, info};

use crate::runner::{CommandRunner, Invocation};
use crate::{Error, Result};

pub mod down;
pub mod up;

/// Extension trait to convert errors with Display to CLI Error::CommandFailed.
///
/// This reduces boilerplate for the common pattern of `.map_err(|e| Error::command_failed(e.to_string()))`.
pub trait CommandErrorExt<T> {
    /// Convert an error to `Error::CommandFailed` using its Display implementation.
    fn cmd_err(self) -> Result<T>;
}

impl<T, E: Display> CommandErrorExt<T> for std::result::Result<T, E> {
    fn cmd_err(self) -> Result<T> {
        self.map_err(|e| Error::command_failed(e.to_string()))
    }
}

/// An external tool that must be on PATH
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tool {
    pub name: &'static str,
    pub hint: &'static str,
}

pub const DOCKER: Tool = Tool {
    name: "docker",
    hint: "Install Docker: https://docs.docker.com/get-docker/",
};

pub const KIND: Tool = Tool {
    name: "kind",
    hint: "Install kind: https://kind.sigs.k8s.io/docs/user/quick-start/#installation",
};

pub const KUBECTL: Tool = Tool {
    name: "kubectl",
    hint: "Install kubectl: https://kubernetes.io/docs/tasks/tools/",
};

pub const HELM: Tool = Tool {
    name: "helm",
    hint: "Install Helm: https://helm.sh/docs/intro/install/",
};

/// Fail with [`Error::MissingTool`] on the first tool not found on PATH
pub async fn check_prerequisites<R>(runner: &R, tools: &[Tool]) -> Result<()>
where
    R: CommandRunner + ?Sized,
{
    info!("Checking prerequisites...");

    for tool in tools {
        let output = runner.run(&Invocation::new("which", [tool.name])).await?;
        if !output.success {
            return Err(Error::missing_tool(tool.name, tool.hint));
        }
        debug!(tool = tool.name, path = output.stdout.trim(), "found");
    }

    Ok(())
}
