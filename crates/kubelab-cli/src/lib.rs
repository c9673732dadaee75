//! kubelab CLI library

pub mod addons;
pub mod commands;
pub mod config;
pub mod error;
pub mod gitops;
pub mod hosts;
pub mod kind;
pub mod runner;
pub mod summary;

pub use error::{Error, Result};

use clap::{Parser, Subcommand};

/// kubelab - disposable local Kubernetes lab
#[derive(Parser, Debug)]
#[command(name = "kubelab")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create the kind cluster, install platform add-ons and register GitOps
    Up(commands::up::UpArgs),
    /// Delete the kind cluster
    Down(commands::down::DownArgs),
}

impl Cli {
    /// Run the CLI command
    pub async fn run(self) -> Result<()> {
        match self.command {
            Commands::Up(args) => commands::up::run(args).await,
            Commands::Down(args) => commands::down::run(args).await,
        }
    }
}
