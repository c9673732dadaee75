//! Up command - Bootstrap the local lab cluster
//!
//! This command stands up the lab by:
//! 1. Checking that docker, kind, kubectl and helm are on PATH
//! 2. Ensuring the local registry container is running
//! 3. Recreating the kind cluster wired to that registry
//! 4. Installing the platform add-ons, waiting for each to become ready
//! 5. Registering the root Argo CD application
//! 6. Adding the lab host names to the hosts file (best-effort)
//!
//! Steps run strictly in order and the first failure aborts the run. Nothing
//! is rolled back.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use base64::Engine;
use clap::Args;
use serde_json::Value;
use tracing::{debug, info, warn};

use kubelab_common::ARGOCD_NAMESPACE;

use super::{check_prerequisites, CommandErrorExt, Tool, DOCKER, HELM, KIND, KUBECTL};
use crate::addons::platform_addons;
use crate::config::LabConfig;
use crate::gitops::root_application;
use crate::hosts::{self, Platform};
use crate::kind;
use crate::runner::{run_checked, CommandRunner, Invocation, ProcessRunner};
use crate::summary::Summary;
use crate::{Error, Result};

/// Tools `up` drives
pub const REQUIRED_TOOLS: [Tool; 4] = [DOCKER, KIND, KUBECTL, HELM];

/// Secret Argo CD stores the generated admin password in
const ARGOCD_PASSWORD_SECRET: &str = "argocd-initial-admin-secret";

/// Create the lab cluster and install the platform
#[derive(Args, Debug)]
pub struct UpArgs {
    /// Path to a YAML lab file
    #[arg(short = 'f', long = "config", env = "KUBELAB_CONFIG")]
    pub config_file: Option<PathBuf>,

    /// kind cluster name
    #[arg(long, env = "KUBELAB_CLUSTER_NAME")]
    pub name: Option<String>,

    /// Git repository Argo CD syncs the lab from
    #[arg(long, env = "KUBELAB_REPO_URL")]
    pub repo_url: Option<String>,

    /// Git revision (branch, tag or commit) to sync
    #[arg(long)]
    pub revision: Option<String>,

    /// Host port for ingress HTTP
    #[arg(long)]
    pub http_port: Option<u16>,

    /// Host port for ingress HTTPS
    #[arg(long)]
    pub https_port: Option<u16>,

    /// Host port for the local registry
    #[arg(long)]
    pub registry_port: Option<u16>,

    /// Seconds to wait after Argo CD is ready before registering the root application
    #[arg(long)]
    pub registration_delay_secs: Option<u64>,

    /// Timeout for each readiness wait in seconds
    #[arg(long)]
    pub wait_timeout_secs: Option<u64>,

    /// Leave the hosts file alone
    #[arg(long)]
    pub skip_hosts: bool,

    /// Dry run - show what would be done without making changes
    #[arg(long)]
    pub dry_run: bool,
}

impl UpArgs {
    /// Lab file (or defaults) with explicit flags applied on top
    pub fn lab_config(&self) -> Result<LabConfig> {
        let mut config = LabConfig::load(self.config_file.as_deref())?;

        if let Some(name) = &self.name {
            config.cluster.name = name.clone();
        }
        if let Some(repo_url) = &self.repo_url {
            config.gitops.repo_url = Some(repo_url.clone());
        }
        if let Some(revision) = &self.revision {
            config.gitops.revision = revision.clone();
        }
        if let Some(port) = self.http_port {
            config.cluster.http_port = port;
        }
        if let Some(port) = self.https_port {
            config.cluster.https_port = port;
        }
        if let Some(port) = self.registry_port {
            config.registry.port = port;
        }
        if let Some(secs) = self.registration_delay_secs {
            config.gitops.registration_delay_secs = secs;
        }
        if let Some(secs) = self.wait_timeout_secs {
            config.wait_timeout_secs = secs;
        }

        Ok(config)
    }
}

/// One step of the dry-run plan
#[derive(Debug, Clone)]
pub struct PlanStep {
    pub description: String,
    pub invocation: Invocation,
}

impl PlanStep {
    fn new(description: impl Into<String>, invocation: Invocation) -> Self {
        Self {
            description: description.into(),
            invocation,
        }
    }
}

/// Drives the bootstrap sequence through a [`CommandRunner`]
pub struct Bootstrapper<R> {
    runner: R,
    config: LabConfig,
    platform: Platform,
    hosts_file: PathBuf,
    skip_hosts: bool,
}

impl<R: CommandRunner> Bootstrapper<R> {
    /// Create a bootstrapper for an already validated config
    pub fn new(runner: R, config: LabConfig) -> Self {
        Self {
            runner,
            config,
            platform: Platform::current(),
            hosts_file: PathBuf::from(hosts::UNIX_HOSTS_FILE),
            skip_hosts: false,
        }
    }

    pub fn with_platform(mut self, platform: Platform) -> Self {
        self.platform = platform;
        self
    }

    pub fn with_hosts_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.hosts_file = path.into();
        self
    }

    pub fn skip_hosts(mut self, skip: bool) -> Self {
        self.skip_hosts = skip;
        self
    }

    fn context(&self) -> String {
        self.config.cluster.context()
    }

    /// Run every step, returning the summary to print
    pub async fn run(&self) -> Result<Summary> {
        let start = Instant::now();

        check_prerequisites(&self.runner, &REQUIRED_TOOLS).await?;

        info!("[Phase 1] Ensuring local registry...");
        self.ensure_registry().await?;

        info!("[Phase 2] Creating kind cluster...");
        self.create_cluster().await?;

        info!("[Phase 3] Installing platform add-ons...");
        self.install_addons().await?;

        info!("[Phase 4] Registering GitOps root application...");
        self.register_gitops().await?;

        if self.skip_hosts {
            info!("[Phase 5] Skipping hosts file update");
        } else {
            info!("[Phase 5] Registering lab host names...");
            self.register_hosts().await;
        }

        let password = self.argocd_password().await;

        info!("Bootstrap complete in {:?}", start.elapsed());
        Ok(Summary::new(&self.config, password))
    }

    async fn ensure_registry(&self) -> Result<()> {
        let registry = &self.config.registry;
        let inspect = self.runner.run(&kind::registry_inspect(registry)).await?;

        if !inspect.success {
            info!(
                "Creating registry {} on 127.0.0.1:{}",
                registry.name, registry.port
            );
            run_checked(&self.runner, &kind::registry_create(registry)).await?;
        } else if inspect.stdout.trim() == "true" {
            info!("Registry {} already running", registry.name);
        } else {
            info!("Starting stopped registry {}", registry.name);
            run_checked(&self.runner, &kind::registry_start(registry)).await?;
        }

        Ok(())
    }

    async fn create_cluster(&self) -> Result<()> {
        let cluster = &self.config.cluster;

        let existing = run_checked(&self.runner, &kind::get_clusters()).await?;
        if kind::cluster_listed(&existing.stdout, &cluster.name) {
            info!("Deleting existing kind cluster: {}", cluster.name);
            run_checked(&self.runner, &kind::delete_cluster(&cluster.name)).await?;
        }

        info!("Creating kind cluster: {}", cluster.name);
        run_checked(
            &self.runner,
            &kind::create_cluster(cluster, &self.config.registry),
        )
        .await?;

        run_checked(&self.runner, &self.wait_for_nodes()).await?;

        let connect = self
            .runner
            .run(&kind::registry_connect(&self.config.registry))
            .await?;
        if !connect.success {
            if connect.stderr.contains("already exists") {
                debug!("Registry already connected to the kind network");
            } else {
                warn!(
                    "Could not connect registry to the kind network: {}",
                    connect.stderr.trim()
                );
            }
        }

        let config_map = kind::registry_hosting_config_map(&self.config.registry);
        run_checked(&self.runner, &self.kubectl_apply(&config_map)?).await?;

        Ok(())
    }

    async fn install_addons(&self) -> Result<()> {
        let context = self.context();

        for addon in platform_addons() {
            info!("Installing {} {}...", addon.release, addon.version);
            run_checked(&self.runner, &addon.repo_add()).await?;
            run_checked(&self.runner, &addon.install(&context)).await?;

            info!("Waiting for {} to become ready...", addon.release);
            run_checked(
                &self.runner,
                &addon.wait(&context, self.config.wait_timeout_secs),
            )
            .await?;
        }

        Ok(())
    }

    async fn register_gitops(&self) -> Result<()> {
        let delay = self.config.gitops.registration_delay_secs;
        if delay > 0 {
            info!("Waiting {}s for Argo CD to settle...", delay);
            tokio::time::sleep(Duration::from_secs(delay)).await;
        }

        let app = root_application(self.config.repo_url(), &self.config.gitops);
        run_checked(&self.runner, &self.kubectl_apply(&app)?).await?;

        info!(
            "Root application tracks {} @ {}",
            self.config.repo_url(),
            self.config.gitops.revision
        );
        Ok(())
    }

    async fn register_hosts(&self) {
        if let Err(e) = self.patch_hosts_file().await {
            warn!("Could not update {}: {}", self.hosts_file.display(), e);
            warn!(
                "{}",
                hosts::manual_instructions(
                    &self.config.hosts,
                    &self.hosts_file,
                    self.platform
                )
            );
        }
    }

    async fn patch_hosts_file(&self) -> Result<()> {
        if !self.platform.supports_patching() {
            warn!(
                "{}",
                hosts::manual_instructions(
                    &self.config.hosts,
                    &self.hosts_file,
                    self.platform
                )
            );
            return Ok(());
        }

        let current = tokio::fs::read_to_string(&self.hosts_file).await?;
        let missing = hosts::missing_entries(&current, &self.config.hosts);
        if missing.is_empty() {
            info!("Hosts file already maps all lab host names");
            return Ok(());
        }

        info!(
            "Adding {} to {} (may prompt for sudo)",
            missing.join(", "),
            self.hosts_file.display()
        );
        run_checked(
            &self.runner,
            &self.hosts_append(&hosts::append_payload(&current, &missing)),
        )
        .await?;
        Ok(())
    }

    async fn argocd_password(&self) -> Option<String> {
        let output = match self.runner.run(&self.password_lookup()).await {
            Ok(output) if output.success => output,
            Ok(output) => {
                warn!(
                    "Could not read Argo CD admin password: {}",
                    output.stderr.trim()
                );
                return None;
            }
            Err(e) => {
                warn!("Could not read Argo CD admin password: {}", e);
                return None;
            }
        };

        match decode_password(&output.stdout) {
            Ok(password) => Some(password),
            Err(e) => {
                warn!("Could not decode Argo CD admin password: {}", e);
                None
            }
        }
    }

    fn kubectl(&self, args: &[&str]) -> Invocation {
        let context = self.context();
        let mut full = vec!["--context", context.as_str()];
        full.extend_from_slice(args);
        Invocation::new("kubectl", full)
    }

    fn kubectl_apply(&self, manifest: &Value) -> Result<Invocation> {
        let body = serde_json::to_string_pretty(manifest)?;
        Ok(self.kubectl(&["apply", "-f", "-"]).with_stdin(body))
    }

    fn wait_for_nodes(&self) -> Invocation {
        let timeout = format!("--timeout={}s", self.config.wait_timeout_secs);
        self.kubectl(&["wait", "--for=condition=Ready", "nodes", "--all", timeout.as_str()])
    }

    fn hosts_append(&self, entries: &str) -> Invocation {
        let path = self.hosts_file.display().to_string();
        Invocation::new("sudo", ["tee", "-a", path.as_str()]).with_stdin(entries)
    }

    fn password_lookup(&self) -> Invocation {
        self.kubectl(&[
            "-n",
            ARGOCD_NAMESPACE,
            "get",
            "secret",
            ARGOCD_PASSWORD_SECRET,
            "-o",
            "jsonpath={.data.password}",
        ])
    }

    /// Everything `run` would execute, without running any of it
    pub fn plan(&self) -> Result<Vec<PlanStep>> {
        let context = self.context();
        let cluster = &self.config.cluster;
        let registry = &self.config.registry;

        let mut steps: Vec<PlanStep> = REQUIRED_TOOLS
            .iter()
            .map(|tool| {
                PlanStep::new(
                    format!("Check {} is installed", tool.name),
                    Invocation::new("which", [tool.name]),
                )
            })
            .collect();

        steps.push(PlanStep::new("Inspect registry", kind::registry_inspect(registry)));
        steps.push(PlanStep::new(
            "Start registry if stopped",
            kind::registry_start(registry),
        ));
        steps.push(PlanStep::new(
            "Create registry if absent",
            kind::registry_create(registry),
        ));
        steps.push(PlanStep::new("List kind clusters", kind::get_clusters()));
        steps.push(PlanStep::new(
            format!("Delete cluster {} if it exists", cluster.name),
            kind::delete_cluster(&cluster.name),
        ));
        steps.push(PlanStep::new(
            "Create kind cluster",
            kind::create_cluster(cluster, registry),
        ));
        steps.push(PlanStep::new("Wait for nodes", self.wait_for_nodes()));
        steps.push(PlanStep::new(
            "Connect registry to kind network",
            kind::registry_connect(registry),
        ));
        steps.push(PlanStep::new(
            "Publish local-registry-hosting ConfigMap",
            self.kubectl_apply(&kind::registry_hosting_config_map(registry))?,
        ));

        for addon in platform_addons() {
            steps.push(PlanStep::new(
                format!("Add {} chart repository", addon.repo_name),
                addon.repo_add(),
            ));
            steps.push(PlanStep::new(
                format!("Install {} {}", addon.release, addon.version),
                addon.install(&context),
            ));
            steps.push(PlanStep::new(
                format!("Wait for {}", addon.release),
                addon.wait(&context, self.config.wait_timeout_secs),
            ));
        }

        steps.push(PlanStep::new(
            format!(
                "Register root application from {} @ {} after {}s",
                self.config.repo_url(),
                self.config.gitops.revision,
                self.config.gitops.registration_delay_secs
            ),
            self.kubectl_apply(&root_application(
                self.config.repo_url(),
                &self.config.gitops,
            ))?,
        ));

        if !self.skip_hosts && self.platform.supports_patching() {
            steps.push(PlanStep::new(
                format!("Append missing lab host names to {}", self.hosts_file.display()),
                self.hosts_append(&hosts::render_entries(&self.config.hosts)),
            ));
        }

        steps.push(PlanStep::new(
            "Read Argo CD admin password",
            self.password_lookup(),
        ));

        Ok(steps)
    }
}

/// Decode the base64 `data.password` field of the Argo CD secret
fn decode_password(raw: &str) -> Result<String> {
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(raw.trim())
        .cmd_err()?;
    let password = String::from_utf8(bytes).cmd_err()?;
    if password.is_empty() {
        return Err(Error::command_failed("secret holds an empty password"));
    }
    Ok(password)
}

/// Run the up command
pub async fn run(args: UpArgs) -> Result<()> {
    let config = args.lab_config()?;
    config.validate()?;

    info!("Cluster: {}", config.cluster.name);
    info!(
        "GitOps source: {} @ {}",
        config.repo_url(),
        config.gitops.revision
    );

    let bootstrapper = Bootstrapper::new(ProcessRunner, config).skip_hosts(args.skip_hosts);

    if args.dry_run {
        info!("Dry run - would perform the following:");
        for (i, step) in bootstrapper.plan()?.iter().enumerate() {
            info!("{}. {}: {}", i + 1, step.description, step.invocation);
        }
        return Ok(());
    }

    let summary = bootstrapper.run().await?;
    println!("{}", summary);
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::runner::{CommandOutput, MockCommandRunner};

    type CallLog = Arc<Mutex<Vec<String>>>;

    fn ok(stdout: &str) -> CommandOutput {
        CommandOutput {
            success: true,
            code: Some(0),
            stdout: stdout.to_string(),
            stderr: String::new(),
        }
    }

    fn failed(stderr: &str) -> CommandOutput {
        CommandOutput {
            success: false,
            code: Some(1),
            stdout: String::new(),
            stderr: stderr.to_string(),
        }
    }

    fn lab() -> LabConfig {
        let mut config = LabConfig::default();
        config.gitops.repo_url = Some("https://example.com/lab.git".to_string());
        config.gitops.registration_delay_secs = 0;
        config.wait_timeout_secs = 5;
        config
    }

    /// Answers the way the tools do on a machine with a running registry and no cluster
    fn healthy(inv: &Invocation) -> CommandOutput {
        let line = inv.to_string();
        if line.starts_with("docker inspect") {
            ok("true\n")
        } else if line == "kind get clusters" {
            ok("")
        } else if line.contains(ARGOCD_PASSWORD_SECRET) {
            ok("aHVudGVyMg==")
        } else {
            ok("")
        }
    }

    fn scripted<F>(respond: F) -> (MockCommandRunner, CallLog)
    where
        F: Fn(&Invocation) -> CommandOutput + Send + 'static,
    {
        let log: CallLog = Arc::new(Mutex::new(Vec::new()));
        let seen = log.clone();
        let mut runner = MockCommandRunner::new();
        runner.expect_run().returning(move |inv| {
            seen.lock().unwrap().push(inv.to_string());
            Ok(respond(inv))
        });
        (runner, log)
    }

    fn bootstrapper(runner: MockCommandRunner) -> Bootstrapper<MockCommandRunner> {
        Bootstrapper::new(runner, lab()).skip_hosts(true)
    }

    fn position(log: &[String], prefix: &str) -> Option<usize> {
        log.iter().position(|line| line.starts_with(prefix))
    }

    #[tokio::test]
    async fn fresh_machine_runs_every_phase_in_order() {
        let (runner, log) = scripted(healthy);
        let summary = bootstrapper(runner).run().await.unwrap();
        let log = log.lock().unwrap();

        let order = [
            "which docker",
            "which helm",
            "docker inspect",
            "kind get clusters",
            "kind create cluster --name kubelab",
            "kubectl --context kind-kubelab wait --for=condition=Ready nodes",
            "docker network connect kind kind-registry",
            "helm upgrade --install ingress-nginx",
            "helm upgrade --install metrics-server",
            "helm upgrade --install sealed-secrets",
            "helm upgrade --install argocd",
        ];
        let positions: Vec<usize> = order
            .iter()
            .map(|prefix| position(&log, prefix).unwrap_or_else(|| panic!("missing {}", prefix)))
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]), "{:?}", *log);

        assert!(position(&log, "kind delete cluster").is_none());
        assert!(position(&log, "docker run").is_none());
        assert_eq!(summary.argocd_password.as_deref(), Some("hunter2"));
    }

    #[tokio::test]
    async fn existing_cluster_is_deleted_then_recreated() {
        let (runner, log) = scripted(|inv| {
            if inv.to_string() == "kind get clusters" {
                ok("other\nkubelab\n")
            } else {
                healthy(inv)
            }
        });

        bootstrapper(runner).run().await.unwrap();
        let log = log.lock().unwrap();

        let deleted = position(&log, "kind delete cluster --name kubelab").unwrap();
        let created = position(&log, "kind create cluster --name kubelab").unwrap();
        assert!(deleted < created);
    }

    #[tokio::test]
    async fn missing_tool_aborts_before_any_cluster_command() {
        let (runner, log) = scripted(|inv| {
            if inv.to_string() == "which helm" {
                failed("")
            } else {
                healthy(inv)
            }
        });

        let err = bootstrapper(runner).run().await.unwrap_err();
        assert!(matches!(err, Error::MissingTool { ref tool, .. } if tool == "helm"));

        let log = log.lock().unwrap();
        assert!(log.iter().all(|line| line.starts_with("which ")), "{:?}", *log);
    }

    #[tokio::test]
    async fn failed_wait_aborts_before_later_addons() {
        let (runner, log) = scripted(|inv| {
            if inv.to_string().contains("rollout status deployment/metrics-server") {
                failed("timed out waiting for the condition")
            } else {
                healthy(inv)
            }
        });

        let err = bootstrapper(runner).run().await.unwrap_err();
        assert!(matches!(err, Error::CommandFailed { .. }));
        assert!(err.to_string().contains("timed out"));

        let log = log.lock().unwrap();
        assert!(position(&log, "helm upgrade --install metrics-server").is_some());
        assert!(position(&log, "helm upgrade --install sealed-secrets").is_none());
        assert!(position(&log, "helm upgrade --install argocd").is_none());
        assert!(!log.iter().any(|line| line.contains(ARGOCD_PASSWORD_SECRET)));
    }

    #[tokio::test]
    async fn failed_cluster_creation_is_fatal() {
        let (runner, log) = scripted(|inv| {
            if inv.to_string().starts_with("kind create cluster") {
                failed("port 80 already in use")
            } else {
                healthy(inv)
            }
        });

        let err = bootstrapper(runner).run().await.unwrap_err();
        assert!(err.to_string().contains("port 80 already in use"));
        assert!(position(&log.lock().unwrap(), "helm").is_none());
    }

    #[tokio::test]
    async fn stopped_registry_is_started() {
        let (runner, log) = scripted(|inv| {
            if inv.to_string().starts_with("docker inspect") {
                ok("false\n")
            } else {
                healthy(inv)
            }
        });

        bootstrapper(runner).run().await.unwrap();
        let log = log.lock().unwrap();
        assert!(position(&log, "docker start kind-registry").is_some());
        assert!(position(&log, "docker run").is_none());
    }

    #[tokio::test]
    async fn absent_registry_is_created() {
        let (runner, log) = scripted(|inv| {
            if inv.to_string().starts_with("docker inspect") {
                failed("Error: No such object: kind-registry")
            } else {
                healthy(inv)
            }
        });

        bootstrapper(runner).run().await.unwrap();
        let log = log.lock().unwrap();
        assert!(position(&log, "docker run -d --restart=always -p 127.0.0.1:5001:5000").is_some());
    }

    #[tokio::test]
    async fn registry_already_on_kind_network_is_fine() {
        let (runner, _log) = scripted(|inv| {
            if inv.to_string().starts_with("docker network connect") {
                failed("endpoint with name kind-registry already exists in network kind")
            } else {
                healthy(inv)
            }
        });

        bootstrapper(runner).run().await.unwrap();
    }

    #[tokio::test]
    async fn root_application_is_applied_from_configured_repo() {
        let stdin_log: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
        let seen = stdin_log.clone();
        let mut runner = MockCommandRunner::new();
        runner.expect_run().returning(move |inv| {
            if let Some(stdin) = &inv.stdin {
                seen.lock().unwrap().push(stdin.clone());
            }
            Ok(healthy(inv))
        });

        bootstrapper(runner).run().await.unwrap();

        let applied = stdin_log.lock().unwrap();
        let app: Value = applied
            .iter()
            .filter_map(|body| serde_json::from_str::<Value>(body).ok())
            .find(|doc| doc["kind"] == "Application")
            .expect("root application should be applied");
        assert_eq!(app["spec"]["source"]["repoURL"], "https://example.com/lab.git");
    }

    #[tokio::test]
    async fn hosts_failure_does_not_fail_the_run() {
        let mut hosts_file = tempfile::NamedTempFile::new().unwrap();
        writeln!(hosts_file, "127.0.0.1 localhost").unwrap();

        let (runner, log) = scripted(|inv| {
            if inv.program == "sudo" {
                failed("sudo: a password is required")
            } else {
                healthy(inv)
            }
        });

        let summary = Bootstrapper::new(runner, lab())
            .with_platform(Platform::Linux)
            .with_hosts_file(hosts_file.path())
            .run()
            .await
            .unwrap();

        assert_eq!(summary.cluster, "kubelab");
        let log = log.lock().unwrap();
        assert!(position(&log, "sudo tee -a").is_some());
    }

    #[tokio::test]
    async fn unreadable_hosts_file_does_not_fail_the_run() {
        let dir = tempfile::tempdir().unwrap();
        let (runner, log) = scripted(healthy);

        Bootstrapper::new(runner, lab())
            .with_platform(Platform::Linux)
            .with_hosts_file(dir.path().join("missing"))
            .run()
            .await
            .unwrap();

        assert!(position(&log.lock().unwrap(), "sudo").is_none());
    }

    #[tokio::test]
    async fn only_missing_host_names_are_appended() {
        let mut hosts_file = tempfile::NamedTempFile::new().unwrap();
        writeln!(hosts_file, "127.0.0.1 localhost todo.local").unwrap();

        let appended: Arc<Mutex<Option<String>>> = Arc::new(Mutex::new(None));
        let seen = appended.clone();
        let mut runner = MockCommandRunner::new();
        runner.expect_run().returning(move |inv| {
            if inv.program == "sudo" {
                *seen.lock().unwrap() = inv.stdin.clone();
            }
            Ok(healthy(inv))
        });

        Bootstrapper::new(runner, lab())
            .with_platform(Platform::MacOs)
            .with_hosts_file(hosts_file.path())
            .run()
            .await
            .unwrap();

        assert_eq!(
            appended.lock().unwrap().as_deref(),
            Some("127.0.0.1 todo-dev.local\n127.0.0.1 argocd.local\n")
        );
    }

    #[tokio::test]
    async fn appended_names_start_on_a_fresh_line() {
        let mut hosts_file = tempfile::NamedTempFile::new().unwrap();
        write!(hosts_file, "127.0.0.1 localhost").unwrap();

        let appended: Arc<Mutex<Option<String>>> = Arc::new(Mutex::new(None));
        let seen = appended.clone();
        let mut runner = MockCommandRunner::new();
        runner.expect_run().returning(move |inv| {
            if inv.program == "sudo" {
                *seen.lock().unwrap() = inv.stdin.clone();
            }
            Ok(healthy(inv))
        });

        Bootstrapper::new(runner, lab())
            .with_platform(Platform::Linux)
            .with_hosts_file(hosts_file.path())
            .run()
            .await
            .unwrap();

        let patched = format!(
            "127.0.0.1 localhost{}",
            appended.lock().unwrap().clone().unwrap()
        );
        let lines: Vec<&str> = patched.lines().collect();
        assert_eq!(lines[0], "127.0.0.1 localhost");
        assert_eq!(lines[1], "127.0.0.1 todo.local");
        assert!(patched.ends_with("127.0.0.1 argocd.local\n"));
    }

    #[tokio::test]
    async fn windows_gets_instructions_instead_of_sudo() {
        let (runner, log) = scripted(healthy);

        Bootstrapper::new(runner, lab())
            .with_platform(Platform::Windows)
            .run()
            .await
            .unwrap();

        assert!(position(&log.lock().unwrap(), "sudo").is_none());
    }

    #[tokio::test]
    async fn unreadable_password_is_omitted() {
        let (runner, _log) = scripted(|inv| {
            if inv.to_string().contains(ARGOCD_PASSWORD_SECRET) {
                failed("secrets \"argocd-initial-admin-secret\" not found")
            } else {
                healthy(inv)
            }
        });

        let summary = bootstrapper(runner).run().await.unwrap();
        assert!(summary.argocd_password.is_none());
    }

    #[test]
    fn plan_runs_nothing() {
        let mut runner = MockCommandRunner::new();
        runner.expect_run().never();

        let steps = Bootstrapper::new(runner, lab())
            .with_platform(Platform::Linux)
            .plan()
            .unwrap();

        let lines: Vec<String> = steps.iter().map(|s| s.invocation.to_string()).collect();
        assert_eq!(lines[0], "which docker");
        assert!(lines.iter().any(|l| l.starts_with("kind create cluster")));
        assert_eq!(
            lines.iter().filter(|l| l.starts_with("helm upgrade --install")).count(),
            4
        );
        assert!(lines.iter().any(|l| l.starts_with("sudo tee -a /etc/hosts")));
    }

    #[test]
    fn decode_password_handles_kubectl_output() {
        assert_eq!(decode_password("aHVudGVyMg==\n").unwrap(), "hunter2");
        assert!(decode_password("not base64!").is_err());
        assert!(decode_password("").is_err());
    }

    #[test]
    fn flags_override_lab_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "cluster:\n  name: from-file\n  httpPort: 8080\ngitops:\n  repoUrl: https://example.com/file.git\n"
        )
        .unwrap();

        let args = UpArgs {
            config_file: Some(file.path().to_path_buf()),
            name: Some("from-flag".to_string()),
            repo_url: None,
            revision: Some("dev".to_string()),
            http_port: None,
            https_port: None,
            registry_port: Some(5002),
            registration_delay_secs: None,
            wait_timeout_secs: None,
            skip_hosts: false,
            dry_run: false,
        };

        let config = args.lab_config().unwrap();
        assert_eq!(config.cluster.name, "from-flag");
        assert_eq!(config.cluster.http_port, 8080);
        assert_eq!(config.repo_url(), "https://example.com/file.git");
        assert_eq!(config.gitops.revision, "dev");
        assert_eq!(config.registry.port, 5002);
    }
}
