//! CLI command handlers
//!
//! Each handler reads its environment inputs before touching the cluster so
//! a missing variable fails fast without a connection attempt.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use tracing::info;

use platform_bootstrap::capi::{self, ClusterctlInstaller};
use platform_bootstrap::cluster::{self, ApiCrdProbe, DynamicApplier, KubeObjectCreator};
use platform_bootstrap::config::{CapiVersions, FluxInputs, ProcessEnv, Settings, SettingsLoader, paths};
use platform_bootstrap::flux::{self, FluxInstall};

/// Target cluster selection
#[derive(Args, Debug, Clone, Default)]
pub struct ClusterArgs {
    /// Kubeconfig file (defaults to KUBECONFIG, then ~/.kube/config)
    #[arg(long)]
    pub kubeconfig: Option<PathBuf>,

    /// Kubeconfig context to use instead of the current one
    #[arg(long)]
    pub context: Option<String>,
}

impl ClusterArgs {
    /// Kubeconfig file for tools that need one on disk
    fn kubeconfig_path(&self) -> Option<PathBuf> {
        self.kubeconfig.clone().or_else(paths::default_kubeconfig_path)
    }
}

#[derive(Args, Debug, Clone, Default)]
pub struct FluxArgs {
    #[command(flatten)]
    pub cluster: ClusterArgs,

    /// Repository root containing k8s-platform/ (discovered from the working directory when omitted)
    #[arg(long)]
    pub repo_root: Option<PathBuf>,
}

fn repo_root(explicit: Option<&Path>) -> Result<PathBuf> {
    match explicit {
        Some(path) => Ok(path.to_path_buf()),
        None => {
            let cwd = std::env::current_dir().context("Failed to read working directory")?;
            Ok(paths::discover_repo_root(&cwd)?)
        }
    }
}

async fn install_capi(args: &ClusterArgs, versions: &CapiVersions) -> Result<()> {
    let kubeconfig = args
        .kubeconfig_path()
        .context("No kubeconfig found; pass --kubeconfig or set KUBECONFIG")?;
    let handle = cluster::connect(Some(&kubeconfig), args.context.as_deref()).await?;
    info!(server = %handle.server(), "Connected to cluster");

    capi::init_cluster_api(
        &ClusterctlInstaller::default(),
        versions,
        handle.server(),
        &kubeconfig,
        args.context.as_deref(),
    )
    .await?;
    Ok(())
}

async fn install_flux(args: &FluxArgs, inputs: FluxInputs, settings: &Settings) -> Result<()> {
    let repo_root = repo_root(args.repo_root.as_deref())?;
    let install = FluxInstall::new(inputs, &repo_root, settings);

    // No kubeconfig means the default loading strategy, in-cluster config included
    let kubeconfig = args.cluster.kubeconfig.as_deref();
    let context = args.cluster.context.as_deref();
    let handle = cluster::connect(kubeconfig, context).await?;
    info!(server = %handle.server(), manifests = %install.manifest_dir.display(), "Connected to cluster");

    let applier = DynamicApplier::new(handle.client(), settings.apply.field_manager.clone());
    let probe = ApiCrdProbe::new(handle.client());
    let creator = KubeObjectCreator::deferred(kubeconfig, context);

    flux::install_fluxcd(&install, &applier, &probe, &creator).await?;
    Ok(())
}

/// Install Cluster API providers
pub async fn run_capi(args: ClusterArgs) -> Result<()> {
    let versions = CapiVersions::from_vars(&ProcessEnv)?;
    install_capi(&args, &versions).await
}

/// Install Flux and seed the GitOps objects
pub async fn run_flux(args: FluxArgs, settings_path: Option<&Path>) -> Result<()> {
    let inputs = FluxInputs::from_vars(&ProcessEnv)?;
    let settings = SettingsLoader::load(settings_path)?;
    install_flux(&args, inputs, &settings).await
}

/// Cluster API first, then Flux, against the same cluster
pub async fn run_all(args: FluxArgs, settings_path: Option<&Path>) -> Result<()> {
    let versions = CapiVersions::from_vars(&ProcessEnv)?;
    let inputs = FluxInputs::from_vars(&ProcessEnv)?;
    let settings = SettingsLoader::load(settings_path)?;

    install_capi(&args.cluster, &versions).await?;
    install_flux(&args, inputs, &settings).await
}

/// Print the effective settings as YAML
pub fn print_settings(settings_path: Option<&Path>) -> Result<()> {
    let settings = SettingsLoader::load(settings_path)?;
    let yaml = serde_yaml::to_string(&settings).context("Failed to serialize settings")?;
    print!("{}", yaml);
    Ok(())
}
