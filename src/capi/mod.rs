//! Cluster API installation
//!
//! Installs Cluster API with kubeadm bootstrap/control-plane providers and
//! AWS as the infrastructure provider. Version resolution, manifest fetching
//! and CRD readiness are left to clusterctl; this module only assembles its
//! inputs.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use tokio::process::Command;
use tracing::{debug, info};

use crate::cluster;
use crate::config::CapiVersions;
use crate::error::{BootstrapError, DelegateSource, Result};

pub const CORE_PROVIDER: &str = "cluster-api";
pub const KUBEADM_PROVIDER: &str = "kubeadm";
pub const AWS_PROVIDER: &str = "aws";

/// Build a `name:version` provider identifier
pub fn provider_id(name: &str, version: &str) -> Result<String> {
    if version.trim().is_empty() {
        return Err(BootstrapError::InvalidSettings(format!(
            "provider {} has an empty version",
            name
        )));
    }
    Ok(format!("{}:{}", name, version))
}

/// Provider set installed on the management cluster
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapiProviders {
    pub core: String,
    pub bootstrap: String,
    pub control_plane: String,
    pub infrastructure: String,
}

impl CapiProviders {
    /// kubeadm-based Cluster API on AWS
    pub fn aws(versions: &CapiVersions) -> Result<Self> {
        Ok(Self {
            core: provider_id(CORE_PROVIDER, &versions.capi_version)?,
            bootstrap: provider_id(KUBEADM_PROVIDER, &versions.capi_version)?,
            control_plane: provider_id(KUBEADM_PROVIDER, &versions.capi_version)?,
            infrastructure: provider_id(AWS_PROVIDER, &versions.capa_version)?,
        })
    }
}

/// Everything `clusterctl init` needs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderInitRequest {
    pub core_provider: String,
    pub bootstrap_providers: Vec<String>,
    pub control_plane_providers: Vec<String>,
    pub infrastructure_providers: Vec<String>,
    pub kubeconfig_path: PathBuf,
    pub context_name: String,
}

impl ProviderInitRequest {
    pub fn new(providers: CapiProviders, kubeconfig_path: &Path, context_name: &str) -> Self {
        Self {
            core_provider: providers.core,
            bootstrap_providers: vec![providers.bootstrap],
            control_plane_providers: vec![providers.control_plane],
            infrastructure_providers: vec![providers.infrastructure],
            kubeconfig_path: kubeconfig_path.to_path_buf(),
            context_name: context_name.to_string(),
        }
    }

    /// Arguments for `clusterctl init`
    pub fn clusterctl_args(&self) -> Vec<String> {
        let mut args = vec![
            "init".to_string(),
            "--core".to_string(),
            self.core_provider.clone(),
        ];
        for (flag, providers) in [
            ("--bootstrap", &self.bootstrap_providers),
            ("--control-plane", &self.control_plane_providers),
            ("--infrastructure", &self.infrastructure_providers),
        ] {
            if !providers.is_empty() {
                args.push(flag.to_string());
                args.push(providers.join(","));
            }
        }
        args.push("--kubeconfig".to_string());
        args.push(self.kubeconfig_path.display().to_string());
        args.push("--kubeconfig-context".to_string());
        args.push(self.context_name.clone());
        args
    }
}

/// Installs Cluster API providers into a cluster
///
/// This trait abstracts clusterctl execution for testability.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ProviderInstaller: Send + Sync {
    async fn init(&self, request: &ProviderInitRequest) -> std::result::Result<(), DelegateSource>;
}

/// Installer that shells out to clusterctl
pub struct ClusterctlInstaller {
    binary: PathBuf,
}

impl ClusterctlInstaller {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }
}

impl Default for ClusterctlInstaller {
    fn default() -> Self {
        Self::new("clusterctl")
    }
}

#[async_trait]
impl ProviderInstaller for ClusterctlInstaller {
    async fn init(&self, request: &ProviderInitRequest) -> std::result::Result<(), DelegateSource> {
        let args = request.clusterctl_args();
        debug!(binary = %self.binary.display(), ?args, "Running clusterctl");

        let output = Command::new(&self.binary)
            .args(&args)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| format!("failed to run {}: {}", self.binary.display(), e))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(format!("clusterctl init failed ({}): {}", output.status, stderr.trim()).into());
        }

        Ok(())
    }
}

/// Install Cluster API with the AWS infrastructure provider
///
/// An explicit `context` is passed to clusterctl as given. Otherwise the
/// context is taken from the kubeconfig entry that serves `server`, the API
/// server the caller is connected to. Re-running against an initialized
/// cluster is not guarded; clusterctl decides what happens.
pub async fn init_cluster_api<I: ProviderInstaller + ?Sized>(
    installer: &I,
    versions: &CapiVersions,
    server: &str,
    kubeconfig_path: &Path,
    context: Option<&str>,
) -> Result<()> {
    let providers = CapiProviders::aws(versions)?;

    let context_name = match context {
        Some(name) => name.to_string(),
        None => cluster::resolve_context_from_file(kubeconfig_path, server)?,
    };

    let request = ProviderInitRequest::new(providers, kubeconfig_path, &context_name);
    info!(
        core = %request.core_provider,
        infrastructure = ?request.infrastructure_providers,
        context = %context_name,
        "Installing Cluster API"
    );

    installer
        .init(&request)
        .await
        .map_err(|e| BootstrapError::delegate("error initializing Cluster API", e))?;

    info!("Cluster API installed");
    Ok(())
}
