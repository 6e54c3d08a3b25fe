//! Kubernetes connection module
//!
//! Handles connecting to the target cluster and provides the capabilities the
//! orchestrators depend on:
//! - [`apply`] - dynamic, discovery-driven manifest application
//! - [`crd`] - CRD readiness polling
//! - [`objects`] - typed object creation
//!
//! Connection uses an explicit kubeconfig when given, otherwise the default
//! loading strategy (in-cluster config, KUBECONFIG, ~/.kube/config).

pub mod apply;
pub mod crd;
pub mod objects;

#[cfg(test)]
mod mock_api;

use std::path::Path;

use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::{Client, Config};
use tracing::debug;

use crate::error::{BootstrapError, Result};

pub use apply::{ApplySummary, DynamicApplier, ManifestApplier};
pub use crd::{ApiCrdProbe, CrdProbe, CrdStatus, wait_for_crds};
pub use objects::{KubeObjectCreator, ObjectCreator};

/// A connected cluster
#[derive(Clone)]
pub struct ClusterHandle {
    client: Client,
    server: String,
}

impl ClusterHandle {
    pub fn client(&self) -> Client {
        self.client.clone()
    }

    /// API server URL the client talks to
    pub fn server(&self) -> &str {
        &self.server
    }
}

/// Resolve client configuration from a kubeconfig path and optional context
pub async fn load_config(kubeconfig: Option<&Path>, context: Option<&str>) -> Result<Config> {
    let options = KubeConfigOptions {
        context: context.map(str::to_string),
        ..Default::default()
    };

    match kubeconfig {
        Some(path) => {
            let kubeconfig = Kubeconfig::read_from(path).map_err(|e| {
                BootstrapError::delegate(format!("failed to read kubeconfig {}", path.display()), e)
            })?;
            Config::from_custom_kubeconfig(kubeconfig, &options)
                .await
                .map_err(|e| BootstrapError::delegate("failed to load kubeconfig", e))
        }
        None if context.is_some() => Config::from_kubeconfig(&options)
            .await
            .map_err(|e| BootstrapError::delegate("failed to load kubeconfig", e)),
        None => Config::infer()
            .await
            .map_err(|e| BootstrapError::delegate("failed to infer cluster configuration", e)),
    }
}

/// Connect to the cluster
pub async fn connect(kubeconfig: Option<&Path>, context: Option<&str>) -> Result<ClusterHandle> {
    let config = load_config(kubeconfig, context).await?;
    let server = config.cluster_url.to_string();
    debug!(server = %server, context = ?context, "Connecting to cluster");

    let client = Client::try_from(config)
        .map_err(|e| BootstrapError::delegate("failed to create Kubernetes client", e))?;

    Ok(ClusterHandle {
        client,
        server,
    })
}

fn normalize_server(server: &str) -> &str {
    server.trim_end_matches('/')
}

/// Pick the kubeconfig context that points at `server`
///
/// Prefers the current context when its cluster serves `server`, then the
/// first context whose cluster does, then the current context as written.
pub fn resolve_context_name(kubeconfig: &Kubeconfig, server: &str) -> Option<String> {
    let server = normalize_server(server);

    let serves = |context_name: &str| -> bool {
        kubeconfig
            .contexts
            .iter()
            .find(|named| named.name == context_name)
            .and_then(|named| named.context.as_ref())
            .and_then(|context| {
                kubeconfig
                    .clusters
                    .iter()
                    .find(|cluster| cluster.name == context.cluster)
            })
            .and_then(|named| named.cluster.as_ref())
            .and_then(|cluster| cluster.server.as_deref())
            .is_some_and(|candidate| normalize_server(candidate) == server)
    };

    if let Some(current) = kubeconfig.current_context.as_deref() {
        if serves(current) {
            return Some(current.to_string());
        }
    }

    kubeconfig
        .contexts
        .iter()
        .map(|named| named.name.as_str())
        .find(|name| serves(name))
        .or(kubeconfig.current_context.as_deref())
        .map(str::to_string)
}

/// Read a kubeconfig file and resolve the context name for `server`
pub fn resolve_context_from_file(kubeconfig_path: &Path, server: &str) -> Result<String> {
    let kubeconfig = Kubeconfig::read_from(kubeconfig_path)
        .map_err(|e| BootstrapError::delegate("error getting current context name", e))?;

    resolve_context_name(&kubeconfig, server).ok_or_else(|| {
        BootstrapError::delegate(
            "error getting current context name",
            format!(
                "no context in {} serves {} and no current-context is set",
                kubeconfig_path.display(),
                server
            ),
        )
    })
}
