//! Filesystem locations used during bootstrap
//!
//! Resolves the platform repository root, the versioned Flux manifest
//! directory inside it, and the kubeconfig path.

use std::path::{Path, PathBuf};

use crate::error::{BootstrapError, Result};

/// Directory that marks the platform repository root
pub const PLATFORM_DIR: &str = "k8s-platform";

/// Walk up from `start` to the first directory containing `k8s-platform/`
pub fn discover_repo_root(start: &Path) -> Result<PathBuf> {
    start
        .ancestors()
        .find(|dir| dir.join(PLATFORM_DIR).is_dir())
        .map(Path::to_path_buf)
        .ok_or_else(|| {
            BootstrapError::InvalidSettings(format!(
                "no {}/ directory found in {} or any parent; pass --repo-root",
                PLATFORM_DIR,
                start.display()
            ))
        })
}

/// Directory holding `gotk-components.yaml` and `kustomization.yaml` for a Flux version
pub fn flux_manifest_dir(repo_root: &Path, flux_version: &str) -> PathBuf {
    repo_root
        .join(PLATFORM_DIR)
        .join("flux")
        .join(format!("v{}", flux_version))
}

/// Kubeconfig path when none was given on the command line
///
/// Uses the first entry of KUBECONFIG, then ~/.kube/config.
pub fn default_kubeconfig_path() -> Option<PathBuf> {
    if let Ok(value) = std::env::var("KUBECONFIG") {
        if let Some(first) = std::env::split_paths(&value).find(|p| !p.as_os_str().is_empty()) {
            return Some(first);
        }
    }
    let home = std::env::var_os("HOME")?;
    Some(PathBuf::from(home).join(".kube").join("config"))
}
