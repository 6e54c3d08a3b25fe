//! FluxCD installation
//!
//! Applies the pinned Flux manifests from the platform repository, waits for
//! the toolkit CRDs, then seeds the deploy key, GitRepository and
//! Kustomization that hand the cluster over to GitOps. Every step runs only
//! after the previous one succeeded.

pub mod resources;

use std::path::{Path, PathBuf};

use tracing::info;

use crate::cluster::{CrdProbe, ManifestApplier, ObjectCreator, wait_for_crds};
use crate::config::{FluxInputs, GitOpsSettings, Settings, WaitSettings, paths};
use crate::error::{BootstrapError, Result};
use crate::models::FluxResourceKind;

pub const COMPONENTS_MANIFEST: &str = "gotk-components.yaml";
pub const KUSTOMIZATION_MANIFEST: &str = "kustomization.yaml";

/// Resolved inputs for one Flux install
#[derive(Debug, Clone)]
pub struct FluxInstall {
    pub inputs: FluxInputs,
    /// `k8s-platform/flux/v{version}` under the repository root
    pub manifest_dir: PathBuf,
    pub gitops: GitOpsSettings,
    pub wait: WaitSettings,
}

impl FluxInstall {
    pub fn new(inputs: FluxInputs, repo_root: &Path, settings: &Settings) -> Self {
        let manifest_dir = paths::flux_manifest_dir(repo_root, &inputs.flux_version);
        Self {
            inputs,
            manifest_dir,
            gitops: settings.gitops.clone(),
            wait: settings.wait.clone(),
        }
    }

    pub fn components_manifest(&self) -> PathBuf {
        self.manifest_dir.join(COMPONENTS_MANIFEST)
    }

    pub fn kustomization_manifest(&self) -> PathBuf {
        self.manifest_dir.join(KUSTOMIZATION_MANIFEST)
    }
}

async fn read_key(what: &'static str, path: &Path) -> Result<Vec<u8>> {
    tokio::fs::read(path)
        .await
        .map_err(|source| BootstrapError::ReadInput {
            what,
            path: path.to_path_buf(),
            source,
        })
}

/// Install Flux and point it at the GitOps repository
///
/// Objects are created, not applied: a second run against a bootstrapped
/// cluster fails on the first existing object, which
/// [`BootstrapError::is_already_exists`] identifies.
pub async fn install_fluxcd<A, P, C>(
    install: &FluxInstall,
    applier: &A,
    probe: &P,
    creator: &C,
) -> Result<()>
where
    A: ManifestApplier + ?Sized,
    P: CrdProbe + ?Sized,
    C: ObjectCreator + ?Sized,
{
    let components = install.components_manifest();
    info!(manifest = %components.display(), version = %install.inputs.flux_version, "Applying Flux components");
    let summary = applier.apply(&components).await?;
    info!(applied = summary.applied, skipped = summary.skipped, "Flux components applied");

    let crds = FluxResourceKind::required_crds();
    info!(crds = ?crds, "Waiting for Flux CRDs");
    wait_for_crds(probe, &crds, install.wait.timeout(), install.wait.poll_interval()).await?;

    let kustomization_manifest = install.kustomization_manifest();
    info!(manifest = %kustomization_manifest.display(), "Applying Flux kustomization");
    let summary = applier.apply(&kustomization_manifest).await?;
    info!(applied = summary.applied, skipped = summary.skipped, "Flux kustomization applied");

    let identity = read_key("private deploy key", &install.inputs.key_path).await?;
    let identity_pub = read_key("public deploy key", &install.inputs.public_key_path()).await?;

    let gitops = &install.gitops;
    let secret = resources::deploy_key_secret(
        gitops,
        identity,
        identity_pub,
        &install.inputs.known_hosts,
    );
    creator.create_secret(&secret).await?;
    info!(namespace = %gitops.namespace, name = %gitops.name, "Deploy key secret created");

    creator
        .create_git_repository(&resources::git_repository(gitops))
        .await?;
    info!(url = %gitops.url, branch = %gitops.branch, "GitRepository created");

    creator
        .create_kustomization(&resources::kustomization(gitops))
        .await?;
    info!(path = %gitops.path, "Kustomization created");

    Ok(())
}
