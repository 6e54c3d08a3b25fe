//! Flux install tests against recording fakes

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;
use k8s_openapi::api::core::v1::Secret;
use platform_bootstrap::cluster::{ApplySummary, CrdProbe, CrdStatus, ManifestApplier, ObjectCreator};
use platform_bootstrap::config::{FluxInputs, GitOpsSettings, Settings};
use platform_bootstrap::flux::{FluxInstall, install_fluxcd, resources};
use platform_bootstrap::models::{FluxResourceKind, GitRepository, Kustomization};
use platform_bootstrap::{ApplyError, BootstrapError, Result};

/// Records every call in order
#[derive(Default)]
struct Cluster {
    calls: Mutex<Vec<String>>,
    git_repositories: Mutex<Vec<GitRepository>>,
    kustomizations: Mutex<Vec<Kustomization>>,
}

impl Cluster {
    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ManifestApplier for Cluster {
    async fn apply(&self, path: &Path) -> std::result::Result<ApplySummary, ApplyError> {
        let file = path.file_name().unwrap().to_string_lossy().to_string();
        self.record(format!("apply {}", file));
        Ok(ApplySummary { applied: 1, skipped: 0 })
    }
}

#[async_trait]
impl CrdProbe for Cluster {
    async fn crd_status(&self, name: &str) -> Result<CrdStatus> {
        self.record(format!("probe {}", name));
        Ok(CrdStatus::Established)
    }
}

#[async_trait]
impl ObjectCreator for Cluster {
    async fn create_secret(&self, secret: &Secret) -> Result<()> {
        let keys: Vec<_> = secret.data.iter().flat_map(|d| d.keys().cloned()).collect();
        self.record(format!("secret {}", keys.join(",")));
        Ok(())
    }

    async fn create_git_repository(&self, repository: &GitRepository) -> Result<()> {
        self.record("gitrepository".to_string());
        self.git_repositories.lock().unwrap().push(repository.clone());
        Ok(())
    }

    async fn create_kustomization(&self, kustomization: &Kustomization) -> Result<()> {
        self.record("kustomization".to_string());
        self.kustomizations.lock().unwrap().push(kustomization.clone());
        Ok(())
    }
}

fn install(dir: &Path) -> FluxInstall {
    let key_path = dir.join("identity");
    std::fs::write(&key_path, "PRIVATE").unwrap();
    std::fs::write(dir.join("identity.pub"), "PUBLIC").unwrap();
    let inputs = FluxInputs {
        flux_version: "2.3.0".to_string(),
        key_path,
        known_hosts: "github.com ssh-ed25519 AAAA".to_string(),
    };
    FluxInstall::new(inputs, Path::new("/repo"), &Settings::default())
}

#[test]
fn test_required_crds() {
    assert_eq!(
        FluxResourceKind::required_crds(),
        vec![
            "kustomizations.kustomize.toolkit.fluxcd.io".to_string(),
            "gitrepositories.source.toolkit.fluxcd.io".to_string(),
        ]
    );
}

#[test]
fn test_git_repository_defaults() {
    let repo = resources::git_repository(&GitOpsSettings::default());
    assert_eq!(repo.metadata.name.as_deref(), Some("flux-system"));
    assert_eq!(repo.metadata.namespace.as_deref(), Some("flux-system"));
    assert_eq!(repo.spec.url, "ssh://git@github.com/olga-mir/k8s-multi-cluster");
    assert_eq!(repo.spec.interval, "2m");
    assert_eq!(
        repo.spec.r#ref.as_ref().and_then(|r| r.branch.as_deref()),
        Some("develop")
    );
    assert_eq!(
        repo.spec.secret_ref.as_ref().map(|s| s.name.as_str()),
        Some("flux-system")
    );
}

#[test]
fn test_kustomization_defaults_serialize() {
    let value = serde_json::to_value(resources::kustomization(&GitOpsSettings::default())).unwrap();
    assert_eq!(value["apiVersion"], "kustomize.toolkit.fluxcd.io/v1");
    assert_eq!(value["kind"], "Kustomization");
    assert_eq!(value["metadata"]["namespace"], "flux-system");
    assert_eq!(value["spec"]["path"], "./clusters/cluster-mgmt");
    assert_eq!(value["spec"]["prune"], true);
    assert_eq!(value["spec"]["interval"], "2m");
    assert_eq!(value["spec"]["sourceRef"]["kind"], "GitRepository");
    assert_eq!(value["spec"]["sourceRef"]["name"], "flux-system");
}

#[tokio::test]
async fn test_install_order() {
    let dir = tempfile::tempdir().unwrap();
    let install = install(dir.path());
    assert_eq!(
        install.manifest_dir,
        PathBuf::from("/repo/k8s-platform/flux/v2.3.0")
    );

    let cluster = Cluster::default();
    install_fluxcd(&install, &cluster, &cluster, &cluster)
        .await
        .unwrap();

    assert_eq!(
        cluster.calls(),
        vec![
            "apply gotk-components.yaml",
            "probe kustomizations.kustomize.toolkit.fluxcd.io",
            "probe gitrepositories.source.toolkit.fluxcd.io",
            "apply kustomization.yaml",
            "secret identity,identity.pub,known_hosts",
            "gitrepository",
            "kustomization",
        ]
    );
    assert_eq!(cluster.git_repositories.lock().unwrap().len(), 1);
    assert_eq!(cluster.kustomizations.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_missing_public_key_stops_before_secret() {
    let dir = tempfile::tempdir().unwrap();
    let install = install(dir.path());
    std::fs::remove_file(dir.path().join("identity.pub")).unwrap();

    let cluster = Cluster::default();
    let err = install_fluxcd(&install, &cluster, &cluster, &cluster)
        .await
        .unwrap_err();

    assert!(matches!(err, BootstrapError::ReadInput { what: "public deploy key", .. }));
    assert!(!cluster.calls().iter().any(|c| c.starts_with("secret")));
}
