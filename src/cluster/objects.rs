//! Typed object creation
//!
//! Objects are created, never updated: re-running against a cluster that
//! already has them surfaces the API server's "already exists" error.

use std::fmt::Debug;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use k8s_openapi::NamespaceResourceScope;
use k8s_openapi::api::core::v1::Secret;
use kube::api::PostParams;
use kube::{Api, Client, Resource, ResourceExt};
#[cfg(test)]
use mockall::automock;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::sync::OnceCell;
use tracing::{debug, info};

use crate::error::{BootstrapError, Result};
use crate::models::{GitRepository, Kustomization};

/// Creates the objects seeded during bootstrap
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ObjectCreator: Send + Sync {
    async fn create_secret(&self, secret: &Secret) -> Result<()>;

    async fn create_git_repository(&self, repository: &GitRepository) -> Result<()>;

    async fn create_kustomization(&self, kustomization: &Kustomization) -> Result<()>;
}

/// Creator backed by a typed kube client
pub struct KubeObjectCreator {
    client: OnceCell<Client>,
    kubeconfig: Option<PathBuf>,
    context: Option<String>,
}

impl KubeObjectCreator {
    pub fn new(client: Client) -> Self {
        Self {
            client: OnceCell::new_with(Some(client)),
            kubeconfig: None,
            context: None,
        }
    }

    /// Creator that resolves cluster configuration on its first create
    ///
    /// The first create happens only after the Flux CRDs are established.
    pub fn deferred(kubeconfig: Option<&Path>, context: Option<&str>) -> Self {
        Self {
            client: OnceCell::new(),
            kubeconfig: kubeconfig.map(Path::to_path_buf),
            context: context.map(str::to_string),
        }
    }

    async fn client(&self) -> Result<Client> {
        self.client
            .get_or_try_init(|| async {
                debug!(kubeconfig = ?self.kubeconfig, context = ?self.context, "Connecting typed client");
                let handle =
                    super::connect(self.kubeconfig.as_deref(), self.context.as_deref()).await?;
                Ok::<_, BootstrapError>(handle.client())
            })
            .await
            .cloned()
    }

    async fn create<K>(&self, object: &K) -> Result<()>
    where
        K: Resource<Scope = NamespaceResourceScope, DynamicType = ()>
            + Clone
            + Debug
            + Serialize
            + DeserializeOwned,
    {
        let kind = K::kind(&());
        let name = object.name_any();
        let namespace = object.namespace().ok_or_else(|| {
            BootstrapError::InvalidSettings(format!("{} {} has no namespace", kind, name))
        })?;

        let api: Api<K> = Api::namespaced(self.client().await?, &namespace);
        api.create(&PostParams::default(), object)
            .await
            .map_err(|e| {
                BootstrapError::delegate(
                    format!("failed to create {} {}/{}", kind, namespace, name),
                    e,
                )
            })?;

        info!(%kind, %namespace, %name, "Created object");
        Ok(())
    }
}

#[async_trait]
impl ObjectCreator for KubeObjectCreator {
    async fn create_secret(&self, secret: &Secret) -> Result<()> {
        self.create(secret).await
    }

    async fn create_git_repository(&self, repository: &GitRepository) -> Result<()> {
        self.create(repository).await
    }

    async fn create_kustomization(&self, kustomization: &Kustomization) -> Result<()> {
        self.create(kustomization).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::mock_api::{mock_client, not_found, status};
    use crate::config::GitOpsSettings;
    use crate::flux::resources;
    use http::Method;

    const SECRETS: &str = "/api/v1/namespaces/flux-system/secrets";
    const GIT_REPOSITORIES: &str =
        "/apis/source.toolkit.fluxcd.io/v1/namespaces/flux-system/gitrepositories";

    fn secret() -> Secret {
        resources::deploy_key_secret(
            &GitOpsSettings::default(),
            b"PRIVATE".to_vec(),
            b"PUBLIC".to_vec(),
            "github.com ssh-ed25519 AAAA",
        )
    }

    #[tokio::test]
    async fn test_existing_secret_is_already_exists() {
        let (client, recorded) = mock_client(|method, path| {
            if method == Method::POST && path == SECRETS {
                (
                    409,
                    status(409, "AlreadyExists", "secrets \"flux-system\" already exists"),
                )
            } else {
                not_found(path)
            }
        });
        let creator = KubeObjectCreator::new(client);

        let err = creator.create_secret(&secret()).await.unwrap_err();
        assert!(err.is_already_exists());
        assert!(
            err.to_string()
                .starts_with("failed to create Secret flux-system/flux-system")
        );
        assert!(recorded.lock().unwrap()[0].starts_with(&format!("POST {}", SECRETS)));
    }

    #[tokio::test]
    async fn test_git_repository_posted_to_namespaced_path() {
        let repository = resources::git_repository(&GitOpsSettings::default());
        let created = serde_json::to_value(&repository).unwrap();
        let (client, recorded) = mock_client(move |method, path| {
            if method == Method::POST && path == GIT_REPOSITORIES {
                (201, created.clone())
            } else {
                not_found(path)
            }
        });
        let creator = KubeObjectCreator::new(client);

        creator.create_git_repository(&repository).await.unwrap();
        assert_eq!(recorded.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_other_api_errors_are_not_already_exists() {
        let (client, _) = mock_client(|_, _| (403, status(403, "Forbidden", "denied")));
        let creator = KubeObjectCreator::new(client);

        let err = creator.create_secret(&secret()).await.unwrap_err();
        assert!(matches!(err, BootstrapError::Delegate { .. }));
        assert!(!err.is_already_exists());
    }

    #[tokio::test]
    async fn test_missing_namespace_rejected_before_request() {
        let (client, recorded) = mock_client(|_, path| not_found(path));
        let creator = KubeObjectCreator::new(client);
        let mut secret = secret();
        secret.metadata.namespace = None;

        let err = creator.create_secret(&secret).await.unwrap_err();
        assert!(matches!(err, BootstrapError::InvalidSettings(_)));
        assert!(recorded.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_deferred_creator_connects_on_first_create() {
        let creator = KubeObjectCreator::deferred(Some(Path::new("/nonexistent/kubeconfig")), None);
        assert!(creator.client.get().is_none());

        let err = creator.create_secret(&secret()).await.unwrap_err();
        assert!(err.to_string().starts_with("failed to read kubeconfig"));
    }
}
