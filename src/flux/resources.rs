//! Objects seeded into the cluster after Flux is installed
//!
//! The deploy-key Secret, the GitRepository that reads the platform
//! repository, and the Kustomization that reconciles the management
//! cluster path from it.

use std::collections::BTreeMap;

use k8s_openapi::ByteString;
use k8s_openapi::api::core::v1::Secret;
use kube::api::ObjectMeta;

use crate::config::GitOpsSettings;
use crate::models::{
    CrossNamespaceSourceReference, FluxResourceKind, GitRepository, GitRepositoryRef,
    GitRepositorySpec, Kustomization, KustomizationSpec, LocalObjectReference,
};

/// Secret keys read by source-controller for SSH authentication
pub const IDENTITY_KEY: &str = "identity";
pub const IDENTITY_PUB_KEY: &str = "identity.pub";
pub const KNOWN_HOSTS_KEY: &str = "known_hosts";

fn metadata(gitops: &GitOpsSettings) -> ObjectMeta {
    ObjectMeta {
        name: Some(gitops.name.clone()),
        namespace: Some(gitops.namespace.clone()),
        ..Default::default()
    }
}

/// Deploy-key Secret referenced by the GitRepository
pub fn deploy_key_secret(
    gitops: &GitOpsSettings,
    identity: Vec<u8>,
    identity_pub: Vec<u8>,
    known_hosts: &str,
) -> Secret {
    let data = BTreeMap::from([
        (IDENTITY_KEY.to_string(), ByteString(identity)),
        (IDENTITY_PUB_KEY.to_string(), ByteString(identity_pub)),
        (
            KNOWN_HOSTS_KEY.to_string(),
            ByteString(known_hosts.as_bytes().to_vec()),
        ),
    ]);

    Secret {
        metadata: metadata(gitops),
        data: Some(data),
        ..Default::default()
    }
}

pub fn git_repository(gitops: &GitOpsSettings) -> GitRepository {
    GitRepository {
        metadata: metadata(gitops),
        spec: GitRepositorySpec {
            interval: gitops.interval.clone(),
            url: gitops.url.clone(),
            r#ref: Some(GitRepositoryRef {
                branch: Some(gitops.branch.clone()),
                ..Default::default()
            }),
            secret_ref: Some(LocalObjectReference {
                name: gitops.name.clone(),
            }),
            ..Default::default()
        },
        status: None,
    }
}

/// Kustomization reconciling `gitops.path` from the GitRepository of the same name
pub fn kustomization(gitops: &GitOpsSettings) -> Kustomization {
    Kustomization {
        metadata: metadata(gitops),
        spec: KustomizationSpec {
            interval: gitops.interval.clone(),
            path: Some(gitops.path.clone()),
            prune: gitops.prune,
            source_ref: CrossNamespaceSourceReference {
                kind: FluxResourceKind::GitRepository.as_str().to_string(),
                name: gitops.name.clone(),
                ..Default::default()
            },
            ..Default::default()
        },
        status: None,
    }
}
