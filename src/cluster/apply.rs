//! Manifest application
//!
//! Applies multi-document YAML/JSON manifest files with server-side apply,
//! resolving each document's kind through API discovery.
//!
//! Applies in two phases:
//! 1. Namespaces and CRDs (foundational resources)
//! 2. Re-run discovery to learn new CRD types, then everything else sorted by
//!    kind priority
//!
//! Rejected documents do not stop the run; the outcome distinguishes a file
//! where every object was rejected from one where only some were.

use std::path::Path;

use async_trait::async_trait;
use kube::Client;
use kube::api::{Api, DynamicObject, GroupVersionKind, Patch, PatchParams};
use kube::discovery::{Discovery, Scope};
#[cfg(test)]
use mockall::automock;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::error::{ApplyError, RejectedDocument};

/// API group of kustomize's build-time `Kustomization` file
const KUSTOMIZE_CONFIG_GROUP: &str = "kustomize.config.k8s.io";

/// Outcome of applying a manifest file
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ApplySummary {
    pub applied: usize,
    /// Documents that are not cluster objects
    pub skipped: usize,
}

/// Applies manifest files to the cluster
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ManifestApplier: Send + Sync {
    async fn apply(&self, path: &Path) -> Result<ApplySummary, ApplyError>;
}

/// Get priority for a Kubernetes resource kind (lower = apply first)
pub fn kind_priority(kind: &str) -> u8 {
    match kind {
        "Namespace" => 0,
        "CustomResourceDefinition" => 1,
        "ServiceAccount" => 2,
        "ClusterRole" | "Role" => 3,
        "ClusterRoleBinding" | "RoleBinding" => 4,
        "ConfigMap" | "Secret" => 5,
        "Service" => 6,
        "Deployment" | "DaemonSet" | "StatefulSet" => 7,
        _ => 10,
    }
}

/// Split a manifest into its non-empty documents
///
/// JSON input is accepted too, since JSON is valid YAML.
pub fn split_documents(text: &str) -> Result<Vec<serde_json::Value>, String> {
    let mut documents = Vec::new();
    for document in serde_yaml::Deserializer::from_str(text) {
        let value = serde_json::Value::deserialize(document).map_err(|e| e.to_string())?;
        if !value.is_null() {
            documents.push(value);
        }
    }
    Ok(documents)
}

/// A decoded manifest document
#[derive(Debug, Clone, PartialEq)]
pub struct ManifestObject {
    /// Position in the manifest file
    pub index: usize,
    pub gvk: GroupVersionKind,
    pub name: String,
    pub namespace: Option<String>,
    pub body: serde_json::Value,
}

impl ManifestObject {
    /// Read the identifying fields of a document
    pub fn from_value(index: usize, body: serde_json::Value) -> Result<Self, String> {
        let kind = body
            .get("kind")
            .and_then(|v| v.as_str())
            .ok_or_else(|| "missing kind".to_string())?;
        let api_version = body
            .get("apiVersion")
            .and_then(|v| v.as_str())
            .ok_or_else(|| format!("{}: missing apiVersion", kind))?;
        let name = body
            .pointer("/metadata/name")
            .and_then(|v| v.as_str())
            .ok_or_else(|| format!("{}: missing metadata.name", kind))?;
        let namespace = body
            .pointer("/metadata/namespace")
            .and_then(|v| v.as_str())
            .map(str::to_string);

        let (group, version) = api_version.split_once('/').unwrap_or(("", api_version));

        Ok(Self {
            index,
            gvk: GroupVersionKind::gvk(group, version, kind),
            name: name.to_string(),
            namespace,
            body,
        })
    }

    /// `Kind/name` for messages
    pub fn display_name(&self) -> String {
        format!("{}/{}", self.gvk.kind, self.name)
    }

    /// Namespaces and CRDs must exist before anything that depends on them
    pub fn is_foundational(&self) -> bool {
        self.gvk.kind == "Namespace" || self.gvk.kind == "CustomResourceDefinition"
    }

}

/// kustomize build input rather than a cluster object
///
/// Decided from `apiVersion` alone: build files carry no `metadata`.
pub fn is_build_config(body: &serde_json::Value) -> bool {
    body.get("apiVersion")
        .and_then(|v| v.as_str())
        .and_then(|api_version| api_version.split_once('/'))
        .is_some_and(|(group, _)| group == KUSTOMIZE_CONFIG_GROUP)
}

/// Turn per-document results into the overall outcome
pub fn summarize(
    path: &Path,
    applied: usize,
    skipped: usize,
    mut failures: Vec<RejectedDocument>,
) -> Result<ApplySummary, ApplyError> {
    if failures.is_empty() {
        return Ok(ApplySummary { applied, skipped });
    }

    failures.sort_by_key(|f| f.index);
    if applied == 0 {
        Err(ApplyError::Rejected {
            path: path.to_path_buf(),
            failures,
        })
    } else {
        Err(ApplyError::Partial {
            path: path.to_path_buf(),
            applied,
            total: applied + failures.len(),
            failures,
        })
    }
}

/// Applier backed by a discovery-driven dynamic client
pub struct DynamicApplier {
    client: Client,
    field_manager: String,
}

impl DynamicApplier {
    pub fn new(client: Client, field_manager: impl Into<String>) -> Self {
        Self {
            client,
            field_manager: field_manager.into(),
        }
    }

    async fn discover(&self, path: &Path) -> Result<Discovery, ApplyError> {
        Discovery::new(self.client.clone())
            .run()
            .await
            .map_err(|source| ApplyError::Discovery {
                path: path.to_path_buf(),
                source,
            })
    }

    async fn apply_object(
        &self,
        discovery: &Discovery,
        object: &ManifestObject,
    ) -> Result<(), String> {
        let (api_resource, caps) = discovery.resolve_gvk(&object.gvk).ok_or_else(|| {
            format!(
                "unknown resource type {}/{} {}",
                object.gvk.group, object.gvk.version, object.gvk.kind
            )
        })?;

        let api: Api<DynamicObject> = match caps.scope {
            Scope::Namespaced => Api::namespaced_with(
                self.client.clone(),
                object.namespace.as_deref().unwrap_or("default"),
                &api_resource,
            ),
            Scope::Cluster => Api::all_with(self.client.clone(), &api_resource),
        };

        let params = PatchParams::apply(&self.field_manager).force();
        api.patch(&object.name, &params, &Patch::Apply(&object.body))
            .await
            .map_err(|e| e.to_string())?;

        debug!(
            kind = %object.gvk.kind,
            name = %object.name,
            namespace = ?object.namespace,
            "Applied manifest object"
        );
        Ok(())
    }

    async fn apply_batch(
        &self,
        path: &Path,
        objects: &[ManifestObject],
        failures: &mut Vec<RejectedDocument>,
    ) -> Result<usize, ApplyError> {
        if objects.is_empty() {
            return Ok(0);
        }

        let discovery = self.discover(path).await?;
        let mut applied = 0;
        for object in objects {
            match self.apply_object(&discovery, object).await {
                Ok(()) => applied += 1,
                Err(reason) => {
                    warn!(object = %object.display_name(), %reason, "Object rejected");
                    failures.push(RejectedDocument {
                        index: object.index,
                        object: object.display_name(),
                        reason,
                    });
                }
            }
        }
        Ok(applied)
    }
}

#[async_trait]
impl ManifestApplier for DynamicApplier {
    async fn apply(&self, path: &Path) -> Result<ApplySummary, ApplyError> {
        let text = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| ApplyError::Read {
                path: path.to_path_buf(),
                source,
            })?;

        let documents = split_documents(&text).map_err(|message| ApplyError::Decode {
            path: path.to_path_buf(),
            message,
        })?;

        let mut failures = Vec::new();
        let mut skipped = 0;
        let mut objects = Vec::new();
        for (index, body) in documents.into_iter().enumerate() {
            if is_build_config(&body) {
                debug!(index, "Skipping kustomize build configuration");
                skipped += 1;
                continue;
            }
            match ManifestObject::from_value(index, body) {
                Ok(object) => objects.push(object),
                Err(reason) => failures.push(RejectedDocument {
                    index,
                    object: "<unknown>".to_string(),
                    reason,
                }),
            }
        }

        let (mut foundational, mut rest): (Vec<_>, Vec<_>) =
            objects.into_iter().partition(ManifestObject::is_foundational);
        foundational.sort_by_key(|o| kind_priority(&o.gvk.kind));
        rest.sort_by_key(|o| kind_priority(&o.gvk.kind));

        let mut applied = self.apply_batch(path, &foundational, &mut failures).await?;
        applied += self.apply_batch(path, &rest, &mut failures).await?;

        info!(
            manifest = %path.display(),
            applied,
            skipped,
            rejected = failures.len(),
            "Applied manifest"
        );
        summarize(path, applied, skipped, failures)
    }
}
