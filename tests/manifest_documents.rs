//! Manifest document handling tests

use std::io::Write;
use std::path::Path;

use kube::{Client, Config};
use platform_bootstrap::ApplyError;
use platform_bootstrap::cluster::apply::{
    ManifestObject, is_build_config, kind_priority, split_documents, summarize,
};
use platform_bootstrap::cluster::{ApplySummary, DynamicApplier, ManifestApplier};
use platform_bootstrap::error::RejectedDocument;

const COMPONENTS: &str = r#"---
# Flux version: v2.3.0
apiVersion: v1
kind: Namespace
metadata:
  name: flux-system
---
apiVersion: apps/v1
kind: Deployment
metadata:
  name: source-controller
  namespace: flux-system
---
---
apiVersion: apiextensions.k8s.io/v1
kind: CustomResourceDefinition
metadata:
  name: gitrepositories.source.toolkit.fluxcd.io
"#;

#[test]
fn test_empty_documents_dropped() {
    let documents = split_documents(COMPONENTS).unwrap();
    assert_eq!(documents.len(), 3);
    assert_eq!(documents[1]["kind"], "Deployment");
}

#[test]
fn test_json_manifest_accepted() {
    let documents =
        split_documents(r#"{"apiVersion": "v1", "kind": "ConfigMap", "metadata": {"name": "c"}}"#)
            .unwrap();
    assert_eq!(documents.len(), 1);
}

#[test]
fn test_malformed_yaml_is_error() {
    assert!(split_documents("kind: [unclosed").is_err());
}

#[test]
fn test_foundational_objects_sort_first() {
    let mut objects: Vec<ManifestObject> = split_documents(COMPONENTS)
        .unwrap()
        .into_iter()
        .enumerate()
        .map(|(index, body)| ManifestObject::from_value(index, body).unwrap())
        .collect();
    objects.sort_by_key(|o| kind_priority(&o.gvk.kind));

    let names: Vec<_> = objects.iter().map(ManifestObject::display_name).collect();
    assert_eq!(
        names,
        vec![
            "Namespace/flux-system",
            "CustomResourceDefinition/gitrepositories.source.toolkit.fluxcd.io",
            "Deployment/source-controller",
        ]
    );
    assert_eq!(objects[2].namespace.as_deref(), Some("flux-system"));
    assert_eq!(objects[1].gvk.group, "apiextensions.k8s.io");
}

#[test]
fn test_rejected_error_lists_documents() {
    let err = summarize(
        Path::new("kustomization.yaml"),
        0,
        0,
        vec![RejectedDocument {
            index: 0,
            object: "GitRepository/flux-system".to_string(),
            reason: "no matches for kind".to_string(),
        }],
    )
    .unwrap_err();

    assert!(matches!(err, ApplyError::Rejected { .. }));
    assert_eq!(err.path(), Path::new("kustomization.yaml"));
    assert!(err.to_string().contains("#0 GitRepository/flux-system: no matches for kind"));
}

/// kustomization.yaml as written by `flux install --export`
const FLUX_KUSTOMIZATION: &str = r#"apiVersion: kustomize.config.k8s.io/v1beta1
kind: Kustomization
resources:
- gotk-components.yaml
- gotk-sync.yaml
"#;

#[test]
fn test_build_config_needs_no_metadata() {
    let documents = split_documents(FLUX_KUSTOMIZATION).unwrap();
    assert!(is_build_config(&documents[0]));
    assert!(ManifestObject::from_value(0, documents[0].clone()).is_err());
}

#[tokio::test]
async fn test_flux_kustomization_file_applies_as_skipped() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(FLUX_KUSTOMIZATION.as_bytes()).unwrap();

    // Nothing is sent, so the server is never contacted
    let client = Client::try_from(Config::new("http://127.0.0.1:1".parse().unwrap())).unwrap();
    let applier = DynamicApplier::new(client, "platform-bootstrap");

    let summary = applier.apply(file.path()).await.unwrap();
    assert_eq!(summary, ApplySummary { applied: 0, skipped: 1 });
}
