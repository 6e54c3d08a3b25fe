//! Flux model layer
//!
//! Typed Flux CRD resources the bootstrap creates.
//!
//! Structure:
//! - `source_controller.rs` - GitRepository
//! - `kustomize_controller.rs` - Kustomization
//! - `flux_resource_kind.rs` - kind metadata shared by the models and the CRD wait

pub mod flux_resource_kind;
pub mod kustomize_controller;
pub mod source_controller;

pub use flux_resource_kind::FluxResourceKind;
pub use kustomize_controller::{CrossNamespaceSourceReference, Kustomization, KustomizationSpec};
pub use source_controller::{GitRepository, GitRepositoryRef, GitRepositorySpec, LocalObjectReference};

#[cfg(test)]
mod tests {
    use super::*;
    use kube::Resource;

    #[test]
    fn test_models_match_kind_metadata() {
        assert_eq!(
            GitRepository::group(&()),
            FluxResourceKind::GitRepository.api_group()
        );
        assert_eq!(
            GitRepository::plural(&()),
            FluxResourceKind::GitRepository.plural()
        );
        assert_eq!(
            Kustomization::group(&()),
            FluxResourceKind::Kustomization.api_group()
        );
        assert_eq!(
            Kustomization::plural(&()),
            FluxResourceKind::Kustomization.plural()
        );
        assert_eq!(Kustomization::api_version(&()), "kustomize.toolkit.fluxcd.io/v1");
    }
}
