//! Flux resource kinds seeded during bootstrap
//!
//! Centralizes the API group, plural and CRD name of each Flux kind this crate
//! creates, so the CRD wait list and the typed models never drift apart.

/// Flux CRD kinds created by the bootstrap
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FluxResourceKind {
    // Source Controller resources
    GitRepository,
    // Kustomize Controller resources
    Kustomization,
}

impl FluxResourceKind {
    /// Get the display name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            FluxResourceKind::GitRepository => "GitRepository",
            FluxResourceKind::Kustomization => "Kustomization",
        }
    }

    /// API group served by the owning controller
    pub fn api_group(&self) -> &'static str {
        match self {
            FluxResourceKind::GitRepository => "source.toolkit.fluxcd.io",
            FluxResourceKind::Kustomization => "kustomize.toolkit.fluxcd.io",
        }
    }

    /// Plural resource name (CRD spec.names.plural)
    pub fn plural(&self) -> &'static str {
        match self {
            FluxResourceKind::GitRepository => "gitrepositories",
            FluxResourceKind::Kustomization => "kustomizations",
        }
    }

    /// CustomResourceDefinition name, `<plural>.<group>`
    pub fn crd_name(&self) -> String {
        format!("{}.{}", self.plural(), self.api_group())
    }

    /// Get all kinds the bootstrap depends on
    pub fn all() -> &'static [Self] {
        &[
            FluxResourceKind::Kustomization,
            FluxResourceKind::GitRepository,
        ]
    }

    /// CRD names that must be established before seeding objects
    pub fn required_crds() -> Vec<String> {
        Self::all().iter().map(FluxResourceKind::crd_name).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crd_names() {
        assert_eq!(
            FluxResourceKind::Kustomization.crd_name(),
            "kustomizations.kustomize.toolkit.fluxcd.io"
        );
        assert_eq!(
            FluxResourceKind::GitRepository.crd_name(),
            "gitrepositories.source.toolkit.fluxcd.io"
        );
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
}
