//! Settings file schema
//!
//! Tunables that are safe to default. Versions and credentials are not here;
//! they come from [`super::env`].

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Root settings structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    /// GitOps source the cluster is pointed at
    #[serde(default)]
    pub gitops: GitOpsSettings,

    /// CRD readiness wait
    #[serde(default)]
    pub wait: WaitSettings,

    /// Manifest application
    #[serde(default)]
    pub apply: ApplySettings,
}

/// GitRepository and Kustomization seeded into the cluster
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GitOpsSettings {
    /// Name shared by the Secret, GitRepository and Kustomization
    #[serde(default = "default_flux_system")]
    pub name: String,

    #[serde(default = "default_flux_system")]
    pub namespace: String,

    #[serde(default = "default_repo_url")]
    pub url: String,

    #[serde(default = "default_branch")]
    pub branch: String,

    /// Path inside the repository the Kustomization reconciles
    #[serde(default = "default_path")]
    pub path: String,

    /// Reconcile interval in Flux duration notation
    #[serde(default = "default_interval")]
    pub interval: String,

    #[serde(default = "default_true")]
    pub prune: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WaitSettings {
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,

    #[serde(default = "default_poll_interval_seconds")]
    pub poll_interval_seconds: u64,
}

impl WaitSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_seconds)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ApplySettings {
    /// Field manager used for server-side apply
    #[serde(default = "default_field_manager")]
    pub field_manager: String,
}

// Default value functions
fn default_flux_system() -> String {
    "flux-system".to_string()
}

fn default_repo_url() -> String {
    "ssh://git@github.com/olga-mir/k8s-multi-cluster".to_string()
}

fn default_branch() -> String {
    "develop".to_string()
}

fn default_path() -> String {
    "./clusters/cluster-mgmt".to_string()
}

fn default_interval() -> String {
    "2m".to_string()
}

fn default_true() -> bool {
    true
}

fn default_timeout_seconds() -> u64 {
    300
}

fn default_poll_interval_seconds() -> u64 {
    5
}

fn default_field_manager() -> String {
    "platform-bootstrap".to_string()
}

impl Default for GitOpsSettings {
    fn default() -> Self {
        Self {
            name: default_flux_system(),
            namespace: default_flux_system(),
            url: default_repo_url(),
            branch: default_branch(),
            path: default_path(),
            interval: default_interval(),
            prune: default_true(),
        }
    }
}

impl Default for WaitSettings {
    fn default() -> Self {
        Self {
            timeout_seconds: default_timeout_seconds(),
            poll_interval_seconds: default_poll_interval_seconds(),
        }
    }
}

impl Default for ApplySettings {
    fn default() -> Self {
        Self {
            field_manager: default_field_manager(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.gitops.branch, "develop");
        assert_eq!(settings.gitops.interval, "2m");
        assert!(settings.gitops.prune);
        assert_eq!(settings.wait.poll_interval(), Duration::from_secs(5));
    }

    #[test]
    fn test_settings_serialization() {
        let settings = Settings::default();
        let yaml = serde_yaml::to_string(&settings).unwrap();
        assert!(yaml.contains("timeoutSeconds"));
        assert!(yaml.contains("fieldManager"));
    }

    #[test]
    fn test_partial_settings_keep_defaults() {
        let yaml = r#"
gitops:
  branch: main
wait:
  timeoutSeconds: 60
"#;
        let settings: Settings = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(settings.gitops.branch, "main");
        assert_eq!(settings.gitops.path, "./clusters/cluster-mgmt");
        assert_eq!(settings.wait.timeout_seconds, 60);
        assert_eq!(settings.wait.poll_interval_seconds, 5);
    }
}
