//! Required environment inputs
//!
//! Versions and credential paths are read exactly once at the program
//! boundary. There are no defaults: an unset version must never fall through
//! to "latest" or to an empty provider tag.

use std::collections::HashMap;
use std::path::PathBuf;

use crate::error::{BootstrapError, Result};

pub const CAPI_VERSION: &str = "CAPI_VERSION";
pub const CAPA_VERSION: &str = "CAPA_VERSION";
pub const FLUXCD_VERSION: &str = "FLUXCD_VERSION";
pub const FLUX_KEY_PATH: &str = "FLUX_KEY_PATH";
pub const GITHUB_KNOWN_HOSTS: &str = "GITHUB_KNOWN_HOSTS";

/// Source of named string variables
pub trait VarSource {
    fn var(&self, name: &str) -> Option<String>;
}

/// The process environment
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessEnv;

impl VarSource for ProcessEnv {
    fn var(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }
}

impl VarSource for HashMap<String, String> {
    fn var(&self, name: &str) -> Option<String> {
        self.get(name).cloned()
    }
}

impl VarSource for HashMap<&str, &str> {
    fn var(&self, name: &str) -> Option<String> {
        self.get(name).map(|v| v.to_string())
    }
}

/// Read a required variable, trimmed, failing when it is absent or blank
pub fn require(vars: &impl VarSource, name: &str) -> Result<String> {
    match vars.var(name) {
        Some(value) if !value.trim().is_empty() => Ok(value.trim().to_string()),
        _ => Err(BootstrapError::MissingVariable {
            name: name.to_string(),
        }),
    }
}

/// Cluster API provider versions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapiVersions {
    /// Core, kubeadm bootstrap and kubeadm control-plane version
    pub capi_version: String,
    /// AWS infrastructure provider version
    pub capa_version: String,
}

impl CapiVersions {
    pub fn from_vars(vars: &impl VarSource) -> Result<Self> {
        Ok(Self {
            capi_version: require(vars, CAPI_VERSION)?,
            capa_version: require(vars, CAPA_VERSION)?,
        })
    }
}

/// FluxCD install inputs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FluxInputs {
    pub flux_version: String,
    /// Private deploy key; the public half is expected next to it with `.pub`
    pub key_path: PathBuf,
    pub known_hosts: String,
}

impl FluxInputs {
    pub fn from_vars(vars: &impl VarSource) -> Result<Self> {
        Ok(Self {
            flux_version: require(vars, FLUXCD_VERSION)?,
            key_path: PathBuf::from(require(vars, FLUX_KEY_PATH)?),
            known_hosts: require(vars, GITHUB_KNOWN_HOSTS)?,
        })
    }

    /// Path of the public deploy key
    pub fn public_key_path(&self) -> PathBuf {
        let mut path = self.key_path.clone().into_os_string();
        path.push(".pub");
        PathBuf::from(path)
    }
}
