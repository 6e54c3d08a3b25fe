//! Error types for bootstrap operations
//!
//! Every helper returns these instead of terminating the process; the binary
//! decides how to exit.

use std::path::PathBuf;
use std::time::Duration;

/// Boxed error from a delegated library or tool
pub type DelegateSource = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Bootstrap errors
#[derive(Debug, thiserror::Error)]
pub enum BootstrapError {
    #[error("{name} environment variable is not set")]
    MissingVariable { name: String },

    #[error("Invalid settings: {0}")]
    InvalidSettings(String),

    #[error("Failed to read {what} from {}", .path.display())]
    ReadInput {
        what: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Apply(#[from] ApplyError),

    #[error(
        "Timed out after {}s waiting for CRDs to become established: {}",
        .timeout.as_secs(),
        .pending.join(", ")
    )]
    Timeout {
        pending: Vec<String>,
        timeout: Duration,
    },

    #[error("{phase}: {source}")]
    Delegate {
        phase: String,
        #[source]
        source: DelegateSource,
    },
}

impl BootstrapError {
    /// Wrap a delegated failure with the phase it happened in
    pub fn delegate(
        phase: impl Into<String>,
        source: impl Into<DelegateSource>,
    ) -> Self {
        BootstrapError::Delegate {
            phase: phase.into(),
            source: source.into(),
        }
    }

    /// True for missing or invalid inputs, which are never worth retrying
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            BootstrapError::MissingVariable { .. }
                | BootstrapError::InvalidSettings(_)
                | BootstrapError::ReadInput { .. }
        )
    }

    /// True when the API server rejected a create because the object exists
    pub fn is_already_exists(&self) -> bool {
        match self {
            BootstrapError::Delegate { source, .. } => matches!(
                source.downcast_ref::<kube::Error>(),
                Some(kube::Error::Api(resp)) if resp.code == 409
            ),
            _ => false,
        }
    }
}

/// A single manifest document the API server refused
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedDocument {
    /// Position of the document in the file (0-based)
    pub index: usize,
    /// `Kind/name` of the object, as far as it could be read
    pub object: String,
    pub reason: String,
}

impl std::fmt::Display for RejectedDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{} {}: {}", self.index, self.object, self.reason)
    }
}

fn join_rejected(failures: &[RejectedDocument]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Manifest application errors
#[derive(Debug, thiserror::Error)]
pub enum ApplyError {
    #[error("Failed to read manifest {}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to decode manifest {}: {message}", .path.display())]
    Decode { path: PathBuf, message: String },

    #[error("API discovery failed while applying {}: {source}", .path.display())]
    Discovery {
        path: PathBuf,
        #[source]
        source: kube::Error,
    },

    #[error("All objects in {} were rejected: {}", .path.display(), join_rejected(.failures))]
    Rejected {
        path: PathBuf,
        failures: Vec<RejectedDocument>,
    },

    #[error(
        "{applied} of {total} objects in {} applied, rejected: {}",
        .path.display(),
        join_rejected(.failures)
    )]
    Partial {
        path: PathBuf,
        applied: usize,
        total: usize,
        failures: Vec<RejectedDocument>,
    },
}

impl ApplyError {
    /// Manifest the error refers to
    pub fn path(&self) -> &std::path::Path {
        match self {
            ApplyError::Read { path, .. }
            | ApplyError::Decode { path, .. }
            | ApplyError::Discovery { path, .. }
            | ApplyError::Rejected { path, .. }
            | ApplyError::Partial { path, .. } => path,
        }
    }
}

/// Result type for bootstrap operations
pub type Result<T, E = BootstrapError> = std::result::Result<T, E>;
