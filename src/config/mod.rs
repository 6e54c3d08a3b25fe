//! Configuration for bootstrap runs
//!
//! Two layers: required environment inputs (versions, key paths, known hosts)
//! that are never defaulted, and an optional settings file for tunables such
//! as the GitOps source and CRD wait timings.

mod defaults;
pub mod env;
pub mod loader;
pub mod paths;
pub mod schema;

pub use env::{CapiVersions, FluxInputs, ProcessEnv, VarSource, require};
pub use loader::SettingsLoader;
pub use schema::{ApplySettings, GitOpsSettings, Settings, WaitSettings};
