//! Bootstrap helpers for a Cluster API management cluster
//!
//! [`capi::init_cluster_api`] installs Cluster API through clusterctl and
//! [`flux::install_fluxcd`] installs Flux and hands the cluster over to
//! GitOps. Both take their collaborators as traits so they can run against
//! mocks as well as a live API server.

pub mod capi;
pub mod cluster;
pub mod config;
pub mod error;
pub mod flux;
pub mod models;

pub use error::{ApplyError, BootstrapError, Result};
