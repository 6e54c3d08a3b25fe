//! CRD readiness polling
//!
//! Manifests that register CRDs return before the API server serves the new
//! kinds. Objects of those kinds can only be created once every CRD reports
//! `Established=True`.

use std::time::Duration;

use async_trait::async_trait;
use k8s_openapi::apiextensions_apiserver::pkg::apis::apiextensions::v1::CustomResourceDefinition;
use kube::runtime::wait::{Condition, conditions};
use kube::{Api, Client};
#[cfg(test)]
use mockall::automock;
use tokio::time::{Instant, sleep};
use tracing::{debug, info};

use crate::error::{BootstrapError, Result};

/// Observed state of a single CRD
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrdStatus {
    Established,
    /// Registered but not yet served
    Pending,
    /// Not registered yet; expected right after manifests are applied
    NotFound,
}

/// Reads CRD status from the cluster
#[cfg_attr(test, automock)]
#[async_trait]
pub trait CrdProbe: Send + Sync {
    async fn crd_status(&self, name: &str) -> Result<CrdStatus>;
}

/// True when the CRD carries `Established=True`
pub fn is_established(crd: &CustomResourceDefinition) -> bool {
    conditions::is_crd_established().matches_object(Some(crd))
}

/// Probe backed by the apiextensions API
pub struct ApiCrdProbe {
    api: Api<CustomResourceDefinition>,
}

impl ApiCrdProbe {
    pub fn new(client: Client) -> Self {
        Self {
            api: Api::all(client),
        }
    }
}

#[async_trait]
impl CrdProbe for ApiCrdProbe {
    async fn crd_status(&self, name: &str) -> Result<CrdStatus> {
        match self.api.get_opt(name).await {
            Ok(Some(crd)) if is_established(&crd) => Ok(CrdStatus::Established),
            Ok(Some(_)) => Ok(CrdStatus::Pending),
            Ok(None) => Ok(CrdStatus::NotFound),
            Err(e) => Err(BootstrapError::delegate(
                format!("failed to get CRD {}", name),
                e,
            )),
        }
    }
}

/// Wait until every CRD in `names` is established
///
/// Polls all names each round and succeeds only when a single round sees them
/// all established. Returns without sleeping when the first round succeeds.
/// On timeout the error lists the names still not ready in the last round.
pub async fn wait_for_crds<P: CrdProbe + ?Sized>(
    probe: &P,
    names: &[String],
    timeout: Duration,
    poll_interval: Duration,
) -> Result<()> {
    let deadline = Instant::now() + timeout;
    let mut round: u32 = 0;

    loop {
        round += 1;
        let mut pending = Vec::new();
        for name in names {
            let status = probe.crd_status(name).await?;
            if status != CrdStatus::Established {
                debug!(crd = %name, ?status, round, "CRD not ready");
                pending.push(name.clone());
            }
        }

        if pending.is_empty() {
            info!(count = names.len(), rounds = round, "CRDs established");
            return Ok(());
        }

        let now = Instant::now();
        if now >= deadline {
            return Err(BootstrapError::Timeout { pending, timeout });
        }
        sleep(poll_interval.min(deadline - now)).await;
    }
}
