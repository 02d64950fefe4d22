//! Fleet dispatcher
//!
//! Fans a push or probe out over the configured fleet on the calling task.
//! Every operation settles on its own: a failing endpoint neither cancels
//! nor delays its siblings, and the report always holds one entry per
//! configured endpoint in fleet order.

use std::collections::HashMap;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use futures::future::join_all;
use tracing::{info, warn};

use crate::deploy::probe::probe_endpoint;
use crate::deploy::push::push_to_endpoint;
use crate::deploy::remote::RemoteOptions;
use crate::errors::ControllerError;
use crate::exec::CommandRunner;
use crate::models::endpoint::{Endpoint, Fleet};
use crate::models::report::{DeployResult, FleetReport, ProbeResult};

/// One endpoint paired with the staged payload it should receive
#[derive(Debug, Clone, Copy)]
pub struct DeployJob<'a> {
    pub endpoint: &'a Endpoint,
    pub local_file: &'a Path,
}

/// Runs pushes and probes across the fleet
pub struct Dispatcher {
    fleet: Arc<Fleet>,
    remote: Arc<RemoteOptions>,
    runner: Arc<dyn CommandRunner>,
}

impl Dispatcher {
    pub fn new(fleet: Arc<Fleet>, remote: Arc<RemoteOptions>, runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            fleet,
            remote,
            runner,
        }
    }

    pub fn fleet(&self) -> &Fleet {
        &self.fleet
    }

    pub fn endpoints(&self) -> &[Endpoint] {
        self.fleet.endpoints()
    }

    /// Push one payload to one endpoint
    pub async fn push_one(&self, endpoint_id: &str, local_file: &Path) -> Result<DeployResult, ControllerError> {
        let endpoint = self
            .fleet
            .get(endpoint_id)
            .ok_or_else(|| ControllerError::UnknownEndpoint(endpoint_id.to_string()))?;

        info!("Pushing payload to {} ({})", endpoint.id, endpoint.host);
        Ok(self.execute(DeployJob { endpoint, local_file }).await)
    }

    /// Push per-endpoint payloads. Endpoints without an entry are skipped.
    ///
    /// Fails before anything is spawned if `files` is empty or names an
    /// endpoint that is not configured.
    pub async fn push_fleet(
        &self,
        files: &HashMap<String, PathBuf>,
    ) -> Result<FleetReport<DeployResult>, ControllerError> {
        if files.is_empty() {
            return Err(ControllerError::NoPayload);
        }
        let mut unknown: Vec<&String> = files.keys().filter(|id| !self.fleet.contains(id)).collect();
        unknown.sort();
        if let Some(id) = unknown.first() {
            return Err(ControllerError::UnknownEndpoint(id.to_string()));
        }

        info!(
            "Dispatching push to {} of {} endpoints",
            files.len(),
            self.fleet.len()
        );
        let summary = self
            .fan_out(|endpoint| {
                let local_file = files.get(&endpoint.id);
                async move {
                    match local_file {
                        Some(path) => {
                            self.execute(DeployJob {
                                endpoint,
                                local_file: path,
                            })
                            .await
                        }
                        None => DeployResult::skipped(endpoint),
                    }
                }
            })
            .await;

        Ok(self.finish("push", summary))
    }

    /// Push the same payload to every endpoint
    pub async fn push_all(&self, local_file: &Path) -> FleetReport<DeployResult> {
        info!("Dispatching shared payload to all {} endpoints", self.fleet.len());
        let summary = self
            .fan_out(|endpoint| self.execute(DeployJob { endpoint, local_file }))
            .await;

        self.finish("push", summary)
    }

    /// Check that every endpoint accepts an ssh login
    pub async fn probe_fleet(&self) -> FleetReport<ProbeResult> {
        info!("Probing {} endpoints", self.fleet.len());
        let summary = self
            .fan_out(|endpoint| probe_endpoint(self.runner.as_ref(), &self.remote, endpoint))
            .await;

        let report = FleetReport::from_summary(summary);
        info!(
            "Probe finished: {}/{} reachable",
            report.summary.iter().filter(|r| r.ok).count(),
            report.summary.len()
        );
        report
    }

    async fn execute(&self, job: DeployJob<'_>) -> DeployResult {
        match push_to_endpoint(self.runner.as_ref(), &self.remote, job.endpoint, job.local_file).await {
            Ok(()) => DeployResult::succeeded(job.endpoint),
            Err(e) => {
                warn!("Push to {} ({}) failed: {}", job.endpoint.id, job.endpoint.host, e);
                DeployResult::failed(job.endpoint, e.to_string())
            }
        }
    }

    /// Run `op` for every endpoint concurrently; results keep fleet order
    async fn fan_out<'a, F, Fut, T>(&'a self, op: F) -> Vec<T>
    where
        F: FnMut(&'a Endpoint) -> Fut,
        Fut: Future<Output = T>,
    {
        join_all(self.fleet.endpoints().iter().map(op)).await
    }

    fn finish(&self, kind: &str, summary: Vec<DeployResult>) -> FleetReport<DeployResult> {
        let report = FleetReport::from_summary(summary);
        let attempted = report.summary.iter().filter(|r| !r.skipped).count();
        let succeeded = report.summary.iter().filter(|r| !r.skipped && r.ok).count();
        info!(
            "Fleet {} finished: {}/{} succeeded, {} skipped",
            kind,
            succeeded,
            attempted,
            report.summary.len() - attempted
        );
        report
    }
}
