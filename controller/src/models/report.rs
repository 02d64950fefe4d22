//! Per-endpoint outcomes and fleet-wide reports
//!
//! Field names on the wire (`pi`, `host`, `ok`, `skipped`, `error`) are the
//! ones the operator UI reads.

use serde::{Deserialize, Serialize};

use crate::models::endpoint::Endpoint;

/// Outcome of pushing a payload to one endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeployResult {
    #[serde(rename = "pi")]
    pub endpoint: String,
    pub host: String,
    pub ok: bool,
    pub skipped: bool,
    pub error: Option<String>,
}

impl DeployResult {
    pub fn succeeded(endpoint: &Endpoint) -> Self {
        Self {
            endpoint: endpoint.name.clone(),
            host: endpoint.host.clone(),
            ok: true,
            skipped: false,
            error: None,
        }
    }

    pub fn failed(endpoint: &Endpoint, error: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.name.clone(),
            host: endpoint.host.clone(),
            ok: false,
            skipped: false,
            error: Some(error.into()),
        }
    }

    /// No payload was supplied for this endpoint
    pub fn skipped(endpoint: &Endpoint) -> Self {
        Self {
            endpoint: endpoint.name.clone(),
            host: endpoint.host.clone(),
            ok: true,
            skipped: true,
            error: None,
        }
    }
}

/// Outcome of probing one endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeResult {
    #[serde(rename = "pi")]
    pub endpoint: String,
    pub host: String,
    pub ok: bool,
    pub error: Option<String>,
}

/// Anything that can appear in a fleet report summary
pub trait Outcome {
    fn ok(&self) -> bool;

    /// Skipped entries do not count towards the overall result
    fn counts(&self) -> bool {
        true
    }
}

impl Outcome for DeployResult {
    fn ok(&self) -> bool {
        self.ok
    }

    fn counts(&self) -> bool {
        !self.skipped
    }
}

impl Outcome for ProbeResult {
    fn ok(&self) -> bool {
        self.ok
    }
}

/// One entry per configured endpoint, in fleet order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FleetReport<T> {
    pub ok: bool,
    pub summary: Vec<T>,
}

impl<T: Outcome> FleetReport<T> {
    pub fn from_summary(summary: Vec<T>) -> Self {
        let ok = summary.iter().filter(|r| r.counts()).all(|r| r.ok());
        Self { ok, summary }
    }
}

/// Response body of a single-endpoint push
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SinglePushResponse {
    pub ok: bool,
    pub pi: String,
    pub host: String,
    pub error: Option<String>,
}

impl From<DeployResult> for SinglePushResponse {
    fn from(result: DeployResult) -> Self {
        Self {
            ok: result.ok,
            pi: result.endpoint,
            host: result.host,
            error: result.error,
        }
    }
}
