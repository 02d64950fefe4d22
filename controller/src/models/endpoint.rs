//! Display endpoints and the configured fleet

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::errors::ControllerError;

/// One networked display target
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoint {
    /// Short unique token, also used in multipart field names (`video_<id>`)
    pub id: String,

    /// Display label
    pub name: String,

    /// Network address reachable over ssh
    pub host: String,
}

impl Endpoint {
    pub fn new(id: impl Into<String>, name: impl Into<String>, host: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            host: host.into(),
        }
    }
}

/// The ordered, immutable set of endpoints known at startup
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Fleet {
    endpoints: Vec<Endpoint>,
}

impl Fleet {
    /// Build a fleet, rejecting empty or duplicate ids
    pub fn new(endpoints: Vec<Endpoint>) -> Result<Self, ControllerError> {
        let mut seen = HashSet::new();
        for endpoint in &endpoints {
            if endpoint.id.trim().is_empty() {
                return Err(ControllerError::ConfigError(format!(
                    "Endpoint '{}' has an empty id",
                    endpoint.name
                )));
            }
            if endpoint.host.trim().is_empty() {
                return Err(ControllerError::ConfigError(format!(
                    "Endpoint '{}' has an empty host",
                    endpoint.id
                )));
            }
            if !seen.insert(endpoint.id.as_str()) {
                return Err(ControllerError::ConfigError(format!(
                    "Duplicate endpoint id: {}",
                    endpoint.id
                )));
            }
        }
        Ok(Self { endpoints })
    }

    pub fn endpoints(&self) -> &[Endpoint] {
        &self.endpoints
    }

    pub fn get(&self, id: &str) -> Option<&Endpoint> {
        self.endpoints.iter().find(|e| e.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }
}
