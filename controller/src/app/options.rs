//! Application configuration options

use std::path::PathBuf;
use std::time::Duration;

use crate::deploy::remote::RemoteOptions;
use crate::intake::upload::UploadOptions;
use crate::models::endpoint::Fleet;

/// Main application options
#[derive(Debug, Clone)]
pub struct AppOptions {
    /// Server configuration
    pub server: ServerOptions,

    /// Configured display endpoints
    pub fleet: Fleet,

    /// How endpoints are reached
    pub remote: RemoteOptions,

    /// Upload intake configuration
    pub upload: UploadOptions,

    /// Maximum delay for graceful shutdown
    pub max_shutdown_delay: Duration,
}

impl Default for AppOptions {
    fn default() -> Self {
        Self {
            server: ServerOptions::default(),
            fleet: Fleet::default(),
            remote: RemoteOptions::default(),
            upload: UploadOptions::default(),
            max_shutdown_delay: Duration::from_secs(30),
        }
    }
}

/// Local HTTP server options
#[derive(Debug, Clone)]
pub struct ServerOptions {
    /// Host to bind to
    pub host: String,

    /// Port to listen on
    pub port: u16,

    /// Operator UI directory served for non-API paths
    pub static_dir: Option<PathBuf>,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            static_dir: None,
        }
    }
}
