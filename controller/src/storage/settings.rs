//! Settings file management
//!
//! Every field has a default matching the stock four-display installation,
//! so an absent or partial settings file is valid.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::app::options::{AppOptions, ServerOptions};
use crate::deploy::remote::RemoteOptions;
use crate::errors::ControllerError;
use crate::filesys::file::File;
use crate::intake::upload::UploadOptions;
use crate::logs::LogLevel;
use crate::models::endpoint::{Endpoint, Fleet};

/// Controller settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,

    /// Emit logs as JSON
    #[serde(default)]
    pub log_json: bool,

    /// Directory for rotated log files
    #[serde(default)]
    pub log_dir: Option<PathBuf>,

    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerSettings,

    /// Display endpoints, in report order
    #[serde(default = "default_fleet")]
    pub fleet: Vec<Endpoint>,

    /// Remote endpoint contract
    #[serde(default)]
    pub remote: RemoteSettings,

    /// Upload intake configuration
    #[serde(default)]
    pub upload: UploadSettings,
}

fn default_fleet() -> Vec<Endpoint> {
    vec![
        Endpoint::new("pi1", "Display 1", "192.168.100.10"),
        Endpoint::new("pi2", "Display 2", "192.168.100.11"),
        Endpoint::new("pi3", "Display 3", "192.168.100.12"),
        Endpoint::new("pi4", "Display 4", "192.168.100.13"),
    ]
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            log_level: LogLevel::Info,
            log_json: false,
            log_dir: None,
            server: ServerSettings::default(),
            fleet: default_fleet(),
            remote: RemoteSettings::default(),
            upload: UploadSettings::default(),
        }
    }
}

/// HTTP server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Directory holding the operator web UI
    #[serde(default = "default_static_dir")]
    pub static_dir: PathBuf,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_static_dir() -> PathBuf {
    PathBuf::from("public")
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            static_dir: default_static_dir(),
        }
    }
}

/// Remote endpoint settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteSettings {
    #[serde(default = "default_user")]
    pub user: String,

    #[serde(default = "default_remote_dir")]
    pub remote_dir: String,

    #[serde(default = "default_incoming_name")]
    pub incoming_name: String,

    #[serde(default = "default_current_name")]
    pub current_name: String,

    #[serde(default = "default_service")]
    pub service: String,

    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    #[serde(default = "default_transfer_timeout")]
    pub transfer_timeout_secs: u64,

    #[serde(default = "default_probe_timeout")]
    pub probe_timeout_secs: u64,

    #[serde(default = "default_scp_program")]
    pub scp_program: String,

    #[serde(default = "default_ssh_program")]
    pub ssh_program: String,
}

fn default_user() -> String {
    "pi".to_string()
}

fn default_remote_dir() -> String {
    "/home/pi/videos".to_string()
}

fn default_incoming_name() -> String {
    ".incoming.mp4".to_string()
}

fn default_current_name() -> String {
    "current.mp4".to_string()
}

fn default_service() -> String {
    "signage-vlc".to_string()
}

fn default_connect_timeout() -> u64 {
    10
}

fn default_transfer_timeout() -> u64 {
    180
}

fn default_probe_timeout() -> u64 {
    15
}

fn default_scp_program() -> String {
    "scp".to_string()
}

fn default_ssh_program() -> String {
    "ssh".to_string()
}

impl Default for RemoteSettings {
    fn default() -> Self {
        Self {
            user: default_user(),
            remote_dir: default_remote_dir(),
            incoming_name: default_incoming_name(),
            current_name: default_current_name(),
            service: default_service(),
            connect_timeout_secs: default_connect_timeout(),
            transfer_timeout_secs: default_transfer_timeout(),
            probe_timeout_secs: default_probe_timeout(),
            scp_program: default_scp_program(),
            ssh_program: default_ssh_program(),
        }
    }
}

/// Upload settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadSettings {
    #[serde(default = "default_upload_dir")]
    pub upload_dir: PathBuf,

    /// Per-file cap in bytes
    #[serde(default = "default_max_file_size")]
    pub max_file_size: u64,

    #[serde(default = "default_accepted_extension")]
    pub accepted_extension: String,
}

fn default_upload_dir() -> PathBuf {
    PathBuf::from("uploads")
}

fn default_max_file_size() -> u64 {
    500 * 1024 * 1024
}

fn default_accepted_extension() -> String {
    ".mp4".to_string()
}

impl Default for UploadSettings {
    fn default() -> Self {
        Self {
            upload_dir: default_upload_dir(),
            max_file_size: default_max_file_size(),
            accepted_extension: default_accepted_extension(),
        }
    }
}

impl Settings {
    /// Read settings from `file`, falling back to defaults when it is missing
    pub async fn load(file: &File) -> Result<Self, ControllerError> {
        if !file.exists().await {
            warn!(
                "Settings file {} not found, using defaults",
                file.path().display()
            );
            return Ok(Self::default());
        }
        file.read_json::<Settings>().await
    }

    /// Apply environment overrides (`PORT`)
    pub fn apply_env(&mut self, port: Option<&str>) -> Result<(), ControllerError> {
        if let Some(port) = port {
            self.server.port = port
                .trim()
                .parse()
                .map_err(|_| ControllerError::ConfigError(format!("Invalid PORT: {}", port)))?;
        }
        Ok(())
    }

    /// Validate and convert into runtime options
    pub fn to_app_options(&self) -> Result<AppOptions, ControllerError> {
        let remote = &self.remote;
        for (name, secs) in [
            ("connect_timeout_secs", remote.connect_timeout_secs),
            ("transfer_timeout_secs", remote.transfer_timeout_secs),
            ("probe_timeout_secs", remote.probe_timeout_secs),
        ] {
            if secs == 0 {
                return Err(ControllerError::ConfigError(format!("{} must be positive", name)));
            }
        }
        if !self.upload.accepted_extension.starts_with('.') || self.upload.accepted_extension.len() < 2 {
            return Err(ControllerError::ConfigError(format!(
                "accepted_extension must look like \".mp4\", got \"{}\"",
                self.upload.accepted_extension
            )));
        }
        if self.upload.max_file_size == 0 {
            return Err(ControllerError::ConfigError(
                "max_file_size must be positive".to_string(),
            ));
        }

        Ok(AppOptions {
            server: ServerOptions {
                host: self.server.host.clone(),
                port: self.server.port,
                static_dir: Some(self.server.static_dir.clone()),
            },
            fleet: Fleet::new(self.fleet.clone())?,
            remote: RemoteOptions {
                user: remote.user.clone(),
                remote_dir: remote.remote_dir.clone(),
                incoming_name: remote.incoming_name.clone(),
                current_name: remote.current_name.clone(),
                service: remote.service.clone(),
                connect_timeout: Duration::from_secs(remote.connect_timeout_secs),
                transfer_timeout: Duration::from_secs(remote.transfer_timeout_secs),
                probe_timeout: Duration::from_secs(remote.probe_timeout_secs),
                scp_program: remote.scp_program.clone(),
                ssh_program: remote.ssh_program.clone(),
            },
            upload: UploadOptions {
                upload_dir: self.upload.upload_dir.clone(),
                max_file_size: self.upload.max_file_size,
                accepted_extension: self.upload.accepted_extension.clone(),
            },
            ..Default::default()
        })
    }
}
