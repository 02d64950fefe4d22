//! Remote endpoint contract and ssh/scp argument building

use std::path::Path;
use std::time::Duration;

/// How endpoints are reached and where payloads land on them
#[derive(Debug, Clone)]
pub struct RemoteOptions {
    /// Login used for both ssh and scp
    pub user: String,

    /// Directory holding the staging and active payloads
    pub remote_dir: String,

    /// File name payloads are copied to before activation
    pub incoming_name: String,

    /// File name the rendering service plays
    pub current_name: String,

    /// systemd unit restarted after activation
    pub service: String,

    /// ssh `ConnectTimeout`
    pub connect_timeout: Duration,

    /// Timeout for the copy and activate phases
    pub transfer_timeout: Duration,

    /// Timeout for the connectivity probe
    pub probe_timeout: Duration,

    pub scp_program: String,
    pub ssh_program: String,
}

impl Default for RemoteOptions {
    fn default() -> Self {
        Self {
            user: "pi".to_string(),
            remote_dir: "/home/pi/videos".to_string(),
            incoming_name: ".incoming.mp4".to_string(),
            current_name: "current.mp4".to_string(),
            service: "signage-vlc".to_string(),
            connect_timeout: Duration::from_secs(10),
            transfer_timeout: Duration::from_secs(180),
            probe_timeout: Duration::from_secs(15),
            scp_program: "scp".to_string(),
            ssh_program: "ssh".to_string(),
        }
    }
}

impl RemoteOptions {
    pub fn incoming_path(&self) -> String {
        format!("{}/{}", self.remote_dir.trim_end_matches('/'), self.incoming_name)
    }

    pub fn current_path(&self) -> String {
        format!("{}/{}", self.remote_dir.trim_end_matches('/'), self.current_name)
    }

    /// Options shared by every ssh and scp invocation. Host keys are not
    /// checked or recorded, so an unknown endpoint never blocks on a prompt.
    pub fn ssh_options(&self) -> Vec<String> {
        vec![
            "-o".to_string(),
            "StrictHostKeyChecking=no".to_string(),
            "-o".to_string(),
            "UserKnownHostsFile=/dev/null".to_string(),
            "-o".to_string(),
            format!("ConnectTimeout={}", self.connect_timeout.as_secs()),
        ]
    }

    pub fn login(&self, host: &str) -> String {
        format!("{}@{}", self.user, host)
    }

    pub fn copy_args(&self, host: &str, local_file: &Path) -> Vec<String> {
        let mut args = self.ssh_options();
        args.push(local_file.to_string_lossy().into_owned());
        args.push(format!("{}:{}", self.login(host), self.incoming_path()));
        args
    }

    /// Renames the staged payload over the active one, then restarts the player
    pub fn activation_command(&self) -> String {
        format!(
            "mv -f \"{}\" \"{}\" && sudo systemctl restart {}",
            self.incoming_path(),
            self.current_path(),
            self.service
        )
    }

    pub fn remote_command_args(&self, host: &str, command: &str) -> Vec<String> {
        let mut args = self.ssh_options();
        args.push(self.login(host));
        args.push(command.to_string());
        args
    }
}
