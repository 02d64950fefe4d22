//! Connectivity probe

use tracing::debug;

use crate::deploy::remote::RemoteOptions;
use crate::exec::CommandRunner;
use crate::models::endpoint::Endpoint;
use crate::models::report::ProbeResult;

/// Remote command whose output proves a working login
pub const PROBE_COMMAND: &str = "echo ok";

/// Output expected from [`PROBE_COMMAND`]
pub const PROBE_SENTINEL: &str = "ok";

/// Classify `endpoint` as reachable or not.
///
/// Unexpected output is reported as unreachable without an error message;
/// process failures carry their message.
pub async fn probe_endpoint(
    runner: &dyn CommandRunner,
    remote: &RemoteOptions,
    endpoint: &Endpoint,
) -> ProbeResult {
    let args = remote.remote_command_args(&endpoint.host, PROBE_COMMAND);
    let (ok, error) = match runner.run(&remote.ssh_program, &args, remote.probe_timeout).await {
        Ok(output) => (output.stdout.trim() == PROBE_SENTINEL, None),
        Err(e) => (false, Some(e.to_string())),
    };
    debug!("Probe {} ({}): ok={}", endpoint.id, endpoint.host, ok);

    ProbeResult {
        endpoint: endpoint.name.clone(),
        host: endpoint.host.clone(),
        ok,
        error,
    }
}
