//! Remote push sequence
//!
//! Copy the payload to the staging path, then atomically swap it in and
//! restart the player. The two phases run strictly in order and the second
//! never starts if the first failed.

use std::path::Path;

use tracing::{debug, info};

use crate::deploy::remote::RemoteOptions;
use crate::exec::{CommandRunner, ProcessError};
use crate::models::endpoint::Endpoint;

/// Deliver `local_file` to `endpoint` and make it the active payload
pub async fn push_to_endpoint(
    runner: &dyn CommandRunner,
    remote: &RemoteOptions,
    endpoint: &Endpoint,
    local_file: &Path,
) -> Result<(), ProcessError> {
    debug!("Copying {} to {} ({})", local_file.display(), endpoint.id, endpoint.host);
    runner
        .run(
            &remote.scp_program,
            &remote.copy_args(&endpoint.host, local_file),
            remote.transfer_timeout,
        )
        .await?;

    debug!("Activating payload on {} ({})", endpoint.id, endpoint.host);
    runner
        .run(
            &remote.ssh_program,
            &remote.remote_command_args(&endpoint.host, &remote.activation_command()),
            remote.transfer_timeout,
        )
        .await?;

    info!("Payload active on {} ({})", endpoint.id, endpoint.host);
    Ok(())
}
