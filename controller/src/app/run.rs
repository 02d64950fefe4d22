//! Main application run loop

use std::future::Future;
use std::sync::Arc;

use tokio::sync::broadcast;
use tracing::{error, info, warn};

use crate::app::options::AppOptions;
use crate::deploy::Dispatcher;
use crate::errors::ControllerError;
use crate::exec::{CommandRunner, ProcessRunner};
use crate::intake::UploadIntake;
use crate::server::serve::serve;
use crate::server::state::ServerState;

/// Run the signage controller until `shutdown_signal` resolves
pub async fn run(
    options: AppOptions,
    shutdown_signal: impl Future<Output = ()> + Send + 'static,
) -> Result<(), ControllerError> {
    info!("Initializing Signage Controller...");

    let state = init_state(&options, Arc::new(ProcessRunner)).await?;

    let (shutdown_tx, mut shutdown_rx) = broadcast::channel::<()>(1);
    let mut server_handle = serve(&options.server, state, async move {
        let _ = shutdown_rx.recv().await;
    })
    .await?;

    tokio::select! {
        _ = shutdown_signal => {
            info!("Shutdown signal received, shutting down...");
        }
        result = &mut server_handle => {
            error!("HTTP server stopped unexpectedly");
            return match result {
                Ok(result) => result,
                Err(e) => Err(ControllerError::ServerError(e.to_string())),
            };
        }
    }

    // Closing the channel starts the server's graceful shutdown
    drop(shutdown_tx);
    match tokio::time::timeout(options.max_shutdown_delay, server_handle).await {
        Ok(Ok(result)) => result,
        Ok(Err(e)) => Err(ControllerError::ServerError(e.to_string())),
        Err(_) => {
            warn!(
                "In-flight requests did not finish within {:?}, exiting anyway",
                options.max_shutdown_delay
            );
            Ok(())
        }
    }
}

/// Build the shared server state and prepare the upload directory
pub async fn init_state(
    options: &AppOptions,
    runner: Arc<dyn CommandRunner>,
) -> Result<Arc<ServerState>, ControllerError> {
    let intake = UploadIntake::new(&options.upload);
    intake.prepare().await?;

    let dispatcher = Dispatcher::new(
        Arc::new(options.fleet.clone()),
        Arc::new(options.remote.clone()),
        runner,
    );

    info!(
        "Fleet: {}",
        options
            .fleet
            .endpoints()
            .iter()
            .map(|e| format!("{}={}", e.id, e.host))
            .collect::<Vec<_>>()
            .join(", ")
    );

    Ok(Arc::new(ServerState::new(Arc::new(dispatcher), Arc::new(intake))))
}
