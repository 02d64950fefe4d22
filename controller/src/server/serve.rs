//! HTTP server setup

use std::future::Future;
use std::path::Path;
use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::app::options::ServerOptions;
use crate::errors::ControllerError;
use crate::server::handlers::{
    connectivity_handler, deploy_all_handler, health_handler, legacy_deploy_handler,
    list_endpoints_handler, push_one_handler, version_handler,
};
use crate::server::state::ServerState;

/// Headroom for multipart framing on top of the file payloads
const FORM_OVERHEAD: u64 = 1024 * 1024;

/// Build the router
pub fn router(state: Arc<ServerState>, static_dir: Option<&Path>) -> Router {
    let files = state.dispatcher.fleet().len().max(1) as u64;
    let body_limit = state
        .intake
        .max_file_size()
        .saturating_mul(files)
        .saturating_add(FORM_OVERHEAD);
    let body_limit = usize::try_from(body_limit).unwrap_or(usize::MAX);

    let api = Router::new()
        // Health and version
        .route("/health", get(health_handler))
        .route("/version", get(version_handler))
        // Fleet
        .route("/api/pis", get(list_endpoints_handler))
        .route("/api/pis/{id}/upload-and-deploy", post(push_one_handler))
        .route("/api/deploy-all", post(deploy_all_handler))
        .route("/api/upload-and-deploy", post(legacy_deploy_handler))
        .route("/api/test-connectivity", get(connectivity_handler))
        // State and middleware
        .with_state(state)
        .layer(DefaultBodyLimit::max(body_limit));

    let app = match static_dir {
        Some(dir) if dir.is_dir() => api.fallback_service(ServeDir::new(dir)),
        Some(dir) => {
            warn!("Static directory {} not found, operator UI disabled", dir.display());
            api
        }
        None => api,
    };

    app.layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Start the HTTP server
pub async fn serve(
    options: &ServerOptions,
    state: Arc<ServerState>,
    shutdown_signal: impl Future<Output = ()> + Send + 'static,
) -> Result<JoinHandle<Result<(), ControllerError>>, ControllerError> {
    let app = router(state, options.static_dir.as_deref());

    let addr = format!("{}:{}", options.host, options.port);
    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|e| ControllerError::ServerError(format!("Unable to bind {}: {}", addr, e)))?;
    info!("Signage Controller listening on http://{}", addr);

    let handle = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal)
            .await
            .map_err(|e| ControllerError::ServerError(e.to_string()))
    });

    Ok(handle)
}
