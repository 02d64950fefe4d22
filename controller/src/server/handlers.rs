//! HTTP request handlers
//!
//! Every handler that accepts uploads holds the staged files until the
//! dispatch has settled. Early returns drop the guards, which removes the
//! files.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    extract::{Multipart, Path, State},
    response::IntoResponse,
    Json,
};
use serde::Serialize;

use crate::errors::ControllerError;
use crate::intake::multipart::{stage_fields, stage_single};
use crate::intake::StagedUpload;
use crate::models::endpoint::Endpoint;
use crate::models::report::{DeployResult, FleetReport, ProbeResult, SinglePushResponse};
use crate::server::state::ServerState;
use crate::utils::version_info;

/// Multipart field carrying the payload for single and legacy pushes
pub const VIDEO_FIELD: &str = "video";

/// Prefix of the per-endpoint multipart fields (`video_<id>`)
pub const VIDEO_FIELD_PREFIX: &str = "video_";

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
}

/// Health check handler
pub async fn health_handler() -> impl IntoResponse {
    let version = version_info();
    Json(HealthResponse {
        status: "healthy".to_string(),
        service: "signage-controller".to_string(),
        version: version.version,
    })
}

/// Version response
#[derive(Debug, Serialize)]
pub struct VersionResponse {
    pub version: String,
    pub git_hash: String,
    pub build_time: String,
}

/// Version handler
pub async fn version_handler() -> impl IntoResponse {
    let version = version_info();
    Json(VersionResponse {
        version: version.version,
        git_hash: version.git_hash,
        build_time: version.build_time,
    })
}

/// Fleet listing
pub async fn list_endpoints_handler(State(state): State<Arc<ServerState>>) -> Json<Vec<Endpoint>> {
    Json(state.dispatcher.endpoints().to_vec())
}

/// Upload one payload and push it to one endpoint
pub async fn push_one_handler(
    State(state): State<Arc<ServerState>>,
    Path(id): Path<String>,
    mut multipart: Multipart,
) -> Result<Json<SinglePushResponse>, ControllerError> {
    if !state.dispatcher.fleet().contains(&id) {
        return Err(ControllerError::UnknownEndpoint(id));
    }

    let upload = stage_single(&state.intake, &mut multipart, VIDEO_FIELD)
        .await?
        .ok_or(ControllerError::NoFile)?;

    let result = state.dispatcher.push_one(&id, upload.path()).await?;
    upload.discard().await;

    Ok(Json(result.into()))
}

/// Upload per-endpoint payloads and push each to its endpoint
pub async fn deploy_all_handler(
    State(state): State<Arc<ServerState>>,
    mut multipart: Multipart,
) -> Result<Json<FleetReport<DeployResult>>, ControllerError> {
    let fleet = state.dispatcher.fleet();
    let uploads = stage_fields(&state.intake, &mut multipart, |name| {
        name.strip_prefix(VIDEO_FIELD_PREFIX)
            .is_some_and(|id| fleet.contains(id))
    })
    .await?;

    let uploads: HashMap<String, StagedUpload> = uploads
        .into_iter()
        .filter_map(|(field, upload)| {
            field
                .strip_prefix(VIDEO_FIELD_PREFIX)
                .map(|id| (id.to_string(), upload))
        })
        .collect();
    let files: HashMap<String, PathBuf> = uploads
        .iter()
        .map(|(id, upload)| (id.clone(), upload.path().to_path_buf()))
        .collect();

    let report = state.dispatcher.push_fleet(&files).await?;
    for upload in uploads.into_values() {
        upload.discard().await;
    }

    Ok(Json(report))
}

/// Upload one payload and push it to every endpoint
pub async fn legacy_deploy_handler(
    State(state): State<Arc<ServerState>>,
    mut multipart: Multipart,
) -> Result<Json<FleetReport<DeployResult>>, ControllerError> {
    let upload = stage_single(&state.intake, &mut multipart, VIDEO_FIELD)
        .await?
        .ok_or(ControllerError::NoFile)?;

    let report = state.dispatcher.push_all(upload.path()).await;
    upload.discard().await;

    Ok(Json(report))
}

/// Probe every endpoint
pub async fn connectivity_handler(State(state): State<Arc<ServerState>>) -> Json<FleetReport<ProbeResult>> {
    Json(state.dispatcher.probe_fleet().await)
}
