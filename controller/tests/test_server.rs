//! HTTP boundary tests

use std::path::Path;
use std::sync::Arc;

use axum::body::{to_bytes, Body, Bytes};
use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::http::{header, Request, StatusCode};
use axum::routing::post as post_route;
use axum::Router;
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

use signage_controller::app::options::AppOptions;
use signage_controller::app::run::init_state;
use signage_controller::errors::ControllerError;
use signage_controller::exec::mock::ScriptedRunner;
use signage_controller::exec::{ExecOutput, ProcessError};
use signage_controller::intake::multipart::stage_single;
use signage_controller::intake::{UploadIntake, UploadOptions};
use signage_controller::models::endpoint::{Endpoint, Fleet};
use signage_controller::server::serve::router;

const BOUNDARY: &str = "signage-test-boundary";

struct Harness {
    app: Router,
    runner: Arc<ScriptedRunner>,
    uploads: TempDir,
}

async fn harness(runner: ScriptedRunner) -> Harness {
    let uploads = tempfile::tempdir().unwrap();
    let options = AppOptions {
        fleet: Fleet::new(vec![
            Endpoint::new("pi1", "Display 1", "10.0.0.1"),
            Endpoint::new("pi2", "Display 2", "10.0.0.2"),
            Endpoint::new("pi3", "Display 3", "10.0.0.3"),
            Endpoint::new("pi4", "Display 4", "10.0.0.4"),
        ])
        .unwrap(),
        upload: UploadOptions {
            upload_dir: uploads.path().to_path_buf(),
            max_file_size: 1024,
            accepted_extension: ".mp4".to_string(),
        },
        ..Default::default()
    };

    let runner = Arc::new(runner);
    let state = init_state(&options, runner.clone()).await.unwrap();
    Harness {
        app: router(state, None),
        runner,
        uploads,
    }
}

/// (field name, file name, contents); an empty file name makes a text field
fn multipart(parts: &[(&str, &str, &str)]) -> Body {
    let mut body = String::new();
    for (field, file_name, contents) in parts {
        body.push_str(&format!("--{BOUNDARY}\r\n"));
        if file_name.is_empty() {
            body.push_str(&format!("Content-Disposition: form-data; name=\"{field}\"\r\n\r\n"));
        } else {
            body.push_str(&format!(
                "Content-Disposition: form-data; name=\"{field}\"; filename=\"{file_name}\"\r\n"
            ));
            body.push_str("Content-Type: video/mp4\r\n\r\n");
        }
        body.push_str(contents);
        body.push_str("\r\n");
    }
    body.push_str(&format!("--{BOUNDARY}--\r\n"));
    Body::from(body)
}

fn post(uri: &str, body: Body) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(body)
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

fn upload_dir_is_empty(dir: &Path) -> bool {
    std::fs::read_dir(dir).unwrap().next().is_none()
}

#[tokio::test]
async fn test_fleet_listing() {
    let h = harness(ScriptedRunner::succeeding()).await;

    let (status, body) = send(&h.app, get("/api/pis")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().map(Vec::len), Some(4));
    assert_eq!(
        body[0],
        json!({ "id": "pi1", "name": "Display 1", "host": "10.0.0.1" })
    );
    assert!(h.runner.invocations().is_empty());
}

#[tokio::test]
async fn test_health() {
    let h = harness(ScriptedRunner::succeeding()).await;

    let (status, body) = send(&h.app, get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_deploy_all_without_files_is_a_client_error() {
    let h = harness(ScriptedRunner::succeeding()).await;

    let (status, body) = send(
        &h.app,
        post("/api/deploy-all", multipart(&[("note", "", "nothing attached")])),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "ok": false, "error": "No video files provided" }));
    assert!(h.runner.invocations().is_empty());
}

#[tokio::test]
async fn test_deploy_all_with_some_files() {
    let h = harness(ScriptedRunner::succeeding()).await;

    let (status, body) = send(
        &h.app,
        post(
            "/api/deploy-all",
            multipart(&[
                ("video_pi1", "lobby.mp4", "first"),
                ("video_pi3", "menu.MP4", "third"),
            ]),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], true);
    let skipped: Vec<bool> = body["summary"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["skipped"].as_bool().unwrap())
        .collect();
    assert_eq!(skipped, [false, true, false, true]);
    assert_eq!(body["summary"][1], json!({ "pi": "Display 2", "host": "10.0.0.2", "ok": true, "skipped": true, "error": null }));

    assert_eq!(h.runner.count("scp"), 2);
    assert!(upload_dir_is_empty(h.uploads.path()));
}

#[tokio::test]
async fn test_deploy_all_rejects_unexpected_fields() {
    let h = harness(ScriptedRunner::succeeding()).await;

    let (status, body) = send(
        &h.app,
        post(
            "/api/deploy-all",
            multipart(&[
                ("video_pi1", "lobby.mp4", "first"),
                ("video_pi9", "ghost.mp4", "nobody"),
            ]),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Unexpected field: video_pi9");
    assert!(h.runner.invocations().is_empty());
    assert!(upload_dir_is_empty(h.uploads.path()));
}

#[tokio::test]
async fn test_single_push_success_cleans_up_upload() {
    let h = harness(ScriptedRunner::succeeding()).await;

    let (status, body) = send(
        &h.app,
        post(
            "/api/pis/pi2/upload-and-deploy",
            multipart(&[("video", "lobby.mp4", "payload")]),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({ "ok": true, "pi": "Display 2", "host": "10.0.0.2", "error": null })
    );

    let calls = h.runner.invocations();
    let local_file = Path::new(&calls[0].args[calls[0].args.len() - 2]);
    assert!(local_file.starts_with(h.uploads.path()));
    assert!(!local_file.exists());
    assert!(upload_dir_is_empty(h.uploads.path()));
}

#[tokio::test]
async fn test_single_push_failure_is_reported_and_cleaned_up() {
    let h = harness(ScriptedRunner::new(|_| {
        Err(ProcessError::Launch {
            program: "scp".to_string(),
            reason: "No such file or directory (os error 2)".to_string(),
        })
    }))
    .await;

    let (status, body) = send(
        &h.app,
        post(
            "/api/pis/pi1/upload-and-deploy",
            multipart(&[("video", "lobby.mp4", "payload")]),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], false);
    assert_eq!(
        body["error"],
        "Failed to start scp: No such file or directory (os error 2)"
    );
    assert!(upload_dir_is_empty(h.uploads.path()));
}

#[tokio::test]
async fn test_single_push_unknown_endpoint() {
    let h = harness(ScriptedRunner::succeeding()).await;

    let (status, body) = send(
        &h.app,
        post(
            "/api/pis/pi9/upload-and-deploy",
            multipart(&[("video", "lobby.mp4", "payload")]),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["ok"], false);
    assert!(h.runner.invocations().is_empty());
}

#[tokio::test]
async fn test_single_push_validation() {
    let h = harness(ScriptedRunner::succeeding()).await;

    let (status, body) = send(
        &h.app,
        post(
            "/api/pis/pi1/upload-and-deploy",
            multipart(&[("video", "lobby.mov", "payload")]),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Only .mp4 files are accepted");

    let (status, body) = send(
        &h.app,
        post("/api/pis/pi1/upload-and-deploy", multipart(&[("note", "", "hi")])),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "No video file provided");

    let too_big = "x".repeat(2048);
    let (status, _) = send(
        &h.app,
        post(
            "/api/pis/pi1/upload-and-deploy",
            multipart(&[("video", "lobby.mp4", too_big.as_str())]),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);

    assert!(h.runner.invocations().is_empty());
    assert!(upload_dir_is_empty(h.uploads.path()));
}

#[tokio::test]
async fn test_legacy_push_targets_every_endpoint() {
    let h = harness(ScriptedRunner::succeeding()).await;

    let (status, body) = send(
        &h.app,
        post(
            "/api/upload-and-deploy",
            multipart(&[("video", "all.mp4", "shared")]),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], true);
    let summary = body["summary"].as_array().unwrap();
    assert_eq!(summary.len(), 4);
    assert!(summary.iter().all(|r| r["skipped"] == false));
    assert_eq!(h.runner.count("scp"), 4);
    assert_eq!(h.runner.count("ssh"), 4);
    assert!(upload_dir_is_empty(h.uploads.path()));
}

#[tokio::test]
async fn test_connectivity_report() {
    let h = harness(ScriptedRunner::new(|inv| {
        if inv.host() == Some("10.0.0.4") {
            Err(ProcessError::Exit {
                program: "ssh".to_string(),
                code: Some(255),
                stderr: "Connection timed out".to_string(),
            })
        } else {
            Ok(ExecOutput {
                stdout: "ok\n".to_string(),
                stderr: String::new(),
            })
        }
    }))
    .await;

    let (status, body) = send(&h.app, get("/api/test-connectivity")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], false);
    assert_eq!(
        body["summary"][3],
        json!({ "pi": "Display 4", "host": "10.0.0.4", "ok": false, "error": "ssh exited 255: Connection timed out" })
    );
    assert_eq!(body["summary"][0]["ok"], true);
}

#[tokio::test]
async fn test_legacy_push_without_file() {
    let h = harness(ScriptedRunner::succeeding()).await;

    let (status, body) = send(
        &h.app,
        post("/api/upload-and-deploy", multipart(&[("video", "", "")])),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "ok": false, "error": "No video file provided" }));
    assert!(h.runner.invocations().is_empty());
}

async fn stage_video(
    State(intake): State<Arc<UploadIntake>>,
    mut multipart: Multipart,
) -> Result<StatusCode, ControllerError> {
    match stage_single(&intake, &mut multipart, "video").await? {
        Some(_) => Ok(StatusCode::OK),
        None => Err(ControllerError::NoFile),
    }
}

#[tokio::test]
async fn test_body_limit_hit_inside_a_field_is_payload_too_large() {
    let uploads = tempfile::tempdir().unwrap();
    let intake = Arc::new(UploadIntake::new(&UploadOptions {
        upload_dir: uploads.path().to_path_buf(),
        max_file_size: 1024 * 1024,
        accepted_extension: ".mp4".to_string(),
    }));
    let app = Router::new()
        .route("/", post_route(stage_video))
        .with_state(intake)
        .layer(DefaultBodyLimit::max(512));

    // Headers and the first bytes of the file fit the limit; the rest does not
    let head = format!(
        "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"video\"; filename=\"big.mp4\"\r\n\
         Content-Type: video/mp4\r\n\r\nfirst-bytes"
    );
    let tail = format!("{}\r\n--{BOUNDARY}--\r\n", "x".repeat(4096));
    let frames: Vec<Result<Bytes, std::io::Error>> = vec![Ok(Bytes::from(head)), Ok(Bytes::from(tail))];
    let request = post("/", Body::from_stream(futures::stream::iter(frames)));

    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(body["ok"], false);
    assert!(upload_dir_is_empty(uploads.path()));
}
