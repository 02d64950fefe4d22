//! Multipart form handling

use std::collections::HashMap;

use axum::extract::multipart::{Multipart, MultipartError};
use axum::http::StatusCode;
use futures::StreamExt;

use crate::errors::ControllerError;
use crate::intake::upload::{StagedUpload, UploadIntake};

/// Stage every file field of `multipart`, keyed by field name.
///
/// `accept` decides which field names are allowed; any other file field
/// rejects the whole form. Fields without a file name (text inputs, empty
/// file pickers) are ignored. Each field may carry at most one file.
pub async fn stage_fields<F>(
    intake: &UploadIntake,
    multipart: &mut Multipart,
    accept: F,
) -> Result<HashMap<String, StagedUpload>, ControllerError>
where
    F: Fn(&str) -> bool,
{
    let mut staged = HashMap::new();

    while let Some(field) = multipart.next_field().await.map_err(|e| multipart_error(intake, e))? {
        let name = field.name().unwrap_or_default().to_string();
        let file_name = match field.file_name() {
            Some(file_name) if !file_name.is_empty() => file_name.to_string(),
            _ => continue,
        };

        if !accept(&name) {
            return Err(ControllerError::ValidationError(format!("Unexpected field: {}", name)));
        }
        if staged.contains_key(&name) {
            return Err(ControllerError::ValidationError(format!(
                "Only one file is allowed in field {}",
                name
            )));
        }

        let chunks = field.map(|chunk| chunk.map_err(|e| multipart_error(intake, e)));
        let upload = intake.stage(&file_name, chunks).await?;
        staged.insert(name, upload);
    }

    Ok(staged)
}

/// Stage the single file carried by `field_name`, if any
pub async fn stage_single(
    intake: &UploadIntake,
    multipart: &mut Multipart,
    field_name: &str,
) -> Result<Option<StagedUpload>, ControllerError> {
    let mut staged = stage_fields(intake, multipart, |name| name == field_name).await?;
    Ok(staged.remove(field_name))
}

/// Body limit hits map to 413 whether they surface between fields or
/// inside one
fn multipart_error(intake: &UploadIntake, err: MultipartError) -> ControllerError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ControllerError::PayloadTooLarge(intake.max_file_size())
    } else {
        ControllerError::ValidationError(format!("Malformed upload: {}", err.body_text()))
    }
}
