//! Payload validation and staging
//!
//! Accepted uploads are streamed to `<upload_dir>/<uuid><ext>` and handed
//! out as a [`StagedUpload`] guard. The guard owns the file: dropping it
//! removes the file, so a staged payload never outlives the request that
//! created it, whatever the outcome.

use std::path::{Path, PathBuf};

use axum::body::Bytes;
use futures::{Stream, StreamExt};
use sha2::{Digest, Sha256};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

use crate::errors::ControllerError;
use crate::filesys::dir::Dir;
use crate::filesys::file::File;
use crate::utils::hex_encode;

/// Upload intake options
#[derive(Debug, Clone)]
pub struct UploadOptions {
    /// Directory staged payloads are written to
    pub upload_dir: PathBuf,

    /// Per-file size cap in bytes
    pub max_file_size: u64,

    /// Required file extension, including the dot
    pub accepted_extension: String,
}

impl Default for UploadOptions {
    fn default() -> Self {
        Self {
            upload_dir: PathBuf::from("uploads"),
            max_file_size: 500 * 1024 * 1024,
            accepted_extension: ".mp4".to_string(),
        }
    }
}

/// Validates and stages incoming payloads
#[derive(Debug, Clone)]
pub struct UploadIntake {
    dir: Dir,
    max_file_size: u64,
    accepted_extension: String,
}

impl UploadIntake {
    pub fn new(options: &UploadOptions) -> Self {
        Self {
            dir: Dir::new(options.upload_dir.clone()),
            max_file_size: options.max_file_size,
            accepted_extension: options.accepted_extension.to_lowercase(),
        }
    }

    pub fn max_file_size(&self) -> u64 {
        self.max_file_size
    }

    /// Create the upload directory and remove payloads left behind by a
    /// previous run. Only `<uuid><ext>` files are touched; anything else in
    /// the directory is left alone. Returns the number of files removed.
    pub async fn prepare(&self) -> Result<usize, ControllerError> {
        self.dir.create().await?;

        let mut removed = 0;
        for path in self.dir.list_files().await? {
            if !self.is_staged_name(&path) {
                continue;
            }
            match File::new(&path).delete().await {
                Ok(()) => removed += 1,
                Err(e) => warn!("Unable to remove stale upload {}: {}", path.display(), e),
            }
        }
        if removed > 0 {
            info!("Removed {} stale uploads from {}", removed, self.dir.path().display());
        }
        Ok(removed)
    }

    fn is_staged_name(&self, path: &Path) -> bool {
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            return false;
        };
        name.strip_suffix(self.accepted_extension.as_str())
            .is_some_and(|stem| uuid::Uuid::parse_str(stem).is_ok())
    }

    /// Reject names whose extension is not the accepted one
    pub fn validate_file_name(&self, file_name: &str) -> Result<(), ControllerError> {
        let extension = Path::new(file_name)
            .extension()
            .map(|ext| format!(".{}", ext.to_string_lossy().to_lowercase()));

        if extension.as_deref() == Some(self.accepted_extension.as_str()) {
            Ok(())
        } else {
            Err(ControllerError::ValidationError(format!(
                "Only {} files are accepted",
                self.accepted_extension
            )))
        }
    }

    /// Validate `file_name`, then stream `body` to a fresh staged file.
    ///
    /// Nothing is left on disk if validation, the size cap or the body
    /// stream fails. Stream errors are returned as they convert.
    pub async fn stage<S, E>(&self, file_name: &str, body: S) -> Result<StagedUpload, ControllerError>
    where
        S: Stream<Item = Result<Bytes, E>>,
        E: Into<ControllerError>,
    {
        self.validate_file_name(file_name)?;

        let staged_name = format!("{}{}", uuid::Uuid::new_v4(), self.accepted_extension);
        let mut staged = StagedUpload {
            file: self.dir.file(&staged_name),
            original_name: file_name.to_string(),
            size: 0,
            digest: String::new(),
            removed: false,
        };

        let mut out = fs::File::create(staged.path()).await?;
        let mut hasher = Sha256::new();
        let mut body = std::pin::pin!(body);

        while let Some(chunk) = body.next().await {
            let chunk = chunk.map_err(Into::<ControllerError>::into)?;
            staged.size += chunk.len() as u64;
            if staged.size > self.max_file_size {
                return Err(ControllerError::PayloadTooLarge(self.max_file_size));
            }
            hasher.update(&chunk);
            out.write_all(&chunk).await?;
        }
        out.flush().await?;

        staged.digest = hex_encode(hasher.finalize());
        debug!(
            "Staged {} as {} ({} bytes, sha256 {})",
            staged.original_name,
            staged.path().display(),
            staged.size,
            staged.digest
        );
        Ok(staged)
    }
}

/// A validated payload on local disk, removed when dropped
#[derive(Debug)]
pub struct StagedUpload {
    file: File,
    original_name: String,
    size: u64,
    digest: String,
    removed: bool,
}

impl StagedUpload {
    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// File name as submitted by the client
    pub fn original_name(&self) -> &str {
        &self.original_name
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    /// Hex SHA-256 of the payload
    pub fn digest(&self) -> &str {
        &self.digest
    }

    /// Remove the staged file now instead of at drop time
    pub async fn discard(mut self) {
        if let Err(e) = self.file.delete().await {
            warn!("Unable to remove staged upload {}: {}", self.path().display(), e);
        }
        self.removed = true;
    }
}

impl Drop for StagedUpload {
    fn drop(&mut self) {
        if self.removed {
            return;
        }
        if let Err(e) = std::fs::remove_file(self.file.path()) {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!("Unable to remove staged upload {}: {}", self.file.path().display(), e);
            }
        }
    }
}
