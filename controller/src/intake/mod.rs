//! Upload intake

pub mod multipart;
pub mod upload;

pub use upload::{StagedUpload, UploadIntake, UploadOptions};
