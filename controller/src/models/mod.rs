//! Data models

pub mod endpoint;
pub mod report;
