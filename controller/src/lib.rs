//! Signage Controller Library
//!
//! Pushes video payloads to a fixed fleet of display endpoints over
//! scp/ssh, activates them, and reports per-endpoint outcomes.

pub mod app;
pub mod deploy;
pub mod errors;
pub mod exec;
pub mod filesys;
pub mod intake;
pub mod logs;
pub mod models;
pub mod server;
pub mod storage;
pub mod utils;
