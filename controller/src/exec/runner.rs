//! Command runner abstraction
//!
//! The push sequence, the probe and the dispatcher only ever talk to a
//! `CommandRunner`. `ProcessRunner` spawns real processes; the scripted
//! runner in [`crate::exec::mock`] stands in for ssh/scp in tests.

use std::time::Duration;

use async_trait::async_trait;

use crate::exec::process::{run_process, ExecOutput, ProcessError};

/// Runs one external command to completion or timeout
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(
        &self,
        program: &str,
        args: &[String],
        timeout: Duration,
    ) -> Result<ExecOutput, ProcessError>;
}

/// Production runner backed by [`run_process`]
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessRunner;

#[async_trait]
impl CommandRunner for ProcessRunner {
    async fn run(
        &self,
        program: &str,
        args: &[String],
        timeout: Duration,
    ) -> Result<ExecOutput, ProcessError> {
        run_process(program, args, timeout).await
    }
}
