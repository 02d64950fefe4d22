//! Timed external process execution
//!
//! Every call spawns exactly one child with stdin closed and both output
//! streams captured. The child never outlives the call: it is killed and
//! reaped on timeout and on pipe errors, and `kill_on_drop` covers a
//! caller that abandons the future mid-flight.

use std::process::Stdio;
use std::time::Duration;

use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tracing::{debug, warn};

/// Captured output of a process that exited with code 0
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecOutput {
    pub stdout: String,
    pub stderr: String,
}

/// Why a process invocation did not succeed
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProcessError {
    #[error("Failed to start {program}: {reason}")]
    Launch { program: String, reason: String },

    #[error("{program} timed out after {}s", .timeout.as_secs())]
    Timeout { program: String, timeout: Duration },

    #[error("{program} exited {}: {stderr}", exit_label(.code))]
    Exit {
        program: String,
        code: Option<i32>,
        stderr: String,
    },
}

fn exit_label(code: &Option<i32>) -> String {
    match code {
        Some(code) => code.to_string(),
        None => "by signal".to_string(),
    }
}

/// Run `program` with `args`, failing if it has not exited within `timeout`
pub async fn run_process(
    program: &str,
    args: &[String],
    timeout: Duration,
) -> Result<ExecOutput, ProcessError> {
    debug!(program = %program, args = ?args, timeout_secs = timeout.as_secs(), "Spawning process");

    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| ProcessError::Launch {
            program: program.to_string(),
            reason: e.to_string(),
        })?;

    let stdout = child.stdout.take();
    let stderr = child.stderr.take();

    let settled = tokio::time::timeout(timeout, async {
        tokio::try_join!(child.wait(), drain(stdout), drain(stderr))
    })
    .await;

    match settled {
        Ok(Ok((status, stdout, stderr))) => {
            let stdout = String::from_utf8_lossy(&stdout).into_owned();
            let stderr = String::from_utf8_lossy(&stderr).into_owned();
            if status.success() {
                Ok(ExecOutput { stdout, stderr })
            } else {
                Err(ProcessError::Exit {
                    program: program.to_string(),
                    code: status.code(),
                    stderr: stderr.trim().to_string(),
                })
            }
        }
        Ok(Err(e)) => {
            terminate(program, &mut child).await;
            Err(ProcessError::Launch {
                program: program.to_string(),
                reason: e.to_string(),
            })
        }
        Err(_) => {
            terminate(program, &mut child).await;
            Err(ProcessError::Timeout {
                program: program.to_string(),
                timeout,
            })
        }
    }
}

/// SIGKILL the child and reap it
async fn terminate(program: &str, child: &mut tokio::process::Child) {
    if let Err(e) = child.kill().await {
        warn!("Failed to kill {} (pid {:?}): {}", program, child.id(), e);
    }
}

async fn drain<R: AsyncRead + Unpin>(pipe: Option<R>) -> std::io::Result<Vec<u8>> {
    let mut buf = Vec::new();
    if let Some(mut pipe) = pipe {
        pipe.read_to_end(&mut buf).await?;
    }
    Ok(buf)
}
