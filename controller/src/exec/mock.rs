//! Scripted command runner
//!
//! Test double that records every invocation and answers from a script
//! instead of spawning processes. Per-host delays let tests force a
//! completion order different from the launch order.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::exec::process::{ExecOutput, ProcessError};
use crate::exec::runner::CommandRunner;

/// One recorded call to [`ScriptedRunner::run`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    pub timeout: Duration,
}

impl Invocation {
    /// Host named by the `user@host[:path]` argument, if any
    pub fn host(&self) -> Option<&str> {
        self.args.iter().find_map(|arg| {
            let (_, rest) = arg.split_once('@')?;
            Some(rest.split(':').next().unwrap_or(rest))
        })
    }
}

type Script = Box<dyn Fn(&Invocation) -> Result<ExecOutput, ProcessError> + Send + Sync>;

/// Records invocations and replies according to a script
pub struct ScriptedRunner {
    script: Script,
    delays: HashMap<String, Duration>,
    invocations: Mutex<Vec<Invocation>>,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
}

impl ScriptedRunner {
    pub fn new<F>(script: F) -> Self
    where
        F: Fn(&Invocation) -> Result<ExecOutput, ProcessError> + Send + Sync + 'static,
    {
        Self {
            script: Box::new(script),
            delays: HashMap::new(),
            invocations: Mutex::new(Vec::new()),
            in_flight: AtomicUsize::new(0),
            peak_in_flight: AtomicUsize::new(0),
        }
    }

    /// Every command succeeds and prints `ok`
    pub fn succeeding() -> Self {
        Self::new(|_| {
            Ok(ExecOutput {
                stdout: "ok\n".to_string(),
                stderr: String::new(),
            })
        })
    }

    /// Delay every reply for commands addressed to `host`
    pub fn with_delay(mut self, host: &str, delay: Duration) -> Self {
        self.delays.insert(host.to_string(), delay);
        self
    }

    pub fn invocations(&self) -> Vec<Invocation> {
        self.invocations
            .lock()
            .map(|log| log.clone())
            .unwrap_or_default()
    }

    /// Number of recorded invocations of `program`
    pub fn count(&self, program: &str) -> usize {
        self.invocations()
            .iter()
            .filter(|inv| inv.program == program)
            .count()
    }

    /// Highest number of invocations that were running at the same time
    pub fn peak_concurrency(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CommandRunner for ScriptedRunner {
    async fn run(
        &self,
        program: &str,
        args: &[String],
        timeout: Duration,
    ) -> Result<ExecOutput, ProcessError> {
        let invocation = Invocation {
            program: program.to_string(),
            args: args.to_vec(),
            timeout,
        };
        if let Ok(mut log) = self.invocations.lock() {
            log.push(invocation.clone());
        }

        let running = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(running, Ordering::SeqCst);

        let delay = invocation
            .host()
            .and_then(|host| self.delays.get(host))
            .copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let reply = (self.script)(&invocation);
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        reply
    }
}
