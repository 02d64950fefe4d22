//! External process execution

pub mod mock;
pub mod process;
pub mod runner;

pub use process::{run_process, ExecOutput, ProcessError};
pub use runner::{CommandRunner, ProcessRunner};
