// src/exec/mod.rs

//! Process execution layer.
//!
//! - [`launcher`] provides the `ProcessLauncher` trait and the production
//!   `TokioLauncher` built on `tokio::process::Command`; tests replace it
//!   with a fake implementation.
//! - [`command`] holds the four launch operations (command line, inline
//!   script, script file + interpreter, entry point + args).
//! - [`task_executor`] dispatches a validated runner to one of them.

pub mod command;
pub mod launcher;
pub mod task_executor;

pub use command::AttemptContext;
pub use launcher::{
    LaunchOutcome, LaunchRequest, OutputLine, OutputStream, ProcessLauncher, TokioLauncher,
};
pub use task_executor::TaskExecutor;
