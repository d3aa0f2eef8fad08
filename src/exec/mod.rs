// src/exec/mod.rs

//! Process execution.
//!
//! One function, one process: [`exec`] spawns a command with piped
//! stdout/stderr, streams its output, and tears it down when the run's
//! cancellation token fires. Walking the task tree and deciding *what* to
//! execute lives in [`crate::task`].

pub mod command;

pub use command::{exec, ExecError};
