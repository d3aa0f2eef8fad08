// src/errors.rs

//! Crate-wide error aliases.
//!
//! Boundary errors are `anyhow`; the one structured error type lives next to
//! the code that produces it (`exec::ExecError`).

pub use anyhow::{Error, Result};
