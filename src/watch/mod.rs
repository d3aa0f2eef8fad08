// src/watch/mod.rs

//! File watching and path filtering.
//!
//! This module is responsible for:
//! - Deciding which paths are in scope ([`filter::PathFilter`]).
//! - Wiring up a cross-platform filesystem watcher (`notify`) behind a
//!   uniform event stream ([`watcher::FileWatcher`]).
//!
//! It does **not** know about task trees or runs; it only classifies paths
//! and surfaces filesystem changes.

pub mod filter;
pub mod watcher;

pub use filter::{Ignore, PathFilter, Watch};
pub use watcher::{FileWatcher, WatchEvent, WatchOp, WatcherSignal};
