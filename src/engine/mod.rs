// src/engine/mod.rs

//! The activity engine.
//!
//! [`activity::Activity`] couples the watcher, the path filter, and the task
//! runner: it indexes the watch roots, runs the before/main/after trees in
//! order, and restarts the main tree (cancelling the previous run) on every
//! accepted filesystem change.

pub mod activity;

pub use activity::{Activity, Debounce};
