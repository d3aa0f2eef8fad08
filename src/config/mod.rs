// src/config/mod.rs

//! Configuration: YAML model, loading, validation.

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{default_config_path, load_and_validate, load_from_path};
pub use model::{ActivityConfig, ConfigFile, Options};
pub use validate::validate_config;
