//! Centralized configuration loading from config.toml.
//!
//! This crate provides the configuration structs and loading logic used by
//! the self-play actor.
//!
//! # Configuration Priority
//!
//! Settings are loaded with the following priority (highest to lowest):
//! 1. Environment variables (`ULTIMATE_<SECTION>_<KEY>`)
//! 2. config.toml file
//! 3. Built-in defaults
//!
//! # Environment Variable Override Pattern
//!
//! ```text
//! ULTIMATE_<SECTION>_<KEY>=value
//!
//! Examples:
//!     ULTIMATE_COMMON_DATA_DIR=/data
//!     ULTIMATE_SELFPLAY_NUM_WORKERS=8
//!     ULTIMATE_MCTS_NUM_SIMULATIONS=400
//!     ULTIMATE_EVALUATION_INTERVAL=10
//! ```

mod defaults;
mod loader;
mod structs;

pub use defaults::*;
pub use loader::{apply_env_overrides, load_config, load_from_path, CONFIG_SEARCH_PATHS};
pub use structs::*;

#[cfg(test)]
mod tests;
