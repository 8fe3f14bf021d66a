//! Configuration loading logic.
//!
//! Handles loading config from files and applying environment variable overrides.

use crate::CentralConfig;
use std::path::PathBuf;
use tracing::{debug, info, warn};

/// Standard locations to search for config.toml
pub const CONFIG_SEARCH_PATHS: &[&str] = &[
    "config.toml",      // Current directory
    "../config.toml",   // Parent directory (when running from subdirectory)
    "/app/config.toml", // Docker container
];

/// Load the central configuration from config.toml.
///
/// Searches for config.toml in the following order:
/// 1. Path specified by ULTIMATE_CONFIG environment variable
/// 2. Current directory (config.toml)
/// 3. Parent directory (../config.toml)
/// 4. Docker container path (/app/config.toml)
///
/// After loading, environment variable overrides are applied.
pub fn load_config() -> CentralConfig {
    if let Ok(path) = std::env::var("ULTIMATE_CONFIG") {
        let path = PathBuf::from(&path);
        if path.exists() {
            info!("Loading config from ULTIMATE_CONFIG: {}", path.display());
            return load_from_path(&path);
        }
        warn!(
            "ULTIMATE_CONFIG={} not found, searching defaults",
            path.display()
        );
    }

    for path_str in CONFIG_SEARCH_PATHS {
        let path = PathBuf::from(path_str);
        if path.exists() {
            info!("Loading config from {}", path.display());
            return load_from_path(&path);
        }
    }

    debug!("No config.toml found, using built-in defaults");
    apply_env_overrides(CentralConfig::default())
}

/// Load configuration from a specific path.
///
/// An unreadable or malformed file falls back to the built-in defaults.
pub fn load_from_path(path: &PathBuf) -> CentralConfig {
    match std::fs::read_to_string(path) {
        Ok(content) => match toml::from_str(&content) {
            Ok(config) => apply_env_overrides(config),
            Err(e) => {
                warn!("Failed to parse {}: {}, using defaults", path.display(), e);
                apply_env_overrides(CentralConfig::default())
            }
        },
        Err(e) => {
            warn!("Failed to read {}: {}, using defaults", path.display(), e);
            apply_env_overrides(CentralConfig::default())
        }
    }
}

/// Macro to reduce env override boilerplate
macro_rules! env_override {
    // String field
    ($config:expr, $section:ident . $field:ident, $key:expr) => {
        if let Ok(v) = std::env::var($key) {
            $config.$section.$field = v;
        }
    };
    // Parseable field (u32, u64, f64, bool, etc.)
    ($config:expr, $section:ident . $field:ident, $key:expr, parse) => {
        if let Ok(v) =
            std::env::var($key).and_then(|s| s.parse().map_err(|_| std::env::VarError::NotPresent))
        {
            $config.$section.$field = v;
        }
    };
}

/// Apply environment variable overrides to a configuration.
///
/// Environment variables follow the pattern: ULTIMATE_<SECTION>_<KEY>.
/// Values that fail to parse are ignored.
pub fn apply_env_overrides(mut config: CentralConfig) -> CentralConfig {
    // Common
    env_override!(config, common.data_dir, "ULTIMATE_COMMON_DATA_DIR");
    env_override!(config, common.log_level, "ULTIMATE_COMMON_LOG_LEVEL");

    // Self-play
    env_override!(
        config,
        selfplay.iterations,
        "ULTIMATE_SELFPLAY_ITERATIONS",
        parse
    );
    env_override!(
        config,
        selfplay.games_per_iteration,
        "ULTIMATE_SELFPLAY_GAMES_PER_ITERATION",
        parse
    );
    env_override!(
        config,
        selfplay.num_workers,
        "ULTIMATE_SELFPLAY_NUM_WORKERS",
        parse
    );
    env_override!(
        config,
        selfplay.include_draws,
        "ULTIMATE_SELFPLAY_INCLUDE_DRAWS",
        parse
    );
    env_override!(config, selfplay.seed, "ULTIMATE_SELFPLAY_SEED", parse);

    // MCTS
    env_override!(
        config,
        mcts.num_simulations,
        "ULTIMATE_MCTS_NUM_SIMULATIONS",
        parse
    );
    env_override!(config, mcts.c_puct, "ULTIMATE_MCTS_C_PUCT", parse);
    env_override!(
        config,
        mcts.temperature,
        "ULTIMATE_MCTS_TEMPERATURE",
        parse
    );
    env_override!(
        config,
        mcts.temp_threshold,
        "ULTIMATE_MCTS_TEMP_THRESHOLD",
        parse
    );
    env_override!(
        config,
        mcts.late_temperature,
        "ULTIMATE_MCTS_LATE_TEMPERATURE",
        parse
    );
    env_override!(
        config,
        mcts.dirichlet_alpha,
        "ULTIMATE_MCTS_DIRICHLET_ALPHA",
        parse
    );
    env_override!(
        config,
        mcts.dirichlet_weight,
        "ULTIMATE_MCTS_DIRICHLET_WEIGHT",
        parse
    );
    env_override!(
        config,
        mcts.onnx_intra_threads,
        "ULTIMATE_MCTS_ONNX_INTRA_THREADS",
        parse
    );

    // Evaluation
    env_override!(
        config,
        evaluation.interval,
        "ULTIMATE_EVALUATION_INTERVAL",
        parse
    );
    env_override!(config, evaluation.games, "ULTIMATE_EVALUATION_GAMES", parse);
    env_override!(
        config,
        evaluation.compete_back,
        "ULTIMATE_EVALUATION_COMPETE_BACK",
        parse
    );
    env_override!(config, evaluation.elo_k, "ULTIMATE_EVALUATION_ELO_K", parse);
    env_override!(
        config,
        evaluation.initial_elo,
        "ULTIMATE_EVALUATION_INITIAL_ELO",
        parse
    );

    // Storage
    env_override!(config, storage.replay_db, "ULTIMATE_STORAGE_REPLAY_DB");
    env_override!(config, storage.models_dir, "ULTIMATE_STORAGE_MODELS_DIR");
    env_override!(
        config,
        storage.training_log,
        "ULTIMATE_STORAGE_TRAINING_LOG"
    );

    config
}
