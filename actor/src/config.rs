//! Configuration for the Actor service
//!
//! Configuration is loaded from config.toml with environment variable overrides.
//! CLI arguments take highest priority, followed by env vars, then config.toml.

use anyhow::{anyhow, Result};
use clap::Parser;
use engine_config::{load_config, CentralConfig};
use mcts::MctsConfig;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::level_filters::LevelFilter;

use crate::pool::RoundConfig;
use crate::selfplay::GameSettings;

// Load central config once at startup
static CENTRAL_CONFIG: Lazy<CentralConfig> = Lazy::new(load_config);

/// Storage paths in config.toml are relative to the data directory.
fn under_data_dir(path: &str) -> String {
    if Path::new(path).is_absolute() {
        path.to_string()
    } else {
        format!("{}/{}", CENTRAL_CONFIG.common.data_dir, path)
    }
}

fn default_data_dir() -> String {
    CENTRAL_CONFIG.common.data_dir.clone()
}
fn default_log_level() -> String {
    CENTRAL_CONFIG.common.log_level.clone()
}
fn default_replay_db_path() -> String {
    under_data_dir(&CENTRAL_CONFIG.storage.replay_db)
}
fn default_models_dir() -> String {
    under_data_dir(&CENTRAL_CONFIG.storage.models_dir)
}
fn default_training_log() -> String {
    under_data_dir(&CENTRAL_CONFIG.storage.training_log)
}

#[derive(Parser, Debug, Clone, Serialize, Deserialize)]
#[command(name = "actor")]
#[command(about = "Self-play runner for nested tic-tac-toe")]
#[command(
    long_about = "Plays batches of self-play games with MCTS, hands each batch to the
trainer through the SQLite replay database, and periodically benchmarks the
latest model against an older checkpoint.

Configuration is loaded from config.toml with environment variable overrides.
CLI arguments take highest priority."
)]
pub struct Config {
    /// Data directory for stats and other files
    #[arg(long, default_value_t = default_data_dir())]
    pub data_dir: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value_t = default_log_level())]
    pub log_level: String,

    /// Last iteration to run; a resumed run continues from its training log
    #[arg(long, default_value_t = CENTRAL_CONFIG.selfplay.iterations)]
    pub iterations: u32,

    /// Games accepted into each training batch
    #[arg(long, default_value_t = CENTRAL_CONFIG.selfplay.games_per_iteration)]
    pub games_per_iteration: u32,

    /// Parallel self-play workers
    #[arg(long, default_value_t = CENTRAL_CONFIG.selfplay.num_workers)]
    pub num_workers: usize,

    /// Keep drawn games in the training batch
    #[arg(long, action = clap::ArgAction::Set, default_value_t = CENTRAL_CONFIG.selfplay.include_draws)]
    pub include_draws: bool,

    /// Base RNG seed (0 picks one at random)
    #[arg(long, default_value_t = CENTRAL_CONFIG.selfplay.seed)]
    pub seed: u64,

    /// Number of MCTS simulations per move
    #[arg(long, default_value_t = CENTRAL_CONFIG.mcts.num_simulations)]
    pub num_simulations: u32,

    /// PUCT exploration constant
    #[arg(long, default_value_t = CENTRAL_CONFIG.mcts.c_puct as f32)]
    pub c_puct: f32,

    /// Move selection temperature
    #[arg(long, default_value_t = CENTRAL_CONFIG.mcts.temperature as f32)]
    pub temperature: f32,

    /// Move number after which `late_temperature` is used (0 to disable)
    #[arg(long, default_value_t = CENTRAL_CONFIG.mcts.temp_threshold)]
    pub temp_threshold: u32,

    #[arg(long, default_value_t = CENTRAL_CONFIG.mcts.late_temperature as f32)]
    pub late_temperature: f32,

    /// Root Dirichlet noise alpha (0 disables noise)
    #[arg(long, default_value_t = CENTRAL_CONFIG.mcts.dirichlet_alpha as f32)]
    pub dirichlet_alpha: f32,

    /// Fraction of the root prior replaced by noise
    #[arg(long, default_value_t = CENTRAL_CONFIG.mcts.dirichlet_weight as f32)]
    pub dirichlet_weight: f32,

    #[arg(long, default_value_t = CENTRAL_CONFIG.mcts.onnx_intra_threads)]
    pub onnx_intra_threads: usize,

    /// Evaluate every N iterations (0 to disable)
    #[arg(long, default_value_t = CENTRAL_CONFIG.evaluation.interval)]
    pub eval_interval: u32,

    /// Games per evaluation match
    #[arg(long, default_value_t = CENTRAL_CONFIG.evaluation.games)]
    pub eval_games: u32,

    /// Play against the checkpoint this many iterations back
    #[arg(long, default_value_t = CENTRAL_CONFIG.evaluation.compete_back)]
    pub compete_back: u32,

    /// Elo K-factor
    #[arg(long, default_value_t = CENTRAL_CONFIG.evaluation.elo_k)]
    pub elo_k: f64,

    /// Rating both sides start from
    #[arg(long, default_value_t = CENTRAL_CONFIG.evaluation.initial_elo)]
    pub initial_elo: f64,

    /// Path to SQLite replay database
    #[arg(long, default_value_t = default_replay_db_path())]
    pub replay_db_path: String,

    /// Directory holding latest.onnx and iteration checkpoints
    #[arg(long, default_value_t = default_models_dir())]
    pub models_dir: String,

    /// Path to the JSON training log
    #[arg(long, default_value_t = default_training_log())]
    pub training_log: String,
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        if self.games_per_iteration == 0 {
            return Err(anyhow!("games_per_iteration must be greater than 0"));
        }

        if self.num_workers == 0 {
            return Err(anyhow!("num_workers must be greater than 0"));
        }

        if self.num_simulations == 0 {
            return Err(anyhow!("num_simulations must be greater than 0"));
        }

        if !(self.c_puct.is_finite() && self.c_puct > 0.0) {
            return Err(anyhow!("c_puct must be a positive number"));
        }

        for (name, t) in [
            ("temperature", self.temperature),
            ("late_temperature", self.late_temperature),
        ] {
            if !(t.is_finite() && t >= 0.0) {
                return Err(anyhow!("{} must be a non-negative number", name));
            }
        }

        if !(self.dirichlet_alpha.is_finite() && self.dirichlet_alpha >= 0.0) {
            return Err(anyhow!("dirichlet_alpha must be a non-negative number"));
        }

        if !(0.0..=1.0).contains(&self.dirichlet_weight) {
            return Err(anyhow!("dirichlet_weight must be between 0 and 1"));
        }

        if self.eval_interval > 0 {
            if self.eval_games == 0 {
                return Err(anyhow!("eval_games must be greater than 0"));
            }
            if self.compete_back == 0 || self.compete_back % self.eval_interval != 0 {
                return Err(anyhow!(
                    "compete_back must be a positive multiple of eval_interval ({})",
                    self.eval_interval
                ));
            }
        }

        if !(self.elo_k.is_finite() && self.elo_k > 0.0) {
            return Err(anyhow!("elo_k must be a positive number"));
        }

        if self.log_level.parse::<LevelFilter>().is_err() {
            return Err(anyhow!(
                "invalid log level '{}', expected one of trace, debug, info, warn, error",
                self.log_level
            ));
        }

        Ok(())
    }

    /// Search settings for self-play.
    pub fn mcts_config(&self) -> MctsConfig {
        MctsConfig::for_training()
            .with_simulations(self.num_simulations)
            .with_c_puct(self.c_puct)
            .with_temperature(self.temperature)
            .with_dirichlet(self.dirichlet_alpha, self.dirichlet_weight)
    }

    /// Search settings for evaluation matches: same depth, no root noise.
    pub fn eval_mcts_config(&self) -> MctsConfig {
        self.mcts_config().with_dirichlet(0.0, 0.0)
    }

    pub fn game_settings(&self) -> GameSettings {
        GameSettings::new(self.mcts_config())
            .with_temp_schedule(self.temp_threshold, self.late_temperature)
    }

    pub fn round_config(&self, seed: u64) -> RoundConfig {
        RoundConfig {
            games: self.games_per_iteration as usize,
            num_workers: self.num_workers,
            include_draws: self.include_draws,
            seed,
        }
    }

    /// Whether an evaluation match is due after `iteration`.
    pub fn evaluation_due(&self, iteration: u32) -> bool {
        self.eval_interval > 0 && iteration % self.eval_interval == 0
    }

    /// Checkpoint to play against after `iteration`, once far enough in.
    pub fn opponent_iteration(&self, iteration: u32) -> Option<u32> {
        iteration.checked_sub(self.compete_back)
    }

    pub fn training_log_path(&self) -> PathBuf {
        PathBuf::from(&self.training_log)
    }
}
