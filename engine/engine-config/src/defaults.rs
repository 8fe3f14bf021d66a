//! Default configuration values loaded from config.defaults.toml.
//!
//! The defaults file is embedded at compile time so the binary and the
//! external trainer read identical values.

use once_cell::sync::Lazy;
use serde::Deserialize;

/// The embedded defaults TOML file (loaded at compile time)
const DEFAULTS_TOML: &str = include_str!("../../../config.defaults.toml");

/// Parsed defaults structure (parsed once at first use)
static DEFAULTS: Lazy<DefaultsConfig> = Lazy::new(|| {
    toml::from_str(DEFAULTS_TOML).expect("config.defaults.toml should be valid TOML")
});

// ============================================================================
// Internal structs for parsing config.defaults.toml
// ============================================================================

#[derive(Debug, Deserialize)]
struct DefaultsConfig {
    common: CommonDefaults,
    selfplay: SelfPlayDefaults,
    mcts: MctsDefaults,
    evaluation: EvaluationDefaults,
    storage: StorageDefaults,
}

#[derive(Debug, Deserialize)]
struct CommonDefaults {
    data_dir: String,
    log_level: String,
}

#[derive(Debug, Deserialize)]
struct SelfPlayDefaults {
    iterations: u32,
    games_per_iteration: u32,
    num_workers: usize,
    include_draws: bool,
    seed: u64,
}

#[derive(Debug, Deserialize)]
struct MctsDefaults {
    num_simulations: u32,
    c_puct: f64,
    temperature: f64,
    temp_threshold: u32,
    late_temperature: f64,
    dirichlet_alpha: f64,
    dirichlet_weight: f64,
    onnx_intra_threads: usize,
}

#[derive(Debug, Deserialize)]
struct EvaluationDefaults {
    interval: u32,
    games: u32,
    compete_back: u32,
    elo_k: f64,
    initial_elo: f64,
}

#[derive(Debug, Deserialize)]
struct StorageDefaults {
    replay_db: String,
    models_dir: String,
    training_log: String,
}

// ============================================================================
// Public accessor functions
// ============================================================================

// Common
pub fn data_dir() -> &'static str {
    &DEFAULTS.common.data_dir
}
pub fn log_level() -> &'static str {
    &DEFAULTS.common.log_level
}

// Self-play
pub fn iterations() -> u32 {
    DEFAULTS.selfplay.iterations
}
pub fn games_per_iteration() -> u32 {
    DEFAULTS.selfplay.games_per_iteration
}
pub fn num_workers() -> usize {
    DEFAULTS.selfplay.num_workers
}
pub fn include_draws() -> bool {
    DEFAULTS.selfplay.include_draws
}
pub fn seed() -> u64 {
    DEFAULTS.selfplay.seed
}

// MCTS
pub fn num_simulations() -> u32 {
    DEFAULTS.mcts.num_simulations
}
pub fn c_puct() -> f64 {
    DEFAULTS.mcts.c_puct
}
pub fn temperature() -> f64 {
    DEFAULTS.mcts.temperature
}
pub fn temp_threshold() -> u32 {
    DEFAULTS.mcts.temp_threshold
}
pub fn late_temperature() -> f64 {
    DEFAULTS.mcts.late_temperature
}
pub fn dirichlet_alpha() -> f64 {
    DEFAULTS.mcts.dirichlet_alpha
}
pub fn dirichlet_weight() -> f64 {
    DEFAULTS.mcts.dirichlet_weight
}
pub fn onnx_intra_threads() -> usize {
    DEFAULTS.mcts.onnx_intra_threads
}

// Evaluation
pub fn eval_interval() -> u32 {
    DEFAULTS.evaluation.interval
}
pub fn eval_games() -> u32 {
    DEFAULTS.evaluation.games
}
pub fn compete_back() -> u32 {
    DEFAULTS.evaluation.compete_back
}
pub fn elo_k() -> f64 {
    DEFAULTS.evaluation.elo_k
}
pub fn initial_elo() -> f64 {
    DEFAULTS.evaluation.initial_elo
}

// Storage
pub fn replay_db() -> &'static str {
    &DEFAULTS.storage.replay_db
}
pub fn models_dir() -> &'static str {
    &DEFAULTS.storage.models_dir
}
pub fn training_log() -> &'static str {
    &DEFAULTS.storage.training_log
}
