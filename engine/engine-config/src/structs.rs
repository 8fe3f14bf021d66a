//! Configuration struct definitions.
//!
//! All config structs with serde deserialization support and default values.

use crate::defaults;
use serde::Deserialize;

// ============================================================================
// Serde default functions (required for #[serde(default = "...")])
// These call the accessor functions from defaults module
// ============================================================================

fn d_data_dir() -> String {
    defaults::data_dir().into()
}
fn d_log_level() -> String {
    defaults::log_level().into()
}
fn d_iterations() -> u32 {
    defaults::iterations()
}
fn d_games_per_iteration() -> u32 {
    defaults::games_per_iteration()
}
fn d_num_workers() -> usize {
    defaults::num_workers()
}
fn d_include_draws() -> bool {
    defaults::include_draws()
}
fn d_seed() -> u64 {
    defaults::seed()
}
fn d_num_sims() -> u32 {
    defaults::num_simulations()
}
fn d_c_puct() -> f64 {
    defaults::c_puct()
}
fn d_temperature() -> f64 {
    defaults::temperature()
}
fn d_temp_threshold() -> u32 {
    defaults::temp_threshold()
}
fn d_late_temperature() -> f64 {
    defaults::late_temperature()
}
fn d_dirichlet_alpha() -> f64 {
    defaults::dirichlet_alpha()
}
fn d_dirichlet_weight() -> f64 {
    defaults::dirichlet_weight()
}
fn d_onnx_intra_threads() -> usize {
    defaults::onnx_intra_threads()
}
fn d_eval_interval() -> u32 {
    defaults::eval_interval()
}
fn d_eval_games() -> u32 {
    defaults::eval_games()
}
fn d_compete_back() -> u32 {
    defaults::compete_back()
}
fn d_elo_k() -> f64 {
    defaults::elo_k()
}
fn d_initial_elo() -> f64 {
    defaults::initial_elo()
}
fn d_replay_db() -> String {
    defaults::replay_db().into()
}
fn d_models_dir() -> String {
    defaults::models_dir().into()
}
fn d_training_log() -> String {
    defaults::training_log().into()
}

// ============================================================================
// Configuration Structs
// ============================================================================

/// Root configuration structure matching config.toml
#[derive(Debug, Deserialize, Default, Clone)]
pub struct CentralConfig {
    #[serde(default)]
    pub common: CommonConfig,
    #[serde(default)]
    pub selfplay: SelfPlayConfig,
    #[serde(default)]
    pub mcts: MctsConfig,
    #[serde(default)]
    pub evaluation: EvaluationConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

/// Common configuration shared by all components
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct CommonConfig {
    #[serde(default = "d_data_dir")]
    pub data_dir: String,
    #[serde(default = "d_log_level")]
    pub log_level: String,
}

impl Default for CommonConfig {
    fn default() -> Self {
        Self {
            data_dir: defaults::data_dir().into(),
            log_level: defaults::log_level().into(),
        }
    }
}

/// Self-play orchestration
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SelfPlayConfig {
    /// Total number of iterations to run (resumed runs count what is logged)
    #[serde(default = "d_iterations")]
    pub iterations: u32,
    #[serde(default = "d_games_per_iteration")]
    pub games_per_iteration: u32,
    #[serde(default = "d_num_workers")]
    pub num_workers: usize,
    /// Keep training examples from drawn games
    #[serde(default = "d_include_draws")]
    pub include_draws: bool,
    /// Base seed for per-game RNG streams. 0 draws one from the OS.
    #[serde(default = "d_seed")]
    pub seed: u64,
}

impl Default for SelfPlayConfig {
    fn default() -> Self {
        Self {
            iterations: defaults::iterations(),
            games_per_iteration: defaults::games_per_iteration(),
            num_workers: defaults::num_workers(),
            include_draws: defaults::include_draws(),
            seed: defaults::seed(),
        }
    }
}

/// MCTS (Monte Carlo Tree Search) configuration
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct MctsConfig {
    #[serde(default = "d_num_sims")]
    pub num_simulations: u32,
    #[serde(default = "d_c_puct")]
    pub c_puct: f64,
    #[serde(default = "d_temperature")]
    pub temperature: f64,
    /// Ply after which `late_temperature` replaces `temperature` (0 = never)
    #[serde(default = "d_temp_threshold")]
    pub temp_threshold: u32,
    #[serde(default = "d_late_temperature")]
    pub late_temperature: f64,
    #[serde(default = "d_dirichlet_alpha")]
    pub dirichlet_alpha: f64,
    #[serde(default = "d_dirichlet_weight")]
    pub dirichlet_weight: f64,
    #[serde(default = "d_onnx_intra_threads")]
    pub onnx_intra_threads: usize,
}

impl Default for MctsConfig {
    fn default() -> Self {
        Self {
            num_simulations: defaults::num_simulations(),
            c_puct: defaults::c_puct(),
            temperature: defaults::temperature(),
            temp_threshold: defaults::temp_threshold(),
            late_temperature: defaults::late_temperature(),
            dirichlet_alpha: defaults::dirichlet_alpha(),
            dirichlet_weight: defaults::dirichlet_weight(),
            onnx_intra_threads: defaults::onnx_intra_threads(),
        }
    }
}

impl MctsConfig {
    /// Temperature in effect at the given ply.
    pub fn temperature_at(&self, ply: u32) -> f64 {
        if self.temp_threshold > 0 && ply >= self.temp_threshold {
            self.late_temperature
        } else {
            self.temperature
        }
    }
}

/// Evaluation and Elo tracking
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct EvaluationConfig {
    /// Run a match every N iterations (0 disables evaluation)
    #[serde(default = "d_eval_interval")]
    pub interval: u32,
    #[serde(default = "d_eval_games")]
    pub games: u32,
    /// How many iterations back the opponent snapshot is taken from
    #[serde(default = "d_compete_back")]
    pub compete_back: u32,
    #[serde(default = "d_elo_k")]
    pub elo_k: f64,
    #[serde(default = "d_initial_elo")]
    pub initial_elo: f64,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            interval: defaults::eval_interval(),
            games: defaults::eval_games(),
            compete_back: defaults::compete_back(),
            elo_k: defaults::elo_k(),
            initial_elo: defaults::initial_elo(),
        }
    }
}

/// Storage locations, relative to `common.data_dir` unless absolute
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct StorageConfig {
    #[serde(default = "d_replay_db")]
    pub replay_db: String,
    #[serde(default = "d_models_dir")]
    pub models_dir: String,
    #[serde(default = "d_training_log")]
    pub training_log: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            replay_db: defaults::replay_db().into(),
            models_dir: defaults::models_dir().into(),
            training_log: defaults::training_log().into(),
        }
    }
}
