//! Persistent run history, used to resume after a restart.
//!
//! Written as JSON after every completed iteration with the same
//! write-then-rename approach as the stats file.

use std::fs;
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use games_ultimate::Outcome;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::evaluation::{EloHistory, EvalGame};

/// Summary of one self-play iteration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IterationSummary {
    pub iteration: u32,
    pub games: u32,
    pub examples: u32,
    pub x_wins: u32,
    pub o_wins: u32,
    pub draws: u32,
    pub skipped_draws: u32,
    pub avg_plies: f64,
    pub elapsed_secs: f64,
    /// Evaluator that played the games (file path or "uniform").
    pub model: String,
}

/// One evaluation game as stored in the log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationRecord {
    pub iteration: u32,
    pub opponent_iteration: u32,
    pub game: u32,
    /// +1 X won, -1 O won, 0 draw.
    pub outcome: i8,
    pub plies: u32,
    /// 'x' or 'o'
    pub model_player: char,
}

impl EvaluationRecord {
    pub fn new(iteration: u32, opponent_iteration: u32, game: &EvalGame) -> Self {
        Self {
            iteration,
            opponent_iteration,
            game: game.game,
            outcome: match game.outcome {
                Outcome::Win(p) => p.sign() as i8,
                Outcome::Draw | Outcome::InProgress => 0,
            },
            plies: game.plies,
            model_player: game.model_player.symbol(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingLog {
    /// Last completed iteration (0 before the first one).
    pub iteration: u32,
    pub training: Vec<IterationSummary>,
    pub evaluation: Vec<EvaluationRecord>,
    pub elo: EloHistory,
}

impl TrainingLog {
    pub fn new(initial_elo: f64) -> Self {
        Self {
            iteration: 0,
            training: Vec::new(),
            evaluation: Vec::new(),
            elo: EloHistory::new(initial_elo),
        }
    }

    /// Load the log at `path`, or start a fresh one if it does not exist.
    pub fn load_or_new(path: &Path, initial_elo: f64) -> Result<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "no training log, starting fresh");
            return Ok(Self::new(initial_elo));
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read training log {}", path.display()))?;
        let log: Self = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse training log {}", path.display()))?;
        info!(
            path = %path.display(),
            iteration = log.iteration,
            evaluations = log.elo.player.len().saturating_sub(1),
            "Resuming from training log"
        );
        Ok(log)
    }

    /// Write the log atomically (temp file, then rename).
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(self)?;
        let temp_path = path.with_extension("json.tmp");
        {
            let mut file = fs::File::create(&temp_path)?;
            file.write_all(json.as_bytes())?;
        }
        fs::rename(&temp_path, path)?;

        debug!(path = %path.display(), iteration = self.iteration, "Wrote training log");
        Ok(())
    }

    /// Iteration to run next.
    pub fn next_iteration(&self) -> u32 {
        self.iteration + 1
    }
}
