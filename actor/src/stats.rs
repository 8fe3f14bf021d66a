//! Actor statistics tracking and persistence.
//!
//! This module provides statistics tracking for the actor, including:
//! - Game counts and outcomes
//! - Search throughput
//! - Iteration progress
//!
//! Stats are written to a JSON file next to the replay database.

use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::time::Instant;
use tracing::{debug, warn};

use games_ultimate::{Outcome, Player};

use crate::selfplay::GameRecord;

/// Aggregated actor statistics, designed for lock-free updates.
#[derive(Debug)]
pub struct ActorStats {
    iterations_completed: AtomicU32,
    games_completed: AtomicU32,
    total_plies: AtomicU64,
    x_wins: AtomicU32,
    o_wins: AtomicU32,
    /// Drawn games kept for training
    accepted_draws: AtomicU32,
    /// Drawn games left out of training
    skipped_draws: AtomicU32,
    simulations: AtomicU64,
    evaluator_calls: AtomicU64,
    search_us: AtomicU64,
    start_time: Instant,
    stats_path: PathBuf,
}

/// Serializable stats for JSON output.
#[derive(Debug, Serialize, Deserialize)]
pub struct ActorStatsSnapshot {
    pub iterations_completed: u32,
    pub games_completed: u32,
    pub total_plies: u64,
    pub x_wins: u32,
    pub o_wins: u32,
    pub accepted_draws: u32,
    pub skipped_draws: u32,
    /// Every drawn game, kept or not.
    pub total_draws: u32,
    pub avg_game_length: f64,
    pub games_per_second: f64,
    pub simulations_per_second: f64,
    pub avg_search_ms: f64,
    pub runtime_seconds: f64,
    pub timestamp: u64,
}

impl ActorStats {
    /// Create new stats tracker.
    pub fn new(data_dir: impl AsRef<Path>) -> Self {
        let data_dir = data_dir.as_ref();
        if let Err(e) = fs::create_dir_all(data_dir) {
            warn!("Failed to create data directory: {}", e);
        }

        Self {
            iterations_completed: AtomicU32::new(0),
            games_completed: AtomicU32::new(0),
            total_plies: AtomicU64::new(0),
            x_wins: AtomicU32::new(0),
            o_wins: AtomicU32::new(0),
            accepted_draws: AtomicU32::new(0),
            skipped_draws: AtomicU32::new(0),
            simulations: AtomicU64::new(0),
            evaluator_calls: AtomicU64::new(0),
            search_us: AtomicU64::new(0),
            start_time: Instant::now(),
            stats_path: data_dir.join("actor_stats.json"),
        }
    }

    /// Record a game accepted into a training batch.
    pub fn record_game(&self, record: &GameRecord) {
        self.games_completed.fetch_add(1, Ordering::Relaxed);
        self.total_plies
            .fetch_add(record.plies as u64, Ordering::Relaxed);

        match record.outcome {
            Outcome::Win(Player::X) => self.x_wins.fetch_add(1, Ordering::Relaxed),
            Outcome::Win(Player::O) => self.o_wins.fetch_add(1, Ordering::Relaxed),
            Outcome::Draw | Outcome::InProgress => {
                self.accepted_draws.fetch_add(1, Ordering::Relaxed)
            }
        };

        let search = &record.search;
        self.simulations
            .fetch_add(search.simulations, Ordering::Relaxed);
        self.evaluator_calls
            .fetch_add(search.evaluator_calls, Ordering::Relaxed);
        self.search_us
            .fetch_add(search.elapsed.as_micros() as u64, Ordering::Relaxed);
    }

    pub fn record_skipped_draws(&self, count: u32) {
        self.skipped_draws.fetch_add(count, Ordering::Relaxed);
    }

    pub fn record_iteration(&self) {
        self.iterations_completed.fetch_add(1, Ordering::Relaxed);
    }

    /// Get a snapshot of current stats.
    pub fn snapshot(&self) -> ActorStatsSnapshot {
        let games = self.games_completed.load(Ordering::Relaxed);
        let plies = self.total_plies.load(Ordering::Relaxed);
        let simulations = self.simulations.load(Ordering::Relaxed);
        let search_us = self.search_us.load(Ordering::Relaxed);
        let runtime = self.start_time.elapsed().as_secs_f64();
        let accepted_draws = self.accepted_draws.load(Ordering::Relaxed);
        let skipped_draws = self.skipped_draws.load(Ordering::Relaxed);

        let avg_game_length = if games > 0 {
            plies as f64 / games as f64
        } else {
            0.0
        };
        let (games_per_second, simulations_per_second) = if runtime > 0.0 {
            (games as f64 / runtime, simulations as f64 / runtime)
        } else {
            (0.0, 0.0)
        };
        // One search per ply
        let avg_search_ms = if plies > 0 {
            search_us as f64 / plies as f64 / 1000.0
        } else {
            0.0
        };

        ActorStatsSnapshot {
            iterations_completed: self.iterations_completed.load(Ordering::Relaxed),
            games_completed: games,
            total_plies: plies,
            x_wins: self.x_wins.load(Ordering::Relaxed),
            o_wins: self.o_wins.load(Ordering::Relaxed),
            accepted_draws,
            skipped_draws,
            total_draws: accepted_draws + skipped_draws,
            avg_game_length,
            games_per_second,
            simulations_per_second,
            avg_search_ms,
            runtime_seconds: runtime,
            timestamp: std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .map(|d| d.as_secs())
                .unwrap_or(0),
        }
    }

    /// Write stats to JSON file (atomic write-then-rename).
    pub fn write_stats(&self) {
        let snapshot = self.snapshot();

        let json = match serde_json::to_string_pretty(&snapshot) {
            Ok(j) => j,
            Err(e) => {
                warn!("Failed to serialize actor stats: {}", e);
                return;
            }
        };

        let temp_path = self.stats_path.with_extension("json.tmp");
        match fs::File::create(&temp_path) {
            Ok(mut file) => {
                if let Err(e) = file.write_all(json.as_bytes()) {
                    warn!("Failed to write actor stats: {}", e);
                    return;
                }
            }
            Err(e) => {
                warn!("Failed to create temp stats file: {}", e);
                return;
            }
        }

        if let Err(e) = fs::rename(&temp_path, &self.stats_path) {
            warn!("Failed to rename stats file: {}", e);
            let _ = fs::remove_file(&temp_path);
            return;
        }

        debug!("Wrote actor stats to {}", self.stats_path.display());
    }

    pub fn stats_path(&self) -> &Path {
        &self.stats_path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selfplay::SearchTotals;
    use std::time::Duration;
    use tempfile::tempdir;

    fn game(outcome: Outcome, plies: u32) -> GameRecord {
        GameRecord {
            outcome,
            plies,
            examples: Vec::new(),
            search: SearchTotals {
                searches: plies,
                simulations: plies as u64 * 100,
                evaluator_calls: plies as u64 * 90,
                terminal_hits: 0,
                elapsed: Duration::from_millis(plies as u64 * 2),
            },
        }
    }

    #[test]
    fn test_record_game_outcomes() {
        let dir = tempdir().unwrap();
        let stats = ActorStats::new(dir.path());

        stats.record_game(&game(Outcome::Win(Player::X), 30));
        stats.record_game(&game(Outcome::Win(Player::O), 40));
        stats.record_game(&game(Outcome::Draw, 60));
        stats.record_skipped_draws(2);

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.games_completed, 3);
        assert_eq!(snapshot.x_wins, 1);
        assert_eq!(snapshot.o_wins, 1);
        assert_eq!(snapshot.accepted_draws, 1);
        assert_eq!(snapshot.skipped_draws, 2);
        assert_eq!(snapshot.total_draws, 3);
        assert_eq!(snapshot.total_plies, 130);
    }

    #[test]
    fn test_skipped_draws_count_as_draws() {
        let dir = tempdir().unwrap();
        let stats = ActorStats::new(dir.path());

        // Nothing accepted, every draw thrown away
        stats.record_game(&game(Outcome::Win(Player::O), 33));
        stats.record_skipped_draws(4);

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.games_completed, 1);
        assert_eq!(snapshot.accepted_draws, 0);
        assert_eq!(snapshot.total_draws, 4);

        stats.write_stats();
        let written: ActorStatsSnapshot =
            serde_json::from_str(&fs::read_to_string(stats.stats_path()).unwrap()).unwrap();
        assert_eq!(written.skipped_draws, 4);
        assert_eq!(written.total_draws, 4);
    }

    #[test]
    fn test_averages() {
        let dir = tempdir().unwrap();
        let stats = ActorStats::new(dir.path());

        stats.record_game(&game(Outcome::Win(Player::X), 30));
        stats.record_game(&game(Outcome::Win(Player::X), 50));

        let snapshot = stats.snapshot();
        assert!((snapshot.avg_game_length - 40.0).abs() < 0.01);
        // 2ms per ply of search
        assert!((snapshot.avg_search_ms - 2.0).abs() < 0.01);
        assert!(snapshot.simulations_per_second > 0.0);
    }

    #[test]
    fn test_average_with_zero_games() {
        let dir = tempdir().unwrap();
        let stats = ActorStats::new(dir.path());

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.games_completed, 0);
        assert_eq!(snapshot.avg_game_length, 0.0);
        assert_eq!(snapshot.avg_search_ms, 0.0);
        assert!(!snapshot.avg_game_length.is_nan());
    }

    #[test]
    fn test_write_stats_atomic() {
        let dir = tempdir().unwrap();
        let stats = ActorStats::new(dir.path());

        stats.record_game(&game(Outcome::Win(Player::O), 25));
        stats.write_stats();

        let content1 = fs::read_to_string(stats.stats_path()).unwrap();
        let parsed1: ActorStatsSnapshot = serde_json::from_str(&content1).unwrap();
        assert_eq!(parsed1.games_completed, 1);

        stats.record_game(&game(Outcome::Draw, 70));
        stats.record_iteration();
        stats.write_stats();

        let content2 = fs::read_to_string(stats.stats_path()).unwrap();
        let parsed2: ActorStatsSnapshot = serde_json::from_str(&content2).unwrap();
        assert_eq!(parsed2.games_completed, 2);
        assert_eq!(parsed2.iterations_completed, 1);
        assert!(!stats.stats_path().with_extension("json.tmp").exists());
    }

    #[test]
    fn test_stats_path() {
        let dir = tempdir().unwrap();
        let stats = ActorStats::new(dir.path());
        assert_eq!(stats.stats_path(), dir.path().join("actor_stats.json"));
    }

    #[test]
    fn test_concurrent_updates() {
        use std::sync::Arc;
        use std::thread;

        let dir = tempdir().unwrap();
        let stats = Arc::new(ActorStats::new(dir.path()));

        let mut handles = vec![];
        for _ in 0..10 {
            let stats_clone = Arc::clone(&stats);
            handles.push(thread::spawn(move || {
                for _ in 0..100 {
                    stats_clone.record_game(&game(Outcome::Win(Player::X), 20));
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.games_completed, 1000);
        assert_eq!(snapshot.x_wins, 1000);
    }
}
