//! Iteration loop: self-play, hand-off to the trainer, evaluation.

use anyhow::{anyhow, Result};
use indicatif::{ProgressBar, ProgressStyle};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::evaluation::play_match;
use crate::models::ModelStore;
use crate::pool::{run_round, RoundError};
use crate::selfplay::TrainingBatch;
use crate::stats::ActorStats;
use crate::storage::{create_replay_store, GameMetadata, ReplayStore};
use crate::training_log::{EvaluationRecord, IterationSummary, TrainingLog};

pub struct Actor {
    config: Config,
    replay: Arc<dyn ReplayStore>,
    models: ModelStore,
    stats: ActorStats,
    /// Base seed; iteration seeds are derived from it.
    seed: u64,
    shutdown_signal: watch::Sender<bool>,
}

impl Actor {
    pub async fn new(config: Config) -> Result<Self> {
        let replay = create_replay_store(&config.replay_db_path)?;
        info!(path = %config.replay_db_path, "Replay buffer initialized (SQLite)");

        // Self-describing database for the trainer
        let metadata = GameMetadata::ultimate();
        replay.store_metadata(&metadata).await?;
        info!(
            "Stored game metadata: {} actions, state_size={}, availability_size={}",
            metadata.num_actions, metadata.state_size, metadata.availability_size
        );

        let models = ModelStore::new(&config.models_dir, config.onnx_intra_threads);
        let stats = ActorStats::new(&config.data_dir);
        info!(
            models = %models.dir().display(),
            stats = %stats.stats_path().display(),
            "Model and stats locations"
        );

        let seed = if config.seed == 0 {
            rand::thread_rng().gen()
        } else {
            config.seed
        };
        info!(seed, "Self-play seed");

        let (shutdown_signal, _) = watch::channel(false);

        Ok(Self {
            config,
            replay: Arc::from(replay),
            models,
            stats,
            seed,
            shutdown_signal,
        })
    }

    pub async fn run(&self) -> Result<()> {
        let log_path = self.config.training_log_path();
        let mut log = TrainingLog::load_or_new(&log_path, self.config.initial_elo)?;

        let first = log.next_iteration();
        if first > self.config.iterations {
            info!(
                completed = log.iteration,
                target = self.config.iterations,
                "All iterations already completed"
            );
            return Ok(());
        }

        info!(
            first,
            last = self.config.iterations,
            games_per_iteration = self.config.games_per_iteration,
            workers = self.config.num_workers,
            simulations = self.config.num_simulations,
            "Actor starting main loop"
        );

        for iteration in first..=self.config.iterations {
            if self.is_shutdown() {
                info!("Shutdown signal received, stopping actor");
                break;
            }

            let summary = match self.run_iteration(iteration).await {
                Ok(summary) => summary,
                Err(e) if self.is_shutdown() => {
                    info!(iteration, "Iteration interrupted: {}", e);
                    break;
                }
                Err(e) => return Err(e),
            };
            log.training.push(summary);

            if self.config.evaluation_due(iteration) {
                if let Some(opponent) = self.config.opponent_iteration(iteration) {
                    self.evaluate(iteration, opponent, &mut log).await?;
                }
                self.models.snapshot(iteration)?;
            }

            log.iteration = iteration;
            log.save(&log_path)?;
            self.stats.record_iteration();
            self.stats.write_stats();
        }

        info!(iteration = log.iteration, "Actor stopped");
        Ok(())
    }

    pub fn shutdown(&self) {
        self.shutdown_signal.send_replace(true);
        info!("Shutdown signal set");
    }

    fn is_shutdown(&self) -> bool {
        *self.shutdown_signal.borrow()
    }

    fn iteration_seed(&self, iteration: u32) -> u64 {
        ChaCha20Rng::seed_from_u64(self.seed ^ ((iteration as u64) << 32)).gen()
    }

    /// Play one batch of games and hand it to the trainer.
    async fn run_iteration(&self, iteration: u32) -> Result<IterationSummary> {
        let started = Instant::now();

        // Rows left by a run that stopped before its log was saved
        let stale = self.replay.remove_iteration(iteration).await?;
        if stale > 0 {
            warn!(iteration, rows = stale, "Removed examples from an unfinished iteration");
        }

        let model = self.models.load_latest()?;
        info!(iteration, model = %model.source, "Starting iteration");

        let progress = self.progress_bar(iteration);
        let round = run_round(
            Arc::clone(&model.evaluator),
            self.config.game_settings(),
            &self.config.round_config(self.iteration_seed(iteration)),
            self.shutdown_signal.subscribe(),
            progress.clone(),
        )
        .await;
        if let Some(pb) = progress {
            pb.finish_and_clear();
        }

        let round = match round {
            Ok(round) => round,
            Err(RoundError::Worker(failure)) => {
                return Err(anyhow!("iteration {} aborted: {}", iteration, failure));
            }
            Err(e @ RoundError::Interrupted { .. }) => return Err(e.into()),
        };

        for game in &round.games {
            self.stats.record_game(game);
        }
        self.stats.record_skipped_draws(round.skipped_draws);

        let batch = TrainingBatch::new(iteration, round.games);
        let rows = self.replay.store_batch(&batch).await?;

        let (x_wins, o_wins, draws) = batch.results();
        let plies: u32 = batch.games.iter().map(|g| g.plies).sum();
        let summary = IterationSummary {
            iteration,
            games: batch.games.len() as u32,
            examples: rows as u32,
            x_wins,
            o_wins,
            draws,
            skipped_draws: round.skipped_draws,
            avg_plies: plies as f64 / batch.games.len().max(1) as f64,
            elapsed_secs: started.elapsed().as_secs_f64(),
            model: model.source.to_string(),
        };

        info!(
            iteration,
            games = summary.games,
            examples = summary.examples,
            x_wins,
            o_wins,
            draws,
            skipped_draws = summary.skipped_draws,
            finished = round.finished,
            elapsed = format!("{:.1}s", summary.elapsed_secs),
            "Training batch handed off"
        );
        Ok(summary)
    }

    /// Play the latest model against the checkpoint from `opponent` and
    /// update the Elo pair.
    async fn evaluate(&self, iteration: u32, opponent: u32, log: &mut TrainingLog) -> Result<()> {
        let current = self.models.load_latest()?;
        let old = self.models.load_iteration(opponent)?;
        info!(
            iteration,
            opponent_iteration = opponent,
            current = %current.source,
            opponent = %old.source,
            games = self.config.eval_games,
            "Evaluating the model"
        );

        let games = self.config.eval_games;
        let config = self.config.eval_mcts_config();
        let mut rng = ChaCha20Rng::seed_from_u64(self.iteration_seed(iteration) ^ 0xE7A1);
        let result = tokio::task::spawn_blocking(move || {
            play_match(
                current.evaluator.as_ref(),
                old.evaluator.as_ref(),
                games,
                &config,
                &mut rng,
            )
        })
        .await??;

        for game in &result.games {
            log.evaluation
                .push(EvaluationRecord::new(iteration, opponent, game));
        }

        let (before_a, before_b) = log.elo.current();
        let (ra, rb) = log.elo.record(&result, self.config.elo_k);
        info!(
            iteration,
            score = result.player_score(),
            games = result.games.len(),
            elo = format!("{:.1}", ra),
            opponent_elo = format!("{:.1}", rb),
            "Evaluation done"
        );
        debug!(
            delta = ra - before_a,
            opponent_delta = rb - before_b,
            "Elo change"
        );
        Ok(())
    }

    /// Progress bar for the current batch (only when stderr is a TTY)
    fn progress_bar(&self, iteration: u32) -> Option<ProgressBar> {
        if !std::io::IsTerminal::is_terminal(&std::io::stderr()) {
            return None;
        }

        let pb = ProgressBar::new(self.config.games_per_iteration as u64);
        match ProgressStyle::default_bar()
            .template("{spinner:.green} iteration {prefix} [{bar:40.cyan/blue}] {pos}/{len} games ({eta})")
        {
            Ok(style) => pb.set_style(style.progress_chars("#>-")),
            Err(e) => warn!("Invalid progress bar template: {}", e),
        }
        pb.set_prefix(iteration.to_string());
        Some(pb)
    }
}
