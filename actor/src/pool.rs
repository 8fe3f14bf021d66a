//! Parallel self-play for one iteration.
//!
//! Each worker is a blocking task that owns its game and search tree and
//! reports finished games over a bounded channel. The coordinator accepts
//! games in game-id order, so the batch is the same whichever worker finishes
//! first. Once the batch is full it raises the cancel flag and returns
//! without waiting; games still in flight are dropped by their workers at
//! the next move boundary.

use std::collections::BTreeMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use indicatif::ProgressBar;
use mcts::Evaluator;
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use thiserror::Error;
use tokio::sync::{mpsc, watch};
use tracing::{debug, trace, warn};

use crate::selfplay::{play_game, GameRecord, GameSettings};

/// A worker could not finish a game. Aborts the whole round.
#[derive(Debug, Clone, Error)]
#[error("self-play worker {worker} failed: {message}")]
pub struct GameFailure {
    pub worker: usize,
    pub message: String,
}

#[derive(Debug, Error)]
pub enum RoundError {
    #[error(transparent)]
    Worker(#[from] GameFailure),

    #[error("self-play interrupted after {collected} of {target} games")]
    Interrupted { collected: usize, target: usize },
}

/// Sizing and seeding of one round.
#[derive(Debug, Clone)]
pub struct RoundConfig {
    pub games: usize,
    pub num_workers: usize,
    pub include_draws: bool,
    /// Every game gets its own ChaCha stream of this seed.
    pub seed: u64,
}

/// Games accepted for training plus what was thrown away.
#[derive(Debug, Default)]
pub struct RoundOutcome {
    pub games: Vec<GameRecord>,
    /// Games consumed in id order (accepted plus skipped).
    pub finished: u32,
    pub skipped_draws: u32,
}

/// Game id plus what became of it.
type WorkerMessage = (u64, Result<GameRecord, GameFailure>);

/// Play games on `num_workers` workers until `games` have been accepted.
///
/// Games are taken in id order: game `g` is only considered once every lower
/// id has been accepted or skipped, so the batch depends on the seed alone.
/// Drawn games count toward `finished` but are only accepted with
/// `include_draws`. The first worker failure ends the round with an error.
/// Raising `shutdown` ends it with [`RoundError::Interrupted`].
pub async fn run_round(
    evaluator: Arc<dyn Evaluator>,
    settings: GameSettings,
    round: &RoundConfig,
    mut shutdown: watch::Receiver<bool>,
    progress: Option<ProgressBar>,
) -> Result<RoundOutcome, RoundError> {
    let mut outcome = RoundOutcome::default();
    if round.games == 0 {
        return Ok(outcome);
    }

    let cancel = Arc::new(AtomicBool::new(false));
    let next_game = Arc::new(AtomicU64::new(0));
    let (tx, mut rx) = mpsc::channel::<WorkerMessage>(round.num_workers.max(1));

    for worker in 0..round.num_workers.max(1) {
        let tx = tx.clone();
        let evaluator = Arc::clone(&evaluator);
        let settings = settings.clone();
        let cancel = Arc::clone(&cancel);
        let next_game = Arc::clone(&next_game);
        let seed = round.seed;

        tokio::task::spawn_blocking(move || {
            while !cancel.load(Ordering::Relaxed) {
                let game = next_game.fetch_add(1, Ordering::Relaxed);
                let mut rng = ChaCha20Rng::seed_from_u64(seed);
                rng.set_stream(game);

                let played = catch_unwind(AssertUnwindSafe(|| {
                    play_game(evaluator.as_ref(), &settings, &mut rng, &cancel)
                }));
                let message = match played {
                    Ok(Ok(Some(record))) => Ok(record),
                    Ok(Ok(None)) => break,
                    Ok(Err(e)) => Err(GameFailure {
                        worker,
                        message: e.to_string(),
                    }),
                    Err(_) => Err(GameFailure {
                        worker,
                        message: format!("panicked during game {}", game),
                    }),
                };

                let failed = message.is_err();
                if tx.blocking_send((game, message)).is_err() || failed {
                    break;
                }
            }
            trace!(worker, "self-play worker exiting");
        });
    }
    drop(tx);

    // Finished games waiting for a lower id
    let mut pending: BTreeMap<u64, GameRecord> = BTreeMap::new();
    let mut next_game_id = 0u64;

    let result = loop {
        tokio::select! {
            biased;

            Ok(_) = shutdown.wait_for(|&stop| stop) => {
                break Err(RoundError::Interrupted {
                    collected: outcome.games.len(),
                    target: round.games,
                });
            }

            message = rx.recv() => match message {
                Some((game, Ok(record))) => {
                    pending.insert(game, record);
                    while let Some(record) = pending.remove(&next_game_id) {
                        next_game_id += 1;
                        outcome.finished += 1;
                        if record.is_draw() && !round.include_draws {
                            outcome.skipped_draws += 1;
                            debug!(
                                game = next_game_id - 1,
                                plies = record.plies,
                                "drawn game skipped from training"
                            );
                            continue;
                        }

                        debug!(
                            game = next_game_id - 1,
                            outcome = %record.outcome,
                            plies = record.plies,
                            "game accepted"
                        );
                        outcome.games.push(record);
                        if let Some(ref pb) = progress {
                            pb.inc(1);
                        }
                        if outcome.games.len() >= round.games {
                            break;
                        }
                    }
                    if outcome.games.len() >= round.games {
                        break Ok(());
                    }
                    trace!(buffered = pending.len(), waiting_for = next_game_id, "game buffered");
                }
                Some((game, Err(failure))) => {
                    warn!(game, worker = failure.worker, error = %failure.message, "aborting round");
                    break Err(RoundError::Worker(failure));
                }
                None => {
                    break Err(RoundError::Interrupted {
                        collected: outcome.games.len(),
                        target: round.games,
                    });
                }
            },
        }
    };

    cancel.store(true, Ordering::Relaxed);
    result.map(|()| outcome)
}
