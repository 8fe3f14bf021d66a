//! Actor - Self-play runner for nested tic-tac-toe
//!
//! A long-running process that, once per iteration:
//! 1. Loads `./data/models/latest.onnx` (or plays with uniform priors)
//! 2. Plays a batch of MCTS self-play games on parallel workers
//! 3. Saves the batch to `./data/replay.db` (SQLite) for the trainer
//! 4. Every few iterations, plays the latest model against an older
//!    checkpoint and updates the Elo history in the training log

use anyhow::Result;
use clap::Parser;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info};

mod actor;
mod config;
mod evaluation;
mod models;
mod pool;
mod selfplay;
mod stats;
mod storage;
mod training_log;

use crate::actor::Actor;
use crate::config::Config;

fn init_tracing(level: &str) -> Result<()> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    eprintln!("Actor service starting...");

    // Parse configuration
    let config = Config::parse();
    eprintln!("Configuration parsed successfully");

    // Validate configuration
    config.validate()?;
    eprintln!("Configuration validated successfully");

    // Initialize tracing
    init_tracing(&config.log_level)?;
    info!(log_level = %config.log_level, "Tracing initialized");

    info!(
        iterations = config.iterations,
        games_per_iteration = config.games_per_iteration,
        eval_interval = config.eval_interval,
        "Actor will run up to iteration {}",
        config.iterations
    );

    // Create actor instance
    let actor = Actor::new(config).await?;
    let actor = Arc::new(actor);

    // Setup graceful shutdown
    let shutdown_actor = Arc::clone(&actor);
    let shutdown_handle = tokio::spawn(async move {
        match signal::ctrl_c().await {
            Ok(()) => {
                info!("Shutdown signal received, stopping actor...");
                shutdown_actor.shutdown();
            }
            Err(e) => error!("Failed to listen for ctrl+c: {}", e),
        }
    });

    // Run the actor
    let run_result = actor.run().await;

    shutdown_handle.abort();

    match run_result {
        Ok(_) => {
            info!("Actor completed successfully");
            Ok(())
        }
        Err(e) => {
            error!("Actor failed: {}", e);
            Err(e)
        }
    }
}
