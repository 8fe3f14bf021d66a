//! Single self-play game and the training data it produces.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use games_ultimate::{GameState, Observation, Outcome, Player, NUM_ACTIONS};
use mcts::{Evaluator, MctsConfig, MctsSearch, SearchError, SearchStats};
use rand_chacha::ChaCha20Rng;
use tracing::trace;

/// Search settings for one self-play game.
#[derive(Debug, Clone)]
pub struct GameSettings {
    pub mcts: MctsConfig,
    /// Ply from which `late_temperature` is used (0 = never).
    pub temp_threshold: u32,
    pub late_temperature: f32,
}

impl GameSettings {
    pub fn new(mcts: MctsConfig) -> Self {
        let late_temperature = mcts.temperature;
        Self {
            mcts,
            temp_threshold: 0,
            late_temperature,
        }
    }

    pub fn with_temp_schedule(mut self, threshold: u32, late_temperature: f32) -> Self {
        self.temp_threshold = threshold;
        self.late_temperature = late_temperature;
        self
    }

    pub fn temperature_at(&self, ply: u32) -> f32 {
        if self.temp_threshold > 0 && ply >= self.temp_threshold {
            self.late_temperature
        } else {
            self.mcts.temperature
        }
    }
}

/// One ply of a finished game.
#[derive(Debug, Clone)]
pub struct TrainingExample {
    pub ply: u32,
    pub observation: Observation,
    /// Distribution the move was sampled from.
    pub policy: [f32; NUM_ACTIONS],
    /// Final outcome from the point of view of the player who moved at this ply.
    pub value: f32,
}

/// Search work done over a whole game.
#[derive(Debug, Clone, Copy, Default)]
pub struct SearchTotals {
    pub searches: u32,
    pub simulations: u64,
    pub evaluator_calls: u64,
    pub terminal_hits: u64,
    pub elapsed: Duration,
}

impl SearchTotals {
    fn add(&mut self, stats: &SearchStats) {
        self.searches += 1;
        self.simulations += stats.simulations as u64;
        self.evaluator_calls += stats.evaluator_calls as u64;
        self.terminal_hits += stats.terminal_hits as u64;
        self.elapsed += stats.elapsed;
    }
}

/// A completed self-play game.
#[derive(Debug, Clone)]
pub struct GameRecord {
    pub outcome: Outcome,
    pub plies: u32,
    pub examples: Vec<TrainingExample>,
    pub search: SearchTotals,
}

impl GameRecord {
    #[inline]
    pub fn is_draw(&self) -> bool {
        self.outcome == Outcome::Draw
    }
}

/// Play one game from the empty board to a terminal state.
///
/// The search tree is re-rooted after every move, so statistics gathered for
/// the chosen reply carry over. Returns `Ok(None)` when `cancel` is raised
/// before the game ends; the partial game is dropped.
pub fn play_game<E: Evaluator + ?Sized>(
    evaluator: &E,
    settings: &GameSettings,
    rng: &mut ChaCha20Rng,
    cancel: &AtomicBool,
) -> Result<Option<GameRecord>, SearchError> {
    let mut search = MctsSearch::new(evaluator, settings.mcts.clone(), GameState::new());
    let mut moves: Vec<(Player, Observation, [f32; NUM_ACTIONS])> = Vec::with_capacity(NUM_ACTIONS);
    let mut totals = SearchTotals::default();
    let mut ply = 0u32;

    while !search.state().is_terminal() {
        if cancel.load(Ordering::Relaxed) {
            trace!(ply, "game cancelled");
            return Ok(None);
        }

        let stats = search.run(rng)?;
        totals.add(&stats);

        let mover = search.state().side_to_move();
        let choice = search.choose_move(settings.temperature_at(ply), rng)?;
        trace!(ply, action = %choice.action, player = %mover, "move");

        moves.push((mover, choice.observation, choice.policy));
        search.advance(choice.action)?;
        ply += 1;
    }

    let outcome = search.state().outcome();
    let examples = moves
        .into_iter()
        .enumerate()
        .map(|(i, (mover, observation, policy))| TrainingExample {
            ply: i as u32,
            observation,
            policy,
            value: outcome.value_for(mover),
        })
        .collect();

    Ok(Some(GameRecord {
        outcome,
        plies: ply,
        examples,
        search: totals,
    }))
}

/// Games accepted for one iteration, handed to the trainer as a unit.
#[derive(Debug, Clone, Default)]
pub struct TrainingBatch {
    pub iteration: u32,
    pub games: Vec<GameRecord>,
}

impl TrainingBatch {
    pub fn new(iteration: u32, games: Vec<GameRecord>) -> Self {
        Self { iteration, games }
    }

    pub fn num_examples(&self) -> usize {
        self.games.iter().map(|g| g.examples.len()).sum()
    }

    /// Examples tagged with the index of the game they came from.
    pub fn examples(&self) -> impl Iterator<Item = (usize, &TrainingExample)> {
        self.games
            .iter()
            .enumerate()
            .flat_map(|(game, record)| record.examples.iter().map(move |e| (game, e)))
    }

    /// Wins for X, wins for O, draws.
    pub fn results(&self) -> (u32, u32, u32) {
        self.games
            .iter()
            .fold((0, 0, 0), |(x, o, d), g| match g.outcome {
                Outcome::Win(Player::X) => (x + 1, o, d),
                Outcome::Win(Player::O) => (x, o + 1, d),
                _ => (x, o, d + 1),
            })
    }
}
