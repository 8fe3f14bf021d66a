//! Matches between the current model and an older checkpoint, and the Elo
//! ratings they feed.

use games_ultimate::{GameState, Outcome, Player};
use mcts::{run_mcts, Evaluator, MctsConfig, SearchError};
use rand_chacha::ChaCha20Rng;
use serde::{Deserialize, Serialize};
use tracing::info;

/// One evaluation game, scored from the current model's side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EvalGame {
    /// 1-based game number within the match.
    pub game: u32,
    pub outcome: Outcome,
    pub plies: u32,
    pub model_player: Player,
}

impl EvalGame {
    /// 1 for a win of the current model, 0.5 for a draw, 0 for a loss.
    pub fn score(&self) -> f64 {
        match self.outcome {
            Outcome::Win(p) if p == self.model_player => 1.0,
            Outcome::Win(_) => 0.0,
            Outcome::Draw | Outcome::InProgress => 0.5,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct MatchResult {
    pub games: Vec<EvalGame>,
}

impl MatchResult {
    pub fn player_score(&self) -> f64 {
        self.games.iter().map(EvalGame::score).sum()
    }

    pub fn opponent_score(&self) -> f64 {
        self.games.len() as f64 - self.player_score()
    }
}

/// Current and opponent rating after every evaluation, oldest first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EloHistory {
    pub player: Vec<f64>,
    pub opponent: Vec<f64>,
}

impl EloHistory {
    pub fn new(initial: f64) -> Self {
        Self {
            player: vec![initial],
            opponent: vec![initial],
        }
    }

    /// Latest (player, opponent) ratings.
    pub fn current(&self) -> (f64, f64) {
        (
            self.player.last().copied().unwrap_or_default(),
            self.opponent.last().copied().unwrap_or_default(),
        )
    }

    /// Append the ratings implied by `result`.
    pub fn record(&mut self, result: &MatchResult, k: f64) -> (f64, f64) {
        let (ra, rb) = self.current();
        let (ra, rb) = update_elo(
            ra,
            rb,
            result.player_score(),
            result.opponent_score(),
            result.games.len() as u32,
            k,
        );
        self.player.push(ra);
        self.opponent.push(rb);
        (ra, rb)
    }
}

/// Logistic expected score of a player rated `ra` against one rated `rb`.
pub fn expected_score(ra: f64, rb: f64) -> f64 {
    1.0 / (1.0 + 10f64.powf((rb - ra) / 400.0))
}

/// `R' = R + K (S - N E)` for both sides.
pub fn update_elo(
    ra: f64,
    rb: f64,
    player_score: f64,
    opponent_score: f64,
    games: u32,
    k: f64,
) -> (f64, f64) {
    let n = games as f64;
    let ea = expected_score(ra, rb);
    let eb = expected_score(rb, ra);
    (
        ra + k * (player_score - n * ea),
        rb + k * (opponent_score - n * eb),
    )
}

/// Play one game where every move comes from a fresh search owned by the
/// side to move.
pub fn play_eval_game(
    current: &dyn Evaluator,
    opponent: &dyn Evaluator,
    model_player: Player,
    config: &MctsConfig,
    rng: &mut ChaCha20Rng,
) -> Result<(Outcome, u32), SearchError> {
    let mut state = GameState::new();
    let mut plies = 0;

    while !state.is_terminal() {
        let evaluator = if state.side_to_move() == model_player {
            current
        } else {
            opponent
        };
        let result = run_mcts(evaluator, config.clone(), state, rng)?;
        state = state.apply_move(result.action)?;
        plies += 1;
    }

    Ok((state.outcome(), plies))
}

/// Play `games` games, the current model taking X in odd-numbered games.
pub fn play_match(
    current: &dyn Evaluator,
    opponent: &dyn Evaluator,
    games: u32,
    config: &MctsConfig,
    rng: &mut ChaCha20Rng,
) -> Result<MatchResult, SearchError> {
    let mut result = MatchResult::default();

    for game in 1..=games {
        let model_player = if game % 2 == 1 { Player::X } else { Player::O };
        let (outcome, plies) = play_eval_game(current, opponent, model_player, config, rng)?;
        let record = EvalGame {
            game,
            outcome,
            plies,
            model_player,
        };
        info!(
            game,
            winner = %outcome,
            plies,
            model_plays = %model_player,
            "Evaluation game finished"
        );
        result.games.push(record);
    }

    Ok(result)
}
