//! Evaluator trait for position evaluation.
//!
//! The evaluator provides policy (action probabilities) and value estimates
//! for game states. During training this is a neural network; for testing
//! and for the very first iteration a uniform evaluator stands in.

use games_ultimate::{Observation, NUM_ACTIONS};
use thiserror::Error;

/// Errors that can occur during evaluation.
#[derive(Debug, Error)]
pub enum EvaluatorError {
    #[error("Evaluation failed: {0}")]
    EvaluationFailed(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Model error: {0}")]
    ModelError(String),
}

/// Result of evaluating a game state.
#[derive(Debug, Clone)]
pub struct EvalResult {
    /// Policy: probability distribution over the 81 actions.
    /// Index i corresponds to action i. Entries for illegal actions are
    /// ignored by the search.
    pub policy: Vec<f32>,

    /// Value estimate for the player to move.
    /// Range: -1.0 (certain loss) to +1.0 (certain win).
    pub value: f32,
}

/// Trait for position evaluators.
///
/// Implementations must behave as pure functions of the observation and be
/// safe to call from many worker threads at once.
pub trait Evaluator: Send + Sync {
    /// Evaluate a single observation.
    fn evaluate(&self, obs: &Observation) -> Result<EvalResult, EvaluatorError>;

    /// Batch evaluate multiple observations (optional optimization).
    /// Default implementation calls evaluate() in a loop.
    fn evaluate_batch(&self, observations: &[&Observation]) -> Result<Vec<EvalResult>, EvaluatorError> {
        observations.iter().map(|obs| self.evaluate(obs)).collect()
    }
}

/// Uniform evaluator that assigns equal probability to all legal moves.
/// Value is always 0.0 (neutral). Used before any model has been trained.
#[derive(Debug, Clone, Default)]
pub struct UniformEvaluator;

impl UniformEvaluator {
    pub fn new() -> Self {
        Self
    }
}

impl Evaluator for UniformEvaluator {
    fn evaluate(&self, obs: &Observation) -> Result<EvalResult, EvaluatorError> {
        let num_legal = obs.availability.iter().filter(|&&v| v > 0.0).count();
        if num_legal == 0 {
            return Err(EvaluatorError::InvalidState(
                "no legal actions in observation".to_string(),
            ));
        }

        let prob = 1.0 / num_legal as f32;
        let policy = obs
            .availability
            .iter()
            .map(|&v| if v > 0.0 { prob } else { 0.0 })
            .collect();

        Ok(EvalResult { policy, value: 0.0 })
    }
}

/// Check that an evaluator returned one policy entry per action.
pub(crate) fn check_policy_len(result: &EvalResult) -> Result<(), EvaluatorError> {
    if result.policy.len() != NUM_ACTIONS {
        return Err(EvaluatorError::InvalidState(format!(
            "expected {} policy entries, got {}",
            NUM_ACTIONS,
            result.policy.len()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use games_ultimate::{Action, GameState};

    #[test]
    fn test_uniform_evaluator_opening() {
        let evaluator = UniformEvaluator::new();
        let obs = Observation::from_state(&GameState::new());

        let result = evaluator.evaluate(&obs).unwrap();

        assert_eq!(result.policy.len(), NUM_ACTIONS);
        assert!(result.value.abs() < 1e-6);
        for &p in &result.policy {
            assert!((p - 1.0 / 81.0).abs() < 1e-6);
        }
    }

    #[test]
    fn test_uniform_evaluator_restricted() {
        let evaluator = UniformEvaluator::new();
        let state = GameState::new()
            .apply_move(Action::from_coords(0, 0, 1, 1))
            .unwrap();
        let obs = Observation::from_state(&state);

        let result = evaluator.evaluate(&obs).unwrap();

        // O is sent to the centre board: 9 legal cells.
        let sum: f32 = result.policy.iter().sum();
        assert!((sum - 1.0).abs() < 1e-5);
        for action in Action::all() {
            if action.board() == 4 {
                assert!((result.policy[action.index()] - 1.0 / 9.0).abs() < 1e-6);
            } else {
                assert_eq!(result.policy[action.index()], 0.0);
            }
        }
    }

    #[test]
    fn test_uniform_evaluator_rejects_empty() {
        let evaluator = UniformEvaluator::new();
        let mut obs = Observation::from_state(&GameState::new());
        obs.availability = [0.0; NUM_ACTIONS];
        assert!(matches!(
            evaluator.evaluate(&obs),
            Err(EvaluatorError::InvalidState(_))
        ));
    }

    #[test]
    fn test_evaluate_batch_default() {
        let evaluator = UniformEvaluator::new();
        let a = Observation::from_state(&GameState::new());
        let b = Observation::from_state(
            &GameState::new()
                .apply_move(Action::from_coords(0, 0, 0, 0))
                .unwrap(),
        );

        let results = evaluator.evaluate_batch(&[&a, &b]).unwrap();
        assert_eq!(results.len(), 2);
        assert!((results[1].policy[1] - 1.0 / 8.0).abs() < 1e-6);
    }
}
