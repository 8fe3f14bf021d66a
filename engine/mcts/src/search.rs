//! MCTS search implementation.
//!
//! Implements the core MCTS algorithm:
//! 1. Selection: Traverse tree using PUCT to find a leaf
//! 2. Expansion: Add children to the leaf using policy prior
//! 3. Evaluation: Get value estimate from evaluator (or the terminal outcome)
//! 4. Backpropagation: Update statistics along the path
//!
//! After a search, [`MctsSearch::choose_move`] turns root visit counts into a
//! move distribution and [`MctsSearch::advance`] re-roots the tree on the
//! chosen child so its statistics carry over to the next move.

use std::time::{Duration, Instant};

use games_ultimate::{Action, GameError, GameState, Observation, NUM_ACTIONS};
use rand::Rng;
use rand_chacha::ChaCha20Rng;
use thiserror::Error;
use tracing::{debug, trace};

use crate::config::MctsConfig;
use crate::evaluator::{check_policy_len, Evaluator, EvaluatorError};
use crate::node::{NodeId, Proof};
use crate::tree::MctsTree;

/// Errors that can occur during MCTS search.
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("Search tree root has not been expanded")]
    TreeNotExpanded,

    #[error("Game has already ended")]
    GameEnded,

    #[error("Evaluator error: {0}")]
    Evaluator(#[from] EvaluatorError),

    #[error("Game error: {0}")]
    Game(#[from] GameError),

    #[error("Illegal action {0}")]
    IllegalAction(Action),
}

/// Counters for one call to [`MctsSearch::search`].
#[derive(Debug, Clone, Default)]
pub struct SearchStats {
    pub simulations: u32,
    pub evaluator_calls: u32,
    pub terminal_hits: u32,
    pub elapsed: Duration,
}

/// A move picked from the root, with everything needed for a training example.
#[derive(Debug, Clone)]
pub struct MoveChoice {
    pub action: Action,
    /// Child node the action leads to (valid until the tree is re-rooted).
    pub node: NodeId,
    /// Distribution the action was sampled from.
    pub policy: [f32; NUM_ACTIONS],
    /// Root priors as stored at expansion.
    pub prior: [f32; NUM_ACTIONS],
    /// Encoded root position.
    pub observation: Observation,
}

/// Result of a single-position search via [`run_mcts`].
#[derive(Debug, Clone)]
pub struct SearchResult {
    /// Action to take
    pub action: Action,

    /// Policy distribution over actions
    pub policy: [f32; NUM_ACTIONS],

    /// Value estimate at root, for the player to move
    pub value: f32,

    /// Number of simulations performed
    pub simulations: u32,
}

/// MCTS search state for one game. Owns its tree; borrows the evaluator.
pub struct MctsSearch<'a, E: Evaluator + ?Sized> {
    tree: MctsTree,
    evaluator: &'a E,
    config: MctsConfig,
    root_noised: bool,
}

impl<'a, E: Evaluator + ?Sized> MctsSearch<'a, E> {
    /// Create a new MCTS search rooted at the given game state.
    pub fn new(evaluator: &'a E, config: MctsConfig, state: GameState) -> Self {
        Self {
            tree: MctsTree::new(state),
            evaluator,
            config,
            root_noised: false,
        }
    }

    /// Get the search tree (for inspection/debugging).
    pub fn tree(&self) -> &MctsTree {
        &self.tree
    }

    pub fn config(&self) -> &MctsConfig {
        &self.config
    }

    /// Game state at the root.
    pub fn state(&self) -> &GameState {
        &self.tree.root_node().state
    }

    /// Run the configured number of simulations.
    pub fn run(&mut self, rng: &mut ChaCha20Rng) -> Result<SearchStats, SearchError> {
        self.search(self.config.num_simulations, rng)
    }

    /// Run `simulations` select/expand/backpropagate cycles from the root.
    pub fn search(&mut self, simulations: u32, rng: &mut ChaCha20Rng) -> Result<SearchStats, SearchError> {
        if self.tree.root_node().is_terminal() {
            return Err(SearchError::GameEnded);
        }

        let start = Instant::now();
        let mut stats = SearchStats::default();

        self.maybe_add_root_noise(rng);
        for _ in 0..simulations {
            self.simulate(rng, &mut stats)?;
            self.maybe_add_root_noise(rng);
        }

        stats.elapsed = start.elapsed();
        debug!(
            simulations = stats.simulations,
            evaluator_calls = stats.evaluator_calls,
            terminal_hits = stats.terminal_hits,
            nodes = self.tree.len(),
            elapsed_us = stats.elapsed.as_micros() as u64,
            "MCTS search complete"
        );
        trace!(tree = ?self.tree.stats(), "search tree");
        Ok(stats)
    }

    /// Run a single simulation (select -> expand -> evaluate -> backpropagate).
    fn simulate(&mut self, rng: &mut ChaCha20Rng, stats: &mut SearchStats) -> Result<(), SearchError> {
        let (leaf_id, depth) = self.select(rng);
        let leaf = self.tree.get(leaf_id);

        let value = if leaf.is_terminal() {
            stats.terminal_hits += 1;
            leaf.terminal_value()
        } else {
            stats.evaluator_calls += 1;
            self.expand_leaf(leaf_id)?
        };

        self.tree.backpropagate(leaf_id, value);
        stats.simulations += 1;

        trace!(leaf = leaf_id.0, depth, value, "MCTS simulation complete");
        Ok(())
    }

    /// Descend from the root by PUCT until reaching a node without children.
    fn select(&self, rng: &mut ChaCha20Rng) -> (NodeId, u32) {
        let mut current = self.tree.root();
        let mut depth = 0;

        while self.tree.get(current).is_expanded() {
            match self.tree.select_child(current, self.config.c_puct, rng) {
                Some(child_id) => {
                    current = child_id;
                    depth += 1;
                }
                None => break,
            }
        }

        (current, depth)
    }

    /// Evaluate a non-terminal leaf once and expand it with the returned
    /// policy. Returns the value for backpropagation.
    fn expand_leaf(&mut self, node_id: NodeId) -> Result<f32, SearchError> {
        let obs = Observation::from_state(&self.tree.get(node_id).state);
        let eval = self.evaluator.evaluate(&obs)?;
        check_policy_len(&eval)?;
        if !eval.value.is_finite() {
            return Err(EvaluatorError::InvalidState(format!(
                "non-finite value {}",
                eval.value
            ))
            .into());
        }

        let mut priors = [0.0f32; NUM_ACTIONS];
        priors.copy_from_slice(&eval.policy);
        self.tree.expand(node_id, priors)?;

        Ok(eval.value)
    }

    fn maybe_add_root_noise(&mut self, rng: &mut ChaCha20Rng) {
        if self.root_noised || !self.config.noise_enabled() || !self.tree.root_node().is_expanded() {
            return;
        }
        self.add_dirichlet_noise(rng);
        self.root_noised = true;
    }

    /// Add Dirichlet noise to root node priors for exploration.
    fn add_dirichlet_noise(&mut self, rng: &mut ChaCha20Rng) {
        let root_id = self.tree.root();
        let children: Vec<(usize, NodeId)> = self.tree.get(root_id).children().collect();
        if children.is_empty() {
            return;
        }

        let noise = dirichlet_noise(children.len(), self.config.dirichlet_alpha, rng);
        let eps = self.config.dirichlet_epsilon;

        for ((action, child_id), n) in children.into_iter().zip(noise) {
            let child = self.tree.get_mut(child_id);
            child.prior = (1.0 - eps) * child.prior + eps * n;
            let prior = child.prior;
            if let Some(edges) = self.tree.get_mut(root_id).edges.as_mut() {
                edges.priors[action] = prior;
            }
        }
    }

    /// Pick a move from the root's visit counts.
    ///
    /// Children proven to win are chosen uniformly among themselves.
    /// Otherwise each child is weighted by `(N / (N_max + 1))^(1 / temperature)`;
    /// if those weights sum to zero or overflow, every child is equally likely.
    pub fn choose_move(&self, temperature: f32, rng: &mut ChaCha20Rng) -> Result<MoveChoice, SearchError> {
        let root = self.tree.root_node();
        if root.is_terminal() {
            return Err(SearchError::GameEnded);
        }
        let edges = root.edges.as_ref().ok_or(SearchError::TreeNotExpanded)?;

        let children: Vec<(usize, u32, Proof)> = edges
            .iter()
            .map(|(a, id)| {
                let child = self.tree.get(id);
                (a, child.visit_count, child.proof)
            })
            .collect();

        let mut policy = [0.0f32; NUM_ACTIONS];
        let winners: Vec<usize> = children
            .iter()
            .filter(|(_, _, proof)| *proof == Proof::Win)
            .map(|(a, _, _)| *a)
            .collect();

        if !winners.is_empty() {
            let p = 1.0 / winners.len() as f32;
            for a in winners {
                policy[a] = p;
            }
        } else {
            let max_visits = children.iter().map(|(_, n, _)| *n).max().unwrap_or(0) as f64;
            let exponent = 1.0 / temperature as f64;
            let weights: Vec<f64> = children
                .iter()
                .map(|(_, n, _)| (*n as f64 / (max_visits + 1.0)).powf(exponent))
                .collect();
            let total: f64 = weights.iter().sum();

            if total > 0.0 && total.is_finite() {
                for ((a, _, _), w) in children.iter().zip(&weights) {
                    policy[*a] = (w / total) as f32;
                }
            } else {
                let p = 1.0 / children.len() as f32;
                for (a, _, _) in &children {
                    policy[*a] = p;
                }
            }
        }

        let index = sample_action(&policy, rng).ok_or(SearchError::TreeNotExpanded)?;
        let action = Action::new(index)?;

        Ok(MoveChoice {
            action,
            node: edges.children[index],
            policy,
            prior: edges.priors,
            observation: Observation::from_state(&root.state),
        })
    }

    /// Play `action` from the root. The matching child's subtree becomes the
    /// new tree; without one, a fresh tree starts from the resulting state.
    pub fn advance(&mut self, action: Action) -> Result<(), SearchError> {
        let root = self.tree.root_node();
        if root.is_terminal() {
            return Err(SearchError::GameEnded);
        }
        if !root.state.is_legal(action) {
            return Err(SearchError::IllegalAction(action));
        }

        match root.child(action) {
            Some(child) => self.tree.reroot(child),
            None => {
                let next = root.state.apply_move(action)?;
                self.tree = MctsTree::new(next);
            }
        }
        self.root_noised = false;
        Ok(())
    }
}

/// Sample an index from a probability distribution.
fn sample_action(policy: &[f32], rng: &mut ChaCha20Rng) -> Option<usize> {
    let r: f32 = rng.gen();
    let mut cumsum = 0.0;

    for (i, &p) in policy.iter().enumerate() {
        cumsum += p;
        if p > 0.0 && r < cumsum {
            return Some(i);
        }
    }

    // Fallback to last non-zero action (handles floating point issues)
    policy.iter().rposition(|&p| p > 0.0)
}

/// Generate Dirichlet-distributed noise using Gamma variates.
fn dirichlet_noise(n: usize, alpha: f32, rng: &mut ChaCha20Rng) -> Vec<f32> {
    use rand_distr::{Distribution, Gamma};

    let Ok(gamma) = Gamma::new(alpha as f64, 1.0) else {
        return vec![1.0 / n as f32; n];
    };
    let mut samples: Vec<f32> = (0..n).map(|_| gamma.sample(rng) as f32).collect();

    // Normalize
    let sum: f32 = samples.iter().sum();
    if sum > 0.0 {
        for s in &mut samples {
            *s /= sum;
        }
    }

    samples
}

/// Convenience function to run a single MCTS search and pick a move.
pub fn run_mcts<E: Evaluator + ?Sized>(
    evaluator: &E,
    config: MctsConfig,
    state: GameState,
    rng: &mut ChaCha20Rng,
) -> Result<SearchResult, SearchError> {
    let temperature = config.temperature;
    let mut search = MctsSearch::new(evaluator, config, state);
    let stats = search.run(rng)?;
    let choice = search.choose_move(temperature, rng)?;

    Ok(SearchResult {
        action: choice.action,
        policy: choice.policy,
        value: search.tree().root_node().mean_value(),
        simulations: stats.simulations,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluator::{EvalResult, UniformEvaluator};
    use games_ultimate::Outcome;
    use rand::SeedableRng;

    /// X to move with three game-winning replies: 9, 11 and 14.
    const X_TO_WIN: [usize; 24] = [
        34, 64, 13, 37, 15, 54, 0, 1, 12, 29, 22, 38, 25, 63, 8, 72, 4, 40, 39, 31, 36, 65, 19, 10,
    ];

    fn act(index: usize) -> Action {
        Action::new(index).unwrap()
    }

    /// Prefers low action indices; value depends on the number of marks.
    struct SkewedEvaluator;

    impl Evaluator for SkewedEvaluator {
        fn evaluate(&self, obs: &Observation) -> Result<EvalResult, EvaluatorError> {
            let mut policy: Vec<f32> = obs
                .availability
                .iter()
                .enumerate()
                .map(|(i, &v)| if v > 0.0 { 1.0 / (1.0 + i as f32) } else { 0.0 })
                .collect();
            let sum: f32 = policy.iter().sum();
            policy.iter_mut().for_each(|p| *p /= sum);
            let marks: f32 = obs.state[..162].iter().sum();
            Ok(EvalResult {
                policy,
                value: (marks / 81.0) - 0.5,
            })
        }
    }

    struct FailingEvaluator;

    impl Evaluator for FailingEvaluator {
        fn evaluate(&self, _obs: &Observation) -> Result<EvalResult, EvaluatorError> {
            Err(EvaluatorError::EvaluationFailed("boom".to_string()))
        }
    }

    struct ShortPolicyEvaluator;

    impl Evaluator for ShortPolicyEvaluator {
        fn evaluate(&self, _obs: &Observation) -> Result<EvalResult, EvaluatorError> {
            Ok(EvalResult {
                policy: vec![1.0; 9],
                value: 0.0,
            })
        }
    }

    fn assert_visit_invariant(tree: &MctsTree) {
        for (i, node) in tree.arena().iter().enumerate() {
            if node.is_expanded() {
                let child_visits: u32 = node.children().map(|(_, id)| tree.get(id).visit_count).sum();
                assert_eq!(
                    node.visit_count,
                    child_visits + 1,
                    "node {i} visits do not match its children"
                );
            }
        }
    }

    #[test]
    fn test_search_from_opening() {
        let evaluator = UniformEvaluator::new();
        let mut search = MctsSearch::new(&evaluator, MctsConfig::for_testing(), GameState::new());
        let mut rng = ChaCha20Rng::seed_from_u64(42);

        let stats = search.search(100, &mut rng).unwrap();
        assert_eq!(stats.simulations, 100);
        assert_eq!(stats.evaluator_calls + stats.terminal_hits, 100);

        let tree = search.tree();
        assert_eq!(tree.root_node().visit_count, 100);
        assert_eq!(tree.root_visits().iter().sum::<u32>(), 99);
        assert_visit_invariant(tree);
    }

    #[test]
    fn test_search_is_deterministic() {
        let evaluator = SkewedEvaluator;
        let state = GameState::from_actions([40, 36, 4]).unwrap();

        let run = |seed: u64| {
            let mut search = MctsSearch::new(&evaluator, MctsConfig::for_testing(), state);
            let mut rng = ChaCha20Rng::seed_from_u64(seed);
            search.search(300, &mut rng).unwrap();
            let choice = search.choose_move(1.0, &mut rng).unwrap();
            (search.tree().root_visits(), choice.action)
        };

        assert_eq!(run(9), run(9));
    }

    #[test]
    fn test_uniform_search_from_empty_board_is_deterministic() {
        let evaluator = UniformEvaluator::new();

        let run = |seed: u64| {
            let mut search = MctsSearch::new(&evaluator, MctsConfig::for_testing(), GameState::new());
            let mut rng = ChaCha20Rng::seed_from_u64(seed);
            search.search(400, &mut rng).unwrap();
            search.tree().root_visits()
        };

        let first = run(21);
        assert_eq!(first, run(21));
        // First simulation expands the root
        assert_eq!(first.iter().sum::<u32>(), 399);
        assert_ne!(first, run(22));
    }

    #[test]
    fn test_choose_move_policy_sums_to_one() {
        let evaluator = SkewedEvaluator;
        let mut search = MctsSearch::new(&evaluator, MctsConfig::for_testing(), GameState::new());
        let mut rng = ChaCha20Rng::seed_from_u64(3);
        search.search(200, &mut rng).unwrap();

        for temperature in [0.1, 0.5, 1.0, 2.0] {
            let choice = search.choose_move(temperature, &mut rng).unwrap();
            let sum: f32 = choice.policy.iter().sum();
            assert!((sum - 1.0).abs() < 1e-4, "T={temperature}: sum {sum}");
            assert!(choice.policy[choice.action.index()] > 0.0);
            assert_eq!(search.tree().get(choice.node).action, Some(choice.action));
        }
    }

    #[test]
    fn test_low_temperature_prefers_most_visited() {
        let evaluator = SkewedEvaluator;
        let mut search = MctsSearch::new(&evaluator, MctsConfig::for_testing(), GameState::new());
        let mut rng = ChaCha20Rng::seed_from_u64(5);
        search.search(300, &mut rng).unwrap();

        let (best, _) = search.tree().best_action().unwrap();
        let choice = search.choose_move(0.05, &mut rng).unwrap();
        let max_p = choice.policy.iter().cloned().fold(0.0f32, f32::max);
        assert!((choice.policy[best.index()] - max_p).abs() < 1e-6);
    }

    #[test]
    fn test_zero_temperature_falls_back_to_uniform() {
        let evaluator = UniformEvaluator::new();
        let mut search = MctsSearch::new(&evaluator, MctsConfig::for_testing(), GameState::new());
        let mut rng = ChaCha20Rng::seed_from_u64(11);
        search.search(50, &mut rng).unwrap();

        let choice = search.choose_move(0.0, &mut rng).unwrap();
        for &p in &choice.policy {
            assert!((p - 1.0 / 81.0).abs() < 1e-6);
        }
    }

    #[test]
    fn test_choose_move_records_prior_and_observation() {
        let evaluator = SkewedEvaluator;
        let state = GameState::from_actions([0]).unwrap();
        let mut search = MctsSearch::new(&evaluator, MctsConfig::for_testing(), state);
        let mut rng = ChaCha20Rng::seed_from_u64(2);
        search.search(20, &mut rng).unwrap();

        let choice = search.choose_move(1.0, &mut rng).unwrap();
        let expected = evaluator.evaluate(&Observation::from_state(&state)).unwrap();
        for a in 0..NUM_ACTIONS {
            assert!((choice.prior[a] - expected.policy[a]).abs() < 1e-6);
        }
        assert_eq!(choice.observation, Observation::from_state(&state));
    }

    #[test]
    fn test_proven_win_is_chosen() {
        let evaluator = UniformEvaluator::new();
        let state = GameState::from_actions(X_TO_WIN).unwrap();
        let mut search = MctsSearch::new(&evaluator, MctsConfig::for_testing(), state);
        let mut rng = ChaCha20Rng::seed_from_u64(42);
        search.search(30, &mut rng).unwrap();

        for _ in 0..10 {
            let choice = search.choose_move(1.0, &mut rng).unwrap();
            assert!([9, 11, 14].contains(&choice.action.index()));
            for a in [9, 11, 14] {
                assert!((choice.policy[a] - 1.0 / 3.0).abs() < 1e-6);
            }
            assert_eq!(choice.policy[16], 0.0);
        }

        // Every simulation after the first lands on a winning terminal.
        let visits = search.tree().root_visits();
        assert_eq!(visits[9] + visits[11] + visits[14], 29);
        assert!(search.tree().root_node().mean_value() > 0.9);
        assert_visit_invariant(search.tree());
    }

    #[test]
    fn test_choose_move_before_search() {
        let evaluator = UniformEvaluator::new();
        let search = MctsSearch::new(&evaluator, MctsConfig::for_testing(), GameState::new());
        let mut rng = ChaCha20Rng::seed_from_u64(0);
        assert!(matches!(
            search.choose_move(1.0, &mut rng),
            Err(SearchError::TreeNotExpanded)
        ));
    }

    #[test]
    fn test_terminal_root() {
        let evaluator = UniformEvaluator::new();
        let mut state = GameState::from_actions(X_TO_WIN).unwrap();
        state = state.apply_move(act(9)).unwrap();
        assert_eq!(state.outcome(), Outcome::Win(games_ultimate::Player::X));

        let mut search = MctsSearch::new(&evaluator, MctsConfig::for_testing(), state);
        let mut rng = ChaCha20Rng::seed_from_u64(0);
        assert!(matches!(search.search(10, &mut rng), Err(SearchError::GameEnded)));
        assert!(matches!(search.choose_move(1.0, &mut rng), Err(SearchError::GameEnded)));
        assert!(matches!(search.advance(act(16)), Err(SearchError::GameEnded)));
    }

    #[test]
    fn test_advance_keeps_subtree() {
        let evaluator = UniformEvaluator::new();
        let mut search = MctsSearch::new(&evaluator, MctsConfig::for_testing(), GameState::new());
        let mut rng = ChaCha20Rng::seed_from_u64(8);
        search.search(400, &mut rng).unwrap();

        let choice = search.choose_move(1.0, &mut rng).unwrap();
        let child_visits = search.tree().get(choice.node).visit_count;
        let expected_state = GameState::new().apply_move(choice.action).unwrap();
        let nodes_before = search.tree().len();

        search.advance(choice.action).unwrap();

        let root = search.tree().root_node();
        assert_eq!(root.state, expected_state);
        assert!(root.parent.is_none());
        assert_eq!(root.visit_count, child_visits);
        assert_eq!(*search.state(), expected_state);
        assert_visit_invariant(search.tree());
        assert!(search.tree().len() < nodes_before);
    }

    #[test]
    fn test_advance_without_search() {
        let evaluator = UniformEvaluator::new();
        let mut search = MctsSearch::new(&evaluator, MctsConfig::for_testing(), GameState::new());
        search.advance(act(0)).unwrap();
        assert_eq!(search.tree().len(), 1);
        assert_eq!(*search.state(), GameState::from_actions([0]).unwrap());
    }

    #[test]
    fn test_advance_illegal_action() {
        let evaluator = UniformEvaluator::new();
        let mut search = MctsSearch::new(&evaluator, MctsConfig::for_testing(), GameState::new());
        let mut rng = ChaCha20Rng::seed_from_u64(1);
        search.advance(act(0)).unwrap();
        search.search(10, &mut rng).unwrap();

        match search.advance(act(27)) {
            Err(SearchError::IllegalAction(a)) => assert_eq!(a, act(27)),
            other => panic!("expected IllegalAction, got {other:?}"),
        }
    }

    #[test]
    fn test_evaluator_errors_propagate() {
        let mut rng = ChaCha20Rng::seed_from_u64(0);

        let failing = FailingEvaluator;
        let mut search = MctsSearch::new(&failing, MctsConfig::for_testing(), GameState::new());
        assert!(matches!(
            search.search(5, &mut rng),
            Err(SearchError::Evaluator(EvaluatorError::EvaluationFailed(_)))
        ));

        let short = ShortPolicyEvaluator;
        let mut search = MctsSearch::new(&short, MctsConfig::for_testing(), GameState::new());
        assert!(matches!(
            search.search(5, &mut rng),
            Err(SearchError::Evaluator(EvaluatorError::InvalidState(_)))
        ));
    }

    #[test]
    fn test_dirichlet_noise_changes_root_priors() {
        let evaluator = UniformEvaluator::new();
        let config = MctsConfig::for_testing().with_dirichlet(0.3, 0.25);
        let mut search = MctsSearch::new(&evaluator, config, GameState::new());
        let mut rng = ChaCha20Rng::seed_from_u64(4);
        search.search(10, &mut rng).unwrap();

        let edges = search.tree().root_node().edges.as_ref().unwrap();
        let sum: f32 = edges.priors.iter().sum();
        assert!((sum - 1.0).abs() < 1e-4);
        assert!(edges.priors.iter().any(|&p| (p - 1.0 / 81.0).abs() > 1e-4));
        for (a, id) in edges.iter() {
            assert!((search.tree().get(id).prior - edges.priors[a]).abs() < 1e-6);
        }
    }

    #[test]
    fn test_self_play_game_terminates() {
        let evaluator = UniformEvaluator::new();
        let mut search = MctsSearch::new(&evaluator, MctsConfig::for_testing(), GameState::new());
        let mut rng = ChaCha20Rng::seed_from_u64(21);

        let mut plies = 0;
        while !search.state().is_terminal() {
            search.search(20, &mut rng).unwrap();
            let choice = search.choose_move(1.0, &mut rng).unwrap();
            search.advance(choice.action).unwrap();
            assert_visit_invariant(search.tree());
            plies += 1;
        }

        assert!(plies <= NUM_ACTIONS);
        assert_eq!(search.state().occupied_count(), plies);
    }

    #[test]
    fn test_run_mcts() {
        let evaluator = UniformEvaluator::new();
        let mut rng = ChaCha20Rng::seed_from_u64(42);
        let result = run_mcts(&evaluator, MctsConfig::for_testing(), GameState::new(), &mut rng).unwrap();

        assert_eq!(result.simulations, 50);
        let sum: f32 = result.policy.iter().sum();
        assert!((sum - 1.0).abs() < 0.01);
        assert!(GameState::new().is_legal(result.action));
    }

    #[test]
    fn test_sample_action() {
        let mut rng = ChaCha20Rng::seed_from_u64(42);
        let policy = vec![0.0, 0.5, 0.3, 0.2, 0.0];

        // Sample many times and check distribution
        let mut counts = [0u32; 5];
        for _ in 0..1000 {
            let action = sample_action(&policy, &mut rng).unwrap();
            counts[action] += 1;
        }

        // Action 0 and 4 should never be selected
        assert_eq!(counts[0], 0);
        assert_eq!(counts[4], 0);

        // Action 1 should be most common (~500), action 2 (~300), action 3 (~200)
        assert!(counts[1] > counts[2]);
        assert!(counts[2] > counts[3]);

        assert_eq!(sample_action(&[0.0; 3], &mut rng), None);
    }

    #[test]
    fn test_dirichlet_noise() {
        let mut rng = ChaCha20Rng::seed_from_u64(42);
        let noise = dirichlet_noise(5, 0.3, &mut rng);

        // Should sum to 1.0
        let sum: f32 = noise.iter().sum();
        assert!((sum - 1.0).abs() < 0.01);

        // All values should be positive
        for &n in &noise {
            assert!(n >= 0.0);
        }
    }
}
