//! Monte Carlo Tree Search (MCTS) for nested tic-tac-toe, AlphaZero style.
//!
//! # Overview
//!
//! MCTS builds a search tree by running simulations. Each simulation
//! consists of four phases:
//!
//! 1. **Selection**: Traverse the tree using PUCT to balance exploration
//!    and exploitation
//! 2. **Expansion**: When reaching a leaf, expand it by adding children for
//!    each legal action
//! 3. **Evaluation**: Use a policy/value network (or uniform prior for testing)
//!    to estimate the value of the new state
//! 4. **Backpropagation**: Update visit counts and value estimates along the
//!    path from leaf to root
//!
//! Positions that end the game are solved on the spot: a child that wins
//! outright is always preferred, and that knowledge is pushed up the tree.
//!
//! # Usage
//!
//! ```rust
//! use games_ultimate::GameState;
//! use mcts::{MctsConfig, MctsSearch, UniformEvaluator};
//! use rand::SeedableRng;
//! use rand_chacha::ChaCha20Rng;
//!
//! let evaluator = UniformEvaluator::new();
//! let mut search = MctsSearch::new(&evaluator, MctsConfig::for_testing(), GameState::new());
//! let mut rng = ChaCha20Rng::seed_from_u64(42);
//!
//! search.run(&mut rng).unwrap();
//! let choice = search.choose_move(1.0, &mut rng).unwrap();
//! search.advance(choice.action).unwrap();
//!
//! assert_eq!(search.state().occupied_count(), 1);
//! ```
//!
//! # Configuration
//!
//! The [`MctsConfig`] struct controls search behavior:
//!
//! - `num_simulations`: Number of simulations per move (default: 200)
//! - `c_puct`: Exploration constant for PUCT (default: 1.0)
//! - `temperature`: Exponent applied to visit counts when choosing a move
//! - `dirichlet_alpha` / `dirichlet_epsilon`: Optional root noise (off by default)
//!
//! # Evaluators
//!
//! The search requires an [`Evaluator`] to estimate policy and value:
//!
//! - [`UniformEvaluator`]: Returns uniform policy over legal moves
//! - `OnnxEvaluator` (feature `onnx`): Neural network inference via ONNX Runtime

pub mod config;
pub mod evaluator;
pub mod node;
pub mod search;
pub mod tree;

#[cfg(feature = "onnx")]
pub mod onnx;

// Re-export main types
pub use config::MctsConfig;
pub use evaluator::{EvalResult, Evaluator, EvaluatorError, UniformEvaluator};
pub use node::{Edges, MctsNode, NodeId, Proof};
pub use search::{run_mcts, MctsSearch, MoveChoice, SearchError, SearchResult, SearchStats};
pub use tree::{MctsTree, TreeStats};

#[cfg(feature = "onnx")]
pub use onnx::OnnxEvaluator;
