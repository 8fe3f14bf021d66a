//! Nested ("ultimate") tic-tac-toe rules engine
//!
//! The board is a 3x3 grid of ordinary 3x3 tic-tac-toe boards. The cell a
//! player marks inside a sub-board decides which sub-board the opponent must
//! play in next; winning three sub-boards in a row wins the game.
//!
//! # Usage
//!
//! ```rust
//! use games_ultimate::{Action, GameState, Outcome};
//!
//! let state = GameState::new();
//! assert_eq!(state.legal_actions().len(), 81);
//!
//! // X plays the top-left cell of the top-left board; O is sent back there.
//! let state = state.apply_move(Action::from_coords(0, 0, 0, 0)).unwrap();
//! assert_eq!(state.legal_actions().len(), 8);
//! assert_eq!(state.outcome(), Outcome::InProgress);
//! ```
//!
//! States are small `Copy` values: every move produces a new state and never
//! mutates one that another holder can see, so search code can branch freely.

mod action;
mod error;
mod grid;
mod observation;
mod render;
mod state;

pub use action::{Action, NUM_ACTIONS, NUM_BOARDS};
pub use error::{GameError, IllegalMoveReason};
pub use grid::{has_three_in_a_row, LINES};
pub use observation::{Observation, AVAILABILITY_SIZE, STATE_SIZE};
pub use state::{BoardStatus, GameState, Outcome, Player};
