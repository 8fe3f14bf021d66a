//! Rules-engine errors.
//!
//! Both variants are contract violations on the caller's side: legality can
//! always be checked with [`GameState::legal_actions`](crate::GameState::legal_actions)
//! before a move is applied.

use std::fmt;

use thiserror::Error;

use crate::action::Action;
use crate::state::Outcome;

/// Why a move was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IllegalMoveReason {
    /// The target cell already holds a mark.
    CellOccupied,
    /// The target sub-board is not one the mover may play in.
    BoardUnavailable,
}

impl fmt::Display for IllegalMoveReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IllegalMoveReason::CellOccupied => f.write_str("cell is occupied"),
            IllegalMoveReason::BoardUnavailable => f.write_str("sub-board is not available"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GameError {
    #[error("Illegal move {action}: {reason}")]
    IllegalMove {
        action: Action,
        reason: IllegalMoveReason,
    },

    #[error("Game already finished: {outcome}")]
    GameAlreadyFinished { outcome: Outcome },

    #[error("Action index {0} out of range (expected 0..81)")]
    InvalidAction(usize),
}
