//! Action codec.
//!
//! An action is an index in `0..81` that packs (sub-board row, sub-board
//! column, cell row, cell column) in base 3:
//! `27 * sub_row + 9 * sub_col + 3 * cell_row + cell_col`.

use std::fmt;

use crate::error::GameError;

/// Total number of distinct actions (one per cell).
pub const NUM_ACTIONS: usize = 81;

/// Number of sub-boards on the outer grid.
pub const NUM_BOARDS: usize = 9;

/// A cell on the nested board, identified by its action index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Action(u8);

impl Action {
    /// Build an action from its index, rejecting anything outside `0..81`.
    pub fn new(index: usize) -> Result<Self, GameError> {
        if index >= NUM_ACTIONS {
            return Err(GameError::InvalidAction(index));
        }
        Ok(Self(index as u8))
    }

    /// Build an action from board and cell coordinates (each in `0..3`).
    ///
    /// # Panics
    /// Panics if any coordinate is out of range.
    pub const fn from_coords(sub_row: usize, sub_col: usize, cell_row: usize, cell_col: usize) -> Self {
        assert!(sub_row < 3 && sub_col < 3 && cell_row < 3 && cell_col < 3);
        Self((27 * sub_row + 9 * sub_col + 3 * cell_row + cell_col) as u8)
    }

    /// Build an action from a sub-board index and a cell index (each in `0..9`).
    pub fn from_board_cell(board: usize, cell: usize) -> Result<Self, GameError> {
        if board >= NUM_BOARDS || cell >= 9 {
            return Err(GameError::InvalidAction(board * 9 + cell));
        }
        Ok(Self::from_coords(board / 3, board % 3, cell / 3, cell % 3))
    }

    /// Iterate over all 81 actions in index order.
    pub fn all() -> impl Iterator<Item = Action> {
        (0..NUM_ACTIONS as u8).map(Action)
    }

    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }

    #[inline]
    pub fn sub_row(self) -> usize {
        self.index() / 27
    }

    #[inline]
    pub fn sub_col(self) -> usize {
        (self.index() % 27) / 9
    }

    #[inline]
    pub fn cell_row(self) -> usize {
        (self.index() % 9) / 3
    }

    #[inline]
    pub fn cell_col(self) -> usize {
        self.index() % 3
    }

    /// Row-major index of the sub-board this action targets.
    #[inline]
    pub fn board(self) -> usize {
        self.sub_row() * 3 + self.sub_col()
    }

    /// Row-major index of the cell within its sub-board. This is also the
    /// index of the sub-board the opponent is sent to.
    #[inline]
    pub fn cell(self) -> usize {
        self.cell_row() * 3 + self.cell_col()
    }
}

impl TryFrom<usize> for Action {
    type Error = GameError;

    fn try_from(index: usize) -> Result<Self, Self::Error> {
        Action::new(index)
    }
}

impl From<Action> for usize {
    fn from(action: Action) -> Self {
        action.index()
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (board {},{} cell {},{})",
            self.0,
            self.sub_row(),
            self.sub_col(),
            self.cell_row(),
            self.cell_col()
        )
    }
}
