//! Game state and transition rules.

use std::fmt;

use crate::action::{Action, NUM_ACTIONS, NUM_BOARDS};
use crate::error::{GameError, IllegalMoveReason};
use crate::grid::has_three_in_a_row;

/// A side in the game. X always moves first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Player {
    X,
    O,
}

impl Player {
    #[inline]
    pub fn opponent(self) -> Player {
        match self {
            Player::X => Player::O,
            Player::O => Player::X,
        }
    }

    /// +1 for X, -1 for O.
    #[inline]
    pub fn sign(self) -> f32 {
        match self {
            Player::X => 1.0,
            Player::O => -1.0,
        }
    }

    pub fn symbol(self) -> char {
        match self {
            Player::X => 'x',
            Player::O => 'o',
        }
    }
}

impl fmt::Display for Player {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Player::X => f.write_str("X"),
            Player::O => f.write_str("O"),
        }
    }
}

/// Ownership of one sub-board. Once it leaves `Open` it never changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BoardStatus {
    #[default]
    Open,
    Won(Player),
    Drawn,
}

impl BoardStatus {
    #[inline]
    pub fn is_open(self) -> bool {
        matches!(self, BoardStatus::Open)
    }
}

/// Result of the game as a whole.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Outcome {
    #[default]
    InProgress,
    Draw,
    Win(Player),
}

impl Outcome {
    #[inline]
    pub fn is_decided(self) -> bool {
        !matches!(self, Outcome::InProgress)
    }

    /// +1 for an X win, -1 for an O win, 0 for a draw or unfinished game.
    pub fn score(self) -> f32 {
        match self {
            Outcome::Win(p) => p.sign(),
            Outcome::Draw | Outcome::InProgress => 0.0,
        }
    }

    /// Outcome value from `player`'s point of view: +1 win, -1 loss, 0 otherwise.
    pub fn value_for(self, player: Player) -> f32 {
        self.score() * player.sign()
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::InProgress => f.write_str("in progress"),
            Outcome::Draw => f.write_str("draw"),
            Outcome::Win(p) => write!(f, "winner {}", p),
        }
    }
}

/// Full position of a nested tic-tac-toe game.
///
/// Cells are stored as `cells[board][cell]` with both indices row-major in
/// `0..9`. The struct is `Copy`; [`apply_move`](Self::apply_move) returns a
/// fresh value and leaves `self` untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GameState {
    cells: [[Option<Player>; 9]; NUM_BOARDS],
    ownership: [BoardStatus; NUM_BOARDS],
    last_move: Option<Action>,
    side_to_move: Player,
    outcome: Outcome,
}

impl Default for GameState {
    fn default() -> Self {
        Self::new()
    }
}

impl GameState {
    /// Empty board, X to move.
    pub fn new() -> Self {
        Self {
            cells: [[None; 9]; NUM_BOARDS],
            ownership: [BoardStatus::Open; NUM_BOARDS],
            last_move: None,
            side_to_move: Player::X,
            outcome: Outcome::InProgress,
        }
    }

    /// Replay a sequence of action indices from the initial position.
    pub fn from_actions<I>(actions: I) -> Result<Self, GameError>
    where
        I: IntoIterator<Item = usize>,
    {
        actions.into_iter().try_fold(Self::new(), |state, index| {
            state.apply_move(Action::new(index)?)
        })
    }

    #[inline]
    pub fn cell(&self, action: Action) -> Option<Player> {
        self.cells[action.board()][action.cell()]
    }

    #[inline]
    pub fn ownership(&self) -> &[BoardStatus; NUM_BOARDS] {
        &self.ownership
    }

    #[inline]
    pub fn last_move(&self) -> Option<Action> {
        self.last_move
    }

    /// Player to move next. Once the game is decided this stays on the
    /// player who made the final move.
    #[inline]
    pub fn side_to_move(&self) -> Player {
        self.side_to_move
    }

    #[inline]
    pub fn outcome(&self) -> Outcome {
        self.outcome
    }

    #[inline]
    pub fn is_terminal(&self) -> bool {
        self.outcome.is_decided()
    }

    /// Number of marks on the board (equals the number of plies played).
    pub fn occupied_count(&self) -> usize {
        self.cells
            .iter()
            .flat_map(|board| board.iter())
            .filter(|c| c.is_some())
            .count()
    }

    /// Sub-boards the side to move may currently play in.
    ///
    /// The board named by the last move's cell is mandated while it is still
    /// open; otherwise every open board is available. Nothing is available
    /// once the game is decided.
    pub fn available_boards(&self) -> [bool; NUM_BOARDS] {
        let mut available = [false; NUM_BOARDS];
        if self.is_terminal() {
            return available;
        }
        match self.last_move {
            Some(last) if self.ownership[last.cell()].is_open() => {
                available[last.cell()] = true;
            }
            _ => {
                for (slot, status) in available.iter_mut().zip(self.ownership.iter()) {
                    *slot = status.is_open();
                }
            }
        }
        available
    }

    /// Bit `a` is set iff action `a` is legal.
    pub fn legal_mask(&self) -> u128 {
        let available = self.available_boards();
        let mut mask = 0u128;
        for action in Action::all() {
            if available[action.board()] && self.cell(action).is_none() {
                mask |= 1u128 << action.index();
            }
        }
        mask
    }

    /// Legal actions in ascending index order. Empty iff the game is decided.
    pub fn legal_actions(&self) -> Vec<Action> {
        let mask = self.legal_mask();
        Action::all()
            .filter(|a| mask & (1u128 << a.index()) != 0)
            .collect()
    }

    #[inline]
    pub fn is_legal(&self, action: Action) -> bool {
        self.legal_mask() & (1u128 << action.index()) != 0
    }

    /// Apply `action` for the side to move and return the resulting state.
    ///
    /// # Errors
    /// - [`GameError::GameAlreadyFinished`] if the outcome is already decided.
    /// - [`GameError::IllegalMove`] if the sub-board is unavailable or the
    ///   cell is occupied.
    pub fn apply_move(&self, action: Action) -> Result<GameState, GameError> {
        if self.is_terminal() {
            return Err(GameError::GameAlreadyFinished {
                outcome: self.outcome,
            });
        }
        if !self.available_boards()[action.board()] {
            return Err(GameError::IllegalMove {
                action,
                reason: IllegalMoveReason::BoardUnavailable,
            });
        }
        if self.cell(action).is_some() {
            return Err(GameError::IllegalMove {
                action,
                reason: IllegalMoveReason::CellOccupied,
            });
        }

        let mover = self.side_to_move;
        let board = action.board();
        let mut next = *self;
        next.cells[board][action.cell()] = Some(mover);
        next.last_move = Some(action);

        if next.ownership[board].is_open() {
            next.ownership[board] = Self::evaluate_board(&next.cells[board], mover);
        }
        next.outcome = Self::evaluate_outcome(&next.ownership, mover);

        if !next.is_terminal() {
            next.side_to_move = mover.opponent();
        }
        Ok(next)
    }

    fn evaluate_board(cells: &[Option<Player>; 9], mover: Player) -> BoardStatus {
        if has_three_in_a_row(cells, &Some(mover)) {
            BoardStatus::Won(mover)
        } else if cells.iter().all(|c| c.is_some()) {
            BoardStatus::Drawn
        } else {
            BoardStatus::Open
        }
    }

    // Only the player who just moved can have completed a line.
    fn evaluate_outcome(ownership: &[BoardStatus; NUM_BOARDS], mover: Player) -> Outcome {
        if has_three_in_a_row(ownership, &BoardStatus::Won(mover)) {
            Outcome::Win(mover)
        } else if ownership.iter().all(|s| !s.is_open()) {
            Outcome::Draw
        } else {
            Outcome::InProgress
        }
    }

    /// Legal mask as 81 floats (1.0 legal, 0.0 otherwise).
    pub fn legal_mask_f32(&self) -> [f32; NUM_ACTIONS] {
        let mask = self.legal_mask();
        let mut out = [0.0; NUM_ACTIONS];
        for (i, slot) in out.iter_mut().enumerate() {
            if mask & (1u128 << i) != 0 {
                *slot = 1.0;
            }
        }
        out
    }
}
