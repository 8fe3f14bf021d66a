//! Evaluator input encoding.
//!
//! Layout of the state tensor (189 floats):
//!
//! | offset | len | content                                  |
//! |--------|-----|------------------------------------------|
//! | 0      | 81  | X marks, indexed by action               |
//! | 81     | 81  | O marks, indexed by action               |
//! | 162    | 9   | sub-boards won by X                      |
//! | 171    | 9   | sub-boards won by O                      |
//! | 180    | 9   | sub-boards holding at least one legal move |
//!
//! The availability mask is a separate 81-float vector, 1.0 for each legal
//! action.

use crate::action::{Action, NUM_ACTIONS, NUM_BOARDS};
use crate::state::{BoardStatus, GameState, Player};

/// Length of the state tensor.
pub const STATE_SIZE: usize = 2 * NUM_ACTIONS + 3 * NUM_BOARDS;

/// Length of the availability mask.
pub const AVAILABILITY_SIZE: usize = NUM_ACTIONS;

const X_CELLS: usize = 0;
const O_CELLS: usize = NUM_ACTIONS;
const X_BOARDS: usize = 2 * NUM_ACTIONS;
const O_BOARDS: usize = X_BOARDS + NUM_BOARDS;
const OPEN_BOARDS: usize = O_BOARDS + NUM_BOARDS;

#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub state: [f32; STATE_SIZE],
    pub availability: [f32; AVAILABILITY_SIZE],
}

impl Observation {
    pub fn from_state(state: &GameState) -> Self {
        let mut tensor = [0.0f32; STATE_SIZE];

        for action in Action::all() {
            match state.cell(action) {
                Some(Player::X) => tensor[X_CELLS + action.index()] = 1.0,
                Some(Player::O) => tensor[O_CELLS + action.index()] = 1.0,
                None => {}
            }
        }

        for (board, status) in state.ownership().iter().enumerate() {
            match status {
                BoardStatus::Won(Player::X) => tensor[X_BOARDS + board] = 1.0,
                BoardStatus::Won(Player::O) => tensor[O_BOARDS + board] = 1.0,
                BoardStatus::Open | BoardStatus::Drawn => {}
            }
        }

        let availability = state.legal_mask_f32();
        for action in Action::all() {
            if availability[action.index()] > 0.0 {
                tensor[OPEN_BOARDS + action.board()] = 1.0;
            }
        }

        Self {
            state: tensor,
            availability,
        }
    }

    /// Bitmask of legal actions recovered from the availability vector.
    pub fn legal_mask(&self) -> u128 {
        self.availability
            .iter()
            .enumerate()
            .filter(|(_, &v)| v > 0.0)
            .fold(0u128, |mask, (i, _)| mask | (1u128 << i))
    }

    /// Append the state tensor as little-endian f32 bytes.
    pub fn encode_state(&self, out: &mut Vec<u8>) {
        encode_f32s(&self.state, out);
    }

    /// Append the availability mask as little-endian f32 bytes.
    pub fn encode_availability(&self, out: &mut Vec<u8>) {
        encode_f32s(&self.availability, out);
    }
}

fn encode_f32s(values: &[f32], out: &mut Vec<u8>) {
    out.reserve(values.len() * 4);
    for v in values {
        out.extend_from_slice(&v.to_le_bytes());
    }
}
