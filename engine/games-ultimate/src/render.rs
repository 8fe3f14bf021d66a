//! Plain-text rendering: board, sub-board ownership and availability side by side.

use std::fmt;

use crate::action::Action;
use crate::state::{BoardStatus, GameState};

const GAP: &str = "        ";

fn board_lines(state: &GameState) -> Vec<String> {
    let mut lines = Vec::with_capacity(11);
    for sub_row in 0..3 {
        if sub_row > 0 {
            lines.push("-----+-----+-----".to_string());
        }
        for cell_row in 0..3 {
            let segments: Vec<String> = (0..3)
                .map(|sub_col| {
                    (0..3)
                        .map(|cell_col| {
                            let action = Action::from_coords(sub_row, sub_col, cell_row, cell_col);
                            state.cell(action).map_or(' ', |p| p.symbol())
                        })
                        .collect()
                })
                .collect();
            lines.push(format!(" {} ", segments.join(" | ")));
        }
    }
    lines
}

fn grid_lines(symbols: [char; 9]) -> Vec<String> {
    let mut lines = Vec::with_capacity(5);
    for row in 0..3 {
        if row > 0 {
            lines.push("---+---+---".to_string());
        }
        lines.push(format!(
            " {} | {} | {} ",
            symbols[row * 3],
            symbols[row * 3 + 1],
            symbols[row * 3 + 2]
        ));
    }
    lines
}

impl fmt::Display for GameState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ownership = self.ownership().map(|s| match s {
            BoardStatus::Open => ' ',
            BoardStatus::Won(p) => p.symbol(),
            BoardStatus::Drawn => '-',
        });
        let available = self.available_boards().map(|a| if a { ' ' } else { '-' });

        let board = board_lines(self);
        let owned = grid_lines(ownership);
        let avail = grid_lines(available);

        writeln!(f, "***** Board ************* Owned ************ Available **")?;
        for (i, line) in board.iter().enumerate() {
            match (owned.get(i), avail.get(i)) {
                (Some(o), Some(a)) => writeln!(f, "{line}{GAP}{o}{GAP}{a}")?,
                _ => writeln!(f, "{line}")?,
            }
        }
        write!(f, "{} to move, {}", self.side_to_move(), self.outcome())
    }
}
