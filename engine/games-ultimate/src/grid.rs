/// Winning lines of a row-major 3x3 grid (rows, columns, diagonals).
pub const LINES: [[usize; 3]; 8] = [
    [0, 1, 2],
    [3, 4, 5],
    [6, 7, 8], // rows
    [0, 3, 6],
    [1, 4, 7],
    [2, 5, 8], // columns
    [0, 4, 8],
    [2, 4, 6], // diagonals
];

/// True iff `who` fills a full row, column or diagonal of `grid`.
///
/// The same test decides a sub-board (over cell marks) and the whole game
/// (over sub-board ownership).
pub fn has_three_in_a_row<T: PartialEq>(grid: &[T; 9], who: &T) -> bool {
    LINES
        .iter()
        .any(|line| line.iter().all(|&idx| grid[idx] == *who))
}
