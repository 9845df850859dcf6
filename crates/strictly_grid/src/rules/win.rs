//! Win detection.

use crate::position::Position;
use crate::types::{Board, Cell, Symbol};
use tracing::instrument;

/// The eight winning lines as `(row, col)` triples.
const LINES: [[(usize, usize); 3]; 8] = [
    // Rows
    [(0, 0), (0, 1), (0, 2)],
    [(1, 0), (1, 1), (1, 2)],
    [(2, 0), (2, 1), (2, 2)],
    // Columns
    [(0, 0), (1, 0), (2, 0)],
    [(0, 1), (1, 1), (2, 1)],
    [(0, 2), (1, 2), (2, 2)],
    // Diagonals
    [(0, 0), (1, 1), (2, 2)],
    [(0, 2), (1, 1), (2, 0)],
];

fn cell(board: &Board, (row, col): (usize, usize)) -> Cell {
    match Position::new(row, col) {
        Ok(pos) => board.get(pos),
        Err(_) => Cell::Empty,
    }
}

/// Returns the symbol holding three cells of some line.
///
/// Alternating turns mean at most one symbol can own a line, so the order
/// lines are checked in does not matter.
#[instrument(skip(board))]
pub fn check_winner(board: &Board) -> Option<Symbol> {
    LINES.iter().find_map(|[a, b, c]| {
        let first = cell(board, *a);
        match first {
            Cell::Occupied(symbol) if first == cell(board, *b) && first == cell(board, *c) => {
                Some(symbol)
            }
            _ => None,
        }
    })
}
