//! Win and draw rules.

mod draw;
mod win;

pub use draw::is_draw;
pub use win::check_winner;

use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::types::{Board, Symbol};

/// Result of evaluating a board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Evaluation {
    /// The symbol has three in a line.
    Win(Symbol),
    /// Full board, no line.
    Draw,
    /// Moves remain.
    InProgress,
}

impl Evaluation {
    /// Whether the game has ended.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Evaluation::InProgress)
    }

    /// The winning symbol, if any.
    pub fn winner(&self) -> Option<Symbol> {
        match self {
            Evaluation::Win(symbol) => Some(*symbol),
            Evaluation::Draw | Evaluation::InProgress => None,
        }
    }
}

/// Evaluates the board.
///
/// A win is checked before a full board, so a final move that both fills the
/// grid and completes a line is a win.
#[instrument(skip(board))]
pub(crate) fn evaluate(board: &Board) -> Evaluation {
    if let Some(symbol) = check_winner(board) {
        Evaluation::Win(symbol)
    } else if is_draw(board) {
        Evaluation::Draw
    } else {
        Evaluation::InProgress
    }
}
