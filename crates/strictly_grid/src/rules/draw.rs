//! Draw detection.

use super::win::check_winner;
use crate::types::Board;
use tracing::instrument;

/// A draw is a full board with no completed line.
#[instrument(skip(board))]
pub fn is_draw(board: &Board) -> bool {
    board.is_full() && check_winner(board).is_none()
}
