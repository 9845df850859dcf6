//! Pure 3x3 board logic for two-player duels.
//!
//! This crate has no knowledge of players, connections or sessions. It knows
//! how to hold marks on a grid and how to tell whether someone has won.
//!
//! # Example
//!
//! ```
//! use strictly_grid::{Board, Evaluation, Position, Symbol};
//!
//! let mut board = Board::new();
//! for col in 0..3 {
//!     board.place(Position::new(0, col).unwrap(), Symbol::X);
//! }
//! assert_eq!(board.evaluate(), Evaluation::Win(Symbol::X));
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod position;
mod rules;
mod types;

pub use position::{Position, PositionError};
pub use rules::{Evaluation, check_winner, is_draw};
pub use types::{Board, Cell, Rows, Symbol};
