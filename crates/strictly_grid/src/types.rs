//! Core board types.

use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize, Serializer};
use tracing::instrument;

use crate::position::Position;
use crate::rules::{self, Evaluation};

/// Mark a player puts on the board.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
)]
pub enum Symbol {
    /// Moves first.
    X,
    /// Moves second.
    O,
}

impl Symbol {
    /// Returns the other symbol.
    pub fn opponent(self) -> Self {
        match self {
            Symbol::X => Symbol::O,
            Symbol::O => Symbol::X,
        }
    }
}

/// A single cell of the board.
///
/// On the wire a cell is `""`, `"X"` or `"O"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Cell {
    /// Nobody has played here.
    #[default]
    Empty,
    /// Holds a mark.
    Occupied(Symbol),
}

impl Cell {
    /// Wire representation of the cell.
    pub fn as_str(&self) -> &'static str {
        match self {
            Cell::Empty => "",
            Cell::Occupied(Symbol::X) => "X",
            Cell::Occupied(Symbol::O) => "O",
        }
    }

    /// Returns the mark in this cell, if any.
    pub fn symbol(&self) -> Option<Symbol> {
        match self {
            Cell::Empty => None,
            Cell::Occupied(symbol) => Some(*symbol),
        }
    }
}

impl Serialize for Cell {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

struct CellVisitor;

impl Visitor<'_> for CellVisitor {
    type Value = Cell;

    fn expecting(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(r#"one of "", "X" or "O""#)
    }

    fn visit_str<E: de::Error>(self, value: &str) -> Result<Cell, E> {
        match value {
            "" => Ok(Cell::Empty),
            "X" => Ok(Cell::Occupied(Symbol::X)),
            "O" => Ok(Cell::Occupied(Symbol::O)),
            other => Err(E::invalid_value(de::Unexpected::Str(other), &self)),
        }
    }
}

impl<'de> Deserialize<'de> for Cell {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_str(CellVisitor)
    }
}

/// Row-major snapshot of the grid, as sent to clients.
pub type Rows = [[Cell; 3]; 3];

/// 3x3 board.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Board {
    cells: Rows,
}

impl Board {
    /// Creates an empty board.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cell at `pos`.
    pub fn get(&self, pos: Position) -> Cell {
        self.cells[pos.row()][pos.col()]
    }

    /// Whether `pos` is still free.
    pub fn is_empty(&self, pos: Position) -> bool {
        self.get(pos) == Cell::Empty
    }

    /// Writes `symbol` at `pos`.
    ///
    /// Callers check emptiness first. Overwriting a mark is a logic error in
    /// the caller, so it is only caught in debug builds.
    #[instrument(skip(self))]
    pub fn place(&mut self, pos: Position, symbol: Symbol) {
        debug_assert!(self.is_empty(pos), "cell {pos} already occupied");
        self.cells[pos.row()][pos.col()] = Cell::Occupied(symbol);
    }

    /// Whether every cell holds a mark.
    pub fn is_full(&self) -> bool {
        self.cells.iter().flatten().all(|cell| *cell != Cell::Empty)
    }

    /// Number of marks on the board.
    pub fn occupied(&self) -> usize {
        self.cells
            .iter()
            .flatten()
            .filter(|cell| **cell != Cell::Empty)
            .count()
    }

    /// Row-major copy of the grid.
    pub fn rows(&self) -> Rows {
        self.cells
    }

    /// Evaluates the board.
    pub fn evaluate(&self) -> Evaluation {
        rules::evaluate(self)
    }

    /// Formats the board for logs and terminals.
    pub fn display(&self) -> String {
        self.cells
            .iter()
            .map(|row| {
                row.iter()
                    .map(|cell| match cell {
                        Cell::Empty => ".",
                        other => other.as_str(),
                    })
                    .collect::<Vec<_>>()
                    .join("|")
            })
            .collect::<Vec<_>>()
            .join("\n-+-+-\n")
    }
}
