//! Validated board coordinates.

use derive_more::{Display, Error};
use serde::{Deserialize, Serialize};
use tracing::instrument;

/// Side length of the board.
pub const SIZE: usize = 3;

/// A cell coordinate that is known to lie on the board.
///
/// Deserialization goes through [`Position::new`], so decoded values are
/// always in range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(try_from = "RawPosition")]
#[display("({row}, {col})")]
pub struct Position {
    row: usize,
    col: usize,
}

#[derive(Deserialize)]
struct RawPosition {
    row: usize,
    col: usize,
}

impl TryFrom<RawPosition> for Position {
    type Error = PositionError;

    fn try_from(raw: RawPosition) -> Result<Self, Self::Error> {
        Position::new(raw.row, raw.col)
    }
}

/// Coordinates outside the 3x3 grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Error)]
#[display("position ({row}, {col}) is off the board")]
pub struct PositionError {
    /// Requested row.
    pub row: i64,
    /// Requested column.
    pub col: i64,
}

impl Position {
    /// Creates a position, checking both coordinates are in `0..3`.
    #[instrument]
    pub fn new(row: usize, col: usize) -> Result<Self, PositionError> {
        if row < SIZE && col < SIZE {
            Ok(Self { row, col })
        } else {
            Err(PositionError {
                row: i64::try_from(row).unwrap_or(i64::MAX),
                col: i64::try_from(col).unwrap_or(i64::MAX),
            })
        }
    }

    /// Creates a position from signed client-supplied coordinates.
    #[instrument]
    pub fn from_coords(row: i64, col: i64) -> Result<Self, PositionError> {
        let err = PositionError { row, col };
        let row = usize::try_from(row).map_err(|_| err)?;
        let col = usize::try_from(col).map_err(|_| err)?;
        Self::new(row, col).map_err(|_| err)
    }

    /// Zero-based row.
    pub fn row(&self) -> usize {
        self.row
    }

    /// Zero-based column.
    pub fn col(&self) -> usize {
        self.col
    }

    /// All nine positions in row-major order.
    pub fn all() -> impl Iterator<Item = Position> {
        (0..SIZE).flat_map(|row| (0..SIZE).map(move |col| Position { row, col }))
    }
}
