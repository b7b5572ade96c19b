//! Spatial queries over the board.
//!
//! Occupancy is always read from the live formations. Units move in the
//! middle of a turn, so nothing here is cached.

use serde::{Deserialize, Serialize};

use crate::formation::Board;
use crate::grid::{Cell, GridConfig};

/// Distance returned when either position is absent.
///
/// Compares greater than every real grid distance.
pub const UNREACHABLE: u32 = u32::MAX;

/// Manhattan distance between two cells, or [`UNREACHABLE`] if either is absent.
#[must_use]
pub fn distance(grid: &GridConfig, a: Option<usize>, b: Option<usize>) -> u32 {
    match (a, b) {
        (Some(a), Some(b)) => grid.cell_of(a).manhattan(grid.cell_of(b)),
        _ => UNREACHABLE,
    }
}

/// True iff a living unit of either side sits at `index`.
#[must_use]
pub fn is_occupied(board: &Board, index: usize) -> bool {
    board.unit_at(index).is_some_and(|unit| unit.is_alive())
}

/// Check if a step onto `cell` is legal: on the grid and not held by a living unit.
#[must_use]
pub fn open_cell(board: &Board, cell: Cell) -> Option<usize> {
    board
        .grid()
        .index_of(cell)
        .filter(|&index| !is_occupied(board, index))
}

/// Orthogonal direction from a reference cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Smaller row.
    Above,
    /// Larger row.
    Below,
    /// Smaller column.
    Left,
    /// Larger column.
    Right,
}

impl Direction {
    /// Fixed priority order used by the surround heuristic.
    pub const PRIORITY: [Direction; 4] = [
        Direction::Above,
        Direction::Below,
        Direction::Left,
        Direction::Right,
    ];

    /// The neighbouring cell in this direction.
    #[must_use]
    pub const fn offset(self, cell: Cell) -> Cell {
        match self {
            Direction::Above => Cell::new(cell.row - 1, cell.col),
            Direction::Below => Cell::new(cell.row + 1, cell.col),
            Direction::Left => Cell::new(cell.row, cell.col - 1),
            Direction::Right => Cell::new(cell.row, cell.col + 1),
        }
    }

    /// Classify where `other` sits relative to `center`.
    ///
    /// Rows are checked before columns; `None` when the cells coincide.
    #[must_use]
    pub fn classify(center: Cell, other: Cell) -> Option<Direction> {
        if other.row < center.row {
            Some(Direction::Above)
        } else if other.row > center.row {
            Some(Direction::Below)
        } else if other.col < center.col {
            Some(Direction::Left)
        } else if other.col > center.col {
            Some(Direction::Right)
        } else {
            None
        }
    }
}

/// In-bounds orthogonal neighbours of `index`, in [`Direction::PRIORITY`] order.
#[must_use]
pub fn neighbours(grid: &GridConfig, index: usize) -> Vec<(Direction, usize)> {
    let center = grid.cell_of(index);
    Direction::PRIORITY
        .iter()
        .filter_map(|&dir| grid.index_of(dir.offset(center)).map(|i| (dir, i)))
        .collect()
}
