//! Grid geometry: dimensions, deployment zones and cell coordinates.
//!
//! Cells are addressed by a row-major index (`row * width + col`). Step
//! arithmetic happens on signed [`Cell`] coordinates so that a step off the
//! edge of the grid is representable and can be rejected by
//! [`GridConfig::index_of`].

use std::fmt;
use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

/// Which squad a unit fights for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Side {
    /// The squad deployed by the player.
    Player,
    /// The generated opposing squad.
    Enemy,
}

impl Side {
    /// The opposing side.
    #[must_use]
    pub const fn opponent(self) -> Self {
        match self {
            Side::Player => Side::Enemy,
            Side::Enemy => Side::Player,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Player => write!(f, "player"),
            Side::Enemy => write!(f, "enemy"),
        }
    }
}

/// Signed row/column coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Cell {
    /// Row, counted from the top.
    pub row: i32,
    /// Column, counted from the left.
    pub col: i32,
}

impl Cell {
    /// Create a cell from coordinates.
    #[must_use]
    pub const fn new(row: i32, col: i32) -> Self {
        Self { row, col }
    }

    /// Manhattan distance to another cell.
    #[must_use]
    pub const fn manhattan(self, other: Cell) -> u32 {
        self.row.abs_diff(other.row) + self.col.abs_diff(other.col)
    }

    /// One step from `from` toward `to` along a single axis.
    ///
    /// Returns `from` unchanged when the coordinates already agree.
    #[must_use]
    pub const fn toward(from: i32, to: i32) -> i32 {
        if to > from {
            from + 1
        } else if to < from {
            from - 1
        } else {
            from
        }
    }
}

/// Grid dimensions and the column range each side may deploy into.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridConfig {
    /// Number of columns.
    pub width: usize,
    /// Number of rows.
    pub height: usize,
    /// Columns the player may place units into.
    pub player_zone: RangeInclusive<usize>,
    /// Columns the enemy squad is generated into.
    pub enemy_zone: RangeInclusive<usize>,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            width: 8,
            height: 3,
            player_zone: 0..=2,
            enemy_zone: 5..=7,
        }
    }
}

impl GridConfig {
    /// Total number of cells.
    #[must_use]
    pub fn cell_count(&self) -> usize {
        self.width * self.height
    }

    /// Check if a cell index lies on the grid.
    #[must_use]
    pub fn contains_index(&self, index: usize) -> bool {
        index < self.cell_count()
    }

    /// Check if signed coordinates lie on the grid.
    #[must_use]
    pub fn in_bounds(&self, cell: Cell) -> bool {
        cell.row >= 0
            && cell.col >= 0
            && (cell.row as usize) < self.height
            && (cell.col as usize) < self.width
    }

    /// Convert an index to coordinates.
    #[must_use]
    pub fn cell_of(&self, index: usize) -> Cell {
        Cell::new((index / self.width) as i32, (index % self.width) as i32)
    }

    /// Convert coordinates to an index, or `None` when off the grid.
    #[must_use]
    pub fn index_of(&self, cell: Cell) -> Option<usize> {
        self.in_bounds(cell)
            .then(|| cell.row as usize * self.width + cell.col as usize)
    }

    /// Deployment columns for a side.
    #[must_use]
    pub fn zone_for(&self, side: Side) -> &RangeInclusive<usize> {
        match side {
            Side::Player => &self.player_zone,
            Side::Enemy => &self.enemy_zone,
        }
    }

    /// Check if a cell lies in a side's deployment zone.
    #[must_use]
    pub fn in_zone(&self, side: Side, index: usize) -> bool {
        self.contains_index(index) && self.zone_for(side).contains(&(index % self.width))
    }

    /// Every cell of a side's zone, row by row.
    #[must_use]
    pub fn zone_cells(&self, side: Side) -> Vec<usize> {
        let zone = self.zone_for(side);
        (0..self.height)
            .flat_map(|row| {
                zone.clone()
                    .filter(|&col| col < self.width)
                    .map(move |col| row * self.width + col)
            })
            .collect()
    }
}
