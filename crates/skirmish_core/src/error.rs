//! Error types for the combat engine.

use thiserror::Error;

use crate::battle::BattlePhase;
use crate::formation::UnitId;
use crate::grid::Side;
use crate::unit::UnitClass;

/// Result type alias using [`SkirmishError`].
pub type Result<T> = std::result::Result<T, SkirmishError>;

/// Top-level error type for every rejected engine command.
///
/// All of these are user-facing rejections: the command that produced
/// them left the battle state untouched.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SkirmishError {
    /// Cell index outside the grid.
    #[error("Cell {index} is outside the {width}x{height} grid")]
    OutOfBounds {
        /// Offending cell index.
        index: usize,
        /// Grid width.
        width: usize,
        /// Grid height.
        height: usize,
    },

    /// Cell lies outside the side's deployment zone.
    #[error("Cell {index} is outside the {side} deployment zone")]
    OutOfZone {
        /// Offending cell index.
        index: usize,
        /// Side attempting the placement.
        side: Side,
    },

    /// Class not available to the side's squad.
    #[error("{class} cannot be deployed by the {side} squad")]
    ClassNotAllowed {
        /// Rejected class.
        class: UnitClass,
        /// Side attempting the placement.
        side: Side,
    },

    /// Placement would exceed the squad budget.
    #[error("Over budget: squad would cost {required}, budget is {budget}")]
    OverBudget {
        /// Squad cost after the placement.
        required: u32,
        /// Configured budget.
        budget: u32,
    },

    /// Target cell already holds a unit.
    #[error("Cell {0} is already occupied")]
    CellOccupied(usize),

    /// No unit at the given cell.
    #[error("No unit at cell {0}")]
    NoUnitAt(usize),

    /// Unknown unit identifier.
    #[error("Unit not found: {0}")]
    UnitNotFound(UnitId),

    /// A battle needs at least one living player unit.
    #[error("Place at least one unit before starting the battle")]
    NoPlayerUnits,

    /// Command not allowed in the current phase.
    #[error("Command not allowed during the {0:?} phase")]
    InvalidPhase(BattlePhase),

    /// Data file parsing error.
    #[error("Failed to parse unit data: {0}")]
    DataParseError(String),

    /// Snapshot encoding or decoding failed.
    #[error("Snapshot serialization failed: {0}")]
    Serialization(String),
}
