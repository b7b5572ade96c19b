//! # Skirmish Core
//!
//! Deterministic combat engine for a turn-based squad battler.
//!
//! Two squads share a small grid, act in speed order and fight until one
//! side is wiped out. This crate contains **only** the engine:
//! - No rendering
//! - No IO
//! - No system randomness (enemy generation takes an injected RNG)
//! - No floating-point math (percent modifiers use fixed-point)
//!
//! ## Crate Structure
//!
//! - [`unit`] - Units, classes and damage/heal intake
//! - [`formation`] - Unit storage, formations and the shared board
//! - [`spatial`] - Distance and occupancy queries
//! - [`targeting`] - Class-aware target selection
//! - [`movement`] - Single-step movement and flanking
//! - [`abilities`] - Per-class turn resolution
//! - [`battle`] - Turn queue and phase state machine
//! - [`setup`] - Placement policy and enemy squad generation
//!
//! ## Example
//!
//! ```
//! use skirmish_core::prelude::*;
//!
//! let mut battle = Battle::new(BattleConfig::default(), UnitRoster::standard());
//! battle.place_unit(UnitClass::Knight, 8).unwrap();
//! battle.place_unit_for(Side::Enemy, UnitClass::Goblin, 13).unwrap();
//! battle.start_battle().unwrap();
//!
//! battle.run_to_completion();
//! assert_eq!(battle.phase(), BattlePhase::Ended);
//! assert!(battle.result().is_some());
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod abilities;
pub mod battle;
pub mod data;
pub mod error;
pub mod events;
pub mod formation;
pub mod grid;
pub mod math;
pub mod movement;
pub mod setup;
pub mod spatial;
pub mod targeting;
pub mod unit;
pub mod view;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::battle::{
        Battle, BattleConfig, BattlePhase, BattleResult, StepOutcome, DEFAULT_BUDGET,
        DEFAULT_MAX_TURNS,
    };
    pub use crate::data::{UnitData, UnitRoster};
    pub use crate::error::{Result, SkirmishError};
    pub use crate::events::{AttackKind, BattleEvent, EndReason, UnitRef};
    pub use crate::formation::{Board, UnitId};
    pub use crate::grid::{GridConfig, Side};
    pub use crate::math::Fixed;
    pub use crate::setup::{EnemyPolicy, FixedPoolPolicy, VarietyPolicy};
    pub use crate::unit::{Delivery, Unit, UnitClass};
    pub use crate::view::{BoardSnapshot, UnitView};
}
