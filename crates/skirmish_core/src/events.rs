//! Battle events.
//!
//! Every decision point of a turn is recorded as a [`BattleEvent`]. Events
//! are purely observational: the engine never reads them back. Hosts can
//! render them with [`fmt::Display`] as a plain battle log.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::battle::BattleResult;
use crate::formation::UnitId;
use crate::grid::Side;
use crate::unit::Unit;

/// Lightweight reference to a unit as it was when the event fired.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UnitRef {
    /// Unit id.
    pub id: UnitId,
    /// Display name.
    pub name: String,
}

impl From<&Unit> for UnitRef {
    fn from(unit: &Unit) -> Self {
        Self {
            id: unit.id,
            name: unit.name.clone(),
        }
    }
}

impl fmt::Display for UnitRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// How an attack was made.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AttackKind {
    /// Melee blow.
    Strike,
    /// Archer shot.
    Shot,
    /// Mage spell.
    Spell,
}

impl AttackKind {
    fn verb(self) -> &'static str {
        match self {
            AttackKind::Strike => "attacks",
            AttackKind::Shot => "shoots",
            AttackKind::Spell => "casts spell on",
        }
    }
}

/// Why a battle ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EndReason {
    /// At least one side ran out of living units.
    Elimination,
    /// The configured turn limit was reached.
    TurnLimit,
}

/// Entry in the opening turn order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TurnSlot {
    /// Queued unit.
    pub unit: UnitRef,
    /// Its speed.
    pub speed: u32,
}

/// A single observable thing that happened during a battle.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BattleEvent {
    /// The battle began with this turn order.
    BattleStarted {
        /// Queue order at the start.
        order: Vec<TurnSlot>,
    },
    /// A unit's turn began.
    TurnStarted {
        /// Acting unit.
        unit: UnitRef,
        /// Its side.
        side: Side,
    },
    /// A unit stepped to another cell.
    Moved {
        /// Moving unit.
        unit: UnitRef,
        /// Cell it left.
        from: usize,
        /// Cell it entered.
        to: usize,
    },
    /// An archer found a lightly armoured target.
    WeakSpot {
        /// Shooting archer.
        attacker: UnitRef,
        /// Exposed target.
        target: UnitRef,
    },
    /// Damage was applied.
    Attacked {
        /// Attacking unit.
        attacker: UnitRef,
        /// Receiving unit.
        target: UnitRef,
        /// Kind of attack.
        kind: AttackKind,
        /// Whether the hit counted as ranged.
        ranged: bool,
        /// Damage rolled by the attacker.
        damage: u32,
        /// Health the target actually lost.
        dealt: u32,
    },
    /// Health was restored.
    Healed {
        /// Healing unit.
        healer: UnitRef,
        /// Healed unit.
        target: UnitRef,
        /// Health actually restored.
        amount: u32,
    },
    /// The unit stayed put and had nothing in range.
    NoTargets {
        /// Idle unit.
        unit: UnitRef,
    },
    /// A healer stayed put with nobody to heal.
    NoOneToHeal {
        /// Idle healer.
        unit: UnitRef,
    },
    /// A unit's health reached zero.
    Defeated {
        /// Fallen unit.
        unit: UnitRef,
    },
    /// The battle is over.
    BattleEnded {
        /// Outcome.
        result: BattleResult,
        /// What ended it.
        reason: EndReason,
    },
}

impl fmt::Display for BattleEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BattleEvent::BattleStarted { order } => {
                write!(f, "Battle begins! Turn order:")?;
                for slot in order {
                    write!(f, " {} (SPD: {})", slot.unit, slot.speed)?;
                }
                Ok(())
            }
            BattleEvent::TurnStarted { unit, side } => write!(f, "{unit}'s turn ({side})"),
            BattleEvent::Moved { unit, from, to } => {
                write!(f, "{unit} moves from position {from} to {to}.")
            }
            BattleEvent::WeakSpot { attacker, target } => {
                write!(f, "{attacker} finds a weak spot on {target}!")
            }
            BattleEvent::Attacked {
                attacker,
                target,
                kind,
                dealt,
                ..
            } => write!(f, "{attacker} {} {target} for {dealt} damage.", kind.verb()),
            BattleEvent::Healed {
                healer,
                target,
                amount,
            } => write!(f, "{healer} heals {target} for {amount} HP."),
            BattleEvent::NoTargets { unit } => write!(f, "{unit} has no targets in range."),
            BattleEvent::NoOneToHeal { unit } => write!(f, "{unit} has no one to heal."),
            BattleEvent::Defeated { unit } => write!(f, "{unit} is defeated!"),
            BattleEvent::BattleEnded { result, reason } => match reason {
                EndReason::Elimination => write!(f, "{result}"),
                EndReason::TurnLimit => write!(f, "{result} (turn limit reached)"),
            },
        }
    }
}
