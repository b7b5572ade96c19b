//! Combat units and their damage/heal rules.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::data::UnitData;
use crate::formation::UnitId;
use crate::grid::Side;
use crate::math::scale_percent;

/// Minimum damage floor - every hit deals at least 1 before class modifiers.
pub const MIN_DAMAGE: u32 = 1;

/// Share of ranged damage a Knight actually takes, in percent.
pub const KNIGHT_RANGED_INTAKE_PERCENT: u32 = 70;

/// The fixed set of unit classes.
///
/// Class decides behaviour (movement style, ability, damage intake); the
/// numbers live in [`UnitData`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum UnitClass {
    /// Armoured melee fighter, shrugs off part of every ranged hit.
    Knight,
    /// Long-range shooter with a bonus against lightly armoured targets.
    Archer,
    /// Caster whose spell hits up to two targets at once.
    Mage,
    /// Support unit that restores ally health instead of attacking.
    Healer,
    /// Fast, cheap melee skirmisher.
    Goblin,
    /// Slow melee bruiser.
    Ogre,
}

impl UnitClass {
    /// Every class, in declaration order.
    pub const ALL: [UnitClass; 6] = [
        UnitClass::Knight,
        UnitClass::Archer,
        UnitClass::Mage,
        UnitClass::Healer,
        UnitClass::Goblin,
        UnitClass::Ogre,
    ];

    /// Classes the player may deploy. Goblins and Ogres only fight for
    /// the enemy.
    pub const PLAYER_CLASSES: [UnitClass; 4] = [
        UnitClass::Knight,
        UnitClass::Archer,
        UnitClass::Mage,
        UnitClass::Healer,
    ];

    /// Whether `side` may deploy this class.
    #[must_use]
    pub const fn deployable_by(self, side: Side) -> bool {
        match side {
            Side::Player => !matches!(self, UnitClass::Goblin | UnitClass::Ogre),
            Side::Enemy => true,
        }
    }
}

impl fmt::Display for UnitClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            UnitClass::Knight => "Knight",
            UnitClass::Archer => "Archer",
            UnitClass::Mage => "Mage",
            UnitClass::Healer => "Healer",
            UnitClass::Goblin => "Goblin",
            UnitClass::Ogre => "Ogre",
        };
        f.write_str(name)
    }
}

/// How a hit is delivered. Only matters to the receiver's intake rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Delivery {
    /// Close-quarters strike.
    Melee,
    /// Arrow or spell.
    Ranged,
}

/// A mutable combat entity on the board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Unit {
    /// Identifier issued by the board.
    pub id: UnitId,
    /// Display name, `{Class}_{cell}` at placement time.
    pub name: String,
    /// Behavioural class.
    pub class: UnitClass,
    /// Owning side.
    pub side: Side,
    max_hp: u32,
    hp: u32,
    /// Attack stat.
    pub attack: u32,
    /// Defense stat.
    pub defense: u32,
    /// Manhattan radius the unit can act within.
    pub range: u32,
    /// Turn-order key; higher acts earlier.
    pub speed: u32,
    /// Current cell, `None` once displaced from the grid.
    pub position: Option<usize>,
    alive: bool,
    /// Trait label, informational only.
    pub trait_name: String,
    /// Trait description, informational only.
    pub trait_description: String,
}

impl Unit {
    /// Create a unit at full health from its data definition.
    #[must_use]
    pub fn new(id: UnitId, data: &UnitData, side: Side, position: usize) -> Self {
        Self {
            id,
            name: format!("{}_{}", data.class, position),
            class: data.class,
            side,
            max_hp: data.health,
            hp: data.health,
            attack: data.attack,
            defense: data.defense,
            range: data.range,
            speed: data.speed,
            position: Some(position),
            alive: data.health > 0,
            trait_name: data.trait_name.clone(),
            trait_description: data.trait_description.clone(),
        }
    }

    /// Current health.
    #[must_use]
    pub const fn hp(&self) -> u32 {
        self.hp
    }

    /// Maximum health, fixed at creation.
    #[must_use]
    pub const fn max_hp(&self) -> u32 {
        self.max_hp
    }

    /// Whether the unit is still fighting. Never reverts once false.
    #[must_use]
    pub const fn is_alive(&self) -> bool {
        self.alive
    }

    /// Whether the unit has taken any damage.
    #[must_use]
    pub const fn is_injured(&self) -> bool {
        self.hp < self.max_hp
    }

    /// Whether the unit fights in melee (range 1).
    #[must_use]
    pub const fn is_melee(&self) -> bool {
        self.range == 1
    }

    /// Health as an integer percentage of max.
    #[must_use]
    pub fn health_percent(&self) -> u32 {
        if self.max_hp == 0 {
            return 0;
        }
        self.hp * 100 / self.max_hp
    }

    /// Apply the intake rule for this unit's class and return the damage taken.
    ///
    /// Knights take 70% (truncated) of ranged hits. Health is clamped at 0
    /// and the unit dies when it reaches 0.
    pub fn take_damage(&mut self, amount: u32, delivery: Delivery) -> u32 {
        if !self.alive {
            return 0;
        }
        let amount = match (self.class, delivery) {
            (UnitClass::Knight, Delivery::Ranged) => {
                scale_percent(amount, KNIGHT_RANGED_INTAKE_PERCENT)
            }
            _ => amount,
        };
        let taken = amount.min(self.hp);
        self.hp -= taken;
        if self.hp == 0 {
            self.alive = false;
        }
        taken
    }

    /// Restore health up to max and return the amount actually restored.
    ///
    /// Dead units cannot be healed.
    pub fn heal(&mut self, amount: u32) -> u32 {
        if !self.alive {
            return 0;
        }
        let restored = amount.min(self.max_hp - self.hp);
        self.hp += restored;
        restored
    }

    /// Injury ordering key: lower means more injured.
    ///
    /// Compares `hp / max_hp` exactly by cross-multiplying.
    pub(crate) fn injury_cmp(&self, other: &Unit) -> std::cmp::Ordering {
        let lhs = u64::from(self.hp) * u64::from(other.max_hp);
        let rhs = u64::from(other.hp) * u64::from(self.max_hp);
        lhs.cmp(&rhs)
    }
}

/// Base damage of any hit: `max(1, attack - defense)`.
#[must_use]
pub const fn base_damage(attack: u32, defense: u32) -> u32 {
    let raw = attack.saturating_sub(defense);
    if raw < MIN_DAMAGE {
        MIN_DAMAGE
    } else {
        raw
    }
}
