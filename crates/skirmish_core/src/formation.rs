//! Unit storage, per-side formations and the shared board.
//!
//! The [`Board`] owns every unit. Each side's [`Formation`] is a grid of
//! optional [`UnitId`]s pointing into that storage, so the turn queue and
//! the planners can hold plain ids instead of references.
//!
//! # Invariants
//!
//! - At most one unit (living or dead) occupies a cell across both
//!   formations.
//! - A unit's `position` always equals the index of the one slot that
//!   holds it, or is `None` when no slot does.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::data::UnitData;
use crate::error::{Result, SkirmishError};
use crate::grid::{GridConfig, Side};
use crate::unit::Unit;

/// Unique identifier for units on a board.
pub type UnitId = u32;

/// Storage for every unit on the board.
///
/// Backed by a `BTreeMap` so iteration is always in id order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitStorage {
    units: BTreeMap<UnitId, Unit>,
    next_id: UnitId,
}

impl UnitStorage {
    /// Create empty storage.
    #[must_use]
    pub fn new() -> Self {
        Self {
            units: BTreeMap::new(),
            next_id: 1,
        }
    }

    /// Issue the next unit id.
    fn allocate(&mut self) -> UnitId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Get a unit by id.
    #[must_use]
    pub fn get(&self, id: UnitId) -> Option<&Unit> {
        self.units.get(&id)
    }

    /// Get a mutable unit by id.
    pub fn get_mut(&mut self, id: UnitId) -> Option<&mut Unit> {
        self.units.get_mut(&id)
    }

    /// Number of stored units.
    #[must_use]
    pub fn len(&self) -> usize {
        self.units.len()
    }

    /// Check if storage is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Iterate in id order.
    pub fn iter(&self) -> impl Iterator<Item = &Unit> {
        self.units.values()
    }
}

impl Default for UnitStorage {
    fn default() -> Self {
        Self::new()
    }
}

/// One side's grid of unit slots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Formation {
    side: Side,
    slots: Vec<Option<UnitId>>,
}

impl Formation {
    /// Create an empty formation with `cells` slots.
    #[must_use]
    pub fn new(side: Side, cells: usize) -> Self {
        Self {
            side,
            slots: vec![None; cells],
        }
    }

    /// Side this formation belongs to.
    #[must_use]
    pub const fn side(&self) -> Side {
        self.side
    }

    /// Unit id at a cell.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<UnitId> {
        self.slots.get(index).copied().flatten()
    }

    /// Occupied slots in index order.
    pub fn occupied(&self) -> impl Iterator<Item = (usize, UnitId)> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| slot.map(|id| (index, id)))
    }

    /// Number of slots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Check if no slot is occupied.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(Option::is_none)
    }

    fn set(&mut self, index: usize, id: Option<UnitId>) {
        if let Some(slot) = self.slots.get_mut(index) {
            *slot = id;
        }
    }

    fn clear(&mut self) {
        self.slots.iter_mut().for_each(|slot| *slot = None);
    }
}

/// Grid, units and both formations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    grid: GridConfig,
    units: UnitStorage,
    player: Formation,
    enemy: Formation,
}

impl Board {
    /// Create an empty board.
    #[must_use]
    pub fn new(grid: GridConfig) -> Self {
        let cells = grid.cell_count();
        Self {
            grid,
            units: UnitStorage::new(),
            player: Formation::new(Side::Player, cells),
            enemy: Formation::new(Side::Enemy, cells),
        }
    }

    /// Grid geometry.
    #[must_use]
    pub fn grid(&self) -> &GridConfig {
        &self.grid
    }

    /// All units, in id order.
    #[must_use]
    pub fn units(&self) -> &UnitStorage {
        &self.units
    }

    /// Formation for a side.
    #[must_use]
    pub fn formation(&self, side: Side) -> &Formation {
        match side {
            Side::Player => &self.player,
            Side::Enemy => &self.enemy,
        }
    }

    fn formation_mut(&mut self, side: Side) -> &mut Formation {
        match side {
            Side::Player => &mut self.player,
            Side::Enemy => &mut self.enemy,
        }
    }

    /// Get a unit by id.
    #[must_use]
    pub fn unit(&self, id: UnitId) -> Option<&Unit> {
        self.units.get(id)
    }

    /// Get a mutable unit by id.
    ///
    /// Callers must not change `position` through this; use
    /// [`Board::relocate`] so the formation slots stay in sync.
    pub fn unit_mut(&mut self, id: UnitId) -> Option<&mut Unit> {
        self.units.get_mut(id)
    }

    /// The unit holding a cell, whichever side it belongs to.
    #[must_use]
    pub fn unit_at(&self, index: usize) -> Option<&Unit> {
        self.player
            .get(index)
            .or_else(|| self.enemy.get(index))
            .and_then(|id| self.units.get(id))
    }

    /// Units of a side in formation index order, living and dead.
    pub fn units_of(&self, side: Side) -> impl Iterator<Item = &Unit> + '_ {
        self.formation(side)
            .occupied()
            .filter_map(move |(_, id)| self.units.get(id))
    }

    /// Living units of a side in formation index order.
    pub fn living(&self, side: Side) -> impl Iterator<Item = &Unit> + '_ {
        self.units_of(side).filter(|unit| unit.is_alive())
    }

    /// Check if a side has any living unit.
    #[must_use]
    pub fn any_alive(&self, side: Side) -> bool {
        self.living(side).next().is_some()
    }

    /// Create a unit for `side` at `index`.
    ///
    /// Zone and budget are deployment policy and are not checked here.
    pub fn spawn(&mut self, data: &UnitData, side: Side, index: usize) -> Result<UnitId> {
        self.check_index(index)?;
        if self.unit_at(index).is_some() {
            return Err(SkirmishError::CellOccupied(index));
        }

        let id = self.units.allocate();
        self.units.units.insert(id, Unit::new(id, data, side, index));
        self.formation_mut(side).set(index, Some(id));
        Ok(id)
    }

    /// Remove and return the unit a side holds at `index`.
    pub fn remove_at(&mut self, side: Side, index: usize) -> Option<Unit> {
        let id = self.formation(side).get(index)?;
        self.formation_mut(side).set(index, None);
        self.units.units.remove(&id)
    }

    /// Move a unit to another cell, keeping slots and `position` in sync.
    ///
    /// A corpse lying on the destination is displaced: its slot is cleared
    /// and its position becomes `None`. A living occupant is an error.
    pub fn relocate(&mut self, id: UnitId, to: usize) -> Result<()> {
        self.check_index(to)?;
        let (side, from) = {
            let unit = self.units.get(id).ok_or(SkirmishError::UnitNotFound(id))?;
            (unit.side, unit.position)
        };
        if from == Some(to) {
            return Ok(());
        }

        if let Some(occupant) = self.unit_at(to) {
            if occupant.is_alive() {
                return Err(SkirmishError::CellOccupied(to));
            }
            let (corpse_id, corpse_side) = (occupant.id, occupant.side);
            self.formation_mut(corpse_side).set(to, None);
            if let Some(corpse) = self.units.get_mut(corpse_id) {
                corpse.position = None;
            }
        }

        if let Some(from) = from {
            self.formation_mut(side).set(from, None);
        }
        self.formation_mut(side).set(to, Some(id));
        if let Some(unit) = self.units.get_mut(id) {
            unit.position = Some(to);
        }
        Ok(())
    }

    /// Remove every unit belonging to a side.
    pub fn clear_side(&mut self, side: Side) {
        self.formation_mut(side).clear();
        self.units.units.retain(|_, unit| unit.side != side);
    }

    fn check_index(&self, index: usize) -> Result<()> {
        if self.grid.contains_index(index) {
            Ok(())
        } else {
            Err(SkirmishError::OutOfBounds {
                index,
                width: self.grid.width,
                height: self.grid.height,
            })
        }
    }

    /// Verify the board invariants, returning a description of the first
    /// violation found.
    #[must_use]
    pub fn validate(&self) -> Option<String> {
        for index in 0..self.grid.cell_count() {
            if self.player.get(index).is_some() && self.enemy.get(index).is_some() {
                return Some(format!("cell {index} held by both formations"));
            }
        }
        for side in [Side::Player, Side::Enemy] {
            for (index, id) in self.formation(side).occupied() {
                let Some(unit) = self.units.get(id) else {
                    return Some(format!("slot {index} points at missing unit {id}"));
                };
                if unit.position != Some(index) || unit.side != side {
                    return Some(format!("unit {} out of sync with slot {index}", unit.name));
                }
            }
        }
        None
    }
}
