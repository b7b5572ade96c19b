//! Deployment policy and enemy squad generation.
//!
//! Nothing here is combat logic. Placement checks enforce zone and budget
//! rules before a unit reaches the board, and generation fills the enemy
//! zone from an injected random source so tests can pin the outcome.

use rand::seq::SliceRandom;
use rand::{Rng, RngCore};
use tracing::debug;

use crate::data::UnitRoster;
use crate::error::{Result, SkirmishError};
use crate::formation::{Board, UnitId};
use crate::grid::Side;
use crate::unit::UnitClass;

/// Total deployment cost of a side's units.
#[must_use]
pub fn team_cost(board: &Board, roster: &UnitRoster, side: Side) -> u32 {
    board
        .units_of(side)
        .map(|unit| roster.cost(unit.class))
        .sum()
}

/// Budget still unspent by a side.
#[must_use]
pub fn remaining_budget(board: &Board, roster: &UnitRoster, side: Side, budget: u32) -> u32 {
    budget.saturating_sub(team_cost(board, roster, side))
}

/// Check whether `class` may be deployed for `side` at `index`.
///
/// The player may only field [`UnitClass::PLAYER_CLASSES`]; enemy squads
/// take any class. A unit of the same side already on that cell would be replaced, so its
/// cost is refunded before the budget check. A unit of the other side
/// blocks the cell.
pub fn check_placement(
    board: &Board,
    roster: &UnitRoster,
    side: Side,
    class: UnitClass,
    index: usize,
    budget: u32,
) -> Result<()> {
    let grid = board.grid();
    if !grid.contains_index(index) {
        return Err(SkirmishError::OutOfBounds {
            index,
            width: grid.width,
            height: grid.height,
        });
    }
    if !grid.in_zone(side, index) {
        return Err(SkirmishError::OutOfZone { index, side });
    }
    if !class.deployable_by(side) {
        return Err(SkirmishError::ClassNotAllowed { class, side });
    }

    let refund = match board.unit_at(index) {
        Some(existing) if existing.side != side => {
            return Err(SkirmishError::CellOccupied(index));
        }
        Some(existing) => roster.cost(existing.class),
        None => 0,
    };
    let required = team_cost(board, roster, side) - refund + roster.cost(class);
    if required > budget {
        return Err(SkirmishError::OverBudget { required, budget });
    }
    Ok(())
}

/// Decides which unit classes the enemy squad may draw from.
pub trait EnemyPolicy {
    /// Pool of classes for one generated squad.
    fn candidate_classes(&self, rng: &mut dyn RngCore) -> Vec<UnitClass>;
}

/// Goblins and Ogres, with Archers mixed in half of the time.
#[derive(Debug, Clone, Copy, Default)]
pub struct VarietyPolicy;

impl EnemyPolicy for VarietyPolicy {
    fn candidate_classes(&self, rng: &mut dyn RngCore) -> Vec<UnitClass> {
        let mut pool = vec![UnitClass::Goblin, UnitClass::Ogre];
        if rng.gen_bool(0.5) {
            pool.push(UnitClass::Archer);
        }
        pool
    }
}

/// Always the same pool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixedPoolPolicy(pub Vec<UnitClass>);

impl EnemyPolicy for FixedPoolPolicy {
    fn candidate_classes(&self, _rng: &mut dyn RngCore) -> Vec<UnitClass> {
        self.0.clone()
    }
}

/// Replace the enemy squad with a freshly generated one.
///
/// Free enemy-zone cells are shuffled, then each cell in turn receives a
/// random class from the policy's pool that still fits the budget. Stops
/// when the budget is spent, nothing affordable remains, or cells run out.
pub fn generate_enemy_team(
    board: &mut Board,
    roster: &UnitRoster,
    policy: &dyn EnemyPolicy,
    budget: u32,
    rng: &mut dyn RngCore,
) -> Result<Vec<UnitId>> {
    board.clear_side(Side::Enemy);

    let mut cells: Vec<usize> = board
        .grid()
        .zone_cells(Side::Enemy)
        .into_iter()
        .filter(|&index| board.unit_at(index).is_none())
        .collect();
    cells.shuffle(rng);
    let pool = policy.candidate_classes(rng);

    let mut remaining = budget;
    let mut spawned = Vec::new();
    while remaining > 0 {
        let affordable: Vec<UnitClass> = pool
            .iter()
            .copied()
            .filter(|&class| roster.cost(class) <= remaining)
            .collect();
        let Some(&class) = affordable.choose(rng) else {
            break;
        };
        let Some(index) = cells.pop() else {
            break;
        };
        spawned.push(board.spawn(roster.get(class), Side::Enemy, index)?);
        remaining -= roster.cost(class);
    }

    debug!(
        units = spawned.len(),
        spent = budget - remaining,
        "Generated enemy squad"
    );
    Ok(spawned)
}
