//! Target selection.
//!
//! Picks the single best enemy an acting unit can reach from where it
//! stands. The baseline is lowest current health; classes then apply
//! their own preference:
//!
//! - **Archer**: lowest defense among targets with defense below
//!   [`WEAK_DEFENSE_THRESHOLD`], falling back to the baseline.
//! - **Mage**: baseline (its spell picks its own target set).
//! - **Everyone else**: health first when two targets differ by more than
//!   [`HEALTH_TIE_WINDOW`], otherwise the closer one.
//!
//! Remaining ties go to the first candidate in formation index order.

use crate::formation::{Board, UnitId};
use crate::spatial::distance;
use crate::unit::{Unit, UnitClass};

/// Defense below which an Archer considers a target exposed.
pub const WEAK_DEFENSE_THRESHOLD: u32 = 5;

/// Health gap within which melee classes prefer the nearer target.
pub const HEALTH_TIE_WINDOW: u32 = 10;

/// Living enemies of `actor` within its range, in formation index order.
#[must_use]
pub fn enemies_in_range<'a>(board: &'a Board, actor: &Unit) -> Vec<&'a Unit> {
    let grid = board.grid();
    board
        .living(actor.side.opponent())
        .filter(|enemy| distance(grid, actor.position, enemy.position) <= actor.range)
        .collect()
}

/// Choose the best in-range target for `actor`, if any.
#[must_use]
pub fn select_target(board: &Board, actor: &Unit) -> Option<UnitId> {
    let candidates = enemies_in_range(board, actor);
    if candidates.is_empty() {
        return None;
    }

    // Stable sort keeps formation order among equal health.
    let mut by_health = candidates.clone();
    by_health.sort_by_key(|unit| unit.hp());

    let chosen = match actor.class {
        UnitClass::Archer => candidates
            .iter()
            .filter(|unit| unit.defense < WEAK_DEFENSE_THRESHOLD)
            .min_by_key(|unit| unit.defense)
            .copied()
            .or_else(|| by_health.first().copied()),
        UnitClass::Mage => by_health.first().copied(),
        _ => weakest_nearby(board, actor, &by_health),
    };

    chosen.map(|unit| unit.id)
}

/// Single pass over health-ordered candidates.
///
/// A challenger replaces the current pick when it has clearly less health,
/// or, with health inside the tie window, when it is strictly closer.
///
/// The comparison is not transitive, so the result depends on the pass
/// order. Candidates are visited weakest first and each step only compares
/// against the current pick: a chain of near ties that keeps getting closer
/// can end on a target well outside the tie window of the weakest one.
fn weakest_nearby<'a>(board: &Board, actor: &Unit, by_health: &[&'a Unit]) -> Option<&'a Unit> {
    let grid = board.grid();
    let reach = |unit: &Unit| distance(grid, actor.position, unit.position);

    let (&first, rest) = by_health.split_first()?;
    let best = rest.iter().fold(first, |best, &challenger| {
        let better = if best.hp().abs_diff(challenger.hp()) > HEALTH_TIE_WINDOW {
            challenger.hp() < best.hp()
        } else {
            reach(challenger) < reach(best)
        };
        if better {
            challenger
        } else {
            best
        }
    });
    Some(best)
}
