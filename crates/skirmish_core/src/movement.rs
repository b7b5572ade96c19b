//! Single-step movement planning.
//!
//! A unit with nothing in range takes at most one orthogonal step per
//! turn toward the closest living enemy, then targeting is re-run from the
//! new cell. Melee units try to spread out around their quarry first:
//!
//! 1. Collect the open cells next to the quarry.
//! 2. If allies already stand next to it, prefer a side nobody covers yet,
//!    checked above, below, left, right.
//! 3. Otherwise (or if every uncovered side is blocked) head for the open
//!    cell nearest the mover.
//! 4. Step along whichever axis brings the mover closest to that cell.
//!
//! If that yields no legal step, or the unit is not melee, it takes the
//! first legal axis step toward the quarry itself (rows before columns).

use crate::error::{Result, SkirmishError};
use crate::formation::{Board, UnitId};
use crate::grid::{Cell, Side};
use crate::spatial::{distance, is_occupied, neighbours, open_cell, Direction};
use crate::targeting::{enemies_in_range, select_target};

/// Outcome of movement planning for one unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MovePlan {
    /// Target chosen after any move.
    pub target: Option<UnitId>,
    /// Cell the unit started the turn on.
    pub old_position: Option<usize>,
    /// Cell the unit ends up on.
    pub new_position: Option<usize>,
}

impl MovePlan {
    fn stay(position: Option<usize>, target: Option<UnitId>) -> Self {
        Self {
            target,
            old_position: position,
            new_position: position,
        }
    }

    /// Whether the unit changed cell.
    #[must_use]
    pub fn moved(&self) -> bool {
        self.old_position != self.new_position
    }
}

/// Plan and apply the move for `id`, returning the target it ends up with.
///
/// The board is updated in place; the unit's formation slot follows it.
pub fn plan_move(board: &mut Board, id: UnitId) -> Result<MovePlan> {
    let actor = board.unit(id).ok_or(SkirmishError::UnitNotFound(id))?;
    let old_position = actor.position;

    if !enemies_in_range(board, actor).is_empty() {
        return Ok(MovePlan::stay(old_position, select_target(board, actor)));
    }
    let Some(from) = old_position else {
        return Ok(MovePlan::stay(None, None));
    };
    let Some(quarry) = closest_enemy(board, actor.side, from) else {
        return Ok(MovePlan::stay(old_position, None));
    };

    let flank = if actor.is_melee() {
        flanking_step(board, actor.side, from, quarry)
    } else {
        None
    };
    let Some(to) = flank.or_else(|| direct_step(board, from, quarry)) else {
        return Ok(MovePlan::stay(old_position, None));
    };

    board.relocate(id, to)?;
    let actor = board.unit(id).ok_or(SkirmishError::UnitNotFound(id))?;
    Ok(MovePlan {
        target: select_target(board, actor),
        old_position,
        new_position: Some(to),
    })
}

/// One combined row-and-column step from `from` toward `to`.
///
/// Used by support units chasing an ally; `None` when the step would
/// leave the grid or land on a living unit.
#[must_use]
pub fn diagonal_step(board: &Board, from: usize, to: usize) -> Option<usize> {
    let grid = board.grid();
    let (here, there) = (grid.cell_of(from), grid.cell_of(to));
    let next = Cell::new(
        Cell::toward(here.row, there.row),
        Cell::toward(here.col, there.col),
    );
    if next == here {
        return None;
    }
    open_cell(board, next)
}

/// Cell of the nearest living enemy of `side`, first in formation order on ties.
fn closest_enemy(board: &Board, side: Side, from: usize) -> Option<usize> {
    let grid = board.grid();
    board
        .living(side.opponent())
        .filter_map(|enemy| enemy.position)
        .min_by_key(|&cell| distance(grid, Some(from), Some(cell)))
}

fn flanking_step(board: &Board, side: Side, from: usize, quarry: usize) -> Option<usize> {
    let grid = board.grid();
    let open: Vec<(Direction, usize)> = neighbours(grid, quarry)
        .into_iter()
        .filter(|&(_, index)| !is_occupied(board, index))
        .collect();
    if open.is_empty() {
        return None;
    }

    let centre = grid.cell_of(quarry);
    let covered: Vec<Direction> = board
        .living(side)
        .filter_map(|ally| ally.position)
        .filter(|&cell| distance(grid, Some(cell), Some(quarry)) == 1)
        .filter_map(|cell| Direction::classify(centre, grid.cell_of(cell)))
        .collect();

    let nearest = || {
        open.iter()
            .min_by_key(|&&(_, index)| distance(grid, Some(from), Some(index)))
            .map(|&(_, index)| index)
    };
    let destination = if covered.is_empty() {
        nearest()
    } else {
        Direction::PRIORITY
            .iter()
            .filter(|dir| !covered.contains(dir))
            .find_map(|dir| {
                open.iter()
                    .find(|(facing, _)| facing == dir)
                    .map(|&(_, index)| index)
            })
            .or_else(nearest)
    }?;

    let goal = grid.cell_of(destination);
    axis_steps(grid.cell_of(from), goal)
        .into_iter()
        .filter_map(|cell| open_cell(board, cell).map(|index| (cell, index)))
        .min_by_key(|(cell, _)| cell.manhattan(goal))
        .map(|(_, index)| index)
}

fn direct_step(board: &Board, from: usize, quarry: usize) -> Option<usize> {
    let grid = board.grid();
    axis_steps(grid.cell_of(from), grid.cell_of(quarry))
        .into_iter()
        .find_map(|cell| open_cell(board, cell))
}

/// Row step then column step from `from` toward `to`, skipping aligned axes.
fn axis_steps(from: Cell, to: Cell) -> Vec<Cell> {
    let mut steps = Vec::with_capacity(2);
    if from.row != to.row {
        steps.push(Cell::new(Cell::toward(from.row, to.row), from.col));
    }
    if from.col != to.col {
        steps.push(Cell::new(from.row, Cell::toward(from.col, to.col)));
    }
    steps
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::UnitRoster;
    use crate::grid::GridConfig;
    use crate::unit::{Delivery, UnitClass};

    fn setup(units: &[(UnitClass, Side, usize)]) -> (Board, Vec<UnitId>) {
        let roster = UnitRoster::standard();
        let mut board = Board::new(GridConfig::default());
        let ids = units
            .iter()
            .map(|&(class, side, index)| board.spawn(roster.get(class), side, index).unwrap())
            .collect();
        (board, ids)
    }

    #[test]
    fn test_in_range_does_not_move() {
        let (mut board, ids) = setup(&[
            (UnitClass::Knight, Side::Player, 3),
            (UnitClass::Goblin, Side::Enemy, 4),
        ]);
        let plan = plan_move(&mut board, ids[0]).unwrap();
        assert!(!plan.moved());
        assert_eq!(plan.target, Some(ids[1]));
        assert_eq!(board.unit(ids[0]).unwrap().position, Some(3));
    }

    #[test]
    fn test_ranged_unit_steps_rows_first() {
        let (mut board, ids) = setup(&[
            (UnitClass::Archer, Side::Player, 0),
            (UnitClass::Goblin, Side::Enemy, 23),
        ]);
        let plan = plan_move(&mut board, ids[0]).unwrap();
        assert_eq!(plan.old_position, Some(0));
        assert_eq!(plan.new_position, Some(8));
        assert_eq!(plan.target, None);
        assert_eq!(board.formation(Side::Player).get(8), Some(ids[0]));
        assert_eq!(board.formation(Side::Player).get(0), None);
    }

    #[test]
    fn test_move_brings_target_into_range() {
        let (mut board, ids) = setup(&[
            (UnitClass::Knight, Side::Player, 2),
            (UnitClass::Goblin, Side::Enemy, 4),
        ]);
        let plan = plan_move(&mut board, ids[0]).unwrap();
        assert_eq!(plan.new_position, Some(3));
        assert_eq!(plan.target, Some(ids[1]));
    }

    #[test]
    fn test_melee_heads_for_nearest_open_side() {
        let (mut board, ids) = setup(&[
            (UnitClass::Knight, Side::Player, 0),
            (UnitClass::Goblin, Side::Enemy, 5),
        ]);
        // Open sides of cell 5: below (13), left (4), right (6). Left is nearest.
        let plan = plan_move(&mut board, ids[0]).unwrap();
        assert_eq!(plan.new_position, Some(1));
    }

    #[test]
    fn test_melee_flanks_uncovered_side() {
        let (mut board, ids) = setup(&[
            (UnitClass::Knight, Side::Player, 8),
            (UnitClass::Knight, Side::Player, 4),
            (UnitClass::Goblin, Side::Enemy, 12),
        ]);
        // An ally holds the cell above the goblin, so the next free side in
        // priority order is below (20). Row and column steps tie on
        // distance to it and the row step wins.
        let plan = plan_move(&mut board, ids[0]).unwrap();
        assert_eq!(plan.new_position, Some(16));
    }

    #[test]
    fn test_enemy_neighbours_do_not_count_as_flankers() {
        let (mut board, ids) = setup(&[
            (UnitClass::Knight, Side::Player, 8),
            (UnitClass::Ogre, Side::Enemy, 4),
            (UnitClass::Goblin, Side::Enemy, 12),
        ]);
        // Without a covering ally the knight goes for the nearest open cell (11).
        let plan = plan_move(&mut board, ids[0]).unwrap();
        assert_eq!(plan.new_position, Some(9));
    }

    #[test]
    fn test_blocked_flank_falls_back_to_direct_step() {
        let (mut board, ids) = setup(&[
            (UnitClass::Knight, Side::Player, 0),
            (UnitClass::Healer, Side::Player, 1),
            (UnitClass::Goblin, Side::Enemy, 13),
        ]);
        // Flanking wants the cell above the goblin (5), reachable only
        // through the healer's cell. The direct step goes down a row.
        let plan = plan_move(&mut board, ids[0]).unwrap();
        assert_eq!(plan.new_position, Some(8));
    }

    #[test]
    fn test_boxed_in_unit_stays() {
        let (mut board, ids) = setup(&[
            (UnitClass::Knight, Side::Player, 0),
            (UnitClass::Healer, Side::Player, 1),
            (UnitClass::Healer, Side::Player, 8),
            (UnitClass::Goblin, Side::Enemy, 23),
        ]);
        let plan = plan_move(&mut board, ids[0]).unwrap();
        assert!(!plan.moved());
        assert_eq!(plan.target, None);
    }

    #[test]
    fn test_no_living_enemies_means_no_move() {
        let (mut board, ids) = setup(&[
            (UnitClass::Knight, Side::Player, 0),
            (UnitClass::Goblin, Side::Enemy, 7),
        ]);
        board
            .unit_mut(ids[1])
            .unwrap()
            .take_damage(1000, Delivery::Melee);
        let plan = plan_move(&mut board, ids[0]).unwrap();
        assert!(!plan.moved());
        assert_eq!(plan.target, None);
    }

    #[test]
    fn test_step_onto_corpse_displaces_it() {
        let (mut board, ids) = setup(&[
            (UnitClass::Archer, Side::Player, 0),
            (UnitClass::Goblin, Side::Enemy, 8),
            (UnitClass::Goblin, Side::Enemy, 23),
        ]);
        board
            .unit_mut(ids[1])
            .unwrap()
            .take_damage(1000, Delivery::Melee);
        let plan = plan_move(&mut board, ids[0]).unwrap();
        assert_eq!(plan.new_position, Some(8));
        assert_eq!(board.unit(ids[1]).unwrap().position, None);
        assert!(board.validate().is_none());
    }

    #[test]
    fn test_diagonal_step() {
        let (board, _) = setup(&[(UnitClass::Healer, Side::Player, 0)]);
        assert_eq!(diagonal_step(&board, 0, 12), Some(9));
        assert_eq!(diagonal_step(&board, 0, 3), Some(1));
        assert_eq!(diagonal_step(&board, 9, 9), None);

        let (board, _) = setup(&[
            (UnitClass::Healer, Side::Player, 0),
            (UnitClass::Knight, Side::Player, 9),
        ]);
        assert_eq!(diagonal_step(&board, 0, 12), None);
    }
}
