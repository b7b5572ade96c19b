//! Read-only board snapshots for renderers.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::formation::{Board, UnitId};
use crate::grid::Side;
use crate::unit::UnitClass;

/// What a renderer needs to know about one unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitView {
    /// Unit id.
    pub id: UnitId,
    /// Display name.
    pub name: String,
    /// Class.
    pub class: UnitClass,
    /// Owning side.
    pub side: Side,
    /// Current health.
    pub hp: u32,
    /// Maximum health.
    pub max_hp: u32,
    /// Whether it is still fighting.
    pub alive: bool,
}

/// Cell-by-cell copy of the board at one moment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardSnapshot {
    /// Grid width.
    pub width: usize,
    /// Grid height.
    pub height: usize,
    /// One entry per cell in index order.
    pub cells: Vec<Option<UnitView>>,
}

impl BoardSnapshot {
    /// Copy the current state of `board`.
    #[must_use]
    pub fn capture(board: &Board) -> Self {
        let grid = board.grid();
        let cells = (0..grid.cell_count())
            .map(|index| {
                board.unit_at(index).map(|unit| UnitView {
                    id: unit.id,
                    name: unit.name.clone(),
                    class: unit.class,
                    side: unit.side,
                    hp: unit.hp(),
                    max_hp: unit.max_hp(),
                    alive: unit.is_alive(),
                })
            })
            .collect();
        Self {
            width: grid.width,
            height: grid.height,
            cells,
        }
    }

    /// View of the unit at `index`, if any.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&UnitView> {
        self.cells.get(index).and_then(Option::as_ref)
    }

    /// Units of one side, in cell order.
    pub fn units(&self, side: Side) -> impl Iterator<Item = &UnitView> + '_ {
        self.cells
            .iter()
            .flatten()
            .filter(move |view| view.side == side)
    }

    /// Number of living units on one side.
    #[must_use]
    pub fn living_count(&self, side: Side) -> usize {
        self.units(side).filter(|view| view.alive).count()
    }
}

fn glyph(view: &UnitView) -> char {
    if !view.alive {
        return '+';
    }
    let letter = match view.class {
        UnitClass::Knight => 'K',
        UnitClass::Archer => 'A',
        UnitClass::Mage => 'M',
        UnitClass::Healer => 'H',
        UnitClass::Goblin => 'G',
        UnitClass::Ogre => 'O',
    };
    match view.side {
        Side::Player => letter,
        Side::Enemy => letter.to_ascii_lowercase(),
    }
}

/// Text grid: player units upper-case, enemies lower-case, corpses `+`.
impl fmt::Display for BoardSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in self.cells.chunks(self.width.max(1)) {
            let line: String = row
                .iter()
                .map(|cell| cell.as_ref().map_or('.', glyph))
                .collect();
            writeln!(f, "{line}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::UnitRoster;
    use crate::grid::GridConfig;
    use crate::unit::Delivery;

    #[test]
    fn test_snapshot_and_render() {
        let roster = UnitRoster::standard();
        let mut board = Board::new(GridConfig::default());
        board
            .spawn(roster.get(UnitClass::Knight), Side::Player, 0)
            .unwrap();
        let goblin = board
            .spawn(roster.get(UnitClass::Goblin), Side::Enemy, 7)
            .unwrap();
        board
            .spawn(roster.get(UnitClass::Ogre), Side::Enemy, 15)
            .unwrap();
        board
            .unit_mut(goblin)
            .unwrap()
            .take_damage(100, Delivery::Melee);

        let snapshot = BoardSnapshot::capture(&board);
        assert_eq!(snapshot.cells.len(), 24);
        assert_eq!(snapshot.get(0).unwrap().hp, 50);
        assert!(!snapshot.get(7).unwrap().alive);
        assert_eq!(snapshot.living_count(Side::Enemy), 1);
        assert_eq!(snapshot.units(Side::Enemy).count(), 2);
        assert_eq!(snapshot.to_string(), "K......+\n.......o\n........\n");
    }
}
