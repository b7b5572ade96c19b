//! Test fixtures and helpers.
//!
//! Pre-built boards and battles for consistent testing.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use skirmish_core::prelude::*;

/// Seeded RNG used by every fixture that needs randomness.
#[must_use]
pub fn seeded_rng(seed: u64) -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(seed)
}

/// A 12-point player squad: knight up front, archer, healer and mage behind.
#[must_use]
pub fn standard_player_squad() -> Vec<(UnitClass, usize)> {
    vec![
        (UnitClass::Knight, 10),
        (UnitClass::Archer, 2),
        (UnitClass::Healer, 9),
        (UnitClass::Mage, 17),
    ]
}

/// Board with units spawned exactly where asked, ignoring zones and budget.
///
/// # Panics
///
/// Panics if two units share a cell or a cell is off the grid.
#[must_use]
pub fn board_with(units: &[(Side, UnitClass, usize)]) -> Board {
    let roster = UnitRoster::standard();
    let mut board = Board::new(GridConfig::default());
    for &(side, class, index) in units {
        board
            .spawn(roster.get(class), side, index)
            .expect("fixture placement must be valid");
    }
    board
}

/// Battle in setup around [`board_with`].
#[must_use]
pub fn battle_with(units: &[(Side, UnitClass, usize)]) -> Battle {
    Battle::with_board(
        BattleConfig::default(),
        UnitRoster::standard(),
        board_with(units),
    )
}

/// Battle already in the `Battle` phase.
///
/// # Panics
///
/// Panics if the board has no living player unit.
#[must_use]
pub fn started_battle(units: &[(Side, UnitClass, usize)]) -> Battle {
    let mut battle = battle_with(units);
    battle.start_battle().expect("fixture battle must start");
    battle
}

/// The standard player squad against an enemy squad generated from `seed`.
///
/// Left in setup so callers can inspect or tweak it before starting.
///
/// # Panics
///
/// Panics if the standard squad no longer fits the default budget.
#[must_use]
pub fn skirmish(seed: u64) -> Battle {
    let mut battle = Battle::new(BattleConfig::default(), UnitRoster::standard());
    let mut rng = seeded_rng(seed);
    battle
        .reset(&mut rng)
        .expect("enemy generation must succeed");
    for (class, index) in standard_player_squad() {
        battle
            .place_unit(class, index)
            .expect("standard squad must be placeable");
    }
    battle
}
