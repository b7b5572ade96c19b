//! Determinism testing utilities.
//!
//! Provides a harness for verifying that battles produce identical results
//! given identical inputs.
//!
//! # Testing Strategy
//!
//! A battle must replay identically from the same placements and seed.
//! Sources of non-determinism include:
//!
//! - **Floating-point math**: percentage modifiers go through
//!   [`skirmish_core::math::Fixed`] instead.
//!
//! - **Iteration order**: units live in a `BTreeMap` and are scanned in
//!   formation index order, never in hash order.
//!
//! - **Randomness**: enemy generation only ever draws from an injected,
//!   seeded RNG.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use skirmish_core::battle::Battle;

/// Result of a determinism test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeterminismResult {
    /// Whether all runs produced identical results.
    pub is_deterministic: bool,
    /// Hashes from each run.
    pub hashes: Vec<u64>,
    /// Number of steps taken per run.
    pub steps: u64,
}

impl DeterminismResult {
    /// Get all unique hashes (should be 1 for a deterministic battle).
    #[must_use]
    pub fn unique_hashes(&self) -> Vec<u64> {
        let mut unique: Vec<u64> = self.hashes.clone();
        unique.sort_unstable();
        unique.dedup();
        unique
    }

    /// Assert that every run matched, with a detailed error message.
    ///
    /// # Panics
    ///
    /// Panics if the runs produced different hashes.
    pub fn assert_deterministic(&self) {
        if !self.is_deterministic {
            let unique = self.unique_hashes();
            panic!(
                "Battle is non-deterministic!\n\
                 Runs: {}\n\
                 Steps: {}\n\
                 Unique hashes: {} (expected 1)\n\
                 All hashes: {:?}",
                self.hashes.len(),
                self.steps,
                unique.len(),
                self.hashes
            );
        }
    }
}

/// Run a stateful process several times and verify every run ends in the
/// same state.
///
/// # Arguments
///
/// * `runs` - Number of independent runs
/// * `steps` - Number of steps per run
/// * `setup` - Creates the initial state
/// * `step` - Advances the state by one step
/// * `hash` - Computes the state hash
pub fn verify_determinism<S, Setup, Step, HashFn>(
    runs: usize,
    steps: u64,
    setup: Setup,
    step: Step,
    hash: HashFn,
) -> DeterminismResult
where
    Setup: Fn() -> S,
    Step: Fn(&mut S),
    HashFn: Fn(&S) -> u64,
{
    let mut hashes = Vec::with_capacity(runs);

    for _ in 0..runs {
        let mut state = setup();

        for _ in 0..steps {
            step(&mut state);
        }

        hashes.push(hash(&state));
    }

    let is_deterministic = hashes.windows(2).all(|w| w[0] == w[1]);

    DeterminismResult {
        is_deterministic,
        hashes,
        steps,
    }
}

/// Run two battles from the same setup for `steps` steps and compare.
///
/// `setup` should return a battle that has already been started.
pub fn verify_battle_determinism<F>(setup: F, steps: u64) -> bool
where
    F: Fn() -> Battle,
{
    verify_determinism(
        2,
        steps,
        &setup,
        |battle| {
            battle.step();
        },
        Battle::state_hash,
    )
    .is_deterministic
}

/// Step two battles side by side and report the first step where they
/// differ, or `None` if they never do.
pub fn find_first_divergence<F>(setup: F, steps: u64) -> Option<u64>
where
    F: Fn() -> Battle,
{
    let mut first = setup();
    let mut second = setup();

    if first.state_hash() != second.state_hash() {
        return Some(0);
    }

    for step in 1..=steps {
        first.step();
        second.step();

        if first.state_hash() != second.state_hash() {
            tracing::warn!(step, "Battles diverged");
            return Some(step);
        }
    }

    None
}

/// Check that a bincode round-trip mid-battle preserves the state, and that
/// the restored copy keeps playing out identically.
pub fn verify_serialization_determinism<F>(setup: F, steps: u64) -> bool
where
    F: Fn() -> Battle,
{
    let mut battle = setup();
    for _ in 0..steps {
        battle.step();
    }

    let Ok(bytes) = battle.serialize() else {
        return false;
    };
    let Ok(mut restored) = Battle::deserialize(&bytes) else {
        return false;
    };
    if restored.state_hash() != battle.state_hash() {
        return false;
    }

    battle.run_to_completion();
    restored.run_to_completion();
    restored.state_hash() == battle.state_hash()
}

/// Compute a simple hash for any hashable value.
pub fn compute_hash<T: Hash>(value: &T) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

/// Proptest strategies for battle setups.
pub mod strategies {
    use proptest::prelude::*;
    use skirmish_core::grid::{GridConfig, Side};
    use skirmish_core::unit::UnitClass;

    /// Any unit class.
    pub fn arb_class() -> impl Strategy<Value = UnitClass> {
        proptest::sample::select(UnitClass::ALL.to_vec())
    }

    /// Classes that only ever fight in melee and never heal.
    pub fn arb_melee_class() -> impl Strategy<Value = UnitClass> {
        proptest::sample::select(vec![UnitClass::Knight, UnitClass::Goblin, UnitClass::Ogre])
    }

    /// Up to `max_units` units for `side`, each on a distinct cell of that
    /// side's zone on the default grid. Budget is not enforced.
    pub fn arb_squad(side: Side, max_units: usize) -> impl Strategy<Value = Vec<(UnitClass, usize)>> {
        squad_of(side, max_units, arb_class)
    }

    /// Player and enemy squads together, tagged by side.
    pub fn arb_matchup(max_per_side: usize) -> impl Strategy<Value = Vec<(Side, UnitClass, usize)>> {
        matchup_of(max_per_side, arb_class)
    }

    /// [`arb_matchup`] restricted to [`arb_melee_class`] units.
    pub fn arb_melee_matchup(
        max_per_side: usize,
    ) -> impl Strategy<Value = Vec<(Side, UnitClass, usize)>> {
        matchup_of(max_per_side, arb_melee_class)
    }

    fn squad_of<S>(
        side: Side,
        max_units: usize,
        classes: fn() -> S,
    ) -> impl Strategy<Value = Vec<(UnitClass, usize)>>
    where
        S: Strategy<Value = UnitClass>,
    {
        let cells = GridConfig::default().zone_cells(side);
        let max_units = max_units.min(cells.len());
        proptest::sample::subsequence(cells, 1..=max_units).prop_flat_map(move |cells| {
            let count = cells.len();
            proptest::collection::vec(classes(), count).prop_map(move |picked| {
                picked.into_iter().zip(cells.iter().copied()).collect()
            })
        })
    }

    fn matchup_of<S>(
        max_per_side: usize,
        classes: fn() -> S,
    ) -> impl Strategy<Value = Vec<(Side, UnitClass, usize)>>
    where
        S: Strategy<Value = UnitClass>,
    {
        (
            squad_of(Side::Player, max_per_side, classes),
            squad_of(Side::Enemy, max_per_side, classes),
        )
            .prop_map(|(player, enemy)| {
                player
                    .into_iter()
                    .map(|(class, index)| (Side::Player, class, index))
                    .chain(
                        enemy
                            .into_iter()
                            .map(|(class, index)| (Side::Enemy, class, index)),
                    )
                    .collect()
            })
    }

    /// Attack stat values.
    pub fn arb_attack() -> impl Strategy<Value = u32> {
        0u32..50u32
    }

    /// Defense stat values.
    pub fn arb_defense() -> impl Strategy<Value = u32> {
        0u32..50u32
    }

    /// Damage amounts.
    pub fn arb_damage() -> impl Strategy<Value = u32> {
        0u32..200u32
    }

    /// RNG seeds.
    pub fn arb_seed() -> impl Strategy<Value = u64> {
        any::<u64>()
    }
}
