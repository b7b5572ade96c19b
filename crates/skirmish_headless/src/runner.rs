//! Single-battle runner.
//!
//! Turns a [`Scenario`] plus a seed into a started [`Battle`], plays it out
//! and condenses the outcome into a [`BattleReport`].

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use skirmish_core::prelude::*;
use std::result::Result;
use tracing::{debug, info};

use crate::scenario::{EnemySetup, Scenario, ScenarioError};

/// Outcome of one headless battle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BattleReport {
    /// Scenario name.
    pub scenario: String,
    /// Seed used for enemy generation.
    pub seed: u64,
    /// Final result.
    pub result: BattleResult,
    /// Why the battle ended.
    pub reason: EndReason,
    /// Unit-turns resolved.
    pub turns: u32,
    /// Living player units at the end.
    pub player_survivors: usize,
    /// Living enemy units at the end.
    pub enemy_survivors: usize,
    /// Hash of the final battle state.
    pub state_hash: u64,
    /// Final board.
    pub final_board: BoardSnapshot,
    /// Every event from the start of the battle to its end.
    pub events: Vec<BattleEvent>,
}

impl BattleReport {
    /// The battle log, one line per event.
    pub fn log_lines(&self) -> impl Iterator<Item = String> + '_ {
        self.events.iter().map(ToString::to_string)
    }
}

/// Deploy both squads and start the battle.
///
/// Generated enemies are placed before the player squad, so the same seed
/// always yields the same enemy team regardless of the player's choices.
pub fn prepare_battle(
    scenario: &Scenario,
    roster: &UnitRoster,
    seed: u64,
) -> Result<(Battle, Vec<BattleEvent>), ScenarioError> {
    let mut battle = Battle::new(scenario.battle_config(), roster.clone());

    match &scenario.enemy {
        EnemySetup::Generated => {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            battle.reset(&mut rng)?;
        }
        EnemySetup::Fixed(placements) => {
            for placement in placements {
                battle.place_unit_for(Side::Enemy, placement.class, placement.cell)?;
            }
        }
    }
    for placement in &scenario.player {
        battle.place_unit(placement.class, placement.cell)?;
    }

    debug!(scenario = %scenario.name, seed, "Squads deployed");
    let events = battle.start_battle()?;
    Ok((battle, events))
}

/// Play a scenario to the end.
pub fn run_scenario(
    scenario: &Scenario,
    roster: &UnitRoster,
    seed: u64,
) -> Result<BattleReport, ScenarioError> {
    let (mut battle, mut events) = prepare_battle(scenario, roster, seed)?;
    events.extend(battle.run_to_completion());

    let (Some(result), Some(reason)) = (battle.result(), battle.end_reason()) else {
        return Err(ScenarioError::Unfinished(scenario.name.clone()));
    };
    let final_board = battle.snapshot();

    info!(
        scenario = %scenario.name,
        seed,
        %result,
        turns = battle.turns_taken(),
        "Battle finished"
    );

    Ok(BattleReport {
        scenario: scenario.name.clone(),
        seed,
        result,
        reason,
        turns: battle.turns_taken(),
        player_survivors: final_board.living_count(Side::Player),
        enemy_survivors: final_board.living_count(Side::Enemy),
        state_hash: battle.state_hash(),
        final_board,
        events,
    })
}
