//! End-to-end battle scenarios.
//!
//! Drives whole turns through the public API and checks the numbers a
//! player would see in the battle log.

use std::collections::BTreeMap;

use skirmish_core::abilities::resolve_turn;
use skirmish_core::prelude::*;
use skirmish_test_utils::fixtures::{board_with, seeded_rng, skirmish, started_battle};

fn spell_hits(events: &[BattleEvent]) -> Vec<(UnitId, u32)> {
    events
        .iter()
        .filter_map(|event| match event {
            BattleEvent::Attacked {
                target,
                kind: AttackKind::Spell,
                ranged: true,
                dealt,
                ..
            } => Some((target.id, *dealt)),
            _ => None,
        })
        .collect()
}

#[test]
fn archer_shot_leaves_knight_at_49() {
    let mut battle = started_battle(&[
        (Side::Player, UnitClass::Archer, 2),
        (Side::Enemy, UnitClass::Knight, 5),
    ]);
    let knight = battle.board().formation(Side::Enemy).get(5).unwrap();

    // Knight (speed 4) closes in first, then the archer shoots.
    battle.step();
    let outcome = battle.step();

    assert_eq!(battle.board().unit(knight).unwrap().hp(), 49);
    assert!(outcome.events.iter().any(|event| matches!(
        event,
        BattleEvent::Attacked {
            kind: AttackKind::Shot,
            damage: 2,
            dealt: 1,
            ..
        }
    )));
}

#[test]
fn mage_spell_hits_two_targets_independently() {
    let mut battle = started_battle(&[
        (Side::Player, UnitClass::Mage, 9),
        (Side::Enemy, UnitClass::Healer, 13),
        (Side::Enemy, UnitClass::Ogre, 14),
    ]);
    let healer = battle.board().formation(Side::Enemy).get(13).unwrap();
    let ogre = battle.board().formation(Side::Enemy).get(14).unwrap();

    let outcome = battle.step();

    assert_eq!(spell_hits(&outcome.events), vec![(healer, 4), (ogre, 2)]);
    assert_eq!(battle.board().unit(healer).unwrap().hp(), 24);
    assert_eq!(battle.board().unit(ogre).unwrap().hp(), 58);
}

#[test]
fn lone_healer_loses_to_ogre() {
    let mut battle = started_battle(&[
        (Side::Player, UnitClass::Healer, 2),
        (Side::Enemy, UnitClass::Ogre, 3),
    ]);
    let events = battle.run_to_completion();

    assert_eq!(battle.result(), Some(BattleResult::EnemyWins));
    assert_eq!(battle.end_reason(), Some(EndReason::Elimination));
    assert!(events
        .iter()
        .any(|event| matches!(event, BattleEvent::Healed { .. })));
    assert!(matches!(
        events.last(),
        Some(BattleEvent::BattleEnded {
            result: BattleResult::EnemyWins,
            ..
        })
    ));
}

#[test]
fn healer_steps_once_then_heals() {
    let mut board = board_with(&[
        (Side::Player, UnitClass::Healer, 0),
        (Side::Player, UnitClass::Knight, 11),
    ]);
    let healer = board.formation(Side::Player).get(0).unwrap();
    let knight = board.formation(Side::Player).get(11).unwrap();
    board.unit_mut(knight).unwrap().take_damage(20, Delivery::Melee);

    let mut events = Vec::new();
    resolve_turn(&mut board, healer, &mut events).unwrap();

    // Distance 4 against range 3: one step to cell 9, then in range.
    assert_eq!(board.unit(healer).unwrap().position, Some(9));
    assert_eq!(board.unit(knight).unwrap().hp(), 40);
}

#[test]
fn blocked_healer_heals_nobody() {
    let mut board = board_with(&[
        (Side::Player, UnitClass::Healer, 0),
        (Side::Player, UnitClass::Knight, 11),
        (Side::Player, UnitClass::Ogre, 9),
    ]);
    let healer = board.formation(Side::Player).get(0).unwrap();
    let knight = board.formation(Side::Player).get(11).unwrap();
    board.unit_mut(knight).unwrap().take_damage(20, Delivery::Melee);

    let mut events = Vec::new();
    resolve_turn(&mut board, healer, &mut events).unwrap();

    assert_eq!(board.unit(healer).unwrap().position, Some(0));
    assert_eq!(board.unit(knight).unwrap().hp(), 30);
    assert!(matches!(
        events.as_slice(),
        [BattleEvent::NoOneToHeal { .. }]
    ));
}

#[test]
fn every_unit_acts_once_per_pass() {
    let mut battle = started_battle(&[
        (Side::Player, UnitClass::Healer, 0),
        (Side::Player, UnitClass::Healer, 16),
        (Side::Enemy, UnitClass::Healer, 7),
        (Side::Enemy, UnitClass::Healer, 23),
    ]);
    let initial: Vec<UnitId> = battle.turn_queue().collect();

    let passes = 3;
    let mut acted: Vec<UnitId> = Vec::new();
    for _ in 0..passes * initial.len() {
        for event in battle.step().events {
            if let BattleEvent::TurnStarted { unit, .. } = event {
                acted.push(unit.id);
            }
        }
    }

    let mut counts: BTreeMap<UnitId, usize> = BTreeMap::new();
    for id in &acted {
        *counts.entry(*id).or_default() += 1;
    }
    assert!(counts.values().all(|&count| count == passes));
    for pass in acted.chunks(initial.len()) {
        assert_eq!(pass, initial.as_slice());
    }
}

#[test]
fn step_after_end_changes_nothing() {
    let mut battle = started_battle(&[
        (Side::Player, UnitClass::Ogre, 3),
        (Side::Enemy, UnitClass::Goblin, 4),
    ]);
    battle.run_to_completion();
    let result = battle.result();
    let hash = battle.state_hash();

    for _ in 0..5 {
        let outcome = battle.step();
        assert!(outcome.events.is_empty());
        assert_eq!(outcome.result, result);
    }
    assert_eq!(battle.state_hash(), hash);
}

#[test]
fn seeded_reset_is_reproducible() {
    let first = skirmish(7);
    let second = skirmish(7);
    assert_eq!(first.snapshot(), second.snapshot());

    let mut rng = seeded_rng(7);
    let mut third = Battle::new(BattleConfig::default(), UnitRoster::standard());
    third.reset(&mut rng).unwrap();
    let enemies: Vec<UnitView> = third.snapshot().units(Side::Enemy).cloned().collect();
    let expected: Vec<UnitView> = first.snapshot().units(Side::Enemy).cloned().collect();
    assert_eq!(enemies, expected);
}

#[test]
fn full_skirmish_reaches_a_result() {
    let mut battle = skirmish(3);
    battle.start_battle().unwrap();
    let events = battle.run_to_completion();

    assert_eq!(battle.phase(), BattlePhase::Ended);
    assert!(battle.result().is_some());
    assert!(battle.turns_taken() <= DEFAULT_MAX_TURNS);
    assert!(battle.board().validate().is_none());
    assert!(events
        .iter()
        .all(|event| !event.to_string().is_empty()));
}
