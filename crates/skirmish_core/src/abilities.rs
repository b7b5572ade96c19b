//! Per-class turn behaviour.
//!
//! [`resolve_turn`] dispatches on [`UnitClass`]. Knights, Goblins and
//! Ogres share the plain melee strike; Archers, Mages and Healers each have
//! their own routine. Every routine except the Healer's starts with
//! [`plan_move`].

use crate::error::{Result, SkirmishError};
use crate::events::{AttackKind, BattleEvent, UnitRef};
use crate::formation::{Board, UnitId};
use crate::math::scale_percent;
use crate::movement::{diagonal_step, plan_move, MovePlan};
use crate::spatial::distance;
use crate::targeting::{enemies_in_range, WEAK_DEFENSE_THRESHOLD};
use crate::unit::{base_damage, Delivery, Unit, UnitClass};

/// Flat health restored by a heal.
pub const HEAL_AMOUNT: u32 = 10;

/// Archer damage multiplier against exposed targets, in percent.
pub const WEAK_SPOT_PERCENT: u32 = 150;

/// Maximum number of enemies a single spell hits.
pub const SPELL_TARGETS: usize = 2;

/// Resolve one full turn for `id`, appending what happened to `events`.
pub fn resolve_turn(board: &mut Board, id: UnitId, events: &mut Vec<BattleEvent>) -> Result<()> {
    match unit(board, id)?.class {
        UnitClass::Archer => volley(board, id, events),
        UnitClass::Mage => arcane(board, id, events),
        UnitClass::Healer => mend(board, id, events),
        UnitClass::Knight | UnitClass::Goblin | UnitClass::Ogre => strike(board, id, events),
    }
}

fn unit(board: &Board, id: UnitId) -> Result<&Unit> {
    board.unit(id).ok_or(SkirmishError::UnitNotFound(id))
}

fn unit_ref(board: &Board, id: UnitId) -> Result<UnitRef> {
    unit(board, id).map(UnitRef::from)
}

fn record_move(
    board: &Board,
    id: UnitId,
    plan: &MovePlan,
    events: &mut Vec<BattleEvent>,
) -> Result<()> {
    if let (true, Some(from), Some(to)) = (plan.moved(), plan.old_position, plan.new_position) {
        events.push(BattleEvent::Moved {
            unit: unit_ref(board, id)?,
            from,
            to,
        });
    }
    Ok(())
}

fn idle(board: &Board, id: UnitId, plan: &MovePlan, events: &mut Vec<BattleEvent>) -> Result<()> {
    if !plan.moved() {
        events.push(BattleEvent::NoTargets {
            unit: unit_ref(board, id)?,
        });
    }
    Ok(())
}

/// Apply one hit and record it, plus the defeat if it was lethal.
fn hit(
    board: &mut Board,
    attacker: UnitId,
    target: UnitId,
    damage: u32,
    kind: AttackKind,
    events: &mut Vec<BattleEvent>,
) -> Result<()> {
    let delivery = match kind {
        AttackKind::Strike => Delivery::Melee,
        AttackKind::Shot | AttackKind::Spell => Delivery::Ranged,
    };
    let attacker_ref = unit_ref(board, attacker)?;
    let victim = board
        .unit_mut(target)
        .ok_or(SkirmishError::UnitNotFound(target))?;
    let dealt = victim.take_damage(damage, delivery);
    let target_ref = UnitRef::from(&*victim);
    let fell = !victim.is_alive();

    events.push(BattleEvent::Attacked {
        attacker: attacker_ref,
        target: target_ref.clone(),
        kind,
        ranged: delivery == Delivery::Ranged,
        damage,
        dealt,
    });
    if fell && dealt > 0 {
        events.push(BattleEvent::Defeated { unit: target_ref });
    }
    Ok(())
}

fn strike(board: &mut Board, id: UnitId, events: &mut Vec<BattleEvent>) -> Result<()> {
    let plan = plan_move(board, id)?;
    record_move(board, id, &plan, events)?;
    let Some(target) = plan.target else {
        return idle(board, id, &plan, events);
    };

    let damage = base_damage(unit(board, id)?.attack, unit(board, target)?.defense);
    hit(board, id, target, damage, AttackKind::Strike, events)
}

fn volley(board: &mut Board, id: UnitId, events: &mut Vec<BattleEvent>) -> Result<()> {
    let plan = plan_move(board, id)?;
    record_move(board, id, &plan, events)?;
    let Some(target) = plan.target else {
        return idle(board, id, &plan, events);
    };

    let defense = unit(board, target)?.defense;
    let mut damage = base_damage(unit(board, id)?.attack, defense);
    if defense < WEAK_DEFENSE_THRESHOLD {
        damage = scale_percent(damage, WEAK_SPOT_PERCENT);
        events.push(BattleEvent::WeakSpot {
            attacker: unit_ref(board, id)?,
            target: unit_ref(board, target)?,
        });
    }
    hit(board, id, target, damage, AttackKind::Shot, events)
}

fn arcane(board: &mut Board, id: UnitId, events: &mut Vec<BattleEvent>) -> Result<()> {
    let plan = plan_move(board, id)?;
    record_move(board, id, &plan, events)?;

    let caster = unit(board, id)?;
    let attack = caster.attack;
    let grid = board.grid();
    let mut in_range = enemies_in_range(board, caster);
    in_range.sort_by_key(|enemy| distance(grid, caster.position, enemy.position));
    let volleys: Vec<(UnitId, u32)> = in_range
        .iter()
        .take(SPELL_TARGETS)
        .map(|enemy| (enemy.id, base_damage(attack, enemy.defense / 2)))
        .collect();

    if volleys.is_empty() {
        return idle(board, id, &plan, events);
    }
    for (target, damage) in volleys {
        hit(board, id, target, damage, AttackKind::Spell, events)?;
    }
    Ok(())
}

fn mend(board: &mut Board, id: UnitId, events: &mut Vec<BattleEvent>) -> Result<()> {
    let healer = unit(board, id)?;
    let (side, range, start) = (healer.side, healer.range, healer.position);

    let mut injured: Vec<&Unit> = board.living(side).filter(|ally| ally.is_injured()).collect();
    injured.sort_by(|a, b| a.injury_cmp(b));
    let injured: Vec<(UnitId, Option<usize>)> =
        injured.iter().map(|ally| (ally.id, ally.position)).collect();

    let reachable = |board: &Board, from: Option<usize>| {
        injured
            .iter()
            .find(|&&(_, at)| distance(board.grid(), from, at) <= range)
            .map(|&(ally, _)| ally)
    };

    let mut target = reachable(board, start);
    let mut moved = false;
    if target.is_none() {
        let step = match (start, injured.first()) {
            (Some(from), Some(&(_, Some(to)))) => diagonal_step(board, from, to),
            _ => None,
        };
        if let (Some(from), Some(to)) = (start, step) {
            board.relocate(id, to)?;
            events.push(BattleEvent::Moved {
                unit: unit_ref(board, id)?,
                from,
                to,
            });
            moved = true;
            target = reachable(board, Some(to));
        }
    }

    let Some(target) = target else {
        if !moved {
            events.push(BattleEvent::NoOneToHeal {
                unit: unit_ref(board, id)?,
            });
        }
        return Ok(());
    };

    let healer_ref = unit_ref(board, id)?;
    let patient = board
        .unit_mut(target)
        .ok_or(SkirmishError::UnitNotFound(target))?;
    let amount = patient.heal(HEAL_AMOUNT);
    let target_ref = UnitRef::from(&*patient);
    events.push(BattleEvent::Healed {
        healer: healer_ref,
        target: target_ref,
        amount,
    });
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::UnitRoster;
    use crate::grid::{GridConfig, Side};

    fn setup(units: &[(UnitClass, Side, usize)]) -> (Board, Vec<UnitId>) {
        let roster = UnitRoster::standard();
        let mut board = Board::new(GridConfig::default());
        let ids = units
            .iter()
            .map(|&(class, side, index)| board.spawn(roster.get(class), side, index).unwrap())
            .collect();
        (board, ids)
    }

    fn hp(board: &Board, id: UnitId) -> u32 {
        board.unit(id).unwrap().hp()
    }

    #[test]
    fn test_archer_shot_on_knight_is_mitigated() {
        let (mut board, ids) = setup(&[
            (UnitClass::Archer, Side::Enemy, 13),
            (UnitClass::Knight, Side::Player, 10),
        ]);
        let mut events = Vec::new();
        resolve_turn(&mut board, ids[0], &mut events).unwrap();

        assert_eq!(hp(&board, ids[1]), 49);
        assert!(events.iter().any(|event| matches!(
            event,
            BattleEvent::Attacked {
                kind: AttackKind::Shot,
                ranged: true,
                damage: 2,
                dealt: 1,
                ..
            }
        )));
        assert!(!events
            .iter()
            .any(|event| matches!(event, BattleEvent::WeakSpot { .. })));
    }

    #[test]
    fn test_archer_weak_spot_bonus() {
        let (mut board, ids) = setup(&[
            (UnitClass::Archer, Side::Player, 9),
            (UnitClass::Goblin, Side::Enemy, 12),
        ]);
        let mut events = Vec::new();
        resolve_turn(&mut board, ids[0], &mut events).unwrap();

        // max(1, 12 - 3) = 9, times 1.5 floored = 13
        assert_eq!(hp(&board, ids[1]), 30 - 13);
        assert!(matches!(events[0], BattleEvent::WeakSpot { .. }));
    }

    #[test]
    fn test_mage_hits_two_nearest() {
        let (mut board, ids) = setup(&[
            (UnitClass::Mage, Side::Player, 9),
            (UnitClass::Healer, Side::Enemy, 10),
            (UnitClass::Ogre, Side::Enemy, 12),
            (UnitClass::Goblin, Side::Enemy, 14),
        ]);
        let mut events = Vec::new();
        resolve_turn(&mut board, ids[0], &mut events).unwrap();

        // Healer def 4 -> 6 - 2 = 4; Ogre def 8 -> 6 - 4 = 2; Goblin is third.
        assert_eq!(hp(&board, ids[1]), 28 - 4);
        assert_eq!(hp(&board, ids[2]), 60 - 2);
        assert_eq!(hp(&board, ids[3]), 30);
        let spells = events
            .iter()
            .filter(|event| {
                matches!(
                    event,
                    BattleEvent::Attacked {
                        kind: AttackKind::Spell,
                        ranged: true,
                        ..
                    }
                )
            })
            .count();
        assert_eq!(spells, 2);
    }

    #[test]
    fn test_mage_out_of_range_moves_without_casting() {
        let (mut board, ids) = setup(&[
            (UnitClass::Mage, Side::Player, 0),
            (UnitClass::Goblin, Side::Enemy, 23),
        ]);
        let mut events = Vec::new();
        resolve_turn(&mut board, ids[0], &mut events).unwrap();

        assert_eq!(hp(&board, ids[1]), 30);
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], BattleEvent::Moved { from: 0, to: 8, .. }));
    }

    #[test]
    fn test_strike_kills_and_reports_defeat() {
        let (mut board, ids) = setup(&[
            (UnitClass::Ogre, Side::Enemy, 4),
            (UnitClass::Goblin, Side::Player, 3),
        ]);
        board
            .unit_mut(ids[1])
            .unwrap()
            .take_damage(20, Delivery::Melee);
        let mut events = Vec::new();
        resolve_turn(&mut board, ids[0], &mut events).unwrap();

        assert!(!board.unit(ids[1]).unwrap().is_alive());
        assert!(matches!(
            events.last(),
            Some(BattleEvent::Defeated { unit }) if unit.id == ids[1]
        ));
    }

    #[test]
    fn test_idle_unit_reports_no_targets() {
        let (mut board, ids) = setup(&[
            (UnitClass::Knight, Side::Player, 0),
            (UnitClass::Healer, Side::Player, 1),
            (UnitClass::Healer, Side::Player, 8),
            (UnitClass::Goblin, Side::Enemy, 23),
        ]);
        let mut events = Vec::new();
        resolve_turn(&mut board, ids[0], &mut events).unwrap();
        assert!(matches!(events.as_slice(), [BattleEvent::NoTargets { .. }]));
    }

    #[test]
    fn test_healer_steps_then_heals() {
        let (mut board, ids) = setup(&[
            (UnitClass::Healer, Side::Player, 0),
            (UnitClass::Knight, Side::Player, 12),
        ]);
        board
            .unit_mut(ids[1])
            .unwrap()
            .take_damage(15, Delivery::Melee);
        let mut events = Vec::new();
        resolve_turn(&mut board, ids[0], &mut events).unwrap();

        // Distance 5 > range 3; one diagonal step to cell 9 leaves distance 3.
        assert_eq!(board.unit(ids[0]).unwrap().position, Some(9));
        assert_eq!(hp(&board, ids[1]), 45);
        assert!(matches!(
            events.as_slice(),
            [BattleEvent::Moved { from: 0, to: 9, .. }, BattleEvent::Healed { amount: 10, .. }]
        ));
    }

    #[test]
    fn test_healer_step_short_of_range_heals_nobody() {
        let (mut board, ids) = setup(&[
            (UnitClass::Healer, Side::Player, 0),
            (UnitClass::Knight, Side::Player, 7),
        ]);
        board
            .unit_mut(ids[1])
            .unwrap()
            .take_damage(15, Delivery::Melee);
        let mut events = Vec::new();
        resolve_turn(&mut board, ids[0], &mut events).unwrap();

        assert_eq!(board.unit(ids[0]).unwrap().position, Some(1));
        assert_eq!(hp(&board, ids[1]), 35);
        assert!(matches!(events.as_slice(), [BattleEvent::Moved { .. }]));
    }

    #[test]
    fn test_healer_prefers_most_injured_fraction() {
        let (mut board, ids) = setup(&[
            (UnitClass::Healer, Side::Player, 9),
            (UnitClass::Ogre, Side::Player, 10),
            (UnitClass::Goblin, Side::Player, 8),
        ]);
        board
            .unit_mut(ids[1])
            .unwrap()
            .take_damage(20, Delivery::Melee); // 40/60
        board
            .unit_mut(ids[2])
            .unwrap()
            .take_damage(15, Delivery::Melee); // 15/30
        let mut events = Vec::new();
        resolve_turn(&mut board, ids[0], &mut events).unwrap();

        assert_eq!(hp(&board, ids[2]), 25);
        assert_eq!(hp(&board, ids[1]), 40);
    }

    #[test]
    fn test_heal_caps_at_max() {
        let (mut board, ids) = setup(&[
            (UnitClass::Healer, Side::Player, 9),
            (UnitClass::Knight, Side::Player, 10),
        ]);
        board
            .unit_mut(ids[1])
            .unwrap()
            .take_damage(3, Delivery::Melee);
        let mut events = Vec::new();
        resolve_turn(&mut board, ids[0], &mut events).unwrap();

        assert_eq!(hp(&board, ids[1]), 50);
        assert!(matches!(events.as_slice(), [BattleEvent::Healed { amount: 3, .. }]));
    }

    #[test]
    fn test_healer_with_nobody_injured() {
        let (mut board, ids) = setup(&[
            (UnitClass::Healer, Side::Player, 9),
            (UnitClass::Knight, Side::Player, 10),
        ]);
        let mut events = Vec::new();
        resolve_turn(&mut board, ids[0], &mut events).unwrap();
        assert!(matches!(events.as_slice(), [BattleEvent::NoOneToHeal { .. }]));
    }
}
