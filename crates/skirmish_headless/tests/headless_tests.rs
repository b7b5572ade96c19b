//! Scenario files, batch persistence and end-to-end headless runs.

use std::path::PathBuf;

use skirmish_core::prelude::*;
use skirmish_headless::{
    load_roster, run_batch, run_scenario, BatchConfig, BatchResults, EnemySetup, Scenario,
    ScenarioError,
};

fn asset(relative: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join(relative)
}

#[test]
fn shipped_roster_matches_standard_stats() {
    let roster = load_roster(asset("data/units.ron")).unwrap();
    assert_eq!(roster, UnitRoster::standard());
}

#[test]
fn shipped_skirmish_matches_builtin() {
    let scenario = Scenario::load(asset("scenarios/skirmish.ron")).unwrap();
    assert_eq!(scenario, Scenario::skirmish());
}

#[test]
fn ogre_wall_plays_to_a_result() {
    let scenario = Scenario::load(asset("scenarios/ogre_wall.ron")).unwrap();
    assert!(matches!(scenario.enemy, EnemySetup::Fixed(ref units) if units.len() == 3));

    let report = run_scenario(&scenario, &UnitRoster::standard(), 0).unwrap();
    assert!(report.turns <= 300);
    assert_eq!(
        report.final_board.living_count(Side::Player),
        report.player_survivors
    );
}

#[test]
fn scenario_written_to_disk_loads_back() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("duel.ron");
    std::fs::write(
        &path,
        r#"(
            name: "Duel",
            player: [(class: Knight, cell: 2)],
            enemy: Fixed([(class: Goblin, cell: 5)]),
        )"#,
    )
    .unwrap();

    let scenario = Scenario::load(&path).unwrap();
    let report = run_scenario(&scenario, &UnitRoster::standard(), 0).unwrap();
    assert_eq!(report.result, BattleResult::PlayerWins);
}

#[test]
fn roster_missing_a_class_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("units.ron");
    std::fs::write(
        &path,
        "[UnitData(class: Knight, health: 50, attack: 15, defense: 10, range: 1, speed: 4, cost: 3)]",
    )
    .unwrap();

    let err = load_roster(&path).unwrap_err();
    assert!(matches!(
        err,
        ScenarioError::Battle(SkirmishError::DataParseError(_))
    ));
}

#[test]
fn batch_results_save_load() {
    let results = run_batch(BatchConfig::new(Scenario::skirmish(), 5), &UnitRoster::standard());

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("results").join("batch.json");

    results.save(&path).unwrap();
    assert!(path.exists());

    let loaded = BatchResults::load(&path).unwrap();
    assert_eq!(loaded.games, results.games);
    assert_eq!(loaded.config.scenario.name, "Standard Skirmish");
    assert_eq!(loaded.summary.total_games, 5);
}

#[test]
fn custom_roster_changes_the_outcome() {
    let mut units: Vec<UnitData> = UnitRoster::standard().into();
    for data in &mut units {
        if data.class == UnitClass::Goblin {
            data.attack = 0;
        }
    }
    let roster = UnitRoster::try_from(units).unwrap();
    let scenario = Scenario::from_ron_str(
        r#"(
            name: "Toothless",
            player: [(class: Healer, cell: 2)],
            enemy: Fixed([(class: Goblin, cell: 5)]),
            max_turns: Some(40),
        )"#,
    )
    .unwrap();

    let report = run_scenario(&scenario, &roster, 0).unwrap();
    assert_eq!(report.result, BattleResult::Draw);
    assert_eq!(report.player_survivors, 1);
}
