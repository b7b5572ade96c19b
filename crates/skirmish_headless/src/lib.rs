//! Headless battle runner for balance testing and CI verification.
//!
//! This crate plays skirmish battles without any presentation layer:
//!
//! - **Scenarios**: squads and overrides described in RON files
//! - **Batches**: one scenario across many seeds, in parallel
//! - **Determinism checks**: the same seed must always end in the same state
//!
//! Battle logs and reports go to stdout; diagnostics go to stderr.
//!
//! # Example
//!
//! ```bash
//! # Play the built-in skirmish and print the battle log
//! cargo run -p skirmish_headless -- run --seed 7
//!
//! # Run a scenario file with a custom roster
//! cargo run -p skirmish_headless -- run --scenario scenarios/skirmish.ron --roster data/units.ron
//!
//! # Balance batch
//! cargo run -p skirmish_headless -- batch --count 1000 --output results/
//! ```

pub mod batch;
pub mod runner;
pub mod scenario;

pub use batch::{run_batch, verify_determinism, BatchConfig, BatchResults, BatchSummary, GameRecord};
pub use runner::{prepare_battle, run_scenario, BattleReport};
pub use scenario::{load_roster, EnemySetup, Placement, Scenario, ScenarioError};
