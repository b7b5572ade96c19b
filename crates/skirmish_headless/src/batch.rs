//! Batch battle runner for balance testing.
//!
//! Plays one scenario across a range of seeds in parallel using rayon and
//! aggregates the results.

use std::path::Path;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Instant;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use skirmish_core::prelude::*;
use std::result::Result;
use tracing::{debug, info, warn};

use crate::runner::{run_scenario, BattleReport};
use crate::scenario::{Scenario, ScenarioError};

/// Configuration for a batch run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Scenario to play
    pub scenario: Scenario,
    /// Number of battles to run
    pub game_count: u32,
    /// Maximum parallel battles (0 = use rayon default)
    pub parallel_games: u32,
    /// Seed of the first battle; battle `i` uses `seed_start + i`
    pub seed_start: u64,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            scenario: Scenario::skirmish(),
            game_count: 100,
            parallel_games: 0,
            seed_start: 0,
        }
    }
}

impl BatchConfig {
    /// Create config for a specific scenario
    pub fn new(scenario: Scenario, game_count: u32) -> Self {
        Self {
            scenario,
            game_count,
            ..Default::default()
        }
    }

    /// Set seed start
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed_start = seed;
        self
    }

    /// Set the worker thread count
    pub fn with_parallelism(mut self, threads: u32) -> Self {
        self.parallel_games = threads;
        self
    }
}

/// Condensed result of one battle in a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameRecord {
    /// Seed used
    pub seed: u64,
    /// Final result
    pub result: BattleResult,
    /// Why it ended
    pub reason: EndReason,
    /// Unit-turns resolved
    pub turns: u32,
    /// Living player units at the end
    pub player_survivors: usize,
    /// Living enemy units at the end
    pub enemy_survivors: usize,
    /// Final state hash
    pub state_hash: u64,
}

impl From<&BattleReport> for GameRecord {
    fn from(report: &BattleReport) -> Self {
        Self {
            seed: report.seed,
            result: report.result,
            reason: report.reason,
            turns: report.turns,
            player_survivors: report.player_survivors,
            enemy_survivors: report.enemy_survivors,
            state_hash: report.state_hash,
        }
    }
}

/// Aggregate statistics over a batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct BatchSummary {
    /// Battles that finished
    pub total_games: u32,
    /// Player victories
    pub player_wins: u32,
    /// Enemy victories
    pub enemy_wins: u32,
    /// Draws of any kind
    pub draws: u32,
    /// Draws caused by the turn limit
    pub turn_limit_draws: u32,
    /// Mean unit-turns per battle
    pub mean_turns: f64,
}

impl BatchSummary {
    /// Summarize a set of finished battles.
    pub fn from_games(games: &[GameRecord]) -> Self {
        let mut summary = Self::default();
        let mut total_turns: u64 = 0;

        for game in games {
            summary.total_games += 1;
            total_turns += u64::from(game.turns);
            match game.result {
                BattleResult::PlayerWins => summary.player_wins += 1,
                BattleResult::EnemyWins => summary.enemy_wins += 1,
                BattleResult::Draw => summary.draws += 1,
            }
            if game.reason == EndReason::TurnLimit {
                summary.turn_limit_draws += 1;
            }
        }

        if summary.total_games > 0 {
            summary.mean_turns = total_turns as f64 / f64::from(summary.total_games);
        }
        summary
    }

    /// Fraction of battles the player won.
    pub fn player_win_rate(&self) -> f64 {
        if self.total_games == 0 {
            return 0.0;
        }
        f64::from(self.player_wins) / f64::from(self.total_games)
    }
}

/// Error during batch run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchError {
    /// Battle index
    pub game_index: u32,
    /// Seed used
    pub seed: u64,
    /// Error message
    pub message: String,
}

/// Results from a batch run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchResults {
    /// Configuration used
    pub config: BatchConfig,
    /// Per-battle records, in seed order
    pub games: Vec<GameRecord>,
    /// Aggregate summary
    pub summary: BatchSummary,
    /// Total runtime
    pub duration_seconds: f64,
    /// Errors encountered
    pub errors: Vec<BatchError>,
}

impl BatchResults {
    /// Save results to JSON file
    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(path, json)
    }

    /// Load results from JSON file
    pub fn load(path: &Path) -> std::io::Result<Self> {
        let json = std::fs::read_to_string(path)?;
        serde_json::from_str(&json).map_err(std::io::Error::other)
    }
}

/// Run a batch of battles
pub fn run_batch(config: BatchConfig, roster: &UnitRoster) -> BatchResults {
    let start = Instant::now();
    let completed = AtomicU32::new(0);

    info!(
        "Starting batch run: {} battles of '{}'",
        config.game_count, config.scenario.name
    );

    let play = || -> Vec<Result<GameRecord, BatchError>> {
        (0..config.game_count)
            .into_par_iter()
            .map(|i| {
                let seed = config.seed_start.wrapping_add(u64::from(i));
                match run_scenario(&config.scenario, roster, seed) {
                    Ok(report) => {
                        let done = completed.fetch_add(1, Ordering::Relaxed) + 1;
                        if done % 100 == 0 {
                            debug!("Progress: {}/{}", done, config.game_count);
                        }
                        Ok(GameRecord::from(&report))
                    }
                    Err(e) => {
                        warn!("Battle {} failed: {}", i, e);
                        Err(BatchError {
                            game_index: i,
                            seed,
                            message: e.to_string(),
                        })
                    }
                }
            })
            .collect()
    };

    let results = match config.parallel_games {
        0 => play(),
        threads => match rayon::ThreadPoolBuilder::new()
            .num_threads(threads as usize)
            .build()
        {
            Ok(pool) => pool.install(play),
            Err(e) => {
                warn!("Failed to build thread pool: {}, using global pool", e);
                play()
            }
        },
    };

    let (games, errors): (Vec<_>, Vec<_>) = results.into_iter().partition(Result::is_ok);
    let games: Vec<GameRecord> = games.into_iter().filter_map(Result::ok).collect();
    let errors: Vec<BatchError> = errors.into_iter().filter_map(Result::err).collect();

    let summary = BatchSummary::from_games(&games);
    let duration_seconds = start.elapsed().as_secs_f64();

    info!(
        "Batch complete: {} battles in {:.2}s ({} failed)",
        games.len(),
        duration_seconds,
        errors.len()
    );

    BatchResults {
        config,
        games,
        summary,
        duration_seconds,
        errors,
    }
}

/// Play the same seed `runs` times and check every run ends in the same
/// state.
pub fn verify_determinism(
    scenario: &Scenario,
    roster: &UnitRoster,
    seed: u64,
    runs: u32,
) -> Result<bool, ScenarioError> {
    let mut hashes = Vec::with_capacity(runs as usize);
    for _ in 0..runs {
        hashes.push(run_scenario(scenario, roster, seed)?.state_hash);
    }
    Ok(hashes.windows(2).all(|w| w[0] == w[1]))
}
