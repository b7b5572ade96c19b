//! Headless skirmish runner.
//!
//! # Usage
//!
//! ```bash
//! # Play one battle and print its log
//! cargo run -p skirmish_headless -- run --scenario scenarios/skirmish.ron --seed 3
//!
//! # Same, as a JSON report
//! cargo run -p skirmish_headless -- run --json
//!
//! # Run batch balance test
//! cargo run -p skirmish_headless -- batch --count 1000 --output results/
//!
//! # Verify determinism
//! cargo run -p skirmish_headless -- verify --seed 12345 --runs 5
//! ```

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use skirmish_core::prelude::UnitRoster;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use skirmish_headless::{
    batch::{run_batch, verify_determinism, BatchConfig},
    runner::run_scenario,
    scenario::{load_roster, Scenario},
};

#[derive(Parser)]
#[command(name = "skirmish_headless")]
#[command(about = "Headless skirmish battle runner")]
#[command(version)]
struct Cli {
    /// Enable verbose logging to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Unit roster RON file (defaults to the standard stats)
    #[arg(long, global = true)]
    roster: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Play a single battle
    Run {
        /// Scenario file to load (defaults to the built-in skirmish)
        #[arg(short, long)]
        scenario: Option<PathBuf>,

        /// Seed for enemy generation
        #[arg(long, default_value = "0")]
        seed: u64,

        /// Print the report as JSON instead of the battle log
        #[arg(long)]
        json: bool,
    },

    /// Run batch of battles for balance testing
    Batch {
        /// Scenario file to load (defaults to the built-in skirmish)
        #[arg(short, long)]
        scenario: Option<PathBuf>,

        /// Number of battles to run
        #[arg(short, long, default_value = "100")]
        count: u32,

        /// Maximum parallel battles (0 = auto)
        #[arg(short, long, default_value = "0")]
        parallel: u32,

        /// Output directory for results
        #[arg(short, long, default_value = "results")]
        output: PathBuf,

        /// Starting random seed
        #[arg(long, default_value = "0")]
        seed: u64,
    },

    /// Verify determinism by running same seed multiple times
    Verify {
        /// Scenario file to load (defaults to the built-in skirmish)
        #[arg(short, long)]
        scenario: Option<PathBuf>,

        /// Seed to verify
        #[arg(long, default_value = "12345")]
        seed: u64,

        /// Number of verification runs
        #[arg(short, long, default_value = "5")]
        runs: u32,
    },
}

fn main() {
    let cli = Cli::parse();

    // Logs go to stderr; stdout carries the battle log and reports
    let log_level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(true),
        )
        .with(tracing_subscriber::filter::LevelFilter::from_level(
            log_level,
        ))
        .init();

    let roster = load_roster_or_exit(cli.roster);

    match cli.command {
        Commands::Run {
            scenario,
            seed,
            json,
        } => cmd_run(&load_scenario_or_exit(scenario), &roster, seed, json),
        Commands::Batch {
            scenario,
            count,
            parallel,
            output,
            seed,
        } => cmd_batch(
            load_scenario_or_exit(scenario),
            &roster,
            count,
            parallel,
            output,
            seed,
        ),
        Commands::Verify {
            scenario,
            seed,
            runs,
        } => cmd_verify(&load_scenario_or_exit(scenario), &roster, seed, runs),
    }
}

fn load_roster_or_exit(path: Option<PathBuf>) -> UnitRoster {
    let Some(path) = path else {
        return UnitRoster::standard();
    };
    match load_roster(&path) {
        Ok(roster) => {
            tracing::info!(path = %path.display(), "Loaded unit roster");
            roster
        }
        Err(e) => {
            eprintln!("FATAL: Failed to load roster '{}': {}", path.display(), e);
            std::process::exit(1);
        }
    }
}

fn load_scenario_or_exit(path: Option<PathBuf>) -> Scenario {
    let Some(path) = path else {
        return Scenario::skirmish();
    };
    match Scenario::load(&path) {
        Ok(scenario) => scenario,
        Err(e) => {
            eprintln!("FATAL: Failed to load scenario '{}': {}", path.display(), e);
            std::process::exit(1);
        }
    }
}

/// Play a single battle
fn cmd_run(scenario: &Scenario, roster: &UnitRoster, seed: u64, json: bool) {
    tracing::info!(scenario = %scenario.name, seed, "Starting battle");

    let report = match run_scenario(scenario, roster, seed) {
        Ok(report) => report,
        Err(e) => {
            eprintln!("FATAL: {}", e);
            std::process::exit(1);
        }
    };

    if json {
        match serde_json::to_string_pretty(&report) {
            Ok(text) => println!("{}", text),
            Err(e) => {
                eprintln!("FATAL: Failed to encode report: {}", e);
                std::process::exit(1);
            }
        }
        return;
    }

    for line in report.log_lines() {
        println!("{}", line);
    }
    println!();
    print!("{}", report.final_board);
    println!(
        "{} after {} turns ({} player / {} enemy units standing)",
        report.result, report.turns, report.player_survivors, report.enemy_survivors
    );
}

/// Run batch of battles for balance testing
fn cmd_batch(
    scenario: Scenario,
    roster: &UnitRoster,
    count: u32,
    parallel: u32,
    output: PathBuf,
    seed: u64,
) {
    tracing::info!(
        scenario = %scenario.name,
        count = count,
        parallel = parallel,
        seed = seed,
        output = %output.display(),
        "Batch configuration"
    );

    if let Err(e) = std::fs::create_dir_all(&output) {
        tracing::error!(error = %e, path = %output.display(), "Failed to create output directory");
        eprintln!(
            "FATAL: Cannot create output directory '{}': {}",
            output.display(),
            e
        );
        std::process::exit(1);
    }

    let config = BatchConfig::new(scenario, count)
        .with_seed(seed)
        .with_parallelism(parallel);
    let results = run_batch(config, roster);

    let results_path = output.join("batch_results.json");
    if let Err(e) = results.save(&results_path) {
        tracing::error!(error = %e, path = %results_path.display(), "Failed to save results");
        eprintln!("FATAL: Failed to save results: {}", e);
        std::process::exit(1);
    }

    let summary = &results.summary;
    eprintln!("\n{}", "=".repeat(50));
    eprintln!("BATCH COMPLETE");
    eprintln!("{}", "=".repeat(50));
    eprintln!("Battles played: {}", summary.total_games);
    if !results.errors.is_empty() {
        eprintln!("Battles failed: {}", results.errors.len());
    }
    eprintln!(
        "Player wins: {} ({:.1}%)",
        summary.player_wins,
        summary.player_win_rate() * 100.0
    );
    eprintln!("Enemy wins:  {}", summary.enemy_wins);
    eprintln!(
        "Draws:       {} ({} at turn limit)",
        summary.draws, summary.turn_limit_draws
    );
    eprintln!("Mean turns:  {:.1}", summary.mean_turns);
    eprintln!("Results saved to: {}", results_path.display());
}

/// Verify determinism by running same seed multiple times
fn cmd_verify(scenario: &Scenario, roster: &UnitRoster, seed: u64, runs: u32) {
    tracing::info!(
        "Verifying determinism: {} with seed {} ({} runs)",
        scenario.name,
        seed,
        runs
    );

    match verify_determinism(scenario, roster, seed, runs) {
        Ok(true) => eprintln!("PASS: All {} runs produced identical results", runs),
        Ok(false) => {
            eprintln!("FAIL: Non-determinism detected!");
            std::process::exit(1);
        }
        Err(e) => {
            eprintln!("FATAL: {}", e);
            std::process::exit(1);
        }
    }
}
