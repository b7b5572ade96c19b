//! Scenario loading and configuration.
//!
//! Scenarios define the starting state of a headless battle: the player's
//! placements, how the enemy squad is produced and any overrides of the
//! default budget or turn limit.

use std::path::Path;

use serde::{Deserialize, Serialize};
use skirmish_core::prelude::*;
use std::result::Result;
use thiserror::Error;

/// Error type for scenario operations.
#[derive(Error, Debug)]
pub enum ScenarioError {
    /// File not found.
    #[error("Scenario file not found: {0}")]
    FileNotFound(String),
    /// Failed to read file.
    #[error("Failed to read scenario file: {0}")]
    ReadError(#[from] std::io::Error),
    /// Failed to parse RON.
    #[error("Failed to parse scenario: {0}")]
    ParseError(#[from] ron::error::SpannedError),
    /// The engine rejected part of the setup.
    #[error("Battle setup failed: {0}")]
    Battle(#[from] SkirmishError),
    /// The battle stopped without a result.
    #[error("Battle '{0}' did not finish")]
    Unfinished(String),
}

/// One unit placed on a formation cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Placement {
    /// Unit class.
    pub class: UnitClass,
    /// Formation index (`row * width + col`).
    pub cell: usize,
}

impl Placement {
    /// Create a placement.
    pub fn new(class: UnitClass, cell: usize) -> Self {
        Self { class, cell }
    }
}

/// How the enemy squad is produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum EnemySetup {
    /// Generated from the run's seed within the enemy budget.
    #[default]
    Generated,
    /// Exactly these placements, checked against the same budget.
    Fixed(Vec<Placement>),
}

/// A complete scenario configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scenario {
    /// Scenario name.
    pub name: String,
    /// Human-readable description.
    #[serde(default)]
    pub description: String,
    /// Per-side budget override.
    #[serde(default)]
    pub budget: Option<u32>,
    /// Turn limit override.
    #[serde(default)]
    pub max_turns: Option<u32>,
    /// Player squad.
    pub player: Vec<Placement>,
    /// Enemy squad.
    #[serde(default)]
    pub enemy: EnemySetup,
}

impl Default for Scenario {
    fn default() -> Self {
        Self::skirmish()
    }
}

impl Scenario {
    /// Load a scenario from a RON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ScenarioError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ScenarioError::FileNotFound(path.display().to_string()));
        }
        let contents = std::fs::read_to_string(path)?;
        Self::from_ron_str(&contents)
    }

    /// Load from a RON string (useful for embedded scenarios).
    pub fn from_ron_str(ron: &str) -> Result<Self, ScenarioError> {
        let scenario: Scenario = ron::from_str(ron)?;
        Ok(scenario)
    }

    /// The standard skirmish: a balanced 12-point squad against a
    /// generated enemy team.
    #[must_use]
    pub fn skirmish() -> Self {
        Self {
            name: "Standard Skirmish".to_string(),
            description: "Knight, Archer, Healer and Mage against a generated squad".to_string(),
            budget: None,
            max_turns: None,
            player: vec![
                Placement::new(UnitClass::Knight, 10),
                Placement::new(UnitClass::Archer, 2),
                Placement::new(UnitClass::Healer, 9),
                Placement::new(UnitClass::Mage, 17),
            ],
            enemy: EnemySetup::Generated,
        }
    }

    /// Battle configuration with this scenario's overrides applied.
    #[must_use]
    pub fn battle_config(&self) -> BattleConfig {
        let mut config = BattleConfig::default();
        if let Some(budget) = self.budget {
            config.budget = budget;
        }
        if let Some(limit) = self.max_turns {
            config.max_turns = Some(limit);
        }
        config
    }
}

/// Load a unit roster from a RON file.
pub fn load_roster<P: AsRef<Path>>(path: P) -> Result<UnitRoster, ScenarioError> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(ScenarioError::FileNotFound(path.display().to_string()));
    }
    let contents = std::fs::read_to_string(path)?;
    Ok(UnitRoster::from_ron_str(&contents)?)
}
