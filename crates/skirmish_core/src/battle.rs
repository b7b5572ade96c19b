//! The battle scheduler.
//!
//! [`Battle`] owns the board, the roster and the turn queue, and is the
//! only thing allowed to mutate them. It moves through three phases:
//!
//! ```text
//! Setup --start_battle()--> Battle --(side eliminated / turn limit)--> Ended
//!   ^                                                                    |
//!   +------------------------------ reset() -----------------------------+
//! ```
//!
//! During `Battle`, each [`Battle::step`] resolves exactly one unit's turn.
//! There is no timing in here: a host that wants to animate turns simply
//! calls `step` at its own pace, and [`Battle::run_to_completion`] is the
//! same loop run synchronously.
//!
//! # Determinism
//!
//! Given the same placements (and, for [`Battle::reset`], the same RNG
//! state), a battle always plays out identically:
//! - Units are stored in id order and scanned in formation index order
//! - Turn order is a stable sort on speed
//! - No floating-point math (modifiers use [`crate::math::Fixed`])

use std::cmp::Reverse;
use std::collections::hash_map::DefaultHasher;
use std::collections::VecDeque;
use std::fmt;
use std::hash::{Hash, Hasher};

use rand::RngCore;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::abilities::resolve_turn;
use crate::data::UnitRoster;
use crate::error::{Result, SkirmishError};
use crate::events::{BattleEvent, EndReason, TurnSlot, UnitRef};
use crate::formation::{Board, UnitId};
use crate::grid::{GridConfig, Side};
use crate::setup::{check_placement, generate_enemy_team, EnemyPolicy, VarietyPolicy};
use crate::unit::{Unit, UnitClass};
use crate::view::BoardSnapshot;

/// Default squad budget per side.
pub const DEFAULT_BUDGET: u32 = 12;

/// Default cap on resolved unit-turns before a battle is called a draw.
pub const DEFAULT_MAX_TURNS: u32 = 500;

/// Lifecycle phase of a battle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BattlePhase {
    /// Squads are being deployed.
    Setup,
    /// Turns are being resolved.
    Battle,
    /// A result has been decided.
    Ended,
}

/// Final outcome of a battle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BattleResult {
    /// Only player units remain.
    PlayerWins,
    /// Only enemy units remain.
    EnemyWins,
    /// Both sides fell together, or the turn limit ran out.
    Draw,
}

impl fmt::Display for BattleResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BattleResult::PlayerWins => write!(f, "Player Wins!"),
            BattleResult::EnemyWins => write!(f, "Enemy Wins!"),
            BattleResult::Draw => write!(f, "Draw!"),
        }
    }
}

/// Tunable battle parameters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BattleConfig {
    /// Grid geometry and deployment zones.
    pub grid: GridConfig,
    /// Squad budget per side.
    pub budget: u32,
    /// Unit-turns after which the battle ends as a draw; `None` for no limit.
    pub max_turns: Option<u32>,
}

impl Default for BattleConfig {
    fn default() -> Self {
        Self {
            grid: GridConfig::default(),
            budget: DEFAULT_BUDGET,
            max_turns: Some(DEFAULT_MAX_TURNS),
        }
    }
}

/// What one call to [`Battle::step`] produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StepOutcome {
    /// Events in the order they happened.
    pub events: Vec<BattleEvent>,
    /// Set once the battle has ended.
    pub result: Option<BattleResult>,
    /// Why the acting unit's turn was abandoned, if it was.
    pub error: Option<SkirmishError>,
}

impl StepOutcome {
    /// Whether the battle is over.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.result.is_some()
    }
}

/// A single battle: board, roster, turn queue and phase.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Battle {
    config: BattleConfig,
    roster: UnitRoster,
    board: Board,
    queue: VecDeque<UnitId>,
    phase: BattlePhase,
    result: Option<BattleResult>,
    end_reason: Option<EndReason>,
    turns_taken: u32,
}

impl Battle {
    /// Create an empty battle in the `Setup` phase.
    #[must_use]
    pub fn new(config: BattleConfig, roster: UnitRoster) -> Self {
        let board = Board::new(config.grid.clone());
        Self {
            config,
            roster,
            board,
            queue: VecDeque::new(),
            phase: BattlePhase::Setup,
            result: None,
            end_reason: None,
            turns_taken: 0,
        }
    }

    /// Create a battle around a pre-built board.
    ///
    /// The board's grid replaces the one in `config`.
    #[must_use]
    pub fn with_board(mut config: BattleConfig, roster: UnitRoster, board: Board) -> Self {
        config.grid = board.grid().clone();
        let mut battle = Self::new(config, roster);
        battle.board = board;
        battle
    }

    /// Battle parameters.
    #[must_use]
    pub fn config(&self) -> &BattleConfig {
        &self.config
    }

    /// Unit definitions in use.
    #[must_use]
    pub fn roster(&self) -> &UnitRoster {
        &self.roster
    }

    /// Read-only board access.
    #[must_use]
    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Current phase.
    #[must_use]
    pub const fn phase(&self) -> BattlePhase {
        self.phase
    }

    /// Outcome, once the battle has ended.
    #[must_use]
    pub const fn result(&self) -> Option<BattleResult> {
        self.result
    }

    /// Why the battle ended, once it has.
    #[must_use]
    pub const fn end_reason(&self) -> Option<EndReason> {
        self.end_reason
    }

    /// Unit-turns resolved so far.
    #[must_use]
    pub const fn turns_taken(&self) -> u32 {
        self.turns_taken
    }

    /// Upcoming turn order, head first.
    pub fn turn_queue(&self) -> impl Iterator<Item = UnitId> + '_ {
        self.queue.iter().copied()
    }

    /// Per-cell view of the board for rendering.
    #[must_use]
    pub fn snapshot(&self) -> BoardSnapshot {
        BoardSnapshot::capture(&self.board)
    }

    // ------------------------------------------------------------------
    // Setup commands
    // ------------------------------------------------------------------

    /// Deploy a player unit. See [`Battle::place_unit_for`].
    pub fn place_unit(&mut self, class: UnitClass, index: usize) -> Result<UnitId> {
        self.place_unit_for(Side::Player, class, index)
    }

    /// Deploy a unit for either side, replacing any unit that side already
    /// has on the cell.
    ///
    /// # Errors
    ///
    /// `InvalidPhase` outside setup, `OutOfBounds`, `OutOfZone`,
    /// `ClassNotAllowed` for a Goblin or Ogre in the player squad,
    /// `CellOccupied` when the other side holds the cell, and `OverBudget`.
    /// A rejected placement leaves the battle untouched.
    pub fn place_unit_for(&mut self, side: Side, class: UnitClass, index: usize) -> Result<UnitId> {
        self.ensure_setup("place_unit")?;
        check_placement(
            &self.board,
            &self.roster,
            side,
            class,
            index,
            self.config.budget,
        )
        .map_err(|error| rejected("place_unit", error))?;

        if let Some(replaced) = self.board.remove_at(side, index) {
            debug!(unit = %replaced.name, index, "Replaced unit");
        }
        let id = self.board.spawn(self.roster.get(class), side, index)?;
        debug!(%class, %side, index, "Placed unit");
        Ok(id)
    }

    /// Remove the player unit at `index`.
    ///
    /// # Errors
    ///
    /// `InvalidPhase` outside setup, `NoUnitAt` if the cell has no player unit.
    pub fn remove_unit(&mut self, index: usize) -> Result<Unit> {
        self.ensure_setup("remove_unit")?;
        self.board
            .remove_at(Side::Player, index)
            .ok_or_else(|| rejected("remove_unit", SkirmishError::NoUnitAt(index)))
    }

    /// Move a player unit to another cell of the player zone.
    ///
    /// # Errors
    ///
    /// `InvalidPhase` outside setup, `NoUnitAt` if `from` has no player
    /// unit, `OutOfBounds`/`OutOfZone` for a bad destination and
    /// `CellOccupied` if `to` already holds a unit.
    pub fn reposition_unit(&mut self, from: usize, to: usize) -> Result<()> {
        self.ensure_setup("reposition_unit")?;
        let id = self
            .board
            .formation(Side::Player)
            .get(from)
            .ok_or_else(|| rejected("reposition_unit", SkirmishError::NoUnitAt(from)))?;
        if from == to {
            return Ok(());
        }

        let grid = self.board.grid();
        let problem = if !grid.contains_index(to) {
            Some(SkirmishError::OutOfBounds {
                index: to,
                width: grid.width,
                height: grid.height,
            })
        } else if !grid.in_zone(Side::Player, to) {
            Some(SkirmishError::OutOfZone {
                index: to,
                side: Side::Player,
            })
        } else if self.board.unit_at(to).is_some() {
            Some(SkirmishError::CellOccupied(to))
        } else {
            None
        };
        if let Some(error) = problem {
            return Err(rejected("reposition_unit", error));
        }

        self.board.relocate(id, to)
    }

    /// Clear the player squad, generate a new enemy squad and return to setup.
    pub fn reset(&mut self, rng: &mut dyn RngCore) -> Result<()> {
        self.reset_with(&VarietyPolicy, rng)
    }

    /// [`Battle::reset`] with an explicit enemy composition policy.
    pub fn reset_with(&mut self, policy: &dyn EnemyPolicy, rng: &mut dyn RngCore) -> Result<()> {
        self.board = Board::new(self.config.grid.clone());
        self.queue.clear();
        self.phase = BattlePhase::Setup;
        self.result = None;
        self.end_reason = None;
        self.turns_taken = 0;
        generate_enemy_team(
            &mut self.board,
            &self.roster,
            policy,
            self.config.budget,
            rng,
        )?;
        info!(
            enemies = self.board.units_of(Side::Enemy).count(),
            "Battle reset"
        );
        Ok(())
    }

    // ------------------------------------------------------------------
    // Battle loop
    // ------------------------------------------------------------------

    /// Build the turn queue and enter the `Battle` phase.
    ///
    /// Calling this while a battle is already running is ignored and
    /// returns no events.
    ///
    /// # Errors
    ///
    /// `NoPlayerUnits` if no living player unit is deployed, `InvalidPhase`
    /// once the battle has ended.
    pub fn start_battle(&mut self) -> Result<Vec<BattleEvent>> {
        match self.phase {
            BattlePhase::Setup => {}
            BattlePhase::Battle => {
                debug!("start_battle ignored: battle already running");
                return Ok(Vec::new());
            }
            BattlePhase::Ended => {
                return Err(rejected(
                    "start_battle",
                    SkirmishError::InvalidPhase(self.phase),
                ))
            }
        }
        if !self.board.any_alive(Side::Player) {
            return Err(rejected("start_battle", SkirmishError::NoPlayerUnits));
        }

        let mut order: Vec<&Unit> = self
            .board
            .living(Side::Player)
            .chain(self.board.living(Side::Enemy))
            .collect();
        order.sort_by_key(|unit| Reverse(unit.speed));

        let slots: Vec<TurnSlot> = order
            .iter()
            .map(|&unit| TurnSlot {
                unit: UnitRef::from(unit),
                speed: unit.speed,
            })
            .collect();
        self.queue = order.iter().map(|unit| unit.id).collect();
        self.phase = BattlePhase::Battle;

        info!(units = self.queue.len(), "Battle started");
        Ok(vec![BattleEvent::BattleStarted { order: slots }])
    }

    /// Resolve exactly one living unit's turn.
    ///
    /// Dead units at the head of the queue are dropped without using up the
    /// step. Outside the `Battle` phase this does nothing.
    ///
    /// A turn that fails part-way is reported in [`StepOutcome::error`]. It
    /// does not count toward the turn limit and the unit leaves the queue.
    pub fn step(&mut self) -> StepOutcome {
        let mut events = Vec::new();
        if self.phase != BattlePhase::Battle {
            return StepOutcome {
                events,
                result: self.result,
                error: None,
            };
        }
        if self.conclude_if_decided(&mut events) {
            return self.outcome(events, None);
        }

        let mut failure = None;
        while let Some(id) = self.queue.pop_front() {
            let Some(unit) = self.board.unit(id).filter(|unit| unit.is_alive()) else {
                continue;
            };
            let side = unit.side;
            debug!(turn = self.turns_taken, unit = %unit.name, %side, "Turn");
            events.push(BattleEvent::TurnStarted {
                unit: UnitRef::from(unit),
                side,
            });

            let resolved = resolve_turn(&mut self.board, id, &mut events);
            failure = self.end_turn(id, resolved);
            break;
        }

        #[cfg(feature = "debug-validation")]
        {
            if let Some(problem) = self.board.validate() {
                warn!(%problem, "Board invariant violated");
            }
        }

        self.conclude_if_decided(&mut events);
        self.outcome(events, failure)
    }

    /// Count a finished turn and send a surviving unit to the back of the
    /// queue. A failed turn is dropped instead, along with its unit.
    fn end_turn(&mut self, id: UnitId, resolved: Result<()>) -> Option<SkirmishError> {
        if let Err(error) = resolved {
            warn!(%error, unit = id, "Turn aborted, unit removed from the queue");
            return Some(error);
        }
        self.turns_taken += 1;
        if self.board.unit(id).is_some_and(Unit::is_alive) {
            self.queue.push_back(id);
        }
        None
    }

    /// Step until the battle ends and return every event produced.
    ///
    /// With `max_turns` set to `None` a stalemate (for example two squads
    /// of healers) never ends; keep a limit when running untrusted setups.
    pub fn run_to_completion(&mut self) -> Vec<BattleEvent> {
        let mut events = Vec::new();
        while self.phase == BattlePhase::Battle {
            events.extend(self.step().events);
        }
        events
    }

    fn outcome(&self, events: Vec<BattleEvent>, error: Option<SkirmishError>) -> StepOutcome {
        StepOutcome {
            events,
            result: self.result,
            error,
        }
    }

    /// End the battle if a side is wiped out or the turn limit is hit.
    fn conclude_if_decided(&mut self, events: &mut Vec<BattleEvent>) -> bool {
        let player = self.board.any_alive(Side::Player);
        let enemy = self.board.any_alive(Side::Enemy);

        let (result, reason) = if !player || !enemy || self.queue.is_empty() {
            let result = match (player, enemy) {
                (true, false) => BattleResult::PlayerWins,
                (false, true) => BattleResult::EnemyWins,
                _ => BattleResult::Draw,
            };
            (result, EndReason::Elimination)
        } else if self
            .config
            .max_turns
            .is_some_and(|limit| self.turns_taken >= limit)
        {
            (BattleResult::Draw, EndReason::TurnLimit)
        } else {
            return false;
        };

        self.phase = BattlePhase::Ended;
        self.result = Some(result);
        self.end_reason = Some(reason);
        self.queue.clear();
        info!(%result, ?reason, turns = self.turns_taken, "Battle ended");
        events.push(BattleEvent::BattleEnded { result, reason });
        true
    }

    fn ensure_setup(&self, action: &str) -> Result<()> {
        if self.phase == BattlePhase::Setup {
            Ok(())
        } else {
            Err(rejected(action, SkirmishError::InvalidPhase(self.phase)))
        }
    }

    // ------------------------------------------------------------------
    // Snapshots
    // ------------------------------------------------------------------

    /// Deterministic hash of the battle state.
    ///
    /// Two battles with the same hash have the same phase, queue and
    /// per-unit position and health.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();

        self.phase.hash(&mut hasher);
        self.result.hash(&mut hasher);
        self.turns_taken.hash(&mut hasher);
        self.queue.hash(&mut hasher);

        self.board.units().len().hash(&mut hasher);
        for unit in self.board.units().iter() {
            unit.id.hash(&mut hasher);
            unit.class.hash(&mut hasher);
            unit.side.hash(&mut hasher);
            unit.position.hash(&mut hasher);
            unit.hp().hash(&mut hasher);
            unit.is_alive().hash(&mut hasher);
        }

        hasher.finish()
    }

    /// Serialize the whole battle to bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding fails.
    pub fn serialize(&self) -> Result<Vec<u8>> {
        bincode::serialize(self)
            .map_err(|e| SkirmishError::Serialization(format!("Failed to serialize battle: {e}")))
    }

    /// Restore a battle from bytes produced by [`Battle::serialize`].
    ///
    /// # Errors
    ///
    /// Returns an error if the bytes are not a valid battle.
    pub fn deserialize(data: &[u8]) -> Result<Self> {
        bincode::deserialize(data)
            .map_err(|e| SkirmishError::Serialization(format!("Failed to deserialize battle: {e}")))
    }
}

fn rejected(action: &str, error: SkirmishError) -> SkirmishError {
    warn!(action, %error, "Command rejected");
    error
}
