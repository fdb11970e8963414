//! Common types for Armada: cell states, coordinates, log tags and errors.

use std::fmt;
use serde::{Deserialize, Serialize};

/// Identifier of a player inside one match.
pub type PlayerId = String;

/// State of a single grid cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CellState {
    Empty,
    Ship,
    Hit,
    Miss,
    Sunk,
    Decoy,
    RadarContact,
    PermanentDamage,
}

impl CellState {
    /// Terminal hit states: a ship whose every cell is in one of these is sunk.
    pub fn is_struck(self) -> bool {
        matches!(
            self,
            CellState::Hit | CellState::Sunk | CellState::PermanentDamage
        )
    }

    /// Whether a knowledge-grid cell may still be fired at.
    pub fn is_unresolved(self) -> bool {
        matches!(self, CellState::Empty | CellState::RadarContact)
    }

    /// Single-character rendering used by the oracle prompt grid and the CLI.
    pub fn glyph(self) -> char {
        match self {
            CellState::Empty => '.',
            CellState::Ship => 'O',
            CellState::Hit => 'H',
            CellState::Miss => 'M',
            CellState::Sunk => 'S',
            CellState::Decoy => 'D',
            CellState::RadarContact => '?',
            CellState::PermanentDamage => 'P',
        }
    }
}

/// Column (`x`) / row (`y`) coordinate on a grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Coord {
    pub x: usize,
    pub y: usize,
}

impl Coord {
    pub const fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }

    /// Key used by the per-player hit log.
    pub fn key(&self) -> String {
        format!("{},{}", self.x, self.y)
    }

    /// Board notation, e.g. `C7` for `(2, 6)`.
    pub fn label(&self) -> String {
        let col = (b'A' + (self.x % 26) as u8) as char;
        format!("{}{}", col, self.y + 1)
    }
}

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Grid dimensions for a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridDimensions {
    pub rows: usize,
    pub cols: usize,
}

impl GridDimensions {
    pub const fn new(rows: usize, cols: usize) -> Self {
        Self { rows, cols }
    }

    /// Signed bounds check, for coordinates coming from untrusted sources.
    pub fn contains(&self, x: i64, y: i64) -> bool {
        x >= 0 && y >= 0 && (x as usize) < self.cols && (y as usize) < self.rows
    }

    pub fn contains_coord(&self, c: Coord) -> bool {
        c.x < self.cols && c.y < self.rows
    }
}

/// Outcome tag of a log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LogResult {
    Hit,
    Miss,
    SunkShip,
    SkillUsed,
}

/// Errors returned by match setup and the orchestrator gates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameError {
    /// Lobby asked for fewer than two or more than four players.
    InvalidPlayerCount(usize),
    /// Tactical mode is strictly one versus one.
    TacticalNeedsTwoPlayers(usize),
    /// Player id not present in this match.
    UnknownPlayer(PlayerId),
    /// Operation not allowed in the current phase.
    WrongPhase,
    /// Acting player is not the current player, or is not human.
    NotYourTurn,
    /// One action per turn has already been spent.
    AlreadyActed,
    /// Turn cannot end before an action was taken.
    NoActionTaken,
    /// Submitted fleet is incomplete or inconsistent with its grid.
    InvalidFleet,
    /// Roster cannot fit on the grid at all.
    UnableToPlaceFleet,
    /// Shot did not change the state (already resolved cell or bad target).
    ShotRejected,
    /// Skill precondition failed.
    Skill(SkillError),
}

impl fmt::Display for GameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GameError::InvalidPlayerCount(n) => {
                write!(f, "A match needs 2 to 4 players, got {}", n)
            }
            GameError::TacticalNeedsTwoPlayers(n) => {
                write!(f, "Tactical mode needs exactly 2 players, got {}", n)
            }
            GameError::UnknownPlayer(id) => write!(f, "Unknown player {}", id),
            GameError::WrongPhase => write!(f, "Action not allowed in the current phase"),
            GameError::NotYourTurn => write!(f, "It is not your turn"),
            GameError::AlreadyActed => write!(f, "You have already acted this turn"),
            GameError::NoActionTaken => write!(f, "Take an action before ending the turn"),
            GameError::InvalidFleet => write!(f, "Fleet placement is incomplete or invalid"),
            GameError::UnableToPlaceFleet => write!(f, "Unable to fit the fleet on the grid"),
            GameError::ShotRejected => write!(f, "That cell has already been targeted"),
            GameError::Skill(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for GameError {}

impl From<SkillError> for GameError {
    fn from(err: SkillError) -> Self {
        GameError::Skill(err)
    }
}

/// Reasons a skill invocation is rejected without changing state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SkillError {
    OutOfTurn,
    NotTactical,
    SkillDisabled,
    ShipUnavailable,
    Jammed,
    OnCooldown(u32),
    NoUsesLeft,
    EscapeLocked,
    InvalidPlacement,
    NotRepairable,
    PermanentDamage,
    DamagedThisTurn,
    AlreadyRepaired,
    ShipSunk,
    ShipNotEligible,
    UnknownShip(String),
    NoOpponent,
    DecoyActive,
}

impl SkillError {
    /// Message shown to a human actor. `None` for silent rejections such as a
    /// mis-click on open water during Repair.
    pub fn advisory(&self) -> Option<String> {
        match self {
            SkillError::NotRepairable => None,
            other => Some(other.to_string()),
        }
    }
}

impl fmt::Display for SkillError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkillError::OutOfTurn => write!(f, "Skills can only be used during play"),
            SkillError::NotTactical => write!(f, "Skills are only available in Tactical mode"),
            SkillError::SkillDisabled => write!(f, "That skill is disabled in this match"),
            SkillError::ShipUnavailable => write!(f, "The ship carrying that skill is sunk or missing"),
            SkillError::Jammed => write!(f, "That ship is jammed"),
            SkillError::OnCooldown(t) => write!(f, "Skill on cooldown for {} more turn(s)", t),
            SkillError::NoUsesLeft => write!(f, "No uses left for that skill"),
            SkillError::EscapeLocked => write!(f, "Escape skill is not available"),
            SkillError::InvalidPlacement => write!(f, "Invalid placement for that ship"),
            SkillError::NotRepairable => write!(f, "Nothing to repair there"),
            SkillError::PermanentDamage => write!(f, "Permanent damage cannot be repaired"),
            SkillError::DamagedThisTurn => {
                write!(f, "Cannot repair damage sustained on the current turn")
            }
            SkillError::AlreadyRepaired => write!(f, "This ship has already been repaired once"),
            SkillError::ShipSunk => write!(f, "Cannot repair a ship that is already sunk"),
            SkillError::ShipNotEligible => {
                write!(f, "Only an undamaged ship other than the Commandship can be moved")
            }
            SkillError::UnknownShip(name) => write!(f, "No ship named {}", name),
            SkillError::NoOpponent => write!(f, "No opponent to target"),
            SkillError::DecoyActive => write!(f, "A decoy is already deployed"),
        }
    }
}

impl std::error::Error for SkillError {}
