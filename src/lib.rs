//! Armada: a multi-mode Battleship engine.
//!
//! [`core`] holds the pure rules engine, [`oracle`] the AI move sources and
//! [`session`] the async orchestrator that ties them together.

pub mod core;
mod logging;
pub mod oracle;
pub mod session;

pub use crate::core::{
    new_match, CellState, Coord, GameError, GameMode, GamePhase, GameState, LobbyConfig,
    LobbySeat, SkillAction, SkillError, SkillRules,
};
pub use logging::init_logging;
pub use oracle::{LocalOracle, MoveOracle, ScriptedOracle, TcpOracle};
pub use session::{AiTurn, MatchSession, SessionConfig};
