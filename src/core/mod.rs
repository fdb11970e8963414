//! Rules engine for Armada.
//!
//! Pure and synchronous: every operation takes a `GameState` snapshot by
//! value and returns the next one. Nothing here performs IO or awaits.

pub mod ai;
pub mod common;
pub mod config;
pub mod game;
pub mod grid;
pub mod player;
pub mod ship;
pub mod shot;
pub mod skill;
pub mod turn;

pub use ai::{fallback_attack, hunt_target, pick_target, random_unresolved};
pub use common::{CellState, Coord, GameError, GridDimensions, LogResult, PlayerId, SkillError};
pub use config::*;
pub use game::{
    clear_radar_scan, confirm_transition, new_match, ready_player, select_action, ActionKind,
    ActionStage, ActiveAction, GameLogEntry, GamePhase, GameState, JammedArea, LobbyConfig,
    LobbySeat, RadarScanResult,
};
pub use grid::{
    can_place_ship, find_random_valid_placement, place_all_ships_randomly, place_ship, ship_cells,
    Grid,
};
pub use player::{create_initial_player, place_ships_for_ai, Player, AI_NAME_SUFFIX};
pub use ship::{Orientation, Ship, ShipConfig, ShipType};
pub use shot::{classic_shot, process_shot, score_attack_shot, tactical_shot};
pub use skill::{use_skill, SkillAction, SkillOutcome};
pub use turn::advance_turn;
