use serde::{Deserialize, Serialize};

use super::common::GridDimensions;
use super::ship::{ShipConfig, ShipType};

pub const STANDARD_GRID: GridDimensions = GridDimensions::new(12, 12);
pub const LARGE_GRID: GridDimensions = GridDimensions::new(12, 15);

pub const MIN_PLAYERS: usize = 2;
pub const MAX_PLAYERS: usize = 4;

/// Points awarded per confirmed hit in Score-Attack.
pub const HIT_SCORE: u32 = 1;

/// Knowledge-grid key for the shared Score-Attack board.
pub const BATTLEFIELD_KEY: &str = "BATTLEFIELD";

/// Log name given to a destroyed decoy so the attacker cannot tell it apart.
pub const DECOY_SUNK_NAME: &str = "Scout Ship";

/// Random draws per ship before a full fleet placement restarts.
pub const PLACEMENT_ATTEMPTS: usize = 500;

/// Random draws when relocating a single ship.
pub const RELOCATION_ATTEMPTS: usize = 100;

/// Game mode selected in the lobby.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameMode {
    Classic,
    ScoreAttack,
    Tactical,
}

/// Standard five-ship fleet.
pub fn default_roster() -> Vec<ShipConfig> {
    vec![
        ShipConfig::hull("Carrier", 5),
        ShipConfig::hull("Battleship", 4),
        ShipConfig::hull("Cruiser", 3),
        ShipConfig::hull("Submarine", 3),
        ShipConfig::hull("Destroyer", 2),
    ]
}

/// Ten-ship fleet used on the wide grid for three or four players.
pub fn large_roster() -> Vec<ShipConfig> {
    let mut ships = default_roster();
    ships.extend([
        ShipConfig::hull("Frigate", 3),
        ShipConfig::hull("Corvette", 2),
        ShipConfig::hull("Patrol Boat A", 2),
        ShipConfig::hull("Patrol Boat B", 2),
        ShipConfig::hull("Patrol Boat C", 2),
    ]);
    ships
}

/// Ability fleet for Tactical mode. The Jamship is only fielded when jamming
/// is enabled.
pub fn tactical_roster(rules: &SkillRules) -> Vec<ShipConfig> {
    let mut ships = vec![
        ShipConfig::new("Commandship", ShipType::Commandship, 5),
        ShipConfig::new("Decoyship", ShipType::Decoyship, 4),
        ShipConfig::new("Radarship", ShipType::Radarship, 3),
        ShipConfig::new("Repairship", ShipType::Repairship, 3),
    ];
    if rules.jam_enabled {
        ships.push(ShipConfig::new("Jamship", ShipType::Jamship, 3));
    }
    ships.push(ShipConfig::new("Mothership", ShipType::Mothership, 2));
    ships
}

/// Grid dimensions and roster for a lobby selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameConfig {
    pub grid_dimensions: GridDimensions,
    pub ships_config: Vec<ShipConfig>,
}

pub fn game_config(player_count: usize, mode: GameMode, rules: &SkillRules) -> GameConfig {
    match mode {
        GameMode::Tactical => GameConfig {
            grid_dimensions: STANDARD_GRID,
            ships_config: tactical_roster(rules),
        },
        _ if player_count <= 2 => GameConfig {
            grid_dimensions: STANDARD_GRID,
            ships_config: default_roster(),
        },
        _ => GameConfig {
            grid_dimensions: LARGE_GRID,
            ships_config: large_roster(),
        },
    }
}

/// How Repair is budgeted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RepairPolicy {
    /// Fixed number of uses for the whole match.
    Uses,
    /// Unlimited uses gated by a cooldown.
    Cooldown,
}

/// Where the radar footprint sits relative to the chosen cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RadarAnchor {
    TopLeft,
    Centered,
}

/// Tunable Tactical rules. The defaults follow the released rule set; the
/// variants cover the alternative rule revisions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillRules {
    pub repair_policy: RepairPolicy,
    pub repair_uses: u32,
    pub repair_cooldown: u32,
    pub repair_once_per_ship: bool,
    /// Fully repaired ships vanish from enemy knowledge grids.
    pub hide_fully_repaired: bool,
    pub radar_anchor: RadarAnchor,
    pub radar_size: usize,
    pub radar_cooldown: u32,
    pub jam_enabled: bool,
    pub jam_size: usize,
    pub jam_duration: u32,
    pub jam_cooldown: u32,
    pub relocate_cooldown: u32,
    pub decoy_uses: u32,
    pub decoy_length: usize,
    pub escape_uses: u32,
}

impl Default for SkillRules {
    fn default() -> Self {
        Self {
            repair_policy: RepairPolicy::Uses,
            repair_uses: 3,
            repair_cooldown: 3,
            repair_once_per_ship: false,
            hide_fully_repaired: true,
            radar_anchor: RadarAnchor::TopLeft,
            radar_size: 2,
            radar_cooldown: 3,
            jam_enabled: true,
            jam_size: 3,
            jam_duration: 2,
            jam_cooldown: 4,
            relocate_cooldown: 5,
            decoy_uses: 2,
            decoy_length: 4,
            escape_uses: 1,
        }
    }
}
