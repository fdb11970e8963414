use std::collections::BTreeMap;

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::common::{CellState, Coord, GameError, GridDimensions, PlayerId};
use super::config::{GameMode, RepairPolicy, SkillRules};
use super::grid::{place_all_ships_randomly, ship_cells, Grid};
use super::ship::{Ship, ShipConfig, ShipType};

/// Suffix appended to the display name of computer-controlled players.
pub const AI_NAME_SUFFIX: &str = " (AI)";

/// One participant in a match, holding its fleet and its view of the others.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub is_ai: bool,
    /// Ground truth of this player's fleet.
    pub grid: Grid,
    pub ships: Vec<Ship>,
    /// Knowledge grids keyed by opponent id, or by the battlefield key in
    /// Score-Attack.
    pub shots: BTreeMap<String, Grid>,
    pub is_ready: bool,
    pub is_eliminated: bool,
    pub score: u32,
    pub skill_cooldowns: BTreeMap<ShipType, u32>,
    pub skill_uses: BTreeMap<ShipType, u32>,
    pub decoy_ship: Option<Ship>,
    pub jammed_positions: Vec<Coord>,
    pub jam_turns_remaining: u32,
    pub escape_unlocked: bool,
}

impl Player {
    pub fn ship(&self, ship_type: ShipType) -> Option<&Ship> {
        self.ships.iter().find(|s| s.ship_type == ship_type)
    }

    pub fn ship_named(&self, name: &str) -> Option<&Ship> {
        self.ships.iter().find(|s| s.name == name)
    }

    pub fn ship_at(&self, c: Coord) -> Option<&Ship> {
        self.ships.iter().find(|s| s.occupies(c))
    }

    pub fn all_ships_sunk(&self) -> bool {
        self.ships.iter().all(|s| s.is_sunk)
    }

    /// Whether any cell of the ship is inside the active jam footprint.
    pub fn is_jammed(&self, ship: &Ship) -> bool {
        self.jam_turns_remaining > 0
            && ship.positions.iter().any(|p| self.jammed_positions.contains(p))
    }

    pub fn cooldown(&self, ship_type: ShipType) -> u32 {
        self.skill_cooldowns.get(&ship_type).copied().unwrap_or(0)
    }

    pub fn uses(&self, ship_type: ShipType) -> Option<u32> {
        self.skill_uses.get(&ship_type).copied()
    }

    /// Knowledge grid for `key`, created empty on first access.
    pub fn knowledge_mut(&mut self, key: &str, dims: GridDimensions) -> &mut Grid {
        self.shots
            .entry(key.to_string())
            .or_insert_with(|| Grid::new(dims))
    }

    /// True once the fleet matches the roster one to one and every ship sits
    /// in a straight, unshared run of `Ship` cells. The grid may hold no
    /// `Ship` cell that no ship owns.
    pub fn fleet_is_placed(&self, roster: &[ShipConfig]) -> bool {
        if self.ships.len() != roster.len() {
            return false;
        }
        let mut names: Vec<&str> = Vec::with_capacity(self.ships.len());
        let mut seen = Vec::new();
        for ship in &self.ships {
            let Some(entry) = roster.iter().find(|r| r.name == ship.name) else {
                return false;
            };
            if names.contains(&ship.name.as_str())
                || entry.length != ship.length
                || entry.ship_type != ship.ship_type
                || !ship.is_placed()
            {
                return false;
            }
            names.push(&ship.name);

            let Some(&origin) = ship.positions.first() else {
                return false;
            };
            if ship.positions != ship_cells(ship.length, origin, ship.orientation()) {
                return false;
            }
            for &p in &ship.positions {
                if self.grid.get(p) != Some(CellState::Ship) || seen.contains(&p) {
                    return false;
                }
                seen.push(p);
            }
        }
        self.grid.count(CellState::Ship) == roster.iter().map(|r| r.length).sum::<usize>()
    }
}

/// Starting ability budgets for a Tactical player.
fn tactical_budgets(rules: &SkillRules) -> (BTreeMap<ShipType, u32>, BTreeMap<ShipType, u32>) {
    let mut cooldowns = BTreeMap::new();
    let mut uses = BTreeMap::new();
    cooldowns.insert(ShipType::Radarship, 0);
    cooldowns.insert(ShipType::Commandship, 0);
    if rules.jam_enabled {
        cooldowns.insert(ShipType::Jamship, 0);
    }
    match rules.repair_policy {
        RepairPolicy::Uses => {
            uses.insert(ShipType::Repairship, rules.repair_uses);
        }
        RepairPolicy::Cooldown => {
            cooldowns.insert(ShipType::Repairship, 0);
        }
    }
    uses.insert(ShipType::Decoyship, rules.decoy_uses);
    uses.insert(ShipType::Mothership, rules.escape_uses);
    (cooldowns, uses)
}

/// Build a player with an empty grid and an unplaced copy of the roster.
/// Ability budgets are only seeded in Tactical mode.
pub fn create_initial_player(
    id: &str,
    name: &str,
    is_ai: bool,
    ships_config: &[ShipConfig],
    dims: GridDimensions,
    mode: GameMode,
    rules: &SkillRules,
) -> Player {
    let (skill_cooldowns, skill_uses) = match mode {
        GameMode::Tactical => tactical_budgets(rules),
        _ => (BTreeMap::new(), BTreeMap::new()),
    };
    Player {
        id: id.to_string(),
        name: if is_ai {
            format!("{}{}", name, AI_NAME_SUFFIX)
        } else {
            name.to_string()
        },
        is_ai,
        grid: Grid::new(dims),
        ships: ships_config.iter().map(Ship::from_config).collect(),
        shots: BTreeMap::new(),
        is_ready: false,
        is_eliminated: false,
        score: 0,
        skill_cooldowns,
        skill_uses,
        decoy_ship: None,
        jammed_positions: Vec::new(),
        jam_turns_remaining: 0,
        escape_unlocked: false,
    }
}

/// Place the roster at random and mark the player ready.
pub fn place_ships_for_ai<R: Rng + ?Sized>(
    player: Player,
    ships_config: &[ShipConfig],
    dims: GridDimensions,
    rng: &mut R,
) -> Result<Player, GameError> {
    let (grid, ships) = place_all_ships_randomly(ships_config, dims, rng)?;
    log::debug!("auto-placed {} ships for {}", ships.len(), player.name);
    Ok(Player {
        grid,
        ships,
        is_ready: true,
        ..player
    })
}
