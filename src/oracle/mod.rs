//! Move suggestions for AI players.
//!
//! A [`MoveOracle`] answers an [`OracleRequest`] built only from what the AI
//! player is allowed to see. Replies are free text: either the JSON action
//! object or a bare `"X,Y"` pair. Anything that does not parse into a legal
//! action is replaced by the local hunt/target heuristic.

use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::core::ai::{fallback_attack, knowledge_of, pick_target};
use crate::core::grid::find_random_valid_placement;
use crate::core::{
    Coord, GameMode, GameState, Grid, GridDimensions, Orientation, PlayerId, ShipType,
    SkillAction,
};

pub mod local;
pub mod scripted;
pub mod tcp;

pub use local::LocalOracle;
pub use scripted::{ScriptedOracle, ScriptedReply};
pub use tcp::{serve_oracle, TcpOracle};

/// Source of suggested moves.
#[async_trait]
pub trait MoveOracle: Send + Sync {
    async fn suggest(&mut self, request: &OracleRequest) -> anyhow::Result<String>;
}

/// Ship as the opponent is allowed to know it: identity, not position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShipSummary {
    pub name: String,
    pub length: usize,
}

/// One own ship with its ability budget.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FleetStatus {
    pub name: String,
    pub ship_type: ShipType,
    pub length: usize,
    pub is_sunk: bool,
    pub is_damaged: bool,
    pub is_jammed: bool,
    pub cooldown: u32,
    pub uses: Option<u32>,
}

impl FleetStatus {
    /// Whether the ship's ability could be used right now.
    pub fn ready(&self) -> bool {
        !self.is_sunk && !self.is_jammed && self.cooldown == 0 && self.uses != Some(0)
    }
}

/// Observable state handed to an oracle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "camelCase")]
pub enum OracleRequest {
    /// Classic and Score-Attack.
    #[serde(rename_all = "camelCase")]
    Attack {
        shots_grid: Grid,
        target_ships: Vec<ShipSummary>,
        grid_dimensions: GridDimensions,
    },
    #[serde(rename_all = "camelCase")]
    Tactical {
        fleet: Vec<FleetStatus>,
        own_grid: Grid,
        shots_grid: Grid,
        escape_unlocked: bool,
        decoy_length: usize,
        turn: u32,
        grid_dimensions: GridDimensions,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawCoords {
    pub x: i64,
    pub y: i64,
}

/// Reply shape before validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawMove {
    pub action: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coords: Option<RawCoords>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ship_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_horizontal: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ship_to_move: Option<String>,
}

impl RawMove {
    pub fn attack(c: Coord) -> Self {
        Self {
            action: "ATTACK".to_string(),
            coords: Some(RawCoords {
                x: c.x as i64,
                y: c.y as i64,
            }),
            ship_type: None,
            is_horizontal: None,
            ship_to_move: None,
        }
    }

    pub fn skill(ship_type: ShipType, c: Option<Coord>) -> Self {
        Self {
            action: "SKILL".to_string(),
            coords: c.map(|c| RawCoords {
                x: c.x as i64,
                y: c.y as i64,
            }),
            ship_type: Some(ship_type.name().to_string()),
            is_horizontal: None,
            ship_to_move: None,
        }
    }
}

/// A validated AI move.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AiAction {
    Attack {
        target: Option<PlayerId>,
        coord: Coord,
    },
    Skill(SkillAction),
}

/// Parse an oracle reply: a JSON action, possibly wrapped in a code fence, or
/// a bare `"X,Y"` attack.
pub fn parse_reply(text: &str) -> anyhow::Result<RawMove> {
    let trimmed = text
        .trim()
        .trim_start_matches("```json")
        .trim_start_matches("```")
        .trim_end_matches("```")
        .trim();
    if trimmed.starts_with('{') {
        let raw: RawMove = serde_json::from_str(trimmed)
            .map_err(|e| anyhow::anyhow!("Malformed move JSON: {}", e))?;
        return Ok(raw);
    }
    let mut parts = trimmed.split(',');
    let (Some(x), Some(y), None) = (parts.next(), parts.next(), parts.next()) else {
        anyhow::bail!("Expected \"X,Y\", got {:?}", trimmed);
    };
    let x: i64 = x.trim().parse()?;
    let y: i64 = y.trim().parse()?;
    Ok(RawMove {
        action: "ATTACK".to_string(),
        coords: Some(RawCoords { x, y }),
        ship_type: None,
        is_horizontal: None,
        ship_to_move: None,
    })
}

fn coords_in(dims: GridDimensions, raw: Option<RawCoords>) -> anyhow::Result<Coord> {
    let c = raw.ok_or_else(|| anyhow::anyhow!("Missing coords"))?;
    if !dims.contains(c.x, c.y) {
        anyhow::bail!("Coords ({}, {}) are off the grid", c.x, c.y);
    }
    Ok(Coord::new(c.x as usize, c.y as usize))
}

/// Check a reply against the state it was requested for.
///
/// Attacks must name an in-bounds cell the actor has not resolved yet. Skill
/// replies must carry the fields their ship type needs; Escape and Relocate
/// destinations are chosen locally.
pub fn validate_move<R: Rng + ?Sized>(
    raw: RawMove,
    state: &GameState,
    actor: &str,
    target: Option<&str>,
    rng: &mut R,
) -> anyhow::Result<AiAction> {
    let dims = state.grid_dimensions;
    match raw.action.as_str() {
        "ATTACK" => {
            let coord = coords_in(dims, raw.coords)?;
            let knowledge = knowledge_of(state, actor, target);
            if !knowledge.get(coord).is_some_and(|s| s.is_unresolved()) {
                anyhow::bail!("{} is already resolved", coord);
            }
            Ok(AiAction::Attack {
                target: target.map(str::to_string),
                coord,
            })
        }
        "SKILL" => {
            if state.game_mode != GameMode::Tactical {
                anyhow::bail!("Skills are only available in Tactical mode");
            }
            let player = state
                .player(actor)
                .ok_or_else(|| anyhow::anyhow!("Unknown actor {}", actor))?;
            let name = raw
                .ship_type
                .as_deref()
                .ok_or_else(|| anyhow::anyhow!("Missing shipType"))?;
            let ship_type =
                ShipType::from_name(name).ok_or_else(|| anyhow::anyhow!("Unknown shipType {}", name))?;
            let action = match ship_type {
                ShipType::Mothership => {
                    let ship = player
                        .ship(ShipType::Mothership)
                        .ok_or_else(|| anyhow::anyhow!("No Mothership"))?;
                    let (origin, orientation) = find_random_valid_placement(&player.grid, ship, rng)
                        .ok_or_else(|| anyhow::anyhow!("No room to escape"))?;
                    SkillAction::Escape {
                        origin,
                        orientation,
                    }
                }
                ShipType::Commandship => {
                    let ship_name = raw
                        .ship_to_move
                        .as_deref()
                        .ok_or_else(|| anyhow::anyhow!("Missing shipToMove"))?;
                    let ship = player
                        .ship_named(ship_name)
                        .ok_or_else(|| anyhow::anyhow!("No ship named {}", ship_name))?;
                    if ship.ship_type == ShipType::Commandship || ship.is_damaged || ship.is_sunk {
                        anyhow::bail!("{} cannot be relocated", ship_name);
                    }
                    let (origin, orientation) = find_random_valid_placement(&player.grid, ship, rng)
                        .ok_or_else(|| anyhow::anyhow!("No room to relocate {}", ship_name))?;
                    SkillAction::Relocate {
                        ship_name: ship_name.to_string(),
                        origin,
                        orientation,
                    }
                }
                ShipType::Decoyship => SkillAction::DeployDecoy {
                    origin: coords_in(dims, raw.coords)?,
                    orientation: Orientation::from_horizontal(raw.is_horizontal.unwrap_or(false)),
                },
                ShipType::Radarship => SkillAction::RadarScan {
                    target: coords_in(dims, raw.coords)?,
                },
                ShipType::Repairship => SkillAction::Repair {
                    cell: coords_in(dims, raw.coords)?,
                },
                ShipType::Jamship => SkillAction::Jam {
                    center: coords_in(dims, raw.coords)?,
                },
                ShipType::Hull => anyhow::bail!("Hulls have no skill"),
            };
            Ok(AiAction::Skill(action))
        }
        other => anyhow::bail!("Unknown action {:?}", other),
    }
}

/// Observable state for `actor` aimed at `target`.
pub fn build_request(state: &GameState, actor: &str, target: Option<&str>) -> OracleRequest {
    let dims = state.grid_dimensions;
    let shots_grid = knowledge_of(state, actor, target);
    if state.game_mode != GameMode::Tactical {
        let ships = match target.and_then(|id| state.player(id)) {
            Some(p) => &p.ships,
            None => &state.battlefield_ships,
        };
        return OracleRequest::Attack {
            shots_grid,
            target_ships: ships
                .iter()
                .filter(|s| !s.is_sunk)
                .map(|s| ShipSummary {
                    name: s.name.clone(),
                    length: s.length,
                })
                .collect(),
            grid_dimensions: dims,
        };
    }
    let (fleet, own_grid, escape_unlocked) = match state.player(actor) {
        Some(p) => (
            p.ships
                .iter()
                .map(|s| FleetStatus {
                    name: s.name.clone(),
                    ship_type: s.ship_type,
                    length: s.length,
                    is_sunk: s.is_sunk,
                    is_damaged: s.is_damaged,
                    is_jammed: p.is_jammed(s),
                    cooldown: p.cooldown(s.ship_type),
                    uses: p.uses(s.ship_type),
                })
                .collect(),
            p.grid.clone(),
            p.escape_unlocked,
        ),
        None => (Vec::new(), Grid::new(dims), false),
    };
    OracleRequest::Tactical {
        fleet,
        own_grid,
        shots_grid,
        escape_unlocked,
        decoy_length: state.rules.decoy_length,
        turn: state.turn,
        grid_dimensions: dims,
    }
}

/// Ask the oracle for `actor`'s move and fall back to the local heuristic on
/// any failure. `None` only when no legal attack exists at all.
pub async fn request_move<O, R>(
    oracle: &mut O,
    state: &GameState,
    actor: &str,
    rng: &mut R,
    limit: Duration,
) -> Option<AiAction>
where
    O: MoveOracle + ?Sized,
    R: Rng + ?Sized,
{
    let target = pick_target(state, actor, rng)?;
    let request = build_request(state, actor, target.as_deref());

    let reply = match tokio::time::timeout(limit, oracle.suggest(&request)).await {
        Ok(Ok(text)) => Ok(text),
        Ok(Err(e)) => Err(e),
        Err(_) => Err(anyhow::anyhow!("Oracle timed out after {:?}", limit)),
    };
    let validated = reply
        .and_then(|text| parse_reply(&text))
        .and_then(|raw| validate_move(raw, state, actor, target.as_deref(), rng));

    match validated {
        Ok(action) => Some(action),
        Err(e) => {
            log::warn!("oracle move for {} rejected, using fallback: {}", actor, e);
            fallback_attack(state, actor, rng)
                .map(|(target, coord)| AiAction::Attack { target, coord })
        }
    }
}
