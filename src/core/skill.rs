//! Tactical abilities. One handler per ship type behind a single entry point.
//!
//! Handlers run every precondition before touching the state, so a rejected
//! skill always leaves the snapshot exactly as it was.

use serde::{Deserialize, Serialize};

use super::common::{CellState, Coord, GridDimensions, LogResult, SkillError};
use super::config::{GameMode, RadarAnchor, RepairPolicy};
use super::game::{GameLogEntry, GamePhase, GameState, JammedArea, RadarScanResult};
use super::grid::{can_place_ship, place_ship, ship_cells};
use super::ship::{Orientation, Ship, ShipType};

/// A fully specified skill invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SkillAction {
    /// Mothership: heal and move to a new spot.
    Escape { origin: Coord, orientation: Orientation },
    /// Radarship: sweep a block of the opponent's waters.
    RadarScan { target: Coord },
    /// Jamship: disable opponent abilities around `center`.
    Jam { center: Coord },
    /// Repairship: restore one hit cell of an own ship.
    Repair { cell: Coord },
    /// Decoyship: lay a decoy hull on the own grid.
    DeployDecoy { origin: Coord, orientation: Orientation },
    /// Commandship: move an undamaged ship.
    Relocate {
        ship_name: String,
        origin: Coord,
        orientation: Orientation,
    },
}

impl SkillAction {
    /// Ship whose ability this action uses.
    pub fn ship_type(&self) -> ShipType {
        match self {
            SkillAction::Escape { .. } => ShipType::Mothership,
            SkillAction::RadarScan { .. } => ShipType::Radarship,
            SkillAction::Jam { .. } => ShipType::Jamship,
            SkillAction::Repair { .. } => ShipType::Repairship,
            SkillAction::DeployDecoy { .. } => ShipType::Decoyship,
            SkillAction::Relocate { .. } => ShipType::Commandship,
        }
    }
}

/// Result of [`use_skill`]. On rejection `state` is the unchanged input.
#[derive(Debug, Clone)]
pub struct SkillOutcome {
    pub state: GameState,
    pub rejected: Option<SkillError>,
    /// Message for a human actor. Never set for AI actors.
    pub advisory: Option<String>,
}

impl SkillOutcome {
    pub fn applied(&self) -> bool {
        self.rejected.is_none()
    }
}

/// Apply a skill for the current player.
pub fn use_skill(state: GameState, action: SkillAction, is_ai: bool) -> SkillOutcome {
    let mut state = state;
    let result = match precheck(&state, action.ship_type()) {
        Ok((actor, opponent)) => match &action {
            SkillAction::Escape {
                origin,
                orientation,
            } => escape(&mut state, actor, *origin, *orientation),
            SkillAction::RadarScan { target } => radar_scan(&mut state, actor, opponent, *target),
            SkillAction::Jam { center } => jam(&mut state, actor, opponent, *center),
            SkillAction::Repair { cell } => repair(&mut state, actor, *cell),
            SkillAction::DeployDecoy {
                origin,
                orientation,
            } => deploy_decoy(&mut state, actor, *origin, *orientation),
            SkillAction::Relocate {
                ship_name,
                origin,
                orientation,
            } => relocate(&mut state, actor, ship_name, *origin, *orientation),
        }
        .map(|message| (actor, message)),
        Err(e) => Err(e),
    };

    match result {
        Ok((actor, message)) => {
            let mut entry = GameLogEntry::new(state.turn, &state.players[actor], LogResult::SkillUsed);
            entry.message = Some(message);
            log::debug!("turn {}: {:?}", state.turn, entry.message);
            state.push_log(entry);
            state.has_acted_this_turn = true;
            state.active_action = None;
            SkillOutcome {
                state,
                rejected: None,
                advisory: None,
            }
        }
        Err(err) => {
            log::debug!("{} rejected: {}", action.ship_type().skill_name(), err);
            let advisory = if is_ai { None } else { err.advisory() };
            SkillOutcome {
                state,
                rejected: Some(err),
                advisory,
            }
        }
    }
}

/// Checks shared by every ability: the carrier ship is afloat and unjammed,
/// its cooldown has expired and it has uses left.
fn precheck(state: &GameState, ship_type: ShipType) -> Result<(usize, usize), SkillError> {
    if state.game_mode != GameMode::Tactical {
        return Err(SkillError::NotTactical);
    }
    if state.phase != GamePhase::Playing {
        return Err(SkillError::OutOfTurn);
    }
    let actor = state.current_index().ok_or(SkillError::OutOfTurn)?;
    let player = &state.players[actor];
    let opponent = state
        .players
        .iter()
        .position(|p| p.id != player.id)
        .ok_or(SkillError::NoOpponent)?;

    if ship_type == ShipType::Jamship && !state.rules.jam_enabled {
        return Err(SkillError::SkillDisabled);
    }
    let ship = player.ship(ship_type).ok_or(SkillError::ShipUnavailable)?;
    if ship.is_sunk {
        return Err(SkillError::ShipUnavailable);
    }
    if player.is_jammed(ship) {
        return Err(SkillError::Jammed);
    }
    if ship_type == ShipType::Mothership && !player.escape_unlocked {
        return Err(SkillError::EscapeLocked);
    }
    let cooldown = player.cooldown(ship_type);
    if cooldown > 0 {
        return Err(SkillError::OnCooldown(cooldown));
    }
    if player.uses(ship_type) == Some(0) {
        return Err(SkillError::NoUsesLeft);
    }
    Ok((actor, opponent))
}

/// In-bounds cells of a `size`×`size` block.
fn footprint(dims: GridDimensions, anchor: Coord, size: usize, centered: bool) -> Vec<Coord> {
    let offset = if centered { (size / 2) as i64 } else { 0 };
    let x0 = anchor.x as i64 - offset;
    let y0 = anchor.y as i64 - offset;
    let mut cells = Vec::with_capacity(size * size);
    for dy in 0..size as i64 {
        for dx in 0..size as i64 {
            let (x, y) = (x0 + dx, y0 + dy);
            if dims.contains(x, y) {
                cells.push(Coord::new(x as usize, y as usize));
            }
        }
    }
    cells
}

/// Revert opponents' `Hit`/`Sunk` markers on `positions` to `Empty`.
fn hide_from_opponents(state: &mut GameState, owner: usize, positions: &[Coord]) {
    let owner_id = state.players[owner].id.clone();
    for (i, player) in state.players.iter_mut().enumerate() {
        if i == owner {
            continue;
        }
        if let Some(grid) = player.shots.get_mut(&owner_id) {
            for &p in positions {
                if matches!(grid.get(p), Some(CellState::Hit | CellState::Sunk)) {
                    grid.set(p, CellState::Empty);
                }
            }
        }
    }
}

fn escape(
    state: &mut GameState,
    actor: usize,
    origin: Coord,
    orientation: Orientation,
) -> Result<String, SkillError> {
    let player = &state.players[actor];
    let index = player
        .ships
        .iter()
        .position(|s| s.ship_type == ShipType::Mothership)
        .ok_or(SkillError::ShipUnavailable)?;
    let mothership = player.ships[index].clone();
    let cleared = player.grid.without(&mothership.positions);
    if !can_place_ship(&cleared, mothership.length, origin, orientation) {
        return Err(SkillError::InvalidPlacement);
    }

    hide_from_opponents(state, actor, &mothership.positions);
    let actor_id = state.players[actor].id.clone();
    if let Some(hits) = state.hit_log.get_mut(&actor_id) {
        for p in &mothership.positions {
            hits.remove(&p.key());
        }
    }
    let healed = Ship {
        is_damaged: false,
        ..mothership
    };
    let (grid, moved) = place_ship(&cleared, &healed, origin, orientation);
    let player = &mut state.players[actor];
    player.grid = grid;
    player.ships[index] = moved;
    player.skill_uses.insert(ShipType::Mothership, 0);
    log::info!("{} escaped with the Mothership", player.name);
    Ok(format!(
        "{} used Escape! The Mothership has been repaired and relocated!",
        player.name
    ))
}

fn radar_scan(
    state: &mut GameState,
    actor: usize,
    opponent: usize,
    target: Coord,
) -> Result<String, SkillError> {
    let dims = state.grid_dimensions;
    if !dims.contains_coord(target) {
        return Err(SkillError::InvalidPlacement);
    }
    let rules = &state.rules;
    let area = footprint(
        dims,
        target,
        rules.radar_size,
        rules.radar_anchor == RadarAnchor::Centered,
    );
    let cooldown = rules.radar_cooldown;
    let opponent_id = state.players[opponent].id.clone();
    let opponent_grid = state.players[opponent].grid.clone();

    let knowledge = state.players[actor].knowledge_mut(&opponent_id, dims);
    let mut cells = Vec::new();
    let mut contacts = Vec::new();
    for c in area {
        if knowledge.get(c) != Some(CellState::Empty) {
            continue;
        }
        cells.push(c);
        let occupied = matches!(
            opponent_grid.get(c),
            Some(
                CellState::Ship
                    | CellState::Decoy
                    | CellState::Hit
                    | CellState::PermanentDamage
                    | CellState::Sunk
            )
        );
        if occupied {
            knowledge.set(c, CellState::RadarContact);
            contacts.push(c);
        }
    }
    log::debug!("radar swept {} cells, {} contacts", cells.len(), contacts.len());
    state.radar_scan_result = Some(RadarScanResult {
        player_id: opponent_id,
        cells,
        contacts,
    });
    state.players[actor]
        .skill_cooldowns
        .insert(ShipType::Radarship, cooldown);
    Ok(format!("Radar Scan used. Cooldown set to {} turns.", cooldown))
}

fn jam(
    state: &mut GameState,
    actor: usize,
    opponent: usize,
    center: Coord,
) -> Result<String, SkillError> {
    let dims = state.grid_dimensions;
    if !dims.contains_coord(center) {
        return Err(SkillError::InvalidPlacement);
    }
    let cells = footprint(dims, center, state.rules.jam_size, true);
    let duration = state.rules.jam_duration;
    let cooldown = state.rules.jam_cooldown;

    let target = &mut state.players[opponent];
    target.jammed_positions = cells.clone();
    target.jam_turns_remaining = duration;
    state.jammed_area = Some(JammedArea {
        player_id: state.players[opponent].id.clone(),
        cells,
    });
    let player = &mut state.players[actor];
    player.skill_cooldowns.insert(ShipType::Jamship, cooldown);
    Ok(format!(
        "{} used Jam. Cooldown set to {} turns.",
        player.name, cooldown
    ))
}

fn repair(state: &mut GameState, actor: usize, cell: Coord) -> Result<String, SkillError> {
    let rules = state.rules.clone();
    let player = &state.players[actor];
    let index = player
        .ships
        .iter()
        .position(|s| s.occupies(cell))
        .ok_or(SkillError::NotRepairable)?;
    let ship = &player.ships[index];
    if ship.is_sunk {
        return Err(SkillError::ShipSunk);
    }
    if rules.repair_once_per_ship && ship.has_been_repaired {
        return Err(SkillError::AlreadyRepaired);
    }
    match player.grid.get(cell) {
        Some(CellState::Hit) => {}
        Some(CellState::PermanentDamage) => return Err(SkillError::PermanentDamage),
        _ => return Err(SkillError::NotRepairable),
    }
    match state.hit_turn(&player.id, cell) {
        Some(turn) if turn < state.turn => {}
        _ => return Err(SkillError::DamagedThisTurn),
    }

    let player = &mut state.players[actor];
    player.grid.set(cell, CellState::Ship);
    let grid = &player.grid;
    let ship = &mut player.ships[index];
    ship.has_been_repaired = true;
    ship.is_damaged = ship
        .positions
        .iter()
        .any(|p| grid.get(*p) == Some(CellState::Hit));
    let fully_repaired = !ship.is_damaged;
    let ship_name = ship.name.clone();
    let positions = ship.positions.clone();

    let cost = match rules.repair_policy {
        RepairPolicy::Uses => {
            let left = player.uses(ShipType::Repairship).unwrap_or(0).saturating_sub(1);
            player.skill_uses.insert(ShipType::Repairship, left);
            format!("Uses left: {}.", left)
        }
        RepairPolicy::Cooldown => {
            player
                .skill_cooldowns
                .insert(ShipType::Repairship, rules.repair_cooldown);
            format!("Cooldown: {} turns.", rules.repair_cooldown)
        }
    };
    let mut message = format!("{} repaired their {}. {}", player.name, ship_name, cost);

    if fully_repaired && rules.hide_fully_repaired {
        hide_from_opponents(state, actor, &positions);
        message.push_str(&format!(
            " The {} is fully repaired and is now hidden from enemy sensors!",
            ship_name
        ));
    }
    Ok(message)
}

fn deploy_decoy(
    state: &mut GameState,
    actor: usize,
    origin: Coord,
    orientation: Orientation,
) -> Result<String, SkillError> {
    let length = state.rules.decoy_length;
    let player = &state.players[actor];
    if player.decoy_ship.is_some() {
        return Err(SkillError::DecoyActive);
    }
    if !can_place_ship(&player.grid, length, origin, orientation) {
        return Err(SkillError::InvalidPlacement);
    }

    let positions = ship_cells(length, origin, orientation);
    let player = &mut state.players[actor];
    for &p in &positions {
        player.grid.set(p, CellState::Decoy);
    }
    player.decoy_ship = Some(Ship {
        name: "Decoy".to_string(),
        ship_type: ShipType::Decoyship,
        length,
        positions,
        is_sunk: false,
        is_damaged: false,
        has_been_repaired: false,
    });
    let left = player.uses(ShipType::Decoyship).unwrap_or(0).saturating_sub(1);
    player.skill_uses.insert(ShipType::Decoyship, left);
    Ok(format!("{} deployed a decoy.", player.name))
}

fn relocate(
    state: &mut GameState,
    actor: usize,
    ship_name: &str,
    origin: Coord,
    orientation: Orientation,
) -> Result<String, SkillError> {
    let cooldown = state.rules.relocate_cooldown;
    let player = &state.players[actor];
    let index = player
        .ships
        .iter()
        .position(|s| s.name == ship_name)
        .ok_or_else(|| SkillError::UnknownShip(ship_name.to_string()))?;
    let ship = &player.ships[index];
    let scarred = ship
        .positions
        .iter()
        .any(|p| player.grid.get(*p).is_some_and(CellState::is_struck));
    if ship.ship_type == ShipType::Commandship || ship.is_damaged || ship.is_sunk || scarred {
        return Err(SkillError::ShipNotEligible);
    }
    let cleared = player.grid.without(&ship.positions);
    if !can_place_ship(&cleared, ship.length, origin, orientation) {
        return Err(SkillError::InvalidPlacement);
    }

    let (grid, moved) = place_ship(&cleared, ship, origin, orientation);
    let player = &mut state.players[actor];
    player.grid = grid;
    player.ships[index] = moved;
    player
        .skill_cooldowns
        .insert(ShipType::Commandship, cooldown);
    Ok(format!("{} has relocated a ship!", player.name))
}
