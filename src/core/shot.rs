//! Shot resolution, one handler per game mode.
//!
//! Every handler consumes a snapshot and returns the next one. A shot at a
//! cell the attacker has already resolved returns the input untouched.

use super::common::{CellState, Coord, LogResult};
use super::config::{GameMode, BATTLEFIELD_KEY, DECOY_SUNK_NAME, HIT_SCORE};
use super::game::{GameLogEntry, GamePhase, GameState};
use super::grid::Grid;
use super::ship::ShipType;

/// Resolve one attack by the current player. `target_id` is ignored in
/// Score-Attack and optional in Tactical, where the only opponent is implied.
pub fn process_shot(state: GameState, target_id: Option<&str>, c: Coord) -> GameState {
    match state.game_mode {
        GameMode::Classic => classic_shot(state, target_id, c),
        GameMode::ScoreAttack => score_attack_shot(state, c),
        GameMode::Tactical => tactical_shot(state, target_id, c),
    }
}

/// Index of the attacker when a shot at `c` may be resolved at all.
fn shooter(state: &GameState, c: Coord) -> Option<usize> {
    if state.phase != GamePhase::Playing {
        log::warn!("shot ignored in phase {:?}", state.phase);
        return None;
    }
    if !state.grid_dimensions.contains_coord(c) {
        log::debug!("shot at {} is off the grid", c);
        return None;
    }
    let index = state.current_index();
    if index.is_none() {
        log::warn!("shot ignored, no current player");
    }
    index
}

fn target_index(state: &GameState, attacker: usize, target_id: Option<&str>) -> Option<usize> {
    let index = match target_id {
        Some(id) => state.player_index(id),
        None => state
            .players
            .iter()
            .position(|p| p.id != state.players[attacker].id && !p.is_eliminated),
    }?;
    if index == attacker || state.players[index].is_eliminated {
        log::warn!("{} is not a valid target", state.players[index].id);
        return None;
    }
    Some(index)
}

fn known_cell(state: &GameState, attacker: usize, key: &str, c: Coord) -> CellState {
    state.players[attacker]
        .shots
        .get(key)
        .and_then(|g| g.get(c))
        .unwrap_or(CellState::Empty)
}

fn shot_entry(state: &GameState, attacker: usize, target: usize, c: Coord) -> GameLogEntry {
    let mut entry = GameLogEntry::new(state.turn, &state.players[attacker], LogResult::Miss);
    entry.target_id = Some(state.players[target].id.clone());
    entry.target_name = Some(state.players[target].name.clone());
    entry.coords = Some(c);
    entry
}

fn describe(entry: &GameLogEntry) -> String {
    let at = entry.coords.map(|c| c.label()).unwrap_or_default();
    let whose = entry
        .target_name
        .as_ref()
        .map(|t| format!("{}'s ", t))
        .unwrap_or_else(|| "the ".to_string());
    match entry.result {
        LogResult::Miss => format!("{} fired at {} and missed", entry.player_name, at),
        LogResult::Hit => format!(
            "{} hit {}{} at {}",
            entry.player_name,
            whose,
            entry.hit_ship_name.as_deref().unwrap_or("ship"),
            at
        ),
        LogResult::SunkShip => format!(
            "{} sank {}{}!",
            entry.player_name,
            whose,
            entry.sunk_ship_name.as_deref().unwrap_or("ship")
        ),
        LogResult::SkillUsed => format!("{} used a skill", entry.player_name),
    }
}

fn finish(mut state: GameState, mut entry: GameLogEntry) -> GameState {
    entry.message = Some(describe(&entry));
    log::debug!("turn {}: {}", state.turn, describe(&entry));
    state.push_log(entry);
    state.has_acted_this_turn = true;
    state
}

/// Mark a ship sunk on both the owner's grid and the attacker's knowledge
/// once every one of its cells is struck.
fn sink_if_struck(state: &mut GameState, attacker: usize, target: usize, ship: usize) -> bool {
    let dims = state.grid_dimensions;
    let key = state.players[target].id.clone();
    let positions = state.players[target].ships[ship].positions.clone();
    let struck = positions.iter().all(|p| {
        state.players[target]
            .grid
            .get(*p)
            .is_some_and(CellState::is_struck)
    });
    if !struck {
        return false;
    }
    state.players[target].ships[ship].is_sunk = true;
    for &p in &positions {
        state.players[target].grid.set(p, CellState::Sunk);
    }
    let knowledge = state.players[attacker].knowledge_mut(&key, dims);
    for &p in &positions {
        knowledge.set(p, CellState::Sunk);
    }
    log::info!(
        "{} sank {}'s {}",
        state.players[attacker].name,
        state.players[target].name,
        state.players[target].ships[ship].name
    );
    true
}

/// End the match when at most one fleet is still afloat.
fn check_last_fleet_standing(state: &mut GameState, target: usize) {
    if state.players[target].is_eliminated || !state.players[target].all_ships_sunk() {
        return;
    }
    state.players[target].is_eliminated = true;
    log::info!("{} has been eliminated", state.players[target].name);
    let remaining: Vec<_> = state.active_players().map(|p| p.id.clone()).collect();
    if remaining.len() <= 1 {
        state.phase = GamePhase::GameOver;
        state.winner = remaining.into_iter().next();
        log::info!("game over, winner {:?}", state.winner);
    }
}

/// Classic: fire at one chosen opponent.
pub fn classic_shot(state: GameState, target_id: Option<&str>, c: Coord) -> GameState {
    let Some(attacker) = shooter(&state, c) else {
        return state;
    };
    let Some(target) = target_index(&state, attacker, target_id) else {
        return state;
    };
    let key = state.players[target].id.clone();
    if !known_cell(&state, attacker, &key, c).is_unresolved() {
        return state;
    }

    let mut state = state;
    let dims = state.grid_dimensions;
    let mut entry = shot_entry(&state, attacker, target, c);
    let cell = state.players[target].grid.get(c).unwrap_or(CellState::Empty);
    let ship = state.players[target].ships.iter().position(|s| s.occupies(c));

    match cell {
        CellState::Ship | CellState::Hit => {
            state.players[attacker].knowledge_mut(&key, dims).set(c, CellState::Hit);
            state.players[target].grid.set(c, CellState::Hit);
            entry.result = LogResult::Hit;
            if let Some(si) = ship {
                entry.hit_ship_name = Some(state.players[target].ships[si].name.clone());
                if sink_if_struck(&mut state, attacker, target, si) {
                    entry.result = LogResult::SunkShip;
                    entry.sunk_ship_name = entry.hit_ship_name.clone();
                }
            }
            check_last_fleet_standing(&mut state, target);
        }
        CellState::Sunk => {
            // Wreck already sunk by another attacker.
            state.players[attacker].knowledge_mut(&key, dims).set(c, CellState::Sunk);
            entry.result = LogResult::Hit;
            entry.hit_ship_name = ship.map(|si| state.players[target].ships[si].name.clone());
        }
        _ => {
            state.players[attacker].knowledge_mut(&key, dims).set(c, CellState::Miss);
            if cell == CellState::Empty {
                state.players[target].grid.set(c, CellState::Miss);
            }
        }
    }
    finish(state, entry)
}

/// Score-Attack: every player fires at the shared battlefield, and every
/// player's view of it is updated with the result.
pub fn score_attack_shot(state: GameState, c: Coord) -> GameState {
    let Some(attacker) = shooter(&state, c) else {
        return state;
    };
    let Some(battlefield) = state.battlefield_grid.as_ref() else {
        log::warn!("score-attack shot without a battlefield");
        return state;
    };
    if !known_cell(&state, attacker, BATTLEFIELD_KEY, c).is_unresolved() {
        return state;
    }
    let cell = battlefield.get(c).unwrap_or(CellState::Empty);

    let mut state = state;
    let dims = state.grid_dimensions;
    let mut entry = GameLogEntry::new(state.turn, &state.players[attacker], LogResult::Miss);
    entry.coords = Some(c);

    let mut battlefield = state
        .battlefield_grid
        .take()
        .unwrap_or_else(|| Grid::new(dims));
    if cell == CellState::Ship {
        battlefield.set(c, CellState::Hit);
        for p in &mut state.players {
            p.knowledge_mut(BATTLEFIELD_KEY, dims).set(c, CellState::Hit);
        }
        state.players[attacker].score += HIT_SCORE;
        entry.result = LogResult::Hit;

        if let Some(si) = state.battlefield_ships.iter().position(|s| s.occupies(c)) {
            let positions = state.battlefield_ships[si].positions.clone();
            entry.hit_ship_name = Some(state.battlefield_ships[si].name.clone());
            let struck = positions
                .iter()
                .all(|p| battlefield.get(*p).is_some_and(CellState::is_struck));
            if struck {
                state.battlefield_ships[si].is_sunk = true;
                entry.result = LogResult::SunkShip;
                entry.sunk_ship_name = entry.hit_ship_name.clone();
                for &p in &positions {
                    battlefield.set(p, CellState::Sunk);
                    for player in &mut state.players {
                        player.knowledge_mut(BATTLEFIELD_KEY, dims).set(p, CellState::Sunk);
                    }
                }
                log::info!("{} sank the {}", state.players[attacker].name, state.battlefield_ships[si].name);
            }
        }
    } else {
        for p in &mut state.players {
            p.knowledge_mut(BATTLEFIELD_KEY, dims).set(c, CellState::Miss);
        }
        if cell == CellState::Empty {
            battlefield.set(c, CellState::Miss);
        }
    }
    state.battlefield_grid = Some(battlefield);

    if !state.is_final_round && state.battlefield_ships.iter().all(|s| s.is_sunk) {
        state.is_final_round = true;
        log::info!("last battlefield ship sunk, final round begins");
    }
    finish(state, entry)
}

/// Tactical: one versus one with decoys, permanent damage and the
/// Mothership as the loss condition.
pub fn tactical_shot(state: GameState, target_id: Option<&str>, c: Coord) -> GameState {
    let Some(attacker) = shooter(&state, c) else {
        return state;
    };
    let Some(target) = target_index(&state, attacker, target_id) else {
        return state;
    };
    let key = state.players[target].id.clone();
    if !known_cell(&state, attacker, &key, c).is_unresolved() {
        return state;
    }

    let mut state = state;
    let dims = state.grid_dimensions;
    let mut entry = shot_entry(&state, attacker, target, c);

    let decoy_hit = state.players[target]
        .decoy_ship
        .as_ref()
        .is_some_and(|d| d.occupies(c));
    if decoy_hit {
        if let Some(decoy) = state.players[target].decoy_ship.take() {
            let knowledge = state.players[attacker].knowledge_mut(&key, dims);
            for &p in &decoy.positions {
                knowledge.set(p, CellState::Miss);
            }
            for &p in &decoy.positions {
                if state.players[target].grid.get(p) == Some(CellState::Decoy) {
                    state.players[target].grid.set(p, CellState::Miss);
                }
            }
        }
        entry.result = LogResult::SunkShip;
        entry.sunk_ship_name = Some(DECOY_SUNK_NAME.to_string());
        log::info!("{} destroyed a decoy", state.players[attacker].name);
        return finish(state, entry);
    }

    let cell = state.players[target].grid.get(c).unwrap_or(CellState::Empty);
    let ship = state.players[target].ships.iter().position(|s| s.occupies(c));

    match (cell, ship) {
        (CellState::Ship, Some(si)) => {
            let scarred = state.players[target].ships[si]
                .positions
                .iter()
                .any(|p| state.players[target].grid.get(*p) == Some(CellState::PermanentDamage));
            let mark = if scarred {
                CellState::Hit
            } else {
                CellState::PermanentDamage
            };
            state.players[attacker].knowledge_mut(&key, dims).set(c, CellState::Hit);
            state.players[target].grid.set(c, mark);
            state.players[target].ships[si].is_damaged = true;
            if state.players[target].ships[si].ship_type == ShipType::Mothership
                && !state.players[target].escape_unlocked
            {
                state.players[target].escape_unlocked = true;
                log::debug!("{} unlocked Escape", state.players[target].name);
            }
            state.record_hit(&key, c);
            entry.result = LogResult::Hit;
            entry.hit_ship_name = Some(state.players[target].ships[si].name.clone());
            resolve_tactical_sink(&mut state, attacker, target, si, &mut entry);
        }
        (CellState::Hit | CellState::PermanentDamage, Some(si)) => {
            // Damage hidden from the attacker by a full repair, found again.
            state.players[attacker].knowledge_mut(&key, dims).set(c, CellState::Hit);
            entry.result = LogResult::Hit;
            entry.hit_ship_name = Some(state.players[target].ships[si].name.clone());
            resolve_tactical_sink(&mut state, attacker, target, si, &mut entry);
        }
        (CellState::Sunk, _) => {
            state.players[attacker].knowledge_mut(&key, dims).set(c, CellState::Sunk);
            entry.result = LogResult::Hit;
            entry.hit_ship_name = ship.map(|si| state.players[target].ships[si].name.clone());
        }
        _ => {
            state.players[attacker].knowledge_mut(&key, dims).set(c, CellState::Miss);
            if cell == CellState::Empty {
                state.players[target].grid.set(c, CellState::Miss);
            }
        }
    }
    finish(state, entry)
}

fn resolve_tactical_sink(
    state: &mut GameState,
    attacker: usize,
    target: usize,
    ship: usize,
    entry: &mut GameLogEntry,
) {
    if !sink_if_struck(state, attacker, target, ship) {
        return;
    }
    entry.result = LogResult::SunkShip;
    entry.sunk_ship_name = entry.hit_ship_name.clone();
    if state.players[target].ships[ship].ship_type == ShipType::Mothership {
        state.players[target].is_eliminated = true;
        state.phase = GamePhase::GameOver;
        state.winner = Some(state.players[attacker].id.clone());
        log::info!("{} sank the Mothership and wins", state.players[attacker].name);
    }
}
