//! Match aggregate: phases, the action log and the lobby-to-playing flow.

use std::collections::{BTreeMap, VecDeque};

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::common::{Coord, GameError, GridDimensions, LogResult, PlayerId};
use super::config::{game_config, GameMode, SkillRules, BATTLEFIELD_KEY, MAX_PLAYERS, MIN_PLAYERS};
use super::grid::{place_all_ships_randomly, Grid};
use super::player::{create_initial_player, place_ships_for_ai, Player};
use super::ship::{Orientation, Ship, ShipConfig, ShipType};

/// Phase state machine of a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GamePhase {
    Lobby,
    Setup,
    TurnTransition,
    Playing,
    GameOver,
}

/// One resolved action in the match log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameLogEntry {
    pub turn: u32,
    pub player_id: PlayerId,
    pub player_name: String,
    pub target_id: Option<PlayerId>,
    pub target_name: Option<String>,
    pub coords: Option<Coord>,
    pub result: LogResult,
    pub sunk_ship_name: Option<String>,
    pub hit_ship_name: Option<String>,
    pub message: Option<String>,
}

impl GameLogEntry {
    pub fn new(turn: u32, actor: &Player, result: LogResult) -> Self {
        Self {
            turn,
            player_id: actor.id.clone(),
            player_name: actor.name.clone(),
            target_id: None,
            target_name: None,
            coords: None,
            result,
            sunk_ship_name: None,
            hit_ship_name: None,
            message: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionKind {
    Attack,
    Skill,
}

/// Step of a multi-click skill selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionStage {
    SelectShip,
    PlaceShip,
    PlaceDecoy,
}

/// In-progress selection of the current actor. Never survives a turn change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveAction {
    pub player_id: PlayerId,
    pub kind: ActionKind,
    pub ship_type: Option<ShipType>,
    pub stage: Option<ActionStage>,
    pub ship_to_move: Option<String>,
    pub orientation: Orientation,
}

/// Cells revealed by the latest radar sweep, kept until the turn advances or
/// the orchestrator clears it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RadarScanResult {
    /// Player whose waters were scanned.
    pub player_id: PlayerId,
    pub cells: Vec<Coord>,
    pub contacts: Vec<Coord>,
}

/// Footprint of the latest jam, for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JammedArea {
    pub player_id: PlayerId,
    pub cells: Vec<Coord>,
}

/// Root aggregate of a match. Every engine operation consumes one snapshot
/// and returns the next.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameState {
    pub game_id: String,
    pub phase: GamePhase,
    pub players: Vec<Player>,
    pub current_player_id: Option<PlayerId>,
    pub winner: Option<PlayerId>,
    pub turn: u32,
    pub grid_dimensions: GridDimensions,
    pub ships_config: Vec<ShipConfig>,
    pub game_mode: GameMode,
    /// Newest entry first.
    pub log: VecDeque<GameLogEntry>,
    pub setup_player_index: Option<usize>,
    pub has_acted_this_turn: bool,
    pub battlefield_grid: Option<Grid>,
    pub battlefield_ships: Vec<Ship>,
    pub is_final_round: bool,
    pub active_action: Option<ActiveAction>,
    pub radar_scan_result: Option<RadarScanResult>,
    pub jammed_area: Option<JammedArea>,
    /// Per target: `"x,y"` to the turn the hit landed.
    pub hit_log: BTreeMap<PlayerId, BTreeMap<String, u32>>,
    pub rules: SkillRules,
}

impl GameState {
    pub fn player(&self, id: &str) -> Option<&Player> {
        self.players.iter().find(|p| p.id == id)
    }

    pub fn player_index(&self, id: &str) -> Option<usize> {
        self.players.iter().position(|p| p.id == id)
    }

    pub fn current_player(&self) -> Option<&Player> {
        self.current_player_id.as_deref().and_then(|id| self.player(id))
    }

    pub fn current_index(&self) -> Option<usize> {
        self.current_player_id
            .as_deref()
            .and_then(|id| self.player_index(id))
    }

    pub fn active_players(&self) -> impl Iterator<Item = &Player> {
        self.players.iter().filter(|p| !p.is_eliminated)
    }

    /// Non-eliminated players other than `id`.
    pub fn opponents_of<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a Player> + 'a {
        self.players
            .iter()
            .filter(move |p| p.id != id && !p.is_eliminated)
    }

    pub fn human_count(&self) -> usize {
        self.players.iter().filter(|p| !p.is_ai).count()
    }

    pub fn is_over(&self) -> bool {
        self.phase == GamePhase::GameOver
    }

    pub fn push_log(&mut self, entry: GameLogEntry) {
        self.log.push_front(entry);
    }

    /// Turn on which the hit at `c` on `target` landed, if recorded.
    pub fn hit_turn(&self, target: &str, c: Coord) -> Option<u32> {
        self.hit_log.get(target).and_then(|m| m.get(&c.key())).copied()
    }

    pub(crate) fn record_hit(&mut self, target: &str, c: Coord) {
        let turn = self.turn;
        self.hit_log
            .entry(target.to_string())
            .or_default()
            .insert(c.key(), turn);
    }

    /// Give every player an empty knowledge grid for each opponent it has not
    /// yet recorded.
    pub(crate) fn ensure_knowledge_grids(&mut self) {
        let dims = self.grid_dimensions;
        let ids: Vec<PlayerId> = self.players.iter().map(|p| p.id.clone()).collect();
        for player in &mut self.players {
            for id in &ids {
                if *id != player.id {
                    player.knowledge_mut(id, dims);
                }
            }
        }
    }
}

/// One seat in the lobby.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LobbySeat {
    pub name: String,
    pub is_ai: bool,
}

impl LobbySeat {
    pub fn human(name: &str) -> Self {
        Self {
            name: name.to_string(),
            is_ai: false,
        }
    }

    pub fn ai(name: &str) -> Self {
        Self {
            name: name.to_string(),
            is_ai: true,
        }
    }
}

/// Everything the lobby hands over to start a match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LobbyConfig {
    pub game_id: String,
    pub seats: Vec<LobbySeat>,
    pub mode: GameMode,
    pub rules: SkillRules,
}

impl LobbyConfig {
    pub fn new(game_id: &str, seats: Vec<LobbySeat>, mode: GameMode) -> Self {
        Self {
            game_id: game_id.to_string(),
            seats,
            mode,
            rules: SkillRules::default(),
        }
    }

    pub fn with_rules(mut self, rules: SkillRules) -> Self {
        self.rules = rules;
        self
    }
}

/// Create a match from the lobby selection.
///
/// AI fleets are placed immediately. Score-Attack skips setup entirely and
/// starts on a shared, randomly placed battlefield. Otherwise the match enters
/// `Setup` at the first human seat, or goes straight to `Playing` when every
/// seat is an AI.
pub fn new_match<R: Rng + ?Sized>(lobby: &LobbyConfig, rng: &mut R) -> Result<GameState, GameError> {
    let count = lobby.seats.len();
    if !(MIN_PLAYERS..=MAX_PLAYERS).contains(&count) {
        return Err(GameError::InvalidPlayerCount(count));
    }
    if lobby.mode == GameMode::Tactical && count != 2 {
        return Err(GameError::TacticalNeedsTwoPlayers(count));
    }
    let config = game_config(count, lobby.mode, &lobby.rules);
    let dims = config.grid_dimensions;

    let mut players = Vec::with_capacity(count);
    for (i, seat) in lobby.seats.iter().enumerate() {
        let id = format!("player-{}", i + 1);
        players.push(create_initial_player(
            &id,
            &seat.name,
            seat.is_ai,
            &config.ships_config,
            dims,
            lobby.mode,
            &lobby.rules,
        ));
    }

    let mut state = GameState {
        game_id: lobby.game_id.clone(),
        phase: GamePhase::Lobby,
        players: Vec::new(),
        current_player_id: None,
        winner: None,
        turn: 1,
        grid_dimensions: dims,
        ships_config: config.ships_config.clone(),
        game_mode: lobby.mode,
        log: VecDeque::new(),
        setup_player_index: None,
        has_acted_this_turn: false,
        battlefield_grid: None,
        battlefield_ships: Vec::new(),
        is_final_round: false,
        active_action: None,
        radar_scan_result: None,
        jammed_area: None,
        hit_log: BTreeMap::new(),
        rules: lobby.rules.clone(),
    };

    if lobby.mode == GameMode::ScoreAttack {
        let (grid, ships) = place_all_ships_randomly(&config.ships_config, dims, rng)?;
        state.players = players
            .into_iter()
            .map(|mut p| {
                p.is_ready = true;
                p.ships.clear();
                p.knowledge_mut(BATTLEFIELD_KEY, dims);
                p
            })
            .collect();
        state.battlefield_grid = Some(grid);
        state.battlefield_ships = ships;
        state.current_player_id = state.players.first().map(|p| p.id.clone());
        state.phase = GamePhase::Playing;
        log::info!("score-attack match {} started with {} players", state.game_id, count);
        return Ok(state);
    }

    let mut placed = Vec::with_capacity(count);
    for p in players {
        if p.is_ai {
            placed.push(place_ships_for_ai(p, &config.ships_config, dims, rng)?);
        } else {
            placed.push(p);
        }
    }
    state.players = placed;

    match state.players.iter().position(|p| !p.is_ai) {
        Some(first_human) => {
            state.phase = GamePhase::Setup;
            state.setup_player_index = Some(first_human);
        }
        None => {
            state.ensure_knowledge_grids();
            state.current_player_id = state.players.first().map(|p| p.id.clone());
            state.phase = GamePhase::Playing;
        }
    }
    log::info!(
        "{:?} match {} created with {} players, phase {:?}",
        state.game_mode,
        state.game_id,
        count,
        state.phase
    );
    Ok(state)
}

/// Accept the fleet of the player currently in setup.
///
/// Hands over to the next human through `TurnTransition`, or starts the match
/// once every human is ready.
pub fn ready_player(state: GameState, submitted: Player) -> Result<GameState, GameError> {
    if state.phase != GamePhase::Setup {
        return Err(GameError::WrongPhase);
    }
    let index = state
        .player_index(&submitted.id)
        .ok_or_else(|| GameError::UnknownPlayer(submitted.id.clone()))?;
    if state.setup_player_index != Some(index) {
        return Err(GameError::NotYourTurn);
    }
    if !submitted.fleet_is_placed(&state.ships_config) {
        return Err(GameError::InvalidFleet);
    }

    let mut next = state;
    next.players[index] = Player {
        is_ready: true,
        ..submitted
    };

    let next_human = next
        .players
        .iter()
        .enumerate()
        .position(|(i, p)| i > index && !p.is_ai);
    if let Some(next_index) = next_human {
        next.setup_player_index = Some(next_index);
        next.phase = GamePhase::TurnTransition;
        return Ok(next);
    }

    next.ensure_knowledge_grids();
    next.setup_player_index = None;
    next.current_player_id = next.players.first().map(|p| p.id.clone());
    let first_is_human = next.players.first().is_some_and(|p| !p.is_ai);
    next.phase = if first_is_human && next.human_count() > 1 {
        GamePhase::TurnTransition
    } else {
        GamePhase::Playing
    };
    log::info!("all fleets ready, match {} begins", next.game_id);
    Ok(next)
}

/// Leave the pass-the-device gate: back to setup while fleets are still being
/// placed, into play otherwise.
pub fn confirm_transition(state: GameState) -> GameState {
    if state.phase != GamePhase::TurnTransition {
        return state;
    }
    let phase = if state.setup_player_index.is_some() {
        GamePhase::Setup
    } else {
        GamePhase::Playing
    };
    GameState { phase, ..state }
}

/// Record the actor's in-progress selection. Ignored for anyone but the
/// current player.
pub fn select_action(state: GameState, action: ActiveAction) -> GameState {
    if state.current_player_id.as_deref() != Some(action.player_id.as_str()) {
        return state;
    }
    GameState {
        active_action: Some(action),
        ..state
    }
}

/// Drop the radar overlay once the orchestrator's display timer runs out.
pub fn clear_radar_scan(state: GameState) -> GameState {
    GameState {
        radar_scan_result: None,
        ..state
    }
}
