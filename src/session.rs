//! Match orchestrator: owns one `GameState`, serialises every mutation and
//! drives AI turns through a [`MoveOracle`].

use std::time::Duration;

use rand::rngs::SmallRng;
use rand::SeedableRng;

use crate::core::ai::fallback_attack;
use crate::core::{
    advance_turn, clear_radar_scan, confirm_transition, process_shot, ready_player, select_action,
    use_skill, ActiveAction, Coord, GameError, GamePhase, GameState, Player, SkillAction,
};
use crate::oracle::{request_move, AiAction, MoveOracle};

/// Pacing and timeout knobs for a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    /// Pause before an AI acts.
    pub ai_action_delay: Duration,
    /// Pause between an AI acting and its turn ending.
    pub ai_end_turn_delay: Duration,
    /// Upper bound on one oracle call.
    pub oracle_timeout: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            ai_action_delay: Duration::from_millis(1500),
            ai_end_turn_delay: Duration::from_millis(1000),
            oracle_timeout: Duration::from_secs(10),
        }
    }
}

impl SessionConfig {
    /// No pacing delays. Used by tests and the simulator.
    pub fn instant() -> Self {
        Self {
            ai_action_delay: Duration::ZERO,
            ai_end_turn_delay: Duration::ZERO,
            ..Self::default()
        }
    }
}

/// What an AI turn ended up doing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AiTurn {
    /// Not an AI's turn to act.
    Idle,
    Acted(AiAction),
    /// No legal move existed; the turn was passed.
    Passed,
}

pub struct MatchSession<O: MoveOracle> {
    state: GameState,
    oracle: O,
    rng: SmallRng,
    config: SessionConfig,
}

impl<O: MoveOracle> MatchSession<O> {
    pub fn new(state: GameState, oracle: O, config: SessionConfig) -> Self {
        Self {
            state,
            oracle,
            rng: SmallRng::from_rng(&mut rand::rng()),
            config,
        }
    }

    pub fn with_seed(state: GameState, oracle: O, config: SessionConfig, seed: u64) -> Self {
        Self {
            state,
            oracle,
            rng: SmallRng::seed_from_u64(seed),
            config,
        }
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn into_state(self) -> GameState {
        self.state
    }

    pub fn oracle(&self) -> &O {
        &self.oracle
    }

    /// Gate for human input: playing, the actor's turn, nothing done yet.
    fn check_human_turn(&self, actor: &str) -> Result<(), GameError> {
        if self.state.phase != GamePhase::Playing {
            return Err(GameError::WrongPhase);
        }
        let player = self
            .state
            .player(actor)
            .ok_or_else(|| GameError::UnknownPlayer(actor.to_string()))?;
        if self.state.current_player_id.as_deref() != Some(actor) || player.is_ai {
            return Err(GameError::NotYourTurn);
        }
        if self.state.has_acted_this_turn {
            return Err(GameError::AlreadyActed);
        }
        Ok(())
    }

    fn apply(&mut self, f: impl FnOnce(GameState) -> GameState) {
        let state = std::mem::replace(&mut self.state, placeholder_state());
        self.state = f(state);
    }

    pub fn fire_shot(&mut self, actor: &str, target: Option<&str>, c: Coord) -> Result<(), GameError> {
        self.check_human_turn(actor)?;
        let before = self.state.log.len();
        self.apply(|s| process_shot(s, target, c));
        if self.state.log.len() == before {
            return Err(GameError::ShotRejected);
        }
        Ok(())
    }

    pub fn use_skill(&mut self, actor: &str, action: SkillAction) -> Result<(), GameError> {
        self.check_human_turn(actor)?;
        let state = std::mem::replace(&mut self.state, placeholder_state());
        let outcome = use_skill(state, action, false);
        self.state = outcome.state;
        match outcome.rejected {
            None => Ok(()),
            Some(err) => Err(GameError::Skill(err)),
        }
    }

    pub fn select_action(&mut self, action: ActiveAction) {
        self.apply(|s| select_action(s, action));
    }

    pub fn end_turn(&mut self, actor: &str) -> Result<(), GameError> {
        if self.state.phase != GamePhase::Playing {
            return Err(GameError::WrongPhase);
        }
        if self.state.current_player_id.as_deref() != Some(actor) {
            return Err(GameError::NotYourTurn);
        }
        if !self.state.has_acted_this_turn {
            return Err(GameError::NoActionTaken);
        }
        self.apply(advance_turn);
        Ok(())
    }

    pub fn ready(&mut self, player: Player) -> Result<(), GameError> {
        let next = ready_player(self.state.clone(), player)?;
        self.state = next;
        Ok(())
    }

    pub fn confirm_transition(&mut self) {
        self.apply(confirm_transition);
    }

    pub fn clear_radar_scan(&mut self) {
        self.apply(clear_radar_scan);
    }

    fn apply_ai_action(&mut self, actor: &str, action: &AiAction) {
        match action {
            AiAction::Attack { target, coord } => {
                let before = self.state.log.len();
                self.apply(|s| process_shot(s, target.as_deref(), *coord));
                if self.state.log.len() == before {
                    log::warn!("{}'s attack at {} was rejected, falling back", actor, coord);
                    self.fallback(actor);
                }
            }
            AiAction::Skill(skill) => {
                let state = std::mem::replace(&mut self.state, placeholder_state());
                let outcome = use_skill(state, skill.clone(), true);
                self.state = outcome.state;
                if let Some(err) = outcome.rejected {
                    log::debug!("{}'s skill rejected ({}), attacking instead", actor, err);
                    self.fallback(actor);
                }
            }
        }
    }

    fn fallback(&mut self, actor: &str) {
        if let Some((target, coord)) = fallback_attack(&self.state, actor, &mut self.rng) {
            self.apply(|s| process_shot(s, target.as_deref(), coord));
        }
    }

    /// Play one AI turn: pause, consult the oracle, apply the move, pause,
    /// then end the turn.
    pub async fn play_ai_turn(&mut self) -> anyhow::Result<AiTurn> {
        let Some(actor) = self.state.current_player().filter(|p| p.is_ai && !p.is_eliminated) else {
            return Ok(AiTurn::Idle);
        };
        if self.state.phase != GamePhase::Playing || self.state.has_acted_this_turn {
            return Ok(AiTurn::Idle);
        }
        let actor = actor.id.clone();
        let turn = self.state.turn;

        if !self.config.ai_action_delay.is_zero() {
            tokio::time::sleep(self.config.ai_action_delay).await;
        }
        // `&mut self` is held across the await: nothing else can touch the
        // state, so the reply always answers the current decision point.
        let decision = request_move(
            &mut self.oracle,
            &self.state,
            &actor,
            &mut self.rng,
            self.config.oracle_timeout,
        )
        .await;

        let Some(action) = decision else {
            log::warn!("{} has no legal move, passing", actor);
            self.apply(advance_turn);
            return Ok(AiTurn::Passed);
        };
        self.apply_ai_action(&actor, &action);

        if self.state.phase == GamePhase::Playing {
            if !self.state.has_acted_this_turn {
                log::warn!("{} could not act on turn {}, passing", actor, turn);
            }
            if !self.config.ai_end_turn_delay.is_zero() {
                tokio::time::sleep(self.config.ai_end_turn_delay).await;
            }
            self.apply(advance_turn);
        }
        Ok(AiTurn::Acted(action))
    }

    /// Drive an all-AI match until it ends or `max_turns` is reached.
    pub async fn run_until_over(&mut self, max_turns: u32) -> anyhow::Result<&GameState> {
        while !self.state.is_over() && self.state.turn <= max_turns {
            match self.state.phase {
                GamePhase::TurnTransition => self.confirm_transition(),
                GamePhase::Playing => {
                    if self.play_ai_turn().await? == AiTurn::Idle {
                        anyhow::bail!("Turn {} needs human input", self.state.turn);
                    }
                }
                phase => anyhow::bail!("Cannot auto-play in phase {:?}", phase),
            }
        }
        Ok(&self.state)
    }
}

/// Throwaway value swapped in while a transition owns the real state.
fn placeholder_state() -> GameState {
    use crate::core::{GameMode, SkillRules, STANDARD_GRID};
    GameState {
        game_id: String::new(),
        phase: GamePhase::Lobby,
        players: Vec::new(),
        current_player_id: None,
        winner: None,
        turn: 0,
        grid_dimensions: STANDARD_GRID,
        ships_config: Vec::new(),
        game_mode: GameMode::Classic,
        log: Default::default(),
        setup_player_index: None,
        has_acted_this_turn: false,
        battlefield_grid: None,
        battlefield_ships: Vec::new(),
        is_final_round: false,
        active_action: None,
        radar_scan_result: None,
        jammed_area: None,
        hit_log: Default::default(),
        rules: SkillRules::default(),
    }
}
