use armada::core::{
    new_match, place_all_ships_randomly, Coord, GameError, GameMode, GamePhase, LobbyConfig,
    LobbySeat, LogResult, SkillAction,
};
use armada::oracle::{AiAction, LocalOracle, ScriptedOracle};
use armada::{AiTurn, MatchSession, SessionConfig};
use rand::rngs::SmallRng;
use rand::SeedableRng;

mod common;
use common::{ai_match, id};

const MAX_TURNS: u32 = 5_000;

async fn play_out(mode: GameMode, players: usize, seed: u64) -> armada::GameState {
    let state = ai_match(mode, players, seed);
    let mut session = MatchSession::with_seed(
        state,
        LocalOracle::seeded(seed + 1),
        SessionConfig::instant(),
        seed + 2,
    );
    session.run_until_over(MAX_TURNS).await.unwrap();
    session.into_state()
}

#[tokio::test]
async fn classic_duel_runs_to_completion() {
    let state = play_out(GameMode::Classic, 2, 60).await;
    assert_eq!(state.phase, GamePhase::GameOver);
    let winner = state.winner.clone().unwrap();
    let loser = state.players.iter().find(|p| p.id != winner).unwrap();
    assert!(loser.is_eliminated);
    assert!(loser.all_ships_sunk());
}

#[tokio::test]
async fn classic_free_for_all_runs_to_completion() {
    let state = play_out(GameMode::Classic, 4, 61).await;
    assert_eq!(state.phase, GamePhase::GameOver);
    assert_eq!(state.players.iter().filter(|p| !p.is_eliminated).count(), 1);
}

#[tokio::test]
async fn score_attack_runs_to_completion() {
    let state = play_out(GameMode::ScoreAttack, 3, 62).await;
    assert_eq!(state.phase, GamePhase::GameOver);
    assert!(state.battlefield_ships.iter().all(|s| s.is_sunk));
    let total: usize = state.battlefield_ships.iter().map(|s| s.length).sum();
    let scored: u32 = state.players.iter().map(|p| p.score).sum();
    assert_eq!(scored as usize, total);
    let best = state.players.iter().map(|p| p.score).max().unwrap();
    let winner = state.player(state.winner.as_deref().unwrap()).unwrap();
    assert_eq!(winner.score, best);
}

#[tokio::test]
async fn tactical_runs_to_completion() {
    let state = play_out(GameMode::Tactical, 2, 63).await;
    assert_eq!(state.phase, GamePhase::GameOver);
    let winner = state.winner.clone().unwrap();
    let loser = state.players.iter().find(|p| p.id != winner).unwrap();
    assert!(loser.ship(armada::core::ShipType::Mothership).unwrap().is_sunk);
}

fn human_vs_ai() -> armada::GameState {
    let lobby = LobbyConfig::new(
        "solo",
        vec![LobbySeat::human("Ann"), LobbySeat::ai("Bot")],
        GameMode::Classic,
    );
    let mut rng = SmallRng::seed_from_u64(64);
    new_match(&lobby, &mut rng).unwrap()
}

#[tokio::test]
async fn human_turn_is_gated() {
    let state = human_vs_ai();
    let mut session = MatchSession::with_seed(state, LocalOracle::seeded(1), SessionConfig::instant(), 2);
    let ann = id(session.state(), 0);
    let bot = id(session.state(), 1);

    assert_eq!(
        session.fire_shot(&ann, Some(&bot), Coord::new(0, 0)),
        Err(GameError::WrongPhase)
    );
    let mut fleet = session.state().players[0].clone();
    let mut rng = SmallRng::seed_from_u64(3);
    let (grid, ships) = place_all_ships_randomly(
        &session.state().ships_config,
        session.state().grid_dimensions,
        &mut rng,
    )
    .unwrap();
    fleet.grid = grid;
    fleet.ships = ships;
    session.ready(fleet).unwrap();
    assert_eq!(session.state().phase, GamePhase::Playing);

    assert_eq!(session.end_turn(&ann), Err(GameError::NoActionTaken));
    assert_eq!(
        session.fire_shot(&bot, Some(&ann), Coord::new(0, 0)),
        Err(GameError::NotYourTurn)
    );
    session.fire_shot(&ann, Some(&bot), Coord::new(0, 0)).unwrap();
    assert_eq!(
        session.fire_shot(&ann, Some(&bot), Coord::new(1, 0)),
        Err(GameError::AlreadyActed)
    );
    session.end_turn(&ann).unwrap();
    assert_eq!(session.state().current_player_id.as_deref(), Some(bot.as_str()));

    assert!(matches!(session.play_ai_turn().await.unwrap(), AiTurn::Acted(_)));
    assert_eq!(session.state().current_player_id.as_deref(), Some(ann.as_str()));
    assert_eq!(session.state().turn, 3);

    assert_eq!(
        session.fire_shot(&ann, Some(&bot), Coord::new(0, 0)),
        Err(GameError::ShotRejected)
    );
    // Skills are Tactical only.
    assert_eq!(
        session.use_skill(&ann, SkillAction::RadarScan { target: Coord::new(4, 4) }),
        Err(GameError::Skill(armada::SkillError::NotTactical))
    );
    // Nothing to do for the AI while the human is up.
    assert_eq!(session.play_ai_turn().await.unwrap(), AiTurn::Idle);
    assert!(session.run_until_over(10).await.is_err());
}

#[tokio::test]
async fn rejected_ai_skill_falls_back_to_an_attack() {
    let state = ai_match(GameMode::Tactical, 2, 65);
    let oracle = ScriptedOracle::texts([r#"{"action":"SKILL","shipType":"Mothership"}"#]);
    let mut session = MatchSession::with_seed(state, oracle, SessionConfig::instant(), 4);

    let turn = session.play_ai_turn().await.unwrap();
    assert!(matches!(
        turn,
        AiTurn::Acted(AiAction::Skill(SkillAction::Escape { .. }))
    ));
    let state = session.state();
    assert_eq!(state.turn, 2);
    assert!(matches!(
        state.log[0].result,
        LogResult::Hit | LogResult::Miss | LogResult::SunkShip
    ));
    assert_eq!(state.log.len(), 1);
}
