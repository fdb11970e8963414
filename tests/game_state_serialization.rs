use armada::core::{
    advance_turn, hunt_target, process_shot, use_skill, Coord, GameMode, GameState, SkillAction,
};
use proptest::prelude::*;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

mod common;

/// Play a handful of random moves so the snapshot carries real history.
fn played(mode: GameMode, seed: u64) -> GameState {
    let mut rng = SmallRng::seed_from_u64(seed);
    let mut state = common::ai_match(mode, 2, seed);
    for _ in 0..rng.random_range(0..30) {
        let actor = state.current_player_id.clone().unwrap();
        let target = match mode {
            GameMode::ScoreAttack => None,
            _ => state.opponents_of(&actor).next().map(|p| p.id.clone()),
        };
        if mode == GameMode::Tactical && rng.random_bool(0.2) {
            let c = Coord::new(rng.random_range(0..12), rng.random_range(0..12));
            state = use_skill(state, SkillAction::RadarScan { target: c }, true).state;
        }
        if !state.has_acted_this_turn {
            let key = target.clone().unwrap_or_else(|| armada::core::BATTLEFIELD_KEY.to_string());
            let knowledge = state.player(&actor).unwrap().shots[&key].clone();
            if let Some(c) = hunt_target(&knowledge, &mut rng) {
                state = process_shot(state, target.as_deref(), c);
            }
        }
        if state.is_over() {
            break;
        }
        state = advance_turn(state);
    }
    state
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn game_state_bincode_roundtrip(seed in any::<u64>(), mode in 0u8..3) {
        let mode = match mode {
            0 => GameMode::Classic,
            1 => GameMode::ScoreAttack,
            _ => GameMode::Tactical,
        };
        let state = played(mode, seed);
        let bytes = bincode::serialize(&state).unwrap();
        let decoded: GameState = bincode::deserialize(&bytes).unwrap();
        prop_assert_eq!(decoded, state);
    }
}

#[test]
fn game_state_json_uses_wire_names() {
    let state = common::ai_match(GameMode::Tactical, 2, 70);
    let value = serde_json::to_value(&state).unwrap();
    assert_eq!(value["phase"], "PLAYING");
    assert_eq!(value["players"][0]["shots"]["player-2"]["cells"][0], "EMPTY");
    let back: GameState = serde_json::from_value(value).unwrap();
    assert_eq!(back, state);
}
