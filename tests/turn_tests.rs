use armada::core::{
    advance_turn, confirm_transition, new_match, place_all_ships_randomly, place_ship,
    process_shot, ready_player, use_skill, CellState, Coord, GameError, GameMode, GamePhase,
    GameState, Grid, LobbyConfig, LobbySeat, Orientation, ShipType, SkillAction,
};
use proptest::prelude::*;
use rand::rngs::SmallRng;
use rand::SeedableRng;

mod common;
use common::{ai_match, give_turn, id, stack_fleet};

fn place_fleet(state: &GameState, index: usize, seed: u64) -> armada::core::Player {
    let mut rng = SmallRng::seed_from_u64(seed);
    let (grid, ships) =
        place_all_ships_randomly(&state.ships_config, state.grid_dimensions, &mut rng).unwrap();
    let mut player = state.players[index].clone();
    player.grid = grid;
    player.ships = ships;
    player
}

#[test]
fn advance_rotates_and_resets_the_turn() {
    let mut state = ai_match(GameMode::Classic, 2, 30);
    let target = id(&state, 1);
    state = process_shot(state, Some(&target), Coord::new(3, 3));
    assert!(state.has_acted_this_turn);

    let state = advance_turn(state);
    assert_eq!(state.current_player_id, Some(target));
    assert_eq!(state.turn, 2);
    assert!(!state.has_acted_this_turn);
    assert_eq!(state.phase, GamePhase::Playing);

    let state = advance_turn(state);
    assert_eq!(state.current_player_id, Some(id(&state, 0)));
    assert_eq!(state.turn, 3);
}

#[test]
fn eliminated_players_are_skipped() {
    let mut state = ai_match(GameMode::Classic, 4, 31);
    state.players[1].is_eliminated = true;
    state.players[2].is_eliminated = true;
    let state = advance_turn(state);
    assert_eq!(state.current_player_id, Some(id(&state, 3)));
    let state = advance_turn(state);
    assert_eq!(state.current_player_id, Some(id(&state, 0)));
}

#[test]
fn game_over_is_terminal() {
    let mut state = ai_match(GameMode::Classic, 2, 32);
    state.phase = GamePhase::GameOver;
    assert_eq!(advance_turn(state.clone()), state);
}

#[test]
fn cooldowns_tick_on_the_owners_turn() {
    let mut state = ai_match(GameMode::Tactical, 2, 33);
    stack_fleet(&mut state, 0);
    stack_fleet(&mut state, 1);
    let outcome = use_skill(state, SkillAction::RadarScan { target: Coord::new(6, 6) }, true);
    let state = outcome.state;
    assert_eq!(state.players[0].cooldown(ShipType::Radarship), 3);
    assert!(state.radar_scan_result.is_some());

    let state = advance_turn(state);
    assert_eq!(state.players[0].cooldown(ShipType::Radarship), 3);
    assert!(state.radar_scan_result.is_none());
    let state = advance_turn(state);
    assert_eq!(state.players[0].cooldown(ShipType::Radarship), 2);
    let state = advance_turn(advance_turn(state));
    assert_eq!(state.players[0].cooldown(ShipType::Radarship), 1);
    let state = advance_turn(advance_turn(state));
    assert_eq!(state.players[0].cooldown(ShipType::Radarship), 0);
}

#[test]
fn jam_lasts_two_of_the_victims_turns() {
    let mut state = ai_match(GameMode::Tactical, 2, 34);
    stack_fleet(&mut state, 0);
    stack_fleet(&mut state, 1);
    let state = use_skill(state, SkillAction::Jam { center: Coord::new(1, 1) }, true).state;
    assert!(state.jammed_area.is_some());

    let state = advance_turn(state);
    assert!(state.jammed_area.is_none());
    assert_eq!(state.players[1].jam_turns_remaining, 2);
    let state = advance_turn(state);
    assert_eq!(state.players[1].jam_turns_remaining, 1);
    assert!(!state.players[1].jammed_positions.is_empty());
    let state = advance_turn(advance_turn(state));
    assert_eq!(state.players[1].jam_turns_remaining, 0);
    assert!(state.players[1].jammed_positions.is_empty());
}

#[test]
fn score_attack_ends_when_the_final_round_wraps() {
    let mut state = ai_match(GameMode::ScoreAttack, 3, 35);
    give_turn(&mut state, 1);
    let cells: Vec<Coord> = state
        .battlefield_ships
        .iter()
        .flat_map(|s| s.positions.clone())
        .collect();
    for c in cells {
        state = process_shot(state, None, c);
    }
    assert!(state.is_final_round);

    let state = advance_turn(state);
    assert_eq!(state.phase, GamePhase::Playing);
    assert_eq!(state.current_player_id, Some(id(&state, 2)));
    let state = advance_turn(state);
    assert_eq!(state.phase, GamePhase::GameOver);
    assert_eq!(state.winner, Some(id(&state, 1)));
}

#[test]
fn score_attack_tie_goes_to_the_earliest_seat() {
    let mut state = ai_match(GameMode::ScoreAttack, 2, 36);
    state.is_final_round = true;
    state.players[0].score = 4;
    state.players[1].score = 4;
    give_turn(&mut state, 1);
    let state = advance_turn(state);
    assert_eq!(state.phase, GamePhase::GameOver);
    assert_eq!(state.winner, Some(id(&state, 0)));
}

#[test]
fn two_humans_hand_over_the_device() {
    let lobby = LobbyConfig::new(
        "hotseat",
        vec![LobbySeat::human("Ann"), LobbySeat::ai("Bot"), LobbySeat::human("Bo")],
        GameMode::Classic,
    );
    let mut rng = SmallRng::seed_from_u64(37);
    let state = new_match(&lobby, &mut rng).unwrap();
    assert_eq!(state.phase, GamePhase::Setup);
    assert_eq!(state.setup_player_index, Some(0));
    assert!(state.players[1].is_ready);
    assert_eq!(state.players[1].name, "Bot (AI)");

    let unplaced = state.players[0].clone();
    assert_eq!(ready_player(state.clone(), unplaced).unwrap_err(), GameError::InvalidFleet);
    let wrong_seat = place_fleet(&state, 2, 1);
    assert_eq!(ready_player(state.clone(), wrong_seat).unwrap_err(), GameError::NotYourTurn);

    let first = place_fleet(&state, 0, 2);
    let state = ready_player(state, first).unwrap();
    assert_eq!(state.phase, GamePhase::TurnTransition);
    let state = confirm_transition(state);
    assert_eq!(state.phase, GamePhase::Setup);
    assert_eq!(state.setup_player_index, Some(2));

    let third = place_fleet(&state, 2, 3);
    let state = ready_player(state, third).unwrap();
    assert_eq!(state.phase, GamePhase::TurnTransition);
    assert_eq!(state.current_player_id, Some(id(&state, 0)));
    let state = confirm_transition(state);
    assert_eq!(state.phase, GamePhase::Playing);
    assert_eq!(state.players[0].shots.len(), 2);

    // Ann -> Bot needs no gate, Bot -> Bo does.
    let state = advance_turn(state);
    assert_eq!(state.phase, GamePhase::Playing);
    let state = advance_turn(state);
    assert_eq!(state.phase, GamePhase::TurnTransition);
    assert_eq!(state.current_player_id, Some(id(&state, 2)));
}

fn human_setup() -> GameState {
    let lobby = LobbyConfig::new(
        "setup",
        vec![LobbySeat::human("Ann"), LobbySeat::ai("Bot")],
        GameMode::Classic,
    );
    let mut rng = SmallRng::seed_from_u64(39);
    new_match(&lobby, &mut rng).unwrap()
}

/// Ann's fleet laid out one ship per row, bow at column 0.
fn stacked_submission(state: &GameState) -> armada::core::Player {
    let mut player = state.players[0].clone();
    let mut grid = Grid::new(state.grid_dimensions);
    let mut ships = Vec::new();
    for (row, ship) in player.ships.iter().enumerate() {
        let (g, s) = place_ship(&grid, ship, Coord::new(0, row), Orientation::Horizontal);
        grid = g;
        ships.push(s);
    }
    player.grid = grid;
    player.ships = ships;
    player
}

#[test]
fn stacked_fleet_is_accepted() {
    let state = human_setup();
    let fleet = stacked_submission(&state);
    let state = ready_player(state, fleet).unwrap();
    assert_eq!(state.phase, GamePhase::Playing);
}

#[test]
fn shrunken_ships_are_refused() {
    let state = human_setup();
    let mut fleet = stacked_submission(&state);
    fleet.grid = Grid::new(state.grid_dimensions);
    for (i, ship) in fleet.ships.iter_mut().enumerate() {
        ship.length = 1;
        ship.positions = vec![Coord::new(i, i)];
        fleet.grid.set(Coord::new(i, i), CellState::Ship);
    }
    assert_eq!(ready_player(state, fleet).unwrap_err(), GameError::InvalidFleet);
}

#[test]
fn broken_hulls_are_refused() {
    let state = human_setup();
    let mut fleet = stacked_submission(&state);
    // Carrier (length 5) with a gap at column 4.
    fleet.grid.set(Coord::new(4, 0), CellState::Empty);
    fleet.grid.set(Coord::new(5, 0), CellState::Ship);
    fleet.ships[0].positions[4] = Coord::new(5, 0);
    assert_eq!(ready_player(state, fleet).unwrap_err(), GameError::InvalidFleet);
}

#[test]
fn duplicate_ship_names_are_refused() {
    let state = human_setup();
    let mut fleet = stacked_submission(&state);
    // Cruiser and Submarine share a length; only the name differs.
    assert_eq!(fleet.ships[2].length, fleet.ships[3].length);
    fleet.ships[3].name = fleet.ships[2].name.clone();
    assert_eq!(ready_player(state, fleet).unwrap_err(), GameError::InvalidFleet);
}

#[test]
fn ownerless_ship_cells_are_refused() {
    let state = human_setup();
    let mut fleet = stacked_submission(&state);
    fleet.grid.set(Coord::new(11, 11), CellState::Ship);
    assert_eq!(ready_player(state, fleet).unwrap_err(), GameError::InvalidFleet);
}

#[test]
fn retyped_ships_are_refused() {
    let state = human_setup();
    let mut fleet = stacked_submission(&state);
    fleet.ships[0].ship_type = ShipType::Mothership;
    assert_eq!(ready_player(state, fleet).unwrap_err(), GameError::InvalidFleet);
}

#[test]
fn lobby_limits() {
    let mut rng = SmallRng::seed_from_u64(38);
    let one = LobbyConfig::new("x", vec![LobbySeat::ai("A")], GameMode::Classic);
    assert_eq!(new_match(&one, &mut rng).unwrap_err(), GameError::InvalidPlayerCount(1));
    let three = LobbyConfig::new(
        "x",
        vec![LobbySeat::ai("A"), LobbySeat::ai("B"), LobbySeat::ai("C")],
        GameMode::Tactical,
    );
    assert_eq!(
        new_match(&three, &mut rng).unwrap_err(),
        GameError::TacticalNeedsTwoPlayers(3)
    );
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn cooldowns_tick_once_for_the_incoming_player_only(
        seed in any::<u64>(),
        start in proptest::collection::vec(0u32..6, 8),
        steps in 1usize..40,
    ) {
        let mut state = ai_match(GameMode::Tactical, 2, seed);
        for (i, p) in state.players.iter_mut().enumerate() {
            for (j, cd) in p.skill_cooldowns.values_mut().enumerate() {
                *cd = start[(i * 4 + j) % start.len()];
            }
        }
        for _ in 0..steps {
            let before: Vec<_> = state.players.iter().map(|p| p.skill_cooldowns.clone()).collect();
            state = advance_turn(state);
            let incoming = state.current_index().unwrap();
            for (i, (p, old)) in state.players.iter().zip(before).enumerate() {
                prop_assert_eq!(p.skill_cooldowns.len(), old.len());
                for (ship, cd) in &p.skill_cooldowns {
                    let expected = if i == incoming {
                        old[ship].saturating_sub(1)
                    } else {
                        old[ship]
                    };
                    prop_assert_eq!(*cd, expected);
                }
            }
        }
    }
}
