#![allow(dead_code)]

use armada::core::{
    new_match, place_ship, Coord, GameMode, GameState, Grid, LobbyConfig, LobbySeat, Orientation,
    SkillRules,
};
use rand::rngs::SmallRng;
use rand::SeedableRng;

/// All-AI match already in `Playing`, player-1 to move on turn 1.
pub fn ai_match(mode: GameMode, players: usize, seed: u64) -> GameState {
    ai_match_with_rules(mode, players, seed, SkillRules::default())
}

pub fn ai_match_with_rules(mode: GameMode, players: usize, seed: u64, rules: SkillRules) -> GameState {
    let seats = (1..=players)
        .map(|i| LobbySeat::ai(&format!("Bot {}", i)))
        .collect();
    let lobby = LobbyConfig::new("test", seats, mode).with_rules(rules);
    let mut rng = SmallRng::seed_from_u64(seed);
    new_match(&lobby, &mut rng).unwrap()
}

/// Re-lay player `index`'s fleet deterministically: ship `i` horizontal at
/// column 0 of row `i`.
pub fn stack_fleet(state: &mut GameState, index: usize) {
    let dims = state.grid_dimensions;
    let player = &mut state.players[index];
    let mut grid = Grid::new(dims);
    let mut ships = Vec::new();
    for (row, ship) in player.ships.iter().enumerate() {
        let (g, s) = place_ship(&grid, ship, Coord::new(0, row), Orientation::Horizontal);
        grid = g;
        ships.push(s);
    }
    player.grid = grid;
    player.ships = ships;
}

/// Id of the player at `index`.
pub fn id(state: &GameState, index: usize) -> String {
    state.players[index].id.clone()
}

/// Make player `index` the one to move.
pub fn give_turn(state: &mut GameState, index: usize) {
    state.current_player_id = Some(state.players[index].id.clone());
    state.has_acted_this_turn = false;
}
