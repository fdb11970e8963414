use super::config::GameMode;
use super::game::{GamePhase, GameState};
use super::player::Player;

/// Hand the turn to the next player still in the match.
///
/// The outgoing player's jam countdown ticks first. Score-Attack ends here
/// once the final round wraps back to the first seat. Otherwise the next
/// non-eliminated player becomes current, their cooldowns tick down by one
/// and every per-turn overlay is cleared.
pub fn advance_turn(state: GameState) -> GameState {
    if state.phase == GamePhase::GameOver {
        log::warn!("advance_turn called after game over");
        return state;
    }
    let Some(current) = state.current_index() else {
        log::warn!("advance_turn called without a current player");
        return state;
    };
    let mut state = state;
    let count = state.players.len();

    let outgoing = &mut state.players[current];
    if outgoing.jam_turns_remaining > 0 {
        outgoing.jam_turns_remaining -= 1;
        if outgoing.jam_turns_remaining == 0 {
            outgoing.jammed_positions.clear();
        }
    }

    let mut next = (current + 1) % count;
    if state.game_mode == GameMode::ScoreAttack && state.is_final_round && next == 0 {
        return finish_score_attack(state);
    }

    while state.players[next].is_eliminated {
        next = (next + 1) % count;
        if next == current {
            log::warn!("no other player left to rotate to");
            break;
        }
    }

    let player = &mut state.players[next];
    for cooldown in player.skill_cooldowns.values_mut() {
        if *cooldown > 0 {
            *cooldown -= 1;
        }
    }
    let next_is_human = !player.is_ai;
    state.current_player_id = Some(player.id.clone());
    state.turn += 1;
    state.has_acted_this_turn = false;
    state.active_action = None;
    state.radar_scan_result = None;
    state.jammed_area = None;
    if next_is_human && state.human_count() > 1 {
        state.phase = GamePhase::TurnTransition;
    }
    log::debug!("turn {} begins for {:?}", state.turn, state.current_player_id);
    state
}

/// Highest score wins; on a tie the earliest seat takes it.
fn finish_score_attack(mut state: GameState) -> GameState {
    let winner = state
        .players
        .iter()
        .fold(None::<&Player>, |best, p| match best {
            Some(b) if b.score >= p.score => Some(b),
            _ => Some(p),
        })
        .map(|p| p.id.clone());
    state.winner = winner;
    state.phase = GamePhase::GameOver;
    state.active_action = None;
    log::info!("final round complete, winner {:?}", state.winner);
    state
}
