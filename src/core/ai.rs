//! Local hunt/target heuristic. Used directly by the built-in oracle and as
//! the fallback whenever an external suggestion cannot be used.

use rand::seq::IndexedRandom;
use rand::Rng;

use super::common::{CellState, Coord, PlayerId};
use super::config::{GameMode, BATTLEFIELD_KEY};
use super::game::GameState;
use super::grid::Grid;

/// Unresolved cells orthogonally adjacent to a confirmed, unsunk hit.
pub fn target_cells(knowledge: &Grid) -> Vec<Coord> {
    let mut out = Vec::new();
    for (c, state) in knowledge.iter() {
        if state != CellState::Hit {
            continue;
        }
        for n in knowledge.neighbours(c) {
            if knowledge.get(n).is_some_and(CellState::is_unresolved) && !out.contains(&n) {
                out.push(n);
            }
        }
    }
    out
}

/// Pick a legal cell on `knowledge`.
///
/// Finishes off pending hits first, then chases radar contacts, then sweeps
/// a checkerboard, then takes any unresolved cell. `None` only when the whole
/// grid is resolved.
pub fn hunt_target<R: Rng + ?Sized>(knowledge: &Grid, rng: &mut R) -> Option<Coord> {
    let pending = target_cells(knowledge);
    if let Some(c) = pending.choose(rng) {
        return Some(*c);
    }
    let contacts: Vec<Coord> = knowledge
        .iter()
        .filter(|(_, s)| *s == CellState::RadarContact)
        .map(|(c, _)| c)
        .collect();
    if let Some(c) = contacts.choose(rng) {
        return Some(*c);
    }
    let open: Vec<Coord> = knowledge
        .iter()
        .filter(|(_, s)| s.is_unresolved())
        .map(|(c, _)| c)
        .collect();
    let parity: Vec<Coord> = open
        .iter()
        .copied()
        .filter(|c| (c.x + c.y) % 2 == 0)
        .collect();
    parity.choose(rng).or_else(|| open.choose(rng)).copied()
}

/// Uniformly random unresolved cell.
pub fn random_unresolved<R: Rng + ?Sized>(knowledge: &Grid, rng: &mut R) -> Option<Coord> {
    let open: Vec<Coord> = knowledge
        .iter()
        .filter(|(_, s)| s.is_unresolved())
        .map(|(c, _)| c)
        .collect();
    open.choose(rng).copied()
}

/// Target for an AI attack: a random surviving opponent in Classic, the only
/// opponent in Tactical, the shared battlefield (`None`) in Score-Attack.
pub fn pick_target<R: Rng + ?Sized>(
    state: &GameState,
    actor: &str,
    rng: &mut R,
) -> Option<Option<PlayerId>> {
    match state.game_mode {
        GameMode::ScoreAttack => Some(None),
        GameMode::Classic | GameMode::Tactical => {
            let opponents: Vec<&PlayerId> = state.opponents_of(actor).map(|p| &p.id).collect();
            opponents.choose(rng).map(|id| Some((*id).clone()))
        }
    }
}

/// The knowledge grid `actor` holds for `target`, or an empty one.
pub fn knowledge_of(state: &GameState, actor: &str, target: Option<&str>) -> Grid {
    let key = target.unwrap_or(BATTLEFIELD_KEY);
    state
        .player(actor)
        .and_then(|p| p.shots.get(key))
        .cloned()
        .unwrap_or_else(|| Grid::new(state.grid_dimensions))
}

/// Always-available attack for `actor`: target chosen by [`pick_target`],
/// cell by [`hunt_target`].
pub fn fallback_attack<R: Rng + ?Sized>(
    state: &GameState,
    actor: &str,
    rng: &mut R,
) -> Option<(Option<PlayerId>, Coord)> {
    let target = pick_target(state, actor, rng)?;
    let knowledge = knowledge_of(state, actor, target.as_deref());
    let cell = hunt_target(&knowledge, rng)?;
    Some((target, cell))
}
