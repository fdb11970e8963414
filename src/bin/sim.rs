use armada::core::{GameMode, LobbyConfig, LobbySeat};
use armada::{new_match, LocalOracle, MatchSession, SessionConfig};
use rand::{rngs::SmallRng, SeedableRng};
use serde_json::json;

const MAX_TURNS: u32 = 2_000;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args: Vec<String> = std::env::args().collect();
    if args.len() < 3 || args.len() > 4 {
        eprintln!("Usage: {} <seed1> <seed2> [classic|score-attack|tactical]", args[0]);
        std::process::exit(1);
    }
    let seed1: u64 = args[1].parse()?;
    let seed2: u64 = args[2].parse()?;
    let mode = match args.get(3).map(String::as_str) {
        None | Some("classic") => GameMode::Classic,
        Some("score-attack") => GameMode::ScoreAttack,
        Some("tactical") => GameMode::Tactical,
        Some(other) => anyhow::bail!("unknown mode {:?}", other),
    };

    let mut rng = SmallRng::seed_from_u64(seed1);
    let lobby = LobbyConfig::new(
        "sim",
        vec![LobbySeat::ai("player1"), LobbySeat::ai("player2")],
        mode,
    );
    let state = new_match(&lobby, &mut rng)?;

    let mut session = MatchSession::with_seed(
        state,
        LocalOracle::seeded(seed2),
        SessionConfig::instant(),
        seed1 ^ seed2,
    );
    session.run_until_over(MAX_TURNS).await?;
    let state = session.into_state();

    let winner = state
        .winner
        .as_deref()
        .and_then(|id| state.player(id))
        .map(|p| p.name.clone());
    let players: Vec<_> = state
        .players
        .iter()
        .map(|p| {
            let shots = state.log.iter().filter(|e| e.player_id == p.id).count();
            json!({
                "name": p.name,
                "score": p.score,
                "eliminated": p.is_eliminated,
                "actions": shots,
            })
        })
        .collect();

    let result = json!({
        "mode": format!("{:?}", state.game_mode),
        "turns": state.turn,
        "players": players,
        "winner": winner,
    });

    println!("{}", serde_json::to_string(&result)?);
    Ok(())
}
