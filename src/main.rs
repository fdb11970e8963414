use armada::core::{GameMode, GameState, LobbyConfig, LobbySeat};
use armada::{init_logging, new_match, LocalOracle, MatchSession, MoveOracle, SessionConfig, TcpOracle};

use clap::{Parser, ValueEnum};
use rand::rngs::SmallRng;
use rand::SeedableRng;
use tokio::net::TcpListener;
use tokio::time::Duration;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum ModeArg {
    Classic,
    ScoreAttack,
    Tactical,
}

impl From<ModeArg> for GameMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Classic => GameMode::Classic,
            ModeArg::ScoreAttack => GameMode::ScoreAttack,
            ModeArg::Tactical => GameMode::Tactical,
        }
    }
}

#[derive(Parser)]
enum Commands {
    /// Watch AI admirals play a match on the local machine.
    Play {
        #[arg(long, value_enum, default_value_t = ModeArg::Classic)]
        mode: ModeArg,
        #[arg(long, default_value_t = 2, help = "Number of AI players (2-4; Tactical needs 2)")]
        players: usize,
        #[arg(long, help = "Fix RNG seed for reproducible games (e.g., --seed 12345)")]
        seed: Option<u64>,
        #[arg(long, help = "Ask a suggestion service at this address instead of the local heuristic")]
        oracle: Option<String>,
        #[arg(long, default_value_t = 0, help = "Pause before each AI move, in milliseconds")]
        think_ms: u64,
        #[arg(long, default_value_t = 0, help = "Pause before each AI ends its turn, in milliseconds")]
        end_ms: u64,
        #[arg(long, default_value_t = 10_000, help = "Oracle timeout, in milliseconds")]
        oracle_timeout_ms: u64,
        #[arg(long, default_value_t = 1_000)]
        max_turns: u32,
    },
    /// Answer oracle requests over TCP with the local heuristic.
    ServeOracle {
        #[arg(long, default_value = "127.0.0.1:9090")]
        bind: String,
        #[arg(long, help = "Fix RNG seed for reproducible suggestions")]
        seed: Option<u64>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();
    let cli = Cli::parse();

    match cli.command {
        Commands::Play {
            mode,
            players,
            seed,
            oracle,
            think_ms,
            end_ms,
            oracle_timeout_ms,
            max_turns,
        } => {
            if let Some(s) = seed {
                println!("Using fixed seed: {} (game will be reproducible)", s);
            }
            let mut rng = match seed {
                Some(s) => SmallRng::seed_from_u64(s),
                None => SmallRng::from_rng(&mut rand::rng()),
            };
            let seats = (1..=players)
                .map(|i| LobbySeat::ai(&format!("Admiral {}", i)))
                .collect();
            let lobby = LobbyConfig::new("local", seats, mode.into());
            let state = new_match(&lobby, &mut rng).map_err(|e| anyhow::anyhow!(e))?;
            let config = SessionConfig {
                ai_action_delay: Duration::from_millis(think_ms),
                ai_end_turn_delay: Duration::from_millis(end_ms),
                oracle_timeout: Duration::from_millis(oracle_timeout_ms),
            };
            let session_seed = seed.map(|s| s.wrapping_add(1));

            let finished = match oracle {
                Some(addr) => {
                    println!("Connecting to oracle at {}...", addr);
                    let tcp = TcpOracle::connect(&addr).await?;
                    run_match(state, tcp, config, session_seed, max_turns).await?
                }
                None => {
                    let local = match seed {
                        Some(s) => LocalOracle::seeded(s.wrapping_add(2)),
                        None => LocalOracle::new(),
                    };
                    run_match(state, local, config, session_seed, max_turns).await?
                }
            };
            print_summary(&finished);
        }
        Commands::ServeOracle { bind, seed } => {
            let listener = TcpListener::bind(&bind).await?;
            println!("Oracle listening on {}", listener.local_addr()?);
            armada::oracle::serve_oracle(listener, seed).await?;
        }
    }
    Ok(())
}

async fn run_match<O: MoveOracle>(
    state: GameState,
    oracle: O,
    config: SessionConfig,
    seed: Option<u64>,
    max_turns: u32,
) -> anyhow::Result<GameState> {
    let mut session = match seed {
        Some(s) => MatchSession::with_seed(state, oracle, config, s),
        None => MatchSession::new(state, oracle, config),
    };
    session.run_until_over(max_turns).await?;
    Ok(session.into_state())
}

fn print_summary(state: &GameState) {
    for entry in state.log.iter().rev() {
        match &entry.message {
            Some(message) => println!("[turn {:>3}] {}", entry.turn, message),
            None => println!("[turn {:>3}] {}: {:?}", entry.turn, entry.player_name, entry.result),
        }
    }
    println!();
    match state.winner.as_deref().and_then(|id| state.player(id)) {
        Some(p) => println!("Winner: {} after {} turns", p.name, state.turn),
        None => println!("No winner after {} turns", state.turn),
    }
    if state.game_mode == GameMode::ScoreAttack {
        for p in &state.players {
            println!("  {:<20} {:>3}", p.name, p.score);
        }
    }
}
