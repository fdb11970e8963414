use std::time::Duration;

use armada::core::GameMode;
use armada::oracle::tcp::{read_frame, write_frame};
use armada::oracle::{build_request, parse_reply, request_move, serve_oracle, AiAction, MoveOracle, TcpOracle};
use rand::rngs::SmallRng;
use rand::SeedableRng;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpListener;

mod common;
use common::{ai_match, id};

async fn spawn_server(seed: u64) -> std::net::SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(serve_oracle(listener, Some(seed)));
    addr
}

#[tokio::test]
async fn frames_survive_a_pipe() {
    let (mut a, mut b) = tokio::io::duplex(1024);
    write_frame(&mut a, b"hello", 64).await.unwrap();
    assert_eq!(read_frame(&mut b, 64).await.unwrap(), b"hello");
}

#[tokio::test]
async fn oversized_and_empty_frames_are_rejected() {
    let (mut a, mut b) = tokio::io::duplex(1024);
    assert!(write_frame(&mut a, &[0u8; 65], 64).await.is_err());

    a.write_all(&1000u32.to_be_bytes()).await.unwrap();
    assert!(read_frame(&mut b, 64).await.is_err());

    let (mut a, mut b) = tokio::io::duplex(1024);
    a.write_all(&0u32.to_be_bytes()).await.unwrap();
    assert!(read_frame(&mut b, 64).await.is_err());
}

#[tokio::test]
async fn truncated_frame_reports_closed_connection() {
    let (mut a, mut b) = tokio::io::duplex(1024);
    a.write_all(&10u32.to_be_bytes()).await.unwrap();
    a.write_all(b"abc").await.unwrap();
    drop(a);
    let err = read_frame(&mut b, 64).await.unwrap_err();
    assert!(err.to_string().contains("closed"));
}

#[tokio::test]
async fn served_oracle_answers_over_tcp() {
    let addr = spawn_server(50).await;
    let mut oracle = TcpOracle::connect(addr).await.unwrap();

    let state = ai_match(GameMode::Classic, 2, 51);
    let actor = id(&state, 0);
    let target = id(&state, 1);
    let request = build_request(&state, &actor, Some(&target));
    // Same connection serves several requests in a row.
    for _ in 0..3 {
        let text = oracle.suggest(&request).await.unwrap();
        let raw = parse_reply(&text).unwrap();
        assert_eq!(raw.action, "ATTACK");
    }
}

#[tokio::test]
async fn tcp_oracle_drives_request_move() {
    let addr = spawn_server(52).await;
    let mut oracle = TcpOracle::connect(addr).await.unwrap();
    let state = ai_match(GameMode::Tactical, 2, 53);
    let actor = id(&state, 0);
    let mut rng = SmallRng::seed_from_u64(54);
    let action = request_move(&mut oracle, &state, &actor, &mut rng, Duration::from_secs(5)).await;
    assert!(matches!(action, Some(AiAction::Attack { .. }) | Some(AiAction::Skill(_))));
}

#[tokio::test]
async fn silent_server_times_out() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    // Accept and hold the connection without ever replying.
    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        tokio::time::sleep(Duration::from_secs(30)).await;
        drop(stream);
    });
    let stream = tokio::net::TcpStream::connect(addr).await.unwrap();
    let mut oracle = TcpOracle::with_timeout(stream, Duration::from_millis(100));
    let state = ai_match(GameMode::Classic, 2, 55);
    let actor = id(&state, 0);
    let target = id(&state, 1);
    let request = build_request(&state, &actor, Some(&target));
    let err = oracle.suggest(&request).await.unwrap_err();
    assert!(err.to_string().contains("timeout"));
}

/// Server answering the first request on connection `n` with `replies[n]`
/// after `delays[n]`.
async fn spawn_scripted_server(replies: Vec<(u64, &'static str)>) -> std::net::SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        for (delay, reply) in replies {
            let (mut stream, _) = listener.accept().await.unwrap();
            tokio::spawn(async move {
                if read_frame(&mut stream, 1 << 20).await.is_err() {
                    return;
                }
                tokio::time::sleep(Duration::from_millis(delay)).await;
                let _ = write_frame(&mut stream, reply.as_bytes(), 1 << 20).await;
                // Keep the socket open so a late reply stays readable.
                tokio::time::sleep(Duration::from_secs(2)).await;
            });
        }
    });
    addr
}

#[tokio::test]
async fn late_reply_is_never_read_as_the_next_answer() {
    let addr = spawn_scripted_server(vec![(300, "0,0"), (0, "5,5")]).await;
    let stream = tokio::net::TcpStream::connect(addr).await.unwrap();
    let mut oracle = TcpOracle::with_timeout(stream, Duration::from_millis(100));
    let state = ai_match(GameMode::Classic, 2, 56);
    let request = build_request(&state, &id(&state, 0), Some(&id(&state, 1)));

    assert!(oracle.suggest(&request).await.is_err());
    assert!(!oracle.is_connected());
    // Let the stale "0,0" reach the old socket.
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(oracle.suggest(&request).await.unwrap(), "5,5");
    assert!(oracle.is_connected());
}

#[tokio::test]
async fn cancelled_request_drops_the_connection() {
    let addr = spawn_scripted_server(vec![(300, "0,0"), (0, "5,5")]).await;
    let mut oracle = TcpOracle::connect(addr).await.unwrap();
    let state = ai_match(GameMode::Classic, 2, 57);
    let actor = id(&state, 0);
    let mut rng = SmallRng::seed_from_u64(58);

    // The caller's deadline fires before the oracle's own.
    let action = request_move(&mut oracle, &state, &actor, &mut rng, Duration::from_millis(100)).await;
    assert!(matches!(action, Some(AiAction::Attack { .. })));
    assert!(!oracle.is_connected());

    tokio::time::sleep(Duration::from_millis(300)).await;
    let request = build_request(&state, &actor, Some(&id(&state, 1)));
    assert_eq!(oracle.suggest(&request).await.unwrap(), "5,5");
}
