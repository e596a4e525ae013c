//! Headless seeded match between two automated players, one JSON result
//! line on stdout.

use serde_json::json;

use seabattle::transport::InMemoryTransport;
use seabattle::{AutoPlayer, Relay, Strategy};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args: Vec<String> = std::env::args().collect();
    if args.len() != 3 {
        eprintln!("Usage: {} <seed1> <seed2>", args[0]);
        std::process::exit(1);
    }
    let seed1: u64 = args[1].parse()?;
    let seed2: u64 = args[2].parse()?;

    let relay = Relay::spawn();
    let (t1, r1) = InMemoryTransport::pair();
    let (t2, r2) = InMemoryTransport::pair();
    relay.attach(Box::new(r1));
    relay.attach(Box::new(r2));

    let p1 = AutoPlayer::new(1, "sim-one", Strategy::Uniform, seed1);
    let p2 = AutoPlayer::new(2, "sim-two", Strategy::Uniform, seed2);

    let f1 = tokio::spawn(p1.run(Box::new(t1), Some(2)));
    let f2 = tokio::spawn(p2.run(Box::new(t2), None));
    let (res1, res2) = (f1.await??, f2.await??);

    let winner = match res1.winner_id {
        Some(1) => Some("player1"),
        Some(2) => Some("player2"),
        _ => None,
    };

    let result = json!({
        "session": res1.session_id,
        "player1": {"shots": res1.shots},
        "player2": {"shots": res2.shots},
        "reason": format!("{:?}", res1.reason),
        "winner": winner,
    });

    println!("{}", serde_json::to_string(&result)?);
    Ok(())
}
