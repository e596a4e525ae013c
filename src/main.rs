use clap::{Parser, ValueEnum};
use rand::Rng;

use seabattle::transport::{InMemoryTransport, TcpTransport};
use seabattle::{init_logging, AutoPlayer, PlayerId, Relay, Strategy};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum StrategyArg {
    Uniform,
    Coastal,
    Diagonal,
    HalfField,
    Spread,
}

impl From<StrategyArg> for Strategy {
    fn from(arg: StrategyArg) -> Self {
        match arg {
            StrategyArg::Uniform => Strategy::Uniform,
            StrategyArg::Coastal => Strategy::Coastal,
            StrategyArg::Diagonal => Strategy::Diagonal,
            StrategyArg::HalfField => Strategy::HalfField,
            StrategyArg::Spread => Strategy::Spread,
        }
    }
}

#[derive(Parser)]
enum Commands {
    /// Run the relay and wait for clients.
    Serve {
        #[arg(long, default_value = "0.0.0.0:8080")]
        bind: String,
    },
    /// Connect to a relay and play one automated match.
    Play {
        #[arg(long, default_value = "127.0.0.1:8080")]
        connect: String,
        #[arg(long)]
        id: PlayerId,
        #[arg(long, default_value = "anonymous")]
        nickname: String,
        #[arg(long, help = "Invite this player and move first; omit to wait for an invitation")]
        invite: Option<PlayerId>,
        #[arg(long, value_enum, default_value_t = StrategyArg::Uniform)]
        strategy: StrategyArg,
        #[arg(long, help = "Fix RNG seed for reproducible games")]
        seed: Option<u64>,
    },
    /// Play a full match between two local bots through an in-process
    /// relay.
    Local {
        #[arg(long, value_enum, default_value_t = StrategyArg::Coastal)]
        strategy_a: StrategyArg,
        #[arg(long, value_enum, default_value_t = StrategyArg::Spread)]
        strategy_b: StrategyArg,
        #[arg(long, help = "Fix RNG seed for reproducible games")]
        seed: Option<u64>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { bind } => {
            let relay = Relay::spawn();
            relay.serve(&bind).await?;
        }
        Commands::Play {
            connect,
            id,
            nickname,
            invite,
            strategy,
            seed,
        } => {
            let seed = seed.unwrap_or_else(|| rand::rng().random());
            let transport = TcpTransport::connect(&connect).await?;
            let player = AutoPlayer::new(id, nickname, strategy.into(), seed);
            let report = player.run(Box::new(transport), invite).await?;
            println!(
                "session {} over: draw={}, winner={:?}, reason={:?}, shots fired: {}",
                report.session_id, report.draw, report.winner_id, report.reason, report.shots
            );
        }
        Commands::Local {
            strategy_a,
            strategy_b,
            seed,
        } => {
            let seed = seed.unwrap_or_else(|| rand::rng().random());
            println!("running local match with seed {}", seed);
            let relay = Relay::spawn();
            let (t1, r1) = InMemoryTransport::pair();
            let (t2, r2) = InMemoryTransport::pair();
            relay.attach(Box::new(r1));
            relay.attach(Box::new(r2));

            let a = AutoPlayer::new(1, "player-one", strategy_a.into(), seed);
            let b = AutoPlayer::new(2, "player-two", strategy_b.into(), seed.wrapping_add(1));
            let a_run = tokio::spawn(a.run(Box::new(t1), Some(2)));
            let b_run = tokio::spawn(b.run(Box::new(t2), None));
            let (ra, rb) = (a_run.await??, b_run.await??);
            println!(
                "winner: {:?} ({:?}); shots: {} by inviter, {} by invitee",
                ra.winner_id, ra.reason, ra.shots, rb.shots
            );
        }
    }
    Ok(())
}
