//! Tournament server binary.
//!
//! Usage: cargo run -p felt-server --bin felt-server -- --config config.yaml

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use clap::Parser;
use tokio::sync::watch;

use felt_engine::log::HandLogger;
use felt_engine::player::Player;
use felt_server::bus::{EventBus, TournamentBus};
use felt_server::config::Config;
use felt_server::supervisor::TournamentSupervisor;

/// Felt tournament server - multi-table no-limit hold'em
#[derive(Parser, Debug)]
#[command(name = "felt-server")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the YAML configuration file
    #[arg(short, long, default_value = "config.yaml")]
    config: PathBuf,

    /// Override the tournament RNG seed
    #[arg(long)]
    seed: Option<u64>,

    /// Append hand records to this JSONL file
    #[arg(long)]
    hand_log: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    felt_server::init_logging();

    let args = Args::parse();
    let mut config = Config::load(&args.config)?;
    if let Some(seed) = args.seed {
        config.tournament.seed = Some(seed);
    }
    if config.tournament.players.len() < 2 {
        return Err("tournament.players must name at least two players".into());
    }

    tracing::info!("Starting felt tournament server");
    tracing::info!("  Stream: {}", config.bus.stream.name);
    tracing::info!("  Bus:    {}:{}", config.bus.host, config.bus.port);
    tracing::info!("  Tables: up to {} seats each", config.tournament.max_players);
    tracing::info!("  Field:  {} players", config.tournament.players.len());

    let bus = TournamentBus::new(EventBus::new(
        config.bus.stream.name.clone(),
        config.bus.stream.subjects.clone(),
    ));

    let players: Vec<Player> = config
        .tournament
        .players
        .iter()
        .map(|id| Player::new(id.clone(), config.tournament.starting_stack))
        .collect();

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("shutdown requested");
            let _ = shutdown_tx.send(true);
        }
    });

    let mut supervisor =
        TournamentSupervisor::new(bus, config.tournament.clone(), shutdown_rx);
    if let Some(path) = &args.hand_log {
        let logger = HandLogger::create(path)?;
        supervisor = supervisor.with_hand_log(Arc::new(Mutex::new(logger)));
    }

    let result = supervisor.run(players).await?;

    match &result.winner {
        Some(winner) => println!("\nChampion: {winner}"),
        None => println!("\nTournament stopped without a champion"),
    }
    for (place, id) in result.rankings.iter().enumerate() {
        println!("  {:>2}. {id}", place + 1);
    }
    Ok(())
}
