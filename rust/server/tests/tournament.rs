//! Tournament-level scenarios: supervision, rebalance, termination.

mod common;

use std::collections::HashSet;

use tokio::sync::watch;

use felt_engine::player::Player;
use felt_engine::table::Stage;
use felt_server::bus::{EventBus, TournamentBus};
use felt_server::config::TournamentConfig;
use felt_server::supervisor::TournamentSupervisor;

use common::*;

fn tournament_config(max_players: usize, max_rounds: Option<u32>, seed: u64) -> TournamentConfig {
    TournamentConfig {
        min_players: 2,
        max_players,
        turn_seconds: 5,
        starting_stack: 1_000,
        bb_value: 100,
        stage_pause_ms: 0,
        max_rounds,
        seed: Some(seed),
        players: Vec::new(),
    }
}

fn field(n: usize) -> Vec<Player> {
    (1..=n)
        .map(|i| Player::new(format!("p{i}"), 1_000))
        .collect()
}

#[tokio::test]
async fn heads_up_tournament_crowns_a_champion() {
    let bus = TournamentBus::new(EventBus::tournament_stream());
    let _bots = [spawn_all_in_bot(&bus, "p1"), spawn_all_in_bot(&bus, "p2")];

    let (_shutdown_guard, shutdown) = {
        let (tx, rx) = watch::channel(false);
        (tx, rx)
    };
    let supervisor =
        TournamentSupervisor::new(bus.clone(), tournament_config(4, Some(200), 7), shutdown);
    let result = supervisor.run(field(2)).await.unwrap();

    let winner = result.winner.expect("a champion");
    assert_eq!(result.rankings.len(), 2);
    assert_eq!(result.rankings[0], winner);
    assert!(result.rankings.contains(&"p1".to_string()));
    assert!(result.rankings.contains(&"p2".to_string()));
}

#[tokio::test]
async fn multi_table_tournament_collapses_to_a_final_table() {
    let bus = TournamentBus::new(EventBus::tournament_stream());
    let _bots: Vec<_> = (1..=6)
        .map(|i| spawn_all_in_bot(&bus, &format!("p{i}")))
        .collect();
    let (_rec, snapshots) = record_snapshots(&bus);

    let (_shutdown_guard, shutdown) = {
        let (tx, rx) = watch::channel(false);
        (tx, rx)
    };
    // Six players across two three-seat tables.
    let supervisor =
        TournamentSupervisor::new(bus.clone(), tournament_config(3, Some(300), 11), shutdown);
    let result = supervisor.run(field(6)).await.unwrap();

    let winner = result.winner.expect("a champion");
    assert_eq!(result.rankings.len(), 6);
    assert_eq!(result.rankings[0], winner);
    let unique: HashSet<&String> = result.rankings.iter().collect();
    assert_eq!(unique.len(), 6);

    tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;
    let snapshots = snapshots.lock().unwrap();
    let table_ids: HashSet<&str> = snapshots.iter().map(|t| t.id.as_str()).collect();
    assert!(table_ids.len() >= 2, "the field started on two tables");

    let finish = snapshots
        .iter()
        .find(|t| t.current_stage == Stage::FinishTournament)
        .expect("final snapshot");
    assert!(finish.last_table);
    let champion_seat = finish
        .players
        .iter()
        .find(|p| !p.is_eliminated)
        .expect("champion seated");
    assert_eq!(champion_seat.id, winner);
}

#[tokio::test]
async fn safety_brake_stops_play_without_a_champion() {
    let bus = TournamentBus::new(EventBus::tournament_stream());
    let _bots = [
        spawn_check_call_bot(&bus, "p1"),
        spawn_check_call_bot(&bus, "p2"),
    ];

    let (_shutdown_guard, shutdown) = {
        let (tx, rx) = watch::channel(false);
        (tx, rx)
    };
    let supervisor =
        TournamentSupervisor::new(bus.clone(), tournament_config(4, Some(2), 3), shutdown);
    let result = supervisor.run(field(2)).await.unwrap();

    // Two check-down hands cannot bust anyone; the brake returns standings.
    assert_eq!(result.rankings.len(), 2);
}

#[tokio::test]
async fn shutdown_ends_the_tournament_gracefully() {
    let bus = TournamentBus::new(EventBus::tournament_stream());
    let _bots = [
        spawn_check_call_bot(&bus, "p1"),
        spawn_check_call_bot(&bus, "p2"),
    ];

    let (shutdown_tx, shutdown) = watch::channel(false);
    tokio::spawn(async move {
        tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;
        let _ = shutdown_tx.send(true);
    });

    let supervisor =
        TournamentSupervisor::new(bus.clone(), tournament_config(4, None, 5), shutdown);
    let result = supervisor.run(field(2)).await.unwrap();
    // Both players are still in; standings list them all the same.
    assert_eq!(result.rankings.len(), 2);
}
