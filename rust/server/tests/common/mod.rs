//! Shared helpers: scripted bus clients standing in for remote players.
#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use tokio::task::JoinHandle;

use felt_engine::player::{LastAction, Player};
use felt_engine::table::Table;
use felt_server::bus::TournamentBus;

pub fn test_table(id: &str, stacks: &[u32], bb_value: u32, turn_seconds: u64) -> Table {
    let mut table = Table::new(id, bb_value, turn_seconds);
    for (i, &chips) in stacks.iter().enumerate() {
        table.seat(Player::new(format!("p{}", i + 1), chips));
    }
    table
}

/// Blinds posted, pots rebuilt, ready for a pre-flop betting round.
pub fn start_preflop(table: &mut Table) {
    table.current_stage = felt_engine::table::Stage::PreFlop;
    table.rotate_blinds().unwrap();
    table.post_blinds().unwrap();
    table.rebuild_pots();
}

/// A remote player: watches every public snapshot and submits whatever the
/// strategy returns whenever the turn is theirs. Each returned pair becomes
/// one Player-shaped submission on the client subject.
pub fn spawn_bot(
    bus: &TournamentBus,
    player_id: &str,
    mut strategy: impl FnMut(&Table, &Player) -> Vec<(LastAction, u32)> + Send + 'static,
) -> JoinHandle<()> {
    let mut sub = bus.subscribe_tables();
    let bus = bus.clone();
    let player_id = player_id.to_string();
    tokio::spawn(async move {
        while let Some(msg) = sub.recv().await {
            let Ok(table) = serde_json::from_slice::<Table>(&msg.payload) else {
                continue;
            };
            if table.current_turn.as_deref() != Some(player_id.as_str()) {
                continue;
            }
            let Some(me) = table.players.iter().find(|p| p.id == player_id) else {
                continue;
            };
            for (last_action, last_bet) in strategy(&table, me) {
                let mut submission = me.clone();
                submission.last_action = last_action;
                submission.last_bet = last_bet;
                let _ = bus.submit_action(&table.id, &submission);
            }
        }
    })
}

/// Check when free, call when owed.
pub fn check_call(me: &Player) -> (LastAction, u32) {
    if me.call_amount == 0 {
        (LastAction::Check, 0)
    } else {
        (LastAction::Call, 0)
    }
}

pub fn spawn_check_call_bot(bus: &TournamentBus, player_id: &str) -> JoinHandle<()> {
    spawn_bot(bus, player_id, |_, me| vec![check_call(me)])
}

pub fn spawn_all_in_bot(bus: &TournamentBus, player_id: &str) -> JoinHandle<()> {
    spawn_bot(bus, player_id, |_, _| vec![(LastAction::AllIn, 0)])
}

/// Plays the script one entry per turn, then falls back to check/call.
pub fn spawn_scripted_bot(
    bus: &TournamentBus,
    player_id: &str,
    script: Vec<(LastAction, u32)>,
) -> JoinHandle<()> {
    let mut script: VecDeque<(LastAction, u32)> = script.into();
    spawn_bot(bus, player_id, move |_, me| {
        vec![script.pop_front().unwrap_or_else(|| check_call(me))]
    })
}

/// Record every public snapshot for later assertions.
pub fn record_snapshots(bus: &TournamentBus) -> (JoinHandle<()>, Arc<Mutex<Vec<Table>>>) {
    let log = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&log);
    let mut sub = bus.subscribe_tables();
    let handle = tokio::spawn(async move {
        while let Some(msg) = sub.recv().await {
            if let Ok(table) = serde_json::from_slice::<Table>(&msg.payload) {
                sink.lock().unwrap().push(table);
            }
        }
    });
    (handle, log)
}

/// Record one player's private views (these carry the hole cards).
pub fn record_player_views(
    bus: &TournamentBus,
    player_id: &str,
) -> (JoinHandle<()>, Arc<Mutex<Vec<Player>>>) {
    let log = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&log);
    let mut sub = bus.subscribe_player_views(player_id);
    let handle = tokio::spawn(async move {
        while let Some(msg) = sub.recv().await {
            if let Ok(player) = serde_json::from_slice::<Player>(&msg.payload) {
                sink.lock().unwrap().push(player);
            }
        }
    });
    (handle, log)
}
