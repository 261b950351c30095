//! The tournament supervisor: runs every table's hands concurrently,
//! rebalances seating as players bust, collapses empty tables and declares
//! the champion.
//!
//! Tables share no mutable state while a hand runs. Migration only ever
//! touches idle tables, which sit at a hand boundary with every per-hand
//! field cleared, so a migrating player always moves with a zero `totalBet`
//! and their full stack.

use std::sync::{Arc, Mutex};

use rand::RngCore;
use tokio::sync::watch;
use tokio::task::JoinSet;
use tokio::time::Duration;
use uuid::Uuid;

use felt_engine::log::HandLogger;
use felt_engine::player::{Player, PlayerId};
use felt_engine::table::{Stage, Table};

use crate::bus::TournamentBus;
use crate::config::TournamentConfig;
use crate::errors::ServerError;
use crate::orchestrator::{HandOrchestrator, HandOutcome};

/// Final outcome of a tournament run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TournamentResult {
    /// The champion, when one player ended up holding all the chips.
    pub winner: Option<PlayerId>,
    /// Final placements, champion first, then reverse elimination order.
    pub rankings: Vec<PlayerId>,
}

pub struct TournamentSupervisor {
    bus: TournamentBus,
    cfg: TournamentConfig,
    shutdown: watch::Receiver<bool>,
    hand_log: Option<Arc<Mutex<HandLogger>>>,
}

impl TournamentSupervisor {
    pub fn new(bus: TournamentBus, cfg: TournamentConfig, shutdown: watch::Receiver<bool>) -> Self {
        Self {
            bus,
            cfg,
            shutdown,
            hand_log: None,
        }
    }

    pub fn with_hand_log(mut self, log: Arc<Mutex<HandLogger>>) -> Self {
        self.hand_log = Some(log);
        self
    }

    /// Run the tournament to completion: seat the field, play hands on every
    /// table concurrently, rebalance at hand boundaries, finish when one
    /// player holds all the chips (or the safety brake trips).
    pub async fn run(self, players: Vec<Player>) -> Result<TournamentResult, ServerError> {
        if players.len() < 2 {
            return Err(felt_engine::errors::EngineError::TooFewPlayers(players.len()).into());
        }
        let base_seed = self
            .cfg
            .seed
            .unwrap_or_else(|| rand::rng().next_u64());
        let mut total_active = players.len();
        tracing::info!(
            players = total_active,
            seed = base_seed,
            "tournament starting"
        );

        // Seat the field round-robin over the fewest tables that hold it.
        let table_count = players.len().div_ceil(self.cfg.max_players);
        let mut idle: Vec<Table> = (0..table_count)
            .map(|_| {
                Table::new(
                    format!("table-{}", Uuid::new_v4().simple()),
                    self.cfg.bb_value,
                    self.cfg.turn_seconds,
                )
            })
            .collect();
        for (i, p) in players.into_iter().enumerate() {
            idle[i % table_count].seat(p);
        }

        let mut running: JoinSet<(Table, Result<HandOutcome, ServerError>)> = JoinSet::new();
        let mut busted_in_order: Vec<PlayerId> = Vec::new();
        let mut parked: Vec<Table> = Vec::new();

        loop {
            self.rebalance(&mut idle, running.len(), total_active);

            if running.is_empty() && idle.len() == 1 && idle[0].active_players() == 1 {
                return Ok(self.crown_champion(idle.remove(0), busted_in_order));
            }

            // Start a hand on every idle table that can play one.
            let total_tables = idle.len() + running.len();
            let mut held = Vec::new();
            for mut table in idle.drain(..) {
                let braked = self
                    .cfg
                    .max_rounds
                    .is_some_and(|cap| table.round >= cap);
                if table.active_players() < 2 || braked || *self.shutdown.borrow() {
                    held.push(table);
                    continue;
                }
                table.last_table = total_tables == 1;
                let mut orchestrator = HandOrchestrator::new(
                    table,
                    self.bus.clone(),
                    Duration::from_millis(self.cfg.stage_pause_ms),
                    base_seed,
                    self.shutdown.clone(),
                );
                if let Some(log) = &self.hand_log {
                    orchestrator = orchestrator.with_hand_log(Arc::clone(log));
                }
                running.spawn(async move {
                    let mut orchestrator = orchestrator;
                    let result = orchestrator.run_hand().await;
                    (orchestrator.into_table(), result)
                });
            }
            idle = held;

            if running.is_empty() {
                // Brake tripped, shutdown, or no table can seat a hand.
                return Ok(self.standings(&idle, busted_in_order));
            }

            match running.join_next().await {
                Some(Ok((table, result))) => match result {
                    Ok(HandOutcome::Complete { eliminated }) => {
                        total_active -= eliminated.len();
                        busted_in_order.extend(eliminated);
                        idle.push(table);
                    }
                    Ok(HandOutcome::TableFinished) | Ok(HandOutcome::Cancelled) => {
                        idle.push(table);
                    }
                    Err(err) => {
                        tracing::error!(
                            table_id = %table.id,
                            error = %err,
                            "hand aborted, table parked for operator review"
                        );
                        let mut table = table;
                        table.table_ends = true;
                        total_active -= table.active_players();
                        parked.push(table);
                    }
                },
                Some(Err(join_err)) => return Err(ServerError::Join(join_err.to_string())),
                None => {}
            }
        }
    }

    /// Idle-table bookkeeping between hands: drop busted seats, collapse
    /// empty tables, merge tables when fewer would hold everyone, and even
    /// out occupancy. Running tables are never touched.
    fn rebalance(&self, idle: &mut Vec<Table>, running_tables: usize, total_active: usize) {
        for table in idle.iter_mut() {
            table.players.retain(|p| !p.is_eliminated);
        }
        idle.retain(|table| {
            if table.players.is_empty() {
                tracing::info!(table_id = %table.id, "collapsing empty table");
                false
            } else {
                true
            }
        });
        if total_active == 0 {
            return;
        }

        let desired = total_active.div_ceil(self.cfg.max_players).max(1);
        while running_tables + idle.len() > desired && idle.len() >= 2 {
            idle.sort_by_key(|t| t.players.len());
            let spare: usize = idle
                .iter()
                .skip(1)
                .map(|t| self.cfg.max_players.saturating_sub(t.players.len()))
                .sum();
            if spare < idle[0].players.len() {
                // The open seats are on tables mid-hand; try again at the
                // next completion.
                break;
            }
            let donor = idle.remove(0);
            tracing::info!(
                table_id = %donor.id,
                players = donor.players.len(),
                "collapsing table, migrating players"
            );
            let mut migrants = donor.players;
            for table in idle.iter_mut() {
                while table.players.len() < self.cfg.max_players {
                    match migrants.pop() {
                        Some(p) => {
                            tracing::info!(player_id = %p.id, to = %table.id, "player migrated");
                            table.seat(p);
                        }
                        None => break,
                    }
                }
            }
        }

        // Even out occupancy so no idle table sits far below the rest.
        loop {
            if idle.len() < 2 {
                break;
            }
            let (mut min_i, mut max_i) = (0, 0);
            for (i, t) in idle.iter().enumerate() {
                if t.players.len() < idle[min_i].players.len() {
                    min_i = i;
                }
                if t.players.len() > idle[max_i].players.len() {
                    max_i = i;
                }
            }
            if idle[max_i].players.len() - idle[min_i].players.len() < 2 {
                break;
            }
            let Some(migrant) = idle[max_i].players.pop() else {
                break;
            };
            tracing::info!(
                player_id = %migrant.id,
                from = %idle[max_i].id,
                to = %idle[min_i].id,
                "player migrated for balance"
            );
            idle[min_i].seat(migrant);
        }
    }

    fn crown_champion(&self, mut table: Table, busted_in_order: Vec<PlayerId>) -> TournamentResult {
        table.last_table = true;
        table.current_stage = Stage::FinishTournament;
        if let Err(err) = self.bus.publish_table(&table) {
            tracing::warn!(table_id = %table.id, error = %err, "failed to publish final snapshot");
        }
        let winner = table
            .players
            .iter()
            .find(|p| !p.is_eliminated)
            .map(|p| p.id.clone());
        let mut rankings = Vec::with_capacity(busted_in_order.len() + 1);
        rankings.extend(winner.clone());
        rankings.extend(busted_in_order.into_iter().rev());
        tracing::info!(winner = ?winner, "tournament finished");
        TournamentResult { winner, rankings }
    }

    /// Final placements without a champion: remaining players by chip count,
    /// then everyone who busted, latest first.
    fn standings(&self, tables: &[Table], busted_in_order: Vec<PlayerId>) -> TournamentResult {
        let mut remaining: Vec<(u32, PlayerId)> = tables
            .iter()
            .flat_map(|t| {
                t.players
                    .iter()
                    .filter(|p| !p.is_eliminated)
                    .map(|p| (p.chips, p.id.clone()))
            })
            .collect();
        remaining.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)));
        let winner = (remaining.len() == 1).then(|| remaining[0].1.clone());
        let mut rankings: Vec<PlayerId> = remaining.into_iter().map(|(_, id)| id).collect();
        rankings.extend(busted_in_order.into_iter().rev());
        tracing::info!(winner = ?winner, "tournament stopped before a champion emerged");
        TournamentResult { winner, rankings }
    }
}
