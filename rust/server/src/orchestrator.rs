//! Per-table hand orchestration: the stage machine that deals, runs the
//! betting controller per street, reveals the board, settles the pots and
//! closes out the hand.
//!
//! Every stage step is deterministic given the table's pre-state: the whole
//! deal is drawn up front from a seed captured on the table at hand start,
//! so a retried step reproduces the same cards.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, Mutex};

use tokio::sync::watch;
use tokio::time::Duration;

use felt_engine::deck::HandDeal;
use felt_engine::log::{HandLogger, HandRecord};
use felt_engine::player::PlayerId;
use felt_engine::table::{Stage, Table};

use crate::betting::{run_betting_round, RoundOutcome};
use crate::bus::TournamentBus;
use crate::errors::ServerError;

/// How one hand ended, from the supervisor's point of view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandOutcome {
    /// Played to the end; these seats busted and left the tournament.
    Complete { eliminated: Vec<PlayerId> },
    /// Too few players to deal; the table is done.
    TableFinished,
    /// Shutdown arrived mid-hand; the table is in a legal state.
    Cancelled,
}

/// The seed a given hand deals from, derived from the tournament seed, the
/// table and the hand number. Stable across retries by construction.
pub fn hand_seed(base: u64, table_id: &str, round: u32) -> u64 {
    let mut hasher = DefaultHasher::new();
    base.hash(&mut hasher);
    table_id.hash(&mut hasher);
    round.hash(&mut hasher);
    hasher.finish()
}

/// Drives single hands at one table. The orchestrator owns the table; the
/// betting controller borrows it per round and hands it back.
pub struct HandOrchestrator {
    table: Table,
    bus: TournamentBus,
    stage_pause: Duration,
    base_seed: u64,
    shutdown: watch::Receiver<bool>,
    hand_log: Option<Arc<Mutex<HandLogger>>>,
}

impl HandOrchestrator {
    pub fn new(
        table: Table,
        bus: TournamentBus,
        stage_pause: Duration,
        base_seed: u64,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        Self {
            table,
            bus,
            stage_pause,
            base_seed,
            shutdown,
            hand_log: None,
        }
    }

    pub fn with_hand_log(mut self, log: Arc<Mutex<HandLogger>>) -> Self {
        self.hand_log = Some(log);
        self
    }

    pub fn table(&self) -> &Table {
        &self.table
    }

    pub fn into_table(self) -> Table {
        self.table
    }

    /// Play one complete hand: deal, four streets, settlement, bookkeeping.
    pub async fn run_hand(&mut self) -> Result<HandOutcome, ServerError> {
        if *self.shutdown.borrow() {
            return Ok(HandOutcome::Cancelled);
        }
        if self.table.active_players() < 2 {
            self.table.current_stage = Stage::FinishTable;
            self.table.table_ends = true;
            self.publish_table()?;
            tracing::info!(table_id = %self.table.id, "table finished");
            return Ok(HandOutcome::TableFinished);
        }

        // Dealing: capture the seed, draw the whole hand from it, and send
        // each live seat its private hole cards.
        self.table.current_stage = Stage::Dealing;
        self.table.hand_seed = hand_seed(self.base_seed, &self.table.id, self.table.round);
        let deal = HandDeal::from_seed(self.table.hand_seed, self.table.active_players())?;
        self.table.deal_from(&deal)?;
        self.publish_table()?;
        for player in self.table.players.iter().filter(|p| !p.is_eliminated) {
            self.bus.publish_player(&self.table.id, player)?;
        }
        tracing::info!(
            table_id = %self.table.id,
            round = self.table.round,
            players = self.table.active_players(),
            "hand dealt"
        );
        self.pause().await;

        // Pre-flop.
        self.table.current_stage = Stage::PreFlop;
        self.table.rotate_blinds()?;
        self.table.post_blinds()?;
        self.table.rebuild_pots();
        let mut turn_seq = u64::from(self.table.round) << 16;
        let mut betting_open = true;
        match self.betting_round(&mut turn_seq).await? {
            RoundOutcome::Cancelled => return Ok(HandOutcome::Cancelled),
            RoundOutcome::FoldOut => return self.settle_fold_out().await,
            RoundOutcome::AllIn => betting_open = false,
            RoundOutcome::Closed => {}
        }

        // Flop, turn, river: reveal, then bet unless everyone is locked in.
        for stage in [Stage::Flop, Stage::Turn, Stage::River] {
            self.table.current_stage = stage;
            match stage {
                Stage::Flop => self.table.reveal_flop(&deal),
                Stage::Turn => self.table.reveal_turn(&deal),
                Stage::River => self.table.reveal_river(&deal),
                _ => unreachable!(),
            }
            self.publish_table()?;
            self.pause().await;
            if betting_open {
                match self.betting_round(&mut turn_seq).await? {
                    RoundOutcome::Cancelled => return Ok(HandOutcome::Cancelled),
                    RoundOutcome::FoldOut => return self.settle_fold_out().await,
                    RoundOutcome::AllIn => betting_open = false,
                    RoundOutcome::Closed => {}
                }
            }
        }

        // Showdown.
        self.table.current_stage = Stage::Showdown;
        self.table.award_pots()?;
        for player in self.table.players.iter().filter(|p| p.in_hand()) {
            self.bus.publish_player(&self.table.id, player)?;
        }
        tracing::info!(
            table_id = %self.table.id,
            winners = ?self.table.winners,
            "showdown settled"
        );
        self.finish_hand().await
    }

    async fn betting_round(&mut self, turn_seq: &mut u64) -> Result<RoundOutcome, ServerError> {
        run_betting_round(&mut self.table, &self.bus, &mut self.shutdown, turn_seq).await
    }

    async fn settle_fold_out(&mut self) -> Result<HandOutcome, ServerError> {
        self.table.current_stage = Stage::ShowdownFoldout;
        let winner = self.table.award_fold_out()?;
        tracing::info!(
            table_id = %self.table.id,
            winner = %winner,
            "hand ended by fold-out"
        );
        self.finish_hand().await
    }

    /// Common end-of-hand path: eliminations, the hand record, the final
    /// snapshot, and the reset that leaves the table clean for migration.
    async fn finish_hand(&mut self) -> Result<HandOutcome, ServerError> {
        let eliminated = self.table.mark_eliminated();
        for id in &eliminated {
            tracing::info!(table_id = %self.table.id, player_id = %id, "player eliminated");
        }
        self.table.round += 1;
        self.publish_table()?;
        self.write_hand_record();
        self.table.clear_for_next_hand();
        Ok(HandOutcome::Complete { eliminated })
    }

    fn write_hand_record(&self) {
        let Some(log) = &self.hand_log else {
            return;
        };
        let record = HandRecord {
            hand_id: format!("{}-{}", self.table.id, self.table.round),
            table_id: self.table.id.clone(),
            seed: self.table.hand_seed,
            actions: self.table.action_history.clone(),
            board: self.table.community_cards(),
            winners: self.table.winners.clone(),
            ts: None,
        };
        let mut guard = match log.lock() {
            Ok(guard) => guard,
            Err(_) => {
                tracing::warn!(table_id = %self.table.id, "hand log lock poisoned");
                return;
            }
        };
        if let Err(err) = guard.write(&record) {
            tracing::warn!(table_id = %self.table.id, error = %err, "failed to write hand record");
        }
    }

    /// Snapshot publishes retry once; the write is idempotent so a duplicate
    /// on a slow path is harmless.
    fn publish_table(&self) -> Result<(), ServerError> {
        if let Err(err) = self.bus.publish_table(&self.table) {
            tracing::warn!(table_id = %self.table.id, error = %err, "snapshot publish failed, retrying");
            self.bus.publish_table(&self.table)?;
        }
        Ok(())
    }

    async fn pause(&self) {
        if !self.stage_pause.is_zero() {
            tokio::time::sleep(self.stage_pause).await;
        }
    }
}
