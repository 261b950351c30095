//! In-process event bus with the contract the engine needs from its
//! JetStream deployment: a named stream over subject patterns, work-queue
//! retention per subject, durable pull consumers with explicit ack, and
//! fan-out subscriptions for snapshot observers.
//!
//! The bus daemon itself is an external collaborator; this adapter keeps the
//! same subjects and delivery semantics on tokio primitives so the whole
//! tournament runs (and is tested) in one process.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use thiserror::Error;
use tokio::sync::{mpsc, Notify};
use tokio::time::Instant;

use felt_engine::player::Player;
use felt_engine::table::Table;

/// Stream name the deployment uses for all tournament traffic.
pub const STREAM_NAME: &str = "POKER_TOURNAMENT";

/// Subject patterns bound to the tournament stream.
pub fn stream_subjects() -> Vec<String> {
    vec![
        "pokerServer.tournament.>".to_string(),
        "pokerClient.tournament.>".to_string(),
    ]
}

/// Public table snapshots, server to clients.
pub fn table_subject(table_id: &str) -> String {
    format!("pokerServer.tournament.{table_id}")
}

/// Private per-player views, server to one client.
pub fn player_subject(table_id: &str, player_id: &str) -> String {
    format!("pokerServer.tournament.{table_id}.{player_id}")
}

/// Action submissions, one client to the server.
pub fn action_subject(table_id: &str, player_id: &str) -> String {
    format!("pokerClient.tournament.{table_id}.{player_id}")
}

#[derive(Debug, Error)]
pub enum BusError {
    #[error("subject {subject} is not bound to stream {stream}")]
    UnboundSubject { subject: String, stream: String },
    #[error("failed to encode message for {subject}: {source}")]
    Encode {
        subject: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Retained messages per subject before the oldest is dropped.
const MAX_PENDING: usize = 1024;
/// Buffered messages per fan-out subscriber before sends are dropped.
const SUBSCRIBER_BUFFER: usize = 256;

#[derive(Debug, Clone)]
pub struct Message {
    pub subject: String,
    pub payload: Vec<u8>,
}

#[derive(Debug, Default)]
struct SubjectState {
    pending: VecDeque<Vec<u8>>,
    notify: Arc<Notify>,
}

#[derive(Debug, Default)]
struct BusState {
    subjects: HashMap<String, SubjectState>,
    subscribers: Vec<(usize, String, mpsc::Sender<Message>)>,
    next_subscriber: usize,
}

#[derive(Debug)]
struct BusInner {
    stream: String,
    bindings: Vec<String>,
    state: Mutex<BusState>,
}

/// The stream: retains published messages per subject and fans them out to
/// live subscribers. Cloning shares the underlying stream.
#[derive(Debug, Clone)]
pub struct EventBus {
    inner: Arc<BusInner>,
}

impl EventBus {
    pub fn new(stream: impl Into<String>, bindings: Vec<String>) -> Self {
        Self {
            inner: Arc::new(BusInner {
                stream: stream.into(),
                bindings,
                state: Mutex::new(BusState::default()),
            }),
        }
    }

    /// The `POKER_TOURNAMENT` stream with its standard subject bindings.
    pub fn tournament_stream() -> Self {
        Self::new(STREAM_NAME, stream_subjects())
    }

    pub fn stream_name(&self) -> &str {
        &self.inner.stream
    }

    fn bound(&self, subject: &str) -> bool {
        self.inner
            .bindings
            .iter()
            .any(|pattern| subject_matches(pattern, subject))
    }

    /// Publish to a subject of the stream. The payload is retained for pull
    /// consumers and copied to every matching live subscriber.
    pub fn publish(&self, subject: &str, payload: Vec<u8>) -> Result<(), BusError> {
        if !self.bound(subject) {
            return Err(BusError::UnboundSubject {
                subject: subject.to_string(),
                stream: self.inner.stream.clone(),
            });
        }
        let mut state = self.inner.state.lock().expect("bus lock poisoned");
        state.subscribers.retain(|(id, pattern, tx)| {
            if !subject_matches(pattern, subject) {
                return true;
            }
            match tx.try_send(Message {
                subject: subject.to_string(),
                payload: payload.clone(),
            }) {
                Ok(()) => true,
                Err(mpsc::error::TrySendError::Closed(_)) => false,
                Err(mpsc::error::TrySendError::Full(_)) => {
                    tracing::warn!(
                        subscriber_id = id,
                        subject = subject,
                        "subscriber buffer full, dropping message"
                    );
                    true
                }
            }
        });
        let subject_state = state.subjects.entry(subject.to_string()).or_default();
        if subject_state.pending.len() >= MAX_PENDING {
            subject_state.pending.pop_front();
            tracing::warn!(subject = subject, "pending queue full, dropping oldest");
        }
        subject_state.pending.push_back(payload);
        subject_state.notify.notify_one();
        Ok(())
    }

    /// Observe every message published to subjects matching `pattern`
    /// (NATS-style tokens: `*` one token, `>` the rest).
    pub fn subscribe(&self, pattern: &str) -> Subscription {
        let (tx, rx) = mpsc::channel(SUBSCRIBER_BUFFER);
        let mut state = self.inner.state.lock().expect("bus lock poisoned");
        let id = state.next_subscriber;
        state.next_subscriber += 1;
        state.subscribers.push((id, pattern.to_string(), tx));
        tracing::debug!(subscriber_id = id, pattern = pattern, "subscriber attached");
        Subscription {
            id,
            bus: self.clone(),
            receiver: rx,
        }
    }

    fn unsubscribe(&self, id: usize) {
        let mut state = self.inner.state.lock().expect("bus lock poisoned");
        state.subscribers.retain(|(sid, _, _)| *sid != id);
    }

    /// Drop every retained message on `subject`. The per-turn consumer setup
    /// does this first, which is what keeps stale submissions from an earlier
    /// window out of the new one. Returns how many messages were dropped.
    pub fn purge(&self, subject: &str) -> usize {
        let mut state = self.inner.state.lock().expect("bus lock poisoned");
        match state.subjects.get_mut(subject) {
            Some(s) => {
                let dropped = s.pending.len();
                s.pending.clear();
                if dropped > 0 {
                    tracing::debug!(subject = subject, dropped, "purged stale messages");
                }
                dropped
            }
            None => 0,
        }
    }

    /// A durable pull consumer over one subject. Each delivery must be acked
    /// to be consumed; an unacked delivery goes back to the front of the
    /// queue when dropped.
    pub fn pull_consumer(&self, subject: impl Into<String>, name: impl Into<String>) -> PullConsumer {
        PullConsumer {
            bus: self.clone(),
            subject: subject.into(),
            name: name.into(),
        }
    }
}

/// Token-wise NATS subject matching: `*` matches one token, a trailing `>`
/// matches one or more.
fn subject_matches(pattern: &str, subject: &str) -> bool {
    let mut pattern_tokens = pattern.split('.');
    let mut subject_tokens = subject.split('.');
    loop {
        match (pattern_tokens.next(), subject_tokens.next()) {
            (Some(">"), Some(_)) => return true,
            (Some("*"), Some(_)) => continue,
            (Some(p), Some(s)) if p == s => continue,
            (None, None) => return true,
            _ => return false,
        }
    }
}

/// A fan-out subscription; detaches from the bus when dropped.
pub struct Subscription {
    id: usize,
    bus: EventBus,
    receiver: mpsc::Receiver<Message>,
}

impl Subscription {
    pub async fn recv(&mut self) -> Option<Message> {
        self.receiver.recv().await
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.bus.unsubscribe(self.id);
    }
}

/// One message pulled from a subject queue. Work-queue semantics: `ack`
/// consumes it for good, dropping it unacked puts it back for redelivery.
#[derive(Debug)]
pub struct Delivery {
    subject: String,
    payload: Vec<u8>,
    bus: EventBus,
    acked: bool,
}

impl Delivery {
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    pub fn ack(mut self) {
        self.acked = true;
    }
}

impl Drop for Delivery {
    fn drop(&mut self) {
        if self.acked {
            return;
        }
        let payload = std::mem::take(&mut self.payload);
        let mut state = self.bus.inner.state.lock().expect("bus lock poisoned");
        let subject_state = state.subjects.entry(self.subject.clone()).or_default();
        subject_state.pending.push_front(payload);
        subject_state.notify.notify_one();
    }
}

/// Durable pull consumer scoped to one subject.
#[derive(Debug)]
pub struct PullConsumer {
    bus: EventBus,
    subject: String,
    name: String,
}

impl PullConsumer {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Next retained message, or `None` once `deadline` passes.
    pub async fn next(&mut self, deadline: Instant) -> Option<Delivery> {
        loop {
            let notify = {
                let mut state = self.bus.inner.state.lock().expect("bus lock poisoned");
                let subject_state = state.subjects.entry(self.subject.clone()).or_default();
                if let Some(payload) = subject_state.pending.pop_front() {
                    return Some(Delivery {
                        subject: self.subject.clone(),
                        payload,
                        bus: self.bus.clone(),
                        acked: false,
                    });
                }
                subject_state.notify.clone()
            };
            tokio::select! {
                _ = notify.notified() => continue,
                _ = tokio::time::sleep_until(deadline) => return None,
            }
        }
    }
}

/// The engine's view of the bus: typed publishes on the tournament subjects.
/// Injected into the orchestrator and controller, never global.
#[derive(Debug, Clone)]
pub struct TournamentBus {
    bus: EventBus,
}

impl TournamentBus {
    pub fn new(bus: EventBus) -> Self {
        Self { bus }
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    /// Broadcast the public snapshot: the table with every hole card
    /// stripped.
    pub fn publish_table(&self, table: &Table) -> Result<(), BusError> {
        let subject = table_subject(&table.id);
        let view = table.public_view();
        let payload = serde_json::to_vec(&view).map_err(|source| BusError::Encode {
            subject: subject.clone(),
            source,
        })?;
        self.bus.publish(&subject, payload)
    }

    /// Send a player their private view, hole cards included.
    pub fn publish_player(&self, table_id: &str, player: &Player) -> Result<(), BusError> {
        let subject = player_subject(table_id, &player.id);
        let payload = serde_json::to_vec(player).map_err(|source| BusError::Encode {
            subject: subject.clone(),
            source,
        })?;
        self.bus.publish(&subject, payload)
    }

    /// Client-side helper: submit an action as a Player-shaped payload whose
    /// `lastAction` and `lastBet` carry the move.
    pub fn submit_action(&self, table_id: &str, player: &Player) -> Result<(), BusError> {
        let subject = action_subject(table_id, &player.id);
        let payload = serde_json::to_vec(player).map_err(|source| BusError::Encode {
            subject: subject.clone(),
            source,
        })?;
        self.bus.publish(&subject, payload)
    }

    /// Open the consumer for one turn. The consumer name is unique per
    /// `(table, player, turn)` and the subject is purged first, so a retried
    /// or re-opened turn never reads a submission from outside its window.
    pub fn action_consumer(&self, table_id: &str, player_id: &str, turn: u64) -> PullConsumer {
        let subject = action_subject(table_id, player_id);
        self.bus.purge(&subject);
        self.bus
            .pull_consumer(subject, format!("durable-{table_id}-{player_id}-{turn}"))
    }

    /// Observe the public snapshots of every table.
    pub fn subscribe_tables(&self) -> Subscription {
        self.bus.subscribe("pokerServer.tournament.*")
    }

    /// Observe the public snapshots of one table.
    pub fn subscribe_table(&self, table_id: &str) -> Subscription {
        self.bus.subscribe(&table_subject(table_id))
    }

    /// Observe one player's private views across all tables.
    pub fn subscribe_player_views(&self, player_id: &str) -> Subscription {
        self.bus
            .subscribe(&format!("pokerServer.tournament.*.{player_id}"))
    }
}
