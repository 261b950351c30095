//! # felt-server: the tournament runtime
//!
//! The asynchronous half of the engine: one tokio task per table hand, a
//! betting-round controller that waits on player submissions with per-turn
//! deadlines, and a supervisor that rebalances seats across tables until one
//! player holds all the chips.
//!
//! Clients never compute game state. They receive public table snapshots on
//! `pokerServer.tournament.{tableId}`, private views (hole cards included)
//! on `pokerServer.tournament.{tableId}.{playerId}`, and submit actions on
//! `pokerClient.tournament.{tableId}.{playerId}`. The bus adapter keeps the
//! durable work-queue semantics of the deployment's stream in-process.
//!
//! ## Modules
//!
//! - [`config`] - YAML configuration with environment overrides
//! - [`bus`] - subjects, the in-process stream, and the typed tournament bus
//! - [`betting`] - the betting-round controller
//! - [`orchestrator`] - the per-table hand stage machine
//! - [`supervisor`] - tournament-wide table coordination
//! - [`logging`] - tracing bootstrap
//! - [`errors`] - server error types

pub mod betting;
pub mod bus;
pub mod config;
pub mod errors;
pub mod logging;
pub mod orchestrator;
pub mod supervisor;

pub use bus::{EventBus, TournamentBus};
pub use config::{Config, TournamentConfig};
pub use errors::ServerError;
pub use logging::init_logging;
pub use supervisor::{TournamentResult, TournamentSupervisor};
