//! # felt-engine: tournament hold'em game-state core
//!
//! The pure, synchronous half of the tournament server: table state, betting
//! arithmetic, pot construction and hand evaluation. Everything here is
//! deterministic and single-threaded; the async runtime that drives betting
//! rounds, hands and the tournament itself lives in `felt-server`.
//!
//! ## Modules
//!
//! - [`cards`] - suits, ranks, cards and the canonical deck
//! - [`deck`] - seeded shuffling and the pre-drawn per-hand deal
//! - [`hand`] - 5-to-7-card hand evaluation with a single total order
//! - [`player`] - the seated player record and action vocabulary
//! - [`table`] - the authoritative table state and its mutators
//! - [`pot`] - main/side pot reconstruction and split arithmetic
//! - [`rules`] - legal-action predicates and submission validation
//! - [`log`] - per-hand history records (JSONL)
//! - [`errors`] - engine error types
//!
//! ## Determinism
//!
//! Deals are reproducible: the orchestrator captures one seed per hand and
//! [`deck::HandDeal::from_seed`] regenerates the identical deal from it.
//!
//! ```
//! use felt_engine::deck::HandDeal;
//!
//! let a = HandDeal::from_seed(7, 4).unwrap();
//! let b = HandDeal::from_seed(7, 4).unwrap();
//! assert_eq!(a, b);
//! ```

pub mod cards;
pub mod deck;
pub mod errors;
pub mod hand;
pub mod log;
pub mod player;
pub mod pot;
pub mod rules;
pub mod table;
