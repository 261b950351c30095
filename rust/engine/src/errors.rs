use thiserror::Error;

use crate::player::{LastAction, PlayerId};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EngineError {
    #[error("invalid raise of {amount}, minimum is {minimum}")]
    InvalidRaise { amount: u32, minimum: u32 },
    #[error("action {action:?} is not legal for this seat")]
    IllegalAction { action: LastAction },
    #[error("unknown player {0}")]
    UnknownPlayer(PlayerId),
    #[error("seat {0} is out of range")]
    BadSeat(usize),
    #[error("table has no posted {0} blind")]
    MissingBlind(&'static str),
    #[error("not enough players to start a hand: {0}")]
    TooFewPlayers(usize),
    #[error("hand evaluation requires 5 to 7 cards, got {0}")]
    InvalidHandSize(usize),
    #[error("deck exhausted")]
    DeckExhausted,
}
