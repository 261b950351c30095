use crate::errors::EngineError;
use crate::player::{ActionKind, LastAction, Player};

/// A submission that passed validation, with the amounts the engine computed
/// itself. Clients name the action; the server does the arithmetic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidatedAction {
    Check,
    Fold,
    Call,
    /// Raise by this increment above the call.
    Raise(u32),
    AllIn,
}

/// The actions a seat may take right now.
///
/// - `check` only with nothing owed
/// - `call` only when owing and able to cover it
/// - `raise` only with more than call plus one big blind behind
/// - `allin` with any chips at all
/// - `fold` always
pub fn available_actions(player: &Player, bb_value: u32) -> Vec<ActionKind> {
    let mut actions = Vec::with_capacity(5);
    if player.call_amount == 0 {
        actions.push(ActionKind::Check);
    }
    if player.call_amount > 0 && player.chips >= player.call_amount {
        actions.push(ActionKind::Call);
    }
    if player.chips > player.call_amount + bb_value {
        actions.push(ActionKind::Raise);
    }
    if player.chips > 0 {
        actions.push(ActionKind::AllIn);
    }
    actions.push(ActionKind::Fold);
    actions
}

/// Validate a submitted action against the seat's current state.
///
/// The minimum raise is one big blind above the call. A raise that would
/// consume the whole stack is converted into an all-in, which keeps its
/// raise semantics downstream when it exceeds the biggest bet.
///
/// # Examples
///
/// ```
/// use felt_engine::player::{LastAction, Player};
/// use felt_engine::rules::{validate_action, ValidatedAction};
///
/// let mut seat = Player::new("p1", 1_000);
/// seat.call_amount = 50;
///
/// let action = validate_action(&seat, 100, LastAction::Raise, 100).unwrap();
/// assert_eq!(action, ValidatedAction::Raise(100));
///
/// // Below one big blind above the call: rejected.
/// assert!(validate_action(&seat, 100, LastAction::Raise, 99).is_err());
/// ```
pub fn validate_action(
    player: &Player,
    bb_value: u32,
    action: LastAction,
    last_bet: u32,
) -> Result<ValidatedAction, EngineError> {
    match action {
        LastAction::Fold => Ok(ValidatedAction::Fold),
        LastAction::Check => {
            if player.call_amount == 0 {
                Ok(ValidatedAction::Check)
            } else {
                Err(EngineError::IllegalAction { action })
            }
        }
        LastAction::Call => {
            if player.call_amount > 0 && player.chips >= player.call_amount {
                Ok(ValidatedAction::Call)
            } else {
                Err(EngineError::IllegalAction { action })
            }
        }
        LastAction::Raise => {
            if last_bet < bb_value {
                return Err(EngineError::InvalidRaise {
                    amount: last_bet,
                    minimum: bb_value,
                });
            }
            let needed = player.call_amount + last_bet;
            if player.chips < needed {
                Err(EngineError::IllegalAction { action })
            } else if player.chips == needed {
                // A raise for the whole stack is an all-in raise.
                Ok(ValidatedAction::AllIn)
            } else {
                Ok(ValidatedAction::Raise(last_bet))
            }
        }
        LastAction::AllIn => {
            if player.chips > 0 {
                Ok(ValidatedAction::AllIn)
            } else {
                Err(EngineError::IllegalAction { action })
            }
        }
        // Blind markers and "none" are bookkeeping, not submissions.
        LastAction::None | LastAction::SmallBlind | LastAction::BigBlind => {
            Err(EngineError::IllegalAction { action })
        }
    }
}
