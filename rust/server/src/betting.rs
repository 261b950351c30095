//! The betting-round controller: drives one street's betting to closure.
//!
//! Exactly one action is applied at a time; the controller owns the table
//! for the whole round and addresses seats by index, so state transitions
//! are totally ordered. It suspends only while waiting on the player's
//! consumer, the turn deadline, or shutdown.

use chrono::Utc;
use tokio::sync::watch;
use tokio::time::{Duration, Instant};

use felt_engine::player::Player;
use felt_engine::rules::{self, ValidatedAction};
use felt_engine::table::{Applied, Stage, Table};

use crate::bus::{PullConsumer, TournamentBus};
use crate::errors::ServerError;

/// How a betting round ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundOutcome {
    /// Everyone matched; play moves to the next street.
    Closed,
    /// All but one player folded; the hand ends without a reveal.
    FoldOut,
    /// Everyone still in is all-in; remaining streets run with no betting.
    AllIn,
    /// Shutdown was requested; the table is in a legal state.
    Cancelled,
}

enum TurnResult {
    Acted(Applied),
    TimedOut,
    Cancelled,
}

/// Run one betting round to closure.
///
/// Pre-flop the first seat to act is the one past the big blind; on later
/// streets the scan starts at the big blind itself, which in heads-up play
/// puts the big blind first. The round closes when every seat still able to
/// act has acted since the last re-open and owes nothing, or earlier on a
/// fold-out or when nobody is left with chips to bet.
pub async fn run_betting_round(
    table: &mut Table,
    bus: &TournamentBus,
    shutdown: &mut watch::Receiver<bool>,
    turn_seq: &mut u64,
) -> Result<RoundOutcome, ServerError> {
    if table.fold_out() {
        return Ok(RoundOutcome::FoldOut);
    }
    let first = match table.current_stage {
        Stage::PreFlop => table.first_to_act_preflop()?,
        _ => table.first_to_act_postflop()?,
    };
    let Some(first) = first else {
        return Ok(RoundOutcome::AllIn);
    };

    let seats = table.players.len();
    let mut acted = vec![false; seats];
    let mut seat = first;

    loop {
        if !table.players[seat].is_active() {
            seat = (seat + 1) % seats;
            continue;
        }

        *turn_seq += 1;
        let player_id = table.players[seat].id.clone();
        // Consumer first, snapshot second: everything submitted before this
        // snapshot is stale and gets purged, everything after it is seen.
        let mut consumer = bus.action_consumer(&table.id, &player_id, *turn_seq);

        table.current_turn = Some(player_id.clone());
        table.end_time = Utc::now().timestamp() + table.turn_seconds as i64;
        table.set_available_actions(seat)?;
        bus.publish_table(table)?;
        tracing::debug!(
            table_id = %table.id,
            player_id = %player_id,
            stage = ?table.current_stage,
            consumer = consumer.name(),
            "awaiting action"
        );

        let deadline = Instant::now() + Duration::from_secs(table.turn_seconds);
        let applied = match wait_for_action(table, seat, &mut consumer, deadline, shutdown).await?
        {
            TurnResult::Cancelled => {
                table.current_turn = None;
                return Ok(RoundOutcome::Cancelled);
            }
            TurnResult::TimedOut => {
                // Absent players check when free and fold when owing money.
                let auto = if table.players[seat].call_amount == 0 {
                    ValidatedAction::Check
                } else {
                    ValidatedAction::Fold
                };
                tracing::info!(
                    table_id = %table.id,
                    player_id = %player_id,
                    auto_action = ?auto,
                    "turn deadline expired"
                );
                table.apply(seat, auto)?
            }
            TurnResult::Acted(applied) => applied,
        };

        acted[seat] = true;
        if applied.reopened {
            for (i, flag) in acted.iter_mut().enumerate() {
                *flag = i == seat;
            }
        }
        table.players[seat].available_actions.clear();
        table.rebuild_pots();

        if table.fold_out() {
            table.current_turn = None;
            return Ok(RoundOutcome::FoldOut);
        }
        if table.actionable_players() == 0 {
            table.current_turn = None;
            return Ok(RoundOutcome::AllIn);
        }
        let closed = table
            .players
            .iter()
            .enumerate()
            .all(|(i, p)| !p.is_active() || (acted[i] && p.call_amount == 0));
        if closed {
            table.current_turn = None;
            return Ok(RoundOutcome::Closed);
        }

        seat = (seat + 1) % seats;
    }
}

/// Wait for one valid submission on the seat's consumer, or the deadline.
/// Malformed and illegal submissions are discarded without advancing the
/// seat; the deadline keeps running.
async fn wait_for_action(
    table: &mut Table,
    seat: usize,
    consumer: &mut PullConsumer,
    deadline: Instant,
    shutdown: &mut watch::Receiver<bool>,
) -> Result<TurnResult, ServerError> {
    loop {
        tokio::select! {
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    return Ok(TurnResult::Cancelled);
                }
            }
            delivery = consumer.next(deadline) => {
                let Some(delivery) = delivery else {
                    return Ok(TurnResult::TimedOut);
                };
                match validate_submission(table, seat, delivery.payload()) {
                    Ok(action) => {
                        let applied = table.apply(seat, action)?;
                        delivery.ack();
                        return Ok(TurnResult::Acted(applied));
                    }
                    Err(reason) => {
                        tracing::warn!(
                            table_id = %table.id,
                            player_id = %table.players[seat].id,
                            reason = %reason,
                            "discarding invalid submission"
                        );
                        delivery.ack();
                    }
                }
            }
        }
    }
}

/// Decode a Player-shaped submission and validate the move it names. The
/// server recomputes every amount itself; only the raise increment is taken
/// from the payload.
fn validate_submission(table: &Table, seat: usize, payload: &[u8]) -> Result<ValidatedAction, String> {
    let submission: Player =
        serde_json::from_slice(payload).map_err(|e| format!("malformed payload: {e}"))?;
    let expected = &table.players[seat];
    if !submission.id.is_empty() && submission.id != expected.id {
        return Err(format!(
            "submission names player {} but the turn is {}",
            submission.id, expected.id
        ));
    }
    rules::validate_action(
        expected,
        table.bb_value,
        submission.last_action,
        submission.last_bet,
    )
    .map_err(|e| e.to_string())
}
