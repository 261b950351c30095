use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::player::{Player, PlayerId};

/// One pot: its chips, who can win it, and (after showdown) who did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pot {
    pub amount: u32,
    pub contributors: BTreeSet<PlayerId>,
    pub winners: BTreeSet<PlayerId>,
}

/// Rebuild the pot list from per-player committed chips and all-in markers.
///
/// All-in totals form the pot caps, sorted ascending so pot identities are
/// deterministic. Each capped pot takes every player's bet slice between the
/// previous cap and its own (folded chips stay in whatever pots they
/// reached), while the contributor set holds only the unfolded players who
/// met the cap. The final pot is the still-open one for players who are not
/// all-in; it may be empty.
///
/// The sum of pot amounts always equals the sum of `total_bet` over all
/// players, and the rebuild is a pure function of the player list, so running
/// it twice in a row changes nothing.
pub fn rebuild(players: &[Player]) -> Vec<Pot> {
    let mut caps: Vec<u32> = players
        .iter()
        .filter(|p| p.has_all_in && !p.is_eliminated && p.total_bet > 0)
        .map(|p| p.total_bet)
        .collect();
    caps.sort_unstable();
    caps.dedup();

    let mut pots = Vec::with_capacity(caps.len() + 1);
    let mut prev = 0u32;
    for cap in caps {
        let amount = players
            .iter()
            .map(|p| p.total_bet.min(cap).saturating_sub(prev))
            .sum();
        let contributors = players
            .iter()
            .filter(|p| p.in_hand() && p.total_bet >= cap)
            .map(|p| p.id.clone())
            .collect();
        pots.push(Pot {
            amount,
            contributors,
            winners: BTreeSet::new(),
        });
        prev = cap;
    }

    // The open pot for players still able to bet.
    let amount = players
        .iter()
        .map(|p| p.total_bet.saturating_sub(prev))
        .sum();
    let contributors = players
        .iter()
        .filter(|p| p.in_hand() && !p.has_all_in)
        .map(|p| p.id.clone())
        .collect();
    pots.push(Pot {
        amount,
        contributors,
        winners: BTreeSet::new(),
    });
    pots
}

/// Split `amount` between `winners`, odd chips one-by-one to the earliest
/// winners in the given order. The order is the seating walk starting
/// clockwise from the small blind, so the allocation is deterministic.
pub fn split(amount: u32, winners: &[PlayerId]) -> Vec<(PlayerId, u32)> {
    let n = winners.len() as u32;
    if n == 0 {
        return Vec::new();
    }
    let share = amount / n;
    let remainder = (amount % n) as usize;
    winners
        .iter()
        .enumerate()
        .map(|(i, id)| (id.clone(), share + u32::from(i < remainder)))
        .collect()
}
