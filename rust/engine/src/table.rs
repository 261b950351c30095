use serde::{Deserialize, Serialize};

use crate::cards::Card;
use crate::deck::HandDeal;
use crate::errors::EngineError;
use crate::hand::{self, HandStrength};
use crate::log::ActionRecord;
use crate::player::{LastAction, Player, PlayerId};
use crate::pot::{self, Pot};
use crate::rules::{self, ValidatedAction};

/// Stage of the per-table state machine. Wire names are camelCase
/// (`"preFlop"`, `"showdownFoldout"`, ...).
#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Stage {
    Idle,
    Dealing,
    PreFlop,
    Flop,
    Turn,
    River,
    Showdown,
    ShowdownFoldout,
    FinishTable,
    FinishTournament,
}

/// Outcome of applying one validated action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Applied {
    /// True when the action re-opened the round (a raise, or an all-in that
    /// exceeded the biggest bet). Everyone else owes a response again.
    pub reopened: bool,
}

/// The authoritative per-table record.
///
/// Seating order in `players` determines action order and blind rotation.
/// All mutators are synchronous and address seats by index; the async
/// betting controller owns the table for the duration of a round and never
/// holds a player reference across a suspension point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Table {
    pub id: String,
    pub players: Vec<Player>,
    #[serde(rename = "currentSB")]
    pub current_sb: Option<PlayerId>,
    #[serde(rename = "currentBB")]
    pub current_bb: Option<PlayerId>,
    /// Big blind size; also the minimum raise increment.
    pub bb_value: u32,
    /// Largest `totalBet` among unfolded players this round. Always derived,
    /// never assigned from a blind branch.
    pub biggest_bet: u32,
    pub current_stage: Stage,
    pub flop: Vec<Card>,
    pub turn: Option<Card>,
    pub river: Option<Card>,
    pub pots: Vec<Pot>,
    pub current_turn: Option<PlayerId>,
    /// Unix-seconds deadline for the seat currently acting.
    pub end_time: i64,
    /// Hands completed at this table.
    pub round: u32,
    pub players_acted_in_round: u32,
    pub last_raiser_index: Option<usize>,
    pub turn_seconds: u64,
    /// Winners of the most recent hand.
    pub winners: Vec<PlayerId>,
    pub last_table: bool,
    pub table_ends: bool,
    /// Seed the current hand's deal was drawn from. Never serialized: with
    /// the seed a client could reconstruct the whole deck.
    #[serde(skip)]
    pub hand_seed: u64,
    /// Action history of the current hand, for the hand record.
    #[serde(skip)]
    pub action_history: Vec<ActionRecord>,
}

impl Table {
    pub fn new(id: impl Into<String>, bb_value: u32, turn_seconds: u64) -> Self {
        Self {
            id: id.into(),
            players: Vec::new(),
            current_sb: None,
            current_bb: None,
            bb_value,
            biggest_bet: 0,
            current_stage: Stage::Idle,
            flop: Vec::new(),
            turn: None,
            river: None,
            pots: Vec::new(),
            current_turn: None,
            end_time: 0,
            round: 0,
            players_acted_in_round: 0,
            last_raiser_index: None,
            turn_seconds,
            winners: Vec::new(),
            last_table: false,
            table_ends: false,
            hand_seed: 0,
            action_history: Vec::new(),
        }
    }

    pub fn seat(&mut self, player: Player) {
        self.players.push(player);
    }

    pub fn seat_index(&self, id: &str) -> Option<usize> {
        self.players.iter().position(|p| p.id == id)
    }

    pub fn player(&self, seat: usize) -> Result<&Player, EngineError> {
        self.players.get(seat).ok_or(EngineError::BadSeat(seat))
    }

    /// Seats not yet eliminated from the tournament.
    pub fn active_players(&self) -> usize {
        self.players.iter().filter(|p| !p.is_eliminated).count()
    }

    /// Seats still contesting the current hand.
    pub fn in_hand_players(&self) -> usize {
        self.players.iter().filter(|p| p.in_hand()).count()
    }

    /// Seats that still owe actions this round.
    pub fn actionable_players(&self) -> usize {
        self.players.iter().filter(|p| p.is_active()).count()
    }

    /// All but one player has folded.
    pub fn fold_out(&self) -> bool {
        self.in_hand_players() <= 1
    }

    /// Walk the seating cyclically from `start`, returning the first seat
    /// whose player satisfies `pred`.
    pub fn next_seat_where(
        &self,
        start: usize,
        pred: impl Fn(&Player) -> bool,
    ) -> Option<usize> {
        let n = self.players.len();
        if n == 0 {
            return None;
        }
        (0..n).map(|k| (start + k) % n).find(|&i| pred(&self.players[i]))
    }

    /// Pre-flop action starts one seat past the big blind.
    pub fn first_to_act_preflop(&self) -> Result<Option<usize>, EngineError> {
        let bb = self.blind_seat(self.current_bb.as_deref(), "big")?;
        Ok(self.next_seat_where(bb + 1, Player::is_active))
    }

    /// Post-flop action starts at the big blind seat itself (heads-up this
    /// puts the big blind first, as it should be).
    pub fn first_to_act_postflop(&self) -> Result<Option<usize>, EngineError> {
        let bb = self.blind_seat(self.current_bb.as_deref(), "big")?;
        Ok(self.next_seat_where(bb, Player::is_active))
    }

    fn blind_seat(&self, id: Option<&str>, which: &'static str) -> Result<usize, EngineError> {
        id.and_then(|id| self.seat_index(id))
            .ok_or(EngineError::MissingBlind(which))
    }

    /// Advance the blinds to the next two non-eliminated seats; on the first
    /// hand, seed them from the start of the seating.
    pub fn rotate_blinds(&mut self) -> Result<(), EngineError> {
        let alive = self.active_players();
        if alive < 2 {
            return Err(EngineError::TooFewPlayers(alive));
        }
        let not_out = |p: &Player| !p.is_eliminated;
        let sb = match self.current_sb.as_deref().and_then(|id| self.seat_index(id)) {
            Some(old) => self
                .next_seat_where(old + 1, not_out)
                .ok_or(EngineError::TooFewPlayers(alive))?,
            None => self
                .next_seat_where(0, not_out)
                .ok_or(EngineError::TooFewPlayers(alive))?,
        };
        let bb = self
            .next_seat_where(sb + 1, not_out)
            .ok_or(EngineError::TooFewPlayers(alive))?;
        self.current_sb = Some(self.players[sb].id.clone());
        self.current_bb = Some(self.players[bb].id.clone());
        Ok(())
    }

    /// Commit the forced bets. A short stack posts everything it has and is
    /// all-in; `biggest_bet` and the call amounts are derived afterwards.
    pub fn post_blinds(&mut self) -> Result<(), EngineError> {
        let sb = self.blind_seat(self.current_sb.as_deref(), "small")?;
        let bb = self.blind_seat(self.current_bb.as_deref(), "big")?;

        let small = self.bb_value / 2;
        let moved = self.players[sb].commit(small);
        self.players[sb].last_action = LastAction::SmallBlind;
        self.players[sb].last_bet = moved;
        self.record(sb, LastAction::SmallBlind, moved);

        let moved = self.players[bb].commit(self.bb_value);
        self.players[bb].last_action = LastAction::BigBlind;
        self.players[bb].last_bet = moved;
        self.record(bb, LastAction::BigBlind, moved);

        self.derive_biggest_bet();
        self.recompute_call_amounts();
        Ok(())
    }

    /// `biggest_bet` is the maximum committed total among unfolded players.
    pub fn derive_biggest_bet(&mut self) {
        self.biggest_bet = self
            .players
            .iter()
            .filter(|p| p.in_hand())
            .map(|p| p.total_bet)
            .max()
            .unwrap_or(0);
    }

    /// Refresh what every still-acting player owes against the biggest bet.
    pub fn recompute_call_amounts(&mut self) {
        for p in &mut self.players {
            if p.is_active() {
                p.call_amount = self.biggest_bet.saturating_sub(p.total_bet);
            } else {
                p.call_amount = 0;
            }
        }
    }

    /// Store the legal actions on the seat about to act, for the snapshot.
    pub fn set_available_actions(&mut self, seat: usize) -> Result<(), EngineError> {
        let actions = rules::available_actions(self.player(seat)?, self.bb_value);
        self.players[seat].available_actions = actions;
        Ok(())
    }

    /// Apply a validated action to the seat. Chip movement, re-open
    /// bookkeeping and the action history all happen here, atomically from
    /// the controller's point of view.
    pub fn apply(&mut self, seat: usize, action: ValidatedAction) -> Result<Applied, EngineError> {
        if seat >= self.players.len() {
            return Err(EngineError::BadSeat(seat));
        }
        let mut reopened = false;
        match action {
            ValidatedAction::Check => {
                self.players[seat].last_action = LastAction::Check;
                self.players[seat].last_bet = 0;
                self.players_acted_in_round += 1;
                self.record(seat, LastAction::Check, 0);
            }
            ValidatedAction::Fold => {
                self.players[seat].has_folded = true;
                self.players[seat].last_action = LastAction::Fold;
                self.players[seat].last_bet = 0;
                self.players[seat].call_amount = 0;
                self.players_acted_in_round += 1;
                self.record(seat, LastAction::Fold, 0);
            }
            ValidatedAction::Call => {
                let owed = self.players[seat].call_amount;
                let moved = self.players[seat].commit(owed);
                self.players[seat].last_action = LastAction::Call;
                self.players[seat].last_bet = moved;
                self.players_acted_in_round += 1;
                self.record(seat, LastAction::Call, moved);
            }
            ValidatedAction::Raise(size) => {
                let owed = self.players[seat].call_amount;
                let moved = self.players[seat].commit(owed + size);
                self.players[seat].last_action = LastAction::Raise;
                self.players[seat].last_bet = size;
                self.reopen(seat);
                reopened = true;
                self.record(seat, LastAction::Raise, moved);
            }
            ValidatedAction::AllIn => {
                let prior_biggest = self.biggest_bet;
                let stake = self.players[seat].chips;
                let moved = self.players[seat].commit(stake);
                self.players[seat].last_action = LastAction::AllIn;
                self.players[seat].last_bet = moved;
                if self.players[seat].total_bet > prior_biggest {
                    // A short of the biggest bet calls; above it, it raises.
                    self.reopen(seat);
                    reopened = true;
                } else {
                    self.players_acted_in_round += 1;
                }
                self.record(seat, LastAction::AllIn, moved);
            }
        }
        self.derive_biggest_bet();
        self.recompute_call_amounts();
        Ok(Applied { reopened })
    }

    /// Raise bookkeeping: the raiser is the only seat to have acted in the
    /// re-opened round, and everyone still able to act owes a response.
    fn reopen(&mut self, seat: usize) {
        self.last_raiser_index = Some(seat);
        self.players_acted_in_round = 1;
        for (i, p) in self.players.iter_mut().enumerate() {
            if i != seat && p.is_active() {
                p.last_action = LastAction::None;
            }
        }
    }

    fn record(&mut self, seat: usize, action: LastAction, amount: u32) {
        self.action_history.push(ActionRecord {
            player_id: self.players[seat].id.clone(),
            stage: self.current_stage,
            action,
            amount,
        });
    }

    /// Recompute main and side pots from the committed chips.
    pub fn rebuild_pots(&mut self) {
        self.pots = pot::rebuild(&self.players);
    }

    /// Hand out hole cards to every non-eliminated seat, in seating order.
    /// The deal must have been drawn for exactly that many seats.
    pub fn deal_from(&mut self, deal: &HandDeal) -> Result<(), EngineError> {
        let dealt = self.active_players();
        if deal.holes.len() != dealt {
            return Err(EngineError::TooFewPlayers(deal.holes.len()));
        }
        let mut next = 0;
        for p in &mut self.players {
            if p.is_eliminated {
                continue;
            }
            p.cards = deal.holes[next].to_vec();
            next += 1;
        }
        Ok(())
    }

    pub fn reveal_flop(&mut self, deal: &HandDeal) {
        self.flop = deal.flop.to_vec();
    }

    pub fn reveal_turn(&mut self, deal: &HandDeal) {
        self.turn = Some(deal.turn);
    }

    pub fn reveal_river(&mut self, deal: &HandDeal) {
        self.river = Some(deal.river);
    }

    pub fn community_cards(&self) -> Vec<Card> {
        let mut cards = self.flop.clone();
        cards.extend(self.turn);
        cards.extend(self.river);
        cards
    }

    /// Showdown: score every unfolded hand, pick each pot's winners among its
    /// contributors, split ties with odd chips walking clockwise from the
    /// small blind, then credit the winnings.
    pub fn award_pots(&mut self) -> Result<(), EngineError> {
        let community = self.community_cards();
        let mut strengths: Vec<Option<HandStrength>> = vec![None; self.players.len()];
        for (i, p) in self.players.iter_mut().enumerate() {
            if p.in_hand() && p.cards.len() == 2 {
                let mut cards = p.cards.clone();
                cards.extend(community.iter().copied());
                let strength = hand::evaluate(&cards)?;
                p.hand_score = Some(strength.score());
                strengths[i] = Some(strength);
            }
        }

        let n = self.players.len();
        let anchor = self
            .current_sb
            .as_deref()
            .and_then(|id| self.seat_index(id))
            .unwrap_or(0);
        let order: Vec<usize> = (0..n).map(|k| (anchor + k) % n).collect();

        self.winners.clear();
        let mut pots = std::mem::take(&mut self.pots);
        for pot in &mut pots {
            if pot.amount == 0 {
                continue;
            }
            let contenders: Vec<usize> = order
                .iter()
                .copied()
                .filter(|&i| {
                    strengths[i].is_some() && pot.contributors.contains(&self.players[i].id)
                })
                .collect();
            let Some(best) = contenders.iter().filter_map(|&i| strengths[i]).max() else {
                continue;
            };
            let winner_ids: Vec<PlayerId> = contenders
                .iter()
                .copied()
                .filter(|&i| strengths[i] == Some(best))
                .map(|i| self.players[i].id.clone())
                .collect();
            for (id, share) in pot::split(pot.amount, &winner_ids) {
                if let Some(i) = self.seat_index(&id) {
                    self.players[i].winnings += share;
                }
            }
            for id in winner_ids {
                pot.winners.insert(id.clone());
                if !self.winners.contains(&id) {
                    self.winners.push(id);
                }
            }
            pot.amount = 0;
        }
        self.pots = pots;

        for p in &mut self.players {
            p.chips += p.winnings;
        }
        Ok(())
    }

    /// Everyone else folded: the survivor collects every pot without a
    /// reveal. Returns the winner's id.
    pub fn award_fold_out(&mut self) -> Result<PlayerId, EngineError> {
        let seat = self
            .players
            .iter()
            .position(Player::in_hand)
            .ok_or(EngineError::TooFewPlayers(0))?;
        let total: u32 = self.pots.iter().map(|p| p.amount).sum();
        let id = self.players[seat].id.clone();
        self.players[seat].winnings += total;
        self.players[seat].chips += total;
        for pot in &mut self.pots {
            if pot.amount > 0 {
                pot.winners.insert(id.clone());
                pot.amount = 0;
            }
        }
        self.winners = vec![id.clone()];
        Ok(id)
    }

    /// Flag every broke seat as eliminated; returns the newly eliminated ids
    /// in seating order. Runs at hand boundaries only, so an all-in player
    /// who doubled up is untouched.
    pub fn mark_eliminated(&mut self) -> Vec<PlayerId> {
        let mut out = Vec::new();
        for p in &mut self.players {
            if !p.is_eliminated && p.chips == 0 {
                p.is_eliminated = true;
                out.push(p.id.clone());
            }
        }
        out
    }

    /// Reset every per-hand field, player and table alike. Blinds, chips,
    /// round counter and elimination flags survive.
    pub fn clear_for_next_hand(&mut self) {
        for p in &mut self.players {
            p.reset_for_hand();
        }
        self.biggest_bet = 0;
        self.flop.clear();
        self.turn = None;
        self.river = None;
        self.pots.clear();
        self.current_turn = None;
        self.end_time = 0;
        self.players_acted_in_round = 0;
        self.last_raiser_index = None;
        self.winners.clear();
        self.action_history.clear();
        self.current_stage = Stage::Idle;
    }

    /// The broadcast form of the table: every seat's hole cards stripped.
    pub fn public_view(&self) -> Table {
        let mut t = self.clone();
        t.players = self.players.iter().map(Player::public_view).collect();
        t
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::RngCore;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    fn table_with(stacks: &[u32], bb_value: u32) -> Table {
        let mut t = Table::new("t1", bb_value, 30);
        for (i, &chips) in stacks.iter().enumerate() {
            t.seat(Player::new(format!("p{}", i + 1), chips));
        }
        t
    }

    fn start_hand(t: &mut Table) {
        t.current_stage = Stage::PreFlop;
        t.rotate_blinds().unwrap();
        t.post_blinds().unwrap();
        t.rebuild_pots();
    }

    fn assert_invariants(t: &Table, bankroll: &[u32]) {
        // Chips only move into pots within a hand.
        for (p, &start) in t.players.iter().zip(bankroll) {
            assert_eq!(p.chips + p.total_bet, start, "conservation for {}", p.id);
        }
        // Committed chips and pot contents agree.
        let committed: u32 = t.players.iter().map(|p| p.total_bet).sum();
        let potted: u32 = t.pots.iter().map(|p| p.amount).sum();
        assert_eq!(committed, potted);
        // biggest_bet is derived.
        let max_bet = t
            .players
            .iter()
            .filter(|p| p.in_hand())
            .map(|p| p.total_bet)
            .max()
            .unwrap_or(0);
        assert_eq!(t.biggest_bet, max_bet);
        // All-in means felted.
        for p in &t.players {
            if p.has_all_in {
                assert_eq!(p.chips, 0);
            }
        }
    }

    #[test]
    fn blinds_rotate_over_non_eliminated_seats() {
        let mut t = table_with(&[1_000, 1_000, 1_000], 100);
        t.rotate_blinds().unwrap();
        assert_eq!(t.current_sb.as_deref(), Some("p1"));
        assert_eq!(t.current_bb.as_deref(), Some("p2"));

        t.rotate_blinds().unwrap();
        assert_eq!(t.current_sb.as_deref(), Some("p2"));
        assert_eq!(t.current_bb.as_deref(), Some("p3"));

        t.players[0].is_eliminated = true;
        t.rotate_blinds().unwrap();
        assert_eq!(t.current_sb.as_deref(), Some("p3"));
        assert_eq!(t.current_bb.as_deref(), Some("p2"));
    }

    #[test]
    fn posting_blinds_sets_call_amounts() {
        let mut t = table_with(&[1_000, 1_000], 100);
        start_hand(&mut t);
        assert_eq!(t.players[0].total_bet, 50);
        assert_eq!(t.players[1].total_bet, 100);
        assert_eq!(t.biggest_bet, 100);
        assert_eq!(t.players[0].call_amount, 50);
        assert_eq!(t.players[1].call_amount, 0);
        assert_invariants(&t, &[1_000, 1_000]);
    }

    #[test]
    fn short_stacked_blind_posts_everything_and_is_all_in() {
        let mut t = table_with(&[30, 1_000], 100);
        start_hand(&mut t);
        assert_eq!(t.players[0].total_bet, 30);
        assert!(t.players[0].has_all_in);
        assert_eq!(t.biggest_bet, 100);
        assert_invariants(&t, &[30, 1_000]);
    }

    #[test]
    fn heads_up_action_order() {
        let mut t = table_with(&[1_000, 1_000], 100);
        start_hand(&mut t);
        // SB (seat 0) speaks first pre-flop, BB (seat 1) first post-flop.
        assert_eq!(t.first_to_act_preflop().unwrap(), Some(0));
        assert_eq!(t.first_to_act_postflop().unwrap(), Some(1));
    }

    #[test]
    fn three_handed_action_order() {
        let mut t = table_with(&[1_000, 1_000, 1_000], 100);
        start_hand(&mut t);
        // SB p1, BB p2: seat after the BB opens pre-flop.
        assert_eq!(t.first_to_act_preflop().unwrap(), Some(2));
        assert_eq!(t.first_to_act_postflop().unwrap(), Some(1));
    }

    #[test]
    fn raise_reopens_and_clears_other_last_actions() {
        let mut t = table_with(&[1_000, 1_000, 1_000], 100);
        start_hand(&mut t);
        t.apply(2, ValidatedAction::Call).unwrap();
        assert_eq!(t.players_acted_in_round, 1); // blinds are not actions

        let applied = t.apply(0, ValidatedAction::Raise(200)).unwrap();
        assert!(applied.reopened);
        assert_eq!(t.last_raiser_index, Some(0));
        assert_eq!(t.players_acted_in_round, 1);
        assert_eq!(t.players[0].total_bet, 300);
        assert_eq!(t.biggest_bet, 300);
        assert_eq!(t.players[1].last_action, LastAction::None);
        assert_eq!(t.players[2].last_action, LastAction::None);
        assert_eq!(t.players[1].call_amount, 200);
        assert_eq!(t.players[2].call_amount, 200);
        t.rebuild_pots();
        assert_invariants(&t, &[1_000, 1_000, 1_000]);
    }

    #[test]
    fn all_in_below_biggest_bet_does_not_reopen() {
        let mut t = table_with(&[1_000, 1_000, 80], 100);
        start_hand(&mut t);
        let applied = t.apply(2, ValidatedAction::AllIn).unwrap();
        assert!(!applied.reopened);
        assert!(t.players[2].has_all_in);
        assert_eq!(t.biggest_bet, 100);
    }

    #[test]
    fn all_in_above_biggest_bet_reopens() {
        let mut t = table_with(&[1_000, 1_000, 400], 100);
        start_hand(&mut t);
        let applied = t.apply(2, ValidatedAction::AllIn).unwrap();
        assert!(applied.reopened);
        assert_eq!(t.biggest_bet, 400);
        assert_eq!(t.last_raiser_index, Some(2));
    }

    #[test]
    fn scripted_random_rounds_hold_the_invariants() {
        // Deterministic pseudo-random action sequences over many seeds; the
        // invariants must hold after every single action.
        for seed in 0..20u64 {
            let bankroll = [1_000, 700, 350, 90];
            let mut t = table_with(&bankroll, 50);
            start_hand(&mut t);
            let mut rng = ChaCha20Rng::seed_from_u64(seed);
            let mut seat = t.first_to_act_preflop().unwrap().unwrap();
            for _ in 0..40 {
                if t.fold_out() || t.actionable_players() == 0 {
                    break;
                }
                if !t.players[seat].is_active() {
                    seat = (seat + 1) % t.players.len();
                    continue;
                }
                let actions = rules::available_actions(&t.players[seat], t.bb_value);
                let pick = actions[(rng.next_u32() as usize) % actions.len()];
                let action = match pick {
                    crate::player::ActionKind::Check => ValidatedAction::Check,
                    crate::player::ActionKind::Call => ValidatedAction::Call,
                    crate::player::ActionKind::Raise => ValidatedAction::Raise(t.bb_value),
                    crate::player::ActionKind::AllIn => ValidatedAction::AllIn,
                    crate::player::ActionKind::Fold => ValidatedAction::Fold,
                };
                t.apply(seat, action).unwrap();
                t.rebuild_pots();
                assert_invariants(&t, &bankroll);
                seat = (seat + 1) % t.players.len();
            }
        }
    }

    #[test]
    fn side_pots_award_to_the_right_contenders() {
        // a is all-in short; b and c bet on; contrived scores decide pots.
        let mut t = table_with(&[100, 500, 500], 20);
        start_hand(&mut t);
        // p3 calls 20, p1 (SB) shoves 100, p2 and p3 call 100.
        t.apply(2, ValidatedAction::Call).unwrap();
        t.apply(0, ValidatedAction::AllIn).unwrap();
        t.apply(1, ValidatedAction::Call).unwrap();
        t.apply(2, ValidatedAction::Call).unwrap();
        t.rebuild_pots();
        assert_eq!(t.pots.len(), 2);
        assert_eq!(t.pots[0].amount, 300);
        assert_eq!(t.pots[0].contributors.len(), 3);
        assert_eq!(t.pots[1].amount, 0);
        assert_invariants(&t, &[100, 500, 500]);
    }

    #[test]
    fn fold_out_award_returns_every_committed_chip() {
        let mut t = table_with(&[500, 300], 100);
        start_hand(&mut t);
        t.apply(0, ValidatedAction::Fold).unwrap();
        t.rebuild_pots();
        assert!(t.fold_out());
        let winner = t.award_fold_out().unwrap();
        assert_eq!(winner, "p2");
        assert_eq!(t.players[1].chips, 350);
        assert_eq!(t.players[0].chips, 450);
        assert_eq!(t.winners, vec!["p2".to_string()]);
    }

    #[test]
    fn clear_for_next_hand_resets_per_hand_state() {
        let mut t = table_with(&[1_000, 1_000], 100);
        start_hand(&mut t);
        t.apply(0, ValidatedAction::Call).unwrap();
        t.rebuild_pots();
        t.clear_for_next_hand();
        assert_eq!(t.current_stage, Stage::Idle);
        assert!(t.pots.is_empty());
        assert_eq!(t.biggest_bet, 0);
        for p in &t.players {
            assert_eq!(p.total_bet, 0);
            assert_eq!(p.call_amount, 0);
            assert_eq!(p.last_action, LastAction::None);
            assert!(p.cards.is_empty());
        }
        // Blinds survive for the next rotation.
        assert_eq!(t.current_sb.as_deref(), Some("p1"));
    }

    #[test]
    fn table_round_trips_through_json_without_the_seed() {
        let mut t = table_with(&[1_000, 1_000], 100);
        t.hand_seed = 0xDEAD_BEEF;
        start_hand(&mut t);
        let json = serde_json::to_string(&t).unwrap();
        assert!(json.contains(r#""currentSB":"p1""#));
        assert!(json.contains(r#""currentStage":"preFlop""#));
        assert!(!json.contains("handSeed"));
        assert!(!json.contains("hand_seed"));

        let back: Table = serde_json::from_str(&json).unwrap();
        assert_eq!(back.hand_seed, 0);
        assert_eq!(back.players, t.players);
        assert_eq!(back.current_stage, t.current_stage);
    }

    #[test]
    fn public_view_strips_hole_cards_everywhere() {
        let mut t = table_with(&[1_000, 1_000], 100);
        let deal = crate::deck::HandDeal::from_seed(5, 2).unwrap();
        t.deal_from(&deal).unwrap();
        let public = t.public_view();
        assert!(public.players.iter().all(|p| p.cards.is_empty()));
        assert!(t.players.iter().all(|p| p.cards.len() == 2));
    }
}
