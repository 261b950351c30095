use serde::{Deserialize, Serialize};

use crate::cards::Card;

pub type PlayerId = String;

/// The most recent thing a player did, as shown in snapshots. Blind posts are
/// recorded here too so clients can label the forced bets.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, Default)]
pub enum LastAction {
    #[default]
    #[serde(rename = "none")]
    None,
    #[serde(rename = "check")]
    Check,
    #[serde(rename = "call")]
    Call,
    #[serde(rename = "raise")]
    Raise,
    #[serde(rename = "fold")]
    Fold,
    #[serde(rename = "allin")]
    AllIn,
    #[serde(rename = "SB")]
    SmallBlind,
    #[serde(rename = "BB")]
    BigBlind,
}

/// An action a seat may legally submit right now.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    Check,
    Call,
    Raise,
    AllIn,
    Fold,
}

/// A seated tournament player.
///
/// Serializes with the wire field names clients expect (`lastAction`,
/// `hasFolded`, ...). The public table snapshot carries this struct with the
/// hole cards stripped; the private per-player view includes them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    pub id: PlayerId,
    pub chips: u32,
    /// Hole cards: empty between hands, two while a hand is live.
    #[serde(default)]
    pub cards: Vec<Card>,
    #[serde(default)]
    pub last_action: LastAction,
    #[serde(default)]
    pub available_actions: Vec<ActionKind>,
    /// Size of the most recent contribution; on a raise submission this is
    /// the raise increment above the call.
    #[serde(default)]
    pub last_bet: u32,
    /// Chips committed to the pots this hand.
    #[serde(default)]
    pub total_bet: u32,
    /// Chips still owed to match the biggest bet this round.
    #[serde(default)]
    pub call_amount: u32,
    #[serde(default)]
    pub has_folded: bool,
    #[serde(default)]
    pub has_all_in: bool,
    #[serde(default)]
    pub is_eliminated: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hand_score: Option<u32>,
    #[serde(default)]
    pub winnings: u32,
}

impl Player {
    pub fn new(id: impl Into<PlayerId>, chips: u32) -> Self {
        Self {
            id: id.into(),
            chips,
            cards: Vec::new(),
            last_action: LastAction::None,
            available_actions: Vec::new(),
            last_bet: 0,
            total_bet: 0,
            call_amount: 0,
            has_folded: false,
            has_all_in: false,
            is_eliminated: false,
            hand_score: None,
            winnings: 0,
        }
    }

    /// Still contesting the current hand.
    pub fn in_hand(&self) -> bool {
        !self.has_folded && !self.is_eliminated
    }

    /// Still owes actions in the current betting round.
    pub fn is_active(&self) -> bool {
        self.in_hand() && !self.has_all_in
    }

    /// Move up to `amount` chips into this hand's committed total. A player
    /// drained to zero chips by a commit is all-in. Returns the chips moved.
    pub fn commit(&mut self, amount: u32) -> u32 {
        let moved = amount.min(self.chips);
        self.chips -= moved;
        self.total_bet += moved;
        if self.chips == 0 && moved > 0 {
            self.has_all_in = true;
        }
        moved
    }

    /// Reset the per-hand fields. Chips and elimination state survive.
    pub fn reset_for_hand(&mut self) {
        self.cards.clear();
        self.last_action = LastAction::None;
        self.available_actions.clear();
        self.last_bet = 0;
        self.total_bet = 0;
        self.call_amount = 0;
        self.has_folded = false;
        self.has_all_in = false;
        self.hand_score = None;
        self.winnings = 0;
    }

    /// Copy with hole cards stripped, safe for the public snapshot.
    pub fn public_view(&self) -> Player {
        let mut p = self.clone();
        p.cards.clear();
        p
    }
}
