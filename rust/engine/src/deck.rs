use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;

use crate::cards::{full_deck, Card};
use crate::errors::EngineError;

/// A shuffled deck backed by a seeded RNG. The same seed always yields the
/// same permutation, which is what makes deal retries reproducible.
#[derive(Debug)]
pub struct Deck {
    cards: Vec<Card>,
    position: usize,
    rng: ChaCha20Rng,
}

impl Deck {
    /// A deck in canonical order; call [`Deck::shuffle`] before dealing.
    pub fn new_with_seed(seed: u64) -> Self {
        Self {
            cards: full_deck(),
            position: 0,
            rng: ChaCha20Rng::seed_from_u64(seed),
        }
    }

    /// Fisher-Yates over a fresh 52-card deck.
    pub fn shuffle(&mut self) {
        self.cards = full_deck();
        self.cards.shuffle(&mut self.rng);
        self.position = 0;
    }

    pub fn deal_card(&mut self) -> Option<Card> {
        if self.position >= self.cards.len() {
            None
        } else {
            let c = self.cards[self.position];
            self.position += 1;
            Some(c)
        }
    }

    pub fn remaining(&self) -> usize {
        self.cards.len().saturating_sub(self.position)
    }
}

/// Every card one hand will need, drawn up front from the hand seed: two hole
/// cards per seat dealt, then flop, turn and river, with no burns.
///
/// The orchestrator captures a seed when the hand starts and regenerates the
/// identical deal from it on retry, so dealing is an idempotent step. Streets
/// are revealed to the table later, one stage at a time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandDeal {
    /// Hole cards in the order the seats were dealt.
    pub holes: Vec<[Card; 2]>,
    pub flop: [Card; 3],
    pub turn: Card,
    pub river: Card,
}

impl HandDeal {
    /// Draw a complete deal for `hands` seats from `seed`.
    pub fn from_seed(seed: u64, hands: usize) -> Result<Self, EngineError> {
        if hands * 2 + 5 > 52 {
            return Err(EngineError::DeckExhausted);
        }
        let mut deck = Deck::new_with_seed(seed);
        deck.shuffle();

        let mut holes = Vec::with_capacity(hands);
        for _ in 0..hands {
            let a = deck.deal_card().ok_or(EngineError::DeckExhausted)?;
            let b = deck.deal_card().ok_or(EngineError::DeckExhausted)?;
            holes.push([a, b]);
        }
        let mut draw = || deck.deal_card().ok_or(EngineError::DeckExhausted);
        let flop = [draw()?, draw()?, draw()?];
        let turn = draw()?;
        let river = draw()?;
        Ok(Self {
            holes,
            flop,
            turn,
            river,
        })
    }

    /// All cards of the deal, used to assert distinctness in tests.
    pub fn all_cards(&self) -> Vec<Card> {
        let mut v: Vec<Card> = self.holes.iter().flatten().copied().collect();
        v.extend_from_slice(&self.flop);
        v.push(self.turn);
        v.push(self.river);
        v
    }
}
