use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;

use crate::cards::{full_deck, Card};
use crate::tiebreak::{DrawSource, DrawnItem};

/// A 52-card deck backed by a seeded ChaCha20 stream so dealer selection can be replayed.
#[derive(Debug)]
pub struct Deck {
    cards: Vec<Card>,
    position: usize,
    rng: ChaCha20Rng,
}

impl Deck {
    pub fn new_with_seed(seed: u64) -> Self {
        // Keep initial order until shuffle is called explicitly
        Self {
            cards: full_deck(),
            position: 0,
            rng: ChaCha20Rng::seed_from_u64(seed),
        }
    }

    /// Restores all 52 cards and shuffles them.
    pub fn shuffle(&mut self) {
        self.cards = full_deck();
        self.cards.shuffle(&mut self.rng);
        self.position = 0;
    }

    pub fn deal_card(&mut self) -> Option<Card> {
        let card = self.cards.get(self.position).copied()?;
        self.position += 1;
        Some(card)
    }

    pub fn remaining(&self) -> usize {
        self.cards.len().saturating_sub(self.position)
    }
}

impl DrawSource for Deck {
    fn reset(&mut self) {
        self.shuffle();
    }

    fn draw(&mut self) -> Option<DrawnItem> {
        self.deal_card().map(DrawnItem::Card)
    }
}
