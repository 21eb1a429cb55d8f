//! Recursive elimination among tied participants.
//!
//! Each round deals one item (card or die) to every candidate from a freshly reset
//! source. A unique highest draw wins; otherwise only the tied leaders advance to the
//! next round. The same protocol picks the dealer and settles roll-offs.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::cards::Card;

/// Upper bound on rounds before the protocol falls back to the first remaining candidate.
pub const MAX_TIE_BREAK_ROUNDS: u32 = 64;

/// Something dealt to a candidate during a tie-break round.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum DrawnItem {
    Card(Card),
    Die(u8),
}

impl DrawnItem {
    /// Comparison value shared by every draw source: card rank (Ace high) or die face.
    pub fn strength(&self) -> u8 {
        match self {
            DrawnItem::Card(c) => c.rank.value(),
            DrawnItem::Die(face) => *face,
        }
    }
}

impl fmt::Display for DrawnItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DrawnItem::Card(c) => write!(f, "{}", c),
            DrawnItem::Die(face) => write!(f, "[{}]", face),
        }
    }
}

/// Where tie-break draws come from.
pub trait DrawSource {
    /// Called at the start of every round so each round draws from a fresh source.
    fn reset(&mut self);
    fn draw(&mut self) -> Option<DrawnItem>;
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TieBreakPhase {
    #[default]
    Idle,
    Announcing,
    Dealt,
    Revealed,
    Resolved,
}

#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct Draw {
    pub position: usize,
    pub item: DrawnItem,
}

#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct TieBreakRound {
    pub round_number: u32,
    pub draws: Vec<Draw>,
    /// Positions holding the highest draw of the round
    pub leaders: Vec<usize>,
}

/// Read-only snapshot of a tie-break in progress.
#[derive(Debug, Clone, Eq, PartialEq, Default, Serialize, Deserialize)]
pub struct TieBreakState {
    pub phase: TieBreakPhase,
    /// Positions still in contention
    pub candidates: Vec<usize>,
    pub round_number: u32,
    pub rounds: Vec<TieBreakRound>,
    pub winner: Option<usize>,
}

impl TieBreakState {
    pub fn cards_dealt(&self) -> usize {
        self.rounds.iter().map(|r| r.draws.len()).sum()
    }
}

#[derive(Debug, Clone)]
pub struct TieBreakResolver {
    state: TieBreakState,
    fallback: Option<usize>,
}

impl TieBreakResolver {
    /// Starts a resolver for `candidates` (positions).
    ///
    /// No candidates resolves straight to `fallback`; a single candidate wins without any
    /// draw. Both cases skip the protocol entirely.
    pub fn new(candidates: Vec<usize>, fallback: Option<usize>) -> Self {
        let mut state = TieBreakState {
            candidates,
            ..TieBreakState::default()
        };
        match state.candidates.len() {
            0 => {
                state.phase = TieBreakPhase::Resolved;
                state.winner = fallback;
            }
            1 => {
                state.phase = TieBreakPhase::Resolved;
                state.winner = state.candidates.first().copied();
            }
            _ => {}
        }
        Self { state, fallback }
    }

    pub fn state(&self) -> &TieBreakState {
        &self.state
    }

    pub fn into_state(self) -> TieBreakState {
        self.state
    }

    pub fn phase(&self) -> TieBreakPhase {
        self.state.phase
    }

    pub fn is_resolved(&self) -> bool {
        self.state.phase == TieBreakPhase::Resolved
    }

    pub fn winner(&self) -> Option<usize> {
        self.state.winner
    }

    /// Advances exactly one phase and returns the new phase.
    pub fn step(&mut self, source: &mut dyn DrawSource) -> TieBreakPhase {
        match self.state.phase {
            TieBreakPhase::Idle => self.announce(),
            TieBreakPhase::Announcing => self.deal(source),
            TieBreakPhase::Dealt => self.reveal(),
            TieBreakPhase::Revealed => self.settle(),
            TieBreakPhase::Resolved => {}
        }
        self.state.phase
    }

    /// Steps until a single winner remains.
    pub fn run(&mut self, source: &mut dyn DrawSource) -> Option<usize> {
        while !self.is_resolved() {
            self.step(source);
        }
        self.state.winner
    }

    fn announce(&mut self) {
        self.state.round_number += 1;
        self.state.phase = TieBreakPhase::Announcing;
        tracing::debug!(
            round = self.state.round_number,
            candidates = ?self.state.candidates,
            "tie-break round announced"
        );
    }

    fn deal(&mut self, source: &mut dyn DrawSource) {
        source.reset();
        let mut draws = Vec::with_capacity(self.state.candidates.len());
        for &position in &self.state.candidates {
            match source.draw() {
                Some(item) => draws.push(Draw { position, item }),
                None => {
                    tracing::warn!(
                        round = self.state.round_number,
                        "draw source exhausted during tie-break"
                    );
                    self.fall_back();
                    return;
                }
            }
        }
        self.state.rounds.push(TieBreakRound {
            round_number: self.state.round_number,
            draws,
            leaders: Vec::new(),
        });
        self.state.phase = TieBreakPhase::Dealt;
    }

    fn reveal(&mut self) {
        let Some(round) = self.state.rounds.last_mut() else {
            self.fall_back();
            return;
        };
        let best = round.draws.iter().map(|d| d.item.strength()).max();
        round.leaders = round
            .draws
            .iter()
            .filter(|d| Some(d.item.strength()) == best)
            .map(|d| d.position)
            .collect();
        self.state.candidates = round.leaders.clone();
        self.state.phase = TieBreakPhase::Revealed;
    }

    fn settle(&mut self) {
        if self.state.candidates.len() == 1 {
            self.state.winner = self.state.candidates.first().copied();
            self.state.phase = TieBreakPhase::Resolved;
        } else if self.state.round_number >= MAX_TIE_BREAK_ROUNDS {
            tracing::warn!(
                rounds = self.state.round_number,
                "tie-break did not converge"
            );
            self.fall_back();
        } else {
            self.announce();
        }
    }

    fn fall_back(&mut self) {
        self.state.winner = self.state.candidates.first().copied().or(self.fallback);
        self.state.phase = TieBreakPhase::Resolved;
    }
}
