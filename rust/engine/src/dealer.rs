//! Choosing who deals before a round: repeated high-card draws among tied candidates.

use serde::{Deserialize, Serialize};

use crate::seat::Table;
use crate::tiebreak::{DrawSource, TieBreakPhase, TieBreakResolver, TieBreakRound};

/// Transient record of dealer selection, discarded once the round is set up.
#[derive(Debug, Clone, Eq, PartialEq, Default, Serialize, Deserialize)]
pub struct DealerSelectionState {
    pub phase: TieBreakPhase,
    /// Draws per round, one entry per eligible candidate
    pub rounds: Vec<TieBreakRound>,
    pub round_number: u32,
    pub winner_position: Option<usize>,
}

#[derive(Debug, Clone)]
pub struct DealerSelection {
    resolver: TieBreakResolver,
}

impl DealerSelection {
    /// Candidates are the table's active seats; the fallback is the first participant.
    pub fn for_table(table: &Table) -> Self {
        Self::new(table.eligible_dealer_positions(), table.first_participant())
    }

    pub fn new(eligible: Vec<usize>, fallback: Option<usize>) -> Self {
        Self {
            resolver: TieBreakResolver::new(eligible, fallback),
        }
    }

    pub fn state(&self) -> DealerSelectionState {
        let tb = self.resolver.state();
        DealerSelectionState {
            phase: tb.phase,
            rounds: tb.rounds.clone(),
            round_number: tb.round_number,
            winner_position: tb.winner,
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.resolver.is_resolved()
    }

    pub fn step(&mut self, source: &mut dyn DrawSource) -> TieBreakPhase {
        self.resolver.step(source)
    }

    pub fn run(&mut self, source: &mut dyn DrawSource) -> Option<usize> {
        let winner = self.resolver.run(source);
        tracing::info!(
            winner = ?winner,
            rounds = self.resolver.state().round_number,
            "dealer selected"
        );
        winner
    }
}

/// Runs dealer selection for `table` to completion and returns the final record.
pub fn select_dealer(table: &Table, source: &mut dyn DrawSource) -> DealerSelectionState {
    let mut selection = DealerSelection::for_table(table);
    selection.run(source);
    selection.state()
}
