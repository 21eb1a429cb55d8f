use dicehall_engine::errors::GameError;
use thiserror::Error;

use crate::document::{ClientId, Epoch, RoundId};

/// Failures at the replication boundary.
///
/// Illegal moves are not errors here: they come back as ignored outcomes from the
/// engine. These variants describe the channel refusing or losing a write.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TableError {
    #[error("Write of round {round_id} failed: {reason}")]
    WriteFailure { round_id: RoundId, reason: String },
    #[error("Writer for round {round_id} was fenced (epoch {epoch}, current lease {current})")]
    Fenced {
        round_id: RoundId,
        epoch: Epoch,
        current: Epoch,
    },
    #[error("No writer lease held for round {round_id} by {holder}")]
    NoLease { round_id: RoundId, holder: ClientId },
    #[error("Unknown round: {0}")]
    UnknownRound(RoundId),
    #[error("Channel closed")]
    ChannelClosed,
    #[error("Channel storage poisoned")]
    StoragePoisoned,
    #[error(transparent)]
    Game(#[from] GameError),
}

impl TableError {
    pub fn is_fenced(&self) -> bool {
        matches!(self, TableError::Fenced { .. })
    }
}
