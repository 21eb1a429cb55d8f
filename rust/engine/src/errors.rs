use thiserror::Error;

use crate::round::Phase;
use crate::seat::PlayerId;

/// Errors raised by the round engine.
///
/// Most variants describe an illegal transition. Those are never surfaced to players:
/// the state machine reports them through [`crate::round::Outcome::Ignored`] and leaves
/// the round untouched, so racing or duplicated calls stay harmless.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GameError {
    #[error("It's not player {actual}'s turn (expected {expected:?})")]
    NotPlayersTurn {
        expected: Option<PlayerId>,
        actual: PlayerId,
    },
    #[error("Round is not in play (phase: {0:?})")]
    WrongPhase(Phase),
    #[error("No rolls remaining")]
    NoRollsRemaining,
    #[error("Dice can only be held or locked between rolls ({rolls_remaining} rolls remaining)")]
    OutsideHoldWindow { rolls_remaining: u8 },
    #[error("Die index {index} out of range (tray holds {len} dice)")]
    DieIndexOutOfRange { index: usize, len: usize },
    #[error("Player {0} is not seated in this round")]
    UnknownPlayer(PlayerId),
    #[error("Player {0} has already finished their turn")]
    SeatComplete(PlayerId),
    #[error("Invalid rolled faces: {0}")]
    InvalidFaces(String),
    #[error("Unknown game variant: {0}")]
    UnknownVariant(String),
    #[error("Round started without any eligible players")]
    MissingParticipant,
    #[error("Invariant violated: {0}")]
    InvariantViolation(String),
}

impl GameError {
    /// True for the errors a redundant or out-of-turn call produces.
    pub fn is_illegal_transition(&self) -> bool {
        matches!(
            self,
            GameError::NotPlayersTurn { .. }
                | GameError::WrongPhase(_)
                | GameError::NoRollsRemaining
                | GameError::OutsideHoldWindow { .. }
                | GameError::DieIndexOutOfRange { .. }
                | GameError::UnknownPlayer(_)
                | GameError::SeatComplete(_)
                | GameError::InvalidFaces(_)
        )
    }
}
