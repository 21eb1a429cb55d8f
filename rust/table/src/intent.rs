//! Requests from clients to the host. Clients never write the round document.

use dicehall_engine::seat::PlayerId;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::document::{ClientId, RoundId};

const INTENT_QUEUE_BUFFER: usize = 256;

pub type IntentSender = mpsc::Sender<SeatIntent>;
pub type IntentReceiver = mpsc::Receiver<SeatIntent>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SeatAction {
    /// Faces the client rolled for its unheld dice, left to right
    Roll { faces: Vec<u8> },
    ToggleHold { index: usize },
    LockIn,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeatIntent {
    pub round_id: RoundId,
    pub client: ClientId,
    pub player: PlayerId,
    /// Per-client edit token, strictly increasing
    pub token: u64,
    pub action: SeatAction,
}

pub fn intent_queue() -> (IntentSender, IntentReceiver) {
    mpsc::channel(INTENT_QUEUE_BUFFER)
}
