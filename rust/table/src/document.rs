use std::collections::BTreeMap;

use chrono::{SecondsFormat, Utc};
use dicehall_engine::dealer::DealerSelectionState;
use dicehall_engine::round::{RoundOutcome, RoundState};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type RoundId = String;
pub type ClientId = String;
pub type Epoch = u64;

/// Permission to write one round's document. Newer epochs fence older holders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriterLease {
    pub round_id: RoundId,
    pub holder: ClientId,
    pub epoch: Epoch,
}

/// The whole replicated document for a round. Readers always receive it whole.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundDocument {
    pub round_id: RoundId,
    /// Assigned by the channel, strictly increasing per round
    #[serde(default)]
    pub revision: u64,
    #[serde(default)]
    pub epoch: Epoch,
    pub writer: ClientId,
    pub state: RoundState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dealer: Option<DealerSelectionState>,
    /// Highest edit token the host has processed from each client
    #[serde(default)]
    pub acks: BTreeMap<ClientId, u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outcome: Option<RoundOutcome>,
    pub written_at: String,
}

impl RoundDocument {
    pub fn new(round_id: RoundId, writer: ClientId, state: RoundState) -> Self {
        Self {
            round_id,
            revision: 0,
            epoch: 0,
            writer,
            state,
            dealer: None,
            acks: BTreeMap::new(),
            outcome: None,
            written_at: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }

    pub fn ack_for(&self, client: &str) -> u64 {
        self.acks.get(client).copied().unwrap_or(0)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn from_json(s: &str) -> serde_json::Result<Self> {
        serde_json::from_str(s)
    }
}

pub fn new_round_id() -> RoundId {
    Uuid::new_v4().to_string()
}
