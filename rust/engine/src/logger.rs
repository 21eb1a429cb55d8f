use serde::{Deserialize, Serialize};

use crate::dealer::DealerSelectionState;
use crate::hand::{GameVariant, HandResult};
use crate::round::{RoundOutcome, RoundState};
use crate::seat::PlayerId;

/// One seat's action as recorded in round history.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ActionRecord {
    Roll { player: PlayerId, faces: Vec<u8> },
    Hold { player: PlayerId, index: usize, held: bool },
    LockIn { player: PlayerId },
}

/// Final dice of one seat.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct SeatSummary {
    pub player: PlayerId,
    pub faces: Vec<u8>,
    pub rolls_used: u8,
    pub locked_in: bool,
    pub result: Option<HandResult>,
}

/// Complete record of a finished round, one JSON line per round.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct RoundRecord {
    /// Unique identifier (format: YYYYMMDD-NNNNNN)
    pub round_id: String,
    /// RNG seed the dice were rolled from, when the round was seeded
    pub seed: Option<u64>,
    pub variant: GameVariant,
    pub dealer_position: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dealer_selection: Option<DealerSelectionState>,
    pub turn_order: Vec<PlayerId>,
    pub seats: Vec<SeatSummary>,
    /// Chronological list of seat actions
    pub actions: Vec<ActionRecord>,
    pub outcome: RoundOutcome,
    /// Timestamp when the round finished (RFC3339 format)
    #[serde(default)]
    pub ts: Option<String>,
    #[serde(default)]
    pub meta: Option<serde_json::Value>,
}

impl RoundRecord {
    /// Builds a record from a finished round with no actions attached yet.
    pub fn from_state(round_id: String, state: &RoundState, outcome: RoundOutcome) -> Self {
        Self {
            round_id,
            seed: None,
            variant: state.variant,
            dealer_position: None,
            dealer_selection: None,
            turn_order: state.turn_order.clone(),
            seats: state
                .turn_order
                .iter()
                .filter_map(|p| {
                    let seat = state.seat(p)?;
                    Some(SeatSummary {
                        player: p.clone(),
                        faces: seat.faces(),
                        rolls_used: seat.rolls_used(),
                        locked_in: seat.locked_in,
                        result: seat.result.clone(),
                    })
                })
                .collect(),
            actions: Vec::new(),
            outcome,
            ts: None,
            meta: None,
        }
    }
}

pub fn format_round_id(yyyymmdd: &str, seq: u32) -> String {
    format!("{}-{:06}", yyyymmdd, seq)
}

use chrono::{SecondsFormat, Utc};
use std::fs::{create_dir_all, File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

pub struct RoundLogger {
    writer: Option<BufWriter<File>>,
    date: String,
    seq: u32,
}

impl RoundLogger {
    pub fn create<P: AsRef<Path>>(path: P) -> std::io::Result<Self> {
        Self::open(path, false)
    }

    /// Appends to an existing history file instead of truncating it.
    pub fn append<P: AsRef<Path>>(path: P) -> std::io::Result<Self> {
        Self::open(path, true)
    }

    fn open<P: AsRef<Path>>(path: P, append: bool) -> std::io::Result<Self> {
        if let Some(parent) = path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                create_dir_all(parent)?;
            }
        }
        let f = OpenOptions::new()
            .create(true)
            .write(true)
            .append(append)
            .truncate(!append)
            .open(path)?;
        Ok(Self {
            writer: Some(BufWriter::new(f)),
            date: Utc::now().format("%Y%m%d").to_string(),
            seq: 0,
        })
    }

    pub fn with_seq_for_test(date: &str) -> Self {
        Self {
            writer: None,
            date: date.to_string(),
            seq: 0,
        }
    }

    pub fn next_id(&mut self) -> String {
        self.seq += 1;
        format_round_id(&self.date, self.seq)
    }

    pub fn write(&mut self, record: &RoundRecord) -> std::io::Result<()> {
        // inject timestamp if missing
        let mut rec = record.clone();
        if rec.ts.is_none() {
            rec.ts = Some(Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true));
        }
        let line = serde_json::to_string(&rec).map_err(std::io::Error::other)?;
        if let Some(w) = &mut self.writer {
            w.write_all(line.as_bytes())?;
            w.write_all(b"\n")?;
            w.flush()?;
        }
        tracing::debug!(round_id = %rec.round_id, "round record written");
        Ok(())
    }
}

/// Reads every record from a JSONL history file, skipping blank lines.
pub fn read_records<P: AsRef<Path>>(path: P) -> std::io::Result<Vec<RoundRecord>> {
    let reader = BufReader::new(File::open(path)?);
    let mut records = Vec::new();
    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let rec = serde_json::from_str(&line)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        records.push(rec);
    }
    Ok(records)
}
