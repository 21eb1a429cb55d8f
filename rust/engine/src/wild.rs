//! Classic five-dice hand where ones are wild.
//!
//! Hands are ranked by how many dice can be made to show one face:
//! five of a kind > four of a kind > three of a kind > pair > high die.
//! Inside a tier the higher face wins, then the hand that consumed more wilds.

use serde::{Deserialize, Serialize};

use crate::dice::{is_valid_face, MAX_FACE};
use crate::hand::{face_name, HandEvaluator, HandRank, HandResult};

pub const WILD_FACE: u8 = 1;
pub const CLASSIC_DICE: usize = 5;

#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WildTier {
    HighCard = 0,
    Pair = 1,
    ThreeOfAKind = 2,
    FourOfAKind = 3,
    FiveOfAKind = 4,
}

impl WildTier {
    pub fn from_count(count: u8) -> WildTier {
        match count {
            0 | 1 => WildTier::HighCard,
            2 => WildTier::Pair,
            3 => WildTier::ThreeOfAKind,
            4 => WildTier::FourOfAKind,
            _ => WildTier::FiveOfAKind,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            WildTier::HighCard => "High die",
            WildTier::Pair => "Pair",
            WildTier::ThreeOfAKind => "Three of a kind",
            WildTier::FourOfAKind => "Four of a kind",
            WildTier::FiveOfAKind => "Five of a kind",
        }
    }
}

#[derive(Debug, Copy, Clone, Default)]
pub struct WildEvaluator;

impl HandEvaluator for WildEvaluator {
    fn name(&self) -> &str {
        "wild"
    }

    fn dice_count(&self) -> usize {
        CLASSIC_DICE
    }

    fn wild_face(&self) -> Option<u8> {
        Some(WILD_FACE)
    }

    fn evaluate(&self, faces: &[u8]) -> HandResult {
        evaluate_wild(faces)
    }
}

/// Natural counts for faces 2-6 (index = face) plus the number of wild dice.
pub fn count_faces(faces: &[u8]) -> ([u8; 7], u8) {
    let mut counts = [0u8; 7];
    let mut wilds = 0u8;
    for &f in faces {
        if f == WILD_FACE {
            wilds += 1;
        } else if is_valid_face(f) {
            counts[f as usize] += 1;
        }
    }
    (counts, wilds)
}

/// Face with the greatest `natural + wild` total, ties broken toward the higher face.
pub fn best_face(counts: &[u8; 7], wilds: u8, dice: u8) -> (u8, u8) {
    let mut best = (MAX_FACE, 0u8);
    for face in 2..=MAX_FACE {
        let total = (counts[face as usize] + wilds).min(dice);
        if total >= best.1 {
            best = (face, total);
        }
    }
    best
}

pub fn evaluate_wild(faces: &[u8]) -> HandResult {
    let dice = faces.len() as u8;
    let (counts, wilds) = count_faces(faces);

    if wilds > 0 && wilds == dice {
        let tier = WildTier::from_count(wilds);
        return HandResult {
            rank: HandRank {
                tier: tier as u8,
                face: MAX_FACE,
                tiebreak: wilds,
            },
            of_a_kind: wilds,
            wilds_used: wilds,
            category: None,
            description: format!("{}: all wild", tier.label()),
            unused: Vec::new(),
        };
    }

    let (face, total) = best_face(&counts, wilds, dice);
    if total < 2 {
        return high_card(faces, &counts);
    }

    let natural = counts[face as usize];
    let wilds_used = total.saturating_sub(natural).min(wilds);
    let mut wilds_left = wilds_used;
    let mut unused = Vec::new();
    for (i, &f) in faces.iter().enumerate() {
        if f == face {
            continue;
        }
        if f == WILD_FACE && wilds_left > 0 {
            wilds_left -= 1;
            continue;
        }
        unused.push(i);
    }

    let tier = WildTier::from_count(total);
    let description = match wilds_used {
        0 => format!("{}: {}", tier.label(), face_name(face)),
        1 => format!("{}: {} (1 wild)", tier.label(), face_name(face)),
        n => format!("{}: {} ({} wilds)", tier.label(), face_name(face), n),
    };
    HandResult {
        rank: HandRank {
            tier: tier as u8,
            face,
            tiebreak: wilds_used,
        },
        of_a_kind: total,
        wilds_used,
        category: None,
        description,
        unused,
    }
}

fn high_card(faces: &[u8], counts: &[u8; 7]) -> HandResult {
    let face = (2..=MAX_FACE)
        .rev()
        .find(|&f| counts[f as usize] > 0)
        .unwrap_or(0);
    let keep = faces.iter().position(|&f| f == face && face != 0);
    let unused = (0..faces.len()).filter(|&i| Some(i) != keep).collect();
    HandResult {
        rank: HandRank {
            tier: WildTier::HighCard as u8,
            face,
            tiebreak: 0,
        },
        of_a_kind: if keep.is_some() { 1 } else { 0 },
        wilds_used: 0,
        category: None,
        description: format!("{}: {}", WildTier::HighCard.label(), face_name(face)),
        unused,
    }
}
