//! Poker-dice category scoring (no wilds).

use serde::{Deserialize, Serialize};

use crate::dice::{is_valid_face, MAX_FACE};
use crate::hand::{face_name, HandEvaluator, HandRank, HandResult};

pub const CATEGORY_DICE: usize = 5;

/// Categories from weakest to strongest; the discriminant is the rank tier.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    HighDie = 0,
    OnePair = 1,
    TwoPair = 2,
    ThreeOfAKind = 3,
    LowStraight = 4,
    HighStraight = 5,
    FullHouse = 6,
    FourOfAKind = 7,
    FiveOfAKind = 8,
}

impl Category {
    pub fn label(&self) -> &'static str {
        match self {
            Category::HighDie => "High die",
            Category::OnePair => "One pair",
            Category::TwoPair => "Two pair",
            Category::ThreeOfAKind => "Three of a kind",
            Category::LowStraight => "Low straight",
            Category::HighStraight => "High straight",
            Category::FullHouse => "Full house",
            Category::FourOfAKind => "Four of a kind",
            Category::FiveOfAKind => "Five of a kind",
        }
    }
}

#[derive(Debug, Copy, Clone, Default)]
pub struct CategoryEvaluator;

impl HandEvaluator for CategoryEvaluator {
    fn name(&self) -> &str {
        "categories"
    }

    fn dice_count(&self) -> usize {
        CATEGORY_DICE
    }

    fn evaluate(&self, faces: &[u8]) -> HandResult {
        evaluate_categories(faces)
    }
}

pub fn evaluate_categories(faces: &[u8]) -> HandResult {
    let mut counts = [0u8; 7];
    for &f in faces {
        if is_valid_face(f) {
            counts[f as usize] += 1;
        }
    }

    // (count, face) sorted by count then face, strongest group first
    let mut groups: Vec<(u8, u8)> = (1..=MAX_FACE)
        .filter(|&f| counts[f as usize] > 0)
        .map(|f| (counts[f as usize], f))
        .collect();
    groups.sort_unstable_by(|a, b| b.cmp(a));

    let (top_count, top_face) = groups.first().copied().unwrap_or((0, 0));
    let second = groups.get(1).copied();

    let (category, face, secondary, used): (Category, u8, u8, Vec<u8>) = match (top_count, second)
    {
        (c, _) if c >= 5 => (Category::FiveOfAKind, top_face, 0, vec![top_face]),
        (4, _) => (Category::FourOfAKind, top_face, 0, vec![top_face]),
        (3, Some((2, pair))) => (Category::FullHouse, top_face, pair, vec![top_face, pair]),
        _ if is_straight(&counts, 2) && faces.len() == CATEGORY_DICE => {
            (Category::HighStraight, 6, 0, (2..=6).collect())
        }
        _ if is_straight(&counts, 1) && faces.len() == CATEGORY_DICE => {
            (Category::LowStraight, 5, 0, (1..=5).collect())
        }
        (3, _) => (Category::ThreeOfAKind, top_face, 0, vec![top_face]),
        (2, Some((2, low))) => (Category::TwoPair, top_face, low, vec![top_face, low]),
        (2, _) => (Category::OnePair, top_face, 0, vec![top_face]),
        _ => (Category::HighDie, top_face, 0, Vec::new()),
    };

    let unused = if category == Category::HighDie {
        let keep = faces.iter().position(|&f| f == top_face && top_face != 0);
        (0..faces.len()).filter(|&i| Some(i) != keep).collect()
    } else {
        faces
            .iter()
            .enumerate()
            .filter(|(_, f)| !used.contains(f))
            .map(|(i, _)| i)
            .collect()
    };

    let of_a_kind = match category {
        Category::LowStraight | Category::HighStraight => 1,
        _ => top_count,
    };
    let description = match category {
        Category::FullHouse => format!(
            "{}: {} over {}",
            category.label(),
            face_name(face),
            face_name(secondary)
        ),
        Category::TwoPair => format!(
            "{}: {} and {}",
            category.label(),
            face_name(face),
            face_name(secondary)
        ),
        Category::LowStraight | Category::HighStraight => category.label().to_string(),
        _ => format!("{}: {}", category.label(), face_name(face)),
    };

    HandResult {
        rank: HandRank {
            tier: category as u8,
            face,
            tiebreak: secondary,
        },
        of_a_kind,
        wilds_used: 0,
        category: Some(category),
        description,
        unused,
    }
}

fn is_straight(counts: &[u8; 7], low: u8) -> bool {
    (low..low + 5).all(|f| counts[f as usize] == 1)
}
