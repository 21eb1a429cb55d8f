use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::categories::{Category, CategoryEvaluator};
use crate::errors::GameError;
use crate::wild::WildEvaluator;

/// Ordering key of a finished hand.
///
/// Field order matters: the derived `Ord` compares `tier`, then `face`, then `tiebreak`.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct HandRank {
    /// Variant specific tier (of-a-kind size for the wild variant, category otherwise)
    pub tier: u8,
    /// Face that defines the hand inside its tier
    pub face: u8,
    /// Secondary key: wilds consumed (wild variant) or the secondary face (categories)
    pub tiebreak: u8,
}

impl HandRank {
    /// Flattens the rank into a single comparable number.
    pub fn ordinal(&self) -> u32 {
        self.tier as u32 * 100 + self.face as u32 * 10 + self.tiebreak as u32
    }
}

/// Evaluated hand. Derived once from a set of faces and never mutated afterwards.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct HandResult {
    pub rank: HandRank,
    /// Dice sharing (or substituting for) the defining face
    pub of_a_kind: u8,
    #[serde(default)]
    pub wilds_used: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
    pub description: String,
    /// Indices of dice that do not contribute to the hand (display only)
    #[serde(default)]
    pub unused: Vec<usize>,
}

impl HandResult {
    pub fn tier(&self) -> u8 {
        self.rank.tier
    }

    pub fn beats(&self, other: &HandResult) -> bool {
        compare_hands(self, other).is_gt()
    }
}

impl fmt::Display for HandResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.description)
    }
}

/// Scores a tray of dice for one game variant.
///
/// Implementations must be pure: the rank may not depend on the order of `faces`,
/// only the choice of which die is flagged unused may.
pub trait HandEvaluator: Send + Sync {
    fn name(&self) -> &str;

    /// Number of dice on a tray for this variant.
    fn dice_count(&self) -> usize;

    /// Face that substitutes for any other face, if the variant has one.
    fn wild_face(&self) -> Option<u8> {
        None
    }

    fn evaluate(&self, faces: &[u8]) -> HandResult;

    fn compare(&self, a: &HandResult, b: &HandResult) -> Ordering {
        compare_hands(a, b)
    }
}

pub fn compare_hands(a: &HandResult, b: &HandResult) -> Ordering {
    a.rank.cmp(&b.rank)
}

/// Returns every index whose rank equals the best rank in `results`.
///
/// Ties are reported as several winners and never broken here.
///
/// ```
/// use dicehall_engine::hand::determine_winners;
/// use dicehall_engine::wild::evaluate_wild;
///
/// let results = vec![
///     evaluate_wild(&[6, 6, 6, 2, 3]),
///     evaluate_wild(&[3, 6, 2, 6, 6]),
///     evaluate_wild(&[5, 5, 2, 3, 4]),
/// ];
/// assert_eq!(determine_winners(&results), vec![0, 1]);
/// ```
pub fn determine_winners(results: &[HandResult]) -> Vec<usize> {
    let Some(best) = results.iter().map(|r| r.rank).max() else {
        return Vec::new();
    };
    results
        .iter()
        .enumerate()
        .filter(|(_, r)| r.rank == best)
        .map(|(i, _)| i)
        .collect()
}

/// The dice games a round can be played as.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameVariant {
    /// Five dice, ones are wild, ranked by of-a-kind size
    #[default]
    Wild,
    /// Five dice scored into poker-dice categories, no wilds
    Categories,
}

impl GameVariant {
    pub fn evaluator(self) -> Box<dyn HandEvaluator> {
        match self {
            GameVariant::Wild => Box::new(WildEvaluator),
            GameVariant::Categories => Box::new(CategoryEvaluator),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            GameVariant::Wild => "wild",
            GameVariant::Categories => "categories",
        }
    }
}

impl FromStr for GameVariant {
    type Err = GameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "wild" | "classic" => Ok(GameVariant::Wild),
            "categories" | "category" => Ok(GameVariant::Categories),
            other => Err(GameError::UnknownVariant(other.to_string())),
        }
    }
}

impl fmt::Display for GameVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Builds the evaluator for a variant name such as `"wild"` or `"categories"`.
pub fn create_evaluator(name: &str) -> Result<Box<dyn HandEvaluator>, GameError> {
    name.parse::<GameVariant>().map(GameVariant::evaluator)
}

pub(crate) fn face_name(face: u8) -> &'static str {
    match face {
        1 => "Aces",
        2 => "Twos",
        3 => "Threes",
        4 => "Fours",
        5 => "Fives",
        6 => "Sixes",
        _ => "Blanks",
    }
}
