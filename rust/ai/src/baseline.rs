//! Baseline bot policy.
//!
//! Chases the largest group: keeps every die showing the face with the greatest
//! `natural + wild` count plus every wild, and stops early once the hand is big enough
//! or safely ahead of everyone who already played.

use crate::BotPolicy;
use dicehall_engine::categories::Category;
use dicehall_engine::dice::{Die, MAX_FACE, MIN_FACE};
use dicehall_engine::hand::HandResult;

/// Rule-based policy with two knobs.
///
/// # Strategy
///
/// - Stop when `of_a_kind >= stop_of_a_kind` (or a full house or better when scoring categories)
/// - Stop when the hand already beats the best finished hand by `margin_tiers` tiers
/// - Otherwise hold the best face plus wilds and roll again
///
/// # Example
///
/// ```rust
/// use dicehall_ai::baseline::BaselineBot;
/// use dicehall_ai::BotPolicy;
/// use dicehall_engine::dice::Die;
///
/// let bot = BaselineBot::new();
/// let dice: Vec<Die> = [4, 1, 4, 2, 6].into_iter().map(Die::new).collect();
/// assert_eq!(bot.hold_mask(&dice, Some(1)), vec![true, true, true, false, false]);
/// ```
#[derive(Debug, Clone)]
pub struct BaselineBot {
    name: &'static str,
    pub stop_of_a_kind: u8,
    pub margin_tiers: u8,
}

impl BaselineBot {
    pub fn new() -> Self {
        Self {
            name: "baseline",
            stop_of_a_kind: 4,
            margin_tiers: 1,
        }
    }

    /// Never settles for less than five of a kind and ignores the other seats.
    pub fn greedy() -> Self {
        Self {
            name: "greedy",
            stop_of_a_kind: 5,
            margin_tiers: u8::MAX,
        }
    }

    fn is_high_tier(&self, hand: &HandResult) -> bool {
        match hand.category {
            Some(category) => {
                category >= Category::FullHouse || hand.of_a_kind >= self.stop_of_a_kind
            }
            None => hand.of_a_kind >= self.stop_of_a_kind,
        }
    }

    fn leads_by_margin(&self, hand: &HandResult, best: &HandResult) -> bool {
        hand.tier() as u16 >= best.tier() as u16 + self.margin_tiers as u16
    }
}

impl Default for BaselineBot {
    fn default() -> Self {
        Self::new()
    }
}

impl BotPolicy for BaselineBot {
    fn name(&self) -> &str {
        self.name
    }

    fn should_stop_rolling(
        &self,
        current: &HandResult,
        rolls_remaining: u8,
        best_so_far: Option<&HandResult>,
    ) -> bool {
        if rolls_remaining == 0 || self.is_high_tier(current) {
            return true;
        }
        best_so_far.is_some_and(|best| self.leads_by_margin(current, best))
    }

    fn hold_mask(&self, dice: &[Die], wild_face: Option<u8>) -> Vec<bool> {
        let target = target_face(dice, wild_face);
        dice.iter()
            .map(|d| Some(d.value) == target || Some(d.value) == wild_face)
            .collect()
    }
}

/// Face with the greatest natural count, ties toward the higher face. Wilds add the same
/// amount to every candidate so they never change the choice.
fn target_face(dice: &[Die], wild_face: Option<u8>) -> Option<u8> {
    let mut counts = [0u8; MAX_FACE as usize + 1];
    for d in dice.iter().filter(|d| d.is_rolled()) {
        if Some(d.value) != wild_face && d.value <= MAX_FACE {
            counts[d.value as usize] += 1;
        }
    }
    (MIN_FACE..=MAX_FACE)
        .filter(|&f| Some(f) != wild_face && counts[f as usize] > 0)
        .max_by_key(|&f| (counts[f as usize], f))
}
