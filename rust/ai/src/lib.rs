//! # dicehall-ai: Computer-Controlled Seats
//!
//! Heuristic policies that play a dice turn for a bot seat, and the driver that runs a
//! policy against the round state machine.
//!
//! ## Core Components
//!
//! - [`BotPolicy`] - Trait deciding when to stop rolling and which dice to hold
//! - [`baseline`] - Baseline policy: stop on a big hand or a safe lead
//! - [`driver`] - Plays one complete seat-turn with a policy
//! - [`create_bot`] - Factory for policies by name
//!
//! ## Quick Start
//!
//! ```rust
//! use dicehall_ai::create_bot;
//! use dicehall_ai::driver::play_turn;
//! use dicehall_engine::dice::SeededRoller;
//! use dicehall_engine::hand::GameVariant;
//! use dicehall_engine::round::TurnStateMachine;
//!
//! let bot = create_bot("baseline").expect("known policy");
//! let mut round = TurnStateMachine::new(GameVariant::Wild, vec!["bot-1".into()]);
//! let _ = round.start();
//!
//! let report = play_turn(&mut round, "bot-1", bot.as_ref(), &mut SeededRoller::new_with_seed(7))
//!     .expect("bot seat plays");
//! assert!(report.rolls <= 3);
//! assert!(round.state().seat("bot-1").unwrap().is_complete);
//! ```
//!
//! ## Policies
//!
//! - `"baseline"` - Stops at four of a kind or a clear lead
//! - `"greedy"` - Always uses every roll unless it already holds five of a kind

use dicehall_engine::dice::Die;
use dicehall_engine::hand::HandResult;

pub mod baseline;
pub mod driver;

/// Decision-making for a computer-controlled seat.
///
/// Policies are stateless: everything they need is passed in, so one instance can
/// serve every bot seat at the table.
///
/// # Example Implementation
///
/// ```rust
/// use dicehall_ai::BotPolicy;
/// use dicehall_engine::dice::Die;
/// use dicehall_engine::hand::HandResult;
///
/// struct AlwaysRoll;
///
/// impl BotPolicy for AlwaysRoll {
///     fn name(&self) -> &str {
///         "always-roll"
///     }
///
///     fn should_stop_rolling(&self, _: &HandResult, _: u8, _: Option<&HandResult>) -> bool {
///         false
///     }
///
///     fn hold_mask(&self, dice: &[Die], _wild: Option<u8>) -> Vec<bool> {
///         vec![false; dice.len()]
///     }
/// }
/// ```
pub trait BotPolicy: Send + Sync {
    fn name(&self) -> &str;

    /// Called after every non-final roll.
    ///
    /// * `current` - The hand the seat would lock in right now
    /// * `rolls_remaining` - Rolls still available (1 or 2)
    /// * `best_so_far` - Strongest hand among seats that already finished, if any
    fn should_stop_rolling(
        &self,
        current: &HandResult,
        rolls_remaining: u8,
        best_so_far: Option<&HandResult>,
    ) -> bool;

    /// Which dice to keep for the next roll, one flag per die.
    fn hold_mask(&self, dice: &[Die], wild_face: Option<u8>) -> Vec<bool>;
}

/// Factory for bot policies by name. Returns `None` for unknown names.
///
/// # Example
///
/// ```rust
/// use dicehall_ai::create_bot;
///
/// assert_eq!(create_bot("baseline").unwrap().name(), "baseline");
/// assert!(create_bot("oracle").is_none());
/// ```
pub fn create_bot(kind: &str) -> Option<Box<dyn BotPolicy>> {
    match kind {
        "baseline" => Some(Box::new(baseline::BaselineBot::new())),
        "greedy" => Some(Box::new(baseline::BaselineBot::greedy())),
        _ => None,
    }
}

/// Names accepted by [`create_bot`].
pub const BOT_KINDS: [&str; 2] = ["baseline", "greedy"];
