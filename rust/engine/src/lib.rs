//! # dicehall-engine: Dice Hand-Game Core
//!
//! Deterministic rules for a table dice game: five dice, up to three rolls per seat,
//! holds between rolls, and pluggable hand scoring. Everything here is synchronous and
//! free of I/O except the JSONL round logger; replication lives in `dicehall-table`.
//!
//! ## Core Modules
//!
//! - [`dice`] - Dice, rollers (seeded and scripted) and rolling of unheld dice
//! - [`hand`] - The [`hand::HandEvaluator`] strategy, hand comparison and game variants
//! - [`wild`] - Classic scoring: N of a kind with ones wild
//! - [`categories`] - Category scoring: pairs, straights, full house and friends
//! - [`round`] - Round document and the [`round::TurnStateMachine`]
//! - [`rules`] - Legality checks for roll, hold and lock-in
//! - [`seat`] - Seats, the dealer button and turn order
//! - [`tiebreak`] - Recursive high-draw elimination between tied candidates
//! - [`dealer`] - Dealer selection built on the tie-break protocol
//! - [`cards`] / [`deck`] - Playing cards used as the default draw source
//! - [`logger`] - Round history records in JSONL
//! - [`errors`] - Error types for game operations
//!
//! ## Quick Start
//!
//! ```rust
//! use dicehall_engine::dice::ScriptedRoller;
//! use dicehall_engine::hand::GameVariant;
//! use dicehall_engine::round::{Phase, TurnStateMachine};
//!
//! let mut round = TurnStateMachine::new(GameVariant::Wild, vec!["ann".into(), "bob".into()]);
//! let _ = round.start();
//!
//! let mut dice = ScriptedRoller::new(vec![6, 6, 6, 1, 2]);
//! let _ = round.roll("ann", &mut dice);
//! let _ = round.lock_in("ann");
//! assert_eq!(round.current_player(), Some("bob"));
//!
//! // out-of-turn calls leave the round untouched
//! assert!(!round.roll("ann", &mut dice).is_applied());
//! assert_eq!(round.phase(), Phase::Playing);
//! ```
//!
//! ## Deterministic Gameplay
//!
//! ```rust
//! use dicehall_engine::dice::{DiceRoller, SeededRoller};
//!
//! let mut a = SeededRoller::new_with_seed(42);
//! let mut b = SeededRoller::new_with_seed(42);
//! assert_eq!(a.roll_face(), b.roll_face());
//! ```

pub mod cards;
pub mod categories;
pub mod dealer;
pub mod deck;
pub mod dice;
pub mod errors;
pub mod hand;
pub mod logger;
pub mod round;
pub mod rules;
pub mod seat;
pub mod tiebreak;
pub mod wild;
