use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::dice::{face_values, fresh_dice, roll_unheld, DiceRoller, Die, ScriptedRoller};
use crate::errors::GameError;
use crate::hand::{determine_winners, GameVariant, HandEvaluator, HandResult};
use crate::rules;
use crate::seat::PlayerId;
use crate::tiebreak::{DrawSource, TieBreakResolver, TieBreakState};

/// Rolls each seat gets per turn.
pub const MAX_ROLLS: u8 = 3;

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    #[default]
    Waiting,
    Playing,
    Complete,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeatStatus {
    NotStarted,
    Rolling,
    Complete,
}

/// One seat's tray for the current round. Frozen once `is_complete` is set.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct PlayerTurnState {
    pub dice: Vec<Die>,
    pub rolls_remaining: u8,
    pub is_complete: bool,
    /// Set when the seat finished early by locking in
    #[serde(default)]
    pub locked_in: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<HandResult>,
}

impl PlayerTurnState {
    pub fn new(dice_count: usize) -> Self {
        Self {
            dice: fresh_dice(dice_count),
            rolls_remaining: MAX_ROLLS,
            is_complete: false,
            locked_in: false,
            result: None,
        }
    }

    pub fn status(&self) -> SeatStatus {
        if self.is_complete {
            SeatStatus::Complete
        } else if self.rolls_remaining == MAX_ROLLS {
            SeatStatus::NotStarted
        } else {
            SeatStatus::Rolling
        }
    }

    pub fn rolls_used(&self) -> u8 {
        MAX_ROLLS.saturating_sub(self.rolls_remaining)
    }

    /// Between the first and the last roll: the only time dice can be held or locked in.
    pub fn in_hold_window(&self) -> bool {
        !self.is_complete && self.rolls_remaining > 0 && self.rolls_remaining < MAX_ROLLS
    }

    pub fn faces(&self) -> Vec<u8> {
        face_values(&self.dice)
    }

    pub fn held_mask(&self) -> Vec<bool> {
        self.dice.iter().map(|d| d.held).collect()
    }
}

#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct SeatResult {
    pub player: PlayerId,
    pub result: HandResult,
}

/// What settlement needs once every seat has played.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct RoundOutcome {
    pub winners: Vec<PlayerId>,
    /// Completed hands in turn order
    pub results: Vec<SeatResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tie_break: Option<TieBreakState>,
}

/// The canonical round document. Only the host mutates it.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct RoundState {
    pub variant: GameVariant,
    pub turn_order: Vec<PlayerId>,
    pub current_turn_player_id: Option<PlayerId>,
    pub player_states: BTreeMap<PlayerId, PlayerTurnState>,
    pub phase: Phase,
    #[serde(default)]
    pub winners: Vec<PlayerId>,
}

impl RoundState {
    /// A waiting round for `turn_order`; duplicate ids keep their first position.
    pub fn new(variant: GameVariant, turn_order: Vec<PlayerId>) -> Self {
        let dice_count = variant.evaluator().dice_count();
        let mut seen = BTreeSet::new();
        let turn_order: Vec<PlayerId> = turn_order
            .into_iter()
            .filter(|p| seen.insert(p.clone()))
            .collect();
        let player_states = turn_order
            .iter()
            .map(|p| (p.clone(), PlayerTurnState::new(dice_count)))
            .collect();
        Self {
            variant,
            turn_order,
            current_turn_player_id: None,
            player_states,
            phase: Phase::Waiting,
            winners: Vec::new(),
        }
    }

    pub fn seat(&self, player: &str) -> Option<&PlayerTurnState> {
        self.player_states.get(player)
    }

    pub fn is_turn_of(&self, player: &str) -> bool {
        self.phase == Phase::Playing && self.current_turn_player_id.as_deref() == Some(player)
    }

    /// Finished hands in turn order.
    pub fn results(&self) -> Vec<SeatResult> {
        self.turn_order
            .iter()
            .filter_map(|p| {
                let seat = self.player_states.get(p)?;
                let result = seat.result.clone()?;
                Some(SeatResult {
                    player: p.clone(),
                    result,
                })
            })
            .collect()
    }

    /// Strongest hand among seats that have already finished.
    pub fn best_completed(&self) -> Option<&HandResult> {
        self.player_states
            .values()
            .filter(|s| s.is_complete)
            .filter_map(|s| s.result.as_ref())
            .max_by(|a, b| a.rank.cmp(&b.rank))
    }

    /// Structural checks that must hold after every transition.
    pub fn check_invariants(&self) -> Result<(), GameError> {
        let dice_count = self.variant.evaluator().dice_count();
        let order: BTreeSet<&PlayerId> = self.turn_order.iter().collect();
        let seated: BTreeSet<&PlayerId> = self.player_states.keys().collect();
        if order != seated {
            return Err(GameError::InvariantViolation(
                "player_states does not match turn_order".into(),
            ));
        }
        for (player, seat) in &self.player_states {
            if seat.dice.len() != dice_count {
                return Err(GameError::InvariantViolation(format!(
                    "{} holds {} dice, expected {}",
                    player,
                    seat.dice.len(),
                    dice_count
                )));
            }
            if seat.rolls_remaining > MAX_ROLLS {
                return Err(GameError::InvariantViolation(format!(
                    "{} has {} rolls remaining",
                    player, seat.rolls_remaining
                )));
            }
            if seat.is_complete && seat.rolls_remaining != 0 && !seat.locked_in {
                return Err(GameError::InvariantViolation(format!(
                    "{} completed with rolls left and no lock-in",
                    player
                )));
            }
            if seat.is_complete && seat.result.is_none() {
                return Err(GameError::InvariantViolation(format!(
                    "{} completed without a result",
                    player
                )));
            }
        }
        if self.phase == Phase::Playing {
            let Some(current) = self.current_turn_player_id.as_ref() else {
                return Err(GameError::InvariantViolation(
                    "playing round has no current player".into(),
                ));
            };
            if !order.contains(current) {
                return Err(GameError::InvariantViolation(format!(
                    "current player {} is not in turn order",
                    current
                )));
            }
            if self.player_states.get(current).is_some_and(|s| s.is_complete) {
                return Err(GameError::InvariantViolation(
                    "current player already finished".into(),
                ));
            }
        }
        if self.phase == Phase::Complete && self.player_states.values().any(|s| !s.is_complete) {
            return Err(GameError::InvariantViolation(
                "round complete while a seat is still playing".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RoundEvent {
    RoundStarted {
        first: PlayerId,
    },
    Rolled {
        player: PlayerId,
        faces: Vec<u8>,
        rolls_remaining: u8,
    },
    HoldToggled {
        player: PlayerId,
        index: usize,
        held: bool,
    },
    SeatCompleted {
        player: PlayerId,
        result: HandResult,
        locked_in: bool,
    },
    TurnAdvanced {
        player: PlayerId,
    },
    RoundCompleted {
        outcome: RoundOutcome,
    },
}

/// Result of asking the state machine to do something.
///
/// Illegal requests come back as `Ignored` with the state untouched; callers can
/// safely repeat a request that may already have been applied.
#[must_use]
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum Outcome {
    Applied(Vec<RoundEvent>),
    Ignored(GameError),
}

impl Outcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, Outcome::Applied(_))
    }

    pub fn events(&self) -> &[RoundEvent] {
        match self {
            Outcome::Applied(events) => events,
            Outcome::Ignored(_) => &[],
        }
    }

    pub fn rejection(&self) -> Option<&GameError> {
        match self {
            Outcome::Applied(_) => None,
            Outcome::Ignored(e) => Some(e),
        }
    }

    /// The completion payload, present only on the transition that finished the round.
    pub fn round_outcome(&self) -> Option<&RoundOutcome> {
        self.events().iter().find_map(|e| match e {
            RoundEvent::RoundCompleted { outcome } => Some(outcome),
            _ => None,
        })
    }
}

/// Host-side controller for one round. Game agnostic: scoring is delegated to the
/// variant's [`HandEvaluator`].
pub struct TurnStateMachine {
    state: RoundState,
    evaluator: Box<dyn HandEvaluator>,
}

impl fmt::Debug for TurnStateMachine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TurnStateMachine")
            .field("state", &self.state)
            .field("evaluator", &self.evaluator.name())
            .finish()
    }
}

impl TurnStateMachine {
    pub fn new(variant: GameVariant, turn_order: Vec<PlayerId>) -> Self {
        Self::from_state(RoundState::new(variant, turn_order))
    }

    /// Resumes from a replicated snapshot.
    pub fn from_state(state: RoundState) -> Self {
        let evaluator = state.variant.evaluator();
        Self { state, evaluator }
    }

    pub fn with_evaluator(state: RoundState, evaluator: Box<dyn HandEvaluator>) -> Self {
        Self { state, evaluator }
    }

    pub fn state(&self) -> &RoundState {
        &self.state
    }

    pub fn into_state(self) -> RoundState {
        self.state
    }

    pub fn evaluator(&self) -> &dyn HandEvaluator {
        self.evaluator.as_ref()
    }

    pub fn phase(&self) -> Phase {
        self.state.phase
    }

    pub fn current_player(&self) -> Option<&str> {
        self.state.current_turn_player_id.as_deref()
    }

    /// Waiting -> Playing. A round without players completes immediately with no winners.
    pub fn start(&mut self) -> Outcome {
        if self.state.phase != Phase::Waiting {
            return ignore("start", "", GameError::WrongPhase(self.state.phase));
        }
        let Some(first) = self.state.turn_order.first().cloned() else {
            tracing::warn!(
                error = %GameError::MissingParticipant,
                "completing round without winners"
            );
            self.state.phase = Phase::Complete;
            self.state.current_turn_player_id = None;
            self.state.winners.clear();
            return Outcome::Applied(vec![RoundEvent::RoundCompleted {
                outcome: RoundOutcome {
                    winners: Vec::new(),
                    results: Vec::new(),
                    tie_break: None,
                },
            }]);
        };
        self.state.phase = Phase::Playing;
        self.state.current_turn_player_id = Some(first.clone());
        tracing::debug!(first = %first, "round started");
        Outcome::Applied(vec![RoundEvent::RoundStarted { first }])
    }

    /// Re-rolls every unheld die. The last roll finishes the seat.
    pub fn roll(&mut self, player: &str, roller: &mut dyn DiceRoller) -> Outcome {
        if let Err(e) = rules::check_roll(&self.state, player) {
            return ignore("roll", player, e);
        }
        let Some(seat) = self.state.player_states.get_mut(player) else {
            return ignore("roll", player, GameError::UnknownPlayer(player.to_string()));
        };
        roll_unheld(&mut seat.dice, roller);
        seat.rolls_remaining -= 1;
        let rolls_remaining = seat.rolls_remaining;
        let mut events = vec![RoundEvent::Rolled {
            player: player.to_string(),
            faces: face_values(&seat.dice),
            rolls_remaining,
        }];
        if rolls_remaining == 0 {
            events.extend(self.complete_seat(player, false));
        }
        Outcome::Applied(events)
    }

    /// Applies a roll whose faces were produced elsewhere (the acting player's client).
    /// `faces` lists the new values of the unheld dice, left to right.
    pub fn roll_with_faces(&mut self, player: &str, faces: &[u8]) -> Outcome {
        if let Err(e) = rules::check_roll(&self.state, player) {
            return ignore("roll", player, e);
        }
        if let Some(seat) = self.state.player_states.get(player) {
            if let Err(e) = rules::check_rolled_faces(seat, faces) {
                return ignore("roll", player, e);
            }
        }
        let mut roller = ScriptedRoller::new(faces.to_vec());
        self.roll(player, &mut roller)
    }

    pub fn toggle_hold(&mut self, player: &str, index: usize) -> Outcome {
        if let Err(e) = rules::check_hold(&self.state, player, index) {
            return ignore("toggle_hold", player, e);
        }
        let Some(die) = self
            .state
            .player_states
            .get_mut(player)
            .and_then(|s| s.dice.get_mut(index))
        else {
            return ignore(
                "toggle_hold",
                player,
                GameError::UnknownPlayer(player.to_string()),
            );
        };
        die.held = !die.held;
        Outcome::Applied(vec![RoundEvent::HoldToggled {
            player: player.to_string(),
            index,
            held: die.held,
        }])
    }

    /// Ends the seat's turn with the dice as they are.
    pub fn lock_in(&mut self, player: &str) -> Outcome {
        if let Err(e) = rules::check_lock_in(&self.state, player) {
            return ignore("lock_in", player, e);
        }
        Outcome::Applied(self.complete_seat(player, true))
    }

    /// Scores the seat's current dice without finishing the turn.
    pub fn preview(&self, player: &str) -> Option<HandResult> {
        let seat = self.state.player_states.get(player)?;
        if seat.dice.iter().all(Die::is_rolled) {
            Some(self.evaluator.evaluate(&seat.faces()))
        } else {
            None
        }
    }

    /// Moves the turn pointer off a seat that is already complete, finishing the round
    /// when no seat is left to play. Used after seats were merged in from elsewhere.
    pub fn resync_turn(&mut self) -> Vec<RoundEvent> {
        if self.state.phase != Phase::Playing {
            return Vec::new();
        }
        let current_done = match self.state.current_turn_player_id.as_ref() {
            Some(current) => self
                .state
                .player_states
                .get(current)
                .is_none_or(|s| s.is_complete),
            None => true,
        };
        if current_done {
            self.advance()
        } else {
            Vec::new()
        }
    }

    /// Settles a tied finished round down to one winner with repeated draws.
    pub fn resolve_tie(&mut self, source: &mut dyn DrawSource) -> Option<TieBreakState> {
        if self.state.phase != Phase::Complete || self.state.winners.len() < 2 {
            return None;
        }
        let positions: Vec<usize> = self
            .state
            .winners
            .iter()
            .filter_map(|w| self.state.turn_order.iter().position(|p| p == w))
            .collect();
        let mut resolver = TieBreakResolver::new(positions.clone(), positions.first().copied());
        let winner = resolver.run(source)?;
        let player = self.state.turn_order.get(winner)?.clone();
        tracing::info!(winner = %player, rounds = resolver.state().round_number, "tie settled");
        self.state.winners = vec![player];
        Some(resolver.into_state())
    }

    fn complete_seat(&mut self, player: &str, locked_in: bool) -> Vec<RoundEvent> {
        let Some(seat) = self.state.player_states.get_mut(player) else {
            return Vec::new();
        };
        let result = self.evaluator.evaluate(&face_values(&seat.dice));
        seat.is_complete = true;
        seat.locked_in = locked_in;
        seat.result = Some(result.clone());
        tracing::debug!(player, hand = %result, locked_in, "seat complete");

        let mut events = vec![RoundEvent::SeatCompleted {
            player: player.to_string(),
            result,
            locked_in,
        }];
        events.extend(self.advance());
        events
    }

    fn advance(&mut self) -> Vec<RoundEvent> {
        let order = &self.state.turn_order;
        let start = self
            .state
            .current_turn_player_id
            .as_ref()
            .and_then(|c| order.iter().position(|p| p == c))
            .unwrap_or(0);
        let pending = |p: &&PlayerId| {
            self.state
                .player_states
                .get(*p)
                .is_some_and(|s| !s.is_complete)
        };
        let next = order
            .iter()
            .skip(start + 1)
            .find(pending)
            .or_else(|| order.iter().find(pending))
            .cloned();

        match next {
            Some(player) => {
                self.state.current_turn_player_id = Some(player.clone());
                vec![RoundEvent::TurnAdvanced { player }]
            }
            None => self.finish_round(),
        }
    }

    fn finish_round(&mut self) -> Vec<RoundEvent> {
        self.state.phase = Phase::Complete;
        self.state.current_turn_player_id = None;
        let results = self.state.results();
        let hands: Vec<HandResult> = results.iter().map(|r| r.result.clone()).collect();
        let winners: Vec<PlayerId> = determine_winners(&hands)
            .into_iter()
            .map(|i| results[i].player.clone())
            .collect();
        self.state.winners = winners.clone();
        tracing::info!(winners = ?winners, seats = results.len(), "round complete");
        vec![RoundEvent::RoundCompleted {
            outcome: RoundOutcome {
                winners,
                results,
                tie_break: None,
            },
        }]
    }
}

fn ignore(action: &'static str, player: &str, error: GameError) -> Outcome {
    tracing::debug!(action, player, error = %error, "ignored illegal transition");
    Outcome::Ignored(error)
}
