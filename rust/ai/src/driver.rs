//! Runs a [`BotPolicy`] through one complete seat-turn.

use crate::BotPolicy;
use dicehall_engine::dice::DiceRoller;
use dicehall_engine::errors::GameError;
use dicehall_engine::hand::HandResult;
use dicehall_engine::round::{Outcome, RoundEvent, TurnStateMachine, MAX_ROLLS};
use dicehall_engine::seat::PlayerId;

/// What the bot did during its turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BotTurnReport {
    pub player: PlayerId,
    pub rolls: u8,
    pub locked_in: bool,
    pub events: Vec<RoundEvent>,
    pub result: Option<HandResult>,
}

/// Plays `player`'s whole turn: at most three rolls, holding between them, and always
/// leaves the seat complete.
///
/// # Errors
///
/// [`GameError::NotPlayersTurn`] when it is not `player`'s turn, and
/// [`GameError::InvariantViolation`] if the seat somehow ends unfinished.
pub fn play_turn(
    machine: &mut TurnStateMachine,
    player: &str,
    policy: &dyn BotPolicy,
    roller: &mut dyn DiceRoller,
) -> Result<BotTurnReport, GameError> {
    if !machine.state().is_turn_of(player) {
        return Err(GameError::NotPlayersTurn {
            expected: machine.state().current_turn_player_id.clone(),
            actual: player.to_string(),
        });
    }
    let best_so_far = machine.state().best_completed().cloned();
    let wild_face = machine.evaluator().wild_face();
    let mut report = BotTurnReport {
        player: player.to_string(),
        rolls: 0,
        locked_in: false,
        events: Vec::new(),
        result: None,
    };

    while report.rolls < MAX_ROLLS {
        let outcome = machine.roll(player, roller);
        if !collect(&mut report, outcome) {
            break;
        }
        report.rolls += 1;

        let Some(seat) = machine.state().seat(player) else {
            break;
        };
        if seat.is_complete {
            break;
        }
        let rolls_remaining = seat.rolls_remaining;
        let dice = seat.dice.clone();
        let current = machine.evaluator().evaluate(&seat.faces());

        if policy.should_stop_rolling(&current, rolls_remaining, best_so_far.as_ref()) {
            let outcome = machine.lock_in(player);
            report.locked_in = collect(&mut report, outcome);
            break;
        }
        let mask = policy.hold_mask(&dice, wild_face);
        for (index, (die, keep)) in dice.iter().zip(mask).enumerate() {
            if die.held != keep {
                let outcome = machine.toggle_hold(player, index);
                collect(&mut report, outcome);
            }
        }
    }

    let seat = machine.state().seat(player);
    if seat.is_some_and(|s| !s.is_complete) {
        let outcome = machine.lock_in(player);
        report.locked_in = collect(&mut report, outcome);
    }
    let seat = machine
        .state()
        .seat(player)
        .ok_or_else(|| GameError::UnknownPlayer(player.to_string()))?;
    if !seat.is_complete {
        return Err(GameError::InvariantViolation(format!(
            "bot seat {} left its turn unfinished",
            player
        )));
    }
    report.result = seat.result.clone();
    tracing::debug!(
        player,
        policy = policy.name(),
        rolls = report.rolls,
        locked_in = report.locked_in,
        "bot turn finished"
    );
    Ok(report)
}

fn collect(report: &mut BotTurnReport, outcome: Outcome) -> bool {
    match outcome {
        Outcome::Applied(events) => {
            report.events.extend(events);
            true
        }
        Outcome::Ignored(error) => {
            tracing::warn!(player = %report.player, error = %error, "bot action rejected");
            false
        }
    }
}
