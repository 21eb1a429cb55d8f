use crate::dice::is_valid_face;
use crate::errors::GameError;
use crate::round::{Phase, PlayerTurnState, RoundState};

/// Checks that `player` may act right now and returns their seat.
///
/// The round must be `Playing`, the player must be seated, it must be their turn and
/// their seat must not be finished yet.
pub fn check_turn<'a>(state: &'a RoundState, player: &str) -> Result<&'a PlayerTurnState, GameError> {
    if state.phase != Phase::Playing {
        return Err(GameError::WrongPhase(state.phase));
    }
    let seat = state
        .player_states
        .get(player)
        .ok_or_else(|| GameError::UnknownPlayer(player.to_string()))?;
    if state.current_turn_player_id.as_deref() != Some(player) {
        return Err(GameError::NotPlayersTurn {
            expected: state.current_turn_player_id.clone(),
            actual: player.to_string(),
        });
    }
    if seat.is_complete {
        return Err(GameError::SeatComplete(player.to_string()));
    }
    Ok(seat)
}

/// Validates a roll request.
///
/// # Errors
///
/// Any [`check_turn`] failure, or [`GameError::NoRollsRemaining`].
///
/// # Examples
///
/// ```
/// use dicehall_engine::errors::GameError;
/// use dicehall_engine::hand::GameVariant;
/// use dicehall_engine::round::{Phase, RoundState};
/// use dicehall_engine::rules::check_roll;
///
/// let state = RoundState::new(GameVariant::Wild, vec!["ann".to_string(), "bob".to_string()]);
/// // nobody may roll before the round has started
/// assert_eq!(check_roll(&state, "ann"), Err(GameError::WrongPhase(Phase::Waiting)));
/// ```
pub fn check_roll(state: &RoundState, player: &str) -> Result<(), GameError> {
    let seat = check_turn(state, player)?;
    if seat.rolls_remaining == 0 {
        return Err(GameError::NoRollsRemaining);
    }
    Ok(())
}

/// Holding is only allowed between rolls: after the first roll, before the last.
pub fn check_hold(state: &RoundState, player: &str, index: usize) -> Result<(), GameError> {
    let seat = check_turn(state, player)?;
    if !seat.in_hold_window() {
        return Err(GameError::OutsideHoldWindow {
            rolls_remaining: seat.rolls_remaining,
        });
    }
    if index >= seat.dice.len() {
        return Err(GameError::DieIndexOutOfRange {
            index,
            len: seat.dice.len(),
        });
    }
    Ok(())
}

pub fn check_lock_in(state: &RoundState, player: &str) -> Result<(), GameError> {
    let seat = check_turn(state, player)?;
    if !seat.in_hold_window() {
        return Err(GameError::OutsideHoldWindow {
            rolls_remaining: seat.rolls_remaining,
        });
    }
    Ok(())
}

/// Faces submitted for a roll must cover exactly the unheld dice, each in 1..=6.
pub fn check_rolled_faces(seat: &PlayerTurnState, faces: &[u8]) -> Result<(), GameError> {
    let unheld = seat.dice.iter().filter(|d| !d.held).count();
    if faces.len() != unheld {
        return Err(GameError::InvalidFaces(format!(
            "expected {} faces, got {}",
            unheld,
            faces.len()
        )));
    }
    if let Some(bad) = faces.iter().find(|&&f| !is_valid_face(f)) {
        return Err(GameError::InvalidFaces(format!("face {} out of range", bad)));
    }
    Ok(())
}
