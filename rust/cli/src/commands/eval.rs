//! `eval`: score a tray of dice.

use std::io::Write;

use dicehall_engine::hand::GameVariant;

use super::load_config;
use crate::error::CliError;
use crate::formatters::{format_faces, format_hand};
use crate::validation::parse_dice;

/// Scores `dice` under `variant`, or under the configured variant when none is given.
///
/// Prints the faces, the hand description and its rank key.
pub fn handle_eval_command(
    dice: &str,
    variant: Option<&str>,
    out: &mut dyn Write,
) -> Result<(), CliError> {
    let variant: GameVariant = match variant {
        Some(name) => name.parse()?,
        None => load_config()?.variant,
    };
    let evaluator = variant.evaluator();
    let faces = parse_dice(dice, evaluator.dice_count()).map_err(CliError::InvalidInput)?;
    let result = evaluator.evaluate(&faces);

    writeln!(out, "Dice: {}", format_faces(&faces))?;
    writeln!(out, "Variant: {}", variant)?;
    writeln!(out, "Hand: {}", format_hand(&result))?;
    writeln!(
        out,
        "Rank: tier={} face={} tiebreak={}",
        result.rank.tier, result.rank.face, result.rank.tiebreak
    )?;
    Ok(())
}
