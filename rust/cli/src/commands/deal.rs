//! `deal`: draw for the dealer button.
//!
//! Seats `p1..pN`, runs high-card dealer selection from a seeded deck and prints every
//! draw round, the winning seat and the resulting turn order.

use std::io::Write;

use dicehall_engine::dealer::select_dealer;
use dicehall_engine::deck::Deck;
use dicehall_engine::seat::{Seat, Table};

use super::load_config;
use crate::error::CliError;
use crate::formatters::format_draw_round;
use crate::ui;
use crate::validation::validate_players;

pub fn handle_deal_command(
    players: Option<u8>,
    seed: Option<u64>,
    out: &mut dyn Write,
    err: &mut dyn Write,
) -> Result<(), CliError> {
    let config = load_config()?;
    let players = validate_players(players.unwrap_or(config.players))
        .map_err(CliError::InvalidInput)?;
    let seed = seed.or(config.seed).unwrap_or_else(rand::random);

    let mut table = Table::new((1..=players).map(|i| Seat::human(format!("p{}", i))).collect());
    let names: Vec<String> = table.seats().iter().map(|s| s.name.clone()).collect();
    let mut deck = Deck::new_with_seed(seed);
    let selection = select_dealer(&table, &mut deck);

    writeln!(out, "Seed: {}", seed)?;
    for round in &selection.rounds {
        writeln!(out, "{}", format_draw_round(round, &names))?;
    }
    let Some(dealer) = selection.winner_position else {
        ui::display_warning(err, "no seat could take the button")?;
        return Err(CliError::Engine("dealer selection produced no winner".into()));
    };
    table.set_dealer_position(dealer);
    let dealer_name = table.seat(dealer).map_or("?", |s| s.name.as_str());
    writeln!(out, "Dealer: {}", dealer_name)?;
    writeln!(out, "Turn order: {}", table.turn_order().join(", "))?;
    Ok(())
}
