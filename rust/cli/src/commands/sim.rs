//! `sim`: play bot-only rounds end to end.
//!
//! Every round runs through a [`RoundHost`] publishing to an in-memory channel while an
//! observing [`TableClient`] follows the replicated documents. The observer's final view
//! must match the host's state, so a sim doubles as a replication smoke test.

use std::collections::BTreeMap;
use std::io::Write;
use std::sync::Arc;

use dicehall_engine::deck::Deck;
use dicehall_engine::dice::SeededRoller;
use dicehall_engine::hand::GameVariant;
use dicehall_engine::logger::RoundLogger;
use dicehall_engine::seat::{Seat, Table};
use dicehall_table::{
    intent_queue, InMemoryChannel, RecordingListener, RoundHost, SystemClock, TableClient,
    TableSettings,
};

use super::load_config;
use crate::error::CliError;
use crate::ui;
use crate::validation::validate_players;

const OBSERVER: &str = "observer";

pub fn handle_sim_command(
    rounds: u64,
    players: Option<u8>,
    seed: Option<u64>,
    variant: Option<&str>,
    output: Option<&str>,
    out: &mut dyn Write,
    err: &mut dyn Write,
) -> Result<(), CliError> {
    if rounds == 0 {
        return Err(CliError::InvalidInput("rounds must be at least 1".into()));
    }
    let config = load_config()?;
    let players = validate_players(players.unwrap_or(config.players))
        .map_err(CliError::InvalidInput)?;
    let variant: GameVariant = match variant {
        Some(name) => name.parse()?,
        None => config.variant,
    };
    let seed = seed.or(config.seed).unwrap_or_else(rand::random);

    let settings = TableSettings {
        variant,
        protection_window_ms: config.window_ms,
        tie_policy: config.tie_policy,
        ..Default::default()
    };
    let table = Table::new((1..=players).map(|i| Seat::bot(format!("bot{}", i))).collect());
    let channel = Arc::new(InMemoryChannel::new());
    let clock = Arc::new(SystemClock::new());
    let listener = Arc::new(RecordingListener::new());

    let mut host = RoundHost::new("sim-host", table, settings.clone(), channel.clone(), clock.clone())?
        .with_roller(Box::new(SeededRoller::new_with_seed(seed)));
    host.add_listener(listener.clone());

    let (tx, _rx) = intent_queue();
    let mut observer = TableClient::new(OBSERVER, OBSERVER, tx, &settings, clock);
    let mut logger = match output {
        Some(path) => Some(RoundLogger::create(path)?),
        None => None,
    };

    let mut wins: BTreeMap<String, u64> = BTreeMap::new();
    let mut split_rounds = 0u64;
    let mut followed = 0usize;
    let mut deck = Deck::new_with_seed(seed);

    writeln!(out, "Seed: {}", seed)?;
    for n in 0..rounds {
        let mut sub = observer.join(channel.as_ref(), &host.next_round_id());
        let round_id = if n == 0 {
            host.open_round(&mut deck)?
        } else {
            host.open_next_round()?
        };
        let handled = observer.pump(&mut sub);
        if handled == 0 {
            return Err(CliError::Engine(format!(
                "observer saw no documents for round {}",
                round_id
            )));
        }
        followed += handled;

        let Some(outcome) = host.outcome().cloned() else {
            return Err(CliError::Engine(format!("round {} did not complete", round_id)));
        };
        if observer.view() != host.state() {
            ui::display_warning(err, &format!("observer diverged in round {}", round_id))?;
            return Err(CliError::Engine("replicated view does not match the host".into()));
        }

        if outcome.winners.len() > 1 {
            split_rounds += 1;
        }
        for w in &outcome.winners {
            *wins.entry(w.clone()).or_insert(0) += 1;
        }

        if let Some(logger) = logger.as_mut() {
            let id = logger.next_id();
            if let Some(mut record) = host.record(id) {
                record.seed = Some(seed);
                logger.write(&record)?;
            }
        }
    }

    let completions = listener.completions().len() as u64;
    if completions != rounds {
        return Err(CliError::Engine(format!(
            "expected {} completed rounds, listeners saw {}",
            rounds, completions
        )));
    }

    writeln!(out, "Simulated: {} rounds ({})", rounds, variant)?;
    for seat in host.table().seats() {
        writeln!(out, "  {}: {} wins", seat.id, wins.get(&seat.id).copied().unwrap_or(0))?;
    }
    writeln!(out, "Split pots: {}", split_rounds)?;
    writeln!(out, "Documents followed: {}", followed)?;
    if let Some(path) = output {
        writeln!(out, "History: {}", path)?;
    }
    Ok(())
}
