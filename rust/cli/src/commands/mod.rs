//! Command handler modules for the Dicehall CLI.
//!
//! Each subcommand lives in its own file and exposes one
//! `handle_COMMAND_command(...) -> Result<(), CliError>` function. Output streams are
//! passed in as `&mut dyn Write` so tests can capture them.

mod cfg;
mod deal;
mod eval;
mod rng;
mod sim;

pub use cfg::handle_cfg_command;
pub use deal::handle_deal_command;
pub use eval::handle_eval_command;
pub use rng::handle_rng_command;
pub use sim::handle_sim_command;

use crate::config::{self, Config};
use crate::error::CliError;

/// Resolved configuration, with loader errors surfaced as [`CliError::Config`].
pub(crate) fn load_config() -> Result<Config, CliError> {
    config::load().map_err(|e| CliError::Config(e.to_string()))
}
