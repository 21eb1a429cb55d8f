//! Configuration command handler.
//!
//! Displays the resolved configuration with the source of each value
//! (default, environment, or configuration file).
//!
//! # Example Output
//!
//! ```json
//! {
//!   "players": {
//!     "value": 4,
//!     "source": "default"
//!   },
//!   ...
//! }
//! ```

use crate::config;
use crate::error::CliError;
use crate::ui;
use std::io::Write;

pub fn handle_cfg_command(out: &mut dyn Write, err: &mut dyn Write) -> Result<(), CliError> {
    let resolved = match config::load_with_sources() {
        Ok(r) => r,
        Err(e) => {
            ui::display_warning(err, "configuration could not be resolved")?;
            return Err(CliError::Config(e.to_string()));
        }
    };

    let config::ConfigResolved { config, sources } = resolved;
    let display = serde_json::json!({
        "seed": {
            "value": config.seed,
            "source": sources.seed,
        },
        "players": {
            "value": config.players,
            "source": sources.players,
        },
        "variant": {
            "value": config.variant,
            "source": sources.variant,
        },
        "window_ms": {
            "value": config.window_ms,
            "source": sources.window_ms,
        },
        "tie_policy": {
            "value": config.tie_policy,
            "source": sources.tie_policy,
        }
    });
    let json_str = serde_json::to_string_pretty(&display).map_err(std::io::Error::other)?;
    writeln!(out, "{}", json_str)?;
    Ok(())
}
