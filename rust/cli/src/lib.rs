//! # Dicehall CLI Library
//!
//! Command-line tools for the Dicehall dice table: score a tray of dice, draw for the
//! dealer button, simulate bot rounds through a replicated host, and inspect the
//! resolved configuration.
//!
//! ## Main Entry Point
//!
//! The primary entry point is the [`run`] function, which parses command-line arguments
//! and executes the appropriate subcommand.
//!
//! ## Example Usage
//!
//! ```
//! let mut out = Vec::new();
//! let mut err = Vec::new();
//! let code = dicehall_cli::run(
//!     vec!["dicehall", "eval", "--dice", "6,6,6,1,2", "--variant", "wild"],
//!     &mut out,
//!     &mut err,
//! );
//! assert_eq!(code, 0);
//! assert!(String::from_utf8_lossy(&out).contains("Four"));
//! ```
//!
//! ## Available Subcommands
//!
//! - `eval`: Score five dice under a game variant
//! - `deal`: Draw for the dealer button and show each draw round
//! - `sim`: Play bot-only rounds and optionally write round history
//! - `rng`: Print a sample of rolled faces
//! - `cfg`: Display current configuration settings

use clap::Parser;
use std::io::Write;
pub mod cli;
mod commands;
mod config;
mod error;
pub mod exit_code;
pub mod formatters;
pub mod ui;
pub mod validation;

use cli::{Commands, DicehallCli};
use commands::{
    handle_cfg_command, handle_deal_command, handle_eval_command, handle_rng_command,
    handle_sim_command,
};

pub use error::CliError;

const COMMANDS: &[&str] = &["eval", "deal", "sim", "rng", "cfg"];

/// Main entry point for the CLI application.
///
/// Returns the process exit code: `0` on success, `2` on any error.
///
/// ```
/// let mut out = Vec::new();
/// let mut err = Vec::new();
/// let code = dicehall_cli::run(vec!["dicehall", "rng", "--seed", "42"], &mut out, &mut err);
/// assert_eq!(code, 0);
/// ```
pub fn run<I, S>(args: I, out: &mut dyn Write, err: &mut dyn Write) -> i32
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let argv: Vec<String> = args.into_iter().map(|s| s.as_ref().to_string()).collect();

    let cli = match DicehallCli::try_parse_from(&argv) {
        Ok(cli) => cli,
        Err(e) => return report_parse_error(e, out, err),
    };

    let result = match cli.cmd {
        Commands::Eval { dice, variant } => handle_eval_command(&dice, variant.as_deref(), out),
        Commands::Deal { players, seed } => handle_deal_command(players, seed, out, err),
        Commands::Sim {
            rounds,
            players,
            seed,
            variant,
            output,
        } => handle_sim_command(
            rounds,
            players,
            seed,
            variant.as_deref(),
            output.as_deref(),
            out,
            err,
        ),
        Commands::Rng { seed } => handle_rng_command(seed, out),
        Commands::Cfg => handle_cfg_command(out, err),
    };

    match result {
        Ok(()) => exit_code::SUCCESS,
        Err(e) => {
            let _ = ui::write_error(err, &e.to_string());
            exit_code::ERROR
        }
    }
}

fn report_parse_error(e: clap::Error, out: &mut dyn Write, err: &mut dyn Write) -> i32 {
    use clap::error::ErrorKind;

    // Help and version print to stdout and exit 0
    if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) {
        return match write!(out, "{}", e) {
            Ok(()) => exit_code::SUCCESS,
            Err(_) => exit_code::ERROR,
        };
    }

    let _ = write_usage(e, err);
    exit_code::ERROR
}

fn write_usage(e: clap::Error, err: &mut dyn Write) -> std::io::Result<()> {
    writeln!(err, "{}", e)?;
    writeln!(err)?;
    writeln!(err, "Dicehall dice table CLI")?;
    writeln!(err, "Usage: dicehall <command> [options]\n")?;
    writeln!(err, "Commands:")?;
    for c in COMMANDS {
        writeln!(err, "  {}", c)?;
    }
    writeln!(err, "\nFor full help, run: dicehall --help")
}
