//! Command-line argument definitions.

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "dicehall",
    version,
    about = "Dicehall dice table CLI",
    disable_help_subcommand = true
)]
pub struct DicehallCli {
    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Score a tray of dice
    Eval {
        /// Comma-separated faces, e.g. 6,6,6,1,2
        #[arg(long)]
        dice: String,
        /// wild or categories (default from config)
        #[arg(long)]
        variant: Option<String>,
    },
    /// Draw for the dealer button and show every draw round
    Deal {
        #[arg(long)]
        players: Option<u8>,
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Play bot-only rounds through a host and an observer
    Sim {
        #[arg(long)]
        rounds: u64,
        #[arg(long)]
        players: Option<u8>,
        #[arg(long)]
        seed: Option<u64>,
        #[arg(long)]
        variant: Option<String>,
        /// Round history output (JSONL)
        #[arg(long)]
        output: Option<String>,
    },
    /// Print a sample of rolled faces
    Rng {
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Show resolved configuration and where each value came from
    Cfg,
}
