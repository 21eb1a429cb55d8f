//! `rng`: print a sample of rolled faces.
//!
//! Useful for checking that a seed reproduces the same dice across runs and machines.

use std::io::Write;

use dicehall_engine::dice::{DiceRoller, SeededRoller};

use crate::error::CliError;

const SAMPLE: usize = 10;

/// Rolls [`SAMPLE`] faces with `seed`, or with a random seed when none is given.
pub fn handle_rng_command(seed: Option<u64>, out: &mut dyn Write) -> Result<(), CliError> {
    let s = seed.unwrap_or_else(rand::random);
    let mut roller = SeededRoller::new_with_seed(s);
    let faces: Vec<u8> = (0..SAMPLE).map(|_| roller.roll_face()).collect();
    writeln!(out, "Seed: {}", s)?;
    writeln!(out, "RNG sample: {:?}", faces)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rng_command_is_deterministic_for_a_seed() {
        let mut a = Vec::new();
        let mut b = Vec::new();
        handle_rng_command(Some(42), &mut a).unwrap();
        handle_rng_command(Some(42), &mut b).unwrap();
        assert_eq!(a, b);
        assert!(String::from_utf8(a).unwrap().contains("Seed: 42"));
    }

    #[test]
    fn test_rng_command_prints_faces_in_range() {
        let mut out = Vec::new();
        handle_rng_command(None, &mut out).unwrap();
        let output = String::from_utf8(out).unwrap();
        let sample = output
            .lines()
            .find_map(|l| l.strip_prefix("RNG sample: "))
            .unwrap();
        let faces: Vec<u8> = serde_json::from_str(sample).unwrap();
        assert_eq!(faces.len(), SAMPLE);
        assert!(faces.iter().all(|f| (1..=6).contains(f)));
    }
}
