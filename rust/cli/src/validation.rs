//! Parsing of user-supplied dice and counts.

use dicehall_engine::dice::is_valid_face;

/// Parses a comma- or space-separated list of faces.
///
/// ```rust
/// # use dicehall_cli::validation::parse_dice;
/// assert_eq!(parse_dice("6,6,6,1,2", 5), Ok(vec![6, 6, 6, 1, 2]));
/// assert_eq!(parse_dice("6 5 4 3 2", 5), Ok(vec![6, 5, 4, 3, 2]));
/// assert!(parse_dice("6,6,7,1,2", 5).is_err());
/// assert!(parse_dice("6,6", 5).is_err());
/// ```
pub fn parse_dice(input: &str, expected: usize) -> Result<Vec<u8>, String> {
    let faces = input
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<u8>()
                .ok()
                .filter(|f| is_valid_face(*f))
                .ok_or_else(|| format!("'{}' is not a die face (1-6)", s))
        })
        .collect::<Result<Vec<u8>, String>>()?;
    if faces.len() != expected {
        return Err(format!("expected {} dice, got {}", expected, faces.len()));
    }
    Ok(faces)
}

/// Seats at a table: at least one, at most twelve.
pub fn validate_players(players: u8) -> Result<u8, String> {
    if (1..=12).contains(&players) {
        Ok(players)
    } else {
        Err(format!("players must be between 1 and 12, got {}", players))
    }
}
