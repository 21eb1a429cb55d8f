//! Dice, hand and draw formatters for terminal display.
//!
//! Dice are shown as Unicode die faces (⚀ to ⚅) when the terminal supports them and as
//! digits otherwise.
//!
//! ```rust
//! use dicehall_cli::formatters::format_faces_ascii;
//!
//! assert_eq!(format_faces_ascii(&[6, 6, 1]), "[6 6 1]");
//! ```

use dicehall_engine::hand::HandResult;
use dicehall_engine::tiebreak::TieBreakRound;

/// Check if the terminal supports Unicode symbols by detecting modern terminal environments.
///
/// On Windows, checks for Windows Terminal (WT_SESSION), modern terminals (TERM_PROGRAM),
/// or VS Code (VSCODE_INJECTION). On Unix-like systems, assumes Unicode support.
pub fn supports_unicode() -> bool {
    if cfg!(windows) {
        std::env::var("WT_SESSION").is_ok()
            || std::env::var("TERM_PROGRAM").is_ok()
            || std::env::var("VSCODE_INJECTION").is_ok()
    } else {
        true
    }
}

fn die_symbol(face: u8) -> Option<char> {
    match face {
        1 => Some('⚀'),
        2 => Some('⚁'),
        3 => Some('⚂'),
        4 => Some('⚃'),
        5 => Some('⚄'),
        6 => Some('⚅'),
        _ => None,
    }
}

pub fn format_faces_ascii(faces: &[u8]) -> String {
    let parts: Vec<String> = faces.iter().map(|f| f.to_string()).collect();
    format!("[{}]", parts.join(" "))
}

/// Faces as die symbols followed by their digits, e.g. `⚅⚅⚀ [6 6 1]`.
pub fn format_faces(faces: &[u8]) -> String {
    if !supports_unicode() {
        return format_faces_ascii(faces);
    }
    let symbols: String = faces.iter().filter_map(|f| die_symbol(*f)).collect();
    format!("{} {}", symbols, format_faces_ascii(faces))
}

/// One-line summary of a scored hand.
pub fn format_hand(result: &HandResult) -> String {
    let mut line = result.description.clone();
    if !result.unused.is_empty() {
        let unused: Vec<String> = result.unused.iter().map(|i| i.to_string()).collect();
        line.push_str(&format!(", unused dice at {}", unused.join(",")));
    }
    line
}

/// One dealer-selection round: who drew what and who led.
pub fn format_draw_round(round: &TieBreakRound, names: &[String]) -> String {
    let name = |p: usize| names.get(p).cloned().unwrap_or_else(|| format!("seat{}", p));
    let draws: Vec<String> = round
        .draws
        .iter()
        .map(|d| format!("{}={}", name(d.position), d.item))
        .collect();
    let leaders: Vec<String> = round.leaders.iter().map(|p| name(*p)).collect();
    format!(
        "Round {}: {} -> {}",
        round.round_number,
        draws.join(" "),
        leaders.join(",")
    )
}
