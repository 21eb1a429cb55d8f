use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use serde::{Deserialize, Serialize};

use crate::tiebreak::{DrawSource, DrawnItem};

/// Face value of a die that has not been rolled yet.
pub const UNROLLED: u8 = 0;
pub const MIN_FACE: u8 = 1;
pub const MAX_FACE: u8 = 6;

/// A single die on a player's tray.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Default, Serialize, Deserialize)]
pub struct Die {
    /// `0` until the first roll, then 1-6.
    pub value: u8,
    /// Held dice are skipped by the next roll.
    pub held: bool,
}

impl Die {
    pub fn new(value: u8) -> Self {
        Self { value, held: false }
    }

    pub fn is_rolled(&self) -> bool {
        self.value != UNROLLED
    }
}

pub fn is_valid_face(value: u8) -> bool {
    (MIN_FACE..=MAX_FACE).contains(&value)
}

pub fn fresh_dice(count: usize) -> Vec<Die> {
    vec![Die::default(); count]
}

pub fn face_values(dice: &[Die]) -> Vec<u8> {
    dice.iter().map(|d| d.value).collect()
}

/// Source of uniformly random die faces.
pub trait DiceRoller {
    /// Returns a face in `1..=6`.
    fn roll_face(&mut self) -> u8;
}

/// Reproducible roller backed by ChaCha20.
#[derive(Debug, Clone)]
pub struct SeededRoller {
    rng: ChaCha20Rng,
}

impl SeededRoller {
    pub fn new_with_seed(seed: u64) -> Self {
        Self {
            rng: ChaCha20Rng::seed_from_u64(seed),
        }
    }

    pub fn from_entropy() -> Self {
        Self::new_with_seed(rand::random())
    }
}

impl DiceRoller for SeededRoller {
    fn roll_face(&mut self) -> u8 {
        self.rng.random_range(MIN_FACE..=MAX_FACE)
    }
}

/// Replays a fixed list of faces in order.
///
/// Once the script runs out the last face keeps repeating (or `1` for an empty script),
/// so a short script never panics mid-roll.
#[derive(Debug, Clone, Default)]
pub struct ScriptedRoller {
    faces: Vec<u8>,
    position: usize,
}

impl ScriptedRoller {
    pub fn new(faces: impl Into<Vec<u8>>) -> Self {
        Self {
            faces: faces.into(),
            position: 0,
        }
    }

    pub fn remaining(&self) -> usize {
        self.faces.len().saturating_sub(self.position)
    }
}

impl DiceRoller for ScriptedRoller {
    fn roll_face(&mut self) -> u8 {
        let face = match self.faces.get(self.position) {
            Some(&f) => f,
            None => self.faces.last().copied().unwrap_or(MIN_FACE),
        };
        self.position += 1;
        face
    }
}

/// Re-rolls every die that is not held and returns the indices that were rolled.
pub fn roll_unheld(dice: &mut [Die], roller: &mut dyn DiceRoller) -> Vec<usize> {
    let mut rolled = Vec::with_capacity(dice.len());
    for (i, die) in dice.iter_mut().enumerate() {
        if !die.held {
            die.value = roller.roll_face();
            rolled.push(i);
        }
    }
    rolled
}

/// Adapts a [`DiceRoller`] into a draw source so a roll-off can reuse the tie-break protocol.
pub struct DiceDrawSource<'a> {
    roller: &'a mut dyn DiceRoller,
}

impl<'a> DiceDrawSource<'a> {
    pub fn new(roller: &'a mut dyn DiceRoller) -> Self {
        Self { roller }
    }
}

impl DrawSource for DiceDrawSource<'_> {
    fn reset(&mut self) {}

    fn draw(&mut self) -> Option<DrawnItem> {
        Some(DrawnItem::Die(self.roller.roll_face()))
    }
}
