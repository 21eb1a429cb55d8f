use serde::{Deserialize, Serialize};

pub type PlayerId = String;

/// Who controls a seat.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeatKind {
    Human,
    /// Autoplayed by the host
    Bot,
}

/// A player's chair at the table.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct Seat {
    pub id: PlayerId,
    pub name: String,
    pub kind: SeatKind,
    /// Sitting-out seats keep their chair but are skipped by dealer selection and turn order
    #[serde(default)]
    pub sitting_out: bool,
}

impl Seat {
    pub fn human(id: impl Into<PlayerId>) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            kind: SeatKind::Human,
            sitting_out: false,
        }
    }

    pub fn bot(id: impl Into<PlayerId>) -> Self {
        Self {
            kind: SeatKind::Bot,
            ..Self::human(id)
        }
    }

    pub fn is_bot(&self) -> bool {
        self.kind == SeatKind::Bot
    }

    pub fn is_active(&self) -> bool {
        !self.sitting_out
    }
}

/// Seats in clockwise order plus the dealer button.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct Table {
    seats: Vec<Seat>,
    dealer_position: usize,
}

impl Table {
    pub fn new(seats: Vec<Seat>) -> Self {
        Self {
            seats,
            dealer_position: 0,
        }
    }

    pub fn seats(&self) -> &[Seat] {
        &self.seats
    }

    pub fn seat(&self, position: usize) -> Option<&Seat> {
        self.seats.get(position)
    }

    pub fn seat_by_id(&self, id: &str) -> Option<&Seat> {
        self.seats.iter().find(|s| s.id == id)
    }

    pub fn position_of(&self, id: &str) -> Option<usize> {
        self.seats.iter().position(|s| s.id == id)
    }

    pub fn is_bot(&self, id: &str) -> bool {
        self.seat_by_id(id).is_some_and(Seat::is_bot)
    }

    pub fn dealer_position(&self) -> usize {
        self.dealer_position
    }

    /// Moves the button; out-of-range positions are ignored.
    pub fn set_dealer_position(&mut self, position: usize) {
        if position < self.seats.len() {
            self.dealer_position = position;
        }
    }

    pub fn set_sitting_out(&mut self, id: &str, sitting_out: bool) {
        if let Some(seat) = self.seats.iter_mut().find(|s| s.id == id) {
            seat.sitting_out = sitting_out;
        }
    }

    /// Positions that may be dealt a card during dealer selection.
    pub fn eligible_dealer_positions(&self) -> Vec<usize> {
        self.seats
            .iter()
            .enumerate()
            .filter(|(_, s)| s.is_active())
            .map(|(i, _)| i)
            .collect()
    }

    /// First seated participant, used when nobody is eligible to draw for the button.
    pub fn first_participant(&self) -> Option<usize> {
        if self.seats.is_empty() {
            None
        } else {
            Some(0)
        }
    }

    /// Passes the button to the next active seat clockwise. No-op when nobody is active.
    pub fn rotate_dealer(&mut self) {
        let n = self.seats.len();
        if let Some(next) = (1..=n)
            .map(|step| (self.dealer_position + step) % n)
            .find(|&p| self.seats[p].is_active())
        {
            self.dealer_position = next;
        }
    }

    /// Active seats starting left of the dealer, dealer last.
    pub fn turn_order(&self) -> Vec<PlayerId> {
        let n = self.seats.len();
        (1..=n)
            .map(|step| (self.dealer_position + step) % n)
            .filter_map(|p| self.seats.get(p))
            .filter(|s| s.is_active())
            .map(|s| s.id.clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(ids: &[&str]) -> Table {
        Table::new(ids.iter().map(|id| Seat::human(*id)).collect())
    }

    #[test]
    fn turn_order_starts_left_of_dealer() {
        let mut t = table(&["a", "b", "c", "d"]);
        t.set_dealer_position(1);
        assert_eq!(t.turn_order(), vec!["c", "d", "a", "b"]);
    }

    #[test]
    fn turn_order_skips_sitting_out_seats() {
        let mut t = table(&["a", "b", "c"]);
        t.set_sitting_out("b", true);
        assert_eq!(t.turn_order(), vec!["c", "a"]);
        assert_eq!(t.eligible_dealer_positions(), vec![0, 2]);
    }

    #[test]
    fn rotate_dealer_skips_inactive_seats() {
        let mut t = table(&["a", "b", "c"]);
        t.set_sitting_out("b", true);
        t.rotate_dealer();
        assert_eq!(t.dealer_position(), 2);
        t.rotate_dealer();
        assert_eq!(t.dealer_position(), 0);
    }

    #[test]
    fn empty_table_has_no_order() {
        let mut t = Table::new(Vec::new());
        t.rotate_dealer();
        assert!(t.turn_order().is_empty());
        assert_eq!(t.first_participant(), None);
    }

    #[test]
    fn bot_seats_are_flagged() {
        let t = Table::new(vec![Seat::human("h"), Seat::bot("b")]);
        assert!(t.is_bot("b"));
        assert!(!t.is_bot("h"));
        assert!(!t.is_bot("missing"));
    }
}
