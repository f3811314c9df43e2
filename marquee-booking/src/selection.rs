use marquee_shared::{Seat, SeatId, SeatStatus};
use serde::{Deserialize, Serialize};

pub const DEFAULT_MAX_SEATS: usize = 8;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SelectionError {
    #[error("Seat {seat_id} cannot be selected ({status:?})")]
    NotSelectable { seat_id: SeatId, status: SeatStatus },

    #[error("You can select at most {max} seats")]
    CapacityReached { max: usize },

    #[error("Seat {0} is already selected")]
    AlreadySelected(SeatId),
}

/// Seats picked for one showtime, in the order they were picked.
///
/// Every rejected mutation leaves the selection untouched. The cached total
/// is recomputed after each change using the last per-seat price given to
/// [`compute_total`](Selection::compute_total).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Selection {
    showtime_id: Option<String>,
    seats: Vec<Seat>,
    per_seat_price: i64,
    total: i64,
    max_seats: usize,
}

impl Default for Selection {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_SEATS)
    }
}

impl Selection {
    pub fn new(max_seats: usize) -> Self {
        Self {
            showtime_id: None,
            seats: Vec::new(),
            per_seat_price: 0,
            total: 0,
            max_seats,
        }
    }

    pub fn showtime_id(&self) -> Option<&str> {
        self.showtime_id.as_deref()
    }

    pub fn seats(&self) -> &[Seat] {
        &self.seats
    }

    pub fn seat_ids(&self) -> Vec<SeatId> {
        self.seats.iter().map(|s| s.id.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.seats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seats.is_empty()
    }

    pub fn max_seats(&self) -> usize {
        self.max_seats
    }

    pub fn contains(&self, seat_id: &SeatId) -> bool {
        self.seats.iter().any(|s| &s.id == seat_id)
    }

    pub fn total(&self) -> i64 {
        self.total
    }

    pub fn select(&mut self, seat: &Seat) -> Result<(), SelectionError> {
        if self.contains(&seat.id) {
            return Err(SelectionError::AlreadySelected(seat.id.clone()));
        }
        if !seat.is_selectable() {
            return Err(SelectionError::NotSelectable {
                seat_id: seat.id.clone(),
                status: seat.status,
            });
        }
        if self.seats.len() >= self.max_seats {
            return Err(SelectionError::CapacityReached { max: self.max_seats });
        }

        self.seats.push(seat.clone().with_status(SeatStatus::Selected));
        self.recompute();
        Ok(())
    }

    /// Returns whether the seat was selected.
    pub fn deselect(&mut self, seat_id: &SeatId) -> bool {
        let before = self.seats.len();
        self.seats.retain(|s| &s.id != seat_id);
        let removed = self.seats.len() < before;
        if removed {
            self.recompute();
        }
        removed
    }

    pub fn clear(&mut self) {
        self.seats.clear();
        self.total = 0;
    }

    /// Switch to another showtime. Seats never carry over between showtimes,
    /// so a different id clears the selection. Returns whether it was cleared.
    pub fn set_showtime(&mut self, showtime_id: &str) -> bool {
        if self.showtime_id.as_deref() == Some(showtime_id) {
            return false;
        }
        self.showtime_id = Some(showtime_id.to_string());
        let had_seats = !self.seats.is_empty();
        self.clear();
        had_seats
    }

    /// Sum of each seat's override price, or `per_seat_price` when it has none.
    pub fn compute_total(&mut self, per_seat_price: i64) -> i64 {
        self.per_seat_price = per_seat_price;
        self.recompute();
        self.total
    }

    fn recompute(&mut self) {
        self.total = self
            .seats
            .iter()
            .map(|s| s.price_or(self.per_seat_price))
            .sum();
    }
}
