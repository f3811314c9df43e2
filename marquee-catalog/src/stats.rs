use marquee_shared::{Reservation, ReservationStatus};
use serde::{Deserialize, Serialize};

/// Dashboard counters for the admin panel
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct AdminStats {
    pub total_movies: usize,
    pub total_showtimes: usize,
    pub total_reservations: usize,
    pub cancelled_reservations: usize,
    /// Sum of confirmed reservation totals
    pub total_revenue: i64,
}

impl AdminStats {
    pub fn compute(movies: usize, showtimes: usize, reservations: &[Reservation]) -> Self {
        let cancelled = reservations
            .iter()
            .filter(|r| r.status == ReservationStatus::Cancelled)
            .count();
        let revenue = reservations
            .iter()
            .filter(|r| r.is_confirmed())
            .map(|r| r.total_price)
            .sum();

        Self {
            total_movies: movies,
            total_showtimes: showtimes,
            total_reservations: reservations.len(),
            cancelled_reservations: cancelled,
            total_revenue: revenue,
        }
    }
}
