use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::catalog::{Movie, Showtime};
use super::payment::PaymentMethod;
use super::seat::{Seat, SeatId};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ReservationStatus {
    Confirmed,
    Cancelled,
}

/// A confirmed booking of seats for one showtime.
///
/// Records are never deleted; cancellation only flips the status.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Reservation {
    pub id: String,
    pub user_id: String,
    pub showtime_id: String,
    pub seat_ids: Vec<SeatId>,
    pub total_price: i64,
    pub status: ReservationStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub transaction_id: String,
    /// Id assigned by the backend reservation service, when it was reachable
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote_id: Option<String>,
}

impl Reservation {
    pub fn new(
        id: String,
        user_id: String,
        showtime_id: String,
        seat_ids: Vec<SeatId>,
        total_price: i64,
        transaction_id: String,
    ) -> Self {
        let now = Utc::now();
        Self {
            id,
            user_id,
            showtime_id,
            seat_ids,
            total_price,
            status: ReservationStatus::Confirmed,
            created_at: now,
            updated_at: now,
            transaction_id,
            remote_id: None,
        }
    }

    pub fn is_confirmed(&self) -> bool {
        self.status == ReservationStatus::Confirmed
    }

    pub fn cancel(&mut self) {
        self.status = ReservationStatus::Cancelled;
        self.updated_at = Utc::now();
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CustomerInfo {
    pub name: String,
    pub email: String,
    pub phone: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PaymentSummary {
    /// Card number with all but the last four digits masked
    pub card_number: String,
    pub method: PaymentMethod,
    pub amount: i64,
    pub currency: String,
}

/// Confirmation-page projection of a reservation, keyed by transaction id.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Ticket {
    pub transaction_id: String,
    pub reservation: Reservation,
    pub movie: Option<Movie>,
    pub showtime: Showtime,
    pub seats: Vec<Seat>,
    pub customer: CustomerInfo,
    pub payment: PaymentSummary,
    pub purchased_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancel_flips_status_only() {
        let mut reservation = Reservation::new(
            "RES-1".to_string(),
            "user-1".to_string(),
            "S1".to_string(),
            vec![SeatId::new("A", 1), SeatId::new("A", 2)],
            30000,
            "TXN-1".to_string(),
        );
        assert!(reservation.is_confirmed());

        reservation.cancel();

        assert_eq!(reservation.status, ReservationStatus::Cancelled);
        assert_eq!(reservation.seat_ids.len(), 2);
        assert_eq!(reservation.total_price, 30000);
        assert!(reservation.updated_at >= reservation.created_at);
    }

    #[test]
    fn test_reservation_json_uses_plain_seat_ids() {
        let reservation = Reservation::new(
            "RES-1".to_string(),
            "user-1".to_string(),
            "S1".to_string(),
            vec![SeatId::new("A", 1)],
            15000,
            "TXN-1".to_string(),
        );
        let json = serde_json::to_value(&reservation).unwrap();
        assert_eq!(json["seat_ids"], serde_json::json!(["A1"]));
        assert_eq!(json["status"], "confirmed");
    }
}
