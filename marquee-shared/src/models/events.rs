use crate::models::seat::SeatId;

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, PartialEq)]
pub struct SeatsOccupiedEvent {
    pub showtime_id: String,
    pub seat_ids: Vec<SeatId>,
    pub transaction_id: String,
    pub occupied_at: i64,
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, PartialEq)]
pub struct SeatsReleasedEvent {
    pub showtime_id: String,
    pub seat_ids: Vec<SeatId>,
    pub reservation_id: String,
    pub released_at: i64,
}

/// Live seat-map update pushed to subscribers of a showtime
#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SeatMapEvent {
    Occupied(SeatsOccupiedEvent),
    Released(SeatsReleasedEvent),
}

impl SeatMapEvent {
    pub fn showtime_id(&self) -> &str {
        match self {
            SeatMapEvent::Occupied(e) => &e.showtime_id,
            SeatMapEvent::Released(e) => &e.showtime_id,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            SeatMapEvent::Occupied(_) => "seats_occupied",
            SeatMapEvent::Released(_) => "seats_released",
        }
    }
}
