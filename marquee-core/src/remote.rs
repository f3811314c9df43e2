use async_trait::async_trait;
use marquee_shared::SeatId;
use serde::{Deserialize, Serialize};

use crate::BoxError;

/// Best-effort read of seats a backend considers occupied.
///
/// Callers treat any error as "nothing known from this source".
#[async_trait]
pub trait OccupancySource: Send + Sync {
    /// Short name used in logs and merge reports
    fn name(&self) -> &str;

    async fn occupied_seats(&self, showtime_id: &str) -> Result<Vec<SeatId>, BoxError>;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteReservationRequest {
    pub user_id: String,
    pub showtime_id: String,
    pub seat_ids: Vec<SeatId>,
}

/// Best-effort write of reservations to a backend reservation service.
#[async_trait]
pub trait ReservationGateway: Send + Sync {
    /// Returns the backend's reservation id.
    async fn create_reservation(
        &self,
        request: &RemoteReservationRequest,
    ) -> Result<String, BoxError>;

    async fn cancel_reservation(&self, reservation_id: &str) -> Result<(), BoxError>;
}
