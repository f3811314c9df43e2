use std::time::Duration;

use async_trait::async_trait;
use marquee_core::remote::{OccupancySource, RemoteReservationRequest, ReservationGateway};
use marquee_core::BoxError;
use marquee_shared::SeatId;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Client for the backend reservation service (`/api/reservations`).
#[derive(Clone)]
pub struct HttpReservationService {
    client: Client,
    base_url: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateReservationBody<'a> {
    user_id: &'a str,
    showtime_id: &'a str,
    seat_ids: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RemoteReservation {
    id: String,
    showtime_id: String,
    #[serde(default)]
    seat_ids: Vec<String>,
    #[serde(default)]
    status: Option<String>,
}

impl RemoteReservation {
    fn is_cancelled(&self) -> bool {
        self.status
            .as_deref()
            .is_some_and(|s| s.eq_ignore_ascii_case("cancelled"))
    }
}

impl HttpReservationService {
    pub fn new(base_url: &str, timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/reservations{}", self.base_url, path)
    }
}

#[async_trait]
impl OccupancySource for HttpReservationService {
    fn name(&self) -> &str {
        "reservation-service"
    }

    async fn occupied_seats(&self, showtime_id: &str) -> Result<Vec<SeatId>, BoxError> {
        let reservations: Vec<RemoteReservation> = self
            .client
            .get(self.url(""))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let mut seats = Vec::new();
        for reservation in reservations
            .iter()
            .filter(|r| r.showtime_id == showtime_id && !r.is_cancelled())
        {
            for raw in &reservation.seat_ids {
                match raw.parse::<SeatId>() {
                    Ok(id) => seats.push(id),
                    Err(e) => debug!(reservation_id = %reservation.id, seat = %raw, "Ignoring remote seat id: {}", e),
                }
            }
        }
        Ok(seats)
    }
}

#[async_trait]
impl ReservationGateway for HttpReservationService {
    async fn create_reservation(&self, request: &RemoteReservationRequest) -> Result<String, BoxError> {
        let body = CreateReservationBody {
            user_id: &request.user_id,
            showtime_id: &request.showtime_id,
            seat_ids: request.seat_ids.iter().map(ToString::to_string).collect(),
        };

        let created: RemoteReservation = self
            .client
            .post(self.url(""))
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(created.id)
    }

    async fn cancel_reservation(&self, reservation_id: &str) -> Result<(), BoxError> {
        self.client
            .put(self.url(&format!("/{}/cancel", reservation_id)))
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}
