use std::convert::Infallible;

use axum::{
    extract::{Path, State},
    response::sse::{Event, KeepAlive, Sse},
    routing::get,
    Json, Router,
};
use futures_util::{Stream, StreamExt};
use marquee_catalog::SeatMap;
use marquee_shared::Showtime;
use marquee_store::SourceSnapshot;
use serde::Serialize;
use tokio_stream::wrappers::BroadcastStream;

use crate::{error::AppError, state::AppState};

#[derive(Debug, Serialize)]
pub struct SeatMapResponse {
    #[serde(flatten)]
    pub map: SeatMap,
    pub price: i64,
    pub available_seats: usize,
    pub total_seats: usize,
    pub sources: Vec<SourceSnapshot>,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/{id}", get(get_showtime))
        .route("/{id}/seats", get(get_seat_map))
        .route("/{id}/stream", get(stream_seat_events))
}

pub(crate) async fn load_showtime(state: &AppState, id: &str) -> Result<Showtime, AppError> {
    state
        .showtimes
        .get_showtime(id)
        .await?
        .ok_or_else(|| AppError::NotFoundError(format!("Showtime {} not found", id)))
}

/// Generated layout with every known occupied seat applied.
pub(crate) async fn current_seat_map(state: &AppState, showtime: &Showtime) -> SeatMapResponse {
    let occupancy = state.booking.ledger.fetch_merged_occupancy(&showtime.id).await;
    let map = state.seat_maps.generate_priced(showtime, &occupancy.seats);

    SeatMapResponse {
        price: showtime.price,
        available_seats: map.available_count(),
        total_seats: map.total_count(),
        sources: occupancy.sources,
        map,
    }
}

/// GET /v1/showtimes/{id}
async fn get_showtime(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<Showtime>, AppError> {
    load_showtime(&state, &id).await.map(Json)
}

/// GET /v1/showtimes/{id}/seats
async fn get_seat_map(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SeatMapResponse>, AppError> {
    let showtime = load_showtime(&state, &id).await?;
    Ok(Json(current_seat_map(&state, &showtime).await))
}

/// GET /v1/showtimes/{id}/stream
///
/// Server-sent seat events for one showtime. Lagged receivers skip the
/// missed events; clients refetch the seat map on reconnect.
async fn stream_seat_events(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, AppError> {
    load_showtime(&state, &id).await?;
    let rx = state.sse_tx.subscribe();

    let stream = BroadcastStream::new(rx).filter_map(move |result| {
        let showtime_id = id.clone();
        async move {
            match result {
                Ok(event) if event.showtime_id() == showtime_id => {
                    let data = serde_json::to_string(&event).ok()?;
                    Some(Ok::<_, Infallible>(Event::default().event(event.name()).data(data)))
                }
                Ok(_) => None,
                Err(e) => {
                    tracing::debug!(showtime_id = %showtime_id, "Seat event stream lagged: {}", e);
                    None
                }
            }
        }
    });

    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}
