use axum::{
    extract::{Path, State},
    routing::{get, post},
    Extension, Json, Router,
};
use marquee_shared::{Reservation, Ticket};

use crate::{error::AppError, middleware::auth::CustomerClaims, state::AppState};

/// Confirmation lookup. The transaction id is the capability, so no token
/// is needed.
pub fn ticket_routes() -> Router<AppState> {
    Router::new().route("/{transaction_id}", get(get_ticket))
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_reservations))
        .route("/{id}/cancel", post(cancel_reservation))
}

/// GET /v1/tickets/{transaction_id}
async fn get_ticket(
    State(state): State<AppState>,
    Path(transaction_id): Path<String>,
) -> Result<Json<Ticket>, AppError> {
    let ticket = state.booking.get_by_transaction_id(&transaction_id).await?;
    Ok(Json(ticket))
}

/// GET /v1/reservations
async fn list_reservations(
    State(state): State<AppState>,
    Extension(claims): Extension<CustomerClaims>,
) -> Result<Json<Vec<Reservation>>, AppError> {
    let reservations = state.booking.reservations.list_for_user(&claims.sub).await?;
    Ok(Json(reservations))
}

/// POST /v1/reservations/{id}/cancel
async fn cancel_reservation(
    State(state): State<AppState>,
    Extension(claims): Extension<CustomerClaims>,
    Path(id): Path<String>,
) -> Result<Json<Reservation>, AppError> {
    let reservation = state.booking.cancel(&id, &claims.sub).await?;
    Ok(Json(reservation))
}
