use axum::{extract::State, routing::get, Extension, Json, Router};
use marquee_shared::{Reservation, UserProfile};
use serde::Serialize;

use crate::{error::AppError, middleware::auth::CustomerClaims, state::AppState};

#[derive(Debug, Serialize)]
struct ProfileResponse {
    user: UserProfile,
    reservations: Vec<Reservation>,
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/me", get(get_profile))
}

/// GET /v1/users/me
///
/// Account details plus the user's reservations. Guest tokens have no account.
async fn get_profile(
    State(state): State<AppState>,
    Extension(claims): Extension<CustomerClaims>,
) -> Result<Json<ProfileResponse>, AppError> {
    let account = state
        .users
        .get(&claims.sub)
        .await?
        .ok_or_else(|| AppError::NotFoundError("No account for this token".to_string()))?;
    let reservations = state.booking.reservations.list_for_user(&claims.sub).await?;

    Ok(Json(ProfileResponse {
        user: UserProfile::from(&account),
        reservations,
    }))
}
