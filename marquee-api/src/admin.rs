use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use chrono::{NaiveDate, NaiveTime};
use marquee_catalog::AdminStats;
use marquee_core::CoreError;
use marquee_shared::{Hall, Movie, Showtime};
use serde::{Deserialize, Serialize};

use crate::{error::AppError, state::AppState};

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct CreateShowtimeRequest {
    #[serde(default)]
    pub id: Option<String>,
    pub movie_id: String,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub hall_id: String,
    /// Defaults to the hall's price
    pub price: Option<i64>,
    pub total_seats: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct CreatedResponse {
    pub id: String,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/movies", post(create_movie))
        .route("/movies/{id}", put(update_movie).delete(delete_movie))
        .route("/showtimes", post(create_showtime))
        .route("/showtimes/{id}", put(update_showtime).delete(delete_showtime))
        .route("/halls", get(list_halls))
        .route("/stats", get(get_stats))
}

fn validate_movie(movie: &Movie) -> Result<(), CoreError> {
    if movie.title.trim().is_empty() {
        return Err(CoreError::ValidationError("Movie title is required".to_string()));
    }
    if movie.duration == 0 {
        return Err(CoreError::ValidationError("Movie duration must be positive".to_string()));
    }
    Ok(())
}

/// Upper bound on a seat price, in the smallest currency unit
const MAX_SHOWTIME_PRICE: i64 = 10_000_000;

fn validate_showtime(showtime: &Showtime) -> Result<(), CoreError> {
    if showtime.price <= 0 {
        return Err(CoreError::ValidationError("Showtime price must be positive".to_string()));
    }
    if showtime.price > MAX_SHOWTIME_PRICE {
        return Err(CoreError::ValidationError(format!(
            "Showtime price must not exceed {}",
            MAX_SHOWTIME_PRICE
        )));
    }
    if showtime.total_seats == 0 || showtime.available_seats > showtime.total_seats {
        return Err(CoreError::ValidationError(
            "Available seats must be between 0 and the total seat count".to_string(),
        ));
    }
    Ok(())
}

async fn ensure_movie(state: &AppState, movie_id: &str) -> Result<(), AppError> {
    if state.movies.get_movie(movie_id).await?.is_none() {
        return Err(CoreError::ValidationError(format!("Unknown movie {}", movie_id)).into());
    }
    Ok(())
}

async fn find_hall(state: &AppState, hall_id: &str) -> Result<Hall, AppError> {
    state
        .showtimes
        .list_halls()
        .await?
        .into_iter()
        .find(|h| h.id == hall_id)
        .ok_or_else(|| CoreError::ValidationError(format!("Unknown hall {}", hall_id)).into())
}

// ============================================================================
// Movie Handlers
// ============================================================================

/// POST /v1/admin/movies
async fn create_movie(
    State(state): State<AppState>,
    Json(movie): Json<Movie>,
) -> Result<(StatusCode, Json<CreatedResponse>), AppError> {
    validate_movie(&movie)?;
    let id = state
        .movies
        .create_movie(&movie)
        .await
        .map_err(|e| AppError::ConflictError(e.to_string()))?;

    tracing::info!(movie_id = %id, "Movie created");
    Ok((StatusCode::CREATED, Json(CreatedResponse { id })))
}

/// PUT /v1/admin/movies/{id}
async fn update_movie(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(movie): Json<Movie>,
) -> Result<Json<Movie>, AppError> {
    validate_movie(&movie)?;
    if !state.movies.update_movie(&id, &movie).await? {
        return Err(CoreError::NotFound(format!("Movie {}", id)).into());
    }
    Ok(Json(Movie { id, ..movie }))
}

/// DELETE /v1/admin/movies/{id}
async fn delete_movie(State(state): State<AppState>, Path(id): Path<String>) -> Result<StatusCode, AppError> {
    if !state.movies.delete_movie(&id).await? {
        return Err(CoreError::NotFound(format!("Movie {}", id)).into());
    }
    tracing::info!(movie_id = %id, "Movie deleted");
    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// Showtime Handlers
// ============================================================================

/// POST /v1/admin/showtimes
async fn create_showtime(
    State(state): State<AppState>,
    Json(req): Json<CreateShowtimeRequest>,
) -> Result<(StatusCode, Json<CreatedResponse>), AppError> {
    ensure_movie(&state, &req.movie_id).await?;
    let hall = find_hall(&state, &req.hall_id).await?;

    let total_seats = req
        .total_seats
        .unwrap_or(state.business_rules.default_showtime_seats);
    let showtime = Showtime {
        id: req.id.unwrap_or_default(),
        movie_id: req.movie_id,
        date: req.date,
        time: req.time,
        hall_id: hall.id,
        price: req.price.unwrap_or(hall.default_price),
        available_seats: total_seats,
        total_seats,
    };
    validate_showtime(&showtime)?;

    let id = state
        .showtimes
        .create_showtime(&showtime)
        .await
        .map_err(|e| AppError::ConflictError(e.to_string()))?;

    tracing::info!(showtime_id = %id, movie_id = %showtime.movie_id, "Showtime created");
    Ok((StatusCode::CREATED, Json(CreatedResponse { id })))
}

/// PUT /v1/admin/showtimes/{id}
async fn update_showtime(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(showtime): Json<Showtime>,
) -> Result<Json<Showtime>, AppError> {
    validate_showtime(&showtime)?;
    ensure_movie(&state, &showtime.movie_id).await?;
    find_hall(&state, &showtime.hall_id).await?;

    if !state.showtimes.update_showtime(&id, &showtime).await? {
        return Err(CoreError::NotFound(format!("Showtime {}", id)).into());
    }
    Ok(Json(Showtime { id, ..showtime }))
}

/// DELETE /v1/admin/showtimes/{id}
async fn delete_showtime(State(state): State<AppState>, Path(id): Path<String>) -> Result<StatusCode, AppError> {
    if !state.showtimes.delete_showtime(&id).await? {
        return Err(CoreError::NotFound(format!("Showtime {}", id)).into());
    }
    tracing::info!(showtime_id = %id, "Showtime deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// GET /v1/admin/halls
async fn list_halls(State(state): State<AppState>) -> Result<Json<Vec<Hall>>, AppError> {
    Ok(Json(state.showtimes.list_halls().await?))
}

/// GET /v1/admin/stats
async fn get_stats(State(state): State<AppState>) -> Result<Json<AdminStats>, AppError> {
    let movies = state.movies.list_movies().await?;
    let showtimes = state.showtimes.list_showtimes().await?;
    let reservations = state.booking.reservations.list_all().await?;

    Ok(Json(AdminStats::compute(movies.len(), showtimes.len(), &reservations)))
}
