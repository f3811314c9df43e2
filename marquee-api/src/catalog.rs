use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use chrono::NaiveDate;
use marquee_catalog::MovieFilter;
use marquee_shared::{Movie, Showtime};
use serde::Deserialize;

use crate::{error::AppError, state::AppState};

#[derive(Debug, Deserialize)]
struct ShowtimeQuery {
    date: Option<NaiveDate>,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_movies))
        .route("/{id}", get(get_movie))
        .route("/{id}/showtimes", get(list_movie_showtimes))
}

/// GET /v1/movies
async fn list_movies(
    State(state): State<AppState>,
    Query(filter): Query<MovieFilter>,
) -> Result<Json<Vec<Movie>>, AppError> {
    let movies = state.movies.list_movies().await?;
    Ok(Json(filter.apply(movies)))
}

/// GET /v1/movies/{id}
async fn get_movie(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<Movie>, AppError> {
    state
        .movies
        .get_movie(&id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFoundError(format!("Movie {} not found", id)))
}

/// GET /v1/movies/{id}/showtimes
async fn list_movie_showtimes(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<ShowtimeQuery>,
) -> Result<Json<Vec<Showtime>>, AppError> {
    if state.movies.get_movie(&id).await?.is_none() {
        return Err(AppError::NotFoundError(format!("Movie {} not found", id)));
    }
    let showtimes = state.showtimes.list_by_movie(&id, query.date).await?;
    Ok(Json(showtimes))
}
