//! Seat-selection sessions. Each session owns one selection and its own
//! checkout, so two sessions of the same user never block each other.
//! Sessions end on `DELETE` or after sitting idle.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, post, put},
    Extension, Json, Router,
};
use chrono::{DateTime, Duration, Utc};
use marquee_booking::{CommitState, ReservationCommitter, Selection};
use marquee_shared::{PaymentDetails, Seat, SeatId, Ticket};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::interval;
use uuid::Uuid;

use crate::{
    error::AppError,
    middleware::auth::CustomerClaims,
    showtimes::{current_seat_map, load_showtime},
    state::AppState,
};

/// How often the idle sweeper runs
const SWEEP_INTERVAL_SECS: u64 = 60;

pub struct Session {
    pub id: Uuid,
    pub owner: String,
    pub created_at: DateTime<Utc>,
    /// Unix millis of the last request that touched this session
    last_seen: AtomicI64,
    selection: Mutex<Selection>,
    committer: ReservationCommitter,
}

impl Session {
    fn touch(&self) {
        self.last_seen.store(Utc::now().timestamp_millis(), Ordering::Relaxed);
    }

    fn last_seen(&self) -> i64 {
        self.last_seen.load(Ordering::Relaxed)
    }
}

#[derive(Debug, Serialize)]
pub struct SessionView {
    pub id: Uuid,
    pub showtime_id: Option<String>,
    pub seats: Vec<Seat>,
    pub total: i64,
    pub max_seats: usize,
    pub state: CommitState,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Default, Deserialize)]
struct CreateSessionRequest {
    showtime_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SetShowtimeRequest {
    showtime_id: String,
}

#[derive(Debug, Deserialize)]
struct SelectSeatRequest {
    seat_id: String,
}

#[derive(Debug, Serialize)]
struct CommitResponse {
    transaction_id: String,
    ticket: Ticket,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", post(create_session))
        .route("/{id}", get(get_session).delete(close_session))
        .route("/{id}/showtime", put(set_showtime))
        .route("/{id}/seats", post(select_seat).delete(clear_seats))
        .route("/{id}/seats/{seat_id}", delete(deselect_seat))
        .route("/{id}/commit", post(commit_session))
}

fn view(session: &Session, selection: &Selection) -> SessionView {
    SessionView {
        id: session.id,
        showtime_id: selection.showtime_id().map(str::to_string),
        seats: selection.seats().to_vec(),
        total: selection.total(),
        max_seats: selection.max_seats(),
        state: session.committer.state(),
        created_at: session.created_at,
    }
}

async fn find_session(state: &AppState, id: Uuid, claims: &CustomerClaims) -> Result<Arc<Session>, AppError> {
    let session = state
        .sessions
        .read()
        .await
        .get(&id)
        .cloned()
        .ok_or_else(|| AppError::NotFoundError(format!("Session {} not found", id)))?;

    if session.owner != claims.sub {
        return Err(AppError::AuthorizationError(
            "Session does not belong to you".to_string(),
        ));
    }
    session.touch();
    Ok(session)
}

/// Drop sessions not touched since `cutoff`. Sessions in the middle of a
/// checkout are kept. Returns how many were dropped.
pub async fn sweep_idle_sessions(state: &AppState, cutoff: DateTime<Utc>) -> usize {
    let cutoff = cutoff.timestamp_millis();
    let mut sessions = state.sessions.write().await;
    let before = sessions.len();
    sessions.retain(|_, s| s.committer.is_processing() || s.last_seen() >= cutoff);
    before - sessions.len()
}

/// Background task dropping sessions idle for longer than
/// `booking.session_idle_seconds`.
pub fn spawn_idle_sweeper(state: AppState) -> JoinHandle<()> {
    let max_idle = Duration::seconds(state.business_rules.session_idle_seconds as i64);
    tokio::spawn(async move {
        let mut ticker = interval(std::time::Duration::from_secs(SWEEP_INTERVAL_SECS));
        loop {
            ticker.tick().await;
            let dropped = sweep_idle_sessions(&state, Utc::now() - max_idle).await;
            if dropped > 0 {
                tracing::debug!(dropped, "Dropped idle sessions");
            }
        }
    })
}

fn parse_seat_id(raw: &str) -> Result<SeatId, AppError> {
    raw.parse()
        .map_err(|e| AppError::ValidationError(format!("Invalid seat id {}: {}", raw, e)))
}

/// POST /v1/sessions
async fn create_session(
    State(state): State<AppState>,
    Extension(claims): Extension<CustomerClaims>,
    Json(req): Json<CreateSessionRequest>,
) -> Result<(StatusCode, Json<SessionView>), AppError> {
    let mut selection = Selection::new(state.business_rules.max_seats);
    if let Some(showtime_id) = &req.showtime_id {
        let showtime = load_showtime(&state, showtime_id).await?;
        selection.set_showtime(&showtime.id);
        selection.compute_total(showtime.price);
    }

    let session = Arc::new(Session {
        id: Uuid::new_v4(),
        owner: claims.sub.clone(),
        created_at: Utc::now(),
        last_seen: AtomicI64::new(Utc::now().timestamp_millis()),
        selection: Mutex::new(selection),
        committer: ReservationCommitter::new(state.booking.clone()),
    });
    let body = view(&session, &*session.selection.lock().await);

    state.sessions.write().await.insert(session.id, session.clone());
    tracing::debug!(session_id = %session.id, user_id = %claims.sub, "Session created");

    Ok((StatusCode::CREATED, Json(body)))
}

/// GET /v1/sessions/{id}
async fn get_session(
    State(state): State<AppState>,
    Extension(claims): Extension<CustomerClaims>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionView>, AppError> {
    let session = find_session(&state, id, &claims).await?;
    let selection = session.selection.lock().await;
    Ok(Json(view(&session, &selection)))
}

/// DELETE /v1/sessions/{id}
async fn close_session(
    State(state): State<AppState>,
    Extension(claims): Extension<CustomerClaims>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let session = find_session(&state, id, &claims).await?;
    if session.committer.is_processing() {
        return Err(AppError::ConflictError(
            "A reservation is being processed for this session".to_string(),
        ));
    }

    state.sessions.write().await.remove(&id);
    tracing::debug!(session_id = %id, "Session closed");
    Ok(StatusCode::NO_CONTENT)
}

/// PUT /v1/sessions/{id}/showtime
async fn set_showtime(
    State(state): State<AppState>,
    Extension(claims): Extension<CustomerClaims>,
    Path(id): Path<Uuid>,
    Json(req): Json<SetShowtimeRequest>,
) -> Result<Json<SessionView>, AppError> {
    let session = find_session(&state, id, &claims).await?;
    let showtime = load_showtime(&state, &req.showtime_id).await?;

    let mut selection = session.selection.lock().await;
    if selection.set_showtime(&showtime.id) {
        tracing::debug!(session_id = %id, showtime_id = %showtime.id, "Showtime changed, selection cleared");
    }
    selection.compute_total(showtime.price);
    Ok(Json(view(&session, &selection)))
}

/// POST /v1/sessions/{id}/seats
async fn select_seat(
    State(state): State<AppState>,
    Extension(claims): Extension<CustomerClaims>,
    Path(id): Path<Uuid>,
    Json(req): Json<SelectSeatRequest>,
) -> Result<Json<SessionView>, AppError> {
    let session = find_session(&state, id, &claims).await?;
    let seat_id = parse_seat_id(&req.seat_id)?;

    let mut selection = session.selection.lock().await;
    let showtime_id = selection
        .showtime_id()
        .ok_or_else(|| AppError::ValidationError("Select a showtime first".to_string()))?
        .to_string();
    let showtime = load_showtime(&state, &showtime_id).await?;

    // Status comes from the live map so seats sold elsewhere are rejected here
    let current = current_seat_map(&state, &showtime).await;
    let seat = current
        .map
        .seat(&seat_id)
        .ok_or_else(|| AppError::NotFoundError(format!("Seat {} does not exist", seat_id)))?;

    selection.select(seat)?;
    selection.compute_total(showtime.price);
    Ok(Json(view(&session, &selection)))
}

/// DELETE /v1/sessions/{id}/seats/{seat_id}
async fn deselect_seat(
    State(state): State<AppState>,
    Extension(claims): Extension<CustomerClaims>,
    Path((id, seat_id)): Path<(Uuid, String)>,
) -> Result<Json<SessionView>, AppError> {
    let session = find_session(&state, id, &claims).await?;
    let seat_id = parse_seat_id(&seat_id)?;

    let mut selection = session.selection.lock().await;
    if !selection.deselect(&seat_id) {
        return Err(AppError::NotFoundError(format!("Seat {} is not selected", seat_id)));
    }
    Ok(Json(view(&session, &selection)))
}

/// DELETE /v1/sessions/{id}/seats
async fn clear_seats(
    State(state): State<AppState>,
    Extension(claims): Extension<CustomerClaims>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionView>, AppError> {
    let session = find_session(&state, id, &claims).await?;
    let mut selection = session.selection.lock().await;
    selection.clear();
    Ok(Json(view(&session, &selection)))
}

/// POST /v1/sessions/{id}/commit
async fn commit_session(
    State(state): State<AppState>,
    Extension(claims): Extension<CustomerClaims>,
    Path(id): Path<Uuid>,
    Json(details): Json<PaymentDetails>,
) -> Result<(StatusCode, Json<CommitResponse>), AppError> {
    let session = find_session(&state, id, &claims).await?;

    // Reject a double submit instead of queueing it behind the selection lock
    if session.committer.is_processing() {
        return Err(AppError::ConflictError(
            "A reservation is already being processed".to_string(),
        ));
    }

    let mut selection = session.selection.lock().await;
    let transaction_id = session
        .committer
        .commit(&mut selection, &claims.sub, &details)
        .await?;
    let ticket = session.committer.get_by_transaction_id(&transaction_id).await?;

    Ok((
        StatusCode::CREATED,
        Json(CommitResponse {
            transaction_id,
            ticket,
        }),
    ))
}
