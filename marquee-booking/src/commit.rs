use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::Arc;

use chrono::Utc;
use marquee_catalog::{InventoryError, ShowtimeInventory};
use marquee_core::remote::{RemoteReservationRequest, ReservationGateway};
use marquee_core::repository::{MovieRepository, ShowtimeRepository};
use marquee_shared::pii::mask_card_number;
use marquee_shared::{
    ids, CustomerInfo, PaymentDetails, PaymentSummary, Reservation, SeatId, SeatMapEvent, SeatStatus,
    SeatsOccupiedEvent, SeatsReleasedEvent, Showtime, Ticket,
};
use marquee_store::{OccupancyLedger, ReservationRepoError, ReservationRepository};
use serde::Serialize;
use tokio::sync::{broadcast, Mutex};
use tracing::{error, info, warn};

use crate::payment::{PaymentError, PaymentOrchestrator};
use crate::payment_form::{validate_payment_details, PaymentValidationErrors};
use crate::retry::{execute_with_retry, RetryPolicy};
use crate::selection::Selection;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum CommitState {
    Idle = 0,
    Validating = 1,
    Processing = 2,
    Committed = 3,
    Failed = 4,
}

impl CommitState {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => Self::Validating,
            2 => Self::Processing,
            3 => Self::Committed,
            4 => Self::Failed,
            _ => Self::Idle,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CommitError {
    #[error("No seats selected")]
    EmptySelection,

    #[error("No showtime selected")]
    MissingShowtime,

    #[error("Showtime not found: {0}")]
    ShowtimeNotFound(String),

    #[error("Invalid payment details: {0}")]
    InvalidPayment(#[from] PaymentValidationErrors),

    #[error("A reservation is already being processed")]
    InProgress,

    #[error("Seats no longer available: {}", join_ids(.0))]
    SeatsTaken(Vec<SeatId>),

    #[error(transparent)]
    Payment(#[from] PaymentError),

    #[error("Reservation not found: {0}")]
    NotFound(String),

    #[error("Reservation {0} belongs to another user")]
    Forbidden(String),

    #[error("Reservation {0} is already cancelled")]
    AlreadyCancelled(String),

    #[error("Storage failure: {0}")]
    Storage(String),
}

fn join_ids(ids: &[SeatId]) -> String {
    ids.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ")
}

impl From<ReservationRepoError> for CommitError {
    fn from(err: ReservationRepoError) -> Self {
        match err {
            ReservationRepoError::NotFound(id) => CommitError::NotFound(id),
            other => CommitError::Storage(other.to_string()),
        }
    }
}

fn storage<E: std::fmt::Display>(err: E) -> CommitError {
    CommitError::Storage(err.to_string())
}

/// Services shared by every checkout in the process
#[derive(Clone)]
pub struct BookingContext {
    pub ledger: Arc<OccupancyLedger>,
    pub reservations: Arc<ReservationRepository>,
    pub movies: Arc<dyn MovieRepository>,
    pub showtimes: Arc<dyn ShowtimeRepository>,
    pub inventory: ShowtimeInventory,
    pub payments: Arc<PaymentOrchestrator>,
    pub gateway: Option<Arc<dyn ReservationGateway>>,
    pub retry: RetryPolicy,
    pub events: broadcast::Sender<SeatMapEvent>,
    pub currency: String,
    // Serializes the final occupancy check with the write that follows it
    commit_lock: Arc<Mutex<()>>,
}

impl BookingContext {
    pub fn new(
        ledger: Arc<OccupancyLedger>,
        reservations: Arc<ReservationRepository>,
        movies: Arc<dyn MovieRepository>,
        showtimes: Arc<dyn ShowtimeRepository>,
        payments: Arc<PaymentOrchestrator>,
        events: broadcast::Sender<SeatMapEvent>,
        currency: &str,
    ) -> Self {
        Self {
            ledger,
            reservations,
            movies,
            inventory: ShowtimeInventory::new(showtimes.clone()),
            showtimes,
            payments,
            gateway: None,
            retry: RetryPolicy::default(),
            events,
            currency: currency.to_string(),
            commit_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn with_gateway(mut self, gateway: Arc<dyn ReservationGateway>, retry: RetryPolicy) -> Self {
        self.gateway = Some(gateway);
        self.retry = retry;
        self
    }

    pub async fn get_by_transaction_id(&self, transaction_id: &str) -> Result<Ticket, CommitError> {
        self.reservations
            .get_by_transaction_id(transaction_id)
            .await?
            .ok_or_else(|| CommitError::NotFound(transaction_id.to_string()))
    }

    /// Cancel a confirmed reservation owned by `user_id` and free its seats.
    /// The record is kept with status `cancelled`.
    pub async fn cancel(&self, reservation_id: &str, user_id: &str) -> Result<Reservation, CommitError> {
        let mut ticket = self
            .reservations
            .find_ticket(reservation_id)
            .await?
            .ok_or_else(|| CommitError::NotFound(reservation_id.to_string()))?;

        if ticket.reservation.user_id != user_id {
            return Err(CommitError::Forbidden(reservation_id.to_string()));
        }
        if !ticket.reservation.is_confirmed() {
            return Err(CommitError::AlreadyCancelled(reservation_id.to_string()));
        }

        let showtime_id = ticket.reservation.showtime_id.clone();
        let seat_ids = ticket.reservation.seat_ids.clone();

        // Seats first: a record only reads cancelled once its seats are free
        self.ledger.release(&showtime_id, &seat_ids).await.map_err(storage)?;

        ticket.reservation.cancel();
        if let Err(e) = self.reservations.update(&ticket).await {
            if let Err(restore_err) = self.ledger.mark_occupied(&showtime_id, &seat_ids).await {
                error!(reservation_id, "Failed to restore occupancy after a failed cancel: {}", restore_err);
            }
            return Err(e.into());
        }

        let reservation = ticket.reservation;
        let showtime_id = reservation.showtime_id.as_str();

        if let Err(e) = self
            .inventory
            .release(showtime_id, reservation.seat_ids.len() as u32)
            .await
        {
            warn!(showtime_id, "Could not return seats to inventory: {}", e);
        }

        if let Some(remote_id) = &reservation.remote_id {
            self.cancel_remote(remote_id).await;
        }

        let _ = self.events.send(SeatMapEvent::Released(SeatsReleasedEvent {
            showtime_id: reservation.showtime_id.clone(),
            seat_ids: reservation.seat_ids.clone(),
            reservation_id: reservation.id.clone(),
            released_at: Utc::now().timestamp_millis(),
        }));

        info!(reservation_id, showtime_id, seats = reservation.seat_ids.len(), "Reservation cancelled");
        Ok(reservation)
    }

    /// Best-effort cancel of a backend reservation.
    async fn cancel_remote(&self, remote_id: &str) {
        let Some(gateway) = &self.gateway else {
            return;
        };
        if let Err(e) = execute_with_retry(&self.retry, || gateway.cancel_reservation(remote_id)).await {
            warn!(remote_id, "Remote cancel failed, the backend keeps a stale reservation: {}", e);
        }
    }

    async fn load_showtime(&self, showtime_id: &str) -> Result<Showtime, CommitError> {
        self.showtimes
            .get_showtime(showtime_id)
            .await
            .map_err(storage)?
            .ok_or_else(|| CommitError::ShowtimeNotFound(showtime_id.to_string()))
    }

    async fn taken_seats(&self, showtime_id: &str, seat_ids: &[SeatId]) -> Vec<SeatId> {
        self.ledger
            .fetch_merged_occupancy(showtime_id)
            .await
            .conflicts(seat_ids)
    }

    /// Best-effort write to the backend service. `None` when it is not
    /// configured or every attempt failed.
    async fn write_remote(&self, user_id: &str, showtime_id: &str, seat_ids: &[SeatId]) -> Option<String> {
        let gateway = self.gateway.as_ref()?;
        let request = RemoteReservationRequest {
            user_id: user_id.to_string(),
            showtime_id: showtime_id.to_string(),
            seat_ids: seat_ids.to_vec(),
        };

        match execute_with_retry(&self.retry, || gateway.create_reservation(&request)).await {
            Ok(remote_id) => Some(remote_id),
            Err(e) => {
                warn!(showtime_id, "Remote reservation failed, keeping it local only: {}", e);
                None
            }
        }
    }
}

/// Clears the in-flight flag however the commit ends, including when the
/// caller drops the future.
struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Checkout for one seat-selection session.
///
/// `Idle → Validating → Processing → Committed`, or `Failed` from either
/// middle state. A failed commit leaves the selection and the ledger as they
/// were; the committer can be retried.
pub struct ReservationCommitter {
    ctx: BookingContext,
    state: AtomicU8,
    in_flight: AtomicBool,
}

impl ReservationCommitter {
    pub fn new(ctx: BookingContext) -> Self {
        Self {
            ctx,
            state: AtomicU8::new(CommitState::Idle as u8),
            in_flight: AtomicBool::new(false),
        }
    }

    pub fn state(&self) -> CommitState {
        CommitState::from_u8(self.state.load(Ordering::Acquire))
    }

    pub fn is_processing(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    pub fn context(&self) -> &BookingContext {
        &self.ctx
    }

    fn set_state(&self, state: CommitState) {
        self.state.store(state as u8, Ordering::Release);
    }

    pub async fn get_by_transaction_id(&self, transaction_id: &str) -> Result<Ticket, CommitError> {
        self.ctx.get_by_transaction_id(transaction_id).await
    }

    /// Pay for and persist the selected seats. Returns the transaction id.
    pub async fn commit(
        &self,
        selection: &mut Selection,
        user_id: &str,
        details: &PaymentDetails,
    ) -> Result<String, CommitError> {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(CommitError::InProgress);
        }
        let _in_flight = InFlight(&self.in_flight);

        match self.run(selection, user_id, details).await {
            Ok(transaction_id) => {
                self.set_state(CommitState::Committed);
                Ok(transaction_id)
            }
            Err(e) => {
                warn!(user_id, "Reservation commit failed: {}", e);
                self.set_state(CommitState::Failed);
                Err(e)
            }
        }
    }

    async fn run(
        &self,
        selection: &mut Selection,
        user_id: &str,
        details: &PaymentDetails,
    ) -> Result<String, CommitError> {
        // 1. Validate
        self.set_state(CommitState::Validating);

        if selection.is_empty() {
            return Err(CommitError::EmptySelection);
        }
        let showtime_id = selection
            .showtime_id()
            .ok_or(CommitError::MissingShowtime)?
            .to_string();
        validate_payment_details(details, Utc::now().date_naive())?;

        let showtime = self.ctx.load_showtime(&showtime_id).await?;
        let seat_ids = selection.seat_ids();

        let taken = self.ctx.taken_seats(&showtime_id, &seat_ids).await;
        if !taken.is_empty() {
            return Err(CommitError::SeatsTaken(taken));
        }

        // 2. Pay
        self.set_state(CommitState::Processing);

        let total = selection.compute_total(showtime.price);
        let transaction_id = ids::transaction_id();
        let receipt = self
            .ctx
            .payments
            .charge(&transaction_id, total, &self.ctx.currency, details)
            .await?;

        let remote_id = self.ctx.write_remote(user_id, &showtime_id, &seat_ids).await;

        // 3. Persist
        let pending = PendingReservation {
            showtime: &showtime,
            seat_ids: &seat_ids,
            total,
            transaction_id: &transaction_id,
            receipt_id: &receipt.id,
            remote_id: remote_id.as_deref(),
        };
        if let Err(e) = self.persist(&pending, selection, user_id, details).await {
            if let Some(remote_id) = &remote_id {
                self.ctx.cancel_remote(remote_id).await;
            }
            return Err(e);
        }

        match self.ctx.inventory.reserve(&showtime_id, seat_ids.len() as u32).await {
            Ok(_) => {}
            Err(InventoryError::Insufficient { available, .. }) => {
                warn!(showtime_id = %showtime_id, available, "Showtime counter is below ledger occupancy");
            }
            Err(e) => warn!(showtime_id = %showtime_id, "Could not update inventory: {}", e),
        }

        let _ = self.ctx.events.send(SeatMapEvent::Occupied(SeatsOccupiedEvent {
            showtime_id: showtime_id.clone(),
            seat_ids: seat_ids.clone(),
            transaction_id: transaction_id.clone(),
            occupied_at: Utc::now().timestamp_millis(),
        }));

        selection.clear();
        info!(
            transaction_id = %transaction_id,
            showtime_id = %showtime_id,
            seats = seat_ids.len(),
            total,
            "Reservation committed"
        );
        Ok(transaction_id)
    }

    /// Final conflict check, ledger write and ticket save, under the commit
    /// lock. On error the ledger is as it was before the call.
    async fn persist(
        &self,
        pending: &PendingReservation<'_>,
        selection: &Selection,
        user_id: &str,
        details: &PaymentDetails,
    ) -> Result<(), CommitError> {
        let showtime = pending.showtime;
        let showtime_id = showtime.id.as_str();
        let seat_ids = pending.seat_ids;
        let _commit = self.ctx.commit_lock.lock().await;

        let taken = self.ctx.taken_seats(showtime_id, seat_ids).await;
        if !taken.is_empty() {
            error!(
                transaction_id = %pending.transaction_id,
                receipt_id = %pending.receipt_id,
                "Seats taken while payment was processing, payment needs a refund"
            );
            return Err(CommitError::SeatsTaken(taken));
        }

        self.ctx
            .ledger
            .mark_occupied(showtime_id, seat_ids)
            .await
            .map_err(storage)?;

        let mut reservation = Reservation::new(
            ids::reservation_id(),
            user_id.to_string(),
            showtime_id.to_string(),
            seat_ids.to_vec(),
            pending.total,
            pending.transaction_id.to_string(),
        );
        reservation.remote_id = pending.remote_id.map(str::to_string);

        let movie = match self.ctx.movies.get_movie(&showtime.movie_id).await {
            Ok(movie) => movie,
            Err(e) => {
                warn!(movie_id = %showtime.movie_id, "Movie lookup failed, ticket saved without it: {}", e);
                None
            }
        };

        let ticket = Ticket {
            transaction_id: pending.transaction_id.to_string(),
            reservation,
            movie,
            showtime: showtime.clone(),
            seats: selection
                .seats()
                .iter()
                .map(|s| s.clone().with_status(SeatStatus::Occupied))
                .collect(),
            customer: CustomerInfo {
                name: details.cardholder_name.trim().to_string(),
                email: details.email.clone(),
                phone: details.phone.clone(),
            },
            payment: PaymentSummary {
                card_number: mask_card_number(details.card_number.expose()),
                method: details.method,
                amount: pending.total,
                currency: self.ctx.currency.clone(),
            },
            purchased_at: Utc::now(),
        };

        if let Err(e) = self.ctx.reservations.save(&ticket).await {
            // Keep the ledger consistent with what was actually stored
            if let Err(release_err) = self.ctx.ledger.release(showtime_id, seat_ids).await {
                error!(showtime_id, "Failed to roll back occupancy: {}", release_err);
            }
            return Err(e.into());
        }
        Ok(())
    }
}

/// A paid reservation on its way to storage
struct PendingReservation<'a> {
    showtime: &'a Showtime,
    seat_ids: &'a [SeatId],
    total: i64,
    transaction_id: &'a str,
    receipt_id: &'a str,
    remote_id: Option<&'a str>,
}
