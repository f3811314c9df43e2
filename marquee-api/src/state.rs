use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use marquee_booking::{BookingContext, MockPaymentAdapter, PaymentOrchestrator, RetryPolicy};
use marquee_catalog::SeatMapGenerator;
use marquee_core::repository::{MovieRepository, ShowtimeRepository};
use marquee_core::storage::KeyValueStore;
use marquee_shared::SeatMapEvent;
use marquee_store::app_config::BookingRules;
use marquee_store::{
    seed, Config, HttpReservationService, InMemoryCatalog, OccupancyLedger, ReservationRepository, UserRepository,
};
use tokio::sync::{broadcast, RwLock};
use uuid::Uuid;

use crate::sessions::Session;

#[derive(Clone)]
pub struct AuthConfig {
    pub secret: String,
    pub expiration: u64,
    pub admin_api_key: String,
}

#[derive(Clone)]
pub struct AppState {
    pub booking: BookingContext,
    pub movies: Arc<dyn MovieRepository>,
    pub showtimes: Arc<dyn ShowtimeRepository>,
    pub seat_maps: Arc<SeatMapGenerator>,
    pub sessions: Arc<RwLock<HashMap<Uuid, Arc<Session>>>>,
    pub users: Arc<UserRepository>,
    pub sse_tx: broadcast::Sender<SeatMapEvent>,
    pub auth: AuthConfig,
    pub business_rules: BookingRules,
}

impl AppState {
    /// Wire every service from `config` on top of `store`. The catalog is
    /// the in-memory demo catalog seeded relative to today.
    pub fn from_config(config: &Config, store: Arc<dyn KeyValueStore>) -> Self {
        let catalog = Arc::new(InMemoryCatalog::seeded(Utc::now().date_naive()));
        let movies: Arc<dyn MovieRepository> = catalog.clone();
        let showtimes: Arc<dyn ShowtimeRepository> = catalog;

        let remote = config.remote.reservation_service_url.as_deref().map(|url| {
            tracing::info!("Using reservation service at {}", url);
            Arc::new(HttpReservationService::new(
                url,
                Duration::from_millis(config.remote.timeout_ms),
            ))
        });

        let mut ledger = OccupancyLedger::new(store.clone()).with_seed(seed::occupancy());
        if let Some(remote) = &remote {
            ledger = ledger.with_remote(remote.clone());
        }

        let mut adapter = MockPaymentAdapter::new(Duration::from_millis(config.booking.payment_delay_ms));
        if let Some(card) = &config.booking.decline_card_number {
            adapter = adapter.with_decline_card(Some(card.clone()));
        }

        // SSE Broadcast Channel
        let (sse_tx, _) = broadcast::channel(100);

        let mut booking = BookingContext::new(
            Arc::new(ledger),
            Arc::new(ReservationRepository::new(store.clone())),
            movies.clone(),
            showtimes.clone(),
            Arc::new(PaymentOrchestrator::new(Arc::new(adapter))),
            sse_tx.clone(),
            &config.booking.currency,
        );
        if let Some(remote) = remote {
            booking = booking.with_gateway(remote, RetryPolicy::from_config(&config.retry));
        }

        Self {
            booking,
            movies,
            showtimes,
            seat_maps: Arc::new(SeatMapGenerator::new(
                config.seat_map.clone(),
                config.booking.seat_pricing(),
            )),
            sessions: Arc::new(RwLock::new(HashMap::new())),
            users: Arc::new(UserRepository::new(store)),
            sse_tx,
            auth: AuthConfig {
                secret: config.auth.jwt_secret.clone(),
                expiration: config.auth.jwt_expiration_seconds,
                admin_api_key: config.auth.admin_api_key.clone(),
            },
            business_rules: config.booking.clone(),
        }
    }
}
