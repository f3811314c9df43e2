use std::sync::Arc;

use marquee_core::repository::ShowtimeRepository;

/// Showtime seat counters. These are display numbers only; the occupancy
/// ledger decides whether a seat is free.
#[derive(Clone)]
pub struct ShowtimeInventory {
    showtimes: Arc<dyn ShowtimeRepository>,
}

impl ShowtimeInventory {
    pub fn new(showtimes: Arc<dyn ShowtimeRepository>) -> Self {
        Self { showtimes }
    }

    /// Take `count` seats off the available counter. Returns the new count.
    pub async fn reserve(&self, showtime_id: &str, count: u32) -> Result<u32, InventoryError> {
        let showtime = self
            .showtimes
            .get_showtime(showtime_id)
            .await
            .map_err(|e| InventoryError::Repository(e.to_string()))?
            .ok_or_else(|| InventoryError::NotFound(showtime_id.to_string()))?;

        if showtime.available_seats < count {
            return Err(InventoryError::Insufficient {
                showtime_id: showtime_id.to_string(),
                requested: count,
                available: showtime.available_seats,
            });
        }

        self.adjust(showtime_id, -(count as i64)).await
    }

    /// Put `count` seats back, never above the showtime's total.
    pub async fn release(&self, showtime_id: &str, count: u32) -> Result<u32, InventoryError> {
        self.adjust(showtime_id, count as i64).await
    }

    async fn adjust(&self, showtime_id: &str, delta: i64) -> Result<u32, InventoryError> {
        let available = self
            .showtimes
            .adjust_available_seats(showtime_id, delta)
            .await
            .map_err(|e| InventoryError::Repository(e.to_string()))?
            .ok_or_else(|| InventoryError::NotFound(showtime_id.to_string()))?;

        tracing::debug!(showtime_id, delta, available, "Adjusted showtime inventory");
        Ok(available)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum InventoryError {
    #[error("Showtime not found: {0}")]
    NotFound(String),

    #[error("Insufficient seats for {showtime_id}: requested {requested}, available {available}")]
    Insufficient {
        showtime_id: String,
        requested: u32,
        available: u32,
    },

    #[error("Repository error: {0}")]
    Repository(String),
}
