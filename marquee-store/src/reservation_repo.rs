use std::sync::Arc;

use marquee_core::storage::{get_json, set_json, KeyValueStore, StorageError};
use marquee_shared::{Reservation, Ticket};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::keys;

#[derive(Debug, thiserror::Error)]
pub enum ReservationRepoError {
    #[error("Reservation not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ReservationIndexEntry {
    transaction_id: String,
}

/// Tickets keyed by transaction id plus a per-user reservation list.
pub struct ReservationRepository {
    store: Arc<dyn KeyValueStore>,
    write_lock: Mutex<()>,
}

impl ReservationRepository {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            write_lock: Mutex::new(()),
        }
    }

    /// Persist a new ticket and append its reservation to the owner's list.
    /// A failed save removes whatever keys it already wrote.
    pub async fn save(&self, ticket: &Ticket) -> Result<(), ReservationRepoError> {
        let _guard = self.write_lock.lock().await;
        let reservation = &ticket.reservation;
        let ticket_key = keys::ticket(&ticket.transaction_id);
        let index_key = keys::reservation_index(&reservation.id);

        if let Err(e) = self.write_new(ticket, &ticket_key, &index_key).await {
            for key in [&ticket_key, &index_key] {
                if let Err(remove_err) = self.store.remove(key).await {
                    warn!(key = %key, "Failed to remove partial reservation record: {}", remove_err);
                }
            }
            return Err(e.into());
        }

        info!(
            reservation_id = %reservation.id,
            transaction_id = %ticket.transaction_id,
            "Reservation saved"
        );
        Ok(())
    }

    async fn write_new(&self, ticket: &Ticket, ticket_key: &str, index_key: &str) -> Result<(), StorageError> {
        let reservation = &ticket.reservation;

        set_json(self.store.as_ref(), ticket_key, ticket).await?;
        set_json(
            self.store.as_ref(),
            index_key,
            &ReservationIndexEntry {
                transaction_id: ticket.transaction_id.clone(),
            },
        )
        .await?;

        let list_key = keys::user_reservations(&reservation.user_id);
        let mut list = self.read_list(&list_key).await?;
        list.retain(|r| r.id != reservation.id);
        list.push(reservation.clone());
        set_json(self.store.as_ref(), &list_key, &list).await
    }

    pub async fn get_by_transaction_id(&self, transaction_id: &str) -> Result<Option<Ticket>, ReservationRepoError> {
        Ok(get_json(self.store.as_ref(), &keys::ticket(transaction_id)).await?)
    }

    pub async fn find_ticket(&self, reservation_id: &str) -> Result<Option<Ticket>, ReservationRepoError> {
        let entry: Option<ReservationIndexEntry> =
            get_json(self.store.as_ref(), &keys::reservation_index(reservation_id)).await?;
        match entry {
            Some(entry) => self.get_by_transaction_id(&entry.transaction_id).await,
            None => Ok(None),
        }
    }

    /// A user's reservations, newest first.
    pub async fn list_for_user(&self, user_id: &str) -> Result<Vec<Reservation>, ReservationRepoError> {
        let mut list = self.read_list(&keys::user_reservations(user_id)).await?;
        list.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(list)
    }

    /// Every reservation in the store. Unreadable lists are skipped.
    pub async fn list_all(&self) -> Result<Vec<Reservation>, ReservationRepoError> {
        let mut all = Vec::new();
        for key in self.store.keys_with_prefix(keys::USER_RESERVATIONS_PREFIX).await? {
            match self.read_list(&key).await {
                Ok(list) => all.extend(list),
                Err(e) => warn!(key, "Skipping unreadable reservation list: {}", e),
            }
        }
        Ok(all)
    }

    /// Replace a stored ticket and the matching entry in the owner's list.
    pub async fn update(&self, ticket: &Ticket) -> Result<(), ReservationRepoError> {
        let _guard = self.write_lock.lock().await;
        let reservation = &ticket.reservation;

        let list_key = keys::user_reservations(&reservation.user_id);
        let mut list = self.read_list(&list_key).await?;
        let slot = list
            .iter_mut()
            .find(|r| r.id == reservation.id)
            .ok_or_else(|| ReservationRepoError::NotFound(reservation.id.clone()))?;
        *slot = reservation.clone();

        set_json(self.store.as_ref(), &list_key, &list).await?;
        set_json(self.store.as_ref(), &keys::ticket(&ticket.transaction_id), ticket).await?;
        Ok(())
    }

    async fn read_list(&self, key: &str) -> Result<Vec<Reservation>, StorageError> {
        Ok(get_json(self.store.as_ref(), key).await?.unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{FailingWrites, MemoryStore};
    use chrono::{Duration, NaiveDate, NaiveTime, Utc};
    use marquee_shared::{CustomerInfo, PaymentMethod, PaymentSummary, SeatId, Showtime};

    fn ticket(reservation_id: &str, transaction_id: &str, user_id: &str) -> Ticket {
        let reservation = Reservation::new(
            reservation_id.to_string(),
            user_id.to_string(),
            "S1".to_string(),
            vec![SeatId::new("A", 1), SeatId::new("A", 2)],
            30000,
            transaction_id.to_string(),
        );
        Ticket {
            transaction_id: transaction_id.to_string(),
            reservation,
            movie: None,
            showtime: Showtime {
                id: "S1".to_string(),
                movie_id: "movie1".to_string(),
                date: NaiveDate::from_ymd_opt(2025, 6, 25).unwrap(),
                time: NaiveTime::from_hms_opt(20, 0, 0).unwrap(),
                hall_id: "hall1".to_string(),
                price: 15000,
                available_seats: 98,
                total_seats: 100,
            },
            seats: vec![],
            customer: CustomerInfo {
                name: "Ana Gomez".to_string(),
                email: "ana@example.com".to_string(),
                phone: "3001234567".to_string(),
            },
            payment: PaymentSummary {
                card_number: "****-****-****-1111".to_string(),
                method: PaymentMethod::Credit,
                amount: 30000,
                currency: "COP".to_string(),
            },
            purchased_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_save_and_lookup() {
        let repo = ReservationRepository::new(Arc::new(MemoryStore::new()));
        let saved = ticket("RES-1", "TXN-1", "user-1");
        repo.save(&saved).await.unwrap();

        let by_txn = repo.get_by_transaction_id("TXN-1").await.unwrap().unwrap();
        assert_eq!(by_txn, saved);
        let by_res = repo.find_ticket("RES-1").await.unwrap().unwrap();
        assert_eq!(by_res.transaction_id, "TXN-1");

        assert!(repo.get_by_transaction_id("TXN-404").await.unwrap().is_none());
        assert!(repo.find_ticket("RES-404").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_lists_per_user_and_overall() {
        let repo = ReservationRepository::new(Arc::new(MemoryStore::new()));
        let mut older = ticket("RES-1", "TXN-1", "user-1");
        older.reservation.created_at = Utc::now() - Duration::hours(1);
        repo.save(&older).await.unwrap();
        repo.save(&ticket("RES-2", "TXN-2", "user-1")).await.unwrap();
        repo.save(&ticket("RES-3", "TXN-3", "user-2")).await.unwrap();

        let mine: Vec<_> = repo.list_for_user("user-1").await.unwrap().into_iter().map(|r| r.id).collect();
        assert_eq!(mine, vec!["RES-2", "RES-1"]);
        assert_eq!(repo.list_all().await.unwrap().len(), 3);
        assert!(repo.list_for_user("nobody").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_replaces_in_place() {
        let repo = ReservationRepository::new(Arc::new(MemoryStore::new()));
        let mut saved = ticket("RES-1", "TXN-1", "user-1");
        repo.save(&saved).await.unwrap();

        saved.reservation.cancel();
        repo.update(&saved).await.unwrap();

        let list = repo.list_for_user("user-1").await.unwrap();
        assert_eq!(list.len(), 1);
        assert!(!list[0].is_confirmed());
        let stored = repo.get_by_transaction_id("TXN-1").await.unwrap().unwrap();
        assert!(!stored.reservation.is_confirmed());

        let missing = ticket("RES-9", "TXN-9", "user-1");
        assert!(matches!(
            repo.update(&missing).await,
            Err(ReservationRepoError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_failed_save_leaves_no_ticket_behind() {
        let repo = ReservationRepository::new(Arc::new(FailingWrites::new(keys::USER_RESERVATIONS_PREFIX)));

        let result = repo.save(&ticket("RES-1", "TXN-1", "user-1")).await;

        assert!(matches!(result, Err(ReservationRepoError::Storage(_))));
        assert!(repo.get_by_transaction_id("TXN-1").await.unwrap().is_none());
        assert!(repo.find_ticket("RES-1").await.unwrap().is_none());
    }
}
