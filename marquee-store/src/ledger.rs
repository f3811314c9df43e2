use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use marquee_catalog::SeatMap;
use marquee_core::remote::OccupancySource;
use marquee_core::storage::{get_json, set_json, KeyValueStore, StorageError};
use marquee_shared::SeatId;
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, warn};

use crate::keys;

/// Persisted cross-session record of occupied seats for one showtime
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct OccupancyLog {
    pub seats: BTreeSet<SeatId>,
    /// Incremented on every write
    pub version: u64,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SourceSnapshot {
    pub source: String,
    pub seats: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SourceSnapshot {
    fn ok(source: &str, seats: usize) -> Self {
        Self {
            source: source.to_string(),
            seats,
            version: None,
            error: None,
        }
    }

    fn failed(source: &str, error: String) -> Self {
        Self {
            source: source.to_string(),
            seats: 0,
            version: None,
            error: Some(error),
        }
    }
}

/// Union of every occupancy source for a showtime, with what each contributed
#[derive(Debug, Clone, Serialize)]
pub struct MergedOccupancy {
    pub showtime_id: String,
    pub seats: BTreeSet<SeatId>,
    pub sources: Vec<SourceSnapshot>,
}

impl MergedOccupancy {
    pub fn contains(&self, seat_id: &SeatId) -> bool {
        self.seats.contains(seat_id)
    }

    /// Seats from `seat_ids` that are already taken.
    pub fn conflicts<'a>(&self, seat_ids: impl IntoIterator<Item = &'a SeatId>) -> Vec<SeatId> {
        seat_ids
            .into_iter()
            .filter(|id| self.seats.contains(id))
            .cloned()
            .collect()
    }

    /// Mark the merged seats occupied on a generated map.
    pub fn apply_to(&self, map: &mut SeatMap) -> usize {
        map.mark_occupied(&self.seats)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Which seats are taken for each showtime.
///
/// Occupancy comes from four places: seeded demo data, commits made by this
/// process, an optional remote reservation service, and the persisted log in
/// the key-value store. Reads merge all of them; a failing remote or an
/// unreadable log degrades to "nothing known" so the seat map always renders.
///
/// Read-merge-write on the persisted log is serialized within the process.
/// Writes from other processes sharing the store are last-write-wins.
pub struct OccupancyLedger {
    store: Arc<dyn KeyValueStore>,
    remote: Option<Arc<dyn OccupancySource>>,
    seeded: RwLock<HashMap<String, BTreeSet<SeatId>>>,
    session: RwLock<HashMap<String, BTreeSet<SeatId>>>,
    log_lock: Mutex<()>,
}

impl OccupancyLedger {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            remote: None,
            seeded: RwLock::new(HashMap::new()),
            session: RwLock::new(HashMap::new()),
            log_lock: Mutex::new(()),
        }
    }

    pub fn with_seed(mut self, seed: HashMap<String, BTreeSet<SeatId>>) -> Self {
        self.seeded = RwLock::new(seed);
        self
    }

    pub fn with_remote(mut self, remote: Arc<dyn OccupancySource>) -> Self {
        self.remote = Some(remote);
        self
    }

    pub async fn fetch_merged_occupancy(&self, showtime_id: &str) -> MergedOccupancy {
        let mut seats = BTreeSet::new();
        let mut sources = Vec::with_capacity(4);

        let seeded = snapshot(&self.seeded, showtime_id).await;
        sources.push(SourceSnapshot::ok("seed", seeded.len()));
        seats.extend(seeded);

        let session = snapshot(&self.session, showtime_id).await;
        sources.push(SourceSnapshot::ok("session", session.len()));

        let persisted = match self.read_log(showtime_id).await {
            Ok(log) => {
                sources.push(SourceSnapshot {
                    version: Some(log.version),
                    ..SourceSnapshot::ok("persisted", log.seats.len())
                });
                log.seats
            }
            Err(e) => {
                warn!(showtime_id, "Persisted occupancy unreadable, ignoring: {}", e);
                sources.push(SourceSnapshot::failed("persisted", e.to_string()));
                BTreeSet::new()
            }
        };

        if let Some(remote) = &self.remote {
            match remote.occupied_seats(showtime_id).await {
                Ok(remote_seats) => {
                    let remote_seats: BTreeSet<SeatId> = remote_seats.into_iter().collect();
                    sources.push(SourceSnapshot::ok(remote.name(), remote_seats.len()));
                    report_divergence(showtime_id, &remote_seats, &session, &persisted);
                    seats.extend(remote_seats);
                }
                Err(e) => {
                    warn!(showtime_id, source = remote.name(), "Remote occupancy unavailable: {}", e);
                    sources.push(SourceSnapshot::failed(remote.name(), e.to_string()));
                }
            }
        }

        seats.extend(session);
        seats.extend(persisted);

        debug!(showtime_id, occupied = seats.len(), "Merged occupancy");
        MergedOccupancy {
            showtime_id: showtime_id.to_string(),
            seats,
            sources,
        }
    }

    /// Record seats as taken in the persisted log, then in session memory.
    /// Nothing changes when the log write fails.
    pub async fn mark_occupied(&self, showtime_id: &str, seat_ids: &[SeatId]) -> Result<(), LedgerError> {
        if seat_ids.is_empty() {
            return Ok(());
        }

        let version = self
            .update_log(showtime_id, |log| log.seats.extend(seat_ids.iter().cloned()))
            .await?;

        self.session
            .write()
            .await
            .entry(showtime_id.to_string())
            .or_default()
            .extend(seat_ids.iter().cloned());

        debug!(showtime_id, seats = seat_ids.len(), version, "Marked seats occupied");
        Ok(())
    }

    /// Free seats in every local source. The persisted log goes first so a
    /// failed write leaves the seats taken everywhere.
    pub async fn release(&self, showtime_id: &str, seat_ids: &[SeatId]) -> Result<(), LedgerError> {
        if seat_ids.is_empty() {
            return Ok(());
        }

        let version = self
            .update_log(showtime_id, |log| {
                for id in seat_ids {
                    log.seats.remove(id);
                }
            })
            .await?;

        for source in [&self.seeded, &self.session] {
            if let Some(seats) = source.write().await.get_mut(showtime_id) {
                for id in seat_ids {
                    seats.remove(id);
                }
            }
        }

        debug!(showtime_id, seats = seat_ids.len(), version, "Released seats");
        Ok(())
    }

    async fn read_log(&self, showtime_id: &str) -> Result<OccupancyLog, StorageError> {
        Ok(get_json(self.store.as_ref(), &keys::occupancy(showtime_id))
            .await?
            .unwrap_or_default())
    }

    async fn update_log<F>(&self, showtime_id: &str, apply: F) -> Result<u64, LedgerError>
    where
        F: FnOnce(&mut OccupancyLog),
    {
        let _guard = self.log_lock.lock().await;

        let mut log = match self.read_log(showtime_id).await {
            Ok(log) => log,
            Err(StorageError::Corrupt { key, source }) => {
                warn!(key, "Corrupt occupancy log, starting a new one: {}", source);
                OccupancyLog::default()
            }
            Err(e) => return Err(e.into()),
        };

        apply(&mut log);
        log.version += 1;
        log.updated_at = Some(Utc::now());

        set_json(self.store.as_ref(), &keys::occupancy(showtime_id), &log).await?;
        Ok(log.version)
    }
}

async fn snapshot(
    source: &RwLock<HashMap<String, BTreeSet<SeatId>>>,
    showtime_id: &str,
) -> BTreeSet<SeatId> {
    source
        .read()
        .await
        .get(showtime_id)
        .cloned()
        .unwrap_or_default()
}

// Which side wins is unresolved, so disagreement is only reported.
fn report_divergence(
    showtime_id: &str,
    remote: &BTreeSet<SeatId>,
    session: &BTreeSet<SeatId>,
    persisted: &BTreeSet<SeatId>,
) {
    let local: BTreeSet<&SeatId> = session.iter().chain(persisted.iter()).collect();
    let remote_only = remote.iter().filter(|id| !local.contains(id)).count();
    let local_only = local.iter().filter(|id| !remote.contains(*id)).count();

    if remote_only > 0 || local_only > 0 {
        warn!(
            showtime_id,
            remote_only, local_only, "Remote and local occupancy disagree"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{FailingWrites, MemoryStore};
    use async_trait::async_trait;
    use marquee_catalog::SeatMapGenerator;
    use marquee_core::BoxError;
    use marquee_shared::SeatStatus;

    fn ids(list: &[&str]) -> Vec<SeatId> {
        list.iter().map(|s| s.parse().unwrap()).collect()
    }

    struct FixedRemote(Vec<SeatId>);

    #[async_trait]
    impl OccupancySource for FixedRemote {
        fn name(&self) -> &str {
            "remote"
        }

        async fn occupied_seats(&self, _: &str) -> Result<Vec<SeatId>, BoxError> {
            Ok(self.0.clone())
        }
    }

    struct DownRemote;

    #[async_trait]
    impl OccupancySource for DownRemote {
        fn name(&self) -> &str {
            "remote"
        }

        async fn occupied_seats(&self, _: &str) -> Result<Vec<SeatId>, BoxError> {
            Err("connection refused".into())
        }
    }

    fn seeded_ledger(store: Arc<dyn KeyValueStore>) -> OccupancyLedger {
        let mut seed = HashMap::new();
        seed.insert("S2".to_string(), ids(&["B5"]).into_iter().collect());
        OccupancyLedger::new(store).with_seed(seed)
    }

    #[tokio::test]
    async fn test_marked_seats_are_merged() {
        let ledger = OccupancyLedger::new(Arc::new(MemoryStore::new()));

        ledger.mark_occupied("S1", &ids(&["A1", "A2"])).await.unwrap();
        let merged = ledger.fetch_merged_occupancy("S1").await;

        for id in ids(&["A1", "A2"]) {
            assert!(merged.contains(&id));
        }
        assert!(ledger.fetch_merged_occupancy("S3").await.seats.is_empty());
    }

    #[tokio::test]
    async fn test_persisted_log_is_shared_across_ledgers() {
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        let first = OccupancyLedger::new(store.clone());
        let second = OccupancyLedger::new(store);

        first.mark_occupied("S1", &ids(&["C3"])).await.unwrap();
        first.mark_occupied("S1", &ids(&["C4"])).await.unwrap();

        let merged = second.fetch_merged_occupancy("S1").await;
        assert_eq!(merged.seats, ids(&["C3", "C4"]).into_iter().collect());
        let persisted = merged.sources.iter().find(|s| s.source == "persisted").unwrap();
        assert_eq!(persisted.version, Some(2));
    }

    #[tokio::test]
    async fn test_release_frees_every_local_source() {
        let ledger = seeded_ledger(Arc::new(MemoryStore::new()));
        ledger.mark_occupied("S2", &ids(&["A1", "A2"])).await.unwrap();

        ledger.release("S2", &ids(&["A1", "A2", "B5"])).await.unwrap();

        let merged = ledger.fetch_merged_occupancy("S2").await;
        assert!(merged.seats.is_empty());
    }

    #[tokio::test]
    async fn test_remote_failure_does_not_block() {
        let ledger = seeded_ledger(Arc::new(MemoryStore::new())).with_remote(Arc::new(DownRemote));

        let merged = ledger.fetch_merged_occupancy("S2").await;

        assert_eq!(merged.seats, ids(&["B5"]).into_iter().collect());
        let remote = merged.sources.iter().find(|s| s.source == "remote").unwrap();
        assert!(remote.error.is_some());
    }

    #[tokio::test]
    async fn test_remote_and_local_are_unioned() {
        let ledger = OccupancyLedger::new(Arc::new(MemoryStore::new()))
            .with_remote(Arc::new(FixedRemote(ids(&["D1", "D2"]))));
        ledger.mark_occupied("S1", &ids(&["D2", "E7"])).await.unwrap();

        let merged = ledger.fetch_merged_occupancy("S1").await;
        assert_eq!(merged.seats, ids(&["D1", "D2", "E7"]).into_iter().collect());
    }

    #[tokio::test]
    async fn test_corrupt_log_is_ignored_on_read_and_replaced_on_write() {
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        store.set(&keys::occupancy("S1"), "{broken").await.unwrap();
        let ledger = OccupancyLedger::new(store.clone());

        let merged = ledger.fetch_merged_occupancy("S1").await;
        assert!(merged.seats.is_empty());

        ledger.mark_occupied("S1", &ids(&["A1"])).await.unwrap();
        let log: OccupancyLog = get_json(store.as_ref(), &keys::occupancy("S1")).await.unwrap().unwrap();
        assert_eq!(log.version, 1);
    }

    #[tokio::test]
    async fn test_apply_to_seat_map_and_conflicts() {
        let ledger = seeded_ledger(Arc::new(MemoryStore::new()));
        let merged = ledger.fetch_merged_occupancy("S2").await;

        let mut map = SeatMapGenerator::default().generate("S2", &BTreeSet::new());
        assert_eq!(merged.apply_to(&mut map), 1);
        assert_eq!(map.seat(&"B5".parse().unwrap()).unwrap().status, SeatStatus::Occupied);

        let wanted = ids(&["B4", "B5"]);
        assert_eq!(merged.conflicts(&wanted), ids(&["B5"]));
    }

    #[tokio::test]
    async fn test_failed_log_write_changes_nothing() {
        let ledger = seeded_ledger(Arc::new(FailingWrites::new(keys::OCCUPANCY_PREFIX)));

        assert!(ledger.mark_occupied("S1", &ids(&["A1"])).await.is_err());
        assert!(ledger.fetch_merged_occupancy("S1").await.seats.is_empty());

        assert!(ledger.release("S2", &ids(&["B5"])).await.is_err());
        assert!(ledger.fetch_merged_occupancy("S2").await.contains(&"B5".parse().unwrap()));
    }
}
