pub mod app_config;
pub mod catalog_repo;
pub mod keys;
pub mod ledger;
pub mod memory;
pub mod redis_repo;
pub mod remote;
pub mod reservation_repo;
pub mod seed;
pub mod user_repo;

pub use app_config::Config;
pub use catalog_repo::InMemoryCatalog;
pub use ledger::{LedgerError, MergedOccupancy, OccupancyLedger, SourceSnapshot};
pub use memory::MemoryStore;
pub use redis_repo::RedisStore;
pub use remote::HttpReservationService;
pub use reservation_repo::{ReservationRepoError, ReservationRepository};
pub use user_repo::{UserRepoError, UserRepository};
