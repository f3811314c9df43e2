pub mod filter;
pub mod inventory;
pub mod pricing;
pub mod seat_map;
pub mod stats;

pub use filter::{MovieFilter, SortBy, SortOrder};
pub use inventory::{InventoryError, ShowtimeInventory};
pub use pricing::SeatPricing;
pub use seat_map::{SeatLayout, SeatMap, SeatMapGenerator};
pub use stats::AdminStats;
