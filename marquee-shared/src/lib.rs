pub mod ids;
pub mod models;
pub mod pii;

pub use models::catalog::{Hall, Movie, Showtime};
pub use models::events::{SeatMapEvent, SeatsOccupiedEvent, SeatsReleasedEvent};
pub use models::payment::{PaymentDetails, PaymentMethod};
pub use models::reservation::{CustomerInfo, PaymentSummary, Reservation, ReservationStatus, Ticket};
pub use models::seat::{row_label, Seat, SeatId, SeatIdError, SeatStatus, SeatType};
pub use models::user::{UserAccount, UserProfile};
pub use pii::Masked;

/// Currency used when none is configured (Colombian peso, no minor unit).
pub const DEFAULT_CURRENCY: &str = "COP";
