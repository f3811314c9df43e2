pub mod commit;
pub mod payment;
pub mod payment_form;
pub mod retry;
pub mod selection;

pub use commit::{BookingContext, CommitError, CommitState, ReservationCommitter};
pub use payment::{MockPaymentAdapter, PaymentError, PaymentOrchestrator};
pub use payment_form::{is_email, validate_payment_details, PaymentField, PaymentValidationErrors};
pub use retry::{execute_with_retry, RetryError, RetryPolicy};
pub use selection::{Selection, SelectionError};
