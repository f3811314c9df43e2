//! Storage key layout. Each prefix has exactly one owning component:
//! `occupancy:` belongs to the ledger, `account:` to the user repository and
//! the rest to the reservation repository.

pub const OCCUPANCY_PREFIX: &str = "occupancy:";
pub const USER_RESERVATIONS_PREFIX: &str = "reservations:user:";
pub const TICKET_PREFIX: &str = "ticket:";
pub const RESERVATION_INDEX_PREFIX: &str = "reservation:";
pub const ACCOUNT_PREFIX: &str = "account:";

pub fn occupancy(showtime_id: &str) -> String {
    format!("{}{}", OCCUPANCY_PREFIX, showtime_id)
}

pub fn user_reservations(user_id: &str) -> String {
    format!("{}{}", USER_RESERVATIONS_PREFIX, user_id)
}

pub fn ticket(transaction_id: &str) -> String {
    format!("{}{}", TICKET_PREFIX, transaction_id)
}

pub fn reservation_index(reservation_id: &str) -> String {
    format!("{}{}", RESERVATION_INDEX_PREFIX, reservation_id)
}

pub fn account(user_id: &str) -> String {
    format!("{}{}", ACCOUNT_PREFIX, user_id)
}

/// Usernames are unique ignoring case.
pub fn account_by_username(username: &str) -> String {
    format!("{}username:{}", ACCOUNT_PREFIX, username.to_lowercase())
}

/// Emails are unique ignoring case.
pub fn account_by_email(email: &str) -> String {
    format!("{}email:{}", ACCOUNT_PREFIX, email.to_lowercase())
}
