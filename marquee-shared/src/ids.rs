use chrono::Utc;
use uuid::Uuid;

/// `RES-<millis>-<suffix>`
pub fn reservation_id() -> String {
    prefixed("RES")
}

/// `TXN-<millis>-<suffix>`
pub fn transaction_id() -> String {
    prefixed("TXN")
}

// Millisecond stamps alone collide under concurrent commits.
fn prefixed(prefix: &str) -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!(
        "{}-{}-{}",
        prefix,
        Utc::now().timestamp_millis(),
        suffix[..8].to_uppercase()
    )
}
