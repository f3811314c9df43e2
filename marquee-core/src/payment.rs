use async_trait::async_trait;
use chrono::{DateTime, Utc};
use marquee_shared::{Masked, PaymentMethod};
use serde::{Deserialize, Serialize};

use crate::BoxError;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Succeeded,
    Declined,
}

#[derive(Debug, Clone)]
pub struct PaymentRequest {
    /// Caller-side reference, the transaction id of the pending reservation
    pub reference: String,
    pub amount: i64,
    pub currency: String,
    pub method: PaymentMethod,
    pub card_number: Masked<String>,
    pub cardholder_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentReceipt {
    pub id: String, // Provider's id
    pub reference: String,
    pub status: PaymentStatus,
    pub amount: i64,
    pub currency: String,
    pub message: String,
    pub processed_at: DateTime<Utc>,
}

#[async_trait]
pub trait PaymentAdapter: Send + Sync {
    /// Charge the card. A declined payment is `Ok` with `PaymentStatus::Declined`;
    /// `Err` means the provider could not be reached.
    async fn process_payment(&self, request: &PaymentRequest) -> Result<PaymentReceipt, BoxError>;
}
