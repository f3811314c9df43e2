use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use marquee_core::payment::{PaymentAdapter, PaymentReceipt, PaymentRequest, PaymentStatus};
use marquee_core::BoxError;
use marquee_shared::PaymentDetails;
use tracing::{info, warn};
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum PaymentError {
    #[error("Payment declined: {0}")]
    Declined(String),

    #[error("Payment provider unavailable: {0}")]
    Provider(String),
}

pub struct PaymentOrchestrator {
    adapter: Arc<dyn PaymentAdapter>,
}

impl PaymentOrchestrator {
    pub fn new(adapter: Arc<dyn PaymentAdapter>) -> Self {
        Self { adapter }
    }

    /// Charge `amount` to the card in `details`. Only a succeeded receipt is `Ok`.
    pub async fn charge(
        &self,
        reference: &str,
        amount: i64,
        currency: &str,
        details: &PaymentDetails,
    ) -> Result<PaymentReceipt, PaymentError> {
        let request = PaymentRequest {
            reference: reference.to_string(),
            amount,
            currency: currency.to_string(),
            method: details.method,
            card_number: details.card_number.clone(),
            cardholder_name: details.cardholder_name.clone(),
        };

        let receipt = self
            .adapter
            .process_payment(&request)
            .await
            .map_err(|e| PaymentError::Provider(e.to_string()))?;

        match receipt.status {
            PaymentStatus::Succeeded => {
                info!(reference, receipt_id = %receipt.id, amount, "Payment succeeded");
                Ok(receipt)
            }
            PaymentStatus::Declined => {
                warn!(reference, amount, "Payment declined: {}", receipt.message);
                Err(PaymentError::Declined(receipt.message))
            }
        }
    }
}

/// Simulated card processor. Waits `delay`, then approves everything except
/// the configured decline card.
pub struct MockPaymentAdapter {
    delay: Duration,
    decline_card: Option<String>,
}

impl MockPaymentAdapter {
    pub const DEFAULT_DECLINE_CARD: &'static str = "4000000000000002";

    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            decline_card: Some(Self::DEFAULT_DECLINE_CARD.to_string()),
        }
    }

    pub fn with_decline_card(mut self, card_number: Option<String>) -> Self {
        self.decline_card = card_number.map(|c| digits(&c));
        self
    }
}

fn digits(card_number: &str) -> String {
    card_number.chars().filter(|c| c.is_ascii_digit()).collect()
}

#[async_trait]
impl PaymentAdapter for MockPaymentAdapter {
    async fn process_payment(&self, request: &PaymentRequest) -> Result<PaymentReceipt, BoxError> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        let declined = self
            .decline_card
            .as_deref()
            .is_some_and(|card| digits(request.card_number.expose()) == card);

        let (status, message) = if declined {
            (PaymentStatus::Declined, "Card declined by issuer".to_string())
        } else {
            (PaymentStatus::Succeeded, "Payment approved".to_string())
        };

        Ok(PaymentReceipt {
            id: format!("mock_pay_{}", Uuid::new_v4().simple()),
            reference: request.reference.clone(),
            status,
            amount: request.amount,
            currency: request.currency.clone(),
            message,
            processed_at: Utc::now(),
        })
    }
}
