use serde::{Deserialize, Serialize};

use crate::pii::Masked;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    #[default]
    Credit,
    Debit,
}

/// Payment form as submitted from the checkout page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentDetails {
    pub card_number: Masked<String>,
    /// `MM/YY`
    pub expiry_date: String,
    pub cvv: Masked<String>,
    pub cardholder_name: String,
    pub email: String,
    pub phone: String,
    #[serde(default)]
    pub method: PaymentMethod,
}
