use chrono::{Datelike, NaiveDate};
use marquee_shared::PaymentDetails;
use serde::Serialize;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PaymentField {
    CardNumber,
    ExpiryDate,
    Cvv,
    CardholderName,
    Email,
    Phone,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct FieldError {
    pub field: PaymentField,
    pub message: &'static str,
}

/// Every problem found in a payment form, in form order
#[derive(Debug, Clone, Serialize, PartialEq, Eq, thiserror::Error)]
#[error("{}", join_messages(.errors))]
pub struct PaymentValidationErrors {
    pub errors: Vec<FieldError>,
}

impl PaymentValidationErrors {
    pub fn has(&self, field: PaymentField) -> bool {
        self.errors.iter().any(|e| e.field == field)
    }
}

fn join_messages(errors: &[FieldError]) -> String {
    let messages: Vec<&str> = errors.iter().map(|e| e.message).collect();
    messages.join("; ")
}

/// Check the payment form. Expiry is compared against `today`.
pub fn validate_payment_details(
    details: &PaymentDetails,
    today: NaiveDate,
) -> Result<(), PaymentValidationErrors> {
    let mut errors = Vec::new();
    let mut fail = |field, message| errors.push(FieldError { field, message });

    let digits: String = details
        .card_number
        .expose()
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();
    if digits.len() != 16 || !digits.chars().all(|c| c.is_ascii_digit()) {
        fail(PaymentField::CardNumber, "Card number must have 16 digits");
    }

    if let Err(message) = check_expiry(&details.expiry_date, today) {
        fail(PaymentField::ExpiryDate, message);
    }

    let cvv = details.cvv.expose();
    if !(3..=4).contains(&cvv.len()) || !cvv.chars().all(|c| c.is_ascii_digit()) {
        fail(PaymentField::Cvv, "CVV must have 3 or 4 digits");
    }

    if details.cardholder_name.trim().is_empty() {
        fail(PaymentField::CardholderName, "Cardholder name is required");
    }

    if !is_email(&details.email) {
        fail(PaymentField::Email, "A valid email is required");
    }

    if details.phone.chars().count() < 10 {
        fail(PaymentField::Phone, "A valid phone number is required");
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(PaymentValidationErrors { errors })
    }
}

/// `MM/YY`, month 1-12, not before the current month.
fn check_expiry(expiry: &str, today: NaiveDate) -> Result<(), &'static str> {
    const BAD_FORMAT: &str = "Invalid expiry date format (MM/YY)";

    let (month, year) = expiry.split_once('/').ok_or(BAD_FORMAT)?;
    let two_digits = |s: &str| s.len() == 2 && s.chars().all(|c| c.is_ascii_digit());
    if !two_digits(month) || !two_digits(year) {
        return Err(BAD_FORMAT);
    }
    let month: u32 = month.parse().map_err(|_| BAD_FORMAT)?;
    let year: i32 = year.parse().map_err(|_| BAD_FORMAT)?;

    if !(1..=12).contains(&month) {
        return Err("Invalid expiry month");
    }

    let current_year = today.year() % 100;
    if year < current_year || (year == current_year && month < today.month()) {
        return Err("Card has expired");
    }
    Ok(())
}

/// Same shape as `^[^\s@]+@[^\s@]+\.[^\s@]+$`.
pub fn is_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    let clean = |s: &str| !s.is_empty() && !s.chars().any(|c| c.is_whitespace() || c == '@');
    if !clean(local) || !clean(domain) {
        return false;
    }
    domain
        .char_indices()
        .any(|(i, c)| c == '.' && i > 0 && i + 1 < domain.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use marquee_shared::{Masked, PaymentMethod};

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 25).unwrap()
    }

    fn valid() -> PaymentDetails {
        PaymentDetails {
            card_number: Masked::from("4111 1111 1111 1111"),
            expiry_date: "12/27".to_string(),
            cvv: Masked::from("123"),
            cardholder_name: "Ana Gomez".to_string(),
            email: "ana@example.com".to_string(),
            phone: "3001234567".to_string(),
            method: PaymentMethod::Credit,
        }
    }

    #[test]
    fn test_valid_form_passes() {
        assert!(validate_payment_details(&valid(), today()).is_ok());
    }

    #[test]
    fn test_card_number_length() {
        let mut details = valid();
        details.card_number = Masked::from("4111 1111 1111");
        let errors = validate_payment_details(&details, today()).unwrap_err();
        assert!(errors.has(PaymentField::CardNumber));
        assert_eq!(errors.errors.len(), 1);
    }

    #[test]
    fn test_expiry_rules() {
        let cases = [
            ("06/25", true),  // current month is still valid
            ("05/25", false), // expired last month
            ("12/24", false),
            ("13/30", false),
            ("00/30", false),
            ("1/30", false),
            ("0130", false),
            ("01/30", true),
        ];
        for (expiry, ok) in cases {
            assert_eq!(check_expiry(expiry, today()).is_ok(), ok, "{}", expiry);
        }
    }

    #[test]
    fn test_email_shape() {
        assert!(is_email("a@b.co"));
        assert!(!is_email("a@b"));
        assert!(!is_email("a@.co"));
        assert!(!is_email("a b@c.co"));
        assert!(!is_email("a@@c.co"));
        assert!(!is_email("@c.co"));
        assert!(!is_email("a@c."));
    }

    #[test]
    fn test_collects_every_error() {
        let details = PaymentDetails {
            card_number: Masked::from(""),
            expiry_date: String::new(),
            cvv: Masked::from("12"),
            cardholder_name: "   ".to_string(),
            email: "nope".to_string(),
            phone: "123".to_string(),
            method: PaymentMethod::Debit,
        };
        let errors = validate_payment_details(&details, today()).unwrap_err();
        assert_eq!(errors.errors.len(), 6);
        assert!(errors.to_string().contains("CVV"));
    }
}
