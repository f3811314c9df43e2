use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Seat status as rendered on the seat map.
///
/// `Selected` only ever exists inside a client selection; it is never persisted.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum SeatStatus {
    Available,
    Selected,
    Occupied,
    Disabled,
    Accessible,
}

impl SeatStatus {
    /// Only free seats (regular or accessible) can be picked.
    pub fn is_selectable(&self) -> bool {
        matches!(self, SeatStatus::Available | SeatStatus::Accessible)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum SeatType {
    Regular,
    Accessible,
    Vip,
}

/// Seat identifier: row label followed by the seat number, e.g. `A1` or `J12`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SeatId {
    row: String,
    number: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SeatIdError {
    #[error("Seat id is empty")]
    Empty,

    #[error("Seat id {0:?} must start with a row letter")]
    MissingRow(String),

    #[error("Seat id {0:?} must end with a seat number")]
    InvalidNumber(String),
}

impl SeatId {
    pub fn new(row: impl Into<String>, number: u32) -> Self {
        Self {
            row: row.into().to_ascii_uppercase(),
            number,
        }
    }

    pub fn row(&self) -> &str {
        &self.row
    }

    pub fn number(&self) -> u32 {
        self.number
    }
}

impl fmt::Display for SeatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.row, self.number)
    }
}

impl FromStr for SeatId {
    type Err = SeatIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(SeatIdError::Empty);
        }

        let split = s
            .find(|c: char| !c.is_ascii_alphabetic())
            .unwrap_or(s.len());
        let (row, number) = s.split_at(split);

        if row.is_empty() {
            return Err(SeatIdError::MissingRow(s.to_string()));
        }

        let number: u32 = number
            .parse()
            .map_err(|_| SeatIdError::InvalidNumber(s.to_string()))?;
        if number == 0 {
            return Err(SeatIdError::InvalidNumber(s.to_string()));
        }

        Ok(SeatId::new(row, number))
    }
}

impl TryFrom<String> for SeatId {
    type Error = SeatIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<SeatId> for String {
    fn from(id: SeatId) -> Self {
        id.to_string()
    }
}

/// Row label for a zero-based row index: 0 → `A`, 25 → `Z`, 26 → `AA`.
pub fn row_label(index: usize) -> String {
    let mut label = Vec::new();
    let mut n = index + 1;
    while n > 0 {
        let rem = (n - 1) % 26;
        label.push(b'A' + rem as u8);
        n = (n - 1) / 26;
    }
    label.reverse();
    String::from_utf8(label).unwrap_or_default()
}

/// A single seat of a showtime's seat map
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Seat {
    pub id: SeatId,
    pub row: String,
    pub number: u32,
    pub status: SeatStatus,
    #[serde(rename = "type")]
    pub seat_type: SeatType,
    /// Seat-specific price; the showtime price applies when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<i64>,
}

impl Seat {
    pub fn new(row: &str, number: u32, seat_type: SeatType) -> Self {
        let status = match seat_type {
            SeatType::Accessible => SeatStatus::Accessible,
            _ => SeatStatus::Available,
        };
        Self {
            id: SeatId::new(row, number),
            row: row.to_ascii_uppercase(),
            number,
            status,
            seat_type,
            price: None,
        }
    }

    pub fn with_price(mut self, price: i64) -> Self {
        self.price = Some(price);
        self
    }

    pub fn with_status(mut self, status: SeatStatus) -> Self {
        self.status = status;
        self
    }

    pub fn is_selectable(&self) -> bool {
        self.status.is_selectable()
    }

    /// Price to charge for this seat given the showtime's per-seat price.
    pub fn price_or(&self, per_seat_price: i64) -> i64 {
        self.price.unwrap_or(per_seat_price)
    }

    /// Status a freed seat returns to.
    pub fn free_status(&self) -> SeatStatus {
        match self.seat_type {
            SeatType::Accessible => SeatStatus::Accessible,
            _ => SeatStatus::Available,
        }
    }
}
