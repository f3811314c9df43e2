use marquee_shared::SeatType;
use serde::{Deserialize, Serialize};

/// Per-seat-type price overrides on top of the showtime price.
///
/// Every seat costs the showtime price unless a surcharge is configured.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeatPricing {
    /// Extra charge for vip seats, as a percentage of the showtime price.
    /// Zero disables the override.
    pub vip_surcharge_percent: u32,

    /// Overrides are rounded to the nearest multiple of this amount
    pub rounding_unit: i64,
}

impl Default for SeatPricing {
    fn default() -> Self {
        Self {
            vip_surcharge_percent: 0,
            rounding_unit: 100,
        }
    }
}

impl SeatPricing {
    /// Price override for a seat type, `None` when the showtime price applies.
    /// Saturates instead of overflowing on huge prices.
    pub fn override_for(&self, seat_type: SeatType, base_price: i64) -> Option<i64> {
        match seat_type {
            SeatType::Vip if self.vip_surcharge_percent > 0 => {
                let factor = 100 + i64::from(self.vip_surcharge_percent);
                let raw = base_price
                    .checked_mul(factor)
                    .map(|scaled| scaled / 100)
                    .unwrap_or(i64::MAX);
                Some(self.round(raw))
            }
            _ => None,
        }
    }

    fn round(&self, amount: i64) -> i64 {
        if self.rounding_unit <= 1 {
            return amount;
        }
        let remainder = amount % self.rounding_unit;
        if remainder >= self.rounding_unit - remainder {
            amount.saturating_add(self.rounding_unit - remainder)
        } else {
            amount - remainder
        }
    }
}
