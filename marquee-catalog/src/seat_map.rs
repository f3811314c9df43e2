use std::collections::BTreeSet;

use marquee_shared::{row_label, Seat, SeatId, SeatStatus, SeatType, Showtime};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::pricing::SeatPricing;

/// Physical arrangement of a hall's seats
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SeatLayout {
    pub rows: usize,
    pub seats_per_row: u32,
    /// The first `vip_rows` rows (closest to `A`) are vip
    pub vip_rows: usize,
    pub accessible_seats: Vec<SeatId>,
    pub disabled_seats: Vec<SeatId>,
    /// Share of seats marked occupied for demo purposes, seeded by showtime id.
    /// `0.0` disables injection.
    pub demo_occupancy_rate: f64,
}

impl Default for SeatLayout {
    fn default() -> Self {
        let rows = 10;
        let seats_per_row = 10;
        let last_row = row_label(rows - 1);
        Self {
            rows,
            seats_per_row,
            vip_rows: 2,
            accessible_seats: vec![
                SeatId::new(last_row.as_str(), 1),
                SeatId::new(last_row.as_str(), 2),
                SeatId::new(last_row.as_str(), seats_per_row - 1),
                SeatId::new(last_row.as_str(), seats_per_row),
            ],
            disabled_seats: Vec::new(),
            demo_occupancy_rate: 0.0,
        }
    }
}

impl SeatLayout {
    pub fn capacity(&self) -> usize {
        self.rows * self.seats_per_row as usize
    }

    fn seat_type(&self, row_index: usize, id: &SeatId) -> SeatType {
        if self.accessible_seats.contains(id) {
            SeatType::Accessible
        } else if row_index < self.vip_rows {
            SeatType::Vip
        } else {
            SeatType::Regular
        }
    }
}

/// Grid of seats for one showtime, rows in order from `A`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SeatMap {
    pub showtime_id: String,
    pub rows: Vec<Vec<Seat>>,
}

impl SeatMap {
    pub fn seats(&self) -> impl Iterator<Item = &Seat> {
        self.rows.iter().flatten()
    }

    pub fn seat(&self, id: &SeatId) -> Option<&Seat> {
        self.seats().find(|s| &s.id == id)
    }

    /// Mark every seat in `ids` as occupied. Returns how many seats changed.
    pub fn mark_occupied(&mut self, ids: &BTreeSet<SeatId>) -> usize {
        let mut changed = 0;
        for seat in self.rows.iter_mut().flatten() {
            if ids.contains(&seat.id) && seat.status != SeatStatus::Occupied {
                seat.status = SeatStatus::Occupied;
                changed += 1;
            }
        }
        changed
    }

    /// Return occupied seats in `ids` to their free status. Returns how many seats changed.
    pub fn mark_available(&mut self, ids: &BTreeSet<SeatId>) -> usize {
        let mut changed = 0;
        for seat in self.rows.iter_mut().flatten() {
            if ids.contains(&seat.id) && seat.status == SeatStatus::Occupied {
                seat.status = seat.free_status();
                changed += 1;
            }
        }
        changed
    }

    pub fn occupied_ids(&self) -> BTreeSet<SeatId> {
        self.seats()
            .filter(|s| s.status == SeatStatus::Occupied)
            .map(|s| s.id.clone())
            .collect()
    }

    pub fn available_count(&self) -> usize {
        self.seats().filter(|s| s.is_selectable()).count()
    }

    pub fn total_count(&self) -> usize {
        self.seats().count()
    }
}

/// Builds deterministic seat maps from a layout
#[derive(Debug, Clone, Default)]
pub struct SeatMapGenerator {
    layout: SeatLayout,
    pricing: SeatPricing,
}

impl SeatMapGenerator {
    pub fn new(layout: SeatLayout, pricing: SeatPricing) -> Self {
        Self { layout, pricing }
    }

    pub fn layout(&self) -> &SeatLayout {
        &self.layout
    }

    /// Generate the seat map for a showtime. Seats in `occupied` are always
    /// `occupied`, whatever their type.
    pub fn generate(&self, showtime_id: &str, occupied: &BTreeSet<SeatId>) -> SeatMap {
        let demo = self.demo_occupancy(showtime_id);

        let rows = (0..self.layout.rows)
            .map(|row_index| {
                let row = row_label(row_index);
                (1..=self.layout.seats_per_row)
                    .map(|number| {
                        let id = SeatId::new(row.as_str(), number);
                        let seat_type = self.layout.seat_type(row_index, &id);
                        let mut seat = Seat::new(&row, number, seat_type);
                        if self.layout.disabled_seats.contains(&id) {
                            seat.status = SeatStatus::Disabled;
                        }
                        if occupied.contains(&id) || demo.contains(&id) {
                            seat.status = SeatStatus::Occupied;
                        }
                        seat
                    })
                    .collect()
            })
            .collect();

        SeatMap {
            showtime_id: showtime_id.to_string(),
            rows,
        }
    }

    /// Like [`generate`](Self::generate), with seat-type price overrides
    /// derived from the showtime price.
    pub fn generate_priced(&self, showtime: &Showtime, occupied: &BTreeSet<SeatId>) -> SeatMap {
        let mut map = self.generate(&showtime.id, occupied);
        for seat in map.rows.iter_mut().flatten() {
            seat.price = self.pricing.override_for(seat.seat_type, showtime.price);
        }
        map
    }

    fn demo_occupancy(&self, showtime_id: &str) -> BTreeSet<SeatId> {
        let rate = self.layout.demo_occupancy_rate.clamp(0.0, 1.0);
        if rate == 0.0 {
            return BTreeSet::new();
        }

        let mut rng = StdRng::seed_from_u64(seed_for(showtime_id));
        let mut seats = BTreeSet::new();
        for row_index in 0..self.layout.rows {
            let row = row_label(row_index);
            for number in 1..=self.layout.seats_per_row {
                if rng.gen_bool(rate) {
                    seats.insert(SeatId::new(row.as_str(), number));
                }
            }
        }
        seats
    }
}

/// FNV-1a; stable across builds, unlike `DefaultHasher`.
fn seed_for(showtime_id: &str) -> u64 {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for byte in showtime_id.bytes() {
        hash ^= byte as u64;
        hash = hash.wrapping_mul(0x0100_0000_01b3);
    }
    hash
}
