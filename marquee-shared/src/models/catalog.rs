use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Movie {
    /// Assigned on create when empty
    #[serde(default)]
    pub id: String,
    pub title: String,
    pub description: String,
    pub poster_image: String,
    pub genre: String,
    /// Runtime in minutes
    pub duration: u32,
    pub rating: String,
    pub release_date: NaiveDate,
    pub director: String,
    #[serde(default)]
    pub cast: Vec<String>,
}

/// A scheduled screening of a movie in a hall
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Showtime {
    #[serde(default)]
    pub id: String,
    pub movie_id: String,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub hall_id: String,
    /// Price per seat
    pub price: i64,
    pub available_seats: u32,
    pub total_seats: u32,
}

impl Showtime {
    pub fn has_capacity(&self, seats: usize) -> bool {
        self.available_seats as usize >= seats
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Hall {
    pub id: String,
    pub name: String,
    pub capacity: u32,
    /// Suggested price for new showtimes in this hall
    pub default_price: i64,
}
