//! Demo catalog loaded at startup.

use std::collections::{BTreeSet, HashMap};

use chrono::{Days, NaiveDate, NaiveTime};
use marquee_shared::{Hall, Movie, SeatId, Showtime};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap_or_default()
}

fn time(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).unwrap_or_default()
}

#[allow(clippy::too_many_arguments)]
fn movie(
    id: &str,
    title: &str,
    description: &str,
    poster: &str,
    genre: &str,
    duration: u32,
    rating: &str,
    release_date: NaiveDate,
    director: &str,
    cast: &[&str],
) -> Movie {
    Movie {
        id: id.to_string(),
        title: title.to_string(),
        description: description.to_string(),
        poster_image: poster.to_string(),
        genre: genre.to_string(),
        duration,
        rating: rating.to_string(),
        release_date,
        director: director.to_string(),
        cast: cast.iter().map(|c| c.to_string()).collect(),
    }
}

pub fn movies() -> Vec<Movie> {
    vec![
        movie(
            "movie1",
            "Avatar: The Way of Water",
            "Jake Sully lives with his newfound family on Pandora until a familiar threat returns.",
            "https://image.tmdb.org/t/p/w500/t6HIqrRAclMCA60NsSmeqe9RmNV.jpg",
            "Action",
            192,
            "PG-13",
            date(2022, 12, 16),
            "James Cameron",
            &["Sam Worthington", "Zoe Saldana", "Sigourney Weaver"],
        ),
        movie(
            "movie2",
            "Top Gun: Maverick",
            "After thirty years of service, Maverick is still pushing the envelope as a test pilot.",
            "https://image.tmdb.org/t/p/w500/62HCnUTziyWcpDaBO2i1DX17ljH.jpg",
            "Action",
            130,
            "PG-13",
            date(2022, 5, 27),
            "Joseph Kosinski",
            &["Tom Cruise", "Miles Teller", "Jennifer Connelly"],
        ),
        movie(
            "movie3",
            "Dune",
            "Paul Atreides must travel to the most dangerous planet in the universe to secure his family's future.",
            "https://image.tmdb.org/t/p/w500/d5NXSklXo0qyIYkgV94XAgMIckC.jpg",
            "Sci-Fi",
            155,
            "PG-13",
            date(2021, 10, 22),
            "Denis Villeneuve",
            &["Timothée Chalamet", "Rebecca Ferguson", "Oscar Isaac"],
        ),
        movie(
            "movie4",
            "Encanto",
            "The Madrigals live hidden in the mountains of Colombia, in a magical house called the Encanto.",
            "https://image.tmdb.org/t/p/w500/4j0PNHkMr5ax3IA8tjtxcmPU3QT.jpg",
            "Animation",
            102,
            "PG",
            date(2021, 11, 24),
            "Jared Bush",
            &["Stephanie Beatriz", "María Cecilia Botero", "John Leguizamo"],
        ),
    ]
}

pub fn halls() -> Vec<Hall> {
    [("hall1", "Sala 1", 25000), ("hall2", "Sala 2", 30000), ("hall3", "Sala 3 VIP", 40000)]
        .into_iter()
        .map(|(id, name, price)| Hall {
            id: id.to_string(),
            name: name.to_string(),
            capacity: 100,
            default_price: price,
        })
        .collect()
}

/// Showtimes relative to `today` so the demo never runs out of screenings.
pub fn showtimes(today: NaiveDate) -> Vec<Showtime> {
    let tomorrow = today.checked_add_days(Days::new(1)).unwrap_or(today);
    let show = |id: &str, movie_id: &str, date: NaiveDate, at: NaiveTime, hall: &str, price: i64, available: u32| Showtime {
        id: id.to_string(),
        movie_id: movie_id.to_string(),
        date,
        time: at,
        hall_id: hall.to_string(),
        price,
        available_seats: available,
        total_seats: 100,
    };

    vec![
        show("S1", "movie1", today, time(14, 0), "hall1", 15000, 100),
        show("S2", "movie1", today, time(17, 30), "hall2", 30000, 96),
        show("S3", "movie2", today, time(19, 45), "hall3", 35000, 97),
        show("S4", "movie3", tomorrow, time(21, 30), "hall3", 40000, 100),
    ]
}

/// Seats already sold before the service started.
pub fn occupancy() -> HashMap<String, BTreeSet<SeatId>> {
    let seats = |list: &[(&str, u32)]| -> BTreeSet<SeatId> { list.iter().map(|(row, n)| SeatId::new(*row, *n)).collect() };
    let mut seeded = HashMap::new();
    seeded.insert("S2".to_string(), seats(&[("B", 5), ("B", 6), ("E", 4), ("E", 5)]));
    seeded.insert("S3".to_string(), seats(&[("A", 3), ("F", 7), ("F", 8)]));
    seeded
}
