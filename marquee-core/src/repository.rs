use async_trait::async_trait;
use chrono::NaiveDate;
use marquee_shared::{Hall, Movie, Showtime};

use crate::BoxError;

/// Repository trait for movie catalog access
#[async_trait]
pub trait MovieRepository: Send + Sync {
    async fn list_movies(&self) -> Result<Vec<Movie>, BoxError>;

    async fn get_movie(&self, id: &str) -> Result<Option<Movie>, BoxError>;

    async fn create_movie(&self, movie: &Movie) -> Result<String, BoxError>;

    /// Returns `false` when no movie has this id.
    async fn update_movie(&self, id: &str, movie: &Movie) -> Result<bool, BoxError>;

    /// Returns `false` when no movie has this id.
    async fn delete_movie(&self, id: &str) -> Result<bool, BoxError>;
}

/// Repository trait for showtime and hall access
#[async_trait]
pub trait ShowtimeRepository: Send + Sync {
    async fn list_showtimes(&self) -> Result<Vec<Showtime>, BoxError>;

    async fn get_showtime(&self, id: &str) -> Result<Option<Showtime>, BoxError>;

    async fn list_by_movie(
        &self,
        movie_id: &str,
        date: Option<NaiveDate>,
    ) -> Result<Vec<Showtime>, BoxError>;

    async fn create_showtime(&self, showtime: &Showtime) -> Result<String, BoxError>;

    async fn update_showtime(&self, id: &str, showtime: &Showtime) -> Result<bool, BoxError>;

    async fn delete_showtime(&self, id: &str) -> Result<bool, BoxError>;

    /// Adjust `available_seats` by `delta`, clamped to `0..=total_seats`.
    /// Returns the new count, or `None` when the showtime does not exist.
    async fn adjust_available_seats(&self, id: &str, delta: i64) -> Result<Option<u32>, BoxError>;

    async fn list_halls(&self) -> Result<Vec<Hall>, BoxError>;
}
