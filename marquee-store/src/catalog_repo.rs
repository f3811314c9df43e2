use async_trait::async_trait;
use chrono::NaiveDate;
use marquee_core::repository::{MovieRepository, ShowtimeRepository};
use marquee_core::BoxError;
use marquee_shared::{Hall, Movie, Showtime};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::seed;

/// Movies, showtimes and halls held in process memory
pub struct InMemoryCatalog {
    movies: RwLock<Vec<Movie>>,
    showtimes: RwLock<Vec<Showtime>>,
    halls: Vec<Hall>,
}

impl InMemoryCatalog {
    pub fn new(movies: Vec<Movie>, showtimes: Vec<Showtime>, halls: Vec<Hall>) -> Self {
        Self {
            movies: RwLock::new(movies),
            showtimes: RwLock::new(showtimes),
            halls,
        }
    }

    /// Catalog preloaded with the demo movies and showtimes.
    pub fn seeded(today: NaiveDate) -> Self {
        Self::new(seed::movies(), seed::showtimes(today), seed::halls())
    }
}

fn new_id(prefix: &str) -> String {
    format!("{}-{}", prefix, Uuid::new_v4().simple())
}

#[async_trait]
impl MovieRepository for InMemoryCatalog {
    async fn list_movies(&self) -> Result<Vec<Movie>, BoxError> {
        Ok(self.movies.read().await.clone())
    }

    async fn get_movie(&self, id: &str) -> Result<Option<Movie>, BoxError> {
        Ok(self.movies.read().await.iter().find(|m| m.id == id).cloned())
    }

    async fn create_movie(&self, movie: &Movie) -> Result<String, BoxError> {
        let mut movies = self.movies.write().await;
        let mut movie = movie.clone();
        if movie.id.is_empty() {
            movie.id = new_id("movie");
        }
        if movies.iter().any(|m| m.id == movie.id) {
            return Err(format!("Movie {} already exists", movie.id).into());
        }
        let id = movie.id.clone();
        movies.push(movie);
        Ok(id)
    }

    async fn update_movie(&self, id: &str, movie: &Movie) -> Result<bool, BoxError> {
        let mut movies = self.movies.write().await;
        match movies.iter_mut().find(|m| m.id == id) {
            Some(slot) => {
                *slot = Movie {
                    id: id.to_string(),
                    ..movie.clone()
                };
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_movie(&self, id: &str) -> Result<bool, BoxError> {
        let mut movies = self.movies.write().await;
        let before = movies.len();
        movies.retain(|m| m.id != id);
        Ok(movies.len() < before)
    }
}

#[async_trait]
impl ShowtimeRepository for InMemoryCatalog {
    async fn list_showtimes(&self) -> Result<Vec<Showtime>, BoxError> {
        Ok(self.showtimes.read().await.clone())
    }

    async fn get_showtime(&self, id: &str) -> Result<Option<Showtime>, BoxError> {
        Ok(self.showtimes.read().await.iter().find(|s| s.id == id).cloned())
    }

    async fn list_by_movie(
        &self,
        movie_id: &str,
        date: Option<NaiveDate>,
    ) -> Result<Vec<Showtime>, BoxError> {
        let showtimes = self.showtimes.read().await;
        Ok(showtimes
            .iter()
            .filter(|s| s.movie_id == movie_id && date.map_or(true, |d| s.date == d))
            .cloned()
            .collect())
    }

    async fn create_showtime(&self, showtime: &Showtime) -> Result<String, BoxError> {
        let mut showtimes = self.showtimes.write().await;
        let mut showtime = showtime.clone();
        if showtime.id.is_empty() {
            showtime.id = new_id("showtime");
        }
        if showtimes.iter().any(|s| s.id == showtime.id) {
            return Err(format!("Showtime {} already exists", showtime.id).into());
        }
        let id = showtime.id.clone();
        showtimes.push(showtime);
        Ok(id)
    }

    async fn update_showtime(&self, id: &str, showtime: &Showtime) -> Result<bool, BoxError> {
        let mut showtimes = self.showtimes.write().await;
        match showtimes.iter_mut().find(|s| s.id == id) {
            Some(slot) => {
                *slot = Showtime {
                    id: id.to_string(),
                    ..showtime.clone()
                };
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_showtime(&self, id: &str) -> Result<bool, BoxError> {
        let mut showtimes = self.showtimes.write().await;
        let before = showtimes.len();
        showtimes.retain(|s| s.id != id);
        Ok(showtimes.len() < before)
    }

    async fn adjust_available_seats(&self, id: &str, delta: i64) -> Result<Option<u32>, BoxError> {
        let mut showtimes = self.showtimes.write().await;
        let Some(showtime) = showtimes.iter_mut().find(|s| s.id == id) else {
            return Ok(None);
        };
        let next = (showtime.available_seats as i64 + delta).clamp(0, showtime.total_seats as i64);
        showtime.available_seats = next as u32;
        Ok(Some(showtime.available_seats))
    }

    async fn list_halls(&self) -> Result<Vec<Hall>, BoxError> {
        Ok(self.halls.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> InMemoryCatalog {
        InMemoryCatalog::seeded(NaiveDate::from_ymd_opt(2025, 6, 25).unwrap())
    }

    #[tokio::test]
    async fn test_movie_crud() {
        let catalog = catalog();
        let mut movie = catalog.get_movie("movie1").await.unwrap().unwrap();

        movie.id = String::new();
        movie.title = "Avatar 3".to_string();
        let id = catalog.create_movie(&movie).await.unwrap();
        assert!(id.starts_with("movie-"));
        assert_eq!(catalog.list_movies().await.unwrap().len(), 5);

        movie.title = "Avatar: Fire and Ash".to_string();
        assert!(catalog.update_movie(&id, &movie).await.unwrap());
        let stored = catalog.get_movie(&id).await.unwrap().unwrap();
        assert_eq!(stored.title, "Avatar: Fire and Ash");
        assert_eq!(stored.id, id);

        assert!(catalog.delete_movie(&id).await.unwrap());
        assert!(!catalog.delete_movie(&id).await.unwrap());
        assert!(!catalog.update_movie("missing", &movie).await.unwrap());
    }

    #[tokio::test]
    async fn test_duplicate_ids_are_rejected() {
        let catalog = catalog();
        let showtime = catalog.get_showtime("S1").await.unwrap().unwrap();
        assert!(catalog.create_showtime(&showtime).await.is_err());
    }

    #[tokio::test]
    async fn test_showtimes_by_movie_and_date() {
        let catalog = catalog();
        let today = NaiveDate::from_ymd_opt(2025, 6, 25).unwrap();

        assert_eq!(catalog.list_by_movie("movie1", None).await.unwrap().len(), 2);
        assert_eq!(catalog.list_by_movie("movie3", Some(today)).await.unwrap().len(), 0);
        assert_eq!(catalog.list_by_movie("movie3", None).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_available_seats_are_clamped() {
        let catalog = catalog();

        assert_eq!(catalog.adjust_available_seats("S1", -2).await.unwrap(), Some(98));
        assert_eq!(catalog.adjust_available_seats("S1", 10).await.unwrap(), Some(100));
        assert_eq!(catalog.adjust_available_seats("S1", -500).await.unwrap(), Some(0));
        assert_eq!(catalog.adjust_available_seats("S9", 1).await.unwrap(), None);
    }
}
