use chrono::NaiveDate;
use marquee_shared::{Movie, Showtime};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SortBy {
    Title,
    ReleaseDate,
    Rating,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

/// Catalog query: genre and title filters plus ordering
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MovieFilter {
    pub genre: Option<String>,
    /// Case-insensitive title substring
    pub search: Option<String>,
    pub sort_by: Option<SortBy>,
    #[serde(default)]
    pub sort_order: SortOrder,
}

impl MovieFilter {
    pub fn matches(&self, movie: &Movie) -> bool {
        if let Some(genre) = non_blank(&self.genre) {
            if !movie.genre.eq_ignore_ascii_case(genre) {
                return false;
            }
        }
        if let Some(search) = non_blank(&self.search) {
            if !movie.title.to_lowercase().contains(&search.to_lowercase()) {
                return false;
            }
        }
        true
    }

    pub fn apply(&self, movies: Vec<Movie>) -> Vec<Movie> {
        let mut result: Vec<Movie> = movies.into_iter().filter(|m| self.matches(m)).collect();

        if let Some(sort_by) = self.sort_by {
            result.sort_by(|a, b| {
                let ordering = match sort_by {
                    SortBy::Title => a.title.to_lowercase().cmp(&b.title.to_lowercase()),
                    SortBy::ReleaseDate => a.release_date.cmp(&b.release_date),
                    SortBy::Rating => a.rating.cmp(&b.rating),
                };
                match self.sort_order {
                    SortOrder::Asc => ordering,
                    SortOrder::Desc => ordering.reverse(),
                }
            });
        }

        result
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Showtimes on `date` (or all of them), in screening order.
pub fn showtimes_on(showtimes: Vec<Showtime>, date: Option<NaiveDate>) -> Vec<Showtime> {
    let mut result: Vec<Showtime> = showtimes
        .into_iter()
        .filter(|s| date.map_or(true, |d| s.date == d))
        .collect();
    result.sort_by(|a, b| (a.date, a.time).cmp(&(b.date, b.time)));
    result
}
