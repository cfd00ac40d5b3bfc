use std::collections::HashMap;

use serde::{Deserialize, Serialize};

pub const POSTER_BASE: &str = "https://image.tmdb.org/t/p/w500";
pub const BACKDROP_BASE: &str = "https://image.tmdb.org/t/p/w1280";
pub const NO_POSTER_URL: &str = "https://via.placeholder.com/500x750?text=No+Poster";
pub const NO_IMAGE_URL: &str = "https://via.placeholder.com/500x750?text=No+Image";
pub const NO_BACKDROP_URL: &str = "https://via.placeholder.com/1280x720?text=No+Image+Available";
pub const UNKNOWN_YEAR: &str = "Unknown";

pub const FALLBACK_TITLE: &str = "Unknown Title";
pub const FALLBACK_DESCRIPTION: &str = "No description available.";
pub const FALLBACK_TAGLINE: &str = "No tagline available.";

/// A movie exactly as TMDB's list endpoints return it. Never persisted;
/// lives only for the duration of a request.
#[derive(Clone, Debug, Deserialize)]
pub struct RawMovie {
    pub id: i64,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub overview: Option<String>,
    #[serde(default)]
    pub vote_average: Option<f64>,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub backdrop_path: Option<String>,
    #[serde(default)]
    pub genre_ids: Vec<i32>,
}

/// One page of `/discover/movie` results.
#[derive(Clone, Debug, Deserialize)]
pub struct DiscoverPage {
    #[serde(default)]
    pub page: u32,
    #[serde(default)]
    pub total_pages: u32,
    #[serde(default)]
    pub total_results: u64,
    #[serde(default, rename = "results")]
    pub movies: Vec<RawMovie>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct NamedGenre {
    pub id: i32,
    pub name: String,
}

/// Detail record from `/movie/{id}`. Every field is optional; TMDB omits
/// fields freely and enrichment must survive that.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct MovieDetails {
    pub id: Option<i64>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub overview: Option<String>,
    #[serde(default)]
    pub tagline: Option<String>,
    #[serde(default)]
    pub runtime: Option<u32>,
    #[serde(default)]
    pub imdb_id: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub vote_average: Option<f64>,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub backdrop_path: Option<String>,
    #[serde(default)]
    pub genres: Vec<NamedGenre>,
}

impl MovieDetails {
    /// TMDB answers 200 with an id-less stub for some bad ids; treat a
    /// record with nothing usable in it as absent.
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.overview.is_none()
            && self.runtime.is_none()
            && self.vote_average.is_none()
            && self.release_date.is_none()
            && self.backdrop_path.is_none()
            && self.genres.is_empty()
    }
}

/// The externally visible movie shape: a `RawMovie` decorated with resolved
/// genre names, a derived year and full image URLs, plus detail fields when
/// an enrichment lookup ran.
#[derive(Clone, Debug, Serialize)]
pub struct EnrichedMovie {
    pub id: i64,
    pub title: String,
    pub genres: Vec<String>,
    pub description: String,
    pub rating: f64,
    pub year: String,
    pub image: String,
    pub backdrop: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub runtime: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tagline: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub imdb_id: Option<String>,
}

impl EnrichedMovie {
    /// Decorate a discovery record. Genre ids missing from the name map are
    /// dropped, never fabricated.
    pub fn from_raw(raw: &RawMovie, genre_names: &HashMap<i32, String>) -> Self {
        Self {
            id: raw.id,
            title: raw.title.clone().unwrap_or_else(|| FALLBACK_TITLE.to_string()),
            genres: raw
                .genre_ids
                .iter()
                .filter_map(|id| genre_names.get(id).cloned())
                .collect(),
            description: raw
                .overview
                .clone()
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| FALLBACK_DESCRIPTION.to_string()),
            rating: round_rating(raw.vote_average.unwrap_or(0.0)),
            year: release_year(raw.release_date.as_deref()),
            image: poster_url(raw.poster_path.as_deref(), NO_POSTER_URL),
            backdrop: backdrop_url(raw.backdrop_path.as_deref()),
            runtime: None,
            tagline: None,
            imdb_id: None,
        }
    }

    /// Fold a detail lookup into the record.
    pub fn apply_details(&mut self, details: &MovieDetails) {
        self.runtime = Some(details.runtime.unwrap_or(0));
        self.tagline = Some(
            details
                .tagline
                .clone()
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| FALLBACK_TAGLINE.to_string()),
        );
        self.imdb_id = details.imdb_id.clone();
    }

    /// Explicit fallbacks for a movie whose detail lookup failed. The movie
    /// stays in the response; only the detail fields are defaulted.
    pub fn apply_detail_fallbacks(&mut self) {
        self.runtime = Some(0);
        self.tagline = Some(FALLBACK_TAGLINE.to_string());
        self.imdb_id = None;
    }
}

/// First four characters of an ISO release date, or the explicit unknown
/// sentinel. Never parses, so never fails; a date that is not even sliceable
/// at the fourth byte (multi-byte garbage) also falls back to the sentinel.
pub fn release_year(release_date: Option<&str>) -> String {
    release_date
        .and_then(|d| d.get(..4))
        .map(str::to_string)
        .unwrap_or_else(|| UNKNOWN_YEAR.to_string())
}

/// Full poster URL, or the given placeholder when TMDB returned no path.
/// The output is always a complete URL, never a bare path fragment.
pub fn poster_url(path: Option<&str>, placeholder: &str) -> String {
    match path {
        Some(p) if !p.is_empty() => format!("{POSTER_BASE}{p}"),
        _ => placeholder.to_string(),
    }
}

pub fn backdrop_url(path: Option<&str>) -> String {
    match path {
        Some(p) if !p.is_empty() => format!("{BACKDROP_BASE}{p}"),
        _ => NO_BACKDROP_URL.to_string(),
    }
}

pub fn round_rating(vote_average: f64) -> f64 {
    (vote_average * 10.0).round() / 10.0
}
