use std::{collections::HashMap, time::Duration};

use reqwest::StatusCode;
use serde::{Deserialize, de::DeserializeOwned};
use tracing::debug;

use crate::models::{DiscoverPage, MovieDetails, NamedGenre, RawMovie};

const DISCOVER_ATTEMPTS: u32 = 3;
const RETRY_BACKOFF: Duration = Duration::from_millis(100);

/// Upstream failure, split so callers can tell a flaky network from a
/// response TMDB actually sent.
#[derive(Debug, thiserror::Error)]
pub enum TmdbError {
    #[error("TMDB request failed: {0}")]
    Transport(#[source] reqwest::Error),
    #[error("TMDB returned {status} for {endpoint}")]
    Status { endpoint: String, status: StatusCode },
    #[error("malformed TMDB response from {endpoint}: {source}")]
    Decode {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },
}

impl TmdbError {
    /// Worth another attempt: network/timeout trouble or a 5xx. A 4xx or an
    /// undecodable body will not get better by asking again.
    pub fn is_transient(&self) -> bool {
        match self {
            TmdbError::Transport(_) => true,
            TmdbError::Status { status, .. } => status.is_server_error(),
            TmdbError::Decode { .. } => false,
        }
    }
}

pub type TmdbResult<T> = Result<T, TmdbError>;

pub struct TmdbClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl TmdbClient {
    pub fn new(client: reqwest::Client, api_key: String, base_url: String) -> Self {
        if api_key.trim().is_empty() {
            tracing::warn!("TMDB_API_KEY is empty; upstream calls will fail authentication");
        }
        Self { client, api_key, base_url }
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> TmdbResult<T> {
        let url = format!("{}{}", self.base_url.trim_end_matches('/'), path);
        debug!(url = %url, "TMDB request");

        let resp = self
            .client
            .get(&url)
            .query(&[("api_key", self.api_key.as_str()), ("language", "en-US")])
            .query(params)
            .send()
            .await
            .map_err(TmdbError::Transport)?;

        let status = resp.status();
        if !status.is_success() {
            return Err(TmdbError::Status { endpoint: path.to_string(), status });
        }

        resp.json::<T>()
            .await
            .map_err(|e| TmdbError::Decode { endpoint: path.to_string(), source: e })
    }

    /// One page of `/discover/movie` filtered to a single genre. Transient
    /// failures are retried with fixed backoff before surfacing.
    pub async fn discover_by_genre(&self, genre_id: i32, page: u32) -> TmdbResult<DiscoverPage> {
        let params = [
            ("with_genres", genre_id.to_string()),
            ("page", page.to_string()),
            ("include_adult", "false".to_string()),
        ];

        let mut attempt = 1;
        loop {
            match self.get_json("/discover/movie", &params).await {
                Ok(page) => return Ok(page),
                Err(err) if attempt < DISCOVER_ATTEMPTS && err.is_transient() => {
                    debug!(genre_id, attempt, error = %err, "retrying discovery call");
                    tokio::time::sleep(RETRY_BACKOFF).await;
                    attempt += 1;
                },
                Err(err) => return Err(err),
            }
        }
    }

    /// Unfiltered (or singly genre-filtered) discovery page for the generic
    /// listing endpoint. Not retried.
    pub async fn discover(&self, page: u32, genre: Option<i32>) -> TmdbResult<DiscoverPage> {
        let mut params = vec![("page", page.to_string())];
        if let Some(genre) = genre {
            params.push(("with_genres", genre.to_string()));
        }
        self.get_json("/discover/movie", &params).await
    }

    /// Per-movie detail record. Single attempt; callers absorb failures.
    pub async fn fetch_details(&self, movie_id: i64) -> TmdbResult<MovieDetails> {
        self.get_json(&format!("/movie/{movie_id}"), &[]).await
    }

    /// TMDB's own canonical genre catalog, keyed by id.
    pub async fn fetch_genre_list(&self) -> TmdbResult<HashMap<i32, String>> {
        let resp: GenreListResponse = self.get_json("/genre/movie/list", &[]).await?;
        Ok(resp.genres.into_iter().map(|g| (g.id, g.name)).collect())
    }

    pub async fn fetch_popular(&self) -> TmdbResult<Vec<RawMovie>> {
        let resp: MovieListResponse = self.get_json("/movie/popular", &[]).await?;
        Ok(resp.results)
    }

    pub async fn fetch_similar(&self, movie_id: i64) -> TmdbResult<Vec<RawMovie>> {
        let resp: MovieListResponse =
            self.get_json(&format!("/movie/{movie_id}/similar"), &[]).await?;
        Ok(resp.results)
    }
}

#[derive(Debug, Deserialize)]
struct GenreListResponse {
    #[serde(default)]
    genres: Vec<NamedGenre>,
}

#[derive(Debug, Deserialize)]
struct MovieListResponse {
    #[serde(default)]
    results: Vec<RawMovie>,
}
