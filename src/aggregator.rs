//! The mood-to-movie aggregation pipeline: resolve a mood's genres, fan out
//! per-genre discovery, merge, filter by relevance, dedup, decorate and
//! enrich. Per-item upstream failures are absorbed and summarized; only mood
//! resolution and an empty end result fail the request.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use futures::{StreamExt, stream};
use tracing::{debug, warn};

use crate::{
    models::{DiscoverPage, EnrichedMovie, RawMovie},
    repo::Repository,
    tmdb::{TmdbClient, TmdbResult},
};

/// A movie must match at least this many of the mood's genres to count as
/// relevant. One shared genre is too weak an association; this trades recall
/// for precision.
pub const MIN_GENRE_MATCHES: usize = 2;

pub const DEFAULT_PAGE: u32 = 1;

/// Explicit request context threaded through the pipeline.
#[derive(Clone, Debug)]
pub struct MoodQuery {
    pub mood_name: String,
    pub page: u32,
}

impl MoodQuery {
    pub fn new(mood_name: impl Into<String>, page: Option<u32>) -> Self {
        Self { mood_name: mood_name.into(), page: page.unwrap_or(DEFAULT_PAGE).max(1) }
    }
}

/// Successful aggregation output.
#[derive(Clone, Debug)]
pub struct MoodMovies {
    pub mood: String,
    /// Names of the mood's genres that at least one surviving movie matched.
    pub matched_genres: Vec<String>,
    pub page: u32,
    pub movies: Vec<EnrichedMovie>,
}

#[derive(Debug, thiserror::Error)]
pub enum AggregateError {
    #[error("mood not found")]
    MoodNotFound { available_moods: Vec<String> },

    #[error("mood has no usable genre associations")]
    NoGenresForMood { mood: String, genre_count: usize, sample: Vec<i32> },

    #[error("no movies survived filtering")]
    NoMoviesForMood { attempted_genre_ids: Vec<i32>, genre_errors: BTreeMap<i32, String> },

    #[error(transparent)]
    Db(#[from] sea_orm::DbErr),
}

pub async fn aggregate(
    repo: &Repository,
    tmdb: &TmdbClient,
    query: &MoodQuery,
    max_concurrent: usize,
) -> Result<MoodMovies, AggregateError> {
    let Some(mood) = repo.find_mood_by_name(&query.mood_name).await? else {
        return Err(AggregateError::MoodNotFound {
            available_moods: repo.all_mood_names().await?,
        });
    };

    let mood_genres = repo.genre_ids_for_mood(mood.id).await?;
    if mood_genres.ids.is_empty() {
        return Err(AggregateError::NoGenresForMood {
            mood: mood.name,
            genre_count: mood_genres.raw_count,
            sample: mood_genres.raw_sample,
        });
    }

    debug!(mood = %mood.name, genres = ?mood_genres.ids, page = query.page, "aggregating");

    // Fan out one discovery call per genre id. `buffered` keeps submission
    // order, so the merged pool is ordered by genre id, then provider order
    // within each page.
    let attempted: Vec<i32> = mood_genres.ids.iter().copied().collect();
    let pages: Vec<(i32, TmdbResult<DiscoverPage>)> = stream::iter(attempted.iter().copied())
        .map(|genre_id| async move { (genre_id, tmdb.discover_by_genre(genre_id, query.page).await) })
        .buffered(max_concurrent.max(1))
        .collect()
        .await;

    let mut genre_errors: BTreeMap<i32, String> = BTreeMap::new();
    let mut pool: Vec<RawMovie> = Vec::new();
    for (genre_id, result) in pages {
        match result {
            Ok(page) => {
                debug!(genre_id, movies = page.movies.len(), "discovery page merged");
                pool.extend(page.movies);
            },
            Err(err) => {
                warn!(genre_id, error = %err, "discovery failed for genre");
                genre_errors.insert(genre_id, err.to_string());
            },
        }
    }

    let survivors = filter_and_dedup(pool, &mood_genres.ids);
    if survivors.is_empty() {
        return Err(AggregateError::NoMoviesForMood {
            attempted_genre_ids: attempted,
            genre_errors,
        });
    }

    let genre_names = repo.all_genre_names().await?;
    let matched_genres = matched_genre_names(&survivors, &mood_genres.ids, &genre_names);

    let movies = enrich_movies(tmdb, survivors, &genre_names, max_concurrent, false).await;

    debug!(mood = %mood.name, movies = movies.len(), "aggregation complete");

    Ok(MoodMovies { mood: mood.name, matched_genres, page: query.page, movies })
}

/// Relevance filter and dedup over the merged candidate pool. A candidate
/// stays iff at least `MIN_GENRE_MATCHES` of its genre ids are in the mood's
/// set; the first occurrence of each movie id wins.
fn filter_and_dedup(pool: Vec<RawMovie>, mood_genre_ids: &BTreeSet<i32>) -> Vec<RawMovie> {
    let mut seen: HashSet<i64> = HashSet::new();
    pool.into_iter()
        .filter(|movie| genre_match_count(movie, mood_genre_ids) >= MIN_GENRE_MATCHES)
        .filter(|movie| seen.insert(movie.id))
        .collect()
}

fn genre_match_count(movie: &RawMovie, mood_genre_ids: &BTreeSet<i32>) -> usize {
    movie.genre_ids.iter().filter(|id| mood_genre_ids.contains(id)).count()
}

/// The subset of the mood's genres any surviving movie actually matched,
/// resolved to names. Ids without a local name are dropped.
fn matched_genre_names(
    survivors: &[RawMovie],
    mood_genre_ids: &BTreeSet<i32>,
    genre_names: &HashMap<i32, String>,
) -> Vec<String> {
    let matched: BTreeSet<i32> = survivors
        .iter()
        .flat_map(|m| m.genre_ids.iter().copied())
        .filter(|id| mood_genre_ids.contains(id))
        .collect();
    matched.into_iter().filter_map(|id| genre_names.get(&id).cloned()).collect()
}

/// Decorate and detail-enrich a batch of movies with bounded concurrency.
/// A failed detail lookup never aborts the batch: with `drop_on_failure`
/// the movie is dropped, otherwise it stays with fallback detail values.
pub async fn enrich_movies(
    tmdb: &TmdbClient,
    movies: Vec<RawMovie>,
    genre_names: &HashMap<i32, String>,
    max_concurrent: usize,
    drop_on_failure: bool,
) -> Vec<EnrichedMovie> {
    let enriched: Vec<Option<EnrichedMovie>> = stream::iter(movies)
        .map(|raw| async move {
            let mut movie = EnrichedMovie::from_raw(&raw, genre_names);
            match tmdb.fetch_details(raw.id).await {
                Ok(details) => movie.apply_details(&details),
                Err(err) => {
                    warn!(movie_id = raw.id, error = %err, "detail enrichment failed");
                    if drop_on_failure {
                        return None;
                    }
                    movie.apply_detail_fallbacks();
                },
            }
            Some(movie)
        })
        .buffered(max_concurrent.max(1))
        .collect()
        .await;

    enriched.into_iter().flatten().collect()
}

/// Decoration only, no detail lookups. Used by listings that do not enrich.
pub fn decorate_movies(
    movies: &[RawMovie],
    genre_names: &HashMap<i32, String>,
) -> Vec<EnrichedMovie> {
    movies.iter().map(|raw| EnrichedMovie::from_raw(raw, genre_names)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(id: i64, genre_ids: Vec<i32>) -> RawMovie {
        RawMovie {
            id,
            title: Some(format!("movie-{id}")),
            overview: None,
            vote_average: None,
            release_date: None,
            poster_path: None,
            backdrop_path: None,
            genre_ids,
        }
    }

    fn happy_genres() -> BTreeSet<i32> {
        BTreeSet::from([35, 16, 10751, 10402])
    }

    #[test]
    fn two_genre_matches_pass_one_does_not() {
        let genres = happy_genres();
        assert_eq!(genre_match_count(&raw(1, vec![35, 16]), &genres), 2);
        assert_eq!(genre_match_count(&raw(2, vec![35]), &genres), 1);

        let kept = filter_and_dedup(vec![raw(1, vec![35, 16]), raw(2, vec![35])], &genres);
        assert_eq!(kept.iter().map(|m| m.id).collect::<Vec<_>>(), vec![1]);
    }

    #[test]
    fn genres_outside_the_mood_set_do_not_count() {
        let genres = happy_genres();
        // Three genres total but only one from the mood's set.
        let movie = raw(1, vec![35, 18, 27]);
        assert_eq!(genre_match_count(&movie, &genres), 1);
        assert!(filter_and_dedup(vec![movie], &genres).is_empty());
    }

    #[test]
    fn dedup_keeps_first_occurrence_in_merge_order() {
        let genres = happy_genres();
        let first = RawMovie { title: Some("first".into()), ..raw(7, vec![35, 16]) };
        let second = RawMovie { title: Some("second".into()), ..raw(7, vec![16, 10751]) };
        let kept = filter_and_dedup(vec![first, second, raw(8, vec![35, 10402])], &genres);
        assert_eq!(kept.len(), 2);
        assert_eq!(kept[0].id, 7);
        assert_eq!(kept[0].title.as_deref(), Some("first"));
        assert_eq!(kept[1].id, 8);
    }

    #[test]
    fn matched_genres_are_the_subset_survivors_touched() {
        let genres = happy_genres();
        let names = HashMap::from([
            (35, "Comedy".to_string()),
            (16, "Animation".to_string()),
            (10751, "Family".to_string()),
            (10402, "Music".to_string()),
        ]);
        let survivors = vec![raw(1, vec![35, 16]), raw(2, vec![16, 10402, 27])];
        let matched = matched_genre_names(&survivors, &genres, &names);
        assert_eq!(matched, vec!["Animation", "Comedy", "Music"]);
    }

    #[test]
    fn matched_genres_drop_unresolvable_ids() {
        let genres = BTreeSet::from([35, 16]);
        let names = HashMap::from([(35, "Comedy".to_string())]);
        let survivors = vec![raw(1, vec![35, 16])];
        assert_eq!(matched_genre_names(&survivors, &genres, &names), vec!["Comedy"]);
    }
}
