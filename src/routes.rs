use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::warn;

use crate::{
    AppState,
    aggregator::{self, MoodQuery},
    error::{ApiError, ApiResult},
    models::{
        FALLBACK_DESCRIPTION, FALLBACK_TAGLINE, FALLBACK_TITLE, NO_IMAGE_URL, NO_POSTER_URL,
        backdrop_url, poster_url, release_year, round_rating,
    },
    tmdb::TmdbError,
};

const SIMILAR_MOVIE_LIMIT: usize = 5;

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    pub page: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub page: Option<u32>,
    pub genre: Option<i32>,
}

pub async fn list_moods(State(state): State<Arc<AppState>>) -> ApiResult<Json<Value>> {
    let moods = state.repo.all_moods().await?;
    let data: Vec<Value> =
        moods.iter().map(|m| json!({ "id": m.id, "name": m.name })).collect();
    Ok(Json(json!({ "message": "Moods fetched successfully", "data": data })))
}

pub async fn list_genres(State(state): State<Arc<AppState>>) -> ApiResult<Json<Value>> {
    let genres = state.repo.all_genres().await?;
    let data: Vec<Value> =
        genres.iter().map(|g| json!({ "id": g.id, "name": g.name })).collect();
    Ok(Json(json!({ "message": "Genres fetched successfully", "data": data })))
}

pub async fn movies_by_mood(
    State(state): State<Arc<AppState>>,
    Path(mood_name): Path<String>,
    Query(q): Query<PageQuery>,
) -> ApiResult<Json<Value>> {
    let query = MoodQuery::new(mood_name, q.page);
    let result =
        aggregator::aggregate(&state.repo, &state.tmdb, &query, state.config.max_concurrent)
            .await?;

    Ok(Json(json!({
        "message": format!("{} movies fetched successfully", result.mood),
        "meta": {
            "mood": result.mood,
            "matched_genres": result.matched_genres,
            "page": result.page,
            "total_movies": result.movies.len(),
        },
        "data": result.movies,
    })))
}

pub async fn popular_movies(State(state): State<Arc<AppState>>) -> ApiResult<Json<Value>> {
    let movies = state.tmdb.fetch_popular().await?;
    if movies.is_empty() {
        return Err(ApiError::NoMovies);
    }

    let genre_names = state.repo.all_genre_names().await?;
    let data = aggregator::decorate_movies(&movies, &genre_names);
    Ok(Json(json!({ "message": "Popular movies successfully fetched", "data": data })))
}

/// Generic discovery listing, detail-enriched. Movies whose detail lookup
/// fails are dropped here, unlike the mood pipeline which keeps them with
/// fallbacks.
pub async fn list_movies(
    State(state): State<Arc<AppState>>,
    Query(q): Query<ListQuery>,
) -> ApiResult<Json<Value>> {
    let page = q.page.unwrap_or(1).max(1);
    let discover = state.tmdb.discover(page, q.genre).await?;

    let genre_names = state.repo.all_genre_names().await?;
    let data = aggregator::enrich_movies(
        &state.tmdb,
        discover.movies,
        &genre_names,
        state.config.max_concurrent,
        true,
    )
    .await;

    if data.is_empty() {
        return Err(ApiError::NoMovies);
    }

    Ok(Json(json!({
        "message": "Movies fetched successfully",
        "page": discover.page,
        "total_pages": discover.total_pages,
        "total_results": discover.total_results,
        "data": data,
    })))
}

pub async fn movie_detail(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Value>> {
    let details = match state.tmdb.fetch_details(id).await {
        Ok(details) => details,
        Err(TmdbError::Status { status, .. }) if status == StatusCode::NOT_FOUND => {
            return Err(ApiError::MovieNotFound);
        },
        Err(err) => return Err(err.into()),
    };
    if details.is_empty() {
        return Err(ApiError::MovieNotFound);
    }

    // A broken similar-movies lookup degrades to an empty list.
    let similar = match state.tmdb.fetch_similar(id).await {
        Ok(similar) => similar,
        Err(err) => {
            warn!(movie_id = id, error = %err, "similar movies lookup failed");
            Vec::new()
        },
    };
    let similar_movies: Vec<Value> = similar
        .iter()
        .take(SIMILAR_MOVIE_LIMIT)
        .map(|m| {
            json!({
                "title": m.title,
                "image": poster_url(m.poster_path.as_deref(), NO_IMAGE_URL),
            })
        })
        .collect();

    let genres: Vec<String> = if details.genres.is_empty() {
        vec!["Unknown Genre".to_string()]
    } else {
        details.genres.iter().map(|g| g.name.clone()).collect()
    };

    Ok(Json(json!({
        "message": "Movie fetched successfully",
        "data": {
            "id": details.id,
            "title": details.title.clone().unwrap_or_else(|| FALLBACK_TITLE.to_string()),
            "genres": genres,
            "description": details
                .overview
                .clone()
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| FALLBACK_DESCRIPTION.to_string()),
            "tagline": details
                .tagline
                .clone()
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| FALLBACK_TAGLINE.to_string()),
            "rating": round_rating(details.vote_average.unwrap_or(0.0)),
            "runtime": details.runtime.unwrap_or(0),
            "year": release_year(details.release_date.as_deref()),
            "release_date": details
                .release_date
                .clone()
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| "Unknown".to_string()),
            "poster": poster_url(details.poster_path.as_deref(), NO_POSTER_URL),
            "backdrop": backdrop_url(details.backdrop_path.as_deref()),
            "similar_movies": similar_movies,
        },
    })))
}
