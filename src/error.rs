use std::collections::BTreeMap;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::{aggregator::AggregateError, tmdb::TmdbError};

/// Everything a handler can fail with, rendered as the stable JSON error
/// envelope. Diagnostic context rides along as extra keys next to `error`;
/// raw internals never reach the client.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Mood not found")]
    MoodNotFound { available_moods: Vec<String> },

    #[error("No genres are linked to this mood")]
    NoGenresForMood { mood: String, genre_count: usize, sample: Vec<i32> },

    #[error("No matching movies found for this mood")]
    NoMoviesForMood { attempted_genre_ids: Vec<i32>, genre_errors: BTreeMap<i32, String> },

    #[error("No movies found")]
    NoMovies,

    #[error("No data found")]
    MovieNotFound,

    #[error("Upstream request failed")]
    Upstream(#[source] TmdbError),

    #[error("Internal server error")]
    Internal(#[from] anyhow::Error),
}

impl From<sea_orm::DbErr> for ApiError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Internal(anyhow::Error::new(err))
    }
}

impl From<TmdbError> for ApiError {
    fn from(err: TmdbError) -> Self {
        Self::Upstream(err)
    }
}

impl From<AggregateError> for ApiError {
    fn from(err: AggregateError) -> Self {
        match err {
            AggregateError::MoodNotFound { available_moods } => {
                Self::MoodNotFound { available_moods }
            },
            AggregateError::NoGenresForMood { mood, genre_count, sample } => {
                Self::NoGenresForMood { mood, genre_count, sample }
            },
            AggregateError::NoMoviesForMood { attempted_genre_ids, genre_errors } => {
                Self::NoMoviesForMood { attempted_genre_ids, genre_errors }
            },
            AggregateError::Db(err) => err.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let message = self.to_string();
        let (status, body) = match self {
            ApiError::MoodNotFound { available_moods } => (
                StatusCode::NOT_FOUND,
                json!({ "error": message, "available_moods": available_moods }),
            ),
            ApiError::NoGenresForMood { mood, genre_count, sample } => (
                StatusCode::BAD_REQUEST,
                json!({
                    "error": message,
                    "mood": mood,
                    "genre_count": genre_count,
                    "sample": sample,
                }),
            ),
            ApiError::NoMoviesForMood { attempted_genre_ids, genre_errors } => (
                StatusCode::NOT_FOUND,
                json!({
                    "error": message,
                    "attempted_genre_ids": attempted_genre_ids,
                    "genre_errors": genre_errors,
                }),
            ),
            ApiError::NoMovies | ApiError::MovieNotFound => {
                (StatusCode::NOT_FOUND, json!({ "error": message }))
            },
            ApiError::Upstream(err) => {
                tracing::warn!(error = %err, "upstream failure reached handler");
                (StatusCode::BAD_GATEWAY, json!({ "error": message }))
            },
            ApiError::Internal(err) => {
                tracing::error!(error = %err, "internal error");
                (StatusCode::INTERNAL_SERVER_ERROR, json!({ "error": message }))
            },
        };
        (status, Json(body)).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
