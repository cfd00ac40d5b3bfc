pub mod aggregator;
pub mod config;
pub mod db;
pub mod entities;
pub mod error;
pub mod models;
pub mod repo;
pub mod routes;
pub mod tmdb;

use std::sync::Arc;

use axum::{Router, routing::get};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{config::Config, repo::Repository, tmdb::TmdbClient};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub repo: Repository,
    pub tmdb: Arc<TmdbClient>,
}

pub fn app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/mood", get(routes::list_moods))
        .route("/genre", get(routes::list_genres))
        .route("/movies", get(routes::list_movies))
        .route("/movies/popular-movies", get(routes::popular_movies))
        .route("/movies/{id}", get(routes::movie_detail))
        .route("/movies/mood/{mood_name}", get(routes::movies_by_mood))
        .with_state(state)
        .layer(CorsLayer::new().allow_origin(Any).allow_headers(Any))
        .layer(TraceLayer::new_for_http())
}
