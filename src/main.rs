use std::{sync::Arc, time::Duration};

use moodreel::{AppState, app, config::Config, db, repo::Repository, tmdb::TmdbClient};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,moodreel=debug,sqlx=warn".to_string()),
        )
        .init();

    let config = Arc::new(Config::from_env()?);

    let http = reqwest::Client::builder()
        .user_agent("moodreel/0.1")
        .timeout(Duration::from_secs(config.tmdb_timeout_secs))
        .build()?;

    let conn = db::connect_and_migrate(&config.database_url).await?;
    db::seed_reference_data(&conn).await?;

    let tmdb = Arc::new(TmdbClient::new(
        http,
        config.tmdb_api_key.clone(),
        config.tmdb_base_url.clone(),
    ));

    db::sync_genre_catalog(&conn, &tmdb).await;

    let state = Arc::new(AppState { config: config.clone(), repo: Repository::new(conn), tmdb });

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    tracing::info!(addr = %config.addr, "listening");
    axum::serve(listener, app(state)).await?;

    Ok(())
}
