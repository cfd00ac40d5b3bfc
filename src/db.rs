use sea_orm::{
    ConnectionTrait, Database, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait, Set,
    Statement, sea_query::OnConflict,
};
use tracing::{info, warn};

use crate::{
    entities::{genre, mood, mood_genre},
    tmdb::TmdbClient,
};

const MIGRATION_001: &str = include_str!("../migrations/001_initial.sql");

/// Curated mood → TMDB genre-id associations.
const MOOD_GENRE_MAP: &[(&str, &[i32])] = &[
    ("Happy", &[35, 16, 10751, 10402]),
    ("Sad", &[18, 10749, 10402]),
    ("Scared", &[27, 53, 9648]),
    ("Romantic", &[10749, 18, 10402]),
    ("Curious", &[99, 36, 878, 9648]),
    ("Gripping", &[9648, 80, 53]),
    ("Serious", &[10752, 36, 18]),
    ("Gritty", &[37, 80, 53]),
    ("Chill", &[10770, 35, 16]),
];

/// TMDB's movie genre catalog, used as the offline seed. `sync_genre_catalog`
/// refreshes names from the live endpoint when reachable.
const GENRE_CATALOG: &[(i32, &str)] = &[
    (28, "Action"),
    (12, "Adventure"),
    (16, "Animation"),
    (35, "Comedy"),
    (80, "Crime"),
    (99, "Documentary"),
    (18, "Drama"),
    (10751, "Family"),
    (14, "Fantasy"),
    (36, "History"),
    (27, "Horror"),
    (10402, "Music"),
    (9648, "Mystery"),
    (10749, "Romance"),
    (878, "Science Fiction"),
    (10770, "TV Movie"),
    (53, "Thriller"),
    (10752, "War"),
    (37, "Western"),
];

pub async fn connect_and_migrate(database_url: &str) -> Result<DatabaseConnection, DbErr> {
    let db = Database::connect(database_url).await?;

    db.execute(Statement::from_string(
        db.get_database_backend(),
        "PRAGMA journal_mode=WAL".to_string(),
    ))
    .await?;

    db.execute(Statement::from_string(
        db.get_database_backend(),
        "PRAGMA synchronous=NORMAL".to_string(),
    ))
    .await?;

    run_sql(&db, MIGRATION_001).await?;
    Ok(db)
}

async fn run_sql(db: &DatabaseConnection, sql: &str) -> Result<(), DbErr> {
    for stmt in sql.split(';') {
        let stmt = stmt.trim();
        if stmt.is_empty() {
            continue;
        }
        db.execute(Statement::from_string(db.get_database_backend(), stmt.to_string())).await?;
    }
    Ok(())
}

/// Seed the static mood/genre reference data. Runs only against empty
/// tables, so restarts are idempotent.
pub async fn seed_reference_data(db: &DatabaseConnection) -> Result<(), DbErr> {
    if genre::Entity::find().count(db).await? == 0 {
        let rows = GENRE_CATALOG.iter().map(|(id, name)| genre::ActiveModel {
            id: Set(*id),
            name: Set(name.to_string()),
        });
        genre::Entity::insert_many(rows).exec(db).await?;
        info!(genres = GENRE_CATALOG.len(), "seeded genre catalog");
    }

    if mood::Entity::find().count(db).await? == 0 {
        for (name, genre_ids) in MOOD_GENRE_MAP {
            let inserted = mood::Entity::insert(mood::ActiveModel {
                name: Set(name.to_string()),
                ..Default::default()
            })
            .exec(db)
            .await?;

            let rows = genre_ids.iter().map(|gid| mood_genre::ActiveModel {
                mood_id: Set(inserted.last_insert_id),
                tmdb_genre_id: Set(*gid),
            });
            mood_genre::Entity::insert_many(rows).exec(db).await?;
        }
        info!(moods = MOOD_GENRE_MAP.len(), "seeded moods");
    }

    Ok(())
}

/// Best-effort refresh of the local genre table from TMDB's own catalog.
/// The upstream id space is canonical, so names it reports win over the
/// static seed; being offline at startup is not fatal.
pub async fn sync_genre_catalog(db: &DatabaseConnection, tmdb: &TmdbClient) {
    let catalog = match tmdb.fetch_genre_list().await {
        Ok(catalog) => catalog,
        Err(err) => {
            warn!(error = %err, "could not refresh genre catalog from TMDB; using seeded names");
            return;
        },
    };

    for (id, name) in catalog {
        let row = genre::ActiveModel { id: Set(id), name: Set(name) };
        let res = genre::Entity::insert(row)
            .on_conflict(
                OnConflict::column(genre::Column::Id)
                    .update_column(genre::Column::Name)
                    .to_owned(),
            )
            .exec(db)
            .await;
        if let Err(err) = res {
            warn!(genre_id = id, error = %err, "failed to upsert genre");
        }
    }
}
