use std::collections::{BTreeSet, HashMap};

use sea_orm::{
    ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, QueryOrder,
};

use crate::entities::{genre, mood, mood_genre};

/// A mood's genre associations: the usable id set plus the raw row shape,
/// kept for diagnostics when the usable set turns out empty.
#[derive(Clone, Debug)]
pub struct MoodGenreIds {
    /// Positive ids only, deduplicated. BTreeSet iteration order is what the
    /// aggregation merge order is defined against.
    pub ids: BTreeSet<i32>,
    pub raw_count: usize,
    pub raw_sample: Vec<i32>,
}

const RAW_SAMPLE_LEN: usize = 5;

/// Read-only access to the seeded mood/genre reference tables.
#[derive(Clone)]
pub struct Repository {
    db: DatabaseConnection,
}

impl Repository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub fn db(&self) -> &DatabaseConnection {
        &self.db
    }

    /// Exact-match lookup; case sensitivity is whatever the storage
    /// collation provides.
    pub async fn find_mood_by_name(&self, name: &str) -> Result<Option<mood::Model>, DbErr> {
        mood::Entity::find().filter(mood::Column::Name.eq(name)).one(&self.db).await
    }

    /// Genre ids associated with a mood, filtered to positive integers.
    /// Non-positive ids are malformed reference data and are discarded.
    pub async fn genre_ids_for_mood(&self, mood_id: i32) -> Result<MoodGenreIds, DbErr> {
        let rows = mood_genre::Entity::find()
            .filter(mood_genre::Column::MoodId.eq(mood_id))
            .all(&self.db)
            .await?;

        let raw: Vec<i32> = rows.into_iter().map(|r| r.tmdb_genre_id).collect();
        let ids: BTreeSet<i32> = raw.iter().copied().filter(|id| *id > 0).collect();

        Ok(MoodGenreIds {
            ids,
            raw_count: raw.len(),
            raw_sample: raw.into_iter().take(RAW_SAMPLE_LEN).collect(),
        })
    }

    /// The full local genre name map, loaded once per request so movie
    /// decoration is an O(1) lookup per genre id.
    pub async fn all_genre_names(&self) -> Result<HashMap<i32, String>, DbErr> {
        let genres = genre::Entity::find().all(&self.db).await?;
        Ok(genres.into_iter().map(|g| (g.id, g.name)).collect())
    }

    /// Every seeded mood name, in id order. Used for "did you mean" style
    /// diagnostics when a mood lookup fails.
    pub async fn all_mood_names(&self) -> Result<Vec<String>, DbErr> {
        let moods =
            mood::Entity::find().order_by_asc(mood::Column::Id).all(&self.db).await?;
        Ok(moods.into_iter().map(|m| m.name).collect())
    }

    pub async fn all_moods(&self) -> Result<Vec<mood::Model>, DbErr> {
        mood::Entity::find().order_by_asc(mood::Column::Id).all(&self.db).await
    }

    pub async fn all_genres(&self) -> Result<Vec<genre::Model>, DbErr> {
        genre::Entity::find().order_by_asc(genre::Column::Id).all(&self.db).await
    }
}

#[cfg(test)]
mod tests {
    use sea_orm::Set;

    use super::*;
    use crate::db;

    async fn test_repo() -> Repository {
        let conn = db::connect_and_migrate("sqlite::memory:").await.unwrap();
        db::seed_reference_data(&conn).await.unwrap();
        Repository::new(conn)
    }

    #[tokio::test]
    async fn mood_lookup_is_exact_match() {
        let repo = test_repo().await;
        assert!(repo.find_mood_by_name("Happy").await.unwrap().is_some());
        assert!(repo.find_mood_by_name("happy").await.unwrap().is_none());
        assert!(repo.find_mood_by_name("Melancholy").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn genre_ids_are_filtered_to_positive_and_deduplicated() {
        let repo = test_repo().await;
        let mood = repo.find_mood_by_name("Happy").await.unwrap().unwrap();

        // Sneak malformed rows into the association table.
        for bad in [-5, 0] {
            mood_genre::Entity::insert(mood_genre::ActiveModel {
                mood_id: Set(mood.id),
                tmdb_genre_id: Set(bad),
            })
            .exec(repo.db())
            .await
            .unwrap();
        }

        let mg = repo.genre_ids_for_mood(mood.id).await.unwrap();
        assert_eq!(mg.ids, BTreeSet::from([16, 35, 10402, 10751]));
        assert_eq!(mg.raw_count, 6);
        assert!(mg.raw_sample.len() <= 5);
    }

    #[tokio::test]
    async fn mood_names_cover_every_seeded_mood_once() {
        let repo = test_repo().await;
        let names = repo.all_mood_names().await.unwrap();
        assert_eq!(names.len(), 9);
        assert!(names.contains(&"Gripping".to_string()));
        let mut deduped = names.clone();
        deduped.dedup();
        assert_eq!(deduped, names);
    }

    #[tokio::test]
    async fn genre_name_map_resolves_tmdb_ids() {
        let repo = test_repo().await;
        let names = repo.all_genre_names().await.unwrap();
        assert_eq!(names.get(&35).map(String::as_str), Some("Comedy"));
        assert_eq!(names.get(&878).map(String::as_str), Some("Science Fiction"));
        assert!(!names.contains_key(&999));
    }
}
