use sea_orm::entity::prelude::*;

/// Mood/genre association. `tmdb_genre_id` lives in TMDB's id space and is
/// not required to reference a row in the local `genres` table.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "mood_genre")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub mood_id: i32,
    #[sea_orm(primary_key, auto_increment = false)]
    pub tmdb_genre_id: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
