pub mod genre;
pub mod mood;
pub mod mood_genre;
