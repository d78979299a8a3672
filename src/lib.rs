//! Mood, situation and genre driven track recommendations assembled from
//! music catalog searches.

pub mod client;
pub mod config;
pub mod models;
pub mod playlist;
pub mod providers;


pub use client::{CatalogClient, CatalogError, SearchKind};
pub use models::{SongRecord, Source};
pub use playlist::{Genre, Mood, Recommendation, RecommendationRequest, Recommender, Situation};
