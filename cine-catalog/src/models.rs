use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use cine_core::StoreError;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MovieStatus {
    NowShowing,
    ComingSoon,
}

/// Catalog movie. Metadata comes from the external movie-database service;
/// the engine only needs identity and scheduling data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Movie {
    pub id: i64,
    pub title: String,
    pub duration_minutes: u32,
    pub status: MovieStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cinema {
    pub id: String,
    pub name: String,
    pub location: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ShowFormat {
    #[serde(rename = "2D")]
    TwoD,
    #[serde(rename = "3D")]
    ThreeD,
    #[serde(rename = "IMAX")]
    Imax,
}

/// A scheduled screening. Seat occupancy listed here is the schedule-setup
/// state; live availability is owned by the inventory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Showtime {
    pub id: String,
    pub movie_id: i64,
    pub cinema_id: String,
    pub screen: u32,
    pub starts_at: DateTime<Utc>,
    pub format: ShowFormat,
    pub occupied_seats: Vec<String>,
}

/// Read-only catalog access. Supplied by an external service in production;
/// the in-memory store seeds it with fixture data.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn get_movie(&self, id: i64) -> Result<Option<Movie>, StoreError>;
    async fn get_cinema(&self, id: &str) -> Result<Option<Cinema>, StoreError>;
    async fn get_showtime(&self, id: &str) -> Result<Option<Showtime>, StoreError>;
}
