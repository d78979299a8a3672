use crate::models::RawRecord;
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// Errors raised by a catalog provider
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Network error: {0}")]
    Transport(String),

    #[error("API error {0}: {1}")]
    Status(u16, String),

    #[error("Failed to decode response: {0}")]
    Decode(String),

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Operation not supported by this provider: {0}")]
    Unsupported(&'static str),
}

impl From<ureq::Error> for CatalogError {
    fn from(err: ureq::Error) -> Self {
        match err {
            ureq::Error::Status(code, response) => {
                let body = response.into_string().unwrap_or_default();
                CatalogError::Status(code, body)
            }
            ureq::Error::Transport(transport) => CatalogError::Transport(transport.to_string()),
        }
    }
}

impl From<std::io::Error> for CatalogError {
    fn from(err: std::io::Error) -> Self {
        CatalogError::Decode(err.to_string())
    }
}

impl From<serde_json::Error> for CatalogError {
    fn from(err: serde_json::Error) -> Self {
        CatalogError::Decode(err.to_string())
    }
}

/// What a search should return
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchKind {
    Song,
    Playlist,
}

impl fmt::Display for SearchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SearchKind::Song => write!(f, "song"),
            SearchKind::Playlist => write!(f, "playlist"),
        }
    }
}

/// Seed for providers exposing an attribute-targeted recommendation endpoint
#[derive(Debug, Clone, PartialEq)]
pub struct RecommendationSeed {
    pub genre: String,
    pub target_valence: f32,
    pub target_energy: f32,
}

/// Chart entries grouped by category ("songs", "music videos", ...)
pub type Charts = BTreeMap<String, Vec<RawRecord>>;

/// The music catalog capability the recommender is built on.
///
/// Implementations are not expected to honor `limit` exactly.
#[cfg_attr(test, mockall::automock)]
pub trait CatalogClient {
    fn search(&self, query: &str, kind: SearchKind, limit: usize) -> Result<Vec<RawRecord>, CatalogError>;

    fn playlist_tracks(&self, playlist_id: &str, limit: usize) -> Result<Vec<RawRecord>, CatalogError>;

    fn chart(&self, region: &str) -> Result<Charts, CatalogError>;

    fn recommendations(&self, _seed: &RecommendationSeed, _limit: usize) -> Result<Vec<RawRecord>, CatalogError> {
        Err(CatalogError::Unsupported("recommendations"))
    }
}
