use serde::{Deserialize, Serialize};
use std::fmt;

/// Placeholder used when the provider gives no title or no artists
pub const UNKNOWN: &str = "Unknown";

/// A thumbnail variant as declared by the provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Thumbnail {
    pub url: String,
    #[serde(default)]
    pub width: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawArtist {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawAlbum {
    pub name: String,
}

/// Provider-neutral record returned by every catalog operation.
///
/// For song results `id` is the playable track id, for playlist results it is
/// the id used to browse the playlist.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawRecord {
    pub id: Option<String>,
    pub title: Option<String>,
    #[serde(default)]
    pub artists: Vec<RawArtist>,
    pub album: Option<RawAlbum>,
    pub duration: Option<String>,
    #[serde(default)]
    pub thumbnails: Vec<Thumbnail>,
    /// Canonical play link when the provider hands one out directly
    pub link: Option<String>,
}

/// Where a song record came from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Source {
    Search { query: String },
    Playlist { query: String },
    Chart { region: String },
    Recommendation { seed: String },
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::Search { query } => write!(f, "{query}"),
            Source::Playlist { query } => write!(f, "playlist: {query}"),
            Source::Chart { region } => write!(f, "{region} chart"),
            Source::Recommendation { seed } => write!(f, "recommendations: {seed}"),
        }
    }
}

/// A normalized track ready to be shown to the user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SongRecord {
    pub title: String,
    pub artists: String,
    pub album: Option<String>,
    pub duration: Option<String>,
    pub thumbnail: Option<String>,
    pub url: String,
    pub source: Source,
}

/// Normalized (title, artists) pair used to detect the same track across sources
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DedupKey {
    title: String,
    artists: String,
}

impl DedupKey {
    pub fn new(title: &str, artists: &str) -> Self {
        DedupKey {
            title: title.trim().to_lowercase(),
            artists: artists.trim().to_lowercase(),
        }
    }
}

impl SongRecord {
    /// Normalize a raw provider record. Records without an id are unusable and yield `None`.
    pub fn from_raw(raw: RawRecord, source: Source, watch_base: &str) -> Option<SongRecord> {
        let id = raw.id.filter(|id| !id.trim().is_empty())?;

        let title = raw
            .title
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| UNKNOWN.to_string());

        let names: Vec<&str> = raw
            .artists
            .iter()
            .map(|a| a.name.trim())
            .filter(|name| !name.is_empty())
            .collect();
        let artists = if names.is_empty() {
            UNKNOWN.to_string()
        } else {
            names.join(", ")
        };

        let url = raw.link.unwrap_or_else(|| {
            format!("{}/watch?v={}", watch_base.trim_end_matches('/'), id)
        });

        Some(SongRecord {
            title,
            artists,
            album: raw.album.map(|a| a.name),
            duration: raw.duration,
            thumbnail: pick_thumbnail(&raw.thumbnails),
            url,
            source,
        })
    }

    pub fn dedup_key(&self) -> DedupKey {
        DedupKey::new(&self.title, &self.artists)
    }
}

/// Pick the url of the widest thumbnail; variants without a width count as zero
pub fn pick_thumbnail(thumbnails: &[Thumbnail]) -> Option<String> {
    // max_by_key keeps the last of equal maxima, same as a stable sort and taking the tail
    thumbnails
        .iter()
        .max_by_key(|t| t.width.unwrap_or(0))
        .map(|t| t.url.clone())
}
