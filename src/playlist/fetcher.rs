use crate::client::{CatalogClient, CatalogError, RecommendationSeed, SearchKind};
use crate::models::{RawRecord, SongRecord, Source};
use tracing::debug;

/// Chart category holding individual tracks
pub const SONGS_CATEGORY: &str = "songs";

/// Calls the catalog and turns raw records into song records
pub struct Fetcher<'a, C: CatalogClient + ?Sized> {
    client: &'a C,
    watch_base: &'a str,
}

impl<'a, C: CatalogClient + ?Sized> Fetcher<'a, C> {
    pub fn new(client: &'a C, watch_base: &'a str) -> Self {
        Self { client, watch_base }
    }

    /// Plain song search; the query doubles as provenance
    pub fn search_songs(&self, query: &str, limit: usize) -> Result<Vec<SongRecord>, CatalogError> {
        let raw = self.client.search(query, SearchKind::Song, limit)?;
        debug!(query, returned = raw.len(), "song search");
        Ok(self.normalize(raw, || Source::Search { query: query.to_string() }))
    }

    /// Ids of playlists matching the query, in provider order
    pub fn search_playlist_ids(&self, query: &str, limit: usize) -> Result<Vec<String>, CatalogError> {
        let raw = self.client.search(query, SearchKind::Playlist, limit)?;
        debug!(query, returned = raw.len(), "playlist search");
        Ok(raw
            .into_iter()
            .filter_map(|record| record.id)
            .filter(|id| !id.trim().is_empty())
            .collect())
    }

    pub fn playlist_songs(&self, playlist_id: &str, query: &str, limit: usize) -> Result<Vec<SongRecord>, CatalogError> {
        let mut raw = self.client.playlist_tracks(playlist_id, limit)?;
        raw.truncate(limit);
        debug!(playlist_id, tracks = raw.len(), "playlist tracks");
        Ok(self.normalize(raw, || Source::Playlist { query: query.to_string() }))
    }

    /// Songs from the region's chart, falling back to any category that looks like songs
    pub fn chart_songs(&self, region: &str, limit: usize) -> Result<Vec<SongRecord>, CatalogError> {
        let mut charts = self.client.chart(region)?;
        let category = if charts.contains_key(SONGS_CATEGORY) {
            Some(SONGS_CATEGORY.to_string())
        } else {
            charts.keys().find(|name| name.contains("song")).cloned()
        };

        let mut raw = category
            .and_then(|name| charts.remove(&name))
            .unwrap_or_default();
        raw.truncate(limit);
        debug!(region, entries = raw.len(), "chart songs");
        Ok(self.normalize(raw, || Source::Chart { region: region.to_string() }))
    }

    pub fn recommended_songs(&self, seed: &RecommendationSeed, limit: usize) -> Result<Vec<SongRecord>, CatalogError> {
        let raw = self.client.recommendations(seed, limit)?;
        debug!(seed = %seed.genre, returned = raw.len(), "seeded recommendations");
        Ok(self.normalize(raw, || Source::Recommendation { seed: seed.genre.clone() }))
    }

    fn normalize(&self, raw: Vec<RawRecord>, source: impl Fn() -> Source) -> Vec<SongRecord> {
        raw.into_iter()
            .filter_map(|record| SongRecord::from_raw(record, source(), self.watch_base))
            .collect()
    }
}
