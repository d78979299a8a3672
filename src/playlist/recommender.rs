use super::fetcher::Fetcher;
use super::options::{Genre, Mood, Situation};
use super::queries::QueryBuilder;
use crate::client::{CatalogClient, CatalogError, RecommendationSeed};
use crate::models::{DedupKey, SongRecord};
use serde::Serialize;
use std::collections::HashSet;
use tracing::{debug, info, warn};

pub const DEFAULT_WATCH_BASE: &str = "https://music.youtube.com";

/// Limits and switches for the recommendation waterfall
#[derive(Debug, Clone)]
pub struct RecommendSettings {
    /// Playlists looked up per playlist-stage query
    pub playlist_search_limit: usize,
    /// Tracks read from each playlist
    pub playlist_track_limit: usize,
    /// Chart entries considered for the region boost
    pub chart_limit: usize,
    /// Song searches ask for `target_count * search_multiplier` to absorb duplicates
    pub search_multiplier: usize,
    /// Ask the provider's seeded recommendation endpoint before falling back to search
    pub seeded_recommendations: bool,
    /// Base for play links of records that carry no link of their own
    pub watch_base: String,
}

impl Default for RecommendSettings {
    fn default() -> Self {
        Self {
            playlist_search_limit: 4,
            playlist_track_limit: 250,
            chart_limit: 120,
            search_multiplier: 2,
            seeded_recommendations: false,
            watch_base: DEFAULT_WATCH_BASE.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecommendationRequest {
    pub mood: Mood,
    pub situation: Situation,
    pub genre: Genre,
    pub target_count: usize,
}

/// Waterfall stage names, used in diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Playlist,
    Chart,
    SeededRecommendation,
    Search,
}

/// A source call that failed and was treated as contributing nothing
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StageFailure {
    pub stage: Stage,
    pub target: String,
    pub message: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Recommendation {
    pub songs: Vec<SongRecord>,
    /// Queries actually sent to the catalog, first use order, for display only
    pub queries: Vec<String>,
    pub failures: Vec<StageFailure>,
}

impl Recommendation {
    pub fn is_empty(&self) -> bool {
        self.songs.is_empty()
    }
}

/// Ordered, deduplicated collection that knows when it has enough songs
struct SongAccumulator {
    songs: Vec<SongRecord>,
    seen: HashSet<DedupKey>,
    target: usize,
}

impl SongAccumulator {
    fn new(target: usize) -> Self {
        Self {
            songs: Vec::with_capacity(target),
            seen: HashSet::new(),
            target,
        }
    }

    fn is_full(&self) -> bool {
        self.songs.len() >= self.target
    }

    /// Fold songs in order, first seen wins. Returns true once the target is reached.
    fn extend(&mut self, songs: Vec<SongRecord>) -> bool {
        for song in songs {
            if self.is_full() {
                break;
            }
            if self.seen.insert(song.dedup_key()) {
                self.songs.push(song);
            }
        }
        self.is_full()
    }
}

/// Builds recommendations from a catalog client
pub struct Recommender<'a, C: CatalogClient + ?Sized> {
    client: &'a C,
    settings: RecommendSettings,
}

impl<'a, C: CatalogClient + ?Sized> Recommender<'a, C> {
    pub fn new(client: &'a C, settings: RecommendSettings) -> Self {
        Self { client, settings }
    }

    /// Run the waterfall: genre playlists, regional chart, seeded recommendations,
    /// then plain song search. Returns as soon as `target_count` distinct songs are collected.
    ///
    /// Source failures never abort the request; a short or empty result is a normal outcome.
    pub fn recommend(&self, request: &RecommendationRequest) -> Recommendation {
        let RecommendationRequest { mood, situation, genre, target_count } = *request;
        let fetcher = Fetcher::new(self.client, &self.settings.watch_base);
        let genre_profile = genre.profile();

        let mut acc = SongAccumulator::new(target_count);
        let mut failures = Vec::new();
        let mut queries = Vec::new();

        info!(?mood, ?situation, ?genre, target_count, "building recommendation");

        if target_count == 0 {
            return Recommendation::default();
        }

        let done = |acc: SongAccumulator, failures: Vec<StageFailure>, queries: Vec<String>| {
            info!(songs = acc.songs.len(), failures = failures.len(), "recommendation finished");
            Recommendation { songs: acc.songs, queries, failures }
        };

        // 1. Genre playlists
        if !genre_profile.force_terms.is_empty() {
            for query in QueryBuilder::build_queries(mood, situation, genre) {
                record_query(&mut queries, &query);
                let playlist_ids = degrade(
                    Stage::Playlist,
                    &query,
                    fetcher.search_playlist_ids(&query, self.settings.playlist_search_limit),
                    &mut failures,
                );
                for playlist_id in playlist_ids {
                    let songs = degrade(
                        Stage::Playlist,
                        &playlist_id,
                        fetcher.playlist_songs(&playlist_id, &query, self.settings.playlist_track_limit),
                        &mut failures,
                    );
                    if acc.extend(songs) {
                        debug!(query = %query, "target reached in playlist stage");
                        return done(acc, failures, queries);
                    }
                }
            }
        }

        // 2. Regional chart boost
        if let Some(region) = genre_profile.chart_region {
            let songs = degrade(
                Stage::Chart,
                region,
                fetcher.chart_songs(region, self.settings.chart_limit),
                &mut failures,
            );
            if acc.extend(songs) {
                debug!(region, "target reached in chart stage");
                return done(acc, failures, queries);
            }
        }

        let search_limit = target_count.saturating_mul(self.settings.search_multiplier);

        // 3. Attribute-seeded recommendations
        if self.settings.seeded_recommendations {
            if let Some(seed_genre) = genre_profile.seed_genre {
                let targets = mood.profile().targets;
                let seed = RecommendationSeed {
                    genre: seed_genre.to_string(),
                    target_valence: targets.valence,
                    target_energy: targets.energy,
                };
                let songs = degrade(
                    Stage::SeededRecommendation,
                    seed_genre,
                    fetcher.recommended_songs(&seed, search_limit),
                    &mut failures,
                );
                if acc.extend(songs) {
                    debug!(seed_genre, "target reached in recommendation stage");
                    return done(acc, failures, queries);
                }
            }
        }

        // 4. Keyword song search
        for query in QueryBuilder::build_fallback_queries(mood, situation, genre) {
            record_query(&mut queries, &query);
            let songs = degrade(
                Stage::Search,
                &query,
                fetcher.search_songs(&query, search_limit),
                &mut failures,
            );
            if acc.extend(songs) {
                debug!(query = %query, "target reached in search stage");
                return done(acc, failures, queries);
            }
        }

        if acc.songs.len() < target_count {
            info!(collected = acc.songs.len(), target_count, "sources exhausted before target");
        }
        done(acc, failures, queries)
    }
}

/// Note a query as issued; a query sent by two stages is listed once
fn record_query(queries: &mut Vec<String>, query: &str) {
    if !queries.iter().any(|issued| issued == query) {
        queries.push(query.to_string());
    }
}

/// Stage boundary policy: a failed source contributes nothing and is recorded
fn degrade<T: Default>(
    stage: Stage,
    target: &str,
    result: Result<T, CatalogError>,
    failures: &mut Vec<StageFailure>,
) -> T {
    match result {
        Ok(value) => value,
        Err(err) => {
            match &err {
                CatalogError::Unsupported(_) => debug!(?stage, target, "source unsupported: {err}"),
                _ => warn!(?stage, target, "source failed, continuing without it: {err}"),
            }
            failures.push(StageFailure {
                stage,
                target: target.to_string(),
                message: err.to_string(),
            });
            T::default()
        }
    }
}
