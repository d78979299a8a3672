use super::token::{AccessToken, TokenCache};
use crate::client::{CatalogClient, CatalogError, Charts, RecommendationSeed, SearchKind};
use crate::config::{Config, SpotifyCredentials};
use crate::models::{RawAlbum, RawArtist, RawRecord, Thumbnail};
use anyhow::{Result, anyhow};
use chrono::Utc;
use serde::Deserialize;
use tracing::debug;
use ureq::{Agent, Request};
use urlencoding::encode;

const TOKEN_URL: &str = "https://accounts.spotify.com/api/token";
const API_BASE_URL: &str = "https://api.spotify.com/v1";
const SEARCH_PAGE_MAX: usize = 50;
const PLAYLIST_PAGE_MAX: usize = 100;
const RECOMMENDATIONS_MAX: usize = 100;

/// Spotify Web API client using the client credentials flow
pub struct SpotifyClient {
    agent: Agent,
    credentials: SpotifyCredentials,
    tokens: TokenCache,
}

#[derive(Debug, Deserialize)]
pub struct SpotifyImage {
    pub url: String,
    pub width: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct SpotifyArtist {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct SpotifyAlbum {
    pub name: String,
    #[serde(default)]
    pub images: Vec<SpotifyImage>,
}

#[derive(Debug, Deserialize)]
pub struct ExternalUrls {
    pub spotify: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SpotifyTrack {
    pub id: Option<String>,
    pub name: Option<String>,
    #[serde(default)]
    pub artists: Vec<SpotifyArtist>,
    pub album: Option<SpotifyAlbum>,
    pub duration_ms: Option<u64>,
    pub external_urls: Option<ExternalUrls>,
}

#[derive(Debug, Deserialize)]
pub struct SpotifyPlaylist {
    pub id: Option<String>,
    pub name: Option<String>,
    #[serde(default)]
    pub images: Vec<SpotifyImage>,
}

/// Paging object; Spotify may place `null` entries in `items`
#[derive(Debug, Deserialize)]
pub struct Page<T> {
    #[serde(default = "Vec::new")]
    pub items: Vec<Option<T>>,
    /// Url of the following page, absent on the last one
    pub next: Option<String>,
}

/// One fetched page, already converted
struct Chunk {
    records: Vec<RawRecord>,
    /// Raw entries on the page, including ones that were skipped
    fetched: usize,
    has_next: bool,
}

impl Chunk {
    fn from_page<T>(page: Page<T>, convert: impl Fn(T) -> Option<RawRecord>) -> Self {
        let fetched = page.items.len();
        let has_next = page.next.is_some();
        Chunk {
            records: page.items.into_iter().flatten().filter_map(convert).collect(),
            fetched,
            has_next,
        }
    }

    fn empty() -> Self {
        Chunk { records: Vec::new(), fetched: 0, has_next: false }
    }
}

/// Walk `offset`-paged results until `limit` records are collected or the provider runs out
fn paginate<F>(limit: usize, page_max: usize, mut fetch: F) -> Result<Vec<RawRecord>, CatalogError>
where
    F: FnMut(usize, usize) -> Result<Chunk, CatalogError>,
{
    let mut records = Vec::new();
    let mut offset = 0;
    while records.len() < limit {
        let page_size = (limit - records.len()).min(page_max);
        let chunk = fetch(offset, page_size)?;
        records.extend(chunk.records);
        if chunk.fetched == 0 || !chunk.has_next {
            break;
        }
        offset += chunk.fetched;
    }
    records.truncate(limit);
    Ok(records)
}

#[derive(Debug, Deserialize)]
pub struct SearchResponse {
    pub tracks: Option<Page<SpotifyTrack>>,
    pub playlists: Option<Page<SpotifyPlaylist>>,
}

#[derive(Debug, Deserialize)]
pub struct PlaylistItem {
    pub track: Option<SpotifyTrack>,
}

#[derive(Debug, Deserialize)]
pub struct RecommendationsResponse {
    #[serde(default)]
    pub tracks: Vec<SpotifyTrack>,
}

impl SpotifyClient {
    /// Fails when the configuration carries no Spotify credentials
    pub fn new(config: &Config) -> Result<Self> {
        let credentials = config
            .spotify
            .clone()
            .ok_or_else(|| anyhow!("Spotify credentials are not configured"))?;
        let agent = ureq::AgentBuilder::new().timeout(config.timeout).build();

        Ok(SpotifyClient {
            agent,
            credentials,
            tokens: TokenCache::new(),
        })
    }

    /// Exchange the client credentials for an access token
    pub fn get_token(&self, client_id: &str, client_secret: &str) -> Result<AccessToken, CatalogError> {
        let response = self
            .agent
            .post(TOKEN_URL)
            .send_form(&[
                ("grant_type", "client_credentials"),
                ("client_id", client_id),
                ("client_secret", client_secret),
            ])
            .map_err(|err| match CatalogError::from(err) {
                CatalogError::Status(code, body) => CatalogError::Auth(format!("{code}: {body}")),
                other => other,
            })?;
        Ok(response.into_json::<AccessToken>()?)
    }

    fn bearer(&self) -> Result<String, CatalogError> {
        self.tokens.get_or_refresh(Utc::now(), || {
            self.get_token(&self.credentials.client_id, &self.credentials.client_secret)
        })
    }

    fn get(&self, url: &str) -> Result<Request, CatalogError> {
        let token = self.bearer()?;
        Ok(self.agent.get(url).set("Authorization", &format!("Bearer {token}")))
    }

    fn call<T: serde::de::DeserializeOwned>(&self, request: Request) -> Result<T, CatalogError> {
        match request.call() {
            Ok(response) => Ok(response.into_json::<T>()?),
            Err(err) => {
                let err = CatalogError::from(err);
                if matches!(err, CatalogError::Status(401, _)) {
                    self.tokens.invalidate();
                }
                Err(err)
            }
        }
    }
}

impl CatalogClient for SpotifyClient {
    fn search(&self, query: &str, kind: SearchKind, limit: usize) -> Result<Vec<RawRecord>, CatalogError> {
        let search_type = match kind {
            SearchKind::Song => "track",
            SearchKind::Playlist => "playlist",
        };
        paginate(limit, SEARCH_PAGE_MAX, |offset, page_size| {
            let request = self
                .get(&format!("{API_BASE_URL}/search"))?
                .query("q", query)
                .query("type", search_type)
                .query("limit", &page_size.to_string())
                .query("offset", &offset.to_string());
            let response: SearchResponse = self.call(request)?;

            let chunk = match kind {
                SearchKind::Song => response
                    .tracks
                    .map(|page| Chunk::from_page(page, |track| Some(track_record(track)))),
                SearchKind::Playlist => response
                    .playlists
                    .map(|page| Chunk::from_page(page, |playlist| Some(playlist_record(playlist)))),
            };
            Ok(chunk.unwrap_or_else(Chunk::empty))
        })
    }

    fn playlist_tracks(&self, playlist_id: &str, limit: usize) -> Result<Vec<RawRecord>, CatalogError> {
        let url = format!("{API_BASE_URL}/playlists/{}/tracks", encode(playlist_id));
        paginate(limit, PLAYLIST_PAGE_MAX, |offset, page_size| {
            let request = self
                .get(&url)?
                .query("limit", &page_size.to_string())
                .query("offset", &offset.to_string());
            let page: Page<PlaylistItem> = self.call(request)?;
            debug!(playlist_id, offset, items = page.items.len(), "playlist page");
            Ok(Chunk::from_page(page, |item| item.track.map(track_record)))
        })
    }

    fn chart(&self, _region: &str) -> Result<Charts, CatalogError> {
        Err(CatalogError::Unsupported("charts"))
    }

    fn recommendations(&self, seed: &RecommendationSeed, limit: usize) -> Result<Vec<RawRecord>, CatalogError> {
        let limit = limit.clamp(1, RECOMMENDATIONS_MAX);
        debug!(genre = %seed.genre, limit, "requesting recommendations");
        let request = self
            .get(&format!("{API_BASE_URL}/recommendations"))?
            .query("seed_genres", &seed.genre)
            .query("target_valence", &format!("{:.2}", seed.target_valence))
            .query("target_energy", &format!("{:.2}", seed.target_energy))
            .query("limit", &limit.to_string());
        let response: RecommendationsResponse = self.call(request)?;
        Ok(response.tracks.into_iter().map(track_record).collect())
    }
}

/// `m:ss`, or `h:mm:ss` for long tracks
pub fn format_duration(duration_ms: u64) -> String {
    let total = duration_ms / 1000;
    let (hours, minutes, seconds) = (total / 3600, (total % 3600) / 60, total % 60);
    if hours > 0 {
        format!("{hours}:{minutes:02}:{seconds:02}")
    } else {
        format!("{minutes}:{seconds:02}")
    }
}

fn thumbnails(images: Vec<SpotifyImage>) -> Vec<Thumbnail> {
    images
        .into_iter()
        .map(|image| Thumbnail { url: image.url, width: image.width })
        .collect()
}

pub fn track_record(track: SpotifyTrack) -> RawRecord {
    let (album, thumbs) = match track.album {
        Some(album) => (Some(RawAlbum { name: album.name }), thumbnails(album.images)),
        None => (None, Vec::new()),
    };

    RawRecord {
        id: track.id,
        title: track.name,
        artists: track
            .artists
            .into_iter()
            .map(|artist| RawArtist { name: artist.name })
            .collect(),
        album,
        duration: track.duration_ms.map(format_duration),
        thumbnails: thumbs,
        link: track.external_urls.and_then(|urls| urls.spotify),
    }
}

pub fn playlist_record(playlist: SpotifyPlaylist) -> RawRecord {
    RawRecord {
        id: playlist.id,
        title: playlist.name,
        thumbnails: thumbnails(playlist.images),
        ..Default::default()
    }
}
