//! Anonymous YouTube Music client over the InnerTube web API.
//!
//! Responses are deeply nested renderer trees. Parsing walks them for
//! `musicResponsiveListItemRenderer` rows and reads the handful of fields we need.

use crate::client::{CatalogClient, CatalogError, Charts, SearchKind};
use crate::config::Config;
use crate::models::{RawAlbum, RawArtist, RawRecord, Thumbnail};
use serde_json::{Value, json};
use tracing::debug;
use ureq::Agent;
use urlencoding::encode;

const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64; rv:128.0) Gecko/20100101 Firefox/128.0";
const CLIENT_NAME: &str = "WEB_REMIX";

/// Search filter params understood by the web client
const SONGS_PARAMS: &str = "EgWKAQIIAWoMEA4QChADEAQQCRAF";
const PLAYLISTS_PARAMS: &str = "Eg-KAQwIABAAGAAgACgBMABqChAEEAMQCRAFEAo%3D";

const CHARTS_BROWSE_ID: &str = "FEmusic_charts";
const LIST_ITEM: &str = "musicResponsiveListItemRenderer";
/// Upper bound on continuation requests per call
const MAX_CONTINUATIONS: usize = 20;

/// Token for the next page of a shelf
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Continuation {
    /// `nextContinuationData`: repeat the request with the token as url parameters
    Legacy(String),
    /// `continuationItemRenderer`: send the token as the request body
    Command(String),
}

impl Continuation {
    /// Body and extra url parameters for the follow-up request
    fn request(&self, body: &Value) -> (Value, String) {
        match self {
            Continuation::Legacy(token) => {
                let token = encode(token);
                (body.clone(), format!("&ctoken={token}&continuation={token}&type=next"))
            }
            Continuation::Command(token) => (json!({ "continuation": token }), String::new()),
        }
    }
}

pub struct YtMusicClient {
    agent: Agent,
    base_url: String,
    language: String,
}

impl YtMusicClient {
    pub fn new(config: &Config) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(config.timeout)
            .user_agent(USER_AGENT)
            .build();

        YtMusicClient {
            agent,
            base_url: config.ytmusic_base_url.trim_end_matches('/').to_string(),
            language: config.language.clone(),
        }
    }

    /// Base url for play links
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn context(&self) -> Value {
        // The web client identifies itself with a date-stamped version
        let client_version = format!("1.{}.01.00", chrono::Utc::now().format("%Y%m%d"));
        json!({
            "client": {
                "clientName": CLIENT_NAME,
                "clientVersion": client_version,
                "hl": self.language,
            },
            "user": {},
        })
    }

    fn post(&self, endpoint: &str, mut body: Value, extra_params: &str) -> Result<Value, CatalogError> {
        body["context"] = self.context();
        let url = format!("{}/youtubei/v1/{}?alt=json{}", self.base_url, endpoint, extra_params);
        debug!(%url, "innertube request");

        let response = self
            .agent
            .post(&url)
            .set("Origin", &self.base_url)
            .set("Referer", &format!("{}/", self.base_url))
            .send_json(body)?;

        Ok(response.into_json::<Value>()?)
    }

    /// Post `body`, then follow continuation tokens until `limit` records are parsed
    fn post_paged<P>(&self, endpoint: &str, body: Value, limit: usize, parse: P) -> Result<Vec<RawRecord>, CatalogError>
    where
        P: Fn(&Value) -> (Vec<RawRecord>, Option<Continuation>),
    {
        collect_pages(limit, parse, |token| match token {
            None => self.post(endpoint, body.clone(), ""),
            Some(token) => {
                let (page_body, params) = token.request(&body);
                self.post(endpoint, page_body, &params)
            }
        })
    }
}

/// Fetch the first page, then keep following its continuation while short of `limit`
fn collect_pages<P, F>(limit: usize, parse: P, mut fetch: F) -> Result<Vec<RawRecord>, CatalogError>
where
    P: Fn(&Value) -> (Vec<RawRecord>, Option<Continuation>),
    F: FnMut(Option<&Continuation>) -> Result<Value, CatalogError>,
{
    let (mut records, mut next) = parse(&fetch(None)?);
    let mut requests = 0;
    while records.len() < limit && requests < MAX_CONTINUATIONS {
        let Some(token) = next.take() else { break };
        requests += 1;
        let (more, following) = parse(&fetch(Some(&token))?);
        debug!(page = requests, rows = more.len(), "continuation page");
        if more.is_empty() {
            break;
        }
        records.extend(more);
        next = following;
    }
    records.truncate(limit);
    Ok(records)
}

impl CatalogClient for YtMusicClient {
    fn search(&self, query: &str, kind: SearchKind, limit: usize) -> Result<Vec<RawRecord>, CatalogError> {
        let params = match kind {
            SearchKind::Song => SONGS_PARAMS,
            SearchKind::Playlist => PLAYLISTS_PARAMS,
        };
        let body = json!({ "query": query, "params": params });
        self.post_paged("search", body, limit, |response| {
            (parse_search(response, kind), continuation(response))
        })
    }

    fn playlist_tracks(&self, playlist_id: &str, limit: usize) -> Result<Vec<RawRecord>, CatalogError> {
        let browse_id = if playlist_id.starts_with("VL") {
            playlist_id.to_string()
        } else {
            format!("VL{playlist_id}")
        };
        self.post_paged("browse", json!({ "browseId": browse_id }), limit, |response| {
            (parse_playlist(response), continuation(playlist_root(response)))
        })
    }

    fn chart(&self, region: &str) -> Result<Charts, CatalogError> {
        let response = self.post(
            "browse",
            json!({
                "browseId": CHARTS_BROWSE_ID,
                "formData": { "selectedValues": [region] },
            }),
            "",
        )?;
        Ok(parse_charts(&response))
    }
}

/// Rows of a search response
pub fn parse_search(response: &Value, kind: SearchKind) -> Vec<RawRecord> {
    let mut rows = Vec::new();
    find_renderers(response, LIST_ITEM, &mut rows);
    rows.into_iter()
        .map(|row| match kind {
            SearchKind::Song => parse_song_row(row),
            SearchKind::Playlist => parse_playlist_row(row),
        })
        .collect()
}

/// Tracks of a playlist browse response or one of its continuation pages
pub fn parse_playlist(response: &Value) -> Vec<RawRecord> {
    let mut rows = Vec::new();
    find_renderers(playlist_root(response), LIST_ITEM, &mut rows);
    rows.into_iter().map(parse_song_row).collect()
}

/// The playlist shelf, which keeps suggestion shelves out; continuation pages have none
fn playlist_root(response: &Value) -> &Value {
    let mut shelves = Vec::new();
    find_renderers(response, "musicPlaylistShelfRenderer", &mut shelves);
    shelves.first().copied().unwrap_or(response)
}

/// Next-page token of a shelf, in either of the two layouts the web client receives
pub fn continuation(root: &Value) -> Option<Continuation> {
    let mut legacy = Vec::new();
    find_renderers(root, "nextContinuationData", &mut legacy);
    if let Some(token) = legacy
        .iter()
        .find_map(|data| data.get("continuation").and_then(Value::as_str))
    {
        return Some(Continuation::Legacy(token.to_string()));
    }

    let mut items = Vec::new();
    find_renderers(root, "continuationItemRenderer", &mut items);
    items
        .iter()
        .find_map(|item| {
            item.pointer("/continuationEndpoint/continuationCommand/token")
                .and_then(Value::as_str)
        })
        .map(|token| Continuation::Command(token.to_string()))
}

/// Chart carousels keyed by normalized title ("Top songs" becomes "songs")
pub fn parse_charts(response: &Value) -> Charts {
    let mut carousels = Vec::new();
    find_renderers(response, "musicCarouselShelfRenderer", &mut carousels);

    let mut charts = Charts::new();
    for carousel in carousels {
        let Some(title) = carousel
            .pointer("/header/musicCarouselShelfBasicHeaderRenderer/title/runs/0/text")
            .and_then(Value::as_str)
        else {
            continue;
        };

        let mut rows = Vec::new();
        find_renderers(carousel, LIST_ITEM, &mut rows);
        if rows.is_empty() {
            continue;
        }

        charts
            .entry(chart_category(title))
            .or_default()
            .extend(rows.into_iter().map(parse_song_row));
    }
    charts
}

fn chart_category(title: &str) -> String {
    let lower = title.trim().to_lowercase();
    lower.strip_prefix("top ").unwrap_or(&lower).trim().to_string()
}

/// Collect every object stored under `key`, in document order, without descending into matches
fn find_renderers<'a>(value: &'a Value, key: &str, out: &mut Vec<&'a Value>) {
    match value {
        Value::Object(map) => {
            for (name, child) in map {
                if name == key {
                    out.push(child);
                } else {
                    find_renderers(child, key, out);
                }
            }
        }
        Value::Array(items) => {
            for item in items {
                find_renderers(item, key, out);
            }
        }
        _ => {}
    }
}

fn runs(row: &Value, column: usize) -> &[Value] {
    row.pointer(&format!(
        "/flexColumns/{column}/musicResponsiveListItemFlexColumnRenderer/text/runs"
    ))
    .and_then(Value::as_array)
    .map(Vec::as_slice)
    .unwrap_or(&[])
}

fn run_text(run: &Value) -> Option<&str> {
    run.get("text").and_then(Value::as_str)
}

fn run_browse_id(run: &Value) -> Option<&str> {
    run.pointer("/navigationEndpoint/browseEndpoint/browseId")
        .and_then(Value::as_str)
}

fn is_duration(text: &str) -> bool {
    let parts: Vec<&str> = text.trim().split(':').collect();
    parts.len() >= 2
        && parts
            .iter()
            .all(|p| !p.is_empty() && p.chars().all(|c| c.is_ascii_digit()))
}

fn thumbnails(row: &Value) -> Vec<Thumbnail> {
    row.pointer("/thumbnail/musicThumbnailRenderer/thumbnail/thumbnails")
        .and_then(|t| serde_json::from_value::<Vec<Thumbnail>>(t.clone()).ok())
        .unwrap_or_default()
}

fn video_id(row: &Value) -> Option<String> {
    [
        "/playlistItemData/videoId",
        "/overlay/musicItemThumbnailOverlayRenderer/content/musicPlayButtonRenderer/playNavigationEndpoint/watchEndpoint/videoId",
        "/flexColumns/0/musicResponsiveListItemFlexColumnRenderer/text/runs/0/navigationEndpoint/watchEndpoint/videoId",
    ]
    .iter()
    .find_map(|path| row.pointer(path).and_then(Value::as_str))
    .map(str::to_string)
}

fn parse_song_row(row: &Value) -> RawRecord {
    let title = runs(row, 0).first().and_then(run_text).map(str::to_string);

    let mut artists = Vec::new();
    let mut album = None;
    let mut duration = None;
    let mut first_plain_text = None;

    let flex_count = row
        .get("flexColumns")
        .and_then(Value::as_array)
        .map_or(0, Vec::len);
    for column in 1..flex_count {
        for run in runs(row, column) {
            let Some(text) = run_text(run) else { continue };
            match run_browse_id(run) {
                Some(id) if id.starts_with("UC") => artists.push(RawArtist { name: text.to_string() }),
                Some(id) if id.starts_with("MPRE") => album = Some(RawAlbum { name: text.to_string() }),
                Some(_) => {}
                None if is_duration(text) => duration = Some(text.trim().to_string()),
                None if column == 1 && first_plain_text.is_none() && text.trim() != "•" => {
                    first_plain_text = Some(text.trim().to_string());
                }
                None => {}
            }
        }
    }

    // Unlinked artist names (e.g. "Various Artists") only show up as plain text
    if artists.is_empty() {
        if let Some(text) = first_plain_text.filter(|t| !matches!(t.as_str(), "Song" | "Video" | "Episode")) {
            artists.push(RawArtist { name: text });
        }
    }

    if duration.is_none() {
        duration = row
            .pointer("/fixedColumns/0/musicResponsiveListItemFixedColumnRenderer/text/runs/0/text")
            .and_then(Value::as_str)
            .filter(|text| is_duration(text))
            .map(|text| text.trim().to_string());
    }

    RawRecord {
        id: video_id(row),
        title,
        artists,
        album,
        duration,
        thumbnails: thumbnails(row),
        link: None,
    }
}

fn parse_playlist_row(row: &Value) -> RawRecord {
    let id = row
        .pointer("/navigationEndpoint/browseEndpoint/browseId")
        .or_else(|| {
            row.pointer("/overlay/musicItemThumbnailOverlayRenderer/content/musicPlayButtonRenderer/playNavigationEndpoint/watchPlaylistEndpoint/playlistId")
        })
        .and_then(Value::as_str)
        .map(str::to_string);

    RawRecord {
        id,
        title: runs(row, 0).first().and_then(run_text).map(str::to_string),
        thumbnails: thumbnails(row),
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn song_row(video_id: &str, title: &str, artist: &str, album: Option<&str>, duration: &str) -> Value {
        let mut second = vec![
            json!({ "text": "Song" }),
            json!({ "text": " • " }),
            json!({
                "text": artist,
                "navigationEndpoint": { "browseEndpoint": { "browseId": "UCartist" } }
            }),
        ];
        if let Some(album) = album {
            second.push(json!({ "text": " • " }));
            second.push(json!({
                "text": album,
                "navigationEndpoint": { "browseEndpoint": { "browseId": "MPREb_album" } }
            }));
        }
        second.push(json!({ "text": " • " }));
        second.push(json!({ "text": duration }));

        json!({
            "musicResponsiveListItemRenderer": {
                "playlistItemData": { "videoId": video_id },
                "thumbnail": { "musicThumbnailRenderer": { "thumbnail": { "thumbnails": [
                    { "url": format!("https://i.ytimg.com/{video_id}/60"), "width": 60, "height": 60 },
                    { "url": format!("https://i.ytimg.com/{video_id}/120"), "width": 120, "height": 120 }
                ] } } },
                "flexColumns": [
                    { "musicResponsiveListItemFlexColumnRenderer": { "text": { "runs": [ { "text": title } ] } } },
                    { "musicResponsiveListItemFlexColumnRenderer": { "text": { "runs": second } } }
                ]
            }
        })
    }

    #[test]
    fn test_parse_song_search() {
        let response = json!({
            "contents": { "tabbedSearchResultsRenderer": { "tabs": [ { "tabRenderer": { "content": {
                "sectionListRenderer": { "contents": [ { "musicShelfRenderer": { "contents": [
                    song_row("vid1", "Dynamite", "BTS", Some("BE"), "3:19"),
                    song_row("vid2", "Butter", "BTS", None, "2:45")
                ] } } ] }
            } } } ] } }
        });

        let records = parse_search(&response, SearchKind::Song);
        assert_eq!(records.len(), 2);

        let first = &records[0];
        assert_eq!(first.id.as_deref(), Some("vid1"));
        assert_eq!(first.title.as_deref(), Some("Dynamite"));
        assert_eq!(first.artists, vec![RawArtist { name: "BTS".to_string() }]);
        assert_eq!(first.album.as_ref().map(|a| a.name.as_str()), Some("BE"));
        assert_eq!(first.duration.as_deref(), Some("3:19"));
        assert_eq!(first.thumbnails.len(), 2);
        assert!(records[1].album.is_none());
    }

    #[test]
    fn test_parse_playlist_search() {
        let response = json!({ "contents": [ { "musicResponsiveListItemRenderer": {
            "navigationEndpoint": { "browseEndpoint": { "browseId": "VLPLkpop" } },
            "flexColumns": [
                { "musicResponsiveListItemFlexColumnRenderer": { "text": { "runs": [ { "text": "K-pop Hits" } ] } } }
            ]
        } } ] });

        let records = parse_search(&response, SearchKind::Playlist);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id.as_deref(), Some("VLPLkpop"));
        assert_eq!(records[0].title.as_deref(), Some("K-pop Hits"));
    }

    #[test]
    fn test_parse_playlist_tracks_reads_fixed_duration_and_plain_artist() {
        let response = json!({
            "contents": { "twoColumnBrowseResultsRenderer": { "secondaryContents": { "sectionListRenderer": {
                "contents": [ { "musicPlaylistShelfRenderer": { "contents": [ { "musicResponsiveListItemRenderer": {
                    "playlistItemData": { "videoId": "vid9" },
                    "flexColumns": [
                        { "musicResponsiveListItemFlexColumnRenderer": { "text": { "runs": [ { "text": "Track" } ] } } },
                        { "musicResponsiveListItemFlexColumnRenderer": { "text": { "runs": [ { "text": "Various Artists" } ] } } }
                    ],
                    "fixedColumns": [
                        { "musicResponsiveListItemFixedColumnRenderer": { "text": { "runs": [ { "text": "4:05" } ] } } }
                    ]
                } } ] } } ]
            } } } },
            "suggestions": [ song_row("other", "Suggested", "Someone", None, "3:00") ]
        });

        let tracks = parse_playlist(&response);
        assert_eq!(tracks.len(), 1);
        assert_eq!(tracks[0].duration.as_deref(), Some("4:05"));
        assert_eq!(tracks[0].artists[0].name, "Various Artists");
    }

    #[test]
    fn test_parse_charts_groups_by_category() {
        let carousel = |title: &str, rows: Vec<Value>| {
            json!({ "musicCarouselShelfRenderer": {
                "header": { "musicCarouselShelfBasicHeaderRenderer": { "title": { "runs": [ { "text": title } ] } } },
                "contents": rows
            } })
        };
        let response = json!({ "contents": { "sectionListRenderer": { "contents": [
            carousel("Top songs", vec![song_row("s1", "One", "A", None, "3:00"), song_row("s2", "Two", "B", None, "3:10")]),
            carousel("Top music videos", vec![song_row("v1", "Clip", "C", None, "4:00")]),
            carousel("Top artists", vec![])
        ] } } });

        let charts = parse_charts(&response);
        assert_eq!(charts.len(), 2);
        assert_eq!(charts["songs"].len(), 2);
        assert_eq!(charts["music videos"][0].id.as_deref(), Some("v1"));
    }

    #[test]
    fn test_search_continuation_pages() {
        let first = json!({ "contents": { "sectionListRenderer": { "contents": [ { "musicShelfRenderer": {
            "contents": [ song_row("vid1", "One", "A", None, "3:00") ],
            "continuations": [ { "nextContinuationData": { "continuation": "CTOKEN1", "clickTrackingParams": "x" } } ]
        } } ] } } });
        assert_eq!(continuation(&first), Some(Continuation::Legacy("CTOKEN1".to_string())));

        let next = json!({ "continuationContents": { "musicShelfContinuation": {
            "contents": [ song_row("vid2", "Two", "B", None, "3:10"), song_row("vid3", "Three", "C", None, "2:50") ]
        } } });
        let records = parse_search(&next, SearchKind::Song);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id.as_deref(), Some("vid2"));
        assert_eq!(continuation(&next), None);
    }

    #[test]
    fn test_playlist_continuation_item() {
        let first = json!({
            "contents": { "twoColumnBrowseResultsRenderer": { "secondaryContents": { "sectionListRenderer": {
                "contents": [ { "musicPlaylistShelfRenderer": { "contents": [
                    song_row("vid1", "One", "A", None, "3:00"),
                    { "continuationItemRenderer": { "continuationEndpoint": {
                        "continuationCommand": { "token": "4qmFsgKL", "request": "CONTINUATION_REQUEST_TYPE_BROWSE" }
                    } } }
                ] } } ]
            } } } }
        });
        assert_eq!(parse_playlist(&first).len(), 1);
        assert_eq!(
            continuation(playlist_root(&first)),
            Some(Continuation::Command("4qmFsgKL".to_string()))
        );

        let next = json!({ "onResponseReceivedActions": [ { "appendContinuationItemsAction": {
            "continuationItems": [ song_row("vid2", "Two", "B", None, "3:10") ]
        } } ] });
        let tracks = parse_playlist(&next);
        assert_eq!(tracks.len(), 1);
        assert_eq!(tracks[0].id.as_deref(), Some("vid2"));
        assert_eq!(continuation(playlist_root(&next)), None);
    }

    #[test]
    fn test_continuation_requests() {
        let body = json!({ "query": "kpop", "params": SONGS_PARAMS });

        let (legacy_body, params) = Continuation::Legacy("a/b=".to_string()).request(&body);
        assert_eq!(legacy_body, body);
        assert_eq!(params, "&ctoken=a%2Fb%3D&continuation=a%2Fb%3D&type=next");

        let (command_body, params) = Continuation::Command("tok".to_string()).request(&body);
        assert_eq!(command_body, json!({ "continuation": "tok" }));
        assert!(params.is_empty());
    }

    #[test]
    fn test_collect_pages_follows_tokens_until_limit() {
        fn page(ids: &[&str], token: Option<&str>) -> Value {
            let mut contents: Vec<Value> = ids.iter().map(|id| song_row(id, id, "A", None, "3:00")).collect();
            if let Some(token) = token {
                contents.push(json!({ "continuationItemRenderer": { "continuationEndpoint": {
                    "continuationCommand": { "token": token }
                } } }));
            }
            json!({ "contents": contents })
        }

        let mut seen = Vec::new();
        let records = collect_pages(
            5,
            |response| (parse_search(response, SearchKind::Song), continuation(response)),
            |token| {
                seen.push(token.cloned());
                Ok(match token {
                    None => page(&["a", "b"], Some("p2")),
                    Some(Continuation::Command(t)) if t == "p2" => page(&["c", "d"], Some("p3")),
                    _ => page(&["e", "f"], Some("p4")),
                })
            },
        )
        .unwrap();

        assert_eq!(records.len(), 5);
        assert_eq!(records[4].id.as_deref(), Some("e"));
        assert_eq!(
            seen,
            vec![
                None,
                Some(Continuation::Command("p2".to_string())),
                Some(Continuation::Command("p3".to_string())),
            ]
        );
    }

    #[test]
    fn test_collect_pages_stops_without_token() {
        let mut calls = 0;
        let records = collect_pages(
            40,
            |response| (parse_search(response, SearchKind::Song), continuation(response)),
            |_| {
                calls += 1;
                Ok(json!({ "contents": [ song_row("only", "Only", "A", None, "3:00") ] }))
            },
        )
        .unwrap();
        assert_eq!(calls, 1);
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn test_renderers_follow_document_order() {
        let response: Value = serde_json::from_str(
            r#"{ "zeta": { "musicResponsiveListItemRenderer": { "playlistItemData": { "videoId": "first" } } },
                 "alpha": { "musicResponsiveListItemRenderer": { "playlistItemData": { "videoId": "second" } } } }"#,
        )
        .unwrap();
        let ids: Vec<_> = parse_search(&response, SearchKind::Song)
            .into_iter()
            .filter_map(|record| record.id)
            .collect();
        assert_eq!(ids, vec!["first", "second"]);
    }

    #[test]
    fn test_is_duration() {
        assert!(is_duration("3:19"));
        assert!(is_duration("1:02:03"));
        assert!(!is_duration("BTS"));
        assert!(!is_duration("1.2M plays"));
        assert!(!is_duration(":30"));
    }
}
