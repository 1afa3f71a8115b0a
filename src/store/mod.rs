use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::draft::DraftPickEvent;
use crate::players::{find_player, Player, PlayerKind};

const DRAFTED_PATH: &str = "draftedPlayerIds";
const UPDATED_AT_PATH: &str = "draftedPlayersUpdatedAt";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("request to {url} failed: {source}")]
    Http {
        url: String,
        source: reqwest::Error,
    },

    #[error("store returned {status} for {url}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("could not read response from {url}: {source}")]
    Decode {
        url: String,
        source: reqwest::Error,
    },

    #[error("response from {url} is not a player list: {source}")]
    Json {
        url: String,
        source: serde_json::Error,
    },

    #[error("invalid store URL `{url}`: {message}")]
    InvalidBaseUrl { url: String, message: String },
}

/// Draft status written for a player, keyed by the player's ID.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftedMark {
    #[serde(rename = "type")]
    pub kind: PlayerKind,
    pub round: u32,
    pub pick: u32,
    pub team: String,
    pub drafted_at: String,
    pub source: String,
}

impl DraftedMark {
    pub fn new(
        kind: PlayerKind,
        event: &DraftPickEvent,
        team_code: &str,
        drafted_at: DateTime<Utc>,
    ) -> Self {
        Self {
            kind,
            round: event.round,
            pick: event.pick,
            team: team_code.to_string(),
            drafted_at: format_timestamp(drafted_at),
            source: "slack".to_string(),
        }
    }
}

/// RFC 3339 with millisecond precision, e.g. `2025-03-01T17:04:05.123Z`.
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Remote document store holding the player pool and draft marks.
#[async_trait]
pub trait PlayerStore: Send + Sync {
    /// Fetch every player in a collection, in stored order. An empty store
    /// yields an empty list.
    async fn fetch_players(&self, kind: PlayerKind) -> Result<Vec<Player>, StoreError>;

    /// Overwrite the draft mark for `player_id`.
    async fn write_mark(&self, player_id: &str, mark: &DraftedMark) -> Result<(), StoreError>;

    /// Bump the top-level "draft marks changed" timestamp.
    async fn touch_updated_at(&self, at: &str) -> Result<(), StoreError>;
}

/// What happened to a parsed and team-resolved draft pick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DraftOutcome {
    /// No batter or pitcher carries this name.
    PlayerNotFound,
    /// A player matched but has no ID to key the mark on.
    MissingId,
    Recorded {
        player_id: String,
        mark: DraftedMark,
    },
}

/// Resolve the announced player and mark them drafted.
///
/// Fetches batters then pitchers, takes the first name match, writes the mark
/// and then the updated-at marker. A failed marker write is logged and does
/// not fail the pick: the per-player mark is the authoritative state.
pub async fn record_draft_pick(
    store: &dyn PlayerStore,
    event: &DraftPickEvent,
    team_code: &str,
    now: DateTime<Utc>,
) -> Result<DraftOutcome, StoreError> {
    let batters = store.fetch_players(PlayerKind::Batters).await?;
    let pitchers = store.fetch_players(PlayerKind::Pitchers).await?;
    debug!(
        batters = batters.len(),
        pitchers = pitchers.len(),
        "fetched player pool"
    );

    let Some(found) = find_player(&event.player_name, batters, pitchers) else {
        info!(player = %event.player_name, "no player matches draft pick");
        return Ok(DraftOutcome::PlayerNotFound);
    };

    if found.player.id.is_empty() {
        warn!(player = %found.player.name, kind = %found.kind, "matched player has no ID");
        return Ok(DraftOutcome::MissingId);
    }

    debug!(
        id = %found.player.id,
        stat_fields = found.player.extra.len(),
        "resolved player"
    );

    let mark = DraftedMark::new(found.kind, event, team_code, now);
    store.write_mark(&found.player.id, &mark).await?;
    info!(
        player = %found.player.name,
        id = %found.player.id,
        kind = %found.kind,
        team = %team_code,
        round = event.round,
        pick = event.pick,
        "marked player drafted"
    );

    if let Err(e) = store.touch_updated_at(&mark.drafted_at).await {
        warn!(error = %e, "failed to update drafted players timestamp");
    }

    Ok(DraftOutcome::Recorded {
        player_id: found.player.id,
        mark,
    })
}

/// `PlayerStore` backed by a REST document database addressed as
/// `<base>/<path>.json`.
#[derive(Clone)]
pub struct HttpPlayerStore {
    http: reqwest::Client,
    base_url: Url,
}

impl HttpPlayerStore {
    pub fn new(http: reqwest::Client, base_url: &str) -> Result<Self, StoreError> {
        let invalid = |message: String| StoreError::InvalidBaseUrl {
            url: base_url.to_string(),
            message,
        };

        let base_url = Url::parse(base_url).map_err(|e| invalid(e.to_string()))?;
        if base_url.cannot_be_a_base() {
            return Err(invalid("cannot hold a path".to_string()));
        }
        Ok(Self { http, base_url })
    }

    /// Append `segments` to the base path, percent-encoding each one so an
    /// ID can never escape its parent path, and add the `.json` suffix.
    fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Some((last, parents)) = segments.split_last() {
            // checked in `new`
            if let Ok(mut path) = url.path_segments_mut() {
                path.pop_if_empty()
                    .extend(parents)
                    .push(&format!("{last}.json"));
            }
        }
        url
    }

    async fn put_json<T: Serialize + ?Sized>(&self, url: Url, body: &T) -> Result<(), StoreError> {
        // reqwest's `.json()` sets `Content-Type: application/json`
        let response = self
            .http
            .put(url.clone())
            .json(body)
            .send()
            .await
            .map_err(|source| StoreError::Http {
                url: url.to_string(),
                source,
            })?;

        if !response.status().is_success() {
            return Err(StoreError::Status {
                url: url.to_string(),
                status: response.status(),
            });
        }
        Ok(())
    }
}

/// Decode a collection body. No content and `null` both mean an empty
/// collection; entries that aren't player documents (deleted slots come back
/// as `null`) are skipped.
fn decode_players(url: &str, body: &[u8]) -> Result<Vec<Player>, StoreError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Vec::new());
    }

    let entries: Option<Vec<Value>> =
        serde_json::from_slice(body).map_err(|source| StoreError::Json {
            url: url.to_string(),
            source,
        })?;

    let players = entries
        .unwrap_or_default()
        .into_iter()
        .enumerate()
        .filter_map(|(index, entry)| match serde_json::from_value::<Player>(entry) {
            Ok(player) => Some(player),
            Err(e) => {
                debug!(%url, index, error = %e, "skipping undecodable player entry");
                None
            }
        })
        .collect();
    Ok(players)
}

#[async_trait]
impl PlayerStore for HttpPlayerStore {
    async fn fetch_players(&self, kind: PlayerKind) -> Result<Vec<Player>, StoreError> {
        let url = self.url(&[kind.collection()]);
        let url_str = url.to_string();
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|source| StoreError::Http {
                url: url_str.clone(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(StoreError::Status {
                url: url_str,
                status,
            });
        }
        if status == reqwest::StatusCode::NO_CONTENT {
            return Ok(Vec::new());
        }

        let body = response.bytes().await.map_err(|source| StoreError::Decode {
            url: url_str.clone(),
            source,
        })?;
        decode_players(&url_str, &body)
    }

    async fn write_mark(&self, player_id: &str, mark: &DraftedMark) -> Result<(), StoreError> {
        let url = self.url(&[DRAFTED_PATH, player_id]);
        self.put_json(url, mark).await
    }

    async fn touch_updated_at(&self, at: &str) -> Result<(), StoreError> {
        let url = self.url(&[UPDATED_AT_PATH]);
        self.put_json(url, at).await
    }
}

#[cfg(test)]
pub mod memory {
    use super::*;
    use std::sync::Mutex;

    /// In-memory store for exercising the handler without a network.
    #[derive(Default)]
    pub struct MemoryStore {
        pub batters: Vec<Player>,
        pub pitchers: Vec<Player>,
        pub fail_fetch: bool,
        pub panic_fetch: bool,
        pub fail_mark: bool,
        pub fail_touch: bool,
        pub marks: Mutex<Vec<(String, DraftedMark)>>,
        pub touched: Mutex<Vec<String>>,
    }

    fn unavailable(url: &str) -> StoreError {
        StoreError::Status {
            url: url.to_string(),
            status: reqwest::StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    #[async_trait]
    impl PlayerStore for MemoryStore {
        async fn fetch_players(&self, kind: PlayerKind) -> Result<Vec<Player>, StoreError> {
            if self.panic_fetch {
                panic!("{} collection is corrupt", kind.collection());
            }
            if self.fail_fetch {
                return Err(unavailable(kind.collection()));
            }
            Ok(match kind {
                PlayerKind::Batters => self.batters.clone(),
                PlayerKind::Pitchers => self.pitchers.clone(),
            })
        }

        async fn write_mark(&self, player_id: &str, mark: &DraftedMark) -> Result<(), StoreError> {
            if self.fail_mark {
                return Err(unavailable(DRAFTED_PATH));
            }
            self.marks
                .lock()
                .unwrap()
                .push((player_id.to_string(), mark.clone()));
            Ok(())
        }

        async fn touch_updated_at(&self, at: &str) -> Result<(), StoreError> {
            if self.fail_touch {
                return Err(unavailable(UPDATED_AT_PATH));
            }
            self.touched.lock().unwrap().push(at.to_string());
            Ok(())
        }
    }
}
