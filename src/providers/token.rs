use crate::client::CatalogError;
use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use std::sync::Mutex;

/// Refresh this long before the provider's stated expiry
const EXPIRY_MARGIN_SECS: i64 = 60;
const MAX_LIFETIME_SECS: u64 = 86_400;

/// Token endpoint response
#[derive(Debug, Clone, Deserialize)]
pub struct AccessToken {
    pub access_token: String,
    pub expires_in: u64,
}

#[derive(Debug, Clone)]
struct CachedToken {
    access_token: String,
    expires_at: DateTime<Utc>,
}

/// Process-local bearer token cache.
///
/// The lock is held while refreshing, so concurrent callers wait for a single
/// refresh instead of each requesting a new token.
#[derive(Debug, Default)]
pub struct TokenCache {
    slot: Mutex<Option<CachedToken>>,
}

impl TokenCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached token if still valid at `now`, otherwise call `refresh` and cache its result
    pub fn get_or_refresh<F>(&self, now: DateTime<Utc>, refresh: F) -> Result<String, CatalogError>
    where
        F: FnOnce() -> Result<AccessToken, CatalogError>,
    {
        let mut slot = self
            .slot
            .lock()
            .map_err(|_| CatalogError::Auth("token cache lock poisoned".to_string()))?;

        if let Some(cached) = slot.as_ref() {
            if now < cached.expires_at {
                return Ok(cached.access_token.clone());
            }
        }

        let token = refresh()?;
        let lifetime = token.expires_in.min(MAX_LIFETIME_SECS) as i64 - EXPIRY_MARGIN_SECS;
        let expires_at = now + Duration::seconds(lifetime.max(0));
        tracing::debug!(%expires_at, "access token refreshed");

        *slot = Some(CachedToken {
            access_token: token.access_token.clone(),
            expires_at,
        });
        Ok(token.access_token)
    }

    /// Drop the cached token, e.g. after the provider rejected it
    pub fn invalidate(&self) {
        if let Ok(mut slot) = self.slot.lock() {
            *slot = None;
        }
    }
}
