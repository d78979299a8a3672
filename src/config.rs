use anyhow::{Context, Result, anyhow};
use clap::ValueEnum;
use std::time::Duration;

const DEFAULT_YTMUSIC_BASE_URL: &str = "https://music.youtube.com";
const DEFAULT_LANGUAGE: &str = "en";
const DEFAULT_TIMEOUT_SECS: u64 = 15;

/// Which catalog backs the recommendations
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Provider {
    #[value(name = "ytmusic")]
    YtMusic,
    Spotify,
}

#[derive(Debug, Clone)]
pub struct SpotifyCredentials {
    pub client_id: String,
    pub client_secret: String,
}

/// Configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub provider: Provider,
    pub ytmusic_base_url: String,
    pub language: String,
    pub spotify: Option<SpotifyCredentials>,
    pub spotify_recommendations: bool,
    pub timeout: Duration,
}

/// Load configuration from `.env` and environment.
///
/// `provider` overrides `CATALOG_PROVIDER` when given.
pub fn load_config(provider: Option<Provider>) -> Result<Config> {
    // Load `.env` file if present
    dotenv::dotenv().ok();
    Config::from_lookup(|key| std::env::var(key).ok(), provider)
}

impl Config {
    /// Build the configuration from any key lookup; fails on missing credentials
    /// for the selected provider before anything touches the network
    pub fn from_lookup<F>(lookup: F, provider: Option<Provider>) -> Result<Config>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let provider = match provider {
            Some(provider) => provider,
            None => match read("CATALOG_PROVIDER") {
                Some(name) => Provider::from_str(&name, true)
                    .map_err(|_| anyhow!("Unknown CATALOG_PROVIDER '{name}' (expected ytmusic or spotify)"))?,
                None => Provider::YtMusic,
            },
        };

        let spotify = match (read("SPOTIFY_CLIENT_ID"), read("SPOTIFY_CLIENT_SECRET")) {
            (Some(client_id), Some(client_secret)) => Some(SpotifyCredentials { client_id, client_secret }),
            _ => None,
        };
        if provider == Provider::Spotify && spotify.is_none() {
            return Err(anyhow!(
                "SPOTIFY_CLIENT_ID and SPOTIFY_CLIENT_SECRET must be set to use the Spotify provider"
            ));
        }

        let spotify_recommendations = match read("SPOTIFY_RECOMMENDATIONS") {
            Some(flag) => parse_bool(&flag).context("Invalid SPOTIFY_RECOMMENDATIONS")?,
            None => true,
        };

        let timeout_secs = match read("HTTP_TIMEOUT_SECS") {
            Some(secs) => secs
                .parse::<u64>()
                .with_context(|| format!("Invalid HTTP_TIMEOUT_SECS '{secs}'"))?,
            None => DEFAULT_TIMEOUT_SECS,
        };
        if timeout_secs == 0 {
            return Err(anyhow!("HTTP_TIMEOUT_SECS must be greater than zero"));
        }

        Ok(Config {
            provider,
            ytmusic_base_url: read("YTMUSIC_BASE_URL").unwrap_or_else(|| DEFAULT_YTMUSIC_BASE_URL.to_string()),
            language: read("YTMUSIC_LANGUAGE").unwrap_or_else(|| DEFAULT_LANGUAGE.to_string()),
            spotify,
            spotify_recommendations,
            timeout: Duration::from_secs(timeout_secs),
        })
    }
}

fn parse_bool(value: &str) -> Result<bool> {
    match value.to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(anyhow!("expected true or false, got '{other}'")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup(&[]), None).unwrap();
        assert_eq!(config.provider, Provider::YtMusic);
        assert_eq!(config.ytmusic_base_url, "https://music.youtube.com");
        assert_eq!(config.language, "en");
        assert_eq!(config.timeout, Duration::from_secs(15));
        assert!(config.spotify.is_none());
        assert!(config.spotify_recommendations);
    }

    #[test]
    fn test_spotify_requires_credentials() {
        let err = Config::from_lookup(lookup(&[("SPOTIFY_CLIENT_ID", "id")]), Some(Provider::Spotify)).unwrap_err();
        assert!(err.to_string().contains("SPOTIFY_CLIENT_SECRET"));

        let config = Config::from_lookup(
            lookup(&[
                ("CATALOG_PROVIDER", "spotify"),
                ("SPOTIFY_CLIENT_ID", "id"),
                ("SPOTIFY_CLIENT_SECRET", "secret"),
                ("SPOTIFY_RECOMMENDATIONS", "off"),
            ]),
            None,
        )
        .unwrap();
        assert_eq!(config.provider, Provider::Spotify);
        assert!(!config.spotify_recommendations);
    }

    #[test]
    fn test_cli_provider_overrides_environment() {
        let config = Config::from_lookup(lookup(&[("CATALOG_PROVIDER", "spotify")]), Some(Provider::YtMusic)).unwrap();
        assert_eq!(config.provider, Provider::YtMusic);
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        assert!(Config::from_lookup(lookup(&[("HTTP_TIMEOUT_SECS", "soon")]), None).is_err());
        assert!(Config::from_lookup(lookup(&[("HTTP_TIMEOUT_SECS", "0")]), None).is_err());
        assert!(Config::from_lookup(lookup(&[("CATALOG_PROVIDER", "tidal")]), None).is_err());
    }
}
