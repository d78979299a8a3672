pub mod spotify;
pub mod token;
pub mod ytmusic;

use crate::client::CatalogClient;
use crate::config::{Config, Provider};
use crate::playlist::RecommendSettings;
use anyhow::Result;

pub use spotify::SpotifyClient;
pub use ytmusic::YtMusicClient;

/// Build the configured catalog client together with matching waterfall settings
pub fn connect(config: &Config) -> Result<(Box<dyn CatalogClient>, RecommendSettings)> {
    let mut settings = RecommendSettings::default();
    let client: Box<dyn CatalogClient> = match config.provider {
        Provider::YtMusic => {
            let client = YtMusicClient::new(config);
            settings.watch_base = client.base_url().to_string();
            Box::new(client)
        }
        Provider::Spotify => {
            settings.seeded_recommendations = config.spotify_recommendations;
            Box::new(SpotifyClient::new(config)?)
        }
    };
    Ok((client, settings))
}
