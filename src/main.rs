use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use mood_playlist::config::{Config, Provider, load_config};
use mood_playlist::playlist::{Genre, Mood, Recommendation, RecommendationRequest, Recommender, Situation};
use mood_playlist::providers;

#[derive(Parser)]
#[command(name = "mood-playlist")]
#[command(about = "Pick a mood, get a playlist")]
#[command(version)]
struct Args {
    /// How are you feeling today?
    #[arg(short = 'm', long = "mood", value_enum)]
    mood: Mood,

    /// What are you doing right now?
    #[arg(short = 's', long = "situation", value_enum, default_value = "drive")]
    situation: Situation,

    /// Preferred genre (optional)
    #[arg(short = 'g', long = "genre", value_enum, default_value = "none")]
    genre: Genre,

    /// How many songs to pick
    #[arg(short = 'n', long = "count", default_value_t = 10, value_parser = clap::value_parser!(u32).range(5..=20))]
    count: u32,

    /// Catalog to search (defaults to CATALOG_PROVIDER, then ytmusic)
    #[arg(short = 'p', long = "provider", value_enum)]
    provider: Option<Provider>,

    /// Print the result as JSON
    #[arg(long = "json")]
    json: bool,

    /// Also list the search queries that were issued
    #[arg(long = "show-queries")]
    show_queries: bool,

    /// Quiet mode - only warnings and errors are logged
    #[arg(short = 'q', long = "quiet")]
    quiet: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let default_level = if args.quiet { "warn" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("mood_playlist={default_level}")));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    // Missing credentials stop us before any request goes out
    let config = configured(load_config(args.provider))?;

    let (client, settings) = providers::connect(&config)?;
    let recommender = Recommender::new(client.as_ref(), settings);

    let request = RecommendationRequest {
        mood: args.mood,
        situation: args.situation,
        genre: args.genre,
        target_count: args.count as usize,
    };
    let recommendation = recommender.recommend(&request);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&recommendation)?);
        return Ok(());
    }

    print_recommendation(&args, &recommendation);
    Ok(())
}

/// Label a configuration failure; `main` reports it once on exit
fn configured(config: Result<Config>) -> Result<Config> {
    config.context("Configuration error")
}

fn print_recommendation(args: &Args, recommendation: &Recommendation) {
    println!("\n=== TODAY'S PLAYLIST ===");
    println!("{}", args.mood.profile().message);
    println!(
        "{:?} · {} · {}",
        args.mood,
        args.situation.label(),
        args.genre.profile().label
    );

    if recommendation.is_empty() {
        println!("\nNo songs found this time. Try a different combination of options.");
    } else {
        for (i, song) in recommendation.songs.iter().enumerate() {
            println!("\n{}. {}", i + 1, song.title);
            println!("   Artist: {}", song.artists);
            if let Some(album) = &song.album {
                println!("   Album: {album}");
            }
            if let Some(duration) = &song.duration {
                println!("   Length: {duration}");
            }
            if let Some(thumbnail) = &song.thumbnail {
                println!("   Cover: {thumbnail}");
            }
            println!("   ▶ {}", song.url);
        }
    }

    if !recommendation.failures.is_empty() {
        println!(
            "\n⚠ {} source(s) failed and were skipped",
            recommendation.failures.len()
        );
    }

    if args.show_queries {
        println!("\nQueries used:");
        for query in &recommendation.queries {
            println!("  - {query}");
        }
        for failure in &recommendation.failures {
            println!("  ✗ {:?} {}: {}", failure.stage, failure.target, failure.message);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configuration_error_is_reported_once() {
        let err = configured(Config::from_lookup(|_| None, Some(Provider::Spotify))).unwrap_err();
        let report = format!("{err:?}");

        assert_eq!(err.to_string(), "Configuration error");
        assert_eq!(report.matches("Configuration error").count(), 1);
        assert_eq!(report.matches("SPOTIFY_CLIENT_ID").count(), 1);
    }
}
