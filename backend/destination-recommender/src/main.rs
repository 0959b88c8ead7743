use anyhow::Context;
use destination_recommender::{
    utils::round_score, Config, FileCatalog, RecommendationEngine, UserPreferences,
};
use std::fs::File;
use std::io::BufReader;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn main() -> anyhow::Result<()> {
    // Load config
    let config = Config::from_env().context("Failed to load config")?;

    // Initialize tracing
    let registry = tracing_subscriber::registry().with(EnvFilter::from_default_env());
    if config.service.log_format.eq_ignore_ascii_case("json") {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer()).init();
    }

    info!(
        "Starting {} with catalog {}",
        config.service.service_name, config.service.catalog_path
    );

    let catalog = Arc::new(FileCatalog::new(&config.service.catalog_path));
    let engine = RecommendationEngine::new(catalog, config.engine.clone())
        .context("Invalid engine configuration")?;

    let summary = engine
        .train()
        .with_context(|| format!("Training on {} failed", config.service.catalog_path))?;
    info!(
        destinations = summary.destinations,
        vocabulary = summary.vocabulary_size,
        "Models ready"
    );

    let preferences = load_preferences(&config.service.preferences_path)?;
    let top_n = config.service.top_n.unwrap_or(config.engine.default_top_n);

    let mut recommendations = engine
        .recommend(&preferences, top_n)
        .context("Error generating recommendations")?;
    if recommendations.is_empty() {
        warn!("No destinations matched the preference profile");
    }
    for recommendation in &mut recommendations {
        recommendation.score = round_score(recommendation.score, 4);
    }

    println!("{}", serde_json::to_string_pretty(&recommendations)?);
    Ok(())
}

fn load_preferences(path: &str) -> anyhow::Result<UserPreferences> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) => {
            warn!(error = %e, path, "Preferences file unavailable, using defaults");
            return Ok(UserPreferences::default());
        }
    };
    serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("Invalid preferences file {}", path))
}
