use anyhow::{Context, Result};
use clap::Parser;
use postrec::services::interactions::{
    InMemoryInteractionRepository, InteractionRepository, PostgresInteractionRepository,
};
use postrec::utils::validation::validate_recommendation_request;
use postrec::{init_tracing, AppState, Config, Interaction, RecommendationRequest};
use std::sync::Arc;
use tracing::info;

/// Runs one training pass and prints the resulting summary. Optionally
/// prints recommendations for a user from the freshly trained model.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(short, long, default_value = "config/default.toml")]
    config: String,

    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Read interactions from a JSON array file instead of postgres.
    #[arg(long)]
    interactions_file: Option<String>,

    /// Print recommendations for this user after training.
    #[arg(long)]
    user_id: Option<String>,

    #[arg(long, default_value_t = 10)]
    limit: usize,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize tracing with specified log level
    std::env::set_var("RUST_LOG", &args.log_level);
    init_tracing();

    info!("Starting postrec trainer");

    // Load configuration
    let config = if std::path::Path::new(&args.config).exists() {
        Config::from_file(&args.config)?
    } else {
        info!("Config file not found, using default configuration");
        Config::default()
    };
    config.validate()?;

    // Pick the interaction source
    let repository: Arc<dyn InteractionRepository> = match &args.interactions_file {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read interactions file {}", path))?;
            let interactions: Vec<Interaction> = serde_json::from_str(&raw)
                .with_context(|| format!("failed to parse interactions file {}", path))?;
            info!("Loaded {} interactions from {}", interactions.len(), path);
            Arc::new(InMemoryInteractionRepository::with_interactions(interactions))
        }
        None => Arc::new(PostgresInteractionRepository::connect(&config.postgres).await?),
    };

    // Run one training pass
    let state = AppState::with_repository(config, repository);
    let summary = state.recommendation_service.train().await?;
    println!("{}", serde_json::to_string_pretty(&summary)?);

    if let Some(user_id) = args.user_id {
        let request = RecommendationRequest::new(user_id, args.limit);
        validate_recommendation_request(&request, state.config.recommendation.max_limit)?;
        let response = state
            .recommendation_service
            .generate_recommendations(&request)
            .await?;
        println!("{}", serde_json::to_string_pretty(&response)?);
    }

    Ok(())
}
