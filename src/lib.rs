pub mod algorithms;
pub mod config;
pub mod error;
pub mod models;
pub mod services;
pub mod utils;

pub use config::Config;
pub use error::{RecommendationError, ValidationError};
pub use models::*;

use anyhow::Result;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub interaction_repository: Arc<dyn services::interactions::InteractionRepository>,
    pub recommendation_service: Arc<services::recommendation::RecommendationService>,
}

impl AppState {
    pub async fn new(config: Config) -> Result<Self> {
        config.validate()?;

        let repository = Arc::new(
            services::interactions::PostgresInteractionRepository::connect(&config.postgres).await?,
        );

        Ok(Self::with_repository(config, repository))
    }

    pub fn with_repository(
        config: Config,
        interaction_repository: Arc<dyn services::interactions::InteractionRepository>,
    ) -> Self {
        let config = Arc::new(config);

        let recommendation_service = Arc::new(
            services::recommendation::RecommendationService::new(
                interaction_repository.clone(),
                config.clone(),
            )
        );

        Self {
            config,
            interaction_repository,
            recommendation_service,
        }
    }
}

pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();
}
