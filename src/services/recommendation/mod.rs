use crate::algorithms::{CollaborativeFilter, Recommender};
use crate::config::Config;
use crate::models::*;
use crate::services::interactions::InteractionRepository;
use anyhow::{Context, Result};
use dashmap::DashMap;
use parking_lot::RwLock;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;
use tracing::{error, info};

#[derive(Debug, Clone, Serialize)]
pub struct ServiceStats {
    pub model_trained: bool,
    pub counters: HashMap<String, u64>,
    pub last_training: Option<TrainingSummary>,
}

/// Entry point for the serving layer: pulls interaction snapshots from the
/// repository, keeps the recommender trained and answers requests.
pub struct RecommendationService {
    repository: Arc<dyn InteractionRepository>,
    recommender: Arc<dyn Recommender>,
    config: Arc<Config>,
    training_lock: Mutex<()>,
    last_training: RwLock<Option<TrainingSummary>>,
    serving_stats: Arc<DashMap<String, u64>>,
}

impl RecommendationService {
    pub fn new(repository: Arc<dyn InteractionRepository>, config: Arc<Config>) -> Self {
        let recommender = Arc::new(CollaborativeFilter::new(
            config.recommendation.n_neighbors,
            config.weights.clone(),
        ));

        Self::with_recommender(repository, recommender, config)
    }

    pub fn with_recommender(
        repository: Arc<dyn InteractionRepository>,
        recommender: Arc<dyn Recommender>,
        config: Arc<Config>,
    ) -> Self {
        Self {
            repository,
            recommender,
            config,
            training_lock: Mutex::new(()),
            last_training: RwLock::new(None),
            serving_stats: Arc::new(DashMap::new()),
        }
    }

    pub fn is_trained(&self) -> bool {
        self.recommender.is_trained()
    }

    /// Rebuilds the model from a fresh interaction pull. On a fetch failure
    /// the previous model keeps serving.
    pub async fn train(&self) -> Result<TrainingSummary> {
        let _guard = self.training_lock.lock().await;
        self.train_locked().await
    }

    async fn train_locked(&self) -> Result<TrainingSummary> {
        // Pull a fresh interaction snapshot
        let interactions = self
            .repository
            .get_all_interactions(self.config.recommendation.training_fetch_limit)
            .await
            .context("failed to fetch interactions for training")?;

        info!("Training recommender on {} interactions", interactions.len());

        // Train off the async runtime
        let recommender = self.recommender.clone();
        let summary = tokio::task::spawn_blocking(move || recommender.train(&interactions))
            .await
            .context("training task failed")?;

        self.increment_stat("training_runs");

        // An empty pass leaves the serving snapshot in place, so keep its summary
        if summary.trained {
            *self.last_training.write() = Some(summary.clone());
        } else {
            self.increment_stat("empty_training_runs");
        }
        Ok(summary)
    }

    async fn ensure_trained(&self) -> Result<()> {
        if self.recommender.is_trained() {
            return Ok(());
        }

        let _guard = self.training_lock.lock().await;
        if !self.recommender.is_trained() {
            self.train_locked().await?;
        }
        Ok(())
    }

    /// Expects a request already validated by the transport layer.
    pub async fn generate_recommendations(
        &self,
        request: &RecommendationRequest,
    ) -> Result<RecommendationResponse> {
        self.increment_stat("total_requests");
        let start_time = Instant::now();

        // Train lazily on the first request
        if let Err(e) = self.ensure_trained().await {
            self.increment_stat("failed_requests");
            return Err(e);
        }

        let recommendations = match self.recommender.recommend(
            &request.user_id,
            request.limit,
            &request.exclude_item_ids,
        ) {
            Ok(recommendations) => recommendations,
            Err(e) => {
                error!("Recommender produced an invalid result for user {}: {}", request.user_id, e);
                self.increment_stat("failed_requests");
                return Err(e.into());
            }
        };

        // Update serving stats
        if recommendations.is_empty() {
            self.increment_stat("empty_responses");
        }

        let recommendations: Vec<RecommendationItem> =
            recommendations.into_iter().map(RecommendationItem::from).collect();

        let latency = start_time.elapsed().as_millis() as u64;
        self.update_latency_stat(latency);
        self.increment_stat("successful_requests");

        info!(
            "Served {} recommendations for user {} in {}ms",
            recommendations.len(),
            request.user_id,
            latency
        );

        Ok(RecommendationResponse {
            user_id: request.user_id.clone(),
            count: recommendations.len(),
            recommendations,
            model_version: self.config.recommendation.model_version.clone(),
        })
    }

    /// Stores a new interaction. It only affects recommendations after the
    /// next training pass.
    pub async fn record_interaction(&self, interaction: &Interaction) -> Result<()> {
        self.repository.save_interaction(interaction).await?;
        self.increment_stat("recorded_interactions");
        Ok(())
    }

    pub fn stats(&self) -> ServiceStats {
        ServiceStats {
            model_trained: self.recommender.is_trained(),
            counters: self
                .serving_stats
                .iter()
                .map(|entry| (entry.key().clone(), *entry.value()))
                .collect(),
            last_training: self.last_training.read().clone(),
        }
    }

    fn increment_stat(&self, key: &str) {
        *self.serving_stats.entry(key.to_string()).or_insert(0) += 1;
    }

    fn update_latency_stat(&self, latency_ms: u64) {
        let current_max = self.serving_stats.get("max_latency_ms").map(|v| *v).unwrap_or(0);
        if latency_ms > current_max {
            self.serving_stats.insert("max_latency_ms".to_string(), latency_ms);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::interactions::InMemoryInteractionRepository;

    /// Source whose contents can be swapped between training passes.
    #[derive(Default)]
    struct SwappableRepository {
        interactions: RwLock<Vec<Interaction>>,
    }

    #[async_trait::async_trait]
    impl InteractionRepository for SwappableRepository {
        async fn get_user_interactions(&self, user_id: &str, _limit: Option<usize>) -> Result<Vec<Interaction>> {
            Ok(self.interactions.read().iter().filter(|i| i.user_id == user_id).cloned().collect())
        }

        async fn get_all_interactions(&self, _limit: Option<usize>) -> Result<Vec<Interaction>> {
            Ok(self.interactions.read().clone())
        }

        async fn save_interaction(&self, interaction: &Interaction) -> Result<()> {
            self.interactions.write().push(interaction.clone());
            Ok(())
        }

        async fn ping(&self) -> Result<()> {
            Ok(())
        }
    }

    fn service_with(interactions: Vec<Interaction>) -> RecommendationService {
        let repository = Arc::new(InMemoryInteractionRepository::with_interactions(interactions));
        RecommendationService::new(repository, Arc::new(Config::default()))
    }

    #[tokio::test]
    async fn test_lazy_training_on_first_request() {
        let service = service_with(vec![
            Interaction::new("u1", "p1", InteractionKind::Like),
            Interaction::new("u2", "p1", InteractionKind::Like),
            Interaction::new("u2", "p2", InteractionKind::Click),
        ]);
        assert!(!service.is_trained());

        let response = service
            .generate_recommendations(&RecommendationRequest::new("u1", 10))
            .await
            .unwrap();

        assert!(service.is_trained());
        assert_eq!(response.count, 1);
        assert_eq!(response.recommendations[0].item_id, "p2");
        assert_eq!(response.model_version, "collaborative_filtering_v1");

        let stats = service.stats();
        assert_eq!(stats.counters.get("training_runs"), Some(&1));
        assert_eq!(stats.counters.get("successful_requests"), Some(&1));
        assert!(stats.last_training.unwrap().trained);
    }

    #[tokio::test]
    async fn test_recorded_interactions_apply_after_retrain() {
        let service = service_with(vec![
            Interaction::new("u1", "p1", InteractionKind::Like),
            Interaction::new("u2", "p1", InteractionKind::Like),
        ]);
        service.train().await.unwrap();

        service
            .record_interaction(&Interaction::new("u2", "p9", InteractionKind::Share))
            .await
            .unwrap();
        let before = service
            .generate_recommendations(&RecommendationRequest::new("u1", 10))
            .await
            .unwrap();
        assert_eq!(before.count, 0);

        service.train().await.unwrap();
        let after = service
            .generate_recommendations(&RecommendationRequest::new("u1", 10))
            .await
            .unwrap();
        assert_eq!(after.count, 1);
        assert_eq!(after.recommendations[0].item_id, "p9");
    }

    #[tokio::test]
    async fn test_empty_retrain_keeps_last_successful_summary() {
        let repository = Arc::new(SwappableRepository::default());
        *repository.interactions.write() = vec![
            Interaction::new("u1", "p1", InteractionKind::Like),
            Interaction::new("u2", "p1", InteractionKind::Like),
            Interaction::new("u2", "p2", InteractionKind::Share),
        ];
        let service = RecommendationService::new(repository.clone(), Arc::new(Config::default()));

        let first = service.train().await.unwrap();
        assert!(first.trained);

        repository.interactions.write().clear();
        let empty = service.train().await.unwrap();
        assert!(!empty.trained);

        let stats = service.stats();
        assert!(stats.model_trained);
        let last = stats.last_training.unwrap();
        assert!(last.trained);
        assert_eq!(last.snapshot_id, first.snapshot_id);
        assert_eq!(stats.counters.get("training_runs"), Some(&2));
        assert_eq!(stats.counters.get("empty_training_runs"), Some(&1));
    }
}
