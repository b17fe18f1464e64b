use super::matrix::InteractionMatrix;
use super::neighbors::NearestNeighbors;
use super::weighting::InteractionWeights;
use super::Recommender;
use crate::error::RecommendationError;
use crate::models::*;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Everything one training pass produces. Never mutated after construction;
/// a retrain builds a new one and swaps it in.
#[derive(Debug)]
pub struct TrainedSnapshot {
    pub snapshot_id: Uuid,
    pub matrix: InteractionMatrix,
    pub model: NearestNeighbors,
    pub stats: MatrixStats,
    pub trained_at: DateTime<Utc>,
}

impl TrainedSnapshot {
    fn build(
        interactions: &[Interaction],
        weights: &InteractionWeights,
        n_neighbors: usize,
    ) -> Option<Self> {
        let matrix = InteractionMatrix::build(interactions, weights);
        if matrix.is_empty() {
            return None;
        }

        let model = NearestNeighbors::fit(matrix.values(), n_neighbors)?;
        let stats = matrix.stats(interactions.len());

        Some(Self {
            snapshot_id: Uuid::new_v4(),
            matrix,
            model,
            stats,
            trained_at: Utc::now(),
        })
    }

    /// User-based neighborhood scoring for `user_id` against this snapshot.
    pub fn recommend(
        &self,
        user_id: &str,
        limit: usize,
        exclude_item_ids: &HashSet<String>,
    ) -> Result<Vec<Recommendation>, RecommendationError> {
        let Some(user_row) = self.matrix.user_row(user_id) else {
            debug!("Cold start for user {}: no interactions in snapshot", user_id);
            return Ok(Vec::new());
        };

        if limit == 0 {
            return Ok(Vec::new());
        }

        let own_row = self.matrix.row(user_row);
        let interacted: HashSet<usize> = own_row
            .iter()
            .enumerate()
            .filter(|(_, &strength)| strength > 0.0)
            .map(|(col, _)| col)
            .collect();

        let item_ids = self.matrix.item_ids();
        let mut scores: HashMap<usize, f64> = HashMap::new();

        for neighbor in self.model.query(own_row) {
            if neighbor.row == user_row {
                continue;
            }

            let similarity = neighbor.similarity();
            for (col, &strength) in self.matrix.row(neighbor.row).iter().enumerate() {
                if strength <= 0.0
                    || interacted.contains(&col)
                    || exclude_item_ids.contains(&item_ids[col])
                {
                    continue;
                }

                *scores.entry(col).or_insert(0.0) += strength * similarity;
            }
        }

        let mut ranked: Vec<(usize, f64)> = scores.into_iter().collect();
        ranked.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(Ordering::Equal)
                .then_with(|| item_ids[a.0].cmp(&item_ids[b.0]))
        });
        ranked.truncate(limit);

        let max_score = match ranked.first() {
            Some(&(_, score)) if score > 0.0 => score,
            _ => return Ok(Vec::new()),
        };

        ranked
            .into_iter()
            .map(|(col, score)| {
                Recommendation::new(
                    user_id,
                    item_ids[col].as_str(),
                    (score / max_score).clamp(0.0, 1.0),
                    COLLABORATIVE_FILTERING_REASON,
                )
            })
            .collect()
    }
}

/// User-based collaborative filtering over a k-NN model of the interaction
/// matrix. Holds at most one trained snapshot at a time.
pub struct CollaborativeFilter {
    weights: InteractionWeights,
    n_neighbors: usize,
    snapshot: RwLock<Option<Arc<TrainedSnapshot>>>,
}

impl CollaborativeFilter {
    pub fn new(n_neighbors: usize, weights: InteractionWeights) -> Self {
        Self {
            weights,
            n_neighbors: n_neighbors.max(1),
            snapshot: RwLock::new(None),
        }
    }

    /// The snapshot currently serving requests, if any.
    pub fn snapshot(&self) -> Option<Arc<TrainedSnapshot>> {
        self.snapshot.read().clone()
    }
}

impl Default for CollaborativeFilter {
    fn default() -> Self {
        Self::new(5, InteractionWeights::default())
    }
}

impl Recommender for CollaborativeFilter {
    fn train(&self, interactions: &[Interaction]) -> TrainingSummary {
        let start = Instant::now();

        let Some(snapshot) = TrainedSnapshot::build(interactions, &self.weights, self.n_neighbors)
        else {
            warn!("No interactions available, collaborative filter left unchanged");
            return TrainingSummary {
                trained: false,
                snapshot_id: None,
                k_effective: 0,
                stats: MatrixStats::default(),
                duration_ms: start.elapsed().as_millis() as u64,
                finished_at: Utc::now(),
            };
        };

        let summary = TrainingSummary {
            trained: true,
            snapshot_id: Some(snapshot.snapshot_id),
            k_effective: snapshot.model.k_effective(),
            stats: snapshot.stats.clone(),
            duration_ms: start.elapsed().as_millis() as u64,
            finished_at: snapshot.trained_at,
        };

        info!(
            snapshot_id = %snapshot.snapshot_id,
            n_users = summary.stats.n_users,
            n_items = summary.stats.n_items,
            n_interactions = summary.stats.n_interactions,
            sparsity = summary.stats.sparsity,
            avg_items_per_user = summary.stats.avg_items_per_user,
            avg_users_per_item = summary.stats.avg_users_per_item,
            k_effective = summary.k_effective,
            "Trained collaborative filter in {}ms",
            summary.duration_ms
        );

        *self.snapshot.write() = Some(Arc::new(snapshot));
        summary
    }

    fn recommend(
        &self,
        user_id: &str,
        limit: usize,
        exclude_item_ids: &HashSet<String>,
    ) -> Result<Vec<Recommendation>, RecommendationError> {
        match self.snapshot() {
            Some(snapshot) => snapshot.recommend(user_id, limit, exclude_item_ids),
            None => Ok(Vec::new()),
        }
    }

    fn is_trained(&self) -> bool {
        self.snapshot.read().is_some()
    }
}
