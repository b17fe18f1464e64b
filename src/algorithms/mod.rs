pub mod collaborative;
pub mod matrix;
pub mod neighbors;
pub mod weighting;

pub use collaborative::{CollaborativeFilter, TrainedSnapshot};
pub use matrix::InteractionMatrix;
pub use neighbors::{NearestNeighbors, Neighbor};
pub use weighting::InteractionWeights;

use crate::error::RecommendationError;
use crate::models::*;
use std::collections::HashSet;

/// A model that can be rebuilt from a full interaction snapshot and then
/// queried for a user's recommendations.
///
/// `train` is CPU-bound and should run off the async executor.
/// `recommend` never fails for unknown users or an untrained model; both
/// yield an empty list.
pub trait Recommender: Send + Sync {
    fn train(&self, interactions: &[Interaction]) -> TrainingSummary;

    fn recommend(
        &self,
        user_id: &str,
        limit: usize,
        exclude_item_ids: &HashSet<String>,
    ) -> Result<Vec<Recommendation>, RecommendationError>;

    fn is_trained(&self) -> bool;
}
