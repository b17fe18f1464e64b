use crate::error::RecommendationError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use uuid::Uuid;

pub const COLLABORATIVE_FILTERING_REASON: &str = "collaborative_filtering";

fn new_interaction_id() -> String {
    Uuid::new_v4().to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Interaction {
    #[serde(default = "new_interaction_id")]
    pub id: String,
    pub user_id: String,
    #[serde(alias = "post_id")]
    pub item_id: String,
    #[serde(alias = "interaction_type")]
    pub kind: InteractionKind,
    #[serde(default = "Utc::now", alias = "created_at")]
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub metadata: Option<serde_json::Value>,
}

/// Kind of a recorded user-item event. Kinds the weighting table does not
/// know about are kept verbatim in `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum InteractionKind {
    View,
    Click,
    Like,
    Share,
    Other(String),
}

impl InteractionKind {
    pub fn as_str(&self) -> &str {
        match self {
            InteractionKind::View => "view",
            InteractionKind::Click => "click",
            InteractionKind::Like => "like",
            InteractionKind::Share => "share",
            InteractionKind::Other(raw) => raw,
        }
    }
}

impl From<&str> for InteractionKind {
    fn from(raw: &str) -> Self {
        match raw {
            "view" => InteractionKind::View,
            "click" => InteractionKind::Click,
            "like" => InteractionKind::Like,
            "share" => InteractionKind::Share,
            other => InteractionKind::Other(other.to_string()),
        }
    }
}

impl From<String> for InteractionKind {
    fn from(raw: String) -> Self {
        InteractionKind::from(raw.as_str())
    }
}

impl From<InteractionKind> for String {
    fn from(kind: InteractionKind) -> Self {
        kind.as_str().to_string()
    }
}

impl std::fmt::Display for InteractionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Interaction {
    pub fn new(user_id: impl Into<String>, item_id: impl Into<String>, kind: InteractionKind) -> Self {
        Self {
            id: new_interaction_id(),
            user_id: user_id.into(),
            item_id: item_id.into(),
            kind,
            timestamp: Utc::now(),
            metadata: None,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

/// A single ranked suggestion. Scores are always within `[0, 1]`; the only
/// way to build one is [`Recommendation::new`], which enforces that.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recommendation {
    user_id: String,
    item_id: String,
    score: f64,
    reason: String,
}

impl Recommendation {
    pub fn new(
        user_id: impl Into<String>,
        item_id: impl Into<String>,
        score: f64,
        reason: impl Into<String>,
    ) -> Result<Self, RecommendationError> {
        if !(0.0..=1.0).contains(&score) {
            return Err(RecommendationError::InvalidScore(score));
        }

        Ok(Self {
            user_id: user_id.into(),
            item_id: item_id.into(),
            score,
            reason: reason.into(),
        })
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn item_id(&self) -> &str {
        &self.item_id
    }

    pub fn score(&self) -> f64 {
        self.score
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendationRequest {
    pub user_id: String,
    pub limit: usize,
    #[serde(default, alias = "exclude_post_ids")]
    pub exclude_item_ids: HashSet<String>,
}

impl RecommendationRequest {
    pub fn new(user_id: impl Into<String>, limit: usize) -> Self {
        Self {
            user_id: user_id.into(),
            limit,
            exclude_item_ids: HashSet::new(),
        }
    }

    pub fn excluding<I, S>(mut self, item_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclude_item_ids.extend(item_ids.into_iter().map(Into::into));
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendationItem {
    pub item_id: String,
    pub score: f64,
    pub reason: String,
}

impl From<Recommendation> for RecommendationItem {
    fn from(rec: Recommendation) -> Self {
        Self {
            item_id: rec.item_id,
            score: rec.score,
            reason: rec.reason,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendationResponse {
    pub user_id: String,
    pub recommendations: Vec<RecommendationItem>,
    pub count: usize,
    pub model_version: String,
}

/// Shape of the interaction matrix built by one training pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MatrixStats {
    pub n_users: usize,
    pub n_items: usize,
    pub n_interactions: usize,
    pub sparsity: f64,
    pub avg_items_per_user: f64,
    pub avg_users_per_item: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingSummary {
    pub trained: bool,
    pub snapshot_id: Option<Uuid>,
    pub k_effective: usize,
    pub stats: MatrixStats,
    pub duration_ms: u64,
    pub finished_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interaction_kind_roundtrips_unknown_values() {
        assert_eq!(InteractionKind::from("like"), InteractionKind::Like);
        assert_eq!(
            InteractionKind::from("bookmark"),
            InteractionKind::Other("bookmark".to_string())
        );

        let json = serde_json::to_string(&InteractionKind::Other("bookmark".into())).unwrap();
        assert_eq!(json, "\"bookmark\"");
        let kind: InteractionKind = serde_json::from_str("\"share\"").unwrap();
        assert_eq!(kind, InteractionKind::Share);
    }

    #[test]
    fn test_interaction_deserializes_with_defaults() {
        let interaction: Interaction = serde_json::from_str(
            r#"{"user_id": "u1", "post_id": "p1", "interaction_type": "like", "metadata": {"source": "feed"}}"#,
        )
        .unwrap();

        assert!(!interaction.id.is_empty());
        assert_eq!(interaction.item_id, "p1");
        assert_eq!(interaction.kind, InteractionKind::Like);
        assert_eq!(interaction.metadata.unwrap()["source"], "feed");
    }

    #[test]
    fn test_interaction_builders() {
        let at = DateTime::<Utc>::from_timestamp(1_700_000_000, 0).unwrap();
        let interaction = Interaction::new("u1", "p1", InteractionKind::Share)
            .with_id("i-1")
            .with_timestamp(at)
            .with_metadata(serde_json::json!({"dwell_ms": 1200}));

        assert_eq!(interaction.id, "i-1");
        assert_eq!(interaction.timestamp, at);
        assert!(interaction.metadata.is_some());
    }

    #[test]
    fn test_recommendation_rejects_out_of_range_scores() {
        assert!(Recommendation::new("u1", "p1", 0.0, COLLABORATIVE_FILTERING_REASON).is_ok());
        assert!(Recommendation::new("u1", "p1", 1.0, COLLABORATIVE_FILTERING_REASON).is_ok());
        assert!(Recommendation::new("u1", "p1", 1.0001, COLLABORATIVE_FILTERING_REASON).is_err());
        assert!(Recommendation::new("u1", "p1", -0.1, COLLABORATIVE_FILTERING_REASON).is_err());
        assert!(Recommendation::new("u1", "p1", f64::NAN, COLLABORATIVE_FILTERING_REASON).is_err());
    }

    #[test]
    fn test_request_accepts_post_id_alias() {
        let request: RecommendationRequest =
            serde_json::from_str(r#"{"user_id": "u1", "limit": 5, "exclude_post_ids": ["p3"]}"#).unwrap();
        assert_eq!(request.limit, 5);
        assert!(request.exclude_item_ids.contains("p3"));

        let request: RecommendationRequest =
            serde_json::from_str(r#"{"user_id": "u1", "limit": 5}"#).unwrap();
        assert!(request.exclude_item_ids.is_empty());
    }
}
