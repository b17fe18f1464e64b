use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum RecommendationError {
    #[error("score must be between 0 and 1, got {0}")]
    InvalidScore(f64),
}

#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    #[error("user_id cannot be empty")]
    EmptyUserId,
    #[error("limit must be between 1 and {max}, got {limit}")]
    LimitOutOfRange { limit: usize, max: usize },
    #[error("interaction {field} cannot be empty")]
    EmptyInteractionField { field: &'static str },
}
