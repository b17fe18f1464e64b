use crate::error::ValidationError;
use crate::models::*;

pub fn validate_recommendation_request(
    request: &RecommendationRequest,
    max_limit: usize,
) -> Result<(), ValidationError> {
    if request.user_id.trim().is_empty() {
        return Err(ValidationError::EmptyUserId);
    }

    // Out-of-range limits are rejected, never clamped.
    if request.limit == 0 || request.limit > max_limit {
        return Err(ValidationError::LimitOutOfRange {
            limit: request.limit,
            max: max_limit,
        });
    }

    Ok(())
}

pub fn validate_interaction(interaction: &Interaction) -> Result<(), ValidationError> {
    let fields = [
        ("id", &interaction.id),
        ("user_id", &interaction.user_id),
        ("item_id", &interaction.item_id),
    ];

    for (field, value) in fields {
        if value.trim().is_empty() {
            return Err(ValidationError::EmptyInteractionField { field });
        }
    }

    if interaction.kind.as_str().is_empty() {
        return Err(ValidationError::EmptyInteractionField { field: "kind" });
    }

    Ok(())
}
