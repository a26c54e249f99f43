use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::validate_not_blank;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateReviewDto {
    pub project_id: Uuid,
    pub reviewer_id: Uuid,
    pub reviewee_id: Uuid,

    #[validate(range(min = 1, max = 5, message = "Rating must be between 1 and 5"))]
    pub rating: i32,

    #[validate(custom = "validate_not_blank")]
    pub comment: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateDisputeDto {
    pub project_id: Uuid,
    pub raised_by: Uuid,

    #[validate(custom = "validate_not_blank")]
    pub reason: String,

    pub evidence: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolveDisputeDto {
    pub dispute_id: Uuid,
    pub resolution: Option<String>,
}
