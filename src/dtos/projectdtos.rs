use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::validate_not_blank;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateProposalDto {
    pub project_id: Uuid,
    pub creator_id: Uuid,

    pub cover_letter: String,

    #[validate(range(min = 1, message = "Delivery must take at least 1 day"))]
    pub delivery_days: i32,

    #[validate(range(min = 10000, message = "Proposal price must be at least 10,000"))]
    pub price: i64,

    pub milestones: String,
    pub revision_scope: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateMilestoneDto {
    pub project_id: Uuid,

    #[validate(custom = "validate_not_blank")]
    pub title: String,

    pub description: String,

    #[validate(range(min = 0, message = "Milestone amount cannot be negative"))]
    pub amount: i64,

    pub due_date: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SubmitDeliveryDto {
    pub milestone_id: Uuid,

    #[validate(custom = "validate_not_blank")]
    pub file_url: String,

    pub has_watermark: bool,
    pub note: Option<String>,
}
