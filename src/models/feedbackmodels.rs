// models/feedbackmodels.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "dispute_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum DisputeStatus {
    Open,
    Investigating,
    Resolved,
    Closed,
}

impl DisputeStatus {
    /// Only the single forward step along open -> investigating -> resolved -> closed.
    pub fn can_transition_to(&self, to: DisputeStatus) -> bool {
        matches!(
            (self, to),
            (DisputeStatus::Open, DisputeStatus::Investigating)
                | (DisputeStatus::Investigating, DisputeStatus::Resolved)
                | (DisputeStatus::Resolved, DisputeStatus::Closed)
        )
    }
}

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone)]
pub struct Review {
    pub id: Uuid,
    pub project_id: Uuid,
    pub reviewer_id: Uuid,
    pub reviewee_id: Uuid,
    pub rating: i32,
    pub comment: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewReview {
    pub project_id: Uuid,
    pub reviewer_id: Uuid,
    pub reviewee_id: Uuid,
    pub rating: i32,
    pub comment: String,
}

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone)]
pub struct Dispute {
    pub id: Uuid,
    pub project_id: Uuid,
    pub raised_by: Uuid,
    pub reason: String,
    pub evidence: Option<String>,
    pub status: DisputeStatus,
    pub resolution: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct NewDispute {
    pub project_id: Uuid,
    pub raised_by: Uuid,
    pub reason: String,
    pub evidence: Option<String>,
}
