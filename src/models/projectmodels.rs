// models/projectmodels.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::ordermodels::Order;
use super::servicemodels::VideoCategory;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "project_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ProjectStatus {
    Open,
    InProgress,
    Completed,
    Cancelled,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "proposal_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ProposalStatus {
    Pending,
    Accepted,
    Rejected,
}

impl ProposalStatus {
    pub fn can_transition_to(&self, to: ProposalStatus) -> bool {
        matches!(
            (self, to),
            (ProposalStatus::Pending, ProposalStatus::Accepted)
                | (ProposalStatus::Pending, ProposalStatus::Rejected)
        )
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "milestone_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum MilestoneStatus {
    Pending,
    Submitted,
    Approved,
    RevisionRequested,
    Completed,
}

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone)]
pub struct Project {
    pub id: Uuid,
    pub client_id: Uuid,
    pub title: String,
    pub description: String,
    pub budget_min: i64,
    pub budget_max: i64,
    pub deadline: DateTime<Utc>,
    pub status: ProjectStatus,
    pub category: VideoCategory,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewProject {
    pub client_id: Uuid,
    pub title: String,
    pub description: String,
    pub budget_min: i64,
    pub budget_max: i64,
    pub deadline: DateTime<Utc>,
    pub category: VideoCategory,
}

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone)]
pub struct Proposal {
    pub id: Uuid,
    pub project_id: Uuid,
    pub creator_id: Uuid,
    pub cover_letter: String,
    pub delivery_days: i32,
    pub price: i64,
    pub milestones: String,
    pub revision_scope: String,
    pub status: ProposalStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewProposal {
    pub project_id: Uuid,
    pub creator_id: Uuid,
    pub cover_letter: String,
    pub delivery_days: i32,
    pub price: i64,
    pub milestones: String,
    pub revision_scope: String,
    pub status: ProposalStatus,
}

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone)]
pub struct Milestone {
    pub id: Uuid,
    pub project_id: Uuid,
    pub title: String,
    pub description: String,
    pub amount: i64,
    pub due_date: DateTime<Utc>,
    pub status: MilestoneStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewMilestone {
    pub project_id: Uuid,
    pub title: String,
    pub description: String,
    pub amount: i64,
    pub due_date: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone)]
pub struct Delivery {
    pub id: Uuid,
    pub milestone_id: Uuid,
    pub file_url: String,
    pub has_watermark: bool,
    pub note: Option<String>,
    pub submitted_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewDelivery {
    pub milestone_id: Uuid,
    pub file_url: String,
    pub has_watermark: bool,
    pub note: Option<String>,
}

/// Records the bridge writes for one paid order. The project id of the
/// proposal and milestones is filled in by the store once the project exists.
#[derive(Debug, Clone)]
pub struct ProvisionPlan {
    pub order_id: Uuid,
    pub project: NewProject,
    pub proposal: NewProposal,
    pub milestones: [NewMilestone; 2],
}

#[derive(Debug, Serialize, Clone)]
pub struct BridgeOutcome {
    pub order: Order,
    pub project: Project,
    pub proposal: Proposal,
    pub milestones: Vec<Milestone>,
}
