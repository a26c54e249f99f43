// models/ordermodels.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::servicemodels::PackageTier;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "order_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,        // Awaiting payment capture
    Paid,           // Escrow captured, waiting for the bridge
    ProjectCreated, // Project, proposal and milestones provisioned
    InProgress,
    Completed,
    Reviewed,
    Cancelled,
    Refunded,
}

impl OrderStatus {
    pub fn to_str(&self) -> &str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Paid => "paid",
            OrderStatus::ProjectCreated => "project_created",
            OrderStatus::InProgress => "in_progress",
            OrderStatus::Completed => "completed",
            OrderStatus::Reviewed => "reviewed",
            OrderStatus::Cancelled => "cancelled",
            OrderStatus::Refunded => "refunded",
        }
    }

    /// Funds are held by the payment provider in these states.
    pub fn is_escrowed(&self) -> bool {
        matches!(
            self,
            OrderStatus::Paid | OrderStatus::ProjectCreated | OrderStatus::InProgress
        )
    }

    /// States in which the order must point at its provisioned project.
    pub fn has_project(&self) -> bool {
        matches!(
            self,
            OrderStatus::ProjectCreated
                | OrderStatus::InProgress
                | OrderStatus::Completed
                | OrderStatus::Reviewed
        )
    }

    pub fn can_transition_to(&self, to: OrderStatus) -> bool {
        match (self, to) {
            (OrderStatus::Pending, OrderStatus::Paid) => true,
            (OrderStatus::Pending, OrderStatus::Cancelled) => true,
            (OrderStatus::Paid, OrderStatus::ProjectCreated) => true,
            (OrderStatus::ProjectCreated, OrderStatus::InProgress) => true,
            (OrderStatus::InProgress, OrderStatus::Completed) => true,
            (OrderStatus::Completed, OrderStatus::Reviewed) => true,
            (from, OrderStatus::Refunded) => from.is_escrowed(),
            _ => false,
        }
    }
}

#[derive(Debug, Serialize, Clone, Deserialize, sqlx::FromRow)]
pub struct Order {
    pub id: Uuid,
    pub service_id: Uuid,
    pub buyer_id: Uuid,
    pub creator_id: Uuid,
    pub package_tier: PackageTier,
    pub price: i64,
    pub commission_rate_bps: i32,
    pub commission_amount: i64,
    pub seller_receives: i64,
    pub requirements: String,
    pub status: OrderStatus,
    pub project_id: Option<Uuid>,
    pub payment_key: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub paid_at: Option<DateTime<Utc>>,
    pub payout_released_at: Option<DateTime<Utc>>,
}

impl Order {
    pub fn commission_rate(&self) -> f64 {
        self.commission_rate_bps as f64 / 10_000.0
    }
}

#[derive(Debug, Clone)]
pub struct NewOrder {
    pub service_id: Uuid,
    pub buyer_id: Uuid,
    pub creator_id: Uuid,
    pub package_tier: PackageTier,
    pub price: i64,
    pub commission_rate_bps: i32,
    pub commission_amount: i64,
    pub seller_receives: i64,
    pub requirements: String,
}

/// Partial update applied to an order row.
///
/// When `expected_status` is set the update only applies if the stored status
/// still matches, which lets callers detect a concurrent transition.
#[derive(Debug, Clone, Default)]
pub struct OrderPatch {
    pub expected_status: Option<OrderStatus>,
    pub status: Option<OrderStatus>,
    pub project_id: Option<Uuid>,
    pub payment_key: Option<String>,
}
