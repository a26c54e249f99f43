// service/order_bridge.rs
//
// Turns a paid package order into a running project: one project, one
// accepted proposal and two payout milestones whose amounts add up to the
// creator's share of the order.
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;
use validator::Validate;

use crate::{
    db::MarketStore,
    dtos::projectdtos::CreateProposalDto,
    models::{ordermodels::*, projectmodels::*, servicemodels::*},
    service::error::ServiceError,
};

const PROJECT_TITLE_PREFIX: &str = "[service order] ";
const EMPTY_REQUIREMENTS: &str = "No additional requirements were provided.";
const DRAFT_MILESTONE_TITLE: &str = "Draft delivery";
const FINAL_MILESTONE_TITLE: &str = "Final delivery";

/// Days until the draft is due: 60% of the package turnaround, rounded up.
pub fn draft_due_days(delivery_days: i32) -> i64 {
    (delivery_days as i64 * 6 + 9) / 10
}

/// Split the creator's proceeds across the draft and final milestones.
/// The final milestone takes the remainder so odd amounts are not lost.
pub fn split_payout(seller_receives: i64) -> (i64, i64) {
    let first = seller_receives.div_euclid(2);
    (first, seller_receives - first)
}

#[derive(Debug, Clone)]
pub struct OrderBridge {
    db_client: Arc<dyn MarketStore>,
}

impl OrderBridge {
    pub fn new(db_client: Arc<dyn MarketStore>) -> Self {
        Self { db_client }
    }

    /// Provision the project, proposal and milestones for a paid order.
    ///
    /// Safe to call more than once for the same order: only the first call
    /// that finds the order `paid` writes anything, every other call fails
    /// with an invalid-state error.
    pub async fn process_order(&self, order_id: Uuid) -> Result<BridgeOutcome, ServiceError> {
        let order = self
            .db_client
            .get_order_by_id(order_id)
            .await?
            .ok_or(ServiceError::OrderNotFound(order_id))?;

        if order.status != OrderStatus::Paid {
            return Err(ServiceError::InvalidOrderStatus(order_id, OrderStatus::Paid));
        }

        let service = self
            .db_client
            .get_service(order.service_id)
            .await?
            .ok_or(ServiceError::ServiceNotFound(order.service_id))?;

        let package = service
            .package(order.package_tier)
            .ok_or(ServiceError::PackageNotFound(service.id, order.package_tier))?;

        let plan = build_plan(&order, &service, package, Utc::now())?;

        let outcome = self
            .db_client
            .provision_order(plan)
            .await?
            // Another request bridged (or refunded) the order after our read.
            .ok_or(ServiceError::InvalidOrderStatus(order_id, OrderStatus::Paid))?;

        tracing::info!(
            "Order {} bridged to project {} (proposal {}, milestones {} + {})",
            order_id,
            outcome.project.id,
            outcome.proposal.id,
            outcome.milestones[0].amount,
            outcome.milestones[1].amount
        );

        Ok(outcome)
    }

    /// Re-drive the bridge for orders still sitting in `paid`.
    /// Returns how many orders were provisioned.
    pub async fn reconcile_paid_orders(&self, batch_size: i64) -> Result<usize, ServiceError> {
        let stuck = self
            .db_client
            .get_orders_by_status(OrderStatus::Paid, batch_size)
            .await?;

        let mut provisioned = 0;
        for order in stuck {
            match self.process_order(order.id).await {
                Ok(_) => provisioned += 1,
                Err(ServiceError::InvalidOrderStatus(..)) => {
                    tracing::debug!("Order {} was bridged concurrently", order.id);
                }
                Err(e) => tracing::error!("Failed to bridge order {}: {}", order.id, e),
            }
        }

        Ok(provisioned)
    }
}

fn build_plan(
    order: &Order,
    service: &Service,
    package: &ServicePackage,
    now: DateTime<Utc>,
) -> Result<ProvisionPlan, ServiceError> {
    let draft_days = draft_due_days(package.delivery_days);
    let deadline = now + Duration::days(package.delivery_days as i64);
    let draft_due = now + Duration::days(draft_days);
    let (first_amount, second_amount) = split_payout(order.seller_receives);

    let requirements = if order.requirements.trim().is_empty() {
        EMPTY_REQUIREMENTS
    } else {
        order.requirements.trim()
    };

    let project = NewProject {
        client_id: order.buyer_id,
        title: format!("{}{}", PROJECT_TITLE_PREFIX, service.title),
        description: format!(
            "{}\n\nPackage: {} ({})\n\nRequirements:\n{}",
            service.title,
            package.title,
            package.tier.to_str(),
            requirements
        ),
        budget_min: order.price,
        budget_max: order.price,
        deadline,
        category: service.category,
    };

    // Same rules a hand-written proposal goes through.
    let proposal = CreateProposalDto {
        project_id: Uuid::nil(),
        creator_id: order.creator_id,
        cover_letter: format!("Created from service order {}.", order.id),
        delivery_days: package.delivery_days,
        price: order.price,
        milestones: format!(
            "1. {} by day {}: {}\n2. {} by day {}: {}",
            DRAFT_MILESTONE_TITLE,
            draft_days,
            first_amount,
            FINAL_MILESTONE_TITLE,
            package.delivery_days,
            second_amount
        ),
        revision_scope: format!("Up to {} revision(s) included", package.revisions),
    };
    proposal.validate()?;

    let milestones = [
        NewMilestone {
            project_id: Uuid::nil(),
            title: DRAFT_MILESTONE_TITLE.to_string(),
            description: "First cut for client feedback".to_string(),
            amount: first_amount,
            due_date: draft_due,
        },
        NewMilestone {
            project_id: Uuid::nil(),
            title: FINAL_MILESTONE_TITLE.to_string(),
            description: "Final render with agreed revisions applied".to_string(),
            amount: second_amount,
            due_date: deadline,
        },
    ];

    Ok(ProvisionPlan {
        order_id: order.id,
        project,
        proposal: NewProposal {
            project_id: proposal.project_id,
            creator_id: proposal.creator_id,
            cover_letter: proposal.cover_letter,
            delivery_days: proposal.delivery_days,
            price: proposal.price,
            milestones: proposal.milestones,
            revision_scope: proposal.revision_scope,
            // The order already settled the terms; the project starts running.
            status: ProposalStatus::Accepted,
        },
        milestones,
    })
}
