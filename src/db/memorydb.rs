// db/memorydb.rs
//
// In-process store with the same contract as the Postgres client. Every
// trait method takes the single table lock, so multi-record operations such
// as `provision_order` are atomic with respect to each other.
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::Error;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{
    feedbackdb::FeedbackExt, orderdb::OrderExt, projectdb::ProjectExt, servicedb::CatalogExt,
};
use crate::models::{
    feedbackmodels::*, ordermodels::*, projectmodels::*, servicemodels::*,
};

#[derive(Debug, Default)]
struct Tables {
    services: Vec<Service>,
    orders: Vec<Order>,
    projects: Vec<Project>,
    proposals: Vec<Proposal>,
    milestones: Vec<Milestone>,
    deliveries: Vec<Delivery>,
    reviews: Vec<Review>,
    disputes: Vec<Dispute>,
}

impl Tables {
    fn insert_project(&mut self, project: NewProject) -> Project {
        let now = Utc::now();
        let created = Project {
            id: Uuid::new_v4(),
            client_id: project.client_id,
            title: project.title,
            description: project.description,
            budget_min: project.budget_min,
            budget_max: project.budget_max,
            deadline: project.deadline,
            status: ProjectStatus::Open,
            category: project.category,
            created_at: now,
            updated_at: now,
        };
        self.projects.push(created.clone());
        created
    }

    fn insert_proposal(&mut self, proposal: NewProposal, project_id: Uuid) -> Proposal {
        let now = Utc::now();
        let created = Proposal {
            id: Uuid::new_v4(),
            project_id,
            creator_id: proposal.creator_id,
            cover_letter: proposal.cover_letter,
            delivery_days: proposal.delivery_days,
            price: proposal.price,
            milestones: proposal.milestones,
            revision_scope: proposal.revision_scope,
            status: proposal.status,
            created_at: now,
            updated_at: now,
        };
        self.proposals.push(created.clone());
        created
    }

    fn insert_milestone(&mut self, milestone: NewMilestone, project_id: Uuid) -> Milestone {
        let now = Utc::now();
        let created = Milestone {
            id: Uuid::new_v4(),
            project_id,
            title: milestone.title,
            description: milestone.description,
            amount: milestone.amount,
            due_date: milestone.due_date,
            status: MilestoneStatus::Pending,
            created_at: now,
            updated_at: now,
        };
        self.milestones.push(created.clone());
        created
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CatalogExt for MemoryStore {
    async fn create_service(&self, service: NewService) -> Result<Service, Error> {
        let now = Utc::now();
        let created = Service {
            id: Uuid::new_v4(),
            creator_id: service.creator_id,
            title: service.title,
            description: service.description,
            category: service.category,
            status: service.status,
            packages: service.packages,
            order_count: 0,
            completed_count: 0,
            created_at: now,
            updated_at: now,
        };
        self.tables.write().await.services.push(created.clone());
        Ok(created)
    }

    async fn get_service(&self, service_id: Uuid) -> Result<Option<Service>, Error> {
        let tables = self.tables.read().await;
        Ok(tables.services.iter().find(|s| s.id == service_id).cloned())
    }

    async fn update_service_status(
        &self,
        service_id: Uuid,
        status: ServiceStatus,
    ) -> Result<Service, Error> {
        let mut tables = self.tables.write().await;
        let service = tables
            .services
            .iter_mut()
            .find(|s| s.id == service_id)
            .ok_or(Error::RowNotFound)?;
        service.status = status;
        service.updated_at = Utc::now();
        Ok(service.clone())
    }

    async fn update_service_stats(
        &self,
        service_id: Uuid,
        stat: ServiceStat,
        delta: i32,
    ) -> Result<(), Error> {
        let mut tables = self.tables.write().await;
        let service = tables
            .services
            .iter_mut()
            .find(|s| s.id == service_id)
            .ok_or(Error::RowNotFound)?;
        match stat {
            ServiceStat::OrderCount => service.order_count += delta,
            ServiceStat::CompletedCount => service.completed_count += delta,
        }
        Ok(())
    }
}

#[async_trait]
impl OrderExt for MemoryStore {
    async fn create_order(&self, order: NewOrder) -> Result<Order, Error> {
        let now = Utc::now();
        let created = Order {
            id: Uuid::new_v4(),
            service_id: order.service_id,
            buyer_id: order.buyer_id,
            creator_id: order.creator_id,
            package_tier: order.package_tier,
            price: order.price,
            commission_rate_bps: order.commission_rate_bps,
            commission_amount: order.commission_amount,
            seller_receives: order.seller_receives,
            requirements: order.requirements,
            status: OrderStatus::Pending,
            project_id: None,
            payment_key: None,
            created_at: now,
            updated_at: now,
            paid_at: None,
            payout_released_at: None,
        };

        let mut tables = self.tables.write().await;
        let service = tables
            .services
            .iter_mut()
            .find(|s| s.id == created.service_id)
            .ok_or(Error::RowNotFound)?;
        service.order_count += 1;
        tables.orders.push(created.clone());
        Ok(created)
    }

    async fn get_order_by_id(&self, order_id: Uuid) -> Result<Option<Order>, Error> {
        let tables = self.tables.read().await;
        Ok(tables.orders.iter().find(|o| o.id == order_id).cloned())
    }

    async fn get_orders_by_buyer(&self, buyer_id: Uuid) -> Result<Vec<Order>, Error> {
        let tables = self.tables.read().await;
        Ok(tables
            .orders
            .iter()
            .rev()
            .filter(|o| o.buyer_id == buyer_id)
            .cloned()
            .collect())
    }

    async fn get_orders_by_creator(&self, creator_id: Uuid) -> Result<Vec<Order>, Error> {
        let tables = self.tables.read().await;
        Ok(tables
            .orders
            .iter()
            .rev()
            .filter(|o| o.creator_id == creator_id)
            .cloned()
            .collect())
    }

    async fn get_orders_by_status(
        &self,
        status: OrderStatus,
        limit: i64,
    ) -> Result<Vec<Order>, Error> {
        let tables = self.tables.read().await;
        let mut orders: Vec<Order> = tables
            .orders
            .iter()
            .filter(|o| o.status == status)
            .cloned()
            .collect();
        orders.sort_by_key(|o| o.updated_at);
        orders.truncate(limit.max(0) as usize);
        Ok(orders)
    }

    async fn update_order(&self, order_id: Uuid, patch: OrderPatch) -> Result<Option<Order>, Error> {
        let mut tables = self.tables.write().await;
        let Some(order) = tables.orders.iter_mut().find(|o| o.id == order_id) else {
            return Ok(None);
        };

        if let Some(expected) = patch.expected_status {
            if order.status != expected {
                return Ok(None);
            }
        }

        let now = Utc::now();
        if let Some(status) = patch.status {
            if status == OrderStatus::Paid {
                order.paid_at = Some(now);
            }
            order.status = status;
        }
        if let Some(project_id) = patch.project_id {
            order.project_id = Some(project_id);
        }
        if let Some(payment_key) = patch.payment_key {
            order.payment_key = Some(payment_key);
        }
        order.updated_at = now;

        Ok(Some(order.clone()))
    }

    async fn claim_payout(&self, order_id: Uuid) -> Result<Option<Order>, Error> {
        let mut tables = self.tables.write().await;
        let Some(order) = tables.orders.iter_mut().find(|o| {
            o.id == order_id && o.status == OrderStatus::Completed && o.payout_released_at.is_none()
        }) else {
            return Ok(None);
        };

        let now = Utc::now();
        order.payout_released_at = Some(now);
        order.updated_at = now;
        Ok(Some(order.clone()))
    }

    async fn clear_payout_claim(&self, order_id: Uuid) -> Result<(), Error> {
        let mut tables = self.tables.write().await;
        if let Some(order) = tables.orders.iter_mut().find(|o| o.id == order_id) {
            order.payout_released_at = None;
            order.updated_at = Utc::now();
        }
        Ok(())
    }
}

#[async_trait]
impl ProjectExt for MemoryStore {
    async fn create_project(&self, project: NewProject) -> Result<Project, Error> {
        Ok(self.tables.write().await.insert_project(project))
    }

    async fn get_project_by_id(&self, project_id: Uuid) -> Result<Option<Project>, Error> {
        let tables = self.tables.read().await;
        Ok(tables.projects.iter().find(|p| p.id == project_id).cloned())
    }

    async fn update_project_status(
        &self,
        project_id: Uuid,
        status: ProjectStatus,
    ) -> Result<Project, Error> {
        let mut tables = self.tables.write().await;
        let project = tables
            .projects
            .iter_mut()
            .find(|p| p.id == project_id)
            .ok_or(Error::RowNotFound)?;
        project.status = status;
        project.updated_at = Utc::now();
        Ok(project.clone())
    }

    async fn create_proposal(&self, proposal: NewProposal) -> Result<Proposal, Error> {
        let project_id = proposal.project_id;
        Ok(self.tables.write().await.insert_proposal(proposal, project_id))
    }

    async fn get_proposal_by_id(&self, proposal_id: Uuid) -> Result<Option<Proposal>, Error> {
        let tables = self.tables.read().await;
        Ok(tables.proposals.iter().find(|p| p.id == proposal_id).cloned())
    }

    async fn get_project_proposals(&self, project_id: Uuid) -> Result<Vec<Proposal>, Error> {
        let tables = self.tables.read().await;
        Ok(tables
            .proposals
            .iter()
            .filter(|p| p.project_id == project_id)
            .cloned()
            .collect())
    }

    async fn update_proposal_status(
        &self,
        proposal_id: Uuid,
        status: ProposalStatus,
    ) -> Result<Proposal, Error> {
        let mut tables = self.tables.write().await;
        let proposal = tables
            .proposals
            .iter_mut()
            .find(|p| p.id == proposal_id)
            .ok_or(Error::RowNotFound)?;
        proposal.status = status;
        proposal.updated_at = Utc::now();
        Ok(proposal.clone())
    }

    async fn create_milestone(&self, milestone: NewMilestone) -> Result<Milestone, Error> {
        let project_id = milestone.project_id;
        Ok(self.tables.write().await.insert_milestone(milestone, project_id))
    }

    async fn get_milestone_by_id(&self, milestone_id: Uuid) -> Result<Option<Milestone>, Error> {
        let tables = self.tables.read().await;
        Ok(tables.milestones.iter().find(|m| m.id == milestone_id).cloned())
    }

    async fn get_project_milestones(&self, project_id: Uuid) -> Result<Vec<Milestone>, Error> {
        let tables = self.tables.read().await;
        let mut milestones: Vec<Milestone> = tables
            .milestones
            .iter()
            .filter(|m| m.project_id == project_id)
            .cloned()
            .collect();
        milestones.sort_by_key(|m| m.due_date);
        Ok(milestones)
    }

    async fn update_milestone_status(
        &self,
        milestone_id: Uuid,
        status: MilestoneStatus,
    ) -> Result<Milestone, Error> {
        let mut tables = self.tables.write().await;
        let milestone = tables
            .milestones
            .iter_mut()
            .find(|m| m.id == milestone_id)
            .ok_or(Error::RowNotFound)?;
        milestone.status = status;
        milestone.updated_at = Utc::now();
        Ok(milestone.clone())
    }

    async fn create_delivery(&self, delivery: NewDelivery) -> Result<(Delivery, Milestone), Error> {
        let mut tables = self.tables.write().await;
        let now = Utc::now();

        let milestone = tables
            .milestones
            .iter_mut()
            .find(|m| m.id == delivery.milestone_id)
            .ok_or(Error::RowNotFound)?;
        milestone.status = MilestoneStatus::Submitted;
        milestone.updated_at = now;
        let milestone = milestone.clone();

        let created = Delivery {
            id: Uuid::new_v4(),
            milestone_id: delivery.milestone_id,
            file_url: delivery.file_url,
            has_watermark: delivery.has_watermark,
            note: delivery.note,
            submitted_at: now,
        };
        tables.deliveries.push(created.clone());

        Ok((created, milestone))
    }

    async fn get_milestone_deliveries(&self, milestone_id: Uuid) -> Result<Vec<Delivery>, Error> {
        let tables = self.tables.read().await;
        Ok(tables
            .deliveries
            .iter()
            .filter(|d| d.milestone_id == milestone_id)
            .cloned()
            .collect())
    }

    async fn provision_order(&self, plan: ProvisionPlan) -> Result<Option<BridgeOutcome>, Error> {
        let mut tables = self.tables.write().await;

        let claimable = tables
            .orders
            .iter()
            .any(|o| o.id == plan.order_id && o.status == OrderStatus::Paid);
        if !claimable {
            return Ok(None);
        }

        let mut project = tables.insert_project(plan.project);
        project.status = ProjectStatus::InProgress;
        if let Some(stored) = tables.projects.iter_mut().find(|p| p.id == project.id) {
            stored.status = ProjectStatus::InProgress;
        }

        let proposal = tables.insert_proposal(plan.proposal, project.id);
        let milestones = plan
            .milestones
            .into_iter()
            .map(|m| tables.insert_milestone(m, project.id))
            .collect::<Vec<_>>();

        let order = tables
            .orders
            .iter_mut()
            .find(|o| o.id == plan.order_id)
            .ok_or(Error::RowNotFound)?;
        order.status = OrderStatus::ProjectCreated;
        order.project_id = Some(project.id);
        order.updated_at = Utc::now();
        let order = order.clone();

        Ok(Some(BridgeOutcome {
            order,
            project,
            proposal,
            milestones,
        }))
    }

    async fn record_refund(&self, order_id: Uuid, from: OrderStatus) -> Result<Option<Order>, Error> {
        let mut tables = self.tables.write().await;
        let Some(order) = tables
            .orders
            .iter_mut()
            .find(|o| o.id == order_id && o.status == from)
        else {
            return Ok(None);
        };

        let now = Utc::now();
        let project_id = order.project_id.take();
        order.status = OrderStatus::Refunded;
        order.updated_at = now;
        let order = order.clone();

        if let Some(project) = project_id.and_then(|id| tables.projects.iter_mut().find(|p| p.id == id)) {
            project.status = ProjectStatus::Cancelled;
            project.updated_at = now;
        }

        Ok(Some(order))
    }
}

#[async_trait]
impl FeedbackExt for MemoryStore {
    async fn create_review(&self, review: NewReview) -> Result<Review, Error> {
        let created = Review {
            id: Uuid::new_v4(),
            project_id: review.project_id,
            reviewer_id: review.reviewer_id,
            reviewee_id: review.reviewee_id,
            rating: review.rating,
            comment: review.comment,
            created_at: Utc::now(),
        };
        self.tables.write().await.reviews.push(created.clone());
        Ok(created)
    }

    async fn get_project_reviews(&self, project_id: Uuid) -> Result<Vec<Review>, Error> {
        let tables = self.tables.read().await;
        Ok(tables
            .reviews
            .iter()
            .rev()
            .filter(|r| r.project_id == project_id)
            .cloned()
            .collect())
    }

    async fn get_user_reviews(&self, reviewee_id: Uuid) -> Result<Vec<Review>, Error> {
        let tables = self.tables.read().await;
        Ok(tables
            .reviews
            .iter()
            .rev()
            .filter(|r| r.reviewee_id == reviewee_id)
            .cloned()
            .collect())
    }

    async fn create_dispute(&self, dispute: NewDispute) -> Result<Dispute, Error> {
        let now = Utc::now();
        let created = Dispute {
            id: Uuid::new_v4(),
            project_id: dispute.project_id,
            raised_by: dispute.raised_by,
            reason: dispute.reason,
            evidence: dispute.evidence,
            status: DisputeStatus::Open,
            resolution: None,
            created_at: now,
            updated_at: now,
            resolved_at: None,
        };
        self.tables.write().await.disputes.push(created.clone());
        Ok(created)
    }

    async fn get_dispute_by_id(&self, dispute_id: Uuid) -> Result<Option<Dispute>, Error> {
        let tables = self.tables.read().await;
        Ok(tables.disputes.iter().find(|d| d.id == dispute_id).cloned())
    }

    async fn get_project_disputes(&self, project_id: Uuid) -> Result<Vec<Dispute>, Error> {
        let tables = self.tables.read().await;
        Ok(tables
            .disputes
            .iter()
            .rev()
            .filter(|d| d.project_id == project_id)
            .cloned()
            .collect())
    }

    async fn update_dispute_status(
        &self,
        dispute_id: Uuid,
        status: DisputeStatus,
        resolution: Option<String>,
    ) -> Result<Dispute, Error> {
        let mut tables = self.tables.write().await;
        let dispute = tables
            .disputes
            .iter_mut()
            .find(|d| d.id == dispute_id)
            .ok_or(Error::RowNotFound)?;

        let now = Utc::now();
        if status == DisputeStatus::Resolved {
            dispute.resolved_at = Some(now);
        }
        if resolution.is_some() {
            dispute.resolution = resolution;
        }
        dispute.status = status;
        dispute.updated_at = now;
        Ok(dispute.clone())
    }
}
