// service/dispute_service.rs
use std::sync::Arc;

use uuid::Uuid;
use validator::Validate;

use crate::{
    db::MarketStore,
    dtos::feedbackdtos::{CreateDisputeDto, ResolveDisputeDto},
    models::feedbackmodels::*,
    service::error::ServiceError,
};

/// Disputes only ever move one step forward:
/// open -> investigating -> resolved -> closed.
#[derive(Debug, Clone)]
pub struct DisputeService {
    db_client: Arc<dyn MarketStore>,
}

impl DisputeService {
    pub fn new(db_client: Arc<dyn MarketStore>) -> Self {
        Self { db_client }
    }

    pub async fn create_dispute(&self, dto: CreateDisputeDto) -> Result<Dispute, ServiceError> {
        dto.validate()?;

        self.db_client
            .get_project_by_id(dto.project_id)
            .await?
            .ok_or(ServiceError::ProjectNotFound(dto.project_id))?;

        let dispute = self
            .db_client
            .create_dispute(NewDispute {
                project_id: dto.project_id,
                raised_by: dto.raised_by,
                reason: dto.reason,
                evidence: dto.evidence,
            })
            .await?;

        tracing::warn!(
            "Dispute {} raised on project {} by {}",
            dispute.id,
            dispute.project_id,
            dispute.raised_by
        );

        Ok(dispute)
    }

    pub async fn investigate_dispute(&self, dispute_id: Uuid) -> Result<Dispute, ServiceError> {
        self.transition(dispute_id, DisputeStatus::Investigating, None)
            .await
    }

    /// Stamps `resolved_at` and records the resolution text when one is given.
    pub async fn resolve_dispute(&self, dto: ResolveDisputeDto) -> Result<Dispute, ServiceError> {
        let resolution = dto
            .resolution
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty());

        let dispute = self
            .transition(dto.dispute_id, DisputeStatus::Resolved, resolution)
            .await?;

        tracing::info!("Dispute {} resolved", dispute.id);
        Ok(dispute)
    }

    pub async fn close_dispute(&self, dispute_id: Uuid) -> Result<Dispute, ServiceError> {
        self.transition(dispute_id, DisputeStatus::Closed, None).await
    }

    pub async fn disputes_for_project(&self, project_id: Uuid) -> Result<Vec<Dispute>, ServiceError> {
        Ok(self.db_client.get_project_disputes(project_id).await?)
    }

    async fn transition(
        &self,
        dispute_id: Uuid,
        to: DisputeStatus,
        resolution: Option<String>,
    ) -> Result<Dispute, ServiceError> {
        let dispute = self
            .db_client
            .get_dispute_by_id(dispute_id)
            .await?
            .ok_or(ServiceError::DisputeNotFound(dispute_id))?;

        if !dispute.status.can_transition_to(to) {
            tracing::warn!(
                "Rejected dispute transition {:?} -> {:?} for {}",
                dispute.status,
                to,
                dispute_id
            );
            return Err(ServiceError::InvalidDisputeTransition {
                id: dispute_id,
                from: dispute.status,
                to,
            });
        }

        Ok(self
            .db_client
            .update_dispute_status(dispute_id, to, resolution)
            .await?)
    }
}
