// service/proposal_service.rs
use std::sync::Arc;

use uuid::Uuid;
use validator::Validate;

use crate::{
    db::MarketStore,
    dtos::projectdtos::CreateProposalDto,
    models::projectmodels::*,
    service::error::ServiceError,
};

#[derive(Debug, Clone)]
pub struct ProposalService {
    db_client: Arc<dyn MarketStore>,
}

impl ProposalService {
    pub fn new(db_client: Arc<dyn MarketStore>) -> Self {
        Self { db_client }
    }

    pub async fn create_proposal(&self, dto: CreateProposalDto) -> Result<Proposal, ServiceError> {
        dto.validate()?;

        self.db_client
            .get_project_by_id(dto.project_id)
            .await?
            .ok_or(ServiceError::ProjectNotFound(dto.project_id))?;

        let proposal = self
            .db_client
            .create_proposal(NewProposal {
                project_id: dto.project_id,
                creator_id: dto.creator_id,
                cover_letter: dto.cover_letter,
                delivery_days: dto.delivery_days,
                price: dto.price,
                milestones: dto.milestones,
                revision_scope: dto.revision_scope,
                status: ProposalStatus::Pending,
            })
            .await?;

        tracing::info!(
            "Proposal {} submitted on project {} by {}",
            proposal.id,
            proposal.project_id,
            proposal.creator_id
        );

        Ok(proposal)
    }

    pub async fn accept_proposal(&self, proposal_id: Uuid) -> Result<Proposal, ServiceError> {
        self.transition(proposal_id, ProposalStatus::Accepted).await
    }

    pub async fn reject_proposal(&self, proposal_id: Uuid) -> Result<Proposal, ServiceError> {
        self.transition(proposal_id, ProposalStatus::Rejected).await
    }

    pub async fn proposals_for_project(&self, project_id: Uuid) -> Result<Vec<Proposal>, ServiceError> {
        Ok(self.db_client.get_project_proposals(project_id).await?)
    }

    async fn transition(
        &self,
        proposal_id: Uuid,
        to: ProposalStatus,
    ) -> Result<Proposal, ServiceError> {
        let proposal = self
            .db_client
            .get_proposal_by_id(proposal_id)
            .await?
            .ok_or(ServiceError::ProposalNotFound(proposal_id))?;

        if !proposal.status.can_transition_to(to) {
            return Err(ServiceError::InvalidProposalTransition {
                id: proposal_id,
                from: proposal.status,
                to,
            });
        }

        Ok(self.db_client.update_proposal_status(proposal_id, to).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    use crate::{
        models::servicemodels::VideoCategory,
        service::{error::ErrorKind, testutil},
    };

    async fn open_project(store: &Arc<dyn MarketStore>) -> Project {
        store
            .create_project(NewProject {
                client_id: Uuid::new_v4(),
                title: "Music video for indie single".to_string(),
                description: "Stylised AI visuals".to_string(),
                budget_min: 200_000,
                budget_max: 400_000,
                deadline: Utc::now() + Duration::days(30),
                category: VideoCategory::MusicVideo,
            })
            .await
            .unwrap()
    }

    fn proposal_dto(project_id: Uuid, price: i64, delivery_days: i32) -> CreateProposalDto {
        CreateProposalDto {
            project_id,
            creator_id: Uuid::new_v4(),
            cover_letter: "I have shipped three music videos this year.".to_string(),
            delivery_days,
            price,
            milestones: "Storyboard, draft, final".to_string(),
            revision_scope: "Two rounds".to_string(),
        }
    }

    #[tokio::test]
    async fn minimum_price_and_days_are_accepted() {
        let store = testutil::store();
        let project = open_project(&store).await;
        let proposals = ProposalService::new(store);

        let proposal = proposals
            .create_proposal(proposal_dto(project.id, 10_000, 1))
            .await
            .unwrap();
        assert_eq!(proposal.status, ProposalStatus::Pending);
        assert_eq!(proposal.price, 10_000);
    }

    #[tokio::test]
    async fn below_minimums_are_rejected() {
        let store = testutil::store();
        let project = open_project(&store).await;
        let proposals = ProposalService::new(store.clone());

        let err = proposals
            .create_proposal(proposal_dto(project.id, 9_999, 3))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);

        let err = proposals
            .create_proposal(proposal_dto(project.id, 50_000, 0))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);

        assert!(proposals.proposals_for_project(project.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn unknown_project_is_not_found() {
        let proposals = ProposalService::new(testutil::store());
        let err = proposals
            .create_proposal(proposal_dto(Uuid::new_v4(), 50_000, 3))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::ProjectNotFound(_)));
    }

    #[tokio::test]
    async fn accept_and_reject_only_from_pending() {
        let store = testutil::store();
        let project = open_project(&store).await;
        let proposals = ProposalService::new(store);

        let first = proposals
            .create_proposal(proposal_dto(project.id, 250_000, 14))
            .await
            .unwrap();
        let second = proposals
            .create_proposal(proposal_dto(project.id, 300_000, 10))
            .await
            .unwrap();

        let accepted = proposals.accept_proposal(first.id).await.unwrap();
        assert_eq!(accepted.status, ProposalStatus::Accepted);
        let rejected = proposals.reject_proposal(second.id).await.unwrap();
        assert_eq!(rejected.status, ProposalStatus::Rejected);

        let err = proposals.accept_proposal(second.id).await.unwrap_err();
        assert!(matches!(
            err,
            ServiceError::InvalidProposalTransition {
                from: ProposalStatus::Rejected,
                to: ProposalStatus::Accepted,
                ..
            }
        ));
    }
}
