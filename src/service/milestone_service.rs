// service/milestone_service.rs
use std::sync::Arc;

use uuid::Uuid;
use validator::Validate;

use crate::{
    db::MarketStore,
    dtos::projectdtos::{CreateMilestoneDto, SubmitDeliveryDto},
    models::projectmodels::*,
    service::error::ServiceError,
};

/// Milestones move freely between statuses; a new delivery always puts the
/// milestone back into `submitted`, including after a revision request.
#[derive(Debug, Clone)]
pub struct MilestoneService {
    db_client: Arc<dyn MarketStore>,
}

impl MilestoneService {
    pub fn new(db_client: Arc<dyn MarketStore>) -> Self {
        Self { db_client }
    }

    pub async fn create_milestone(&self, dto: CreateMilestoneDto) -> Result<Milestone, ServiceError> {
        dto.validate()?;

        self.db_client
            .get_project_by_id(dto.project_id)
            .await?
            .ok_or(ServiceError::ProjectNotFound(dto.project_id))?;

        Ok(self
            .db_client
            .create_milestone(NewMilestone {
                project_id: dto.project_id,
                title: dto.title,
                description: dto.description,
                amount: dto.amount,
                due_date: dto.due_date,
            })
            .await?)
    }

    pub async fn submit_milestone(&self, milestone_id: Uuid) -> Result<Milestone, ServiceError> {
        self.set_status(milestone_id, MilestoneStatus::Submitted).await
    }

    pub async fn approve_milestone(&self, milestone_id: Uuid) -> Result<Milestone, ServiceError> {
        self.set_status(milestone_id, MilestoneStatus::Approved).await
    }

    pub async fn request_revision(&self, milestone_id: Uuid) -> Result<Milestone, ServiceError> {
        self.set_status(milestone_id, MilestoneStatus::RevisionRequested)
            .await
    }

    pub async fn complete_milestone(&self, milestone_id: Uuid) -> Result<Milestone, ServiceError> {
        self.set_status(milestone_id, MilestoneStatus::Completed).await
    }

    /// Record a delivery file and mark its milestone as submitted.
    pub async fn submit_delivery(
        &self,
        dto: SubmitDeliveryDto,
    ) -> Result<(Delivery, Milestone), ServiceError> {
        dto.validate()?;

        let milestone = self.find(dto.milestone_id).await?;

        let (delivery, updated) = self
            .db_client
            .create_delivery(NewDelivery {
                milestone_id: milestone.id,
                file_url: dto.file_url,
                has_watermark: dto.has_watermark,
                note: dto.note,
            })
            .await?;

        tracing::info!(
            "Delivery {} submitted for milestone {} (was {:?})",
            delivery.id,
            milestone.id,
            milestone.status
        );

        Ok((delivery, updated))
    }

    pub async fn milestones_for_project(&self, project_id: Uuid) -> Result<Vec<Milestone>, ServiceError> {
        Ok(self.db_client.get_project_milestones(project_id).await?)
    }

    pub async fn deliveries_for_milestone(
        &self,
        milestone_id: Uuid,
    ) -> Result<Vec<Delivery>, ServiceError> {
        Ok(self.db_client.get_milestone_deliveries(milestone_id).await?)
    }

    async fn find(&self, milestone_id: Uuid) -> Result<Milestone, ServiceError> {
        self.db_client
            .get_milestone_by_id(milestone_id)
            .await?
            .ok_or(ServiceError::MilestoneNotFound(milestone_id))
    }

    async fn set_status(
        &self,
        milestone_id: Uuid,
        status: MilestoneStatus,
    ) -> Result<Milestone, ServiceError> {
        self.find(milestone_id).await?;
        Ok(self
            .db_client
            .update_milestone_status(milestone_id, status)
            .await?)
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

    async fn setup() -> (MilestoneService, Project) {
        let store = testutil::store();
        let project = store
            .create_project(NewProject {
                client_id: Uuid::new_v4(),
                title: "Explainer for a fintech app".to_string(),
                description: String::new(),
                budget_min: 100_000,
                budget_max: 100_000,
                deadline: Utc::now() + Duration::days(10),
                category: VideoCategory::Explainer,
            })
            .await
            .unwrap();
        (MilestoneService::new(store), project)
    }

    fn milestone_dto(project_id: Uuid, amount: i64) -> CreateMilestoneDto {
        CreateMilestoneDto {
            project_id,
            title: "Storyboard".to_string(),
            description: "Frame-by-frame storyboard".to_string(),
            amount,
            due_date: Utc::now() + Duration::days(3),
        }
    }

    fn delivery_dto(milestone_id: Uuid) -> SubmitDeliveryDto {
        SubmitDeliveryDto {
            milestone_id,
            file_url: "deliveries/draft-v1.mp4".to_string(),
            has_watermark: true,
            note: None,
        }
    }

    #[tokio::test]
    async fn negative_amount_is_rejected_zero_is_not() {
        let (milestones, project) = setup().await;

        let err = milestones
            .create_milestone(milestone_dto(project.id, -1))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);

        let free = milestones
            .create_milestone(milestone_dto(project.id, 0))
            .await
            .unwrap();
        assert_eq!(free.status, MilestoneStatus::Pending);
    }

    #[tokio::test]
    async fn review_cycle_transitions() {
        let (milestones, project) = setup().await;
        let m = milestones
            .create_milestone(milestone_dto(project.id, 50_000))
            .await
            .unwrap();

        assert_eq!(milestones.submit_milestone(m.id).await.unwrap().status, MilestoneStatus::Submitted);
        assert_eq!(
            milestones.request_revision(m.id).await.unwrap().status,
            MilestoneStatus::RevisionRequested
        );
        assert_eq!(milestones.approve_milestone(m.id).await.unwrap().status, MilestoneStatus::Approved);
        assert_eq!(milestones.complete_milestone(m.id).await.unwrap().status, MilestoneStatus::Completed);
    }

    #[tokio::test]
    async fn delivery_always_leaves_milestone_submitted() {
        let (milestones, project) = setup().await;
        let m = milestones
            .create_milestone(milestone_dto(project.id, 50_000))
            .await
            .unwrap();

        let (_, updated) = milestones.submit_delivery(delivery_dto(m.id)).await.unwrap();
        assert_eq!(updated.status, MilestoneStatus::Submitted);

        milestones.request_revision(m.id).await.unwrap();
        let (_, updated) = milestones.submit_delivery(delivery_dto(m.id)).await.unwrap();
        assert_eq!(updated.status, MilestoneStatus::Submitted);

        milestones.approve_milestone(m.id).await.unwrap();
        let (_, updated) = milestones.submit_delivery(delivery_dto(m.id)).await.unwrap();
        assert_eq!(updated.status, MilestoneStatus::Submitted);

        assert_eq!(milestones.deliveries_for_milestone(m.id).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn delivery_for_unknown_milestone_is_not_found() {
        let (milestones, _) = setup().await;
        let err = milestones
            .submit_delivery(delivery_dto(Uuid::new_v4()))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::MilestoneNotFound(_)));
    }

    #[tokio::test]
    async fn blank_file_url_is_rejected() {
        let (milestones, project) = setup().await;
        let m = milestones
            .create_milestone(milestone_dto(project.id, 10))
            .await
            .unwrap();

        let mut dto = delivery_dto(m.id);
        dto.file_url = "   ".to_string();
        let err = milestones.submit_delivery(dto).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(milestones.deliveries_for_milestone(m.id).await.unwrap().is_empty());
    }
}
