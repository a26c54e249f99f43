// service/review_service.rs
use std::sync::Arc;

use uuid::Uuid;
use validator::Validate;

use crate::{
    db::MarketStore,
    dtos::feedbackdtos::CreateReviewDto,
    models::feedbackmodels::*,
    service::error::ServiceError,
};

#[derive(Debug, Clone)]
pub struct ReviewService {
    db_client: Arc<dyn MarketStore>,
}

impl ReviewService {
    pub fn new(db_client: Arc<dyn MarketStore>) -> Self {
        Self { db_client }
    }

    pub async fn create_review(&self, dto: CreateReviewDto) -> Result<Review, ServiceError> {
        dto.validate()?;

        self.db_client
            .get_project_by_id(dto.project_id)
            .await?
            .ok_or(ServiceError::ProjectNotFound(dto.project_id))?;

        let review = self
            .db_client
            .create_review(NewReview {
                project_id: dto.project_id,
                reviewer_id: dto.reviewer_id,
                reviewee_id: dto.reviewee_id,
                rating: dto.rating,
                comment: dto.comment.trim().to_string(),
            })
            .await?;

        tracing::info!(
            "Review {} ({} stars) left for {} on project {}",
            review.id,
            review.rating,
            review.reviewee_id,
            review.project_id
        );

        Ok(review)
    }

    pub async fn reviews_for_project(&self, project_id: Uuid) -> Result<Vec<Review>, ServiceError> {
        Ok(self.db_client.get_project_reviews(project_id).await?)
    }

    pub async fn reviews_for_user(&self, user_id: Uuid) -> Result<Vec<Review>, ServiceError> {
        Ok(self.db_client.get_user_reviews(user_id).await?)
    }

    /// Mean rating received by `user_id`, `None` until the first review lands.
    pub async fn average_rating(&self, user_id: Uuid) -> Result<Option<f64>, ServiceError> {
        let reviews = self.db_client.get_user_reviews(user_id).await?;
        if reviews.is_empty() {
            return Ok(None);
        }

        let total: i64 = reviews.iter().map(|r| r.rating as i64).sum();
        Ok(Some(total as f64 / reviews.len() as f64))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::{error::ErrorKind, testutil};

    fn review_dto(project_id: Uuid, reviewee_id: Uuid, rating: i32, comment: &str) -> CreateReviewDto {
        CreateReviewDto {
            project_id,
            reviewer_id: Uuid::new_v4(),
            reviewee_id,
            rating,
            comment: comment.to_string(),
        }
    }

    #[tokio::test]
    async fn rating_bounds() {
        let store = testutil::store();
        let project = testutil::open_project(&store).await;
        let reviews = ReviewService::new(store);
        let creator = Uuid::new_v4();

        for rating in [0, 6, -1] {
            let err = reviews
                .create_review(review_dto(project.id, creator, rating, "ok"))
                .await
                .unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Validation);
        }

        for rating in [1, 5] {
            let review = reviews
                .create_review(review_dto(project.id, creator, rating, "Delivered on time"))
                .await
                .unwrap();
            assert_eq!(review.rating, rating);
        }

        assert_eq!(reviews.reviews_for_project(project.id).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn whitespace_comment_is_rejected() {
        let store = testutil::store();
        let project = testutil::open_project(&store).await;
        let reviews = ReviewService::new(store);

        let err = reviews
            .create_review(review_dto(project.id, Uuid::new_v4(), 4, " \t\n "))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(reviews.reviews_for_project(project.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn unknown_project_is_not_found() {
        let reviews = ReviewService::new(testutil::store());
        let err = reviews
            .create_review(review_dto(Uuid::new_v4(), Uuid::new_v4(), 5, "Great"))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::ProjectNotFound(_)));
    }

    #[tokio::test]
    async fn average_rating_per_reviewee() {
        let store = testutil::store();
        let project = testutil::open_project(&store).await;
        let reviews = ReviewService::new(store);
        let creator = Uuid::new_v4();

        assert_eq!(reviews.average_rating(creator).await.unwrap(), None);

        for rating in [5, 4, 4] {
            reviews
                .create_review(review_dto(project.id, creator, rating, "Solid work"))
                .await
                .unwrap();
        }
        reviews
            .create_review(review_dto(project.id, Uuid::new_v4(), 1, "Someone else"))
            .await
            .unwrap();

        let average = reviews.average_rating(creator).await.unwrap().unwrap();
        assert!((average - 13.0 / 3.0).abs() < 1e-9);
        assert_eq!(reviews.reviews_for_user(creator).await.unwrap().len(), 3);
    }
}
