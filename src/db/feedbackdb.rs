// db/feedbackdb.rs
use async_trait::async_trait;
use sqlx::Error;
use uuid::Uuid;

use super::db::DBClient;
use crate::models::feedbackmodels::*;

#[async_trait]
pub trait FeedbackExt {
    async fn create_review(&self, review: NewReview) -> Result<Review, Error>;

    async fn get_project_reviews(&self, project_id: Uuid) -> Result<Vec<Review>, Error>;

    async fn get_user_reviews(&self, reviewee_id: Uuid) -> Result<Vec<Review>, Error>;

    async fn create_dispute(&self, dispute: NewDispute) -> Result<Dispute, Error>;

    async fn get_dispute_by_id(&self, dispute_id: Uuid) -> Result<Option<Dispute>, Error>;

    async fn get_project_disputes(&self, project_id: Uuid) -> Result<Vec<Dispute>, Error>;

    async fn update_dispute_status(
        &self,
        dispute_id: Uuid,
        status: DisputeStatus,
        resolution: Option<String>,
    ) -> Result<Dispute, Error>;
}

#[async_trait]
impl FeedbackExt for DBClient {
    async fn create_review(&self, review: NewReview) -> Result<Review, Error> {
        sqlx::query_as::<_, Review>(
            r#"
            INSERT INTO reviews (project_id, reviewer_id, reviewee_id, rating, comment)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(review.project_id)
        .bind(review.reviewer_id)
        .bind(review.reviewee_id)
        .bind(review.rating)
        .bind(review.comment)
        .fetch_one(&self.pool)
        .await
    }

    async fn get_project_reviews(&self, project_id: Uuid) -> Result<Vec<Review>, Error> {
        sqlx::query_as::<_, Review>(
            "SELECT * FROM reviews WHERE project_id = $1 ORDER BY created_at DESC",
        )
        .bind(project_id)
        .fetch_all(&self.pool)
        .await
    }

    async fn get_user_reviews(&self, reviewee_id: Uuid) -> Result<Vec<Review>, Error> {
        sqlx::query_as::<_, Review>(
            "SELECT * FROM reviews WHERE reviewee_id = $1 ORDER BY created_at DESC",
        )
        .bind(reviewee_id)
        .fetch_all(&self.pool)
        .await
    }

    async fn create_dispute(&self, dispute: NewDispute) -> Result<Dispute, Error> {
        sqlx::query_as::<_, Dispute>(
            r#"
            INSERT INTO disputes (project_id, raised_by, reason, evidence, status)
            VALUES ($1, $2, $3, $4, 'open')
            RETURNING *
            "#,
        )
        .bind(dispute.project_id)
        .bind(dispute.raised_by)
        .bind(dispute.reason)
        .bind(dispute.evidence)
        .fetch_one(&self.pool)
        .await
    }

    async fn get_dispute_by_id(&self, dispute_id: Uuid) -> Result<Option<Dispute>, Error> {
        sqlx::query_as::<_, Dispute>("SELECT * FROM disputes WHERE id = $1")
            .bind(dispute_id)
            .fetch_optional(&self.pool)
            .await
    }

    async fn get_project_disputes(&self, project_id: Uuid) -> Result<Vec<Dispute>, Error> {
        sqlx::query_as::<_, Dispute>(
            "SELECT * FROM disputes WHERE project_id = $1 ORDER BY created_at DESC",
        )
        .bind(project_id)
        .fetch_all(&self.pool)
        .await
    }

    async fn update_dispute_status(
        &self,
        dispute_id: Uuid,
        status: DisputeStatus,
        resolution: Option<String>,
    ) -> Result<Dispute, Error> {
        sqlx::query_as::<_, Dispute>(
            r#"
            UPDATE disputes
            SET status = $2,
                resolution = COALESCE($3, resolution),
                resolved_at = CASE WHEN $2 = 'resolved'::dispute_status THEN NOW() ELSE resolved_at END,
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(dispute_id)
        .bind(status)
        .bind(resolution)
        .fetch_one(&self.pool)
        .await
    }
}
