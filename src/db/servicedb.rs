// db/servicedb.rs
use async_trait::async_trait;
use sqlx::{types::Json, Error};
use uuid::Uuid;

use super::db::DBClient;
use crate::models::servicemodels::*;

#[async_trait]
pub trait CatalogExt {
    async fn create_service(&self, service: NewService) -> Result<Service, Error>;

    async fn get_service(&self, service_id: Uuid) -> Result<Option<Service>, Error>;

    async fn update_service_status(
        &self,
        service_id: Uuid,
        status: ServiceStatus,
    ) -> Result<Service, Error>;

    async fn update_service_stats(
        &self,
        service_id: Uuid,
        stat: ServiceStat,
        delta: i32,
    ) -> Result<(), Error>;
}

#[async_trait]
impl CatalogExt for DBClient {
    async fn create_service(&self, service: NewService) -> Result<Service, Error> {
        sqlx::query_as::<_, Service>(
            r#"
            INSERT INTO services (creator_id, title, description, category, status, packages)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(service.creator_id)
        .bind(service.title)
        .bind(service.description)
        .bind(service.category)
        .bind(service.status)
        .bind(Json(service.packages))
        .fetch_one(&self.pool)
        .await
    }

    async fn get_service(&self, service_id: Uuid) -> Result<Option<Service>, Error> {
        sqlx::query_as::<_, Service>("SELECT * FROM services WHERE id = $1")
            .bind(service_id)
            .fetch_optional(&self.pool)
            .await
    }

    async fn update_service_status(
        &self,
        service_id: Uuid,
        status: ServiceStatus,
    ) -> Result<Service, Error> {
        sqlx::query_as::<_, Service>(
            "UPDATE services SET status = $2, updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(service_id)
        .bind(status)
        .fetch_one(&self.pool)
        .await
    }

    async fn update_service_stats(
        &self,
        service_id: Uuid,
        stat: ServiceStat,
        delta: i32,
    ) -> Result<(), Error> {
        // Column names come from a closed enum, never from input.
        let query = format!(
            "UPDATE services SET {col} = {col} + $2 WHERE id = $1",
            col = stat.column()
        );

        let result = sqlx::query(&query)
            .bind(service_id)
            .bind(delta)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(Error::RowNotFound);
        }
        Ok(())
    }
}
