// db/orderdb.rs
use async_trait::async_trait;
use sqlx::Error;
use uuid::Uuid;

use super::db::DBClient;
use crate::models::ordermodels::*;

#[async_trait]
pub trait OrderExt {
    /// Inserts the order and bumps the service's order counter together.
    async fn create_order(&self, order: NewOrder) -> Result<Order, Error>;

    async fn get_order_by_id(&self, order_id: Uuid) -> Result<Option<Order>, Error>;

    async fn get_orders_by_buyer(&self, buyer_id: Uuid) -> Result<Vec<Order>, Error>;

    async fn get_orders_by_creator(&self, creator_id: Uuid) -> Result<Vec<Order>, Error>;

    async fn get_orders_by_status(
        &self,
        status: OrderStatus,
        limit: i64,
    ) -> Result<Vec<Order>, Error>;

    /// Returns `None` when `patch.expected_status` no longer matches the row.
    async fn update_order(&self, order_id: Uuid, patch: OrderPatch) -> Result<Option<Order>, Error>;

    /// Stamp `payout_released_at` on a completed order that has not been paid
    /// out yet. `None` if the order is not completed or was already claimed.
    async fn claim_payout(&self, order_id: Uuid) -> Result<Option<Order>, Error>;

    /// Undo a payout claim after the provider refused the release.
    async fn clear_payout_claim(&self, order_id: Uuid) -> Result<(), Error>;
}

#[async_trait]
impl OrderExt for DBClient {
    async fn create_order(&self, order: NewOrder) -> Result<Order, Error> {
        let mut tx = self.pool.begin().await?;

        let created = sqlx::query_as::<_, Order>(
            r#"
            INSERT INTO service_orders (
                service_id, buyer_id, creator_id, package_tier, price,
                commission_rate_bps, commission_amount, seller_receives,
                requirements, status
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, 'pending')
            RETURNING *
            "#,
        )
        .bind(order.service_id)
        .bind(order.buyer_id)
        .bind(order.creator_id)
        .bind(order.package_tier)
        .bind(order.price)
        .bind(order.commission_rate_bps)
        .bind(order.commission_amount)
        .bind(order.seller_receives)
        .bind(order.requirements)
        .fetch_one(&mut *tx)
        .await?;

        let counted = sqlx::query(
            "UPDATE services SET order_count = order_count + 1, updated_at = NOW() WHERE id = $1",
        )
        .bind(created.service_id)
        .execute(&mut *tx)
        .await?;

        if counted.rows_affected() == 0 {
            tx.rollback().await?;
            return Err(Error::RowNotFound);
        }

        tx.commit().await?;
        Ok(created)
    }

    async fn get_order_by_id(&self, order_id: Uuid) -> Result<Option<Order>, Error> {
        sqlx::query_as::<_, Order>("SELECT * FROM service_orders WHERE id = $1")
            .bind(order_id)
            .fetch_optional(&self.pool)
            .await
    }

    async fn get_orders_by_buyer(&self, buyer_id: Uuid) -> Result<Vec<Order>, Error> {
        sqlx::query_as::<_, Order>(
            "SELECT * FROM service_orders WHERE buyer_id = $1 ORDER BY created_at DESC",
        )
        .bind(buyer_id)
        .fetch_all(&self.pool)
        .await
    }

    async fn get_orders_by_creator(&self, creator_id: Uuid) -> Result<Vec<Order>, Error> {
        sqlx::query_as::<_, Order>(
            "SELECT * FROM service_orders WHERE creator_id = $1 ORDER BY created_at DESC",
        )
        .bind(creator_id)
        .fetch_all(&self.pool)
        .await
    }

    async fn get_orders_by_status(
        &self,
        status: OrderStatus,
        limit: i64,
    ) -> Result<Vec<Order>, Error> {
        sqlx::query_as::<_, Order>(
            "SELECT * FROM service_orders WHERE status = $1 ORDER BY updated_at ASC LIMIT $2",
        )
        .bind(status)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
    }

    async fn update_order(&self, order_id: Uuid, patch: OrderPatch) -> Result<Option<Order>, Error> {
        sqlx::query_as::<_, Order>(
            r#"
            UPDATE service_orders
            SET status = COALESCE($3, status),
                project_id = COALESCE($4, project_id),
                payment_key = COALESCE($5, payment_key),
                paid_at = CASE WHEN $3 = 'paid'::order_status THEN NOW() ELSE paid_at END,
                updated_at = NOW()
            WHERE id = $1
            AND ($2::order_status IS NULL OR status = $2)
            RETURNING *
            "#,
        )
        .bind(order_id)
        .bind(patch.expected_status)
        .bind(patch.status)
        .bind(patch.project_id)
        .bind(patch.payment_key)
        .fetch_optional(&self.pool)
        .await
    }

    async fn claim_payout(&self, order_id: Uuid) -> Result<Option<Order>, Error> {
        sqlx::query_as::<_, Order>(
            r#"
            UPDATE service_orders
            SET payout_released_at = NOW(), updated_at = NOW()
            WHERE id = $1
            AND status = 'completed'
            AND payout_released_at IS NULL
            RETURNING *
            "#,
        )
        .bind(order_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn clear_payout_claim(&self, order_id: Uuid) -> Result<(), Error> {
        sqlx::query(
            "UPDATE service_orders SET payout_released_at = NULL, updated_at = NOW() WHERE id = $1",
        )
        .bind(order_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
