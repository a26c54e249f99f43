// service/order_service.rs
use std::sync::Arc;

use uuid::Uuid;
use validator::Validate;

use crate::{
    db::MarketStore,
    dtos::orderdtos::CreateOrderDto,
    models::{ordermodels::*, servicemodels::*},
    service::{commission::calculate_commission, error::ServiceError},
};

#[derive(Debug, Clone)]
pub struct OrderService {
    db_client: Arc<dyn MarketStore>,
}

impl OrderService {
    pub fn new(db_client: Arc<dyn MarketStore>) -> Self {
        Self { db_client }
    }

    /// Validate a package purchase, price it and persist the order as `pending`.
    pub async fn create_order(&self, dto: CreateOrderDto) -> Result<Order, ServiceError> {
        dto.validate()?;

        let service = self
            .db_client
            .get_service(dto.service_id)
            .await?
            .ok_or(ServiceError::ServiceNotFound(dto.service_id))?;

        if service.status != ServiceStatus::Active {
            return Err(ServiceError::ServiceUnavailable(service.id, service.status));
        }

        let package = service
            .package(dto.package_tier)
            .ok_or(ServiceError::PackageNotFound(service.id, dto.package_tier))?;

        if dto.buyer_id == service.creator_id {
            return Err(ServiceError::SelfPurchase(dto.buyer_id, service.id));
        }

        let commission = calculate_commission(package.price)?;

        let order = self
            .db_client
            .create_order(NewOrder {
                service_id: service.id,
                buyer_id: dto.buyer_id,
                creator_id: service.creator_id,
                package_tier: package.tier,
                price: package.price,
                commission_rate_bps: commission.rate_bps,
                commission_amount: commission.commission_amount,
                seller_receives: commission.seller_receives,
                requirements: dto.requirements,
            })
            .await?;

        tracing::info!(
            "Order {} created for service {} ({}): price {}, commission {}",
            order.id,
            service.id,
            package.tier.to_str(),
            order.price,
            order.commission_amount
        );

        Ok(order)
    }

    pub async fn get_order(&self, order_id: Uuid) -> Result<Order, ServiceError> {
        self.db_client
            .get_order_by_id(order_id)
            .await?
            .ok_or(ServiceError::OrderNotFound(order_id))
    }

    pub async fn orders_for_buyer(&self, buyer_id: Uuid) -> Result<Vec<Order>, ServiceError> {
        Ok(self.db_client.get_orders_by_buyer(buyer_id).await?)
    }

    pub async fn orders_for_creator(&self, creator_id: Uuid) -> Result<Vec<Order>, ServiceError> {
        Ok(self.db_client.get_orders_by_creator(creator_id).await?)
    }

    pub async fn mark_paid(
        &self,
        order_id: Uuid,
        payment_key: Option<String>,
    ) -> Result<Order, ServiceError> {
        self.transition(
            order_id,
            OrderStatus::Paid,
            OrderPatch {
                payment_key,
                ..Default::default()
            },
        )
        .await
    }

    pub async fn mark_project_created(
        &self,
        order_id: Uuid,
        project_id: Uuid,
    ) -> Result<Order, ServiceError> {
        self.transition(
            order_id,
            OrderStatus::ProjectCreated,
            OrderPatch {
                project_id: Some(project_id),
                ..Default::default()
            },
        )
        .await
    }

    pub async fn mark_in_progress(&self, order_id: Uuid) -> Result<Order, ServiceError> {
        self.transition(order_id, OrderStatus::InProgress, OrderPatch::default())
            .await
    }

    pub async fn mark_completed(&self, order_id: Uuid) -> Result<Order, ServiceError> {
        let order = self
            .transition(order_id, OrderStatus::Completed, OrderPatch::default())
            .await?;

        self.db_client
            .update_service_stats(order.service_id, ServiceStat::CompletedCount, 1)
            .await?;

        Ok(order)
    }

    pub async fn mark_reviewed(&self, order_id: Uuid) -> Result<Order, ServiceError> {
        self.transition(order_id, OrderStatus::Reviewed, OrderPatch::default())
            .await
    }

    /// Record a refund the payment provider has already carried out.
    ///
    /// A bridged order loses its `project_id` and the project is cancelled.
    pub async fn mark_refunded(&self, order_id: Uuid) -> Result<Order, ServiceError> {
        let order = self.get_order(order_id).await?;
        let rejected = ServiceError::InvalidOrderTransition {
            id: order_id,
            from: order.status,
            to: OrderStatus::Refunded,
        };

        if !order.status.can_transition_to(OrderStatus::Refunded) {
            tracing::warn!(
                "Rejected order {} transition {} -> refunded",
                order_id,
                order.status.to_str()
            );
            return Err(rejected);
        }

        let refunded = self
            .db_client
            .record_refund(order_id, order.status)
            .await?
            .ok_or(rejected)?;

        tracing::info!(
            "Order {} refunded from {} (project {:?} cancelled)",
            order_id,
            order.status.to_str(),
            order.project_id
        );

        Ok(refunded)
    }

    /// Remember the escrow opened for a pending order. From here on the order
    /// can only leave `pending` through payment or a refund.
    pub async fn attach_escrow(&self, order_id: Uuid, payment_key: String) -> Result<Order, ServiceError> {
        self.db_client
            .update_order(
                order_id,
                OrderPatch {
                    expected_status: Some(OrderStatus::Pending),
                    payment_key: Some(payment_key),
                    ..Default::default()
                },
            )
            .await?
            .ok_or(ServiceError::InvalidOrderStatus(order_id, OrderStatus::Pending))
    }

    /// Mark a completed order's payout as released. `None` if another caller
    /// got there first or the order is not completed.
    pub async fn claim_payout(&self, order_id: Uuid) -> Result<Option<Order>, ServiceError> {
        Ok(self.db_client.claim_payout(order_id).await?)
    }

    pub async fn clear_payout_claim(&self, order_id: Uuid) -> Result<(), ServiceError> {
        Ok(self.db_client.clear_payout_claim(order_id).await?)
    }

    pub async fn cancel_order(&self, order_id: Uuid) -> Result<Order, ServiceError> {
        let order = self.get_order(order_id).await?;
        if order.status != OrderStatus::Pending {
            return Err(ServiceError::InvalidOrderStatus(order_id, OrderStatus::Pending));
        }
        if order.payment_key.is_some() {
            return Err(ServiceError::EscrowOpen(order_id));
        }

        self.transition(order_id, OrderStatus::Cancelled, OrderPatch::default())
            .await
    }

    async fn transition(
        &self,
        order_id: Uuid,
        to: OrderStatus,
        mut patch: OrderPatch,
    ) -> Result<Order, ServiceError> {
        let order = self.get_order(order_id).await?;

        if !order.status.can_transition_to(to) {
            tracing::warn!(
                "Rejected order {} transition {} -> {}",
                order_id,
                order.status.to_str(),
                to.to_str()
            );
            return Err(ServiceError::InvalidOrderTransition {
                id: order_id,
                from: order.status,
                to,
            });
        }

        patch.expected_status = Some(order.status);
        patch.status = Some(to);

        let updated = self
            .db_client
            .update_order(order_id, patch)
            .await?
            // Someone else moved the order between our read and write.
            .ok_or(ServiceError::InvalidOrderTransition {
                id: order_id,
                from: order.status,
                to,
            })?;

        tracing::info!(
            "Order {} moved {} -> {}",
            order_id,
            order.status.to_str(),
            to.to_str()
        );

        Ok(updated)
    }
}
