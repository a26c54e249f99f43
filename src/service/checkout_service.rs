// service/checkout_service.rs
use std::sync::Arc;

use uuid::Uuid;
use validator::Validate;

use crate::{
    dtos::orderdtos::RefundOrderDto,
    models::{ordermodels::*, projectmodels::BridgeOutcome},
    service::{
        error::ServiceError,
        order_bridge::OrderBridge,
        order_service::OrderService,
        payment_provider::{
            EscrowSession, PaymentProvider, STATUS_CANCELED, STATUS_DONE, STATUS_RELEASED,
        },
    },
};

const CAPTURE_ROLLBACK_REASON: &str = "Order changed while the payment was being captured";

/// Drives an order through the escrow provider and hands paid orders to the
/// bridge. Only talks to the order lifecycle through `OrderService`.
#[derive(Debug, Clone)]
pub struct CheckoutService {
    order_service: Arc<OrderService>,
    order_bridge: Arc<OrderBridge>,
    payment_provider: Arc<dyn PaymentProvider>,
}

impl CheckoutService {
    pub fn new(
        order_service: Arc<OrderService>,
        order_bridge: Arc<OrderBridge>,
        payment_provider: Arc<dyn PaymentProvider>,
    ) -> Self {
        Self {
            order_service,
            order_bridge,
            payment_provider,
        }
    }

    /// Open an escrow for a pending order and pin its payment key on the
    /// order, which blocks cancellation from then on.
    pub async fn open_escrow(&self, order_id: Uuid) -> Result<EscrowSession, ServiceError> {
        let order = self.order_service.get_order(order_id).await?;
        if order.status != OrderStatus::Pending {
            return Err(ServiceError::InvalidOrderStatus(order_id, OrderStatus::Pending));
        }
        if order.payment_key.is_some() {
            return Err(ServiceError::EscrowOpen(order_id));
        }

        let description = format!("Order {} ({} package)", order.id, order.package_tier.to_str());
        let session = self
            .payment_provider
            .create_escrow(order.id, order.price, &description)
            .await?;

        self.order_service
            .attach_escrow(order.id, session.payment_key.clone())
            .await?;

        tracing::info!(
            "Escrow {} opened for order {} ({})",
            session.payment_key,
            order.id,
            session.status
        );

        Ok(session)
    }

    /// Capture the escrow, record the payment and provision the project.
    ///
    /// If the order cannot be marked paid after a successful capture the
    /// escrow is refunded. If provisioning fails the order stays `paid` and
    /// the reconciliation job picks it up again.
    pub async fn confirm_payment(
        &self,
        order_id: Uuid,
        payment_key: &str,
    ) -> Result<BridgeOutcome, ServiceError> {
        let order = self.order_service.get_order(order_id).await?;
        if order.status != OrderStatus::Pending {
            return Err(ServiceError::InvalidOrderStatus(order_id, OrderStatus::Pending));
        }
        if order.payment_key.as_deref().is_some_and(|key| key != payment_key) {
            return Err(ServiceError::Payment(format!(
                "Payment key does not belong to order {}",
                order_id
            )));
        }

        let status = self
            .payment_provider
            .confirm_escrow(payment_key, order.id, order.price)
            .await?;

        if status != STATUS_DONE {
            tracing::warn!("Payment for order {} not captured: {}", order_id, status);
            return Err(ServiceError::Payment(format!(
                "Payment was not completed (status {})",
                status
            )));
        }

        if let Err(e) = self
            .order_service
            .mark_paid(order_id, Some(payment_key.to_string()))
            .await
        {
            tracing::error!(
                "Order {} could not be marked paid after capture, refunding {}: {}",
                order_id,
                payment_key,
                e
            );
            match self
                .payment_provider
                .refund_escrow(payment_key, CAPTURE_ROLLBACK_REASON)
                .await
            {
                Ok(refund_status) if refund_status == STATUS_CANCELED => {}
                Ok(refund_status) => tracing::error!(
                    "Refund of {} for order {} returned {}",
                    payment_key,
                    order_id,
                    refund_status
                ),
                Err(refund_err) => tracing::error!(
                    "Refund of {} for order {} failed: {}",
                    payment_key,
                    order_id,
                    refund_err
                ),
            }
            return Err(e);
        }

        self.order_bridge.process_order(order_id).await.map_err(|e| {
            tracing::error!("Bridge failed for paid order {}: {}", order_id, e);
            e
        })
    }

    pub async fn refund_order(&self, dto: RefundOrderDto) -> Result<Order, ServiceError> {
        dto.validate()?;

        let order = self.order_service.get_order(dto.order_id).await?;

        if !order.status.can_transition_to(OrderStatus::Refunded) {
            return Err(ServiceError::InvalidOrderTransition {
                id: order.id,
                from: order.status,
                to: OrderStatus::Refunded,
            });
        }

        let payment_key = order
            .payment_key
            .as_deref()
            .ok_or_else(|| ServiceError::Payment(format!("Order {} has no payment key", order.id)))?;

        let status = self
            .payment_provider
            .refund_escrow(payment_key, dto.reason.trim())
            .await?;
        if status != STATUS_CANCELED {
            return Err(ServiceError::Payment(format!(
                "Refund was not completed (status {})",
                status
            )));
        }

        tracing::info!("Order {} refunded: {}", order.id, dto.reason.trim());
        self.order_service.mark_refunded(order.id).await
    }

    /// Pay the creator their share once the order is completed. The order is
    /// claimed before the provider call, so a payout is released at most once.
    pub async fn release_payout(&self, order_id: Uuid) -> Result<String, ServiceError> {
        let order = self.order_service.get_order(order_id).await?;
        if order.status != OrderStatus::Completed {
            return Err(ServiceError::InvalidOrderStatus(order_id, OrderStatus::Completed));
        }
        if order.payout_released_at.is_some() {
            return Err(ServiceError::PayoutAlreadyReleased(order_id));
        }

        let payment_key = order
            .payment_key
            .clone()
            .ok_or_else(|| ServiceError::Payment(format!("Order {} has no payment key", order_id)))?;

        let order = self
            .order_service
            .claim_payout(order_id)
            .await?
            .ok_or(ServiceError::PayoutAlreadyReleased(order_id))?;

        let released = match self
            .payment_provider
            .release_escrow(&payment_key, order.seller_receives)
            .await
        {
            Ok(status) if status == STATUS_RELEASED => Ok(status),
            Ok(status) => Err(ServiceError::Payment(format!(
                "Payout was not released (status {})",
                status
            ))),
            Err(e) => Err(e),
        };

        match released {
            Ok(status) => {
                tracing::info!(
                    "Released {} to creator {} for order {}",
                    order.seller_receives,
                    order.creator_id,
                    order_id
                );
                Ok(status)
            }
            Err(e) => {
                tracing::warn!("Payout for order {} failed, releasing claim: {}", order_id, e);
                self.order_service.clear_payout_claim(order_id).await?;
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use tokio::sync::Mutex;

    use crate::{
        db::MarketStore,
        dtos::orderdtos::CreateOrderDto,
        models::{projectmodels::ProjectStatus, servicemodels::PackageTier},
        service::{error::ErrorKind, payment_provider::MockPaymentProvider, testutil},
    };

    struct Fixture {
        checkout: CheckoutService,
        orders: Arc<OrderService>,
        store: Arc<dyn MarketStore>,
        order: Order,
    }

    async fn fixture_with(provider: Arc<dyn PaymentProvider>) -> Fixture {
        let store: Arc<dyn MarketStore> = testutil::store();
        let service = testutil::active_service(&store).await;
        let orders = Arc::new(OrderService::new(store.clone()));
        let bridge = Arc::new(OrderBridge::new(store.clone()));
        let checkout = CheckoutService::new(orders.clone(), bridge, provider);

        let order = orders
            .create_order(CreateOrderDto {
                service_id: service.id,
                buyer_id: Uuid::new_v4(),
                package_tier: PackageTier::Standard,
                requirements: "Product launch teaser".to_string(),
            })
            .await
            .unwrap();

        Fixture {
            checkout,
            orders,
            store,
            order,
        }
    }

    async fn fixture(provider: MockPaymentProvider) -> Fixture {
        fixture_with(Arc::new(provider)).await
    }

    fn refund(order_id: Uuid, reason: &str) -> RefundOrderDto {
        RefundOrderDto {
            order_id,
            reason: reason.to_string(),
        }
    }

    async fn paid(f: &Fixture) -> BridgeOutcome {
        let session = f.checkout.open_escrow(f.order.id).await.unwrap();
        f.checkout
            .confirm_payment(f.order.id, &session.payment_key)
            .await
            .unwrap()
    }

    /// What the buyer side does to the order while the capture is in flight.
    #[derive(Debug)]
    enum Interference {
        // Goes through the order lifecycle, which must refuse.
        Cancel(Arc<OrderService>),
        // Writes the row directly, as a cancel that read the order before the
        // escrow was attached would.
        ForceCancel(Arc<dyn MarketStore>),
    }

    #[derive(Debug)]
    struct InterferingProvider {
        inner: MockPaymentProvider,
        interference: Interference,
        cancel_result: Mutex<Option<Result<Order, ServiceError>>>,
    }

    impl InterferingProvider {
        fn new(interference: Interference) -> Self {
            Self {
                inner: MockPaymentProvider::new(),
                interference,
                cancel_result: Mutex::new(None),
            }
        }
    }

    #[async_trait]
    impl PaymentProvider for InterferingProvider {
        async fn create_escrow(
            &self,
            order_id: Uuid,
            amount: i64,
            description: &str,
        ) -> Result<EscrowSession, ServiceError> {
            self.inner.create_escrow(order_id, amount, description).await
        }

        async fn confirm_escrow(
            &self,
            payment_key: &str,
            order_id: Uuid,
            amount: i64,
        ) -> Result<String, ServiceError> {
            let status = self.inner.confirm_escrow(payment_key, order_id, amount).await?;

            let result = match &self.interference {
                Interference::Cancel(orders) => orders.cancel_order(order_id).await,
                Interference::ForceCancel(store) => store
                    .update_order(
                        order_id,
                        OrderPatch {
                            status: Some(OrderStatus::Cancelled),
                            ..Default::default()
                        },
                    )
                    .await
                    .map_err(ServiceError::from)
                    .and_then(|o| o.ok_or(ServiceError::OrderNotFound(order_id))),
            };
            *self.cancel_result.lock().await = Some(result);

            Ok(status)
        }

        async fn release_escrow(&self, payment_key: &str, amount: i64) -> Result<String, ServiceError> {
            self.inner.release_escrow(payment_key, amount).await
        }

        async fn refund_escrow(&self, payment_key: &str, reason: &str) -> Result<String, ServiceError> {
            self.inner.refund_escrow(payment_key, reason).await
        }
    }

    #[tokio::test]
    async fn confirmed_payment_runs_the_bridge() {
        let f = fixture(MockPaymentProvider::new()).await;

        let session = f.checkout.open_escrow(f.order.id).await.unwrap();
        let outcome = f
            .checkout
            .confirm_payment(f.order.id, &session.payment_key)
            .await
            .unwrap();

        assert_eq!(outcome.order.status, OrderStatus::ProjectCreated);
        assert_eq!(outcome.order.payment_key.as_deref(), Some(session.payment_key.as_str()));
        assert_eq!(outcome.order.project_id, Some(outcome.project.id));
        assert_eq!(
            outcome.milestones.iter().map(|m| m.amount).sum::<i64>(),
            outcome.order.seller_receives
        );
    }

    #[tokio::test]
    async fn open_escrow_pins_the_payment_key() {
        let f = fixture(MockPaymentProvider::new()).await;

        let session = f.checkout.open_escrow(f.order.id).await.unwrap();
        let order = f.orders.get_order(f.order.id).await.unwrap();
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.payment_key.as_deref(), Some(session.payment_key.as_str()));

        let err = f.checkout.open_escrow(f.order.id).await.unwrap_err();
        assert!(matches!(err, ServiceError::EscrowOpen(_)));

        let err = f
            .checkout
            .confirm_payment(f.order.id, "mock_someone_elses_key")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Payment);
    }

    #[tokio::test]
    async fn cancel_during_capture_is_refused() {
        let store = testutil::store();
        let service = testutil::active_service(&store).await;
        let orders = Arc::new(OrderService::new(store.clone()));
        let provider = Arc::new(InterferingProvider::new(Interference::Cancel(orders.clone())));
        let checkout = CheckoutService::new(
            orders.clone(),
            Arc::new(OrderBridge::new(store.clone())),
            provider.clone(),
        );
        let order = orders
            .create_order(CreateOrderDto {
                service_id: service.id,
                buyer_id: Uuid::new_v4(),
                package_tier: PackageTier::Basic,
                requirements: String::new(),
            })
            .await
            .unwrap();

        let session = checkout.open_escrow(order.id).await.unwrap();
        let outcome = checkout
            .confirm_payment(order.id, &session.payment_key)
            .await
            .unwrap();

        let cancel = provider.cancel_result.lock().await.take().unwrap();
        assert!(matches!(cancel, Err(ServiceError::EscrowOpen(_))));
        assert_eq!(outcome.order.status, OrderStatus::ProjectCreated);
        assert_eq!(outcome.order.payment_key.as_deref(), Some(session.payment_key.as_str()));
    }

    #[tokio::test]
    async fn capture_is_refunded_when_order_moved_underneath() {
        let store = testutil::store();
        let service = testutil::active_service(&store).await;
        let orders = Arc::new(OrderService::new(store.clone()));
        let provider = Arc::new(InterferingProvider::new(Interference::ForceCancel(
            store.clone(),
        )));
        let checkout = CheckoutService::new(
            orders.clone(),
            Arc::new(OrderBridge::new(store.clone())),
            provider.clone(),
        );
        let order = orders
            .create_order(CreateOrderDto {
                service_id: service.id,
                buyer_id: Uuid::new_v4(),
                package_tier: PackageTier::Basic,
                requirements: String::new(),
            })
            .await
            .unwrap();

        let session = checkout.open_escrow(order.id).await.unwrap();
        let err = checkout
            .confirm_payment(order.id, &session.payment_key)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            ServiceError::InvalidOrderTransition {
                from: OrderStatus::Cancelled,
                to: OrderStatus::Paid,
                ..
            }
        ));
        assert_eq!(
            provider.inner.escrow_status(&session.payment_key).await.as_deref(),
            Some(STATUS_CANCELED)
        );
        let order = orders.get_order(order.id).await.unwrap();
        assert_eq!(order.status, OrderStatus::Cancelled);
    }

    #[tokio::test]
    async fn declined_payment_leaves_order_pending() {
        let f = fixture(MockPaymentProvider::declining()).await;

        let session = f.checkout.open_escrow(f.order.id).await.unwrap();
        let err = f
            .checkout
            .confirm_payment(f.order.id, &session.payment_key)
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Payment);
        let order = f.orders.get_order(f.order.id).await.unwrap();
        assert_eq!(order.status, OrderStatus::Pending);
    }

    #[tokio::test]
    async fn refund_requires_an_escrowed_order() {
        let f = fixture(MockPaymentProvider::new()).await;

        let err = f
            .checkout
            .refund_order(refund(f.order.id, "changed my mind"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidState);

        let err = f.checkout.refund_order(refund(f.order.id, "  ")).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[tokio::test]
    async fn refund_after_bridge_cancels_the_project() {
        let f = fixture(MockPaymentProvider::new()).await;
        let outcome = paid(&f).await;
        f.orders.mark_in_progress(f.order.id).await.unwrap();

        let refunded = f
            .checkout
            .refund_order(refund(f.order.id, "creator unavailable"))
            .await
            .unwrap();

        assert_eq!(refunded.status, OrderStatus::Refunded);
        assert!(refunded.project_id.is_none());
        assert!(!refunded.status.has_project());

        let project = f.store.get_project_by_id(outcome.project.id).await.unwrap().unwrap();
        assert_eq!(project.status, ProjectStatus::Cancelled);

        let err = f
            .checkout
            .refund_order(refund(f.order.id, "again"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidState);
    }

    #[tokio::test]
    async fn payout_only_after_completion_and_only_once() {
        let f = fixture(MockPaymentProvider::new()).await;
        paid(&f).await;

        let err = f.checkout.release_payout(f.order.id).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidState);

        f.orders.mark_in_progress(f.order.id).await.unwrap();
        f.orders.mark_completed(f.order.id).await.unwrap();

        let status = f.checkout.release_payout(f.order.id).await.unwrap();
        assert_eq!(status, STATUS_RELEASED);

        let order = f.orders.get_order(f.order.id).await.unwrap();
        assert!(order.payout_released_at.is_some());

        let err = f.checkout.release_payout(f.order.id).await.unwrap_err();
        assert!(matches!(err, ServiceError::PayoutAlreadyReleased(_)));
        assert_eq!(err.kind(), ErrorKind::InvalidState);
    }

    #[tokio::test]
    async fn concurrent_payouts_release_once() {
        let f = fixture(MockPaymentProvider::new()).await;
        paid(&f).await;
        f.orders.mark_in_progress(f.order.id).await.unwrap();
        f.orders.mark_completed(f.order.id).await.unwrap();

        let (a, b) = tokio::join!(
            f.checkout.release_payout(f.order.id),
            f.checkout.release_payout(f.order.id)
        );
        assert_eq!([a.is_ok(), b.is_ok()].iter().filter(|ok| **ok).count(), 1);
    }

    #[tokio::test]
    async fn escrow_only_opens_for_pending_orders() {
        let f = fixture(MockPaymentProvider::new()).await;
        f.orders.cancel_order(f.order.id).await.unwrap();

        let err = f.checkout.open_escrow(f.order.id).await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidOrderStatus(_, OrderStatus::Pending)));
    }
}
