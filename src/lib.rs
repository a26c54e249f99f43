pub mod config;
pub mod db;
pub mod dtos;
pub mod models;
pub mod service;

use std::sync::Arc;

use config::Config;
use db::MarketStore;
use service::{
    catalog_service::CatalogService,
    checkout_service::CheckoutService,
    dispute_service::DisputeService,
    milestone_service::MilestoneService,
    order_bridge::OrderBridge,
    order_service::OrderService,
    payment_provider::PaymentProvider,
    proposal_service::ProposalService,
    review_service::ReviewService,
};

#[derive(Debug, Clone)]
pub struct AppState {
    pub env: Config,
    pub db_client: Arc<dyn MarketStore>,
    pub payment_provider: Arc<dyn PaymentProvider>,

    // Services
    pub catalog_service: Arc<CatalogService>,
    pub order_service: Arc<OrderService>,
    pub order_bridge: Arc<OrderBridge>,
    pub proposal_service: Arc<ProposalService>,
    pub milestone_service: Arc<MilestoneService>,
    pub review_service: Arc<ReviewService>,
    pub dispute_service: Arc<DisputeService>,
    pub checkout_service: Arc<CheckoutService>,
}

impl AppState {
    pub fn new(
        db_client: Arc<dyn MarketStore>,
        payment_provider: Arc<dyn PaymentProvider>,
        config: Config,
    ) -> Self {
        let catalog_service = Arc::new(CatalogService::new(db_client.clone()));
        let order_service = Arc::new(OrderService::new(db_client.clone()));
        let order_bridge = Arc::new(OrderBridge::new(db_client.clone()));
        let proposal_service = Arc::new(ProposalService::new(db_client.clone()));
        let milestone_service = Arc::new(MilestoneService::new(db_client.clone()));
        let review_service = Arc::new(ReviewService::new(db_client.clone()));
        let dispute_service = Arc::new(DisputeService::new(db_client.clone()));

        let checkout_service = Arc::new(CheckoutService::new(
            order_service.clone(),
            order_bridge.clone(),
            payment_provider.clone(),
        ));

        Self {
            env: config,
            db_client,
            payment_provider,
            catalog_service,
            order_service,
            order_bridge,
            proposal_service,
            milestone_service,
            review_service,
            dispute_service,
            checkout_service,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        db::memorydb::MemoryStore,
        dtos::{orderdtos::CreateOrderDto, servicedtos::*},
        models::{ordermodels::OrderStatus, projectmodels::*, servicemodels::*},
        service::payment_provider::MockPaymentProvider,
    };
    use uuid::Uuid;

    fn app_state() -> AppState {
        let config = Config::from_lookup(|name| {
            (name == "DATABASE_URL").then(|| "postgres://localhost/reels".to_string())
        })
        .unwrap();
        AppState::new(
            Arc::new(MemoryStore::new()),
            Arc::new(MockPaymentProvider::new()),
            config,
        )
    }

    #[tokio::test]
    async fn listing_to_delivered_order() {
        let app = app_state();
        let creator_id = Uuid::new_v4();

        let service = app
            .catalog_service
            .create_service(CreateServiceDto {
                creator_id,
                title: "Wedding highlight reel".to_string(),
                description: "Three minute cinematic cut".to_string(),
                category: VideoCategory::Film,
                packages: vec![PackageDto {
                    tier: PackageTier::Basic,
                    title: "Highlights".to_string(),
                    description: String::new(),
                    price: 100_001,
                    delivery_days: 10,
                    revisions: 2,
                }],
            })
            .await
            .unwrap();
        app.catalog_service.publish_service(service.id).await.unwrap();

        let order = app
            .order_service
            .create_order(CreateOrderDto {
                service_id: service.id,
                buyer_id: Uuid::new_v4(),
                package_tier: PackageTier::Basic,
                requirements: String::new(),
            })
            .await
            .unwrap();
        assert_eq!(order.commission_amount, 12_000);
        assert_eq!(order.seller_receives, 88_001);

        let session = app.checkout_service.open_escrow(order.id).await.unwrap();
        let outcome = app
            .checkout_service
            .confirm_payment(order.id, &session.payment_key)
            .await
            .unwrap();

        let milestones = app
            .milestone_service
            .milestones_for_project(outcome.project.id)
            .await
            .unwrap();
        assert_eq!(milestones.len(), 2);
        assert_eq!(milestones[0].amount, 44_000);
        assert_eq!(milestones[1].amount, 44_001);
        assert_eq!(outcome.proposal.status, ProposalStatus::Accepted);

        app.order_service.mark_in_progress(order.id).await.unwrap();
        app.order_service.mark_completed(order.id).await.unwrap();
        let reviewed = app.order_service.mark_reviewed(order.id).await.unwrap();
        assert_eq!(reviewed.status, OrderStatus::Reviewed);

        let service = app.catalog_service.get_service(service.id).await.unwrap();
        assert_eq!(service.order_count, 1);
        assert_eq!(service.completed_count, 1);
    }
}
