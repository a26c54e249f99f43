// Seed rows for the Postgres-backed repository tests.
use chrono::{Duration, Utc};
use uuid::Uuid;

use super::{db::DBClient, orderdb::OrderExt, servicedb::CatalogExt};
use crate::models::{ordermodels::*, projectmodels::*, servicemodels::*};

pub async fn seed_service(db: &DBClient) -> Service {
    db.create_service(NewService {
        creator_id: Uuid::new_v4(),
        title: "Wedding highlight reel".to_string(),
        description: "Three minute highlight cut".to_string(),
        category: VideoCategory::Advertisement,
        status: ServiceStatus::Active,
        packages: vec![ServicePackage {
            tier: PackageTier::Basic,
            title: "Basic cut".to_string(),
            description: String::new(),
            price: 50_000,
            delivery_days: 5,
            revisions: 1,
        }],
    })
    .await
    .unwrap()
}

pub fn new_order(service: &Service) -> NewOrder {
    NewOrder {
        service_id: service.id,
        buyer_id: Uuid::new_v4(),
        creator_id: service.creator_id,
        package_tier: PackageTier::Basic,
        price: 50_000,
        commission_rate_bps: 1_000,
        commission_amount: 5_000,
        seller_receives: 45_000,
        requirements: "Keep the vows audio".to_string(),
    }
}

pub async fn paid_order(db: &DBClient) -> Order {
    let service = seed_service(db).await;
    let order = db.create_order(new_order(&service)).await.unwrap();
    db.update_order(
        order.id,
        OrderPatch {
            expected_status: Some(OrderStatus::Pending),
            status: Some(OrderStatus::Paid),
            payment_key: Some(format!("escrow_{}", order.id)),
            ..Default::default()
        },
    )
    .await
    .unwrap()
    .unwrap()
}

pub fn plan_for(order: &Order) -> ProvisionPlan {
    let now = Utc::now();
    let milestone = |title: &str, amount: i64, days: i64| NewMilestone {
        project_id: Uuid::nil(),
        title: title.to_string(),
        description: String::new(),
        amount,
        due_date: now + Duration::days(days),
    };

    ProvisionPlan {
        order_id: order.id,
        project: NewProject {
            client_id: order.buyer_id,
            title: "[service order] Wedding highlight reel".to_string(),
            description: order.requirements.clone(),
            budget_min: order.price,
            budget_max: order.price,
            deadline: now + Duration::days(5),
            category: VideoCategory::Advertisement,
        },
        proposal: NewProposal {
            project_id: Uuid::nil(),
            creator_id: order.creator_id,
            cover_letter: "Auto-accepted package order".to_string(),
            delivery_days: 5,
            price: order.price,
            milestones: "Draft delivery, Final delivery".to_string(),
            revision_scope: "1 revision".to_string(),
            status: ProposalStatus::Accepted,
        },
        milestones: [
            milestone("Draft delivery", 22_500, 3),
            milestone("Final delivery", 22_500, 5),
        ],
    }
}
