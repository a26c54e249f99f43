// Shared fixtures for the service tests.
use std::sync::Arc;

use chrono::{Duration, Utc};
use uuid::Uuid;

use crate::{
    db::{memorydb::MemoryStore, MarketStore},
    models::{
        projectmodels::{NewProject, Project},
        servicemodels::*,
    },
};

pub fn store() -> Arc<dyn MarketStore> {
    Arc::new(MemoryStore::new())
}

pub fn package(tier: PackageTier, price: i64, delivery_days: i32, revisions: i32) -> ServicePackage {
    ServicePackage {
        tier,
        title: format!("{} cut", tier.to_str()),
        description: String::new(),
        price,
        delivery_days,
        revisions,
    }
}

pub async fn seed_service(
    store: &Arc<dyn MarketStore>,
    status: ServiceStatus,
    packages: Vec<ServicePackage>,
) -> Service {
    store
        .create_service(NewService {
            creator_id: Uuid::new_v4(),
            title: "Brand film in 30 seconds".to_string(),
            description: "AI-assisted brand film".to_string(),
            category: VideoCategory::Advertisement,
            status,
            packages,
        })
        .await
        .unwrap()
}

pub async fn active_service(store: &Arc<dyn MarketStore>) -> Service {
    seed_service(
        store,
        ServiceStatus::Active,
        vec![
            package(PackageTier::Basic, 50_000, 5, 1),
            package(PackageTier::Standard, 300_001, 7, 2),
        ],
    )
    .await
}

pub async fn open_project(store: &Arc<dyn MarketStore>) -> Project {
    store
        .create_project(NewProject {
            client_id: Uuid::new_v4(),
            title: "Product teaser".to_string(),
            description: "Fifteen second teaser".to_string(),
            budget_min: 80_000,
            budget_max: 120_000,
            deadline: Utc::now() + Duration::days(14),
            category: VideoCategory::ShortForm,
        })
        .await
        .unwrap()
}
