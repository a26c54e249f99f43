// service/catalog_service.rs
use std::{collections::HashSet, sync::Arc};

use uuid::Uuid;
use validator::Validate;

use crate::{
    db::MarketStore,
    dtos::servicedtos::CreateServiceDto,
    models::servicemodels::*,
    service::error::ServiceError,
};

#[derive(Debug, Clone)]
pub struct CatalogService {
    db_client: Arc<dyn MarketStore>,
}

impl CatalogService {
    pub fn new(db_client: Arc<dyn MarketStore>) -> Self {
        Self { db_client }
    }

    /// New listings start as drafts and are not purchasable until published.
    pub async fn create_service(&self, dto: CreateServiceDto) -> Result<Service, ServiceError> {
        dto.validate()?;

        let mut seen = HashSet::new();
        let mut packages = Vec::with_capacity(dto.packages.len());
        for package in dto.packages {
            package.validate()?;
            if !seen.insert(package.tier) {
                return Err(ServiceError::Validation(format!(
                    "Duplicate {} package",
                    package.tier.to_str()
                )));
            }
            packages.push(ServicePackage {
                tier: package.tier,
                title: package.title,
                description: package.description,
                price: package.price,
                delivery_days: package.delivery_days,
                revisions: package.revisions,
            });
        }

        let service = self
            .db_client
            .create_service(NewService {
                creator_id: dto.creator_id,
                title: dto.title,
                description: dto.description,
                category: dto.category,
                status: ServiceStatus::Draft,
                packages,
            })
            .await?;

        tracing::info!(
            "Service {} created by {} with {} package(s)",
            service.id,
            service.creator_id,
            service.packages.len()
        );

        Ok(service)
    }

    pub async fn get_service(&self, service_id: Uuid) -> Result<Service, ServiceError> {
        self.db_client
            .get_service(service_id)
            .await?
            .ok_or(ServiceError::ServiceNotFound(service_id))
    }

    pub async fn publish_service(&self, service_id: Uuid) -> Result<Service, ServiceError> {
        self.transition(service_id, ServiceStatus::Active).await
    }

    pub async fn pause_service(&self, service_id: Uuid) -> Result<Service, ServiceError> {
        self.transition(service_id, ServiceStatus::Paused).await
    }

    pub async fn delete_service(&self, service_id: Uuid) -> Result<Service, ServiceError> {
        self.transition(service_id, ServiceStatus::Deleted).await
    }

    async fn transition(
        &self,
        service_id: Uuid,
        to: ServiceStatus,
    ) -> Result<Service, ServiceError> {
        let service = self.get_service(service_id).await?;

        if !service.status.can_transition_to(to) {
            return Err(ServiceError::InvalidServiceTransition {
                id: service_id,
                from: service.status,
                to,
            });
        }

        Ok(self
            .db_client
            .update_service_status(service_id, to)
            .await?)
    }
}
