use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::validate_not_blank;
use crate::models::servicemodels::PackageTier;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateOrderDto {
    pub service_id: Uuid,
    pub buyer_id: Uuid,
    pub package_tier: PackageTier,

    #[validate(length(max = 5000, message = "Requirements must be at most 5000 characters"))]
    pub requirements: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RefundOrderDto {
    pub order_id: Uuid,

    #[validate(custom = "validate_not_blank")]
    pub reason: String,
}
