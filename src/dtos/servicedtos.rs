use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::validate_not_blank;
use crate::models::servicemodels::{PackageTier, VideoCategory};

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct PackageDto {
    pub tier: PackageTier,

    #[validate(custom = "validate_not_blank")]
    pub title: String,

    pub description: String,

    #[validate(range(min = 10000, message = "Package price must be at least 10,000"))]
    pub price: i64,

    #[validate(range(min = 1, message = "Delivery must take at least 1 day"))]
    pub delivery_days: i32,

    #[validate(range(min = 0, message = "Revisions cannot be negative"))]
    pub revisions: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateServiceDto {
    pub creator_id: Uuid,

    #[validate(custom = "validate_not_blank")]
    pub title: String,

    pub description: String,
    pub category: VideoCategory,

    #[validate(length(min = 1, max = 3, message = "A service offers between 1 and 3 packages"))]
    pub packages: Vec<PackageDto>,
}
