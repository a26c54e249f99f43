// models/servicemodels.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, sqlx::Type, PartialEq, Eq, Hash)]
#[sqlx(type_name = "package_tier", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PackageTier {
    Basic,
    Standard,
    Premium,
}

impl PackageTier {
    pub fn to_str(&self) -> &str {
        match self {
            PackageTier::Basic => "basic",
            PackageTier::Standard => "standard",
            PackageTier::Premium => "premium",
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "service_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ServiceStatus {
    Draft,
    Active,
    Paused,
    Deleted,
}

impl ServiceStatus {
    pub fn can_transition_to(&self, to: ServiceStatus) -> bool {
        match (self, to) {
            (ServiceStatus::Deleted, _) => false,
            (_, ServiceStatus::Deleted) => true,
            (ServiceStatus::Draft, ServiceStatus::Active)
            | (ServiceStatus::Paused, ServiceStatus::Active)
            | (ServiceStatus::Active, ServiceStatus::Paused) => true,
            _ => false,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "video_category", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum VideoCategory {
    Advertisement,
    MusicVideo,
    ShortForm,
    Animation,
    Explainer,
    Film,
    Other,
}

impl VideoCategory {
    pub fn to_str(&self) -> &str {
        match self {
            VideoCategory::Advertisement => "advertisement",
            VideoCategory::MusicVideo => "music_video",
            VideoCategory::ShortForm => "short_form",
            VideoCategory::Animation => "animation",
            VideoCategory::Explainer => "explainer",
            VideoCategory::Film => "film",
            VideoCategory::Other => "other",
        }
    }
}

/// One purchasable tier of a service. Stored as JSON on the service row.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ServicePackage {
    pub tier: PackageTier,
    pub title: String,
    pub description: String,
    pub price: i64,
    pub delivery_days: i32,
    pub revisions: i32,
}

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone)]
pub struct Service {
    pub id: Uuid,
    pub creator_id: Uuid,
    pub title: String,
    pub description: String,
    pub category: VideoCategory,
    pub status: ServiceStatus,
    #[sqlx(json)]
    pub packages: Vec<ServicePackage>,
    pub order_count: i32,
    pub completed_count: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Service {
    pub fn package(&self, tier: PackageTier) -> Option<&ServicePackage> {
        self.packages.iter().find(|p| p.tier == tier)
    }
}

#[derive(Debug, Clone)]
pub struct NewService {
    pub creator_id: Uuid,
    pub title: String,
    pub description: String,
    pub category: VideoCategory,
    pub status: ServiceStatus,
    pub packages: Vec<ServicePackage>,
}

/// Counters kept on the service row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceStat {
    OrderCount,
    CompletedCount,
}

impl ServiceStat {
    pub fn column(&self) -> &'static str {
        match self {
            ServiceStat::OrderCount => "order_count",
            ServiceStat::CompletedCount => "completed_count",
        }
    }
}
