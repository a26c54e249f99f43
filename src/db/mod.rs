pub mod db;
pub mod feedbackdb;
pub mod memorydb;
pub mod orderdb;
pub mod projectdb;
pub mod servicedb;

#[cfg(test)]
mod testutil;

use feedbackdb::FeedbackExt;
use orderdb::OrderExt;
use projectdb::ProjectExt;
use servicedb::CatalogExt;

/// Every repository the engine needs, shareable as `Arc<dyn MarketStore>`.
pub trait MarketStore:
    CatalogExt + OrderExt + ProjectExt + FeedbackExt + std::fmt::Debug + Send + Sync
{
}

impl<T> MarketStore for T where
    T: CatalogExt + OrderExt + ProjectExt + FeedbackExt + std::fmt::Debug + Send + Sync
{
}
