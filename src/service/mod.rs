pub mod background_jobs;
pub mod catalog_service;
pub mod checkout_service;
pub mod commission;
pub mod dispute_service;
pub mod error;
pub mod milestone_service;
pub mod order_bridge;
pub mod order_service;
pub mod payment_provider;
pub mod proposal_service;
pub mod review_service;

#[cfg(test)]
mod testutil;
