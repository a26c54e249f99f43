use thiserror::Error;
use uuid::Uuid;

use crate::models::{
    feedbackmodels::DisputeStatus,
    ordermodels::OrderStatus,
    projectmodels::ProposalStatus,
    servicemodels::{PackageTier, ServiceStatus},
};

/// Coarse classification the calling layer uses to pick a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    NotFound,
    InvalidState,
    Forbidden,
    Payment,
    Internal,
}

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Service {0} not found")]
    ServiceNotFound(Uuid),

    #[error("Service {0} has no {1:?} package")]
    PackageNotFound(Uuid, PackageTier),

    #[error("Order {0} not found")]
    OrderNotFound(Uuid),

    #[error("Project {0} not found")]
    ProjectNotFound(Uuid),

    #[error("Proposal {0} not found")]
    ProposalNotFound(Uuid),

    #[error("Milestone {0} not found")]
    MilestoneNotFound(Uuid),

    #[error("Dispute {0} not found")]
    DisputeNotFound(Uuid),

    #[error("Service {0} is not purchasable in status {1:?}")]
    ServiceUnavailable(Uuid, ServiceStatus),

    #[error("Service {id} cannot move from {from:?} to {to:?}")]
    InvalidServiceTransition {
        id: Uuid,
        from: ServiceStatus,
        to: ServiceStatus,
    },

    #[error("Order {id} cannot move from {from:?} to {to:?}")]
    InvalidOrderTransition {
        id: Uuid,
        from: OrderStatus,
        to: OrderStatus,
    },

    #[error("Order {0} is not in status {1:?}")]
    InvalidOrderStatus(Uuid, OrderStatus),

    #[error("Proposal {id} cannot move from {from:?} to {to:?}")]
    InvalidProposalTransition {
        id: Uuid,
        from: ProposalStatus,
        to: ProposalStatus,
    },

    #[error("Dispute {id} cannot move from {from:?} to {to:?}")]
    InvalidDisputeTransition {
        id: Uuid,
        from: DisputeStatus,
        to: DisputeStatus,
    },

    #[error("Order {0} has an open escrow and cannot be cancelled")]
    EscrowOpen(Uuid),

    #[error("Payout for order {0} was already released")]
    PayoutAlreadyReleased(Uuid),

    #[error("User {0} cannot purchase their own service {1}")]
    SelfPurchase(Uuid, Uuid),

    #[error("Payment provider error: {0}")]
    Payment(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl From<validator::ValidationErrors> for ServiceError {
    fn from(errors: validator::ValidationErrors) -> Self {
        ServiceError::Validation(errors.to_string())
    }
}

impl ServiceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ServiceError::Validation(_) => ErrorKind::Validation,

            ServiceError::ServiceNotFound(_)
            | ServiceError::PackageNotFound(_, _)
            | ServiceError::OrderNotFound(_)
            | ServiceError::ProjectNotFound(_)
            | ServiceError::ProposalNotFound(_)
            | ServiceError::MilestoneNotFound(_)
            | ServiceError::DisputeNotFound(_) => ErrorKind::NotFound,

            ServiceError::ServiceUnavailable(_, _)
            | ServiceError::InvalidServiceTransition { .. }
            | ServiceError::InvalidOrderTransition { .. }
            | ServiceError::InvalidOrderStatus(_, _)
            | ServiceError::EscrowOpen(_)
            | ServiceError::PayoutAlreadyReleased(_)
            | ServiceError::InvalidProposalTransition { .. }
            | ServiceError::InvalidDisputeTransition { .. } => ErrorKind::InvalidState,

            ServiceError::SelfPurchase(_, _) => ErrorKind::Forbidden,

            ServiceError::Payment(_) => ErrorKind::Payment,

            ServiceError::Database(_) => ErrorKind::Internal,
        }
    }
}
