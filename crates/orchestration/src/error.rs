//! Orchestration error types.

use common::AggregateId;
use domain::DomainError;
use store::StoreError;
use thiserror::Error;

use crate::gateway::GatewayError;

/// Errors that can occur while running an order use case.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrchestrationError {
    /// A business rule was violated.
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// Repository error.
    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    /// The payment gateway failed outside of a capture (refunds).
    #[error("Payment gateway error: {0}")]
    Gateway(#[from] GatewayError),

    /// The order already has a shipment that was not cancelled.
    #[error("Order {order_id} already has shipment {shipment_id}")]
    ShipmentAlreadyExists {
        order_id: AggregateId,
        shipment_id: AggregateId,
    },
}

/// Convenience type alias for orchestration results.
pub type Result<T> = std::result::Result<T, OrchestrationError>;
