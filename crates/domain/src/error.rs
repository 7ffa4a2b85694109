//! Domain error types.

use common::AggregateId;
use thiserror::Error;

use crate::money::Currency;
use crate::order::OrderStatus;
use crate::payment::PaymentStatus;

/// Errors produced by the order, payment and shipment domain.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    /// Malformed input to a constructor or setter.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A state-machine move that the entity's current status does not allow.
    #[error("Invalid state transition: cannot {action} {entity} in {from} status")]
    InvalidTransition {
        entity: &'static str,
        from: String,
        action: &'static str,
    },

    /// The order is not in the status a use case requires.
    #[error("Invalid order status for order {order_id}: expected {expected}, found {actual}")]
    InvalidOrderStatus {
        order_id: AggregateId,
        expected: &'static str,
        actual: OrderStatus,
    },

    /// Missing order, item, payment or shipment.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// Order has no items or a non-positive total.
    #[error("Order must have at least one item and a positive total")]
    EmptyOrder,

    /// Item quantity must be greater than zero.
    #[error("Invalid quantity: {quantity} (must be greater than 0)")]
    InvalidQuantity { quantity: i64 },

    /// Arithmetic between two different currencies.
    #[error("Currency mismatch: cannot combine {expected} with {actual}")]
    CurrencyMismatch { expected: Currency, actual: Currency },

    /// The payment gateway rejected the charge.
    #[error("Payment failed: {reason}")]
    PaymentFailed { reason: String },

    /// The payment is not in a refundable status.
    #[error("Payment {payment_id} cannot be refunded in {status} status")]
    CannotRefund {
        payment_id: AggregateId,
        status: PaymentStatus,
    },
}

impl DomainError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        DomainError::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub(crate) fn invalid_transition(
        entity: &'static str,
        from: impl std::fmt::Display,
        action: &'static str,
    ) -> Self {
        DomainError::InvalidTransition {
            entity,
            from: from.to_string(),
            action,
        }
    }
}

/// Convenience type alias for domain results.
pub type Result<T> = std::result::Result<T, DomainError>;
