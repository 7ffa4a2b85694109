//! Payment entity, one-to-one with an order attempt.

use chrono::{DateTime, Utc};
use common::{AggregateId, Version};
use serde::{Deserialize, Serialize};

use crate::aggregate::Aggregate;
use crate::error::{DomainError, Result};
use crate::money::Money;

const ENTITY: &str = "payment";

/// The status of a payment.
///
/// ```text
/// Pending ──► Completed ──► Refunded
///    └──────► Failed
/// ```
/// `Failed` is terminal: a retried attempt creates a fresh payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Completed,
    Failed,
    Refunded,
}

impl PaymentStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, PaymentStatus::Failed | PaymentStatus::Refunded)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Completed => "completed",
            PaymentStatus::Failed => "failed",
            PaymentStatus::Refunded => "refunded",
        }
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How the customer pays. The set of methods is closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PaymentMethod {
    #[serde(rename = "credit_card")]
    CreditCard,
    #[serde(rename = "debit_card")]
    DebitCard,
    #[serde(rename = "paypal")]
    PayPal,
    #[serde(rename = "stripe")]
    Stripe,
    #[serde(rename = "cash")]
    Cash,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::CreditCard => "credit_card",
            PaymentMethod::DebitCard => "debit_card",
            PaymentMethod::PayPal => "paypal",
            PaymentMethod::Stripe => "stripe",
            PaymentMethod::Cash => "cash",
        }
    }
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for PaymentMethod {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "credit_card" => Ok(PaymentMethod::CreditCard),
            "debit_card" => Ok(PaymentMethod::DebitCard),
            "paypal" => Ok(PaymentMethod::PayPal),
            "stripe" => Ok(PaymentMethod::Stripe),
            "cash" => Ok(PaymentMethod::Cash),
            other => Err(DomainError::InvalidArgument(format!(
                "unknown payment method {other:?}"
            ))),
        }
    }
}

/// A single attempt to capture an order's total through the gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payment {
    id: AggregateId,
    #[serde(default)]
    version: Version,
    order_id: AggregateId,
    amount: Money,
    method: PaymentMethod,
    status: PaymentStatus,
    transaction_id: Option<String>,
    gateway_response: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Aggregate for Payment {
    fn aggregate_type() -> &'static str {
        "Payment"
    }

    fn id(&self) -> AggregateId {
        self.id
    }

    fn version(&self) -> Version {
        self.version
    }

    fn set_version(&mut self, version: Version) {
        self.version = version;
    }
}

impl Payment {
    /// Creates a pending payment for `amount`.
    ///
    /// # Errors
    /// `InvalidArgument` if the order id is nil or the amount is not positive.
    pub fn create(
        id: AggregateId,
        order_id: AggregateId,
        amount: Money,
        method: PaymentMethod,
    ) -> Result<Self> {
        if order_id.is_nil() {
            return Err(DomainError::InvalidArgument(
                "order id cannot be empty".to_string(),
            ));
        }
        if !amount.is_positive() {
            return Err(DomainError::InvalidArgument(format!(
                "payment amount must be positive, got {amount}"
            )));
        }

        let now = Utc::now();
        Ok(Self {
            id,
            version: Version::initial(),
            order_id,
            amount,
            method,
            status: PaymentStatus::Pending,
            transaction_id: None,
            gateway_response: None,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn order_id(&self) -> AggregateId {
        self.order_id
    }

    pub fn amount(&self) -> Money {
        self.amount
    }

    pub fn method(&self) -> PaymentMethod {
        self.method
    }

    pub fn status(&self) -> PaymentStatus {
        self.status
    }

    pub fn transaction_id(&self) -> Option<&str> {
        self.transaction_id.as_deref()
    }

    pub fn gateway_response(&self) -> Option<&str> {
        self.gateway_response.as_deref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn is_completed(&self) -> bool {
        self.status == PaymentStatus::Completed
    }

    /// Only completed payments can be refunded.
    pub fn can_be_refunded(&self) -> bool {
        self.status == PaymentStatus::Completed
    }

    /// Records a successful capture. Legal only from `pending`.
    pub fn mark_as_completed(
        &mut self,
        transaction_id: impl Into<String>,
        gateway_response: impl Into<String>,
    ) -> Result<()> {
        if self.status != PaymentStatus::Pending {
            return Err(DomainError::invalid_transition(
                ENTITY,
                self.status,
                "complete",
            ));
        }
        self.status = PaymentStatus::Completed;
        self.transaction_id = Some(transaction_id.into());
        self.gateway_response = Some(gateway_response.into());
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Records a rejected capture.
    ///
    /// Completed and refunded payments cannot fail after the fact, and a
    /// failed payment stays failed.
    pub fn mark_as_failed(&mut self, gateway_response: impl Into<String>) -> Result<()> {
        if self.status != PaymentStatus::Pending {
            return Err(DomainError::invalid_transition(
                ENTITY,
                self.status,
                "mark as failed",
            ));
        }
        self.status = PaymentStatus::Failed;
        self.gateway_response = Some(gateway_response.into());
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Marks the payment as refunded. Legal only from `completed`.
    pub fn refund(&mut self) -> Result<()> {
        if !self.can_be_refunded() {
            return Err(DomainError::invalid_transition(ENTITY, self.status, "refund"));
        }
        self.status = PaymentStatus::Refunded;
        self.updated_at = Utc::now();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;
    use crate::money::Currency;

    fn pending_payment() -> Payment {
        Payment::create(
            AggregateId::new(),
            AggregateId::new(),
            Money::new(dec!(25.00), Currency::USD),
            PaymentMethod::CreditCard,
        )
        .unwrap()
    }

    fn payment_in(status: PaymentStatus) -> Payment {
        let mut payment = pending_payment();
        match status {
            PaymentStatus::Pending => {}
            PaymentStatus::Completed => payment.mark_as_completed("TXN-1", "ok").unwrap(),
            PaymentStatus::Failed => payment.mark_as_failed("declined").unwrap(),
            PaymentStatus::Refunded => {
                payment.mark_as_completed("TXN-1", "ok").unwrap();
                payment.refund().unwrap();
            }
        }
        payment
    }

    const ALL: [PaymentStatus; 4] = [
        PaymentStatus::Pending,
        PaymentStatus::Completed,
        PaymentStatus::Failed,
        PaymentStatus::Refunded,
    ];

    #[test]
    fn test_create_payment() {
        let payment = pending_payment();
        assert_eq!(payment.status(), PaymentStatus::Pending);
        assert_eq!(payment.transaction_id(), None);
        assert!(!payment.can_be_refunded());
    }

    #[test]
    fn test_create_rejects_nil_order_and_non_positive_amount() {
        let nil_order = Payment::create(
            AggregateId::new(),
            AggregateId::nil(),
            Money::new(dec!(1), Currency::USD),
            PaymentMethod::Cash,
        );
        assert!(matches!(nil_order, Err(DomainError::InvalidArgument(_))));

        let zero = Payment::create(
            AggregateId::new(),
            AggregateId::new(),
            Money::zero(Currency::USD),
            PaymentMethod::Cash,
        );
        assert!(matches!(zero, Err(DomainError::InvalidArgument(_))));
    }

    #[test]
    fn test_complete_only_from_pending() {
        for status in ALL {
            let mut payment = payment_in(status);
            let result = payment.mark_as_completed("TXN-2", "ok");
            assert_eq!(result.is_ok(), status == PaymentStatus::Pending);
            if status == PaymentStatus::Pending {
                assert_eq!(payment.transaction_id(), Some("TXN-2"));
                assert_eq!(payment.gateway_response(), Some("ok"));
            } else {
                assert_eq!(payment.status(), status);
            }
        }
    }

    #[test]
    fn test_failed_payment_never_transitions() {
        let mut payment = payment_in(PaymentStatus::Failed);
        assert_eq!(payment.gateway_response(), Some("declined"));

        assert!(payment.mark_as_completed("TXN-3", "ok").is_err());
        assert!(payment.mark_as_failed("again").is_err());
        assert!(payment.refund().is_err());
        assert_eq!(payment.status(), PaymentStatus::Failed);
        assert!(payment.status().is_terminal());
    }

    #[test]
    fn test_completed_or_refunded_cannot_fail() {
        for status in [PaymentStatus::Completed, PaymentStatus::Refunded] {
            let mut payment = payment_in(status);
            assert!(matches!(
                payment.mark_as_failed("late"),
                Err(DomainError::InvalidTransition { .. })
            ));
        }
    }

    #[test]
    fn test_refund_only_from_completed() {
        for status in ALL {
            let mut payment = payment_in(status);
            assert_eq!(payment.can_be_refunded(), status == PaymentStatus::Completed);
            assert_eq!(payment.refund().is_ok(), status == PaymentStatus::Completed);
        }
    }

    #[test]
    fn test_payment_method_parsing() {
        assert_eq!("paypal".parse::<PaymentMethod>().unwrap(), PaymentMethod::PayPal);
        assert_eq!(
            "credit_card".parse::<PaymentMethod>().unwrap(),
            PaymentMethod::CreditCard
        );
        assert!("bitcoin".parse::<PaymentMethod>().is_err());

        let json = serde_json::to_string(&PaymentMethod::DebitCard).unwrap();
        assert_eq!(json, "\"debit_card\"");
    }
}
