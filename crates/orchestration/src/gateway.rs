//! Payment gateway port and in-memory implementation.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use domain::{Money, PaymentMethod};
use thiserror::Error;

/// Result of a successful capture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayReceipt {
    /// The transaction ID assigned by the gateway.
    pub transaction_id: String,

    /// Raw gateway response, kept on the payment for auditing.
    pub response: String,
}

/// Errors reported by a payment gateway.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    /// The gateway refused the operation.
    #[error("Payment declined: {0}")]
    Declined(String),

    /// The gateway could not be reached or timed out.
    #[error("Payment gateway unavailable: {0}")]
    Unavailable(String),
}

/// Trait for payment capture and refund operations.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Charges `amount` using `method`.
    async fn process_payment(
        &self,
        amount: &Money,
        method: PaymentMethod,
    ) -> Result<GatewayReceipt, GatewayError>;

    /// Returns `amount` for a previously captured transaction.
    async fn refund_payment(&self, transaction_id: &str, amount: &Money)
    -> Result<(), GatewayError>;
}

#[derive(Debug, Default)]
struct InMemoryGatewayState {
    charges: HashMap<String, Money>,
    refunded: HashSet<String>,
    next_id: u32,
    fail_on_charge: bool,
    fail_on_refund: bool,
    unavailable: bool,
}

/// In-memory payment gateway for testing and local runs.
///
/// Transaction IDs are sequential (`TXN-0001`, `TXN-0002`, ...).
#[derive(Debug, Clone, Default)]
pub struct InMemoryPaymentGateway {
    state: Arc<Mutex<InMemoryGatewayState>>,
}

impl InMemoryPaymentGateway {
    /// Creates a new in-memory payment gateway.
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, InMemoryGatewayState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Configures the gateway to decline every charge.
    pub fn set_fail_on_charge(&self, fail: bool) {
        self.state().fail_on_charge = fail;
    }

    /// Configures the gateway to decline every refund.
    pub fn set_fail_on_refund(&self, fail: bool) {
        self.state().fail_on_refund = fail;
    }

    /// Simulates an outage: every call fails with `Unavailable`.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.state().unavailable = unavailable;
    }

    /// Returns the number of captured charges, refunded or not.
    pub fn charge_count(&self) -> usize {
        self.state().charges.len()
    }

    /// Returns the number of refunded charges.
    pub fn refund_count(&self) -> usize {
        self.state().refunded.len()
    }

    /// Returns true if a charge exists with the given transaction ID.
    pub fn has_charge(&self, transaction_id: &str) -> bool {
        self.state().charges.contains_key(transaction_id)
    }
}

#[async_trait]
impl PaymentGateway for InMemoryPaymentGateway {
    async fn process_payment(
        &self,
        amount: &Money,
        method: PaymentMethod,
    ) -> Result<GatewayReceipt, GatewayError> {
        let mut state = self.state();

        if state.unavailable {
            return Err(GatewayError::Unavailable("connection refused".to_string()));
        }
        if state.fail_on_charge {
            return Err(GatewayError::Declined("insufficient funds".to_string()));
        }

        state.next_id += 1;
        let transaction_id = format!("TXN-{:04}", state.next_id);
        state.charges.insert(transaction_id.clone(), *amount);

        Ok(GatewayReceipt {
            response: format!("approved {amount} via {method}"),
            transaction_id,
        })
    }

    async fn refund_payment(
        &self,
        transaction_id: &str,
        amount: &Money,
    ) -> Result<(), GatewayError> {
        let mut state = self.state();

        if state.unavailable {
            return Err(GatewayError::Unavailable("connection refused".to_string()));
        }
        if state.fail_on_refund {
            return Err(GatewayError::Declined("refund rejected".to_string()));
        }

        match state.charges.get(transaction_id).copied() {
            None => Err(GatewayError::Declined(format!(
                "unknown transaction {transaction_id}"
            ))),
            Some(captured) if captured != *amount => Err(GatewayError::Declined(format!(
                "refund amount {amount} does not match captured {captured}"
            ))),
            Some(_) if state.refunded.contains(transaction_id) => Err(GatewayError::Declined(
                format!("transaction {transaction_id} already refunded"),
            )),
            Some(_) => {
                state.refunded.insert(transaction_id.to_string());
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use domain::Currency;
    use rust_decimal_macros::dec;

    use super::*;

    fn amount() -> Money {
        Money::new(dec!(50.00), Currency::USD)
    }

    #[tokio::test]
    async fn test_charge_and_refund() {
        let gateway = InMemoryPaymentGateway::new();

        let receipt = gateway
            .process_payment(&amount(), PaymentMethod::CreditCard)
            .await
            .unwrap();
        assert!(receipt.transaction_id.starts_with("TXN-"));
        assert_eq!(receipt.response, "approved 50.00 USD via credit_card");
        assert!(gateway.has_charge(&receipt.transaction_id));

        gateway
            .refund_payment(&receipt.transaction_id, &amount())
            .await
            .unwrap();
        assert_eq!(gateway.refund_count(), 1);

        let again = gateway
            .refund_payment(&receipt.transaction_id, &amount())
            .await;
        assert!(matches!(again, Err(GatewayError::Declined(_))));
    }

    #[tokio::test]
    async fn test_fail_on_charge() {
        let gateway = InMemoryPaymentGateway::new();
        gateway.set_fail_on_charge(true);

        let result = gateway.process_payment(&amount(), PaymentMethod::Cash).await;
        assert!(matches!(result, Err(GatewayError::Declined(_))));
        assert_eq!(gateway.charge_count(), 0);
    }

    #[tokio::test]
    async fn test_unavailable() {
        let gateway = InMemoryPaymentGateway::new();
        gateway.set_unavailable(true);

        let result = gateway.process_payment(&amount(), PaymentMethod::Cash).await;
        assert!(matches!(result, Err(GatewayError::Unavailable(_))));
    }

    #[tokio::test]
    async fn test_refund_unknown_transaction() {
        let gateway = InMemoryPaymentGateway::new();
        let result = gateway.refund_payment("TXN-9999", &amount()).await;
        assert!(matches!(result, Err(GatewayError::Declined(_))));
    }

    #[tokio::test]
    async fn test_sequential_transaction_ids() {
        let gateway = InMemoryPaymentGateway::new();

        let r1 = gateway
            .process_payment(&amount(), PaymentMethod::PayPal)
            .await
            .unwrap();
        let r2 = gateway
            .process_payment(&amount(), PaymentMethod::PayPal)
            .await
            .unwrap();

        assert_eq!(r1.transaction_id, "TXN-0001");
        assert_eq!(r2.transaction_id, "TXN-0002");
    }
}
