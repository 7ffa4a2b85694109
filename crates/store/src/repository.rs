use async_trait::async_trait;
use common::AggregateId;
use domain::{Order, Payment, Shipment};

use crate::Result;

/// Persistence port for orders and their items.
///
/// `create` and `update` take the entity mutably so the repository can stamp
/// the stored version back onto it. `update` fails with
/// `ConcurrencyConflict` when the stored version differs from the one the
/// caller loaded.
#[async_trait]
pub trait OrderRepository: Send + Sync {
    async fn create(&self, order: &mut Order) -> Result<()>;

    async fn update(&self, order: &mut Order) -> Result<()>;

    async fn find_by_id(&self, id: AggregateId) -> Result<Option<Order>>;

    async fn find_by_order_number(&self, order_number: &str) -> Result<Option<Order>>;

    /// Returns one slice of a user's orders, oldest first, and the user's
    /// total order count.
    async fn list_by_user_id(
        &self,
        user_id: &str,
        offset: usize,
        limit: usize,
    ) -> Result<(Vec<Order>, u64)>;

    async fn delete(&self, id: AggregateId) -> Result<()>;
}

/// Persistence port for payment attempts.
#[async_trait]
pub trait PaymentRepository: Send + Sync {
    async fn create(&self, payment: &mut Payment) -> Result<()>;

    async fn update(&self, payment: &mut Payment) -> Result<()>;

    async fn find_by_id(&self, id: AggregateId) -> Result<Option<Payment>>;

    /// Returns the most recent attempt for the order.
    async fn find_by_order_id(&self, order_id: AggregateId) -> Result<Option<Payment>>;

    async fn find_by_transaction_id(&self, transaction_id: &str) -> Result<Option<Payment>>;
}

/// Persistence port for shipments.
#[async_trait]
pub trait ShipmentRepository: Send + Sync {
    async fn create(&self, shipment: &mut Shipment) -> Result<()>;

    async fn update(&self, shipment: &mut Shipment) -> Result<()>;

    async fn find_by_id(&self, id: AggregateId) -> Result<Option<Shipment>>;

    /// Returns the most recently created shipment for the order.
    async fn find_by_order_id(&self, order_id: AggregateId) -> Result<Option<Shipment>>;

    async fn find_by_tracking_number(&self, tracking_number: &str) -> Result<Option<Shipment>>;
}
