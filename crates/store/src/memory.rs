use std::sync::Arc;

use async_trait::async_trait;
use common::AggregateId;
use domain::{Aggregate, Order, Payment, Shipment};
use tokio::sync::RwLock;

use crate::{OrderRepository, PaymentRepository, Result, ShipmentRepository, StoreError};

/// In-memory repository for testing and single-process deployments.
///
/// Records are kept in insertion order, so "latest" lookups scan from the
/// back. Every successful write bumps the stored version by one.
#[derive(Clone)]
pub struct InMemoryRepository<T> {
    records: Arc<RwLock<Vec<T>>>,
}

pub type InMemoryOrderRepository = InMemoryRepository<Order>;
pub type InMemoryPaymentRepository = InMemoryRepository<Payment>;
pub type InMemoryShipmentRepository = InMemoryRepository<Shipment>;

impl<T> Default for InMemoryRepository<T> {
    fn default() -> Self {
        Self {
            records: Arc::new(RwLock::new(Vec::new())),
        }
    }
}

impl<T: Aggregate> InMemoryRepository<T> {
    /// Creates a new empty repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored records.
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }

    /// Removes every record.
    pub async fn clear(&self) {
        self.records.write().await.clear();
    }

    /// Stores a new record. `unique_key` reports a secondary key that clashes
    /// with an existing record.
    async fn insert(
        &self,
        entity: &mut T,
        unique_key: impl Fn(&T, &T) -> Option<String>,
    ) -> Result<()> {
        let mut records = self.records.write().await;

        if records.iter().any(|stored| stored.id() == entity.id()) {
            return Err(StoreError::Duplicate {
                aggregate_type: T::aggregate_type(),
                key: entity.id().to_string(),
            });
        }
        if let Some(key) = records.iter().find_map(|stored| unique_key(stored, entity)) {
            return Err(StoreError::Duplicate {
                aggregate_type: T::aggregate_type(),
                key,
            });
        }

        entity.set_version(entity.version().next());
        records.push(entity.clone());
        Ok(())
    }

    /// Replaces a stored record if its version still matches.
    async fn replace(&self, entity: &mut T) -> Result<()> {
        let mut records = self.records.write().await;

        let stored = records
            .iter_mut()
            .find(|stored| stored.id() == entity.id())
            .ok_or(StoreError::NotFound {
                aggregate_type: T::aggregate_type(),
                id: entity.id(),
            })?;

        if stored.version() != entity.version() {
            tracing::debug!(
                aggregate_type = T::aggregate_type(),
                id = %entity.id(),
                expected = %entity.version(),
                actual = %stored.version(),
                "Rejected stale update"
            );
            return Err(StoreError::ConcurrencyConflict {
                aggregate_type: T::aggregate_type(),
                id: entity.id(),
                expected: entity.version(),
                actual: stored.version(),
            });
        }

        entity.set_version(entity.version().next());
        *stored = entity.clone();
        Ok(())
    }

    async fn get(&self, id: AggregateId) -> Option<T> {
        self.find_first(|record| record.id() == id).await
    }

    async fn find_first(&self, predicate: impl Fn(&T) -> bool) -> Option<T> {
        let records = self.records.read().await;
        records.iter().find(|record| predicate(record)).cloned()
    }

    async fn find_last(&self, predicate: impl Fn(&T) -> bool) -> Option<T> {
        let records = self.records.read().await;
        records.iter().rev().find(|record| predicate(record)).cloned()
    }

    async fn remove(&self, id: AggregateId) -> Result<()> {
        let mut records = self.records.write().await;
        let index = records
            .iter()
            .position(|record| record.id() == id)
            .ok_or(StoreError::NotFound {
                aggregate_type: T::aggregate_type(),
                id,
            })?;
        records.remove(index);
        Ok(())
    }
}

#[async_trait]
impl OrderRepository for InMemoryRepository<Order> {
    async fn create(&self, order: &mut Order) -> Result<()> {
        self.insert(order, |stored, new| {
            (stored.order_number() == new.order_number()).then(|| new.order_number().to_string())
        })
        .await
    }

    async fn update(&self, order: &mut Order) -> Result<()> {
        self.replace(order).await
    }

    async fn find_by_id(&self, id: AggregateId) -> Result<Option<Order>> {
        Ok(self.get(id).await)
    }

    async fn find_by_order_number(&self, order_number: &str) -> Result<Option<Order>> {
        Ok(self
            .find_first(|order| order.order_number() == order_number)
            .await)
    }

    async fn list_by_user_id(
        &self,
        user_id: &str,
        offset: usize,
        limit: usize,
    ) -> Result<(Vec<Order>, u64)> {
        let records = self.records.read().await;
        let owned: Vec<&Order> = records
            .iter()
            .filter(|order| order.user_id() == user_id)
            .collect();
        let total = owned.len() as u64;
        let page = owned
            .into_iter()
            .skip(offset)
            .take(limit)
            .cloned()
            .collect();
        Ok((page, total))
    }

    async fn delete(&self, id: AggregateId) -> Result<()> {
        self.remove(id).await
    }
}

#[async_trait]
impl PaymentRepository for InMemoryRepository<Payment> {
    async fn create(&self, payment: &mut Payment) -> Result<()> {
        self.insert(payment, |_, _| None).await
    }

    async fn update(&self, payment: &mut Payment) -> Result<()> {
        self.replace(payment).await
    }

    async fn find_by_id(&self, id: AggregateId) -> Result<Option<Payment>> {
        Ok(self.get(id).await)
    }

    async fn find_by_order_id(&self, order_id: AggregateId) -> Result<Option<Payment>> {
        Ok(self
            .find_last(|payment| payment.order_id() == order_id)
            .await)
    }

    async fn find_by_transaction_id(&self, transaction_id: &str) -> Result<Option<Payment>> {
        Ok(self
            .find_first(|payment| payment.transaction_id() == Some(transaction_id))
            .await)
    }
}

#[async_trait]
impl ShipmentRepository for InMemoryRepository<Shipment> {
    async fn create(&self, shipment: &mut Shipment) -> Result<()> {
        self.insert(shipment, |_, _| None).await
    }

    async fn update(&self, shipment: &mut Shipment) -> Result<()> {
        self.replace(shipment).await
    }

    async fn find_by_id(&self, id: AggregateId) -> Result<Option<Shipment>> {
        Ok(self.get(id).await)
    }

    async fn find_by_order_id(&self, order_id: AggregateId) -> Result<Option<Shipment>> {
        Ok(self
            .find_last(|shipment| shipment.order_id() == order_id)
            .await)
    }

    async fn find_by_tracking_number(&self, tracking_number: &str) -> Result<Option<Shipment>> {
        Ok(self
            .find_first(|shipment| shipment.tracking_number() == Some(tracking_number))
            .await)
    }
}
