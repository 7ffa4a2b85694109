//! Per-order mutual exclusion.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use common::AggregateId;
use tokio::sync::OwnedMutexGuard;

type Table = HashMap<AggregateId, Arc<tokio::sync::Mutex<()>>>;

/// Keyed async mutex: at most one mutating use case runs per order id.
///
/// Entries nobody holds or waits on are pruned on every acquire, so the table
/// only ever contains orders with work in flight.
#[derive(Debug, Default)]
pub struct OrderLocks {
    table: Mutex<Table>,
}

impl OrderLocks {
    pub fn new() -> Self {
        Self::default()
    }

    fn table(&self) -> MutexGuard<'_, Table> {
        self.table.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Waits until no other task holds the lock for `order_id`.
    ///
    /// The lock is released when the returned guard is dropped.
    pub async fn acquire(&self, order_id: AggregateId) -> OwnedMutexGuard<()> {
        let lock = {
            let mut table = self.table();
            table.retain(|_, lock| Arc::strong_count(lock) > 1);
            Arc::clone(table.entry(order_id).or_default())
        };
        lock.lock_owned().await
    }

    /// Number of orders with a held or awaited lock.
    pub fn len(&self) -> usize {
        self.table()
            .values()
            .filter(|lock| Arc::strong_count(lock) > 1)
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
