//! Identifier generation port.

use std::sync::atomic::{AtomicI64, Ordering};

use chrono::Utc;

use crate::AggregateId;

/// Produces identifiers for new aggregates and human-readable order numbers.
pub trait IdGenerator: Send + Sync {
    /// Returns a globally unique, lexicographically sortable identifier.
    fn next_id(&self) -> AggregateId;

    /// Returns a unique human-readable order number.
    fn next_order_number(&self) -> String;
}

/// Default generator backed by UUID v7 and a nanosecond clock.
///
/// Order numbers have the form `ORD-<unix nanos>`; the clock reading is
/// bumped when two calls land on the same nanosecond so numbers never repeat
/// within a process.
#[derive(Debug, Default)]
pub struct UuidV7Generator {
    last_nanos: AtomicI64,
}

impl UuidV7Generator {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_nanos(&self) -> i64 {
        let now = Utc::now().timestamp_nanos_opt().unwrap_or(i64::MAX);
        let mut last = self.last_nanos.load(Ordering::Relaxed);
        loop {
            let candidate = now.max(last + 1);
            match self.last_nanos.compare_exchange_weak(
                last,
                candidate,
                Ordering::Relaxed,
                Ordering::Relaxed,
            ) {
                Ok(_) => return candidate,
                Err(actual) => last = actual,
            }
        }
    }
}

impl IdGenerator for UuidV7Generator {
    fn next_id(&self) -> AggregateId {
        AggregateId::new()
    }

    fn next_order_number(&self) -> String {
        format!("ORD-{}", self.next_nanos())
    }
}
