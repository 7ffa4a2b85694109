//! Order aggregate implementation.

use chrono::{DateTime, Utc};
use common::{AggregateId, Version};
use serde::{Deserialize, Serialize};

use crate::aggregate::Aggregate;
use crate::error::{DomainError, Result};
use crate::money::{Currency, Money};

use super::{OrderItem, OrderStatus};

const ENTITY: &str = "order";

/// Order aggregate root.
///
/// Owns its items exclusively. `total_amount` is recomputed from the item
/// subtotals on every item mutation, and all items share one currency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    /// Unique order identifier.
    id: AggregateId,

    /// Version for optimistic concurrency.
    #[serde(default)]
    version: Version,

    /// User who placed the order.
    user_id: String,

    /// Unique human-readable number, e.g. `ORD-1731672000000000000`.
    order_number: String,

    /// Current status of the order.
    status: OrderStatus,

    /// Items in insertion order.
    items: Vec<OrderItem>,

    /// Sum of all item subtotals.
    total_amount: Money,

    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Aggregate for Order {
    fn aggregate_type() -> &'static str {
        "Order"
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

// Query methods
impl Order {
    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn order_number(&self) -> &str {
        &self.order_number
    }

    /// Returns the current status.
    pub fn status(&self) -> OrderStatus {
        self.status
    }

    /// Returns all items in insertion order.
    pub fn items(&self) -> &[OrderItem] {
        &self.items
    }

    /// Returns an item by its identifier.
    pub fn get_item(&self, item_id: AggregateId) -> Option<&OrderItem> {
        self.items.iter().find(|item| item.id() == item_id)
    }

    /// Returns the number of items.
    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    /// Returns the total quantity of all items.
    pub fn total_quantity(&self) -> u64 {
        self.items.iter().map(|item| u64::from(item.quantity())).sum()
    }

    /// Returns the total amount.
    pub fn total_amount(&self) -> Money {
        self.total_amount
    }

    /// Returns true if the order has items.
    pub fn has_items(&self) -> bool {
        !self.items.is_empty()
    }

    /// Returns true unless the order is completed or refunded.
    pub fn can_be_cancelled(&self) -> bool {
        self.status.can_cancel()
    }

    /// Returns true if the order is in a terminal status.
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}

// Command methods
impl Order {
    /// Creates a new, empty pending order with a zero total.
    pub fn create(
        id: AggregateId,
        user_id: impl Into<String>,
        order_number: impl Into<String>,
    ) -> Result<Self> {
        let user_id = user_id.into();
        let order_number = order_number.into();

        if user_id.trim().is_empty() {
            return Err(DomainError::InvalidArgument(
                "user id cannot be empty".to_string(),
            ));
        }
        if order_number.trim().is_empty() {
            return Err(DomainError::InvalidArgument(
                "order number cannot be empty".to_string(),
            ));
        }

        let now = Utc::now();
        Ok(Self {
            id,
            version: Version::initial(),
            user_id,
            order_number,
            status: OrderStatus::Pending,
            items: Vec::new(),
            total_amount: Money::zero(Currency::USD),
            created_at: now,
            updated_at: now,
        })
    }

    /// Appends an item and recomputes the total.
    ///
    /// The item must belong to this order and use the same currency as the
    /// items already present.
    pub fn add_item(&mut self, item: OrderItem) -> Result<()> {
        if item.order_id() != self.id {
            return Err(DomainError::InvalidArgument(format!(
                "item {} belongs to order {}, not {}",
                item.id(),
                item.order_id(),
                self.id
            )));
        }

        if let Some(existing) = self.items.first() {
            let expected = existing.subtotal().currency();
            let actual = item.subtotal().currency();
            if expected != actual {
                return Err(DomainError::CurrencyMismatch { expected, actual });
            }
        }

        self.total_amount = sum_subtotals(self.items.iter().chain(std::iter::once(&item)))?;
        self.items.push(item);
        self.touch();
        Ok(())
    }

    /// Removes an item by identity and recomputes the total.
    pub fn remove_item(&mut self, item_id: AggregateId) -> Result<OrderItem> {
        let index = self
            .items
            .iter()
            .position(|item| item.id() == item_id)
            .ok_or_else(|| DomainError::not_found("order item", item_id))?;

        let total = sum_subtotals(
            self.items
                .iter()
                .enumerate()
                .filter(|(i, _)| *i != index)
                .map(|(_, item)| item),
        )?;
        let removed = self.items.remove(index);
        self.total_amount = total;
        self.touch();
        Ok(removed)
    }

    /// Changes the quantity of an existing item and recomputes the total.
    pub fn update_item_quantity(&mut self, item_id: AggregateId, quantity: u32) -> Result<()> {
        let index = self
            .items
            .iter()
            .position(|item| item.id() == item_id)
            .ok_or_else(|| DomainError::not_found("order item", item_id))?;

        let mut updated = self.items[index].clone();
        updated.update_quantity(quantity)?;
        let total = sum_subtotals(
            self.items
                .iter()
                .enumerate()
                .map(|(i, item)| if i == index { &updated } else { item }),
        )?;

        self.items[index] = updated;
        self.total_amount = total;
        self.touch();
        Ok(())
    }

    /// Marks the order as paid. Legal only from `pending`.
    pub fn mark_as_paid(&mut self) -> Result<()> {
        if !self.status.can_mark_paid() {
            return Err(DomainError::invalid_transition(
                ENTITY,
                self.status,
                "mark as paid",
            ));
        }
        self.transition_to(OrderStatus::Paid);
        Ok(())
    }

    /// Cancels the order. Rejected only for completed and refunded orders.
    pub fn cancel(&mut self) -> Result<()> {
        if !self.status.can_cancel() {
            return Err(DomainError::invalid_transition(ENTITY, self.status, "cancel"));
        }
        self.transition_to(OrderStatus::Cancelled);
        Ok(())
    }

    /// Completes the order. Legal only from `paid`.
    pub fn complete(&mut self) -> Result<()> {
        if !self.status.can_complete() {
            return Err(DomainError::invalid_transition(
                ENTITY,
                self.status,
                "complete",
            ));
        }
        self.transition_to(OrderStatus::Completed);
        Ok(())
    }

    /// Refunds the order. Legal from `paid` or `completed`.
    pub fn refund(&mut self) -> Result<()> {
        if !self.status.can_refund() {
            return Err(DomainError::invalid_transition(ENTITY, self.status, "refund"));
        }
        self.transition_to(OrderStatus::Refunded);
        Ok(())
    }
}

impl Order {
    fn transition_to(&mut self, status: OrderStatus) {
        self.status = status;
        self.touch();
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

}

// An empty order totals zero USD. Computed before any mutation so a failed
// sum leaves the order as it was.
fn sum_subtotals<'a>(items: impl IntoIterator<Item = &'a OrderItem>) -> Result<Money> {
    let mut items = items.into_iter();
    let Some(first) = items.next() else {
        return Ok(Money::zero(Currency::USD));
    };
    items.try_fold(first.subtotal(), |total, item| total.add(&item.subtotal()))
}
