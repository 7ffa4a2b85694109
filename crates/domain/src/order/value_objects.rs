//! Value objects and entities owned by the order aggregate.

use chrono::{DateTime, Utc};
use common::AggregateId;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{DomainError, Result};
use crate::money::Money;

/// Product identifier (SKU).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(String);

impl ProductId {
    /// Creates a new product ID from a string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the product ID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl std::fmt::Display for ProductId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for ProductId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for ProductId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl AsRef<str> for ProductId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A line in an order.
///
/// `subtotal` is always `unit_price × quantity`; the only way to change the
/// quantity is [`OrderItem::update_quantity`], which recomputes it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    id: AggregateId,
    order_id: AggregateId,
    product_id: ProductId,
    product_name: String,
    quantity: u32,
    unit_price: Money,
    subtotal: Money,
    created_at: DateTime<Utc>,
}

impl OrderItem {
    /// Creates a new order item.
    ///
    /// # Errors
    /// - `InvalidArgument` if the order id is nil, the product id is empty or
    ///   the unit price is negative
    /// - `InvalidQuantity` if `quantity` is zero
    /// - `InvalidArgument` if the subtotal overflows
    pub fn new(
        id: AggregateId,
        order_id: AggregateId,
        product_id: impl Into<ProductId>,
        product_name: impl Into<String>,
        quantity: u32,
        unit_price: Money,
    ) -> Result<Self> {
        let product_id = product_id.into();
        if order_id.is_nil() {
            return Err(DomainError::InvalidArgument(
                "order id cannot be empty".to_string(),
            ));
        }
        if product_id.is_empty() {
            return Err(DomainError::InvalidArgument(
                "product id cannot be empty".to_string(),
            ));
        }
        if quantity == 0 {
            return Err(DomainError::InvalidQuantity { quantity: 0 });
        }
        if unit_price.is_negative() {
            return Err(DomainError::InvalidArgument(format!(
                "unit price cannot be negative, got {unit_price}"
            )));
        }

        let subtotal = unit_price.multiply(Decimal::from(quantity))?;

        Ok(Self {
            id,
            order_id,
            product_id,
            product_name: product_name.into(),
            quantity,
            unit_price,
            subtotal,
            created_at: Utc::now(),
        })
    }

    pub fn id(&self) -> AggregateId {
        self.id
    }

    pub fn order_id(&self) -> AggregateId {
        self.order_id
    }

    pub fn product_id(&self) -> &ProductId {
        &self.product_id
    }

    pub fn product_name(&self) -> &str {
        &self.product_name
    }

    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    pub fn unit_price(&self) -> Money {
        self.unit_price
    }

    /// Returns `unit_price × quantity`.
    pub fn subtotal(&self) -> Money {
        self.subtotal
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Changes the quantity and recomputes the subtotal.
    ///
    /// The item is left untouched if the new subtotal overflows.
    pub fn update_quantity(&mut self, quantity: u32) -> Result<()> {
        if quantity == 0 {
            return Err(DomainError::InvalidQuantity { quantity: 0 });
        }
        self.subtotal = self.unit_price.multiply(Decimal::from(quantity))?;
        self.quantity = quantity;
        Ok(())
    }
}
