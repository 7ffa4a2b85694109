//! Domain layer of the order lifecycle engine.
//!
//! This crate provides:
//! - `Money` and `Currency` value objects with currency-mismatch guards
//! - the `Order` aggregate root with its ordered `OrderItem`s
//! - the `Payment` and `Shipment` entities, one-to-one with an order
//! - the `Aggregate` trait used by repositories for optimistic concurrency
//!
//! Every type here is pure: transitions validate and mutate in memory, and
//! persistence is left to the `store` crate.

pub mod aggregate;
pub mod error;
pub mod money;
pub mod order;
pub mod payment;
pub mod shipment;

pub use aggregate::Aggregate;
pub use error::{DomainError, Result};
pub use money::{Currency, Money};
pub use order::{Order, OrderItem, OrderStatus, ProductId};
pub use payment::{Payment, PaymentMethod, PaymentStatus};
pub use shipment::{Address, Shipment, ShipmentStatus, ShippingMethod};
