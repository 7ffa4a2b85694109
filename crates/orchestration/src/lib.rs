//! Order lifecycle orchestration.
//!
//! [`OrderOrchestrator`] runs the use cases that span more than one record:
//! placing an order, capturing and refunding its payment, and driving its
//! shipment to delivery. Each use case touches the order, payment and
//! shipment repositories in a fixed order; no transaction spans them.
//!
//! The payment is always written before the order it pays for, so a crash
//! between the two writes leaves a completed payment against a pending
//! order. [`OrderOrchestrator::reconcile_order`] repairs that state, and
//! [`OrderOrchestrator::process_payment`] does the same instead of charging
//! twice.

pub mod error;
pub mod gateway;
pub mod locks;
pub mod orchestrator;

pub use error::{OrchestrationError, Result};
pub use gateway::{GatewayError, GatewayReceipt, InMemoryPaymentGateway, PaymentGateway};
pub use locks::OrderLocks;
pub use orchestrator::{OrderLine, OrderOrchestrator};
