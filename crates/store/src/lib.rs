pub mod error;
pub mod memory;
pub mod query;
pub mod repository;

pub use error::{Result, StoreError};
pub use memory::{
    InMemoryOrderRepository, InMemoryPaymentRepository, InMemoryRepository,
    InMemoryShipmentRepository,
};
pub use query::{Page, PageRequest};
pub use repository::{OrderRepository, PaymentRepository, ShipmentRepository};
