//! Shared types for the order lifecycle engine.
//!
//! Identifiers, optimistic-concurrency versions and the identifier
//! generator port used by every other crate in the workspace.

mod ids;
mod types;

pub use ids::{IdGenerator, UuidV7Generator};
pub use types::{AggregateId, Version};
