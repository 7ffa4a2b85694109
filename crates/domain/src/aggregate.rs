//! Core aggregate trait.

use common::{AggregateId, Version};

/// Trait for records persisted as a single consistency unit.
///
/// An aggregate is a cluster of domain objects that can be treated as a single
/// unit. Repositories use the identity and version exposed here to detect
/// lost updates: a write is accepted only if the stored version still matches
/// the version the caller loaded.
pub trait Aggregate: Clone + Send + Sync {
    /// Returns the aggregate type name.
    ///
    /// Used in error messages and log fields.
    fn aggregate_type() -> &'static str;

    /// Returns the aggregate's unique identifier.
    fn id(&self) -> AggregateId;

    /// Returns the version the aggregate was loaded at.
    ///
    /// Version 0 means the aggregate has never been persisted.
    fn version(&self) -> Version;

    /// Sets the aggregate version.
    ///
    /// Called by repositories after a successful write.
    fn set_version(&mut self, version: Version);

    /// Returns true if the aggregate has never been persisted.
    fn is_new(&self) -> bool {
        self.version() == Version::initial()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone)]
    struct TestAggregate {
        id: AggregateId,
        version: Version,
    }

    impl Aggregate for TestAggregate {
        fn aggregate_type() -> &'static str {
            "TestAggregate"
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

    #[test]
    fn test_is_new_until_versioned() {
        let mut aggregate = TestAggregate {
            id: AggregateId::new(),
            version: Version::initial(),
        };
        assert!(aggregate.is_new());

        aggregate.set_version(Version::first());
        assert!(!aggregate.is_new());
        assert_eq!(TestAggregate::aggregate_type(), "TestAggregate");
    }
}
