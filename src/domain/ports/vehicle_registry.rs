//! Port to the external vehicle registry collaborator.
//!
//! The core only asks whether a vehicle id exists; vehicle lifecycle is
//! owned elsewhere.

use async_trait::async_trait;
use uuid::Uuid;

/// Errors raised by vehicle registry adapters.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VehicleRegistryError {
    /// Registry connection could not be established.
    #[error("vehicle registry connection failed: {message}")]
    Connection { message: String },

    /// Lookup failed during execution.
    #[error("vehicle registry lookup failed: {message}")]
    Query { message: String },
}

impl VehicleRegistryError {
    /// Create a connection error with the given message.
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Create a query error with the given message.
    pub fn query(message: impl Into<String>) -> Self {
        Self::Query {
            message: message.into(),
        }
    }
}

/// Port for vehicle identity checks.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait VehicleRegistry: Send + Sync {
    /// Whether the vehicle id is known to the registry.
    async fn exists(&self, vehicle_id: Uuid) -> Result<bool, VehicleRegistryError>;
}

/// Fixture registry that accepts every vehicle id.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureVehicleRegistry;

#[async_trait]
impl VehicleRegistry for FixtureVehicleRegistry {
    async fn exists(&self, _vehicle_id: Uuid) -> Result<bool, VehicleRegistryError> {
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.

    use rstest::rstest;

    use super::*;

    #[rstest]
    #[tokio::test]
    async fn fixture_accepts_any_vehicle() {
        let registry = FixtureVehicleRegistry;
        assert!(registry
            .exists(Uuid::new_v4())
            .await
            .expect("fixture lookup succeeds"));
    }
}
