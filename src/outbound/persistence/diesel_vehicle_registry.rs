//! PostgreSQL-backed `VehicleRegistry` implementation using Diesel ORM.
//!
//! The registry shares the fleet database in this deployment, so the lookup
//! is a plain existence query against the vehicles table.

use async_trait::async_trait;
use diesel::dsl::exists;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use crate::domain::ports::{VehicleRegistry, VehicleRegistryError};

use super::diesel_error_mapping::{map_diesel_error, map_pool_error};
use super::pool::{DbPool, PoolError};
use super::schema::vehicles;

/// Diesel-backed implementation of the vehicle registry port.
#[derive(Clone)]
pub struct DieselVehicleRegistry {
    pool: DbPool,
}

impl DieselVehicleRegistry {
    /// Create a new registry with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool(error: PoolError) -> VehicleRegistryError {
    map_pool_error(error, VehicleRegistryError::connection)
}

fn map_plain_diesel(error: diesel::result::Error) -> VehicleRegistryError {
    map_diesel_error(
        error,
        VehicleRegistryError::query,
        VehicleRegistryError::connection,
        |_| None,
    )
}

#[async_trait]
impl VehicleRegistry for DieselVehicleRegistry {
    async fn exists(&self, vehicle_id: Uuid) -> Result<bool, VehicleRegistryError> {
        let mut conn = self.pool.get().await.map_err(map_pool)?;

        diesel::select(exists(vehicles::table.find(vehicle_id)))
            .get_result(&mut conn)
            .await
            .map_err(map_plain_diesel)
    }
}
