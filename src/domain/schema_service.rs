//! Schema registry service.
//!
//! Owns the create/set-default/delete lifecycle of regulation schemas. The
//! default-swap and delete-protection invariants live in the repository's
//! transaction; this service validates drafts and maps port errors onto the
//! domain error surface.

use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use super::Error;
use super::ports::{SchemaRepository, SchemaRepositoryError};
use super::schema::{RegulationItemDraft, RegulationSchemaDraft, SchemaWithItems};

/// Input for creating a schema with its items.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateSchemaRequest {
    /// Schema title, unique system-wide.
    pub title: String,
    /// Items to create alongside the schema.
    pub items: Vec<RegulationItemDraft>,
    /// Whether the new schema becomes the system default.
    pub is_default: bool,
    /// Acting operator, for audit attribution.
    pub actor: Option<Uuid>,
}

fn map_repository_error(error: SchemaRepositoryError) -> Error {
    match error {
        SchemaRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("schema repository unavailable: {message}"))
        }
        SchemaRepositoryError::Query { message } => {
            Error::internal(format!("schema repository error: {message}"))
        }
        SchemaRepositoryError::DuplicateTitle { title } => {
            Error::conflict(format!("schema title '{title}' already exists"))
        }
        SchemaRepositoryError::DuplicateItemTitle { title } => {
            Error::conflict(format!("item title '{title}' already exists within the schema"))
        }
        SchemaRepositoryError::HasAssignments { schema_id } => Error::conflict(format!(
            "schema {schema_id} still has live assignments; remove them first"
        )),
        SchemaRepositoryError::DefaultContention => {
            Error::conflict("another schema was made default concurrently; retry")
        }
    }
}

/// Driving service for the schema registry.
#[derive(Clone)]
pub struct SchemaRegistryService<R> {
    schemas: Arc<R>,
}

impl<R> SchemaRegistryService<R> {
    /// Create a new registry service with the schema repository.
    pub fn new(schemas: Arc<R>) -> Self {
        Self { schemas }
    }
}

impl<R> SchemaRegistryService<R>
where
    R: SchemaRepository,
{
    /// Validate and persist a schema with its items.
    ///
    /// When the draft is flagged default, the repository clears the flag on
    /// any other schema inside the same transaction.
    pub async fn create_schema(
        &self,
        request: CreateSchemaRequest,
    ) -> Result<SchemaWithItems, Error> {
        let CreateSchemaRequest {
            title,
            items,
            is_default,
            actor,
        } = request;

        let schema = SchemaWithItems::new(RegulationSchemaDraft {
            title,
            is_default,
            items,
            created_by: actor,
        })
        .map_err(|err| Error::invalid_request(format!("invalid schema draft: {err}")))?;

        self.schemas
            .insert_schema(&schema)
            .await
            .map_err(map_repository_error)?;

        info!(
            schema_id = %schema.schema.id(),
            title = schema.schema.title(),
            is_default = schema.schema.is_default(),
            items = schema.items.len(),
            "schema created"
        );
        Ok(schema)
    }

    /// Make the given schema the single system default.
    ///
    /// Idempotent when the schema is already default.
    pub async fn set_default(&self, schema_id: Uuid) -> Result<(), Error> {
        let found = self
            .schemas
            .set_default(schema_id)
            .await
            .map_err(map_repository_error)?;
        if !found {
            return Err(Error::not_found(format!("schema {schema_id} not found")));
        }
        info!(%schema_id, "schema set as default");
        Ok(())
    }

    /// Delete a schema, cascading its items.
    ///
    /// Fails with a conflict while assignments reference the schema;
    /// deletion is deliberately not cascaded to assignments so vehicle
    /// tracking state is never orphaned silently.
    pub async fn delete_schema(&self, schema_id: Uuid) -> Result<(), Error> {
        let found = self
            .schemas
            .delete_schema(schema_id)
            .await
            .map_err(map_repository_error)?;
        if !found {
            return Err(Error::not_found(format!("schema {schema_id} not found")));
        }
        info!(%schema_id, "schema deleted");
        Ok(())
    }

    /// Fetch a schema with its items.
    pub async fn get_schema(&self, schema_id: Uuid) -> Result<SchemaWithItems, Error> {
        self.schemas
            .find_by_id(schema_id)
            .await
            .map_err(map_repository_error)?
            .ok_or_else(|| Error::not_found(format!("schema {schema_id} not found")))
    }

    /// Fetch the current default schema, if one is set.
    pub async fn default_schema(&self) -> Result<Option<SchemaWithItems>, Error> {
        self.schemas
            .find_default()
            .await
            .map_err(map_repository_error)
    }

    /// List all schemas with their items.
    pub async fn list_schemas(&self) -> Result<Vec<SchemaWithItems>, Error> {
        self.schemas.list().await.map_err(map_repository_error)
    }
}

#[cfg(test)]
#[path = "schema_service_tests.rs"]
mod tests;
