//! PostgreSQL-backed `SchemaRepository` implementation using Diesel ORM.
//!
//! The default-flag singleton is enforced with a clear-all-then-set-one swap
//! inside one transaction, backed by a partial unique index on `is_default`.
//! Delete protection rides on the `ON DELETE RESTRICT` foreign key from
//! assignments, so a racing assignment still blocks deletion.

use std::collections::HashMap;

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, RunQueryDsl};
use uuid::Uuid;

use crate::domain::ports::{SchemaRepository, SchemaRepositoryError};
use crate::domain::schema::{RegulationItem, SchemaWithItems};

use super::diesel_error_mapping::{ConstraintViolation, map_diesel_error, map_pool_error};
use super::models::{ItemRow, NewItemRow, NewSchemaRow, SchemaRow};
use super::pool::{DbPool, PoolError};
use super::row_mapping::{item_from_row, schema_from_row};
use super::schema::{regulation_assignments, regulation_items, regulation_schemas};

/// Diesel-backed implementation of the schema repository port.
#[derive(Clone)]
pub struct DieselSchemaRepository {
    pool: DbPool,
}

impl DieselSchemaRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool(error: PoolError) -> SchemaRepositoryError {
    map_pool_error(error, SchemaRepositoryError::connection)
}

fn map_plain_diesel(error: diesel::result::Error) -> SchemaRepositoryError {
    map_diesel_error(
        error,
        SchemaRepositoryError::query,
        SchemaRepositoryError::connection,
        |_| None,
    )
}

/// Translate a unique violation during schema insertion by constraint name.
///
/// Two racing `is_default = true` inserts each clear the flag inside their
/// own snapshot, so the loser trips the partial single-default index, not
/// the title index.
fn unique_violation_on_insert(constraint: Option<&str>, title: String) -> SchemaRepositoryError {
    match constraint {
        Some("regulation_schemas_single_default") => SchemaRepositoryError::DefaultContention,
        _ => SchemaRepositoryError::duplicate_title(title),
    }
}

fn rows_to_schema(
    schema: SchemaRow,
    items: Vec<ItemRow>,
) -> Result<SchemaWithItems, SchemaRepositoryError> {
    let schema = schema_from_row(schema).map_err(SchemaRepositoryError::query)?;
    let items = items
        .into_iter()
        .map(item_from_row)
        .collect::<Result<Vec<RegulationItem>, _>>()
        .map_err(SchemaRepositoryError::query)?;
    Ok(SchemaWithItems { schema, items })
}

#[async_trait]
impl SchemaRepository for DieselSchemaRepository {
    async fn insert_schema(&self, schema: &SchemaWithItems) -> Result<(), SchemaRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool)?;

        let new_schema = NewSchemaRow {
            id: schema.schema.id(),
            title: schema.schema.title(),
            is_default: schema.schema.is_default(),
            created_by: schema.schema.created_by(),
            created_at: schema.schema.created_at(),
        };
        let new_items: Vec<NewItemRow<'_>> = schema
            .items
            .iter()
            .map(|item| NewItemRow {
                id: item.id(),
                schema_id: item.schema_id(),
                title: item.title(),
                every_km: item.every_km(),
                notify_before_km: item.notify_before_km(),
            })
            .collect();
        let make_default = schema.schema.is_default();

        conn.transaction(|conn| {
            async move {
                if make_default {
                    diesel::update(
                        regulation_schemas::table.filter(regulation_schemas::is_default.eq(true)),
                    )
                    .set(regulation_schemas::is_default.eq(false))
                    .execute(conn)
                    .await?;
                }

                diesel::insert_into(regulation_schemas::table)
                    .values(&new_schema)
                    .execute(conn)
                    .await?;

                if !new_items.is_empty() {
                    diesel::insert_into(regulation_items::table)
                        .values(&new_items)
                        .execute(conn)
                        .await?;
                }

                Ok(())
            }
            .scope_boxed()
        })
        .await
        .map_err(|error| {
            let title = schema.schema.title().to_owned();
            map_diesel_error(
                error,
                SchemaRepositoryError::query,
                SchemaRepositoryError::connection,
                move |violation| match violation {
                    ConstraintViolation::Unique(constraint) => {
                        Some(unique_violation_on_insert(constraint.as_deref(), title))
                    }
                    ConstraintViolation::ForeignKey(_) => None,
                },
            )
        })
    }

    async fn set_default(&self, schema_id: Uuid) -> Result<bool, SchemaRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool)?;

        // The target is locked and confirmed to exist before any flag is
        // cleared, so an unknown id commits nothing and the current default
        // survives.
        conn.transaction::<bool, diesel::result::Error, _>(|conn| {
            async move {
                let target: Option<Uuid> = regulation_schemas::table
                    .find(schema_id)
                    .select(regulation_schemas::id)
                    .for_update()
                    .first::<Uuid>(conn)
                    .await
                    .optional()?;
                if target.is_none() {
                    return Ok(false);
                }

                diesel::update(
                    regulation_schemas::table
                        .filter(regulation_schemas::is_default.eq(true))
                        .filter(regulation_schemas::id.ne(schema_id)),
                )
                .set(regulation_schemas::is_default.eq(false))
                .execute(conn)
                .await?;

                diesel::update(regulation_schemas::table.find(schema_id))
                    .set(regulation_schemas::is_default.eq(true))
                    .execute(conn)
                    .await?;

                Ok(true)
            }
            .scope_boxed()
        })
        .await
        .map_err(map_plain_diesel)
    }

    async fn delete_schema(&self, schema_id: Uuid) -> Result<bool, SchemaRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool)?;

        let references: i64 = regulation_assignments::table
            .filter(regulation_assignments::schema_id.eq(schema_id))
            .count()
            .get_result(&mut conn)
            .await
            .map_err(map_plain_diesel)?;
        if references > 0 {
            return Err(SchemaRepositoryError::HasAssignments { schema_id });
        }

        let deleted = diesel::delete(regulation_schemas::table.find(schema_id))
            .execute(&mut conn)
            .await
            .map_err(|error| {
                map_diesel_error(
                    error,
                    SchemaRepositoryError::query,
                    SchemaRepositoryError::connection,
                    // A racing assignment can still land between the count and
                    // the delete; the restrict rule reports it here.
                    |violation| match violation {
                        ConstraintViolation::ForeignKey(_) => {
                            Some(SchemaRepositoryError::HasAssignments { schema_id })
                        }
                        ConstraintViolation::Unique(_) => None,
                    },
                )
            })?;

        Ok(deleted > 0)
    }

    async fn find_by_id(
        &self,
        schema_id: Uuid,
    ) -> Result<Option<SchemaWithItems>, SchemaRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool)?;

        let row = regulation_schemas::table
            .find(schema_id)
            .select(SchemaRow::as_select())
            .first::<SchemaRow>(&mut conn)
            .await
            .optional()
            .map_err(map_plain_diesel)?;
        let Some(row) = row else {
            return Ok(None);
        };

        let items = regulation_items::table
            .filter(regulation_items::schema_id.eq(schema_id))
            .order(regulation_items::title.asc())
            .select(ItemRow::as_select())
            .load::<ItemRow>(&mut conn)
            .await
            .map_err(map_plain_diesel)?;

        rows_to_schema(row, items).map(Some)
    }

    async fn find_default(&self) -> Result<Option<SchemaWithItems>, SchemaRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool)?;

        let row = regulation_schemas::table
            .filter(regulation_schemas::is_default.eq(true))
            .select(SchemaRow::as_select())
            .first::<SchemaRow>(&mut conn)
            .await
            .optional()
            .map_err(map_plain_diesel)?;
        let Some(row) = row else {
            return Ok(None);
        };

        let schema_id = row.id;
        let items = regulation_items::table
            .filter(regulation_items::schema_id.eq(schema_id))
            .order(regulation_items::title.asc())
            .select(ItemRow::as_select())
            .load::<ItemRow>(&mut conn)
            .await
            .map_err(map_plain_diesel)?;

        rows_to_schema(row, items).map(Some)
    }

    async fn list(&self) -> Result<Vec<SchemaWithItems>, SchemaRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool)?;

        let schema_rows = regulation_schemas::table
            .order(regulation_schemas::title.asc())
            .select(SchemaRow::as_select())
            .load::<SchemaRow>(&mut conn)
            .await
            .map_err(map_plain_diesel)?;

        let item_rows = regulation_items::table
            .order(regulation_items::title.asc())
            .select(ItemRow::as_select())
            .load::<ItemRow>(&mut conn)
            .await
            .map_err(map_plain_diesel)?;

        let mut grouped: HashMap<Uuid, Vec<ItemRow>> = HashMap::new();
        for item in item_rows {
            grouped.entry(item.schema_id).or_default().push(item);
        }

        schema_rows
            .into_iter()
            .map(|row| {
                let items = grouped.remove(&row.id).unwrap_or_default();
                rows_to_schema(row, items)
            })
            .collect()
    }
}
