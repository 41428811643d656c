//! Seed the database with the basic maintenance schema.
//!
//! Runs pending migrations, then creates a "Basic" schema covering the
//! common service items and marks it as the system default. Intended for
//! fresh deployments and local development databases.

#![cfg_attr(not(any(test, doctest)), deny(clippy::unwrap_used))]
#![cfg_attr(not(any(test, doctest)), deny(clippy::expect_used))]

use std::env;
use std::sync::Arc;

use clap::Parser;
use color_eyre::eyre::{WrapErr, eyre};
use diesel::{Connection, PgConnection};
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use tokio::runtime::Builder;
use tracing_subscriber::{EnvFilter, fmt};

use fleet_regulation::domain::schema::RegulationItemDraft;
use fleet_regulation::domain::{CreateSchemaRequest, SchemaRegistryService};
use fleet_regulation::outbound::persistence::{DbPool, DieselSchemaRepository, PoolConfig};

const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// `seed-basic-schema` command arguments.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "seed-basic-schema",
    about = "Run migrations and create the default basic maintenance schema",
    version
)]
struct CliArgs {
    /// Schema title to create.
    #[arg(long = "title", value_name = "title", default_value = "Basic")]
    title: String,
    /// Skip making the seeded schema the system default.
    #[arg(long = "no-default")]
    no_default: bool,
    /// Database connection URL. Falls back to `DATABASE_URL` when omitted.
    #[arg(long = "database-url", value_name = "url")]
    database_url: Option<String>,
}

fn basic_items() -> Vec<RegulationItemDraft> {
    let item = |title: &str, every_km: i64, notify_before_km: i64| RegulationItemDraft {
        title: title.to_owned(),
        every_km,
        notify_before_km,
    };
    vec![
        item("Engine oil and filter", 10_000, 500),
        item("Air filter", 20_000, 1_000),
        item("Cabin filter", 20_000, 1_000),
        item("Brake fluid", 30_000, 2_000),
        item("Brake pads", 30_000, 2_000),
        item("Coolant", 60_000, 3_000),
        item("Gearbox oil", 60_000, 3_000),
    ]
}

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    if let Err(error) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .try_init()
    {
        eprintln!("tracing init failed: {error}");
    }

    let args = CliArgs::parse();
    let database_url = resolve_database_url(args.database_url.clone())?;

    run_migrations(&database_url)?;

    let runtime = Builder::new_current_thread()
        .enable_all()
        .build()
        .wrap_err("create Tokio runtime")?;
    runtime.block_on(seed(args, database_url))
}

fn resolve_database_url(flag: Option<String>) -> color_eyre::Result<String> {
    match flag {
        Some(url) => Ok(url),
        None => env::var("DATABASE_URL")
            .wrap_err("pass --database-url or set DATABASE_URL"),
    }
}

fn run_migrations(database_url: &str) -> color_eyre::Result<()> {
    let mut conn =
        PgConnection::establish(database_url).wrap_err("connect for migrations")?;
    let applied = conn
        .run_pending_migrations(MIGRATIONS)
        .map_err(|error| eyre!("run migrations: {error}"))?;
    for version in applied {
        tracing::info!(%version, "migration applied");
    }
    Ok(())
}

async fn seed(args: CliArgs, database_url: String) -> color_eyre::Result<()> {
    let pool = DbPool::new(PoolConfig::new(&database_url))
        .await
        .wrap_err("create database pool")?;
    let service = SchemaRegistryService::new(Arc::new(DieselSchemaRepository::new(pool)));

    let schema = service
        .create_schema(CreateSchemaRequest {
            title: args.title,
            items: basic_items(),
            is_default: !args.no_default,
            actor: None,
        })
        .await
        .map_err(|error| eyre!("create schema: {error}"))?;

    println!("schema_id={}", schema.schema.id());
    println!("title={}", schema.schema.title());
    println!("is_default={}", schema.schema.is_default());
    println!("items={}", schema.items.len());
    Ok(())
}
