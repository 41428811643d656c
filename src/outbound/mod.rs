//! Outbound adapters implementing domain ports for external infrastructure.
//!
//! This module follows the hexagonal architecture pattern: adapters are thin
//! translators between domain types and infrastructure-specific
//! representations. The only infrastructure in this crate is PostgreSQL,
//! reached through Diesel.

pub mod persistence;
