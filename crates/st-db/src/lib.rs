//! st-db - Database abstraction layer for Strata
//!
//! This crate provides the synchronous `Database` handle trait the migration
//! engine is written against, and its DuckDB implementation.

pub mod duckdb;
pub mod error;
pub mod traits;

pub use duckdb::DuckDbBackend;
pub use error::{DbError, DbResult};
pub use traits::Database;
