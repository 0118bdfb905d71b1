//! Database trait definition

use crate::error::DbResult;

/// Database handle the migration engine runs against.
///
/// All calls are blocking. Implementations must be Send + Sync so a handle can
/// be shared behind an `Arc`, but the engine only ever issues one call at a
/// time and never nests transactions.
pub trait Database: Send + Sync {
    /// Execute a single statement, returns affected rows
    fn execute(&self, sql: &str) -> DbResult<usize>;

    /// Execute a single statement with positional string parameters
    fn execute_with_params(&self, sql: &str, params: &[&str]) -> DbResult<usize>;

    /// Execute multiple SQL statements
    fn execute_batch(&self, sql: &str) -> DbResult<()>;

    /// Check if a table or view exists
    fn relation_exists(&self, name: &str) -> DbResult<bool>;

    /// Run a query and return the first column of every row as a string
    fn query_strings(&self, sql: &str) -> DbResult<Vec<String>>;

    /// List base tables of the current schema, sorted by name
    fn list_tables(&self) -> DbResult<Vec<String>>;

    /// Open a transaction
    fn begin(&self) -> DbResult<()>;

    /// Commit the open transaction
    fn commit(&self) -> DbResult<()>;

    /// Roll back the open transaction
    fn rollback(&self) -> DbResult<()>;

    /// Quote an identifier for use in generated SQL
    fn quote_identifier(&self, name: &str) -> String {
        format!("\"{}\"", name.replace('"', "\"\""))
    }

    /// Database type identifier for logging
    fn db_type(&self) -> &'static str;
}
