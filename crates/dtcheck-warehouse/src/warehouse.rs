use std::collections::BTreeSet;

use polars::prelude::DataFrame;

use dtcheck_model::{FixtureRow, TableName, TableSchema};

use crate::Result;

/// Outcome of a clean step.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TruncateSummary {
    pub truncated: Vec<TableName>,
    /// Requested tables that do not exist yet.
    pub missing: Vec<TableName>,
}

/// Process-scoped handle to the warehouse.
///
/// Built once at startup and passed to every step that needs it. Each call
/// opens a scoped connection and releases it on every exit path.
pub trait Warehouse {
    /// Schema holding source and target tables.
    fn schema_name(&self) -> &str;

    /// Truncate every existing table in `tables` inside one transaction.
    /// Tables that do not exist are skipped.
    fn truncate_tables(&self, tables: &BTreeSet<TableName>) -> Result<TruncateSummary>;

    /// Introspect the live schema of `table`, or `None` if it does not exist.
    fn describe_table(&self, table: &TableName) -> Result<Option<TableSchema>>;

    /// Insert all rows in one batch; returns the number of rows inserted.
    fn insert_rows(&self, schema: &TableSchema, rows: &[FixtureRow]) -> Result<usize>;

    /// Read every row of the table described by `schema`.
    fn read_table(&self, schema: &TableSchema) -> Result<DataFrame>;
}
