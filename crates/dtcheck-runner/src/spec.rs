//! The specification collaborator contract.

use std::collections::BTreeMap;

use thiserror::Error;

use dtcheck_model::{ActualSet, FixtureRow, TableName};

use crate::SpecError;

/// Fixture data for one source table.
pub trait SourceFixture {
    /// Rows to insert, one mapping per row.
    fn serialize(&self) -> Vec<FixtureRow>;
}

/// A test specification, as seen by the run orchestrator.
///
/// The orchestrator only reads the table names of `sources` and `targets`,
/// serializes sources, and hands extracted results back for assertion.
pub trait Specification {
    type Source: SourceFixture;
    type Target;

    fn sources(&self) -> &BTreeMap<TableName, Self::Source>;

    fn targets(&self) -> &BTreeMap<TableName, Self::Target>;

    /// Materialize concrete fixture rows.
    fn generate_sources(&mut self) -> Result<(), SpecError>;

    /// Receive normalized target tables keyed by table name.
    fn load_actuals(&mut self, actuals: ActualSet);

    /// Check the loaded actuals against expectations.
    fn assert_expectations(&self) -> Result<(), Vec<ExpectationFailure>>;
}

/// One reason a target table did not match its expectations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExpectationFailure {
    #[error("{table}: no actual data was loaded")]
    MissingActuals { table: TableName },

    #[error("{table}: expected column '{column}' is not in the actual table")]
    MissingColumn { table: TableName, column: String },

    #[error("{table}: expected {expected} rows, found {actual}")]
    RowCount {
        table: TableName,
        expected: usize,
        actual: usize,
    },

    #[error("{table}: {missing} expected rows not found, {unexpected} unexpected rows")]
    Records {
        table: TableName,
        missing: usize,
        unexpected: usize,
    },

    #[error("{table}: row {row} differs from expectation")]
    RowOrder { table: TableName, row: usize },
}

impl ExpectationFailure {
    pub fn table(&self) -> &TableName {
        match self {
            Self::MissingActuals { table }
            | Self::MissingColumn { table, .. }
            | Self::RowCount { table, .. }
            | Self::Records { table, .. }
            | Self::RowOrder { table, .. } => table,
        }
    }
}
