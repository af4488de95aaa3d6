//! Shared data model for the dtcheck harness.
//!
//! - **ids**: validated table identifiers
//! - **column**: column descriptors and declared warehouse types
//! - **fixture**: fixture rows inserted into source tables
//! - **canonical**: canonical tables and the result set handed to assertions

pub mod canonical;
pub mod column;
pub mod error;
pub mod fixture;
pub mod ids;

pub use canonical::{ActualSet, CanonicalRecord, CanonicalTable, NULL_TOKEN};
pub use column::{ColumnDescriptor, ColumnType, TableSchema};
pub use error::{ModelError, Result};
pub use fixture::{FixtureRow, FixtureValue};
pub use ids::TableName;
