//! Warehouse access for the dtcheck harness.
//!
//! The [`Warehouse`] trait is the seam the run orchestrator talks to. Every
//! operation opens its own scoped connection and releases it before returning.
//! [`DuckDbWarehouse`] is the bundled implementation.

pub mod backend;
pub mod config;
pub mod error;
pub mod sql;
pub mod warehouse;

pub use backend::DuckDbWarehouse;
pub use config::WarehouseConfig;
pub use error::{Result, WarehouseError};
pub use warehouse::{TruncateSummary, Warehouse};
