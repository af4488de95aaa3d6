//! Library components of the `dtcheck` command-line tool.

pub mod config;
pub mod logging;
pub mod summary;
