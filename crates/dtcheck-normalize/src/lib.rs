//! Canonical normalization for extracted warehouse data.
//!
//! - **value**: null classification and canonical rendering of single cells
//! - **table**: column-wise normalization of a DataFrame into a [`CanonicalTable`]
//!
//! [`CanonicalTable`]: dtcheck_model::CanonicalTable

pub mod error;
pub mod table;
pub mod value;

pub use error::{NormalizeError, Result};
pub use table::normalize_table;
pub use value::{
    NOT_A_TIME, canonical_cell, is_nan, is_null, render_fixed, render_integer, render_plain,
    render_value,
};
