//! Column-wise normalization of extracted frames into canonical tables.

use std::borrow::Cow;

use polars::prelude::{AnyValue, Column, DataFrame, DataType};
use tracing::debug;

use dtcheck_model::{CanonicalRecord, CanonicalTable, ColumnDescriptor, NULL_TOKEN};

use crate::error::{NormalizeError, Result};
use crate::value::{is_null, render_value};

/// Normalize an extracted frame into a [`CanonicalTable`].
///
/// Columns follow `columns` (the live schema order); rows follow the frame.
/// For each column:
///
/// 1. null classification is taken from the raw, uncorrected values;
/// 2. exact zero-scale columns holding floats are cast to nullable `Int64`;
/// 3. each cell is rendered, and the null token replaces every null-equivalent cell.
///
/// Frame columns without a descriptor are ignored.
pub fn normalize_table(frame: &DataFrame, columns: &[ColumnDescriptor]) -> Result<CanonicalTable> {
    let height = frame.height();
    let mut records = vec![CanonicalRecord::new(); height];

    for descriptor in columns {
        let raw = frame
            .column(&descriptor.name)
            .map_err(|_| NormalizeError::MissingColumn {
                column: descriptor.name.clone(),
            })?;
        let nulls = null_mask(raw)?;
        let corrected = correct_integer_column(raw, descriptor)?;

        for (idx, record) in records.iter_mut().enumerate() {
            let cell = if nulls[idx] {
                NULL_TOKEN.to_string()
            } else {
                let value = corrected.get(idx)?;
                if matches!(value, AnyValue::Null) {
                    // Non-finite floats do not survive the integer cast.
                    render_value(&raw.get(idx)?, descriptor)
                } else {
                    render_value(&value, descriptor)
                }
            };
            record.insert(descriptor.name.clone(), cell);
        }
    }

    debug!(
        column_count = columns.len(),
        row_count = height,
        "normalized table"
    );

    let names = columns.iter().map(|column| column.name.clone()).collect();
    Ok(CanonicalTable::new(names, records))
}

fn null_mask(column: &Column) -> Result<Vec<bool>> {
    let mut mask = Vec::with_capacity(column.len());
    for idx in 0..column.len() {
        mask.push(is_null(&column.get(idx)?));
    }
    Ok(mask)
}

/// Fixed-point integer correction: float artifacts of zero-scale columns
/// become nullable integers. Other columns pass through untouched.
fn correct_integer_column<'a>(
    column: &'a Column,
    descriptor: &ColumnDescriptor,
) -> Result<Cow<'a, Column>> {
    let is_float = matches!(column.dtype(), DataType::Float32 | DataType::Float64);
    if descriptor.is_exact_zero_scale() && is_float {
        Ok(Cow::Owned(column.cast(&DataType::Int64)?))
    } else {
        Ok(Cow::Borrowed(column))
    }
}
