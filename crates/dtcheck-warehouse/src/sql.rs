//! SQL text builders shared by warehouse backends.

use dtcheck_model::{ColumnDescriptor, ColumnType, TableSchema};

pub const DEFAULT_SCHEMA: &str = "main";

/// Double-quote an identifier, doubling embedded quotes.
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

pub fn qualified(schema: &str, table: &str) -> String {
    format!("{}.{}", quote_ident(schema), quote_ident(table))
}

/// How a column is read back from the warehouse.
///
/// Fixed-point columns come back as doubles, like the float artifacts a
/// dataframe reader produces for `DECIMAL`; normalization corrects them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractKind {
    Integer,
    Double,
    EpochMicros,
    Text,
}

impl ExtractKind {
    pub fn for_type(column_type: &ColumnType) -> Self {
        match column_type {
            ColumnType::Integer => Self::Integer,
            ColumnType::Decimal { .. } | ColumnType::Float => Self::Double,
            ColumnType::Timestamp => Self::EpochMicros,
            // Read as digits so values past i64 survive extraction.
            ColumnType::WideInteger
            | ColumnType::Boolean
            | ColumnType::Date
            | ColumnType::Text
            | ColumnType::Other(_) => Self::Text,
        }
    }

    fn select_expr(self, column: &ColumnDescriptor) -> String {
        let ident = quote_ident(&column.name);
        let expr = match self {
            Self::Integer => format!("CAST({ident} AS BIGINT)"),
            Self::Double => format!("CAST({ident} AS DOUBLE)"),
            Self::EpochMicros => format!("epoch_us({ident})"),
            Self::Text => format!("CAST({ident} AS VARCHAR)"),
        };
        format!("{expr} AS {ident}")
    }
}

/// `SELECT` over every column of the live schema, in ordinal order.
pub fn select_statement(schema: &TableSchema) -> String {
    let columns: Vec<String> = schema
        .columns
        .iter()
        .map(|column| ExtractKind::for_type(&column.column_type).select_expr(column))
        .collect();
    format!(
        "SELECT {} FROM {}",
        columns.join(", "),
        qualified(&schema.schema, schema.table.as_str())
    )
}

/// Multi-row `INSERT` with one placeholder per cell, each cast to the
/// column's declared type.
pub fn insert_statement(schema: &TableSchema, columns: &[&ColumnDescriptor], rows: usize) -> String {
    let names: Vec<String> = columns
        .iter()
        .map(|column| quote_ident(&column.name))
        .collect();
    let placeholders: Vec<String> = columns
        .iter()
        .map(|column| format!("CAST(? AS {})", column.declared_type))
        .collect();
    let tuple = format!("({})", placeholders.join(", "));
    let values = vec![tuple; rows].join(", ");
    format!(
        "INSERT INTO {} ({}) VALUES {}",
        qualified(&schema.schema, schema.table.as_str()),
        names.join(", "),
        values
    )
}

pub fn truncate_statement(schema: &str, table: &str) -> String {
    format!("TRUNCATE {}", qualified(schema, table))
}

pub const LIST_TABLES: &str = "SELECT table_name FROM information_schema.tables \
     WHERE table_catalog = current_database() AND table_schema = ?";

/// Columns of every case-insensitive match; the caller picks one table.
pub const DESCRIBE_TABLE: &str = "SELECT table_name, column_name, data_type \
     FROM information_schema.columns \
     WHERE table_catalog = current_database() AND table_schema = ? \
     AND lower(table_name) = lower(?) \
     ORDER BY table_name, ordinal_position";
