//! Column descriptors sourced from live warehouse schema introspection.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::TableName;

/// Declared warehouse type of a column, reduced to what normalization needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ColumnType {
    /// Fixed-point numeric (`DECIMAL(p,s)`, `NUMERIC`, `NUMBER`).
    Decimal { precision: u8, scale: u8 },
    /// Native integer types that fit in 64 signed bits. Exact numerics with zero scale.
    Integer,
    /// `HUGEINT`, `UBIGINT`, `UHUGEINT`: zero-scale integers that may exceed `i64`.
    WideInteger,
    /// Binary floating point (`FLOAT`, `DOUBLE`, `REAL`).
    Float,
    Boolean,
    Date,
    Timestamp,
    Text,
    /// Anything else, kept under its declared name.
    Other(String),
}

/// Precision and scale of an undecorated `NUMBER`/`DECIMAL`.
const DEFAULT_DECIMAL: (u8, u8) = (38, 0);

impl ColumnType {
    /// Parses a declared type as reported by `information_schema.columns.data_type`.
    ///
    /// ```
    /// use dtcheck_model::ColumnType;
    ///
    /// assert_eq!(
    ///     ColumnType::parse("DECIMAL(18,2)"),
    ///     ColumnType::Decimal { precision: 18, scale: 2 }
    /// );
    /// assert_eq!(ColumnType::parse("bigint"), ColumnType::Integer);
    /// assert_eq!(ColumnType::parse("TIMESTAMP WITH TIME ZONE"), ColumnType::Timestamp);
    /// ```
    pub fn parse(declared: &str) -> Self {
        let upper = declared.trim().to_ascii_uppercase();
        let (base, args) = match upper.split_once('(') {
            Some((base, rest)) => (base.trim(), Some(rest.trim_end_matches(')'))),
            None => (upper.as_str(), None),
        };
        match base {
            "DECIMAL" | "NUMERIC" | "NUMBER" => {
                let (precision, scale) = args
                    .and_then(parse_precision_scale)
                    .unwrap_or(DEFAULT_DECIMAL);
                Self::Decimal { precision, scale }
            }
            "TINYINT" | "SMALLINT" | "INTEGER" | "INT" | "BIGINT" | "UTINYINT" | "USMALLINT"
            | "UINTEGER" | "INT1" | "INT2" | "INT4" | "INT8" | "BYTEINT" | "SHORT" | "LONG" => {
                Self::Integer
            }
            "HUGEINT" | "INT128" | "UBIGINT" | "UHUGEINT" | "UINT64" | "UINT128" => {
                Self::WideInteger
            }
            "FLOAT" | "FLOAT4" | "FLOAT8" | "DOUBLE" | "DOUBLE PRECISION" | "REAL" => Self::Float,
            "BOOLEAN" | "BOOL" | "LOGICAL" => Self::Boolean,
            "DATE" => Self::Date,
            "VARCHAR" | "TEXT" | "STRING" | "CHAR" | "CHARACTER" | "CHARACTER VARYING" | "BPCHAR"
            | "NVARCHAR" => Self::Text,
            other if other.starts_with("TIMESTAMP") || other == "DATETIME" => Self::Timestamp,
            _ => Self::Other(declared.trim().to_string()),
        }
    }

    /// Exact numeric type with zero declared fractional digits.
    pub fn is_exact_zero_scale(&self) -> bool {
        matches!(
            self,
            Self::Integer | Self::WideInteger | Self::Decimal { scale: 0, .. }
        )
    }

    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            Self::Decimal { .. } | Self::Integer | Self::WideInteger | Self::Float
        )
    }
}

fn parse_precision_scale(args: &str) -> Option<(u8, u8)> {
    let mut parts = args.split(',').map(str::trim);
    let precision = parts.next()?.parse().ok()?;
    let scale = match parts.next() {
        Some(scale) => scale.parse().ok()?,
        None => 0,
    };
    Some((precision, scale))
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Decimal { precision, scale } => write!(f, "DECIMAL({precision},{scale})"),
            Self::Integer => f.write_str("INTEGER"),
            Self::WideInteger => f.write_str("HUGEINT"),
            Self::Float => f.write_str("DOUBLE"),
            Self::Boolean => f.write_str("BOOLEAN"),
            Self::Date => f.write_str("DATE"),
            Self::Timestamp => f.write_str("TIMESTAMP"),
            Self::Text => f.write_str("VARCHAR"),
            Self::Other(name) => f.write_str(name),
        }
    }
}

/// Metadata for one column of a warehouse table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDescriptor {
    pub name: String,
    /// Type exactly as the warehouse declared it, used when casting inserts.
    pub declared_type: String,
    pub column_type: ColumnType,
}

impl ColumnDescriptor {
    pub fn new(name: impl Into<String>, declared_type: impl Into<String>) -> Self {
        let declared_type = declared_type.into();
        let column_type = ColumnType::parse(&declared_type);
        Self {
            name: name.into(),
            declared_type,
            column_type,
        }
    }

    pub fn is_exact_zero_scale(&self) -> bool {
        self.column_type.is_exact_zero_scale()
    }

    pub fn is_numeric(&self) -> bool {
        self.column_type.is_numeric()
    }
}

/// Live schema of one table, columns in warehouse ordinal order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSchema {
    pub schema: String,
    /// Name as stored by the warehouse, which may differ in case from the request.
    pub table: TableName,
    pub columns: Vec<ColumnDescriptor>,
}

impl TableSchema {
    pub fn column(&self, name: &str) -> Option<&ColumnDescriptor> {
        self.columns
            .iter()
            .find(|column| column.name.eq_ignore_ascii_case(name))
    }

    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|column| column.name.clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decimal_defaults_to_zero_scale() {
        assert_eq!(
            ColumnType::parse("NUMBER"),
            ColumnType::Decimal {
                precision: 38,
                scale: 0
            }
        );
        assert_eq!(
            ColumnType::parse("numeric(10)"),
            ColumnType::Decimal {
                precision: 10,
                scale: 0
            }
        );
    }

    #[test]
    fn zero_scale_classification() {
        assert!(ColumnType::parse("DECIMAL(38,0)").is_exact_zero_scale());
        assert!(ColumnType::parse("INTEGER").is_exact_zero_scale());
        assert!(ColumnType::parse("UBIGINT").is_exact_zero_scale());
        assert!(!ColumnType::parse("DECIMAL(10,2)").is_exact_zero_scale());
        assert!(!ColumnType::parse("DOUBLE").is_exact_zero_scale());
    }

    #[test]
    fn integers_beyond_i64_are_wide() {
        assert_eq!(ColumnType::parse("BIGINT"), ColumnType::Integer);
        for declared in ["UBIGINT", "hugeint", "UHUGEINT"] {
            assert_eq!(ColumnType::parse(declared), ColumnType::WideInteger);
        }
        assert!(ColumnType::WideInteger.is_numeric());
    }

    #[test]
    fn numeric_classification() {
        assert!(ColumnType::parse("DOUBLE").is_numeric());
        assert!(ColumnType::parse("DECIMAL(10,2)").is_numeric());
        assert!(!ColumnType::parse("VARCHAR").is_numeric());
        assert!(!ColumnType::parse("DATE").is_numeric());
        assert!(!ColumnType::parse("BOOLEAN").is_numeric());
    }

    #[test]
    fn unknown_types_keep_declared_name() {
        assert_eq!(
            ColumnType::parse(" INTERVAL "),
            ColumnType::Other("INTERVAL".to_string())
        );
        assert_eq!(ColumnType::parse("VARCHAR(255)"), ColumnType::Text);
    }

    #[test]
    fn schema_lookup_is_case_insensitive() {
        let schema = TableSchema {
            schema: "main".to_string(),
            table: TableName::new("orders").unwrap(),
            columns: vec![
                ColumnDescriptor::new("ID", "INTEGER"),
                ColumnDescriptor::new("AMOUNT", "DECIMAL(10,2)"),
            ],
        };
        assert_eq!(schema.column("amount").unwrap().name, "AMOUNT");
        assert!(schema.column("missing").is_none());
        assert_eq!(schema.column_names(), vec!["ID", "AMOUNT"]);
    }
}
