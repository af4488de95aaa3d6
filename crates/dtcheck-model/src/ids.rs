#![deny(unsafe_code)]

use std::fmt;

use crate::ModelError;

/// A warehouse table name, scoped to the configured schema.
///
/// Names are interpolated into SQL, so only plain identifiers are accepted:
/// a letter or underscore followed by letters, digits, `_` or `$`.
#[derive(
    Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(try_from = "String", into = "String")]
pub struct TableName(String);

impl TableName {
    pub fn new(value: impl Into<String>) -> Result<Self, ModelError> {
        let value = value.into();
        let trimmed = value.trim();
        if !is_plain_identifier(trimmed) {
            return Err(ModelError::InvalidTableName(value));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Case-insensitive comparison, matching how warehouses resolve unquoted names.
    pub fn matches(&self, other: &str) -> bool {
        self.0.eq_ignore_ascii_case(other)
    }
}

impl fmt::Display for TableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for TableName {
    type Error = ModelError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<TableName> for String {
    fn from(value: TableName) -> Self {
        value.0
    }
}

/// Returns true for `[A-Za-z_][A-Za-z0-9_$]*`.
pub fn is_plain_identifier(value: &str) -> bool {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {}
        _ => return false,
    }
    chars.all(|ch| ch.is_ascii_alphanumeric() || ch == '_' || ch == '$')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_plain_identifiers() {
        assert_eq!(TableName::new("orders").unwrap().as_str(), "orders");
        assert_eq!(TableName::new(" raw_orders ").unwrap().as_str(), "raw_orders");
        assert!(TableName::new("_stg$1").is_ok());
    }

    #[test]
    fn rejects_sql_fragments() {
        assert!(TableName::new("").is_err());
        assert!(TableName::new("1orders").is_err());
        assert!(TableName::new("orders; drop table x").is_err());
        assert!(TableName::new("\"quoted\"").is_err());
    }

    #[test]
    fn matches_ignores_case() {
        let name = TableName::new("Orders").unwrap();
        assert!(name.matches("ORDERS"));
        assert!(!name.matches("orders_v2"));
    }
}
