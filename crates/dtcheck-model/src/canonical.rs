//! Canonical tables: the comparable form of extracted warehouse data.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::TableName;

/// Canonical value of every null-equivalent cell.
pub const NULL_TOKEN: &str = "{NULL}";

/// One row of a canonical table: column name to canonical cell value.
pub type CanonicalRecord = BTreeMap<String, String>;

/// Ordered column names plus canonical records.
///
/// Built once per target table per run and not mutated afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalTable {
    pub columns: Vec<String>,
    pub records: Vec<CanonicalRecord>,
}

impl CanonicalTable {
    pub fn new(columns: Vec<String>, records: Vec<CanonicalRecord>) -> Self {
        Self { columns, records }
    }

    pub fn row_count(&self) -> usize {
        self.records.len()
    }
}

/// Extracted target tables keyed by table name, handed to `load_actuals`.
pub type ActualSet = BTreeMap<TableName, CanonicalTable>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_with_records_and_columns() {
        let mut record = CanonicalRecord::new();
        record.insert("id".to_string(), "1".to_string());
        let table = CanonicalTable::new(vec!["id".to_string()], vec![record]);
        let json = serde_json::to_value(&table).unwrap();
        assert_eq!(json["columns"][0], "id");
        assert_eq!(json["records"][0]["id"], "1");
        assert_eq!(table.row_count(), 1);
    }
}
