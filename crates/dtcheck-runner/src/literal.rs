//! YAML specifications with literal fixture rows and expected records.
//!
//! ```yaml
//! sources:
//!   raw_orders:
//!     - { id: 1, amount: "10.50" }
//! targets:
//!   orders:
//!     - { id: 1, amount: "21.0000" }
//!   order_log:
//!     ordered: true
//!     records:
//!       - { id: 1 }
//! ```
//!
//! Expected records are compared against the canonical actuals on the
//! columns they mention. Keys absent from a record expect the null token.
//! Expected values are canonical strings, so fractional numbers must be
//! quoted with four decimals (`"21.0000"`); a bare YAML float is rejected.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;

use serde::Deserialize;
use tracing::debug;

use dtcheck_model::{
    ActualSet, CanonicalTable, FixtureRow, FixtureValue, NULL_TOKEN, TableName,
};

use crate::SpecError;
use crate::spec::{ExpectationFailure, SourceFixture, Specification};

/// Literal rows for one source table.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct LiteralSource {
    pub rows: Vec<FixtureRow>,
}

impl SourceFixture for LiteralSource {
    fn serialize(&self) -> Vec<FixtureRow> {
        self.rows.clone()
    }
}

/// Expected records for one target table, in canonical form.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(from = "TargetDocument")]
pub struct LiteralTarget {
    pub records: Vec<FixtureRow>,
    /// Compare row by row in extraction order instead of as a multiset.
    pub ordered: bool,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum TargetDocument {
    Records(Vec<FixtureRow>),
    Detailed {
        records: Vec<FixtureRow>,
        #[serde(default)]
        ordered: bool,
    },
}

impl From<TargetDocument> for LiteralTarget {
    fn from(document: TargetDocument) -> Self {
        match document {
            TargetDocument::Records(records) => Self {
                records,
                ordered: false,
            },
            TargetDocument::Detailed { records, ordered } => Self { records, ordered },
        }
    }
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct Document {
    #[serde(default)]
    sources: BTreeMap<TableName, LiteralSource>,
    #[serde(default)]
    targets: BTreeMap<TableName, LiteralTarget>,
}

#[derive(Debug, Clone)]
pub struct LiteralSpecification {
    name: String,
    sources: BTreeMap<TableName, LiteralSource>,
    targets: BTreeMap<TableName, LiteralTarget>,
    actuals: Option<ActualSet>,
}

impl LiteralSpecification {
    pub fn from_path(path: &Path) -> Result<Self, SpecError> {
        let text = fs::read_to_string(path).map_err(|source| SpecError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&path.display().to_string(), &text)
    }

    pub fn from_yaml_str(name: &str, text: &str) -> Result<Self, SpecError> {
        let document: Document =
            serde_yaml::from_str(text).map_err(|source| SpecError::Parse {
                name: name.to_string(),
                source,
            })?;

        if let Some(table) = document
            .sources
            .keys()
            .find(|table| document.targets.contains_key(*table))
        {
            return Err(SpecError::Invalid {
                name: name.to_string(),
                message: format!("table '{table}' is both a source and a target"),
            });
        }
        if document.targets.is_empty() {
            return Err(SpecError::Invalid {
                name: name.to_string(),
                message: "no target tables".to_string(),
            });
        }
        if let Some(message) = bare_float_expectation(&document.targets) {
            return Err(SpecError::Invalid {
                name: name.to_string(),
                message,
            });
        }

        Ok(Self {
            name: name.to_string(),
            sources: document.sources,
            targets: document.targets,
            actuals: None,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn actuals(&self) -> Option<&ActualSet> {
        self.actuals.as_ref()
    }
}

impl Specification for LiteralSpecification {
    type Source = LiteralSource;
    type Target = LiteralTarget;

    fn sources(&self) -> &BTreeMap<TableName, LiteralSource> {
        &self.sources
    }

    fn targets(&self) -> &BTreeMap<TableName, LiteralTarget> {
        &self.targets
    }

    fn generate_sources(&mut self) -> Result<(), SpecError> {
        // Rows are literal; nothing to synthesize.
        debug!(spec = %self.name, source_count = self.sources.len(), "sources ready");
        Ok(())
    }

    fn load_actuals(&mut self, actuals: ActualSet) {
        self.actuals = Some(actuals);
    }

    fn assert_expectations(&self) -> Result<(), Vec<ExpectationFailure>> {
        let mut failures = Vec::new();
        for (table, target) in &self.targets {
            match self.actuals.as_ref().and_then(|actuals| actuals.get(table)) {
                Some(actual) => compare_table(table, target, actual, &mut failures),
                None => failures.push(ExpectationFailure::MissingActuals {
                    table: table.clone(),
                }),
            }
        }
        if failures.is_empty() {
            Ok(())
        } else {
            Err(failures)
        }
    }
}

/// A float can never equal a canonical cell, so point at the quoted form.
fn bare_float_expectation(targets: &BTreeMap<TableName, LiteralTarget>) -> Option<String> {
    targets.iter().find_map(|(table, target)| {
        target.records.iter().find_map(|record| {
            record.iter().find_map(|(column, value)| match value {
                FixtureValue::Float(v) => Some(format!(
                    "target '{table}' column '{column}' expects bare number {v}; \
                     write the canonical string \"{v:.4}\" instead"
                )),
                _ => None,
            })
        })
    })
}

fn compare_table(
    table: &TableName,
    target: &LiteralTarget,
    actual: &CanonicalTable,
    failures: &mut Vec<ExpectationFailure>,
) {
    let expected_columns: BTreeSet<&str> = target
        .records
        .iter()
        .flat_map(|record| record.keys().map(String::as_str))
        .collect();

    let mut resolved = Vec::with_capacity(expected_columns.len());
    for column in &expected_columns {
        match actual
            .columns
            .iter()
            .find(|name| name.eq_ignore_ascii_case(column))
        {
            Some(name) => resolved.push((*column, name.as_str())),
            None => failures.push(ExpectationFailure::MissingColumn {
                table: table.clone(),
                column: (*column).to_string(),
            }),
        }
    }
    if resolved.len() != expected_columns.len() {
        return;
    }

    let expected: Vec<Vec<String>> = target
        .records
        .iter()
        .map(|record| {
            resolved
                .iter()
                .map(|(column, _)| {
                    record
                        .get(*column)
                        .map_or_else(|| NULL_TOKEN.to_string(), FixtureValue::to_canonical)
                })
                .collect()
        })
        .collect();
    let found: Vec<Vec<String>> = actual
        .records
        .iter()
        .map(|record| {
            resolved
                .iter()
                .map(|(_, name)| {
                    record
                        .get(*name)
                        .cloned()
                        .unwrap_or_else(|| NULL_TOKEN.to_string())
                })
                .collect()
        })
        .collect();

    if expected.len() != found.len() {
        failures.push(ExpectationFailure::RowCount {
            table: table.clone(),
            expected: expected.len(),
            actual: found.len(),
        });
    }

    if target.ordered {
        if let Some(row) = expected.iter().zip(&found).position(|(want, got)| want != got) {
            failures.push(ExpectationFailure::RowOrder {
                table: table.clone(),
                row,
            });
        }
        return;
    }

    let (missing, unexpected) = multiset_difference(expected, found);
    if missing > 0 || unexpected > 0 {
        failures.push(ExpectationFailure::Records {
            table: table.clone(),
            missing,
            unexpected,
        });
    }
}

/// Counts of rows only in `expected` and rows only in `found`.
fn multiset_difference(mut expected: Vec<Vec<String>>, mut found: Vec<Vec<String>>) -> (usize, usize) {
    expected.sort();
    found.sort();
    let (mut i, mut j) = (0, 0);
    let (mut missing, mut unexpected) = (0, 0);
    while i < expected.len() && j < found.len() {
        match expected[i].cmp(&found[j]) {
            std::cmp::Ordering::Equal => {
                i += 1;
                j += 1;
            }
            std::cmp::Ordering::Less => {
                missing += 1;
                i += 1;
            }
            std::cmp::Ordering::Greater => {
                unexpected += 1;
                j += 1;
            }
        }
    }
    missing += expected.len() - i;
    unexpected += found.len() - j;
    (missing, unexpected)
}
