use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::NULL_TOKEN;

/// A single fixture cell as declared in a specification document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FixtureValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Null,
}

impl FixtureValue {
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Renders a declared value the way an expected cell is compared.
    ///
    /// Expectations are written in canonical form, so only nulls are rewritten.
    pub fn to_canonical(&self) -> String {
        match self {
            Self::Null => NULL_TOKEN.to_string(),
            other => other.to_string(),
        }
    }
}

impl fmt::Display for FixtureValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(value) => write!(f, "{value}"),
            Self::Int(value) => write!(f, "{value}"),
            Self::Float(value) => write!(f, "{value}"),
            Self::Text(value) => f.write_str(value),
            Self::Null => f.write_str(""),
        }
    }
}

/// One insertable row: column name to value.
pub type FixtureRow = BTreeMap<String, FixtureValue>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_yaml_scalars() {
        let row: FixtureRow =
            serde_yaml::from_str("id: 7\nprice: 2.5\nname: widget\nactive: true\nnote: null\n")
                .unwrap();
        assert_eq!(row["id"], FixtureValue::Int(7));
        assert_eq!(row["price"], FixtureValue::Float(2.5));
        assert_eq!(row["name"], FixtureValue::Text("widget".to_string()));
        assert_eq!(row["active"], FixtureValue::Bool(true));
        assert!(row["note"].is_null());
    }

    #[test]
    fn canonical_form_rewrites_only_nulls() {
        assert_eq!(FixtureValue::Null.to_canonical(), NULL_TOKEN);
        assert_eq!(FixtureValue::Int(3).to_canonical(), "3");
        assert_eq!(FixtureValue::Text("3.1416".into()).to_canonical(), "3.1416");
        assert_eq!(FixtureValue::Bool(false).to_canonical(), "false");
    }
}
