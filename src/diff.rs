//! Field-level structural diff between a fixture and its canonical counterpart.

use serde::Serialize;
use serde_json::Value;
use std::fmt::{self, Display};

/// A single differing leaf.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct FieldDiff {
    /// The dotted path of the field, e.g. `genesis.system_config.gasLimit`.
    pub(crate) path: String,
    /// The fixture value, `None` if the field is absent from the fixture.
    pub(crate) fixture: Option<Value>,
    /// The canonical value, `None` if the field is absent from the canonical config.
    pub(crate) canonical: Option<Value>,
}

/// The set of fields that differ between two serializable values.
#[derive(Default, Debug, Clone, PartialEq, Eq)]
pub(crate) struct ConfigDiff {
    pub(crate) fields: Vec<FieldDiff>,
}

impl ConfigDiff {
    /// Diffs the JSON representations of `fixture` and `canonical`.
    pub(crate) fn between<T: Serialize>(fixture: &T, canonical: &T) -> serde_json::Result<Self> {
        let mut diff = Self::default();
        diff.walk(
            String::new(),
            Some(&serde_json::to_value(fixture)?),
            Some(&serde_json::to_value(canonical)?),
        );
        Ok(diff)
    }

    /// Returns true if no field differs.
    pub(crate) fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    fn walk(&mut self, path: String, fixture: Option<&Value>, canonical: Option<&Value>) {
        match (fixture, canonical) {
            (Some(Value::Object(a)), Some(Value::Object(b))) => {
                let mut keys = a.keys().chain(b.keys()).collect::<Vec<_>>();
                keys.sort();
                keys.dedup();
                for key in keys {
                    let child = if path.is_empty() {
                        key.clone()
                    } else {
                        format!("{path}.{key}")
                    };
                    self.walk(child, a.get(key), b.get(key));
                }
            }
            (a, b) if a == b => {}
            (a, b) => self.fields.push(FieldDiff {
                path,
                fixture: a.cloned(),
                canonical: b.cloned(),
            }),
        }
    }
}

impl Display for ConfigDiff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for field in &self.fields {
            writeln!(
                f,
                "  {}: fixture = {}, canonical = {}",
                field.path,
                field.fixture.as_ref().map_or("<absent>".to_string(), Value::to_string),
                field.canonical.as_ref().map_or("<absent>".to_string(), Value::to_string),
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn equal_values_have_empty_diff() {
        let v = json!({ "a": 1, "b": { "c": [1, 2] } });
        assert!(ConfigDiff::between(&v, &v).unwrap().is_empty());
    }

    #[test]
    fn reports_nested_and_missing_fields() {
        let fixture = json!({ "a": 1, "b": { "c": 2 } });
        let canonical = json!({ "a": 1, "b": { "c": 3, "d": true } });
        let diff = ConfigDiff::between(&fixture, &canonical).unwrap();
        assert_eq!(
            diff.fields,
            vec![
                FieldDiff {
                    path: "b.c".to_string(),
                    fixture: Some(json!(2)),
                    canonical: Some(json!(3)),
                },
                FieldDiff {
                    path: "b.d".to_string(),
                    fixture: None,
                    canonical: Some(json!(true)),
                },
            ]
        );
        assert_eq!(
            diff.to_string(),
            "  b.c: fixture = 2, canonical = 3\n  b.d: fixture = <absent>, canonical = true\n"
        );
    }

    #[test]
    fn arrays_are_compared_as_leaves() {
        let diff = ConfigDiff::between(&json!({ "x": [1] }), &json!({ "x": [2] })).unwrap();
        assert_eq!(diff.fields.len(), 1);
        assert_eq!(diff.fields[0].path, "x");
    }
}
