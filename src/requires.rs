//! The requirement resolver.
//!
//! A rule-set may carry dependent-requirement conditions: the field only
//! counts as required when certain sibling fields of the same parent value
//! are present (or absent). Conditions decide *whether a field counts as
//! filled*, not whether a value is well-formed — that distinction is why they
//! live apart from the predicate catalogue.
//!
//! A condition is *active* when its sibling test demands the field and the
//! field's own value is empty. The resolver reports which conditions were
//! inactive (their matching `required`-style failures get stripped from the
//! report, since those particular checks did not apply) and whether the field
//! is conditionally required overall: it is, exactly when there is at least
//! one condition and every condition is active.

use std::collections::{BTreeMap, BTreeSet};

use serde_json::{Map, Value};

use crate::error::ConfigError;
use crate::value::is_empty_nil_zero;

/// A dependent-requirement condition over sibling fields.
#[derive(Debug, Clone)]
pub enum Requirement {
    /// Required if at least one named sibling is non-empty.
    ExistOne(Vec<String>),
    /// Required only if all named siblings are non-empty.
    ExistAll(Vec<String>),
    /// Required if at least one named sibling is empty.
    NotExistOne(Vec<String>),
    /// Required if all named siblings are empty.
    NotExistAll(Vec<String>),
}

impl Requirement {
    /// The rule key this condition registers its `required` check under.
    #[must_use]
    pub fn key(&self) -> &'static str {
        match self {
            Self::ExistOne(_) => "when_exist_one",
            Self::ExistAll(_) => "when_exist_all",
            Self::NotExistOne(_) => "when_not_exist_one",
            Self::NotExistAll(_) => "when_not_exist_all",
        }
    }

    /// The sibling fields the condition reads.
    #[must_use]
    pub fn fields(&self) -> &[String] {
        match self {
            Self::ExistOne(fields)
            | Self::ExistAll(fields)
            | Self::NotExistOne(fields)
            | Self::NotExistAll(fields) => fields,
        }
    }

    /// Whether the sibling values demand this field.
    ///
    /// A sibling name the parent does not have is a fatal configuration
    /// fault, not a validation failure.
    fn demands(&self, parent: &Map<String, Value>) -> Result<bool, ConfigError> {
        let mut siblings = Vec::with_capacity(self.fields().len());
        for field in self.fields() {
            let value = parent.get(field).ok_or_else(|| ConfigError::UnknownSibling {
                field: field.clone(),
            })?;
            siblings.push(value);
        }

        Ok(match self {
            Self::ExistOne(_) => siblings.iter().any(|v| !is_empty_nil_zero(v)),
            Self::ExistAll(_) => siblings.iter().all(|v| !is_empty_nil_zero(v)),
            Self::NotExistOne(_) => siblings.iter().any(|v| is_empty_nil_zero(v)),
            Self::NotExistAll(_) => siblings.iter().all(|v| is_empty_nil_zero(v)),
        })
    }
}

/// The resolver's verdict for one field.
#[derive(Debug, Default)]
pub(crate) struct Applicability {
    /// Condition keys that did not actually require the field; failures under
    /// these keys are reconciled out of the report.
    pub inactive: BTreeSet<String>,
    /// Whether the field is conditionally required overall.
    pub required: bool,
}

/// Evaluates every condition of a rule-set against the parent value.
pub(crate) fn resolve(
    requires: &BTreeMap<String, Requirement>,
    parent: &Map<String, Value>,
    value: &Value,
) -> Result<Applicability, ConfigError> {
    if requires.is_empty() {
        return Ok(Applicability::default());
    }

    let value_empty = is_empty_nil_zero(value);
    let mut inactive = BTreeSet::new();
    for (key, requirement) in requires {
        let active = value_empty && requirement.demands(parent)?;
        if !active {
            inactive.insert(key.clone());
        }
    }

    let required = inactive.is_empty();
    Ok(Applicability { inactive, required })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parent(a: &str, b: &str) -> Map<String, Value> {
        let Value::Object(map) = json!({"a": a, "b": b}) else {
            unreachable!()
        };
        map
    }

    fn one_condition(req: Requirement) -> BTreeMap<String, Requirement> {
        let mut map = BTreeMap::new();
        map.insert(req.key().to_string(), req);
        map
    }

    #[test]
    fn exist_one_demands_when_any_sibling_present() {
        let requires = one_condition(Requirement::ExistOne(vec!["a".into(), "b".into()]));

        let app = resolve(&requires, &parent("x", ""), &json!("")).unwrap();
        assert!(app.required);
        assert!(app.inactive.is_empty());

        let app = resolve(&requires, &parent("", ""), &json!("")).unwrap();
        assert!(!app.required);
        assert!(app.inactive.contains("when_exist_one"));
    }

    #[test]
    fn non_empty_value_deactivates_every_condition() {
        let requires = one_condition(Requirement::ExistOne(vec!["a".into()]));
        let app = resolve(&requires, &parent("x", ""), &json!("filled")).unwrap();
        assert!(!app.required);
        assert!(app.inactive.contains("when_exist_one"));
    }

    #[test]
    fn exist_all_needs_every_sibling() {
        let requires = one_condition(Requirement::ExistAll(vec!["a".into(), "b".into()]));

        let app = resolve(&requires, &parent("x", "y"), &json!("")).unwrap();
        assert!(app.required);

        let app = resolve(&requires, &parent("x", ""), &json!("")).unwrap();
        assert!(!app.required);
    }

    #[test]
    fn not_exist_families_invert_the_sibling_test() {
        let one = one_condition(Requirement::NotExistOne(vec!["a".into(), "b".into()]));
        assert!(resolve(&one, &parent("x", ""), &json!("")).unwrap().required);
        assert!(!resolve(&one, &parent("x", "y"), &json!("")).unwrap().required);

        let all = one_condition(Requirement::NotExistAll(vec!["a".into(), "b".into()]));
        assert!(resolve(&all, &parent("", ""), &json!("")).unwrap().required);
        assert!(!resolve(&all, &parent("x", ""), &json!("")).unwrap().required);
    }

    #[test]
    fn mixed_conditions_require_all_active() {
        let mut requires = BTreeMap::new();
        let exist = Requirement::ExistOne(vec!["a".into()]);
        let not_exist = Requirement::NotExistOne(vec!["b".into()]);
        requires.insert(exist.key().to_string(), exist);
        requires.insert(not_exist.key().to_string(), not_exist);

        // `a` present activates the first; `b` present deactivates the second.
        let app = resolve(&requires, &parent("x", "y"), &json!("")).unwrap();
        assert!(!app.required);
        assert_eq!(app.inactive.len(), 1);
        assert!(app.inactive.contains("when_not_exist_one"));
    }

    #[test]
    fn zero_conditions_mean_not_required() {
        let app = resolve(&BTreeMap::new(), &parent("x", "y"), &json!("")).unwrap();
        assert!(!app.required);
        assert!(app.inactive.is_empty());
    }

    #[test]
    fn missing_sibling_is_a_configuration_fault() {
        let requires = one_condition(Requirement::ExistOne(vec!["missing".into()]));
        let err = resolve(&requires, &parent("x", ""), &json!("")).unwrap_err();
        assert!(matches!(err, ConfigError::UnknownSibling { field } if field == "missing"));
    }
}
