//! The traversal engine and the shape-mirroring error report.
//!
//! A [`Validator`] binds either a field-name → [`RuleSet`] mapping (for
//! record/map inputs) or a single rule-set (for list/scalar inputs), walks
//! the input recursively, and assembles a [`Report`] whose tree mirrors the
//! failing subset of the input. Validators are built once and are read-only
//! during validation; a finished validator may be shared across call sites.
//!
//! # Examples
//!
//! ```rust
//! use verdict::{rules, RuleSet, Validator};
//! use serde_json::json;
//!
//! let validator = Validator::from_rules(rules! {
//!     "name" => RuleSet::new().string().min(3.0).required(),
//! });
//!
//! let report = validator.validate(&json!({"name": "ab"})).unwrap().unwrap();
//! assert!(report.field("name").is_some());
//! ```

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;

use crate::error::ConfigError;
use crate::messages;
use crate::requires;
use crate::rule_set::RuleSet;
use crate::value::{is_compound, is_empty_nil_zero, is_zero_scalar, Shape};

/// General message overrides, keyed by rule key.
pub type Messages = BTreeMap<String, String>;

/// A field-name → rule-set mapping for record/map inputs.
pub type Rules = BTreeMap<String, RuleSet>;

/// An i18n hook applied to message templates and the `$value` token.
pub type Translator = dyn Fn(&str) -> String;

/// What a validator is bound to: exactly one of a rules mapping or a single
/// rule-set. The traversal dispatches on this.
#[derive(Debug, Clone)]
enum Body {
    /// Field-name → rule-set, for record/map inputs.
    Fields(Rules),
    /// One rule-set for the whole value, for list/scalar inputs.
    Single(RuleSet),
}

/// A reusable, immutable validation tree.
#[derive(Debug, Clone)]
pub struct Validator {
    body: Body,
    messages: Messages,
}

/// The error tree produced by one validation call.
///
/// Mirrors the shape of the failing subset of the input: at a record/map
/// position, field name → messages or a nested report; at a list position,
/// stringified index → nested report. A position that passed has no entry at
/// all; an empty report is never constructed — "no errors" is `None` at the
/// `validate` boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Report {
    /// Flat failure messages for one position.
    Messages(Vec<String>),
    /// Nested failures keyed by field name or stringified index.
    Fields(BTreeMap<String, Report>),
}

impl Report {
    /// The nested report or message list under a field name or stringified
    /// index, if that position failed.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&Report> {
        match self {
            Self::Fields(fields) => fields.get(name),
            Self::Messages(_) => None,
        }
    }

    /// The flat messages at this position, if it is a message leaf.
    #[must_use]
    pub fn messages(&self) -> Option<&[String]> {
        match self {
            Self::Messages(list) => Some(list),
            Self::Fields(_) => None,
        }
    }

    /// Renders the report as its JSON form.
    #[must_use]
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

impl Validator {
    /// Builds a validator for record/map inputs from a field-name → rule-set
    /// mapping.
    #[must_use]
    pub fn from_rules(rules: Rules) -> Self {
        Self {
            body: Body::Fields(rules),
            messages: Messages::new(),
        }
    }

    /// Builds a validator for list/scalar inputs from a single rule-set.
    #[must_use]
    pub fn from_rule(rule: RuleSet) -> Self {
        Self {
            body: Body::Single(rule),
            messages: Messages::new(),
        }
    }

    /// Replaces the general message overrides for this validator. Nested
    /// validators without overrides of their own inherit these.
    #[must_use]
    pub fn messages(mut self, messages: Messages) -> Self {
        self.messages = messages;
        self
    }

    /// Registers one general message override.
    #[must_use]
    pub fn message(mut self, rule_key: impl Into<String>, text: impl Into<String>) -> Self {
        self.messages.insert(rule_key.into(), text.into());
        self
    }

    /// Registers a message for one rule key of one field's rule-set.
    ///
    /// On a single-rule validator pass `""` (or the rule-set's own name) as
    /// the field.
    ///
    /// # Panics
    ///
    /// Panics at build time if the field is not part of this validator's
    /// rules mapping.
    #[must_use]
    pub fn specific_message(
        mut self,
        field: &str,
        rule_key: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        match &mut self.body {
            Body::Fields(rules) => {
                let rule_set = rules
                    .get_mut(field)
                    .unwrap_or_else(|| panic!("no rules are registered for field `{field}`"));
                rule_set.specific_mut().insert(rule_key.into(), text.into());
            }
            Body::Single(rule) => {
                if !field.is_empty() && rule.display_name() != Some(field) {
                    panic!("no rules are registered for field `{field}`");
                }
                rule.specific_mut().insert(rule_key.into(), text.into());
            }
        }
        self
    }

    /// Validates any serializable input.
    ///
    /// Returns `Ok(None)` when every check passed, `Ok(Some(report))` with
    /// the failure tree otherwise, and `Err` on a configuration fault.
    pub fn validate<T: Serialize>(&self, input: &T) -> Result<Option<Report>, ConfigError> {
        let value = serde_json::to_value(input)?;
        self.validate_value(&value)
    }

    /// Validates an already-converted value.
    pub fn validate_value(&self, input: &Value) -> Result<Option<Report>, ConfigError> {
        self.validate_with(input, None)
    }

    /// Validates with an optional translator applied to message text and the
    /// substituted `$value` token.
    pub fn validate_with(
        &self,
        input: &Value,
        translator: Option<&Translator>,
    ) -> Result<Option<Report>, ConfigError> {
        self.run(input, &self.messages, translator)
    }

    /// One recursion step. General messages are threaded down from the root;
    /// a nested validator with overrides of its own shadows them.
    fn run(
        &self,
        input: &Value,
        inherited: &Messages,
        translator: Option<&Translator>,
    ) -> Result<Option<Report>, ConfigError> {
        let general = if self.messages.is_empty() {
            inherited
        } else {
            &self.messages
        };

        match &self.body {
            Body::Fields(rules) => self.run_fields(rules, input, general, translator),
            Body::Single(rule) => self.run_single(rule, input, general, translator),
        }
    }

    fn run_fields(
        &self,
        rules: &Rules,
        input: &Value,
        general: &Messages,
        translator: Option<&Translator>,
    ) -> Result<Option<Report>, ConfigError> {
        let Value::Object(entries) = input else {
            return Err(ConfigError::ShapeMismatch {
                expected: "object",
                found: Shape::of(input).name(),
            });
        };

        let mut output = BTreeMap::new();
        for (key, rule_set) in rules {
            let display = rule_set.display_name().unwrap_or(key.as_str());
            let value = entries
                .get(key)
                .or_else(|| entries.get(display))
                .ok_or_else(|| ConfigError::UnknownField { field: key.clone() })?;

            let applicability = requires::resolve(rule_set.requires(), entries, value)?;
            if !rule_set.is_required() && !applicability.required && is_empty_nil_zero(value) {
                continue;
            }

            // Flat predicates first; dependent checks that did not apply are
            // reconciled out before anything is attached.
            let failures: Vec<String> = rule_set
                .run(value)
                .into_iter()
                .filter(|key| !applicability.inactive.contains(key))
                .map(|key| messages::render(&key, display, value, rule_set, general, translator))
                .collect();
            if !failures.is_empty() {
                output.insert(display.to_string(), Report::Messages(failures));
                continue;
            }

            if let Some(deep) = rule_set.deep() {
                if is_compound(value) {
                    if let Some(nested) = deep.run(value, general, translator)? {
                        output.insert(display.to_string(), nested);
                        continue;
                    }
                }
            }

            if let Some(children) = rule_set.children_of() {
                if let Value::Array(items) = value {
                    if let Some(per_index) = run_children(children, items, general, translator)? {
                        output.insert(display.to_string(), per_index);
                    }
                }
            }
        }

        Ok((!output.is_empty()).then(|| Report::Fields(output)))
    }

    fn run_single(
        &self,
        rule_set: &RuleSet,
        input: &Value,
        general: &Messages,
        translator: Option<&Translator>,
    ) -> Result<Option<Report>, ConfigError> {
        if !rule_set.is_required() && is_empty_nil_zero(input) {
            return Ok(None);
        }

        let display = rule_set.display_name().unwrap_or("");
        let failures: Vec<String> = rule_set
            .run(input)
            .into_iter()
            .map(|key| messages::render(&key, display, input, rule_set, general, translator))
            .collect();
        if !failures.is_empty() {
            return Ok(Some(Report::Messages(failures)));
        }

        match input {
            Value::Array(items) => match rule_set.children_of() {
                Some(children) => run_children(children, items, general, translator),
                None => Ok(None),
            },
            _ => match rule_set.deep() {
                Some(deep) => deep.run(input, general, translator),
                None => Ok(None),
            },
        }
    }

    /// Copies defaults into every nil position of the target, walking the
    /// same rule tree validation walks.
    ///
    /// For each field the rules name, a `null` value is replaced by the
    /// corresponding default; a filled compound value recurses through the
    /// field's deep validator instead. Positions the rules do not name are
    /// left alone, as are non-object targets.
    pub fn set_default_on_nil(
        &self,
        target: &mut Value,
        defaults: &Value,
    ) -> Result<(), ConfigError> {
        self.fill(target, defaults, FillMode::OnNil)
    }

    /// Copies defaults into every zero-scalar position (`0`, `""`, `false`)
    /// of the target. Nil positions are left alone; use
    /// [`set_default_on_nil`](Self::set_default_on_nil) for those.
    pub fn set_default(&self, target: &mut Value, defaults: &Value) -> Result<(), ConfigError> {
        self.fill(target, defaults, FillMode::OnZero)
    }

    fn fill(
        &self,
        target: &mut Value,
        defaults: &Value,
        mode: FillMode,
    ) -> Result<(), ConfigError> {
        match &self.body {
            Body::Fields(rules) => {
                let (Value::Object(entries), Value::Object(default_entries)) = (target, defaults)
                else {
                    return Ok(());
                };
                for (key, rule_set) in rules {
                    let display = rule_set.display_name().unwrap_or(key.as_str());
                    let default_value = default_entries
                        .get(key.as_str())
                        .or_else(|| default_entries.get(display))
                        .ok_or_else(|| ConfigError::UnknownField { field: key.clone() })?;
                    let slot_key = if entries.contains_key(key.as_str()) {
                        key.as_str()
                    } else {
                        display
                    };
                    let slot = entries
                        .get_mut(slot_key)
                        .ok_or_else(|| ConfigError::UnknownField { field: key.clone() })?;

                    if mode.wants(slot) {
                        *slot = default_value.clone();
                    } else if let Some(deep) = rule_set.deep() {
                        if is_compound(slot) {
                            deep.fill(slot, default_value, mode)?;
                        }
                    }
                }
                Ok(())
            }
            Body::Single(rule_set) => {
                // A single-rule validator only carries defaults inward.
                if let Some(deep) = rule_set.deep() {
                    if is_compound(target) {
                        deep.fill(target, defaults, mode)?;
                    }
                }
                Ok(())
            }
        }
    }

    pub(crate) fn merge_single(self, other: Validator) -> Validator {
        match (self.body, other.body) {
            (Body::Single(mine), Body::Single(theirs)) => Validator {
                body: Body::Single(mine.merge(theirs)),
                messages: self.messages,
            },
            (body, _) => Validator {
                body,
                messages: self.messages,
            },
        }
    }
}

/// Which positions default-filling replaces.
#[derive(Clone, Copy)]
enum FillMode {
    OnNil,
    OnZero,
}

impl FillMode {
    fn wants(self, value: &Value) -> bool {
        match self {
            Self::OnNil => value.is_null(),
            Self::OnZero => is_zero_scalar(value),
        }
    }
}

/// Applies a children validator to every element, collecting non-empty
/// nested reports under their stringified index. Passing elements leave no
/// entry — the index map is sparse.
fn run_children(
    children: &Validator,
    items: &[Value],
    general: &Messages,
    translator: Option<&Translator>,
) -> Result<Option<Report>, ConfigError> {
    let mut per_index = BTreeMap::new();
    for (index, element) in items.iter().enumerate() {
        if let Some(nested) = children.run(element, general, translator)? {
            per_index.insert(index.to_string(), nested);
        }
    }
    Ok((!per_index.is_empty()).then(|| Report::Fields(per_index)))
}

/// Builds a [`Rules`] mapping with a map-literal syntax.
///
/// # Examples
///
/// ```rust
/// use verdict::{rules, RuleSet};
///
/// let rules = rules! {
///     "id" => RuleSet::new().int().required(),
///     "name" => RuleSet::new().string(),
/// };
/// assert_eq!(rules.len(), 2);
/// ```
#[macro_export]
macro_rules! rules {
    ( $( $field:expr => $rule_set:expr ),* $(,)? ) => {{
        let mut rules = $crate::validator::Rules::new();
        $( rules.insert(::std::string::String::from($field), $rule_set); )*
        rules
    }};
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn optional_empty_field_is_skipped_entirely() {
        let validator = Validator::from_rules(rules! {
            "name" => RuleSet::new().string().min(3.0),
        });
        assert_eq!(validator.validate_value(&json!({"name": ""})).unwrap(), None);
    }

    #[test]
    fn required_empty_field_fails() {
        let validator = Validator::from_rules(rules! {
            "name" => RuleSet::new().string().required(),
        });
        let report = validator.validate_value(&json!({"name": ""})).unwrap().unwrap();
        assert_eq!(report.field("name").unwrap().messages().unwrap(), ["required"]);
    }

    #[test]
    fn display_name_replaces_the_field_key_in_output() {
        let validator = Validator::from_rules(rules! {
            "first_name" => RuleSet::named("first name").string().required(),
        });
        let report = validator
            .validate_value(&json!({"first_name": 0}))
            .unwrap()
            .unwrap();
        assert!(report.field("first name").is_some());
        assert!(report.field("first_name").is_none());
    }

    #[test]
    fn missing_field_is_a_configuration_fault() {
        let validator = Validator::from_rules(rules! {
            "ghost" => RuleSet::new().string(),
        });
        let err = validator.validate_value(&json!({"other": 1})).unwrap_err();
        assert!(matches!(err, ConfigError::UnknownField { field } if field == "ghost"));
    }

    #[test]
    fn non_object_root_for_a_fields_validator_is_a_fault() {
        let validator = Validator::from_rules(rules! {
            "x" => RuleSet::new().int(),
        });
        let err = validator.validate_value(&json!([1, 2])).unwrap_err();
        assert!(matches!(err, ConfigError::ShapeMismatch { found: "array", .. }));
    }

    #[test]
    fn flat_failures_suppress_recursion() {
        let validator = Validator::from_rules(rules! {
            "inner" => RuleSet::new().min(10.0).complex(rules! {
                "x" => RuleSet::new().int().required(),
            }),
        });
        // The object has 1 entry, failing min(10); the deep validator (which
        // would also fail on `x`) must not run.
        let report = validator
            .validate_value(&json!({"inner": {"x": "nope"}}))
            .unwrap()
            .unwrap();
        assert!(report.field("inner").unwrap().messages().is_some());
    }

    #[test]
    fn single_rule_list_checks_the_list_before_its_elements() {
        let validator =
            Validator::from_rule(RuleSet::new().min(3.0).children(RuleSet::new().int()));

        // Too short: the list-level failure comes back alone.
        let report = validator.validate_value(&json!(["a"])).unwrap().unwrap();
        assert!(report.messages().is_some());

        // Long enough: element failures come back per index, sparsely.
        let report = validator
            .validate_value(&json!([1, "x", 2, "y"]))
            .unwrap()
            .unwrap();
        assert!(report.field("0").is_none());
        assert!(report.field("1").is_some());
        assert!(report.field("2").is_none());
        assert!(report.field("3").is_some());
    }

    #[test]
    fn scalar_with_deep_validator_recurses_on_the_same_value() {
        let validator = Validator::from_rule(
            RuleSet::new().record().always_check().deep_validator(Validator::from_rules(rules! {
                "x" => RuleSet::new().int().required(),
            })),
        );
        let report = validator.validate_value(&json!({"x": 0})).unwrap().unwrap();
        assert!(report.field("x").is_some());
    }

    #[test]
    fn report_serializes_to_mirrored_json() {
        let validator = Validator::from_rules(rules! {
            "name" => RuleSet::new().string().required(),
        });
        let report = validator.validate_value(&json!({"name": 5})).unwrap().unwrap();
        assert_eq!(report.to_value(), json!({"name": ["not a string"]}));
    }

    #[test]
    #[should_panic(expected = "no rules are registered for field `wrong`")]
    fn specific_message_on_a_single_rule_validator_checks_the_field_name() {
        let _ = Validator::from_rule(RuleSet::named("code").int())
            .specific_message("wrong", "int", "nope");
    }

    #[test]
    fn specific_message_on_a_single_rule_validator_accepts_its_own_name() {
        let validator = Validator::from_rule(RuleSet::named("code").int().always_check())
            .specific_message("code", "int", "code must be numeric")
            .specific_message("", "required", "unused");
        let report = validator.validate_value(&json!("x")).unwrap().unwrap();
        assert_eq!(report.messages().unwrap(), ["code must be numeric"]);
    }

    #[test]
    fn defaults_fill_nil_and_zero_positions_separately() {
        let validator = Validator::from_rules(rules! {
            "name" => RuleSet::new().string(),
            "age" => RuleSet::new().int(),
        });
        let defaults = json!({"name": "anon", "age": 18});

        let mut on_nil = json!({"name": null, "age": 0});
        validator.set_default_on_nil(&mut on_nil, &defaults).unwrap();
        assert_eq!(on_nil, json!({"name": "anon", "age": 0}));

        let mut on_zero = json!({"name": null, "age": 0});
        validator.set_default(&mut on_zero, &defaults).unwrap();
        assert_eq!(on_zero, json!({"name": null, "age": 18}));
    }

    #[test]
    fn defaults_recurse_through_deep_validators() {
        let validator = Validator::from_rules(rules! {
            "profile" => RuleSet::new().record().complex(rules! {
                "bio" => RuleSet::new().string(),
            }),
        });
        let defaults = json!({"profile": {"bio": "n/a"}});

        let mut target = json!({"profile": {"bio": ""}});
        validator.set_default(&mut target, &defaults).unwrap();
        assert_eq!(target, json!({"profile": {"bio": "n/a"}}));

        // A nil compound is replaced wholesale rather than entered.
        let mut target = json!({"profile": null});
        validator.set_default_on_nil(&mut target, &defaults).unwrap();
        assert_eq!(target, json!({"profile": {"bio": "n/a"}}));
    }

    #[test]
    fn defaults_leave_filled_positions_and_unruled_fields_alone() {
        let validator = Validator::from_rules(rules! {
            "name" => RuleSet::new().string(),
        });
        let mut target = json!({"name": "ada", "extra": null});
        validator
            .set_default_on_nil(&mut target, &json!({"name": "anon", "extra": "x"}))
            .unwrap();
        assert_eq!(target, json!({"name": "ada", "extra": null}));
    }

    #[test]
    fn missing_default_field_is_a_configuration_fault() {
        let validator = Validator::from_rules(rules! {
            "name" => RuleSet::new().string(),
        });
        let err = validator
            .set_default_on_nil(&mut json!({"name": null}), &json!({}))
            .unwrap_err();
        assert!(matches!(err, ConfigError::UnknownField { field } if field == "name"));
    }

    #[test]
    fn general_messages_flow_into_nested_validators() {
        let validator = Validator::from_rules(rules! {
            "inner" => RuleSet::new().complex(rules! {
                "x" => RuleSet::new().string().always_check(),
            }),
        })
        .message("string", "want text");
        let report = validator
            .validate_value(&json!({"inner": {"x": 1}}))
            .unwrap()
            .unwrap();
        assert_eq!(
            report.field("inner").unwrap().field("x").unwrap().messages().unwrap(),
            ["want text"]
        );
    }
}
