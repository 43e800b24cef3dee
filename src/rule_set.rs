//! Rule-sets: the bundle of checks attached to one validated position.
//!
//! A [`RuleSet`] collects named predicates, dependent-requirement conditions,
//! message options, per-rule message overrides, the optional/required flag,
//! and the optional nested validators (deep for compound values, children for
//! list elements). Rule-sets are built once through the fluent builder and
//! are immutable during validation.
//!
//! # Examples
//!
//! ```rust
//! use verdict::RuleSet;
//! use serde_json::json;
//!
//! let rule = RuleSet::new().int().min(1.0).required();
//! assert_eq!(rule.run(&json!(0)).as_slice(), ["min", "required"]);
//! assert!(rule.run(&json!(5)).is_empty());
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use regex::Regex;
use serde_json::Value;
use smallvec::SmallVec;

use crate::requires::Requirement;
use crate::rules::{self, Rule};
use crate::validator::{Messages, Rules, Validator};
use crate::value::format_bound;

/// Per-rule message parameters, keyed rule → option name → value.
pub type OptionsMap = BTreeMap<String, BTreeMap<String, String>>;

/// The set of named checks for a single validated position.
#[derive(Clone, Default)]
pub struct RuleSet {
    name: Option<String>,
    checks: BTreeMap<String, Rule>,
    requires: BTreeMap<String, Requirement>,
    options: OptionsMap,
    specific: Messages,
    required: bool,
    deep: Option<Box<Validator>>,
    children: Option<Box<Validator>>,
    registry: Option<Arc<BTreeMap<String, Rule>>>,
}

impl RuleSet {
    /// Creates an empty, optional rule-set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty rule-set with a display name used in error output
    /// instead of the field's own key.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    // ------------------------------------------------------------------
    // Type checks
    // ------------------------------------------------------------------

    /// Checks that the value is an integer (or an integer-looking string).
    #[must_use]
    pub fn int(self) -> Self {
        self.check("int", rules::int_rule())
    }

    /// Checks that the value is a float (or a float-looking string).
    #[must_use]
    pub fn float(self) -> Self {
        self.check("float", rules::float_rule())
    }

    /// Checks that the value is a string.
    #[must_use]
    pub fn string(self) -> Self {
        self.check("string", rules::string_rule())
    }

    /// Checks that the value is map-shaped.
    #[must_use]
    pub fn map(self) -> Self {
        self.check("map", rules::map_rule())
    }

    /// Checks that the value is record-shaped.
    #[must_use]
    pub fn record(self) -> Self {
        self.check("struct", rules::struct_rule())
    }

    /// Checks that the value is list-shaped.
    #[must_use]
    pub fn slice(self) -> Self {
        self.check("slice", rules::slice_rule())
    }

    // ------------------------------------------------------------------
    // Bounds
    // ------------------------------------------------------------------

    /// Checks `value >= min` for numbers, `len(value) >= min` otherwise.
    #[must_use]
    pub fn min(mut self, min: f64) -> Self {
        self.add_option("min", "min", format_bound(min));
        self.check("min", rules::min_rule(min))
    }

    /// Checks `value <= max` for numbers, `len(value) <= max` otherwise.
    #[must_use]
    pub fn max(mut self, max: f64) -> Self {
        self.add_option("max", "max", format_bound(max));
        self.check("max", rules::max_rule(max))
    }

    /// Checks `len(value) == len`.
    #[must_use]
    pub fn len(mut self, len: usize) -> Self {
        self.add_option("len", "length", len.to_string());
        self.check("len", rules::len_rule(len))
    }

    /// Checks `from <= len(value) <= to`. Pass `-1` to leave a bound open.
    #[must_use]
    pub fn len_range(mut self, from: i64, to: i64) -> Self {
        self.add_option("len_range", "from", from.to_string());
        self.add_option("len_range", "to", to.to_string());
        self.check("len_range", rules::len_range_rule(from, to))
    }

    // ------------------------------------------------------------------
    // Presence
    // ------------------------------------------------------------------

    /// Makes the field required: fails on nil, the zero value, or an empty
    /// collection, and rules run even when the value is empty.
    #[must_use]
    pub fn required(self) -> Self {
        self.check("required", rules::required_rule()).always_check()
    }

    /// Makes the field optional: an empty value skips validation entirely.
    /// Rule-sets start out optional.
    #[must_use]
    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    /// Runs the rules even when the value is empty, without adding a
    /// presence check of its own.
    #[must_use]
    pub fn always_check(mut self) -> Self {
        self.required = true;
        self
    }

    /// Checks that the value is not the zero value. Implies [`always_check`].
    ///
    /// [`always_check`]: Self::always_check
    #[must_use]
    pub fn non_zero(self) -> Self {
        self.check("non_zero", rules::non_zero_rule()).always_check()
    }

    /// Checks that the value is not nil. Implies [`always_check`].
    ///
    /// [`always_check`]: Self::always_check
    #[must_use]
    pub fn non_nil(self) -> Self {
        self.check("non_nil", rules::non_nil_rule()).always_check()
    }

    /// Checks that a collection has items. Implies [`always_check`].
    ///
    /// [`always_check`]: Self::always_check
    #[must_use]
    pub fn non_empty(self) -> Self {
        self.check("non_empty", rules::non_empty_rule()).always_check()
    }

    // ------------------------------------------------------------------
    // Content
    // ------------------------------------------------------------------

    /// Checks the value against a regular expression.
    ///
    /// # Panics
    ///
    /// Panics at build time if the pattern does not compile — a malformed
    /// rule tree, not a validation failure.
    #[must_use]
    pub fn regex(mut self, pattern: &str) -> Self {
        let compiled = match Regex::new(pattern) {
            Ok(re) => re,
            Err(err) => panic!("invalid regex pattern `{pattern}`: {err}"),
        };
        self.add_option("regex", "pattern", pattern.to_string());
        self.check("regex", rules::regex_rule(compiled))
    }

    /// Checks that the value deep-equals one of the given literals.
    #[must_use]
    pub fn choices(mut self, choices: Vec<Value>) -> Self {
        self.add_option("choices", "choices", display_list(choices.iter()));
        self.check("choices", rules::choices_rule(choices))
    }

    // ------------------------------------------------------------------
    // Combinators
    // ------------------------------------------------------------------

    /// Passes when at least one of the given rule-sets fully passes.
    #[must_use]
    pub fn or(self, rule_sets: Vec<RuleSet>) -> Self {
        self.check("or", rules::or_rule(rule_sets))
    }

    /// Passes on the XOR fold of the given rule-sets' pass/fail results.
    ///
    /// With more than two rule-sets this is parity, not "exactly one".
    #[must_use]
    pub fn xor(self, rule_sets: Vec<RuleSet>) -> Self {
        self.check("xor", rules::xor_rule(rule_sets))
    }

    // ------------------------------------------------------------------
    // Dependent requirements
    // ------------------------------------------------------------------

    /// Requires the field when at least one named sibling is non-empty.
    #[must_use]
    pub fn when_exist_one<S: Into<String>>(self, fields: impl IntoIterator<Item = S>) -> Self {
        self.require(Requirement::ExistOne(collect(fields)))
    }

    /// Requires the field only when all named siblings are non-empty.
    #[must_use]
    pub fn when_exist_all<S: Into<String>>(self, fields: impl IntoIterator<Item = S>) -> Self {
        self.require(Requirement::ExistAll(collect(fields)))
    }

    /// Requires the field when at least one named sibling is empty.
    #[must_use]
    pub fn when_not_exist_one<S: Into<String>>(self, fields: impl IntoIterator<Item = S>) -> Self {
        self.require(Requirement::NotExistOne(collect(fields)))
    }

    /// Requires the field when all named siblings are empty.
    #[must_use]
    pub fn when_not_exist_all<S: Into<String>>(self, fields: impl IntoIterator<Item = S>) -> Self {
        self.require(Requirement::NotExistAll(collect(fields)))
    }

    fn require(mut self, requirement: Requirement) -> Self {
        let key = requirement.key();
        self.add_option(key, "choices", display_fields(requirement.fields()));
        self.requires.insert(key.to_string(), requirement);
        self.check(key, rules::required_rule())
    }

    // ------------------------------------------------------------------
    // Custom rules
    // ------------------------------------------------------------------

    /// Adds a custom named rule.
    ///
    /// # Panics
    ///
    /// Panics at build time if the key is already taken within this rule-set.
    #[must_use]
    pub fn custom<F>(mut self, key: impl Into<String>, rule: F) -> Self
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        let key = key.into();
        if self.checks.contains_key(&key) {
            panic!("`{key}` is duplicate and has to be unique");
        }
        self.checks.insert(key, Arc::new(rule));
        self
    }

    /// Adds custom rules registered beforehand on the [`Engine`] this
    /// rule-set was created from.
    ///
    /// # Panics
    ///
    /// Panics at build time on a duplicate key, or if a key was never
    /// registered on the engine.
    ///
    /// [`Engine`]: crate::engine::Engine
    #[must_use]
    pub fn registered_custom(mut self, keys: &[&str]) -> Self {
        for &key in keys {
            if self.checks.contains_key(key) {
                panic!("`{key}` is duplicate and has to be unique");
            }
            let rule = self
                .registry
                .as_ref()
                .and_then(|registry| registry.get(key))
                .unwrap_or_else(|| {
                    panic!("`{key}` custom rule doesn't exist, was it registered on the engine?")
                })
                .clone();
            self.checks.insert(key.to_string(), rule);
        }
        self
    }

    // ------------------------------------------------------------------
    // Nesting
    // ------------------------------------------------------------------

    /// Attaches a deep validator for compound (record/map-shaped) values,
    /// built from a field-name → rule-set mapping.
    #[must_use]
    pub fn complex(self, rules: Rules) -> Self {
        self.deep_validator(Validator::from_rules(rules))
    }

    /// Attaches a deep validator directly.
    #[must_use]
    pub fn deep_validator(mut self, validator: Validator) -> Self {
        self.deep = Some(Box::new(validator));
        self
    }

    /// Attaches a children rule-set, applied independently to every element
    /// of a list-shaped value. Layering a second children rule-set merges it
    /// into the first.
    #[must_use]
    pub fn children(self, rule: RuleSet) -> Self {
        self.children_validator(Validator::from_rule(rule))
    }

    /// Attaches a children validator directly, merging single-rule bodies if
    /// one is already present.
    #[must_use]
    pub fn children_validator(mut self, validator: Validator) -> Self {
        self.children = Some(match self.children.take() {
            None => Box::new(validator),
            Some(existing) => Box::new(existing.merge_single(validator)),
        });
        self
    }

    // ------------------------------------------------------------------
    // Messages
    // ------------------------------------------------------------------

    /// Replaces the per-rule message overrides for this rule-set.
    #[must_use]
    pub fn specific_messages(mut self, messages: Messages) -> Self {
        self.specific = messages;
        self
    }

    /// Registers one per-rule message override.
    #[must_use]
    pub fn specific_message(mut self, rule_key: impl Into<String>, text: impl Into<String>) -> Self {
        self.specific.insert(rule_key.into(), text.into());
        self
    }

    // ------------------------------------------------------------------
    // Evaluation
    // ------------------------------------------------------------------

    /// Runs every check against the value and returns the failing rule keys.
    ///
    /// Keys come back sorted; the failure set is independent of registration
    /// order.
    #[must_use]
    pub fn run(&self, value: &Value) -> SmallVec<[String; 4]> {
        self.checks
            .iter()
            .filter(|(_, rule)| !rule(value))
            .map(|(key, _)| key.clone())
            .collect()
    }

    /// Folds another rule-set into this one. Existing nested validators win;
    /// children validators merge; the result is required if either side was.
    #[must_use]
    pub fn merge(mut self, other: RuleSet) -> Self {
        self.checks.extend(other.checks);
        self.options.extend(other.options);
        self.specific.extend(other.specific);
        self.requires.extend(other.requires);
        self.required = self.required || other.required;
        if self.name.is_none() {
            self.name = other.name;
        }
        if self.deep.is_none() {
            self.deep = other.deep;
        }
        if let Some(theirs) = other.children {
            self = self.children_validator(*theirs);
        }
        self
    }

    // ------------------------------------------------------------------
    // Internal accessors used by the traversal engine
    // ------------------------------------------------------------------

    pub(crate) fn with_registry(mut self, registry: Arc<BTreeMap<String, Rule>>) -> Self {
        self.registry = Some(registry);
        self
    }

    pub(crate) fn display_name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub(crate) fn is_required(&self) -> bool {
        self.required
    }

    pub(crate) fn requires(&self) -> &BTreeMap<String, Requirement> {
        &self.requires
    }

    pub(crate) fn deep(&self) -> Option<&Validator> {
        self.deep.as_deref()
    }

    pub(crate) fn children_of(&self) -> Option<&Validator> {
        self.children.as_deref()
    }

    pub(crate) fn specific(&self) -> &Messages {
        &self.specific
    }

    pub(crate) fn option(&self, rule_key: &str) -> Option<&BTreeMap<String, String>> {
        self.options.get(rule_key)
    }

    pub(crate) fn specific_mut(&mut self) -> &mut Messages {
        &mut self.specific
    }

    fn check(mut self, key: &str, rule: Rule) -> Self {
        self.checks.insert(key.to_string(), rule);
        self
    }

    fn add_option(&mut self, rule_key: &str, sub_key: &str, value: String) {
        self.options
            .entry(rule_key.to_string())
            .or_default()
            .insert(sub_key.to_string(), value);
    }
}

impl fmt::Debug for RuleSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuleSet")
            .field("name", &self.name)
            .field("checks", &self.checks.keys().collect::<Vec<_>>())
            .field("requires", &self.requires.keys().collect::<Vec<_>>())
            .field("required", &self.required)
            .field("deep", &self.deep.is_some())
            .field("children", &self.children.is_some())
            .finish()
    }
}

fn collect<S: Into<String>>(fields: impl IntoIterator<Item = S>) -> Vec<String> {
    fields.into_iter().map(Into::into).collect()
}

fn display_list<'a>(values: impl Iterator<Item = &'a Value>) -> String {
    let rendered: Vec<String> = values.map(crate::value::display).collect();
    format!("[{}]", rendered.join(", "))
}

fn display_fields(fields: &[String]) -> String {
    format!("[{}]", fields.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn failing_keys_come_back_sorted_regardless_of_registration_order() {
        let a = RuleSet::new().int().min(5.0).string();
        let b = RuleSet::new().string().min(5.0).int();
        assert_eq!(a.run(&json!(2.5)), b.run(&json!(2.5)));
        assert_eq!(a.run(&json!(2.5)).as_slice(), ["int", "min", "string"]);
    }

    #[test]
    fn bound_options_are_recorded_for_templating() {
        let rule = RuleSet::new().min(3.0).len_range(2, 8);
        assert_eq!(rule.option("min").unwrap()["min"], "3");
        assert_eq!(rule.option("len_range").unwrap()["from"], "2");
        assert_eq!(rule.option("len_range").unwrap()["to"], "8");
    }

    #[test]
    fn required_sets_the_flag_and_the_check() {
        let rule = RuleSet::new().required();
        assert!(rule.is_required());
        assert_eq!(rule.run(&json!("")).as_slice(), ["required"]);
        assert!(rule.run(&json!("x")).is_empty());
    }

    #[test]
    fn optional_after_always_check_clears_the_flag() {
        let rule = RuleSet::new().non_zero().optional();
        assert!(!rule.is_required());
    }

    #[test]
    #[should_panic(expected = "duplicate")]
    fn duplicate_custom_key_panics() {
        let _ = RuleSet::new()
            .custom("parity", |v| v.as_i64().is_some_and(|n| n % 2 == 0))
            .custom("parity", |_| true);
    }

    #[test]
    #[should_panic(expected = "custom rule doesn't exist")]
    fn unregistered_custom_key_panics() {
        let _ = RuleSet::new().registered_custom(&["ghost"]);
    }

    #[test]
    fn merge_folds_checks_and_keeps_requiredness() {
        let merged = RuleSet::new().int().merge(RuleSet::new().min(2.0).required());
        assert!(merged.is_required());
        assert_eq!(merged.run(&json!(1)).as_slice(), ["min"]);
        assert_eq!(merged.run(&json!("x")).as_slice(), ["int", "min"]);
    }

    #[test]
    fn when_conditions_record_their_choices_option() {
        let rule = RuleSet::new().when_exist_one(["a", "b"]);
        assert_eq!(rule.option("when_exist_one").unwrap()["choices"], "[a, b]");
        assert!(rule.requires().contains_key("when_exist_one"));
    }
}
