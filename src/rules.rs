//! The built-in predicate catalogue.
//!
//! Every rule is a named pure function over one value. A rule must never
//! panic, whatever the value's shape: when a check is inapplicable (a length
//! bound on a boolean, a pattern on a number) it fails rather than erroring.
//!
//! The `or`/`xor` combinators are rules over whole [`RuleSet`]s, not over
//! single predicates — an alternative passes only when every check in its
//! rule-set passes.

use std::sync::Arc;

use regex::Regex;
use serde_json::Value;

use crate::rule_set::RuleSet;
use crate::value::{is_empty_nil_zero, length, measure};

/// A named pass/fail check over one value.
pub type Rule = Arc<dyn Fn(&Value) -> bool + Send + Sync>;

pub(crate) fn int_rule() -> Rule {
    Arc::new(|value| match value {
        Value::Number(n) => n.is_i64() || n.is_u64(),
        // Numeric-looking strings are accepted as a convenience.
        Value::String(s) => s.parse::<i64>().is_ok(),
        _ => false,
    })
}

pub(crate) fn float_rule() -> Rule {
    Arc::new(|value| match value {
        Value::Number(n) => n.is_f64(),
        Value::String(s) => s.parse::<f64>().is_ok(),
        _ => false,
    })
}

pub(crate) fn string_rule() -> Rule {
    Arc::new(|value| value.is_string())
}

/// Object shape, map rendition. Records and maps share the Object shape in
/// the value model, so `map` and `struct` run the same check under distinct
/// rule keys.
pub(crate) fn map_rule() -> Rule {
    Arc::new(|value| value.is_object())
}

/// Object shape, record rendition.
pub(crate) fn struct_rule() -> Rule {
    Arc::new(|value| value.is_object())
}

pub(crate) fn slice_rule() -> Rule {
    Arc::new(|value| value.is_array())
}

pub(crate) fn min_rule(min: f64) -> Rule {
    Arc::new(move |value| measure(value).is_some_and(|m| m >= min))
}

pub(crate) fn max_rule(max: f64) -> Rule {
    Arc::new(move |value| measure(value).is_some_and(|m| m <= max))
}

pub(crate) fn len_rule(len: usize) -> Rule {
    Arc::new(move |value| length(value) == Some(len))
}

/// Length within `[from, to]`; `-1` disables a bound.
pub(crate) fn len_range_rule(from: i64, to: i64) -> Rule {
    Arc::new(move |value| {
        let Some(len) = length(value) else {
            return false;
        };
        let len = len as i64;
        (from == -1 || len >= from) && (to == -1 || len <= to)
    })
}

pub(crate) fn required_rule() -> Rule {
    Arc::new(|value| !is_empty_nil_zero(value))
}

pub(crate) fn non_zero_rule() -> Rule {
    Arc::new(|value| match value {
        Value::Null => true,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64() != Some(0.0),
        Value::String(s) => !s.is_empty(),
        _ => true,
    })
}

pub(crate) fn non_nil_rule() -> Rule {
    Arc::new(|value| !value.is_null())
}

pub(crate) fn non_empty_rule() -> Rule {
    Arc::new(|value| match value {
        Value::Array(items) => !items.is_empty(),
        Value::Object(entries) => !entries.is_empty(),
        _ => true,
    })
}

pub(crate) fn regex_rule(pattern: Regex) -> Rule {
    Arc::new(move |value| match value {
        Value::String(s) => pattern.is_match(s),
        _ => false,
    })
}

/// Deep-equality against a fixed literal set.
pub(crate) fn choices_rule(choices: Vec<Value>) -> Rule {
    Arc::new(move |value| choices.iter().any(|choice| choice == value))
}

/// Passes when at least one sub-rule-set fully passes. An empty list passes.
pub(crate) fn or_rule(rule_sets: Vec<RuleSet>) -> Rule {
    Arc::new(move |value| {
        rule_sets.is_empty() || rule_sets.iter().any(|rs| rs.run(value).is_empty())
    })
}

/// Left fold of boolean XOR over sub-rule-set pass/fail.
///
/// With more than two rule-sets this is parity — an odd number of passing
/// alternatives passes — not "exactly one". An empty list passes.
pub(crate) fn xor_rule(rule_sets: Vec<RuleSet>) -> Rule {
    Arc::new(move |value| {
        if rule_sets.is_empty() {
            return true;
        }
        rule_sets
            .iter()
            .fold(false, |acc, rs| acc != rs.run(value).is_empty())
    })
}

/// The built-in default message for a rule key, last tier before the
/// missing-message diagnostic.
#[must_use]
pub(crate) fn default_message(rule_key: &str) -> Option<&'static str> {
    Some(match rule_key {
        "int" => "not an integer value",
        "float" => "not a float value",
        "string" => "not a string",
        "map" => "not a map",
        "struct" => "not a struct",
        "slice" => "not a slice",
        "min" => "$field's length must be higher equal to $min",
        "max" => "$field's length must be lower equal to $max",
        "len" => "$field's length must be equal to $length",
        "len_range" => "$field's length must be between $from to $to characters long",
        "required" => "required",
        "non_zero" => "can not be 0",
        "non_nil" => "can not be nil",
        "non_empty" => "can not be empty",
        "regex" => "$value does not pass /$pattern/ pattern",
        "choices" => "$value does not include in allowed choices: $choices",
        "or" => "ruleSets in $field did not pass based on or logic",
        "xor" => "ruleSets in $field did not pass based on xor logic",
        "when_exist_one" => {
            "$field is required because at least one of $choices fields are not nil, empty or zero(0, \"\", '')"
        }
        "when_exist_all" => {
            "$field is required because all of $choices fields are not nil, empty or zero(0, \"\", '')"
        }
        "when_not_exist_one" => {
            "$field is required because at least one of $choices fields are nil, empty or zero(0, \"\", '')"
        }
        "when_not_exist_all" => {
            "$field is required because all of $choices fields are nil, empty or zero(0, \"\", '')"
        }
        _ => return None,
    })
}
