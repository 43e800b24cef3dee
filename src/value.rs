//! Shape inspection over the dynamic value model.
//!
//! The engine walks `serde_json::Value` trees. This module gathers the shape
//! queries the traversal and the predicate catalogue share: what kind of value
//! is this, does it count as empty/nil/zero, how is it measured against a
//! numeric bound, and how does it print inside an error message.

use serde_json::Value;

/// The runtime shape of a value, as the traversal engine sees it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    /// A record or map (`Value::Object`).
    Object,
    /// A list (`Value::Array`).
    Array,
    /// A string scalar.
    String,
    /// A numeric scalar.
    Number,
    /// A boolean scalar.
    Bool,
    /// An absent value.
    Null,
}

impl Shape {
    /// Classifies a value.
    #[must_use]
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Object(_) => Self::Object,
            Value::Array(_) => Self::Array,
            Value::String(_) => Self::String,
            Value::Number(_) => Self::Number,
            Value::Bool(_) => Self::Bool,
            Value::Null => Self::Null,
        }
    }

    /// A short lowercase name, used in configuration-fault messages.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Object => "object",
            Self::Array => "array",
            Self::String => "string",
            Self::Number => "number",
            Self::Bool => "bool",
            Self::Null => "null",
        }
    }
}

/// Returns true if the value counts as absent, zero, or an empty collection.
///
/// The three conditions the `required` rule ORs together: `null`, the zero
/// value of a scalar (`0`, `""`, `false`), or a collection with no items.
#[must_use]
pub fn is_empty_nil_zero(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(entries) => entries.is_empty(),
    }
}

/// Returns true for the scalar zero values `0`, `""` and `false`.
///
/// Narrower than [`is_empty_nil_zero`]: nil and empty collections do not
/// count. This is the test default-filling uses in its on-zero mode.
#[must_use]
pub fn is_zero_scalar(value: &Value) -> bool {
    match value {
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

/// Returns true if the value is a record, map, or list.
#[must_use]
pub fn is_compound(value: &Value) -> bool {
    matches!(value, Value::Object(_) | Value::Array(_))
}

/// Measures a value against a numeric bound.
///
/// Numbers compare by value; strings and collections by their length. Shapes
/// with no meaningful measure return `None`, which bound predicates treat as
/// a failure.
#[must_use]
pub fn measure(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => Some(s.chars().count() as f64),
        Value::Array(items) => Some(items.len() as f64),
        Value::Object(entries) => Some(entries.len() as f64),
        _ => None,
    }
}

/// The length of a string or collection, if the value has one.
#[must_use]
pub fn length(value: &Value) -> Option<usize> {
    match value {
        Value::String(s) => Some(s.chars().count()),
        Value::Array(items) => Some(items.len()),
        Value::Object(entries) => Some(entries.len()),
        _ => None,
    }
}

/// Renders a value for the `$value` message token.
///
/// Strings print without quotes; everything else uses its JSON form.
#[must_use]
pub fn display(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Formats a numeric bound for message options, trimming a trailing `.0`.
#[must_use]
pub fn format_bound(bound: f64) -> String {
    if bound.fract() == 0.0 && bound.is_finite() {
        format!("{}", bound as i64)
    } else {
        format!("{bound}")
    }
}
