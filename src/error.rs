//! The fatal configuration-fault channel.
//!
//! Validation failures are never errors in the Rust sense — they come back as
//! data in a [`Report`](crate::validator::Report). [`ConfigError`] is the
//! other channel: a rule tree that does not match the shape of the data it
//! claims to validate is a programming error, and `validate` aborts with it
//! immediately instead of folding it into the report.

use thiserror::Error;

/// A fault in the rule tree itself, detected while validating.
///
/// # Examples
///
/// ```rust
/// use verdict::{rules, ConfigError, RuleSet, Validator};
/// use serde_json::json;
///
/// let validator = Validator::from_rules(rules! {
///     "x" => RuleSet::new().int(),
/// });
/// let err = validator.validate_value(&json!(42)).unwrap_err();
/// assert!(matches!(err, ConfigError::ShapeMismatch { .. }));
/// ```
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The rules reference a field the input value does not have.
    #[error("rules reference field `{field}` but the input has no such member")]
    UnknownField {
        /// The field name that failed to resolve.
        field: String,
    },

    /// A dependent-requirement condition names a sibling field the input
    /// value does not have.
    #[error("requirement condition references sibling `{field}` but the input has no such member")]
    UnknownSibling {
        /// The sibling name that failed to resolve.
        field: String,
    },

    /// A fields validator was given a non-object root, or vice versa.
    #[error("expected {expected} input, found {found}")]
    ShapeMismatch {
        /// The shape the validator was built for.
        expected: &'static str,
        /// The shape of the value it received.
        found: &'static str,
    },

    /// The input could not be serialized into the engine's value model.
    #[error("input cannot be serialized for validation: {0}")]
    Serialize(#[from] serde_json::Error),
}
