//! Prelude module for convenient imports.
//!
//! Provides a single `use verdict::prelude::*;` import that brings in the
//! types needed to build and run validators.
//!
//! # Examples
//!
//! ```rust
//! use verdict::prelude::*;
//! use verdict::rules;
//! use serde_json::json;
//!
//! let validator = Validator::from_rules(rules! {
//!     "name" => RuleSet::new().string().min(3.0).required(),
//! });
//! assert!(validator.validate_value(&json!({"name": "ada"})).unwrap().is_none());
//! ```

pub use crate::engine::Engine;
pub use crate::error::ConfigError;
pub use crate::requires::Requirement;
pub use crate::rule_set::{OptionsMap, RuleSet};
pub use crate::rules::Rule;
pub use crate::schema::{parse_rule_set, parse_rules, SchemaError};
pub use crate::validator::{Messages, Report, Rules, Translator, Validator};
pub use crate::value::Shape;

pub use crate::rules;
