//! # verdict
//!
//! A declarative validation engine: describe what valid data looks like as
//! named rule-sets, validate any serializable input against them, and get
//! back an error report whose shape mirrors the failing parts of the input.
//!
//! ## Quick Start
//!
//! ```rust
//! use verdict::prelude::*;
//! use verdict::rules;
//! use serde_json::json;
//!
//! let validator = Validator::from_rules(rules! {
//!     "id" => RuleSet::new().int().required(),
//!     "name" => RuleSet::new().string().min(3.0),
//! });
//!
//! let report = validator.validate(&json!({"id": 0, "name": "ab"})).unwrap();
//! assert_eq!(
//!     report.unwrap().to_value(),
//!     json!({
//!         "id": ["required"],
//!         "name": ["name's length must be higher equal to 3"],
//!     })
//! );
//! ```
//!
//! ## Building blocks
//!
//! - [`RuleSet`](rule_set::RuleSet) — a fluent bundle of named checks for one
//!   position: type checks, bounds, requiredness, dependent requirements,
//!   combinators, nested validators.
//! - [`Validator`](validator::Validator) — binds rule-sets to fields (or one
//!   rule-set to a whole list/scalar) and walks the input.
//! - [`Report`](validator::Report) — the mirrored error tree; serializes to
//!   nested JSON, `None` at the call site means no errors.
//! - [`Engine`](engine::Engine) — registers custom predicates and hands out
//!   rule-sets that can reference them by key.
//! - [`schema`] — the same rule-sets derived from compact strings such as
//!   `"int,min=3,required"`.
//!
//! ## Errors
//!
//! Validation failures are data ([`Report`](validator::Report)).
//! Configuration faults — a rule naming a field the input does not have, a
//! fields validator handed a non-object — come back as
//! [`ConfigError`](error::ConfigError) and abort the call.

pub mod engine;
pub mod error;
pub mod prelude;
pub mod requires;
pub mod rule_set;
pub mod rules;
pub mod schema;
pub mod validator;
pub mod value;

mod messages;

pub use engine::Engine;
pub use error::ConfigError;
pub use rule_set::RuleSet;
pub use schema::SchemaError;
pub use validator::{Messages, Report, Rules, Translator, Validator};
