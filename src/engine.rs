//! The engine: entry point for building validators and registering custom
//! rules.
//!
//! An [`Engine`] owns a registry of named custom predicates and hands out
//! rule-sets and validators wired to that registry. Everything an engine
//! produces is immutable afterwards and safe to share across threads.
//!
//! # Examples
//!
//! ```rust
//! use verdict::{rules, Engine};
//! use serde_json::{json, Value};
//!
//! let engine = Engine::new().custom_rule("even", |v: &Value| {
//!     v.as_i64().is_some_and(|n| n % 2 == 0)
//! });
//!
//! let validator = engine.validator(rules! {
//!     "count" => engine.rule_set().int().registered_custom(&["even"]),
//! });
//! assert!(validator.validate_value(&json!({"count": 3})).unwrap().is_some());
//! ```

use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::Value;

use crate::rule_set::RuleSet;
use crate::rules::Rule;
use crate::validator::{Rules, Validator};

/// The factory for rule-sets and validators.
#[derive(Clone, Default)]
pub struct Engine {
    customs: BTreeMap<String, Rule>,
}

impl Engine {
    /// Creates an engine with an empty custom-rule registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a named custom predicate, available to every rule-set this
    /// engine later produces via
    /// [`registered_custom`](RuleSet::registered_custom).
    ///
    /// # Panics
    ///
    /// Panics at build time on a duplicate key.
    #[must_use]
    pub fn custom_rule<F>(mut self, key: impl Into<String>, rule: F) -> Self
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        let key = key.into();
        if self.customs.contains_key(&key) {
            panic!("`{key}` custom rule is duplicate and has to be unique");
        }
        self.customs.insert(key, Arc::new(rule));
        self
    }

    /// A fresh rule-set bound to this engine's custom-rule registry.
    #[must_use]
    pub fn rule_set(&self) -> RuleSet {
        RuleSet::new().with_registry(self.registry())
    }

    /// Like [`rule_set`](Self::rule_set), with a display name used in error
    /// output instead of the field's own key.
    #[must_use]
    pub fn named_rule_set(&self, name: impl Into<String>) -> RuleSet {
        RuleSet::named(name).with_registry(self.registry())
    }

    /// A validator for record/map inputs.
    #[must_use]
    pub fn validator(&self, rules: Rules) -> Validator {
        Validator::from_rules(rules)
    }

    /// A validator for list or scalar inputs, driven by one rule-set.
    #[must_use]
    pub fn element_validator(&self, rule: RuleSet) -> Validator {
        Validator::from_rule(rule)
    }

    pub(crate) fn custom(&self, key: &str) -> Option<&Rule> {
        self.customs.get(key)
    }

    fn registry(&self) -> Arc<BTreeMap<String, Rule>> {
        Arc::new(self.customs.clone())
    }
}
