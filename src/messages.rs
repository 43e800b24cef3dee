//! Message resolution: the override cascade and placeholder substitution.
//!
//! For a failed rule key the final text is found by a single linear cascade,
//! first match wins: the rule-set's per-rule specific message, then the
//! validator's general message, then the built-in default, and finally a
//! diagnostic naming the missing rule key — never a silent empty string.
//!
//! The resolved template then has every `$option` token from the rule's
//! options rewritten, plus the reserved `$field` and `$value` tokens. An
//! optional translator is applied to the template and to the substituted
//! `$value`, in that order.

use serde_json::Value;

use crate::rule_set::RuleSet;
use crate::rules::default_message;
use crate::validator::{Messages, Translator};
use crate::value::display;

/// Resolves and formats the message for one failed rule key.
pub(crate) fn render(
    rule_key: &str,
    field: &str,
    value: &Value,
    rule_set: &RuleSet,
    general: &Messages,
    translator: Option<&Translator>,
) -> String {
    let mut message = resolve(rule_key, rule_set, general);
    if let Some(translate) = translator {
        message = translate(&message);
    }

    if let Some(options) = rule_set.option(rule_key) {
        for (key, replacement) in options {
            message = message.replace(&format!("${key}"), replacement);
        }
    }

    let mut shown = display(value);
    if let Some(translate) = translator {
        shown = translate(&shown);
    }

    message.replace("$field", field).replace("$value", &shown)
}

fn resolve(rule_key: &str, rule_set: &RuleSet, general: &Messages) -> String {
    if let Some(specific) = rule_set.specific().get(rule_key) {
        return specific.clone();
    }
    if let Some(message) = general.get(rule_key) {
        return message.clone();
    }
    if let Some(default) = default_message(rule_key) {
        return default.to_string();
    }
    format!("error happened but no error message exists on '{rule_key}' rule key")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn specific_beats_general_beats_default() {
        let rule_set = RuleSet::new().min(3.0).specific_message("min", "specific");
        let mut general = Messages::new();
        general.insert("min".to_string(), "general".to_string());

        assert_eq!(render("min", "f", &json!(1), &rule_set, &general, None), "specific");

        let rule_set = RuleSet::new().min(3.0);
        assert_eq!(render("min", "f", &json!(1), &rule_set, &general, None), "general");

        let general = Messages::new();
        assert_eq!(
            render("min", "f", &json!(1), &rule_set, &general, None),
            "f's length must be higher equal to 3"
        );
    }

    #[test]
    fn unknown_rule_key_yields_a_diagnostic() {
        let rule_set = RuleSet::new();
        let message = render("mystery", "f", &json!(1), &rule_set, &Messages::new(), None);
        assert_eq!(
            message,
            "error happened but no error message exists on 'mystery' rule key"
        );
    }

    #[test]
    fn every_token_occurrence_is_substituted() {
        let rule_set = RuleSet::new()
            .min(2.0)
            .specific_message("min", "$field: $min, again $min, value $value");
        let message = render("min", "age", &json!(1), &rule_set, &Messages::new(), None);
        assert_eq!(message, "age: 2, again 2, value 1");
    }

    #[test]
    fn translator_touches_template_and_value() {
        let rule_set = RuleSet::new().specific_message("required", "missing: $value");
        let translate: &Translator = &|s: &str| s.replace("missing", "manquant").replace("ab", "ba");
        let message = render(
            "required",
            "f",
            &json!("ab"),
            &rule_set,
            &Messages::new(),
            Some(translate),
        );
        assert_eq!(message, "manquant: ba");
    }
}
