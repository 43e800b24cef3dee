//! Deriving rule-sets from compact rule strings.
//!
//! A rule string is a comma-separated list of rule names, each optionally
//! carrying `&`-separated parameters after an `=`:
//!
//! ```text
//! int,min=3,required
//! ```
//!
//! A `child.` (or short `c.`) prefix routes a rule onto the children
//! validator applied to each list element:
//!
//! ```text
//! slice,required,c.int,c.min=1
//! ```
//!
//! `or` and `xor` take `|`-separated alternatives whose `+`-joined pieces are
//! parsed the same way; combinators cannot nest inside alternatives:
//!
//! ```text
//! or=int+min=2|string
//! ```
//!
//! Unknown rule names fall back to the engine's custom-rule registry and fail
//! with [`SchemaError::UnknownRule`] if absent there too.

use regex::Regex;
use serde_json::Value;
use thiserror::Error;

use crate::engine::Engine;
use crate::rule_set::RuleSet;
use crate::validator::Rules;

/// A fault in a rule string.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SchemaError {
    /// A rule name neither built in nor registered on the engine.
    #[error("unknown rule `{name}`")]
    UnknownRule { name: String },
    /// A parameter that does not parse, or the wrong number of them.
    #[error("bad parameter for `{rule}`: {detail}")]
    BadParameter { rule: String, detail: String },
    /// `or`/`xor` inside an `or`/`xor` alternative.
    #[error("`{rule}` cannot nest inside a combinator alternative")]
    NestedCombinator { rule: String },
    /// A construct valid elsewhere but not at this position.
    #[error("{0} is not supported here")]
    Unsupported(&'static str),
}

/// Parses one rule string per field into a [`Rules`] mapping.
pub fn parse_rules(engine: &Engine, fields: &[(&str, &str)]) -> Result<Rules, SchemaError> {
    let mut rules = Rules::new();
    for &(field, source) in fields {
        rules.insert(field.to_string(), parse_rule_set(engine, source)?);
    }
    Ok(rules)
}

/// Parses one rule string into a [`RuleSet`].
pub fn parse_rule_set(engine: &Engine, source: &str) -> Result<RuleSet, SchemaError> {
    let mut rule_set = engine.rule_set();
    let mut child_tokens = Vec::new();

    for token in source.split(',').map(str::trim).filter(|t| !t.is_empty()) {
        if let Some(rest) = token.strip_prefix("child.").or_else(|| token.strip_prefix("c.")) {
            child_tokens.push(rest);
            continue;
        }
        rule_set = apply(engine, rule_set, token, true)?;
    }

    if !child_tokens.is_empty() {
        let mut child = engine.rule_set();
        for token in child_tokens {
            child = apply(engine, child, token, true)?;
        }
        rule_set = rule_set.children(child);
    }

    Ok(rule_set)
}

/// Applies one `name[=p1&p2...]` token. Combinators are only admitted at the
/// top level of a rule string.
fn apply(
    engine: &Engine,
    rule_set: RuleSet,
    token: &str,
    combinators_allowed: bool,
) -> Result<RuleSet, SchemaError> {
    let (name, raw) = match token.split_once('=') {
        Some((name, raw)) => (name.trim(), Some(raw)),
        None => (token.trim(), None),
    };
    let params: Vec<&str> = raw.map_or_else(Vec::new, |raw| raw.split('&').collect());

    let applied = match name {
        "int" => rule_set.int(),
        "float" => rule_set.float(),
        "string" => rule_set.string(),
        "map" => rule_set.map(),
        "struct" => rule_set.record(),
        "slice" => rule_set.slice(),
        "required" => rule_set.required(),
        "optional" => rule_set.optional(),
        "non_zero" => rule_set.non_zero(),
        "non_nil" => rule_set.non_nil(),
        "non_empty" => rule_set.non_empty(),
        "min" => rule_set.min(float_param(name, &params)?),
        "max" => rule_set.max(float_param(name, &params)?),
        "len" => {
            let [n] = int_params::<1>(name, &params)?;
            let n = usize::try_from(n).map_err(|_| bad(name, "negative length"))?;
            rule_set.len(n)
        }
        "len_range" => {
            let [from, to] = int_params::<2>(name, &params)?;
            rule_set.len_range(from, to)
        }
        "regex" => {
            let pattern = single_param(name, &params)?;
            Regex::new(pattern).map_err(|e| bad(name, &e.to_string()))?;
            rule_set.regex(pattern)
        }
        "choices" => {
            if params.is_empty() {
                return Err(bad(name, "expects at least one choice"));
            }
            rule_set.choices(params.iter().map(|p| literal(p)).collect())
        }
        "when_exist_one" => rule_set.when_exist_one(field_params(name, &params)?),
        "when_exist_all" => rule_set.when_exist_all(field_params(name, &params)?),
        "when_not_exist_one" => rule_set.when_not_exist_one(field_params(name, &params)?),
        "when_not_exist_all" => rule_set.when_not_exist_all(field_params(name, &params)?),
        "or" | "xor" => {
            if !combinators_allowed {
                return Err(SchemaError::NestedCombinator {
                    rule: name.to_string(),
                });
            }
            let raw = raw.ok_or_else(|| bad(name, "expects `|`-separated alternatives"))?;
            let alternatives = parse_alternatives(engine, name, raw)?;
            if name == "or" {
                rule_set.or(alternatives)
            } else {
                rule_set.xor(alternatives)
            }
        }
        _ => match engine.custom(name) {
            Some(rule) => {
                let rule = rule.clone();
                rule_set.custom(name, move |value: &Value| rule(value))
            }
            None => {
                return Err(SchemaError::UnknownRule {
                    name: name.to_string(),
                })
            }
        },
    };

    Ok(applied)
}

/// `a+b=1|c` → one rule-set per `|`-alternative, pieces joined by `+`.
fn parse_alternatives(
    engine: &Engine,
    combinator: &str,
    raw: &str,
) -> Result<Vec<RuleSet>, SchemaError> {
    let mut alternatives = Vec::new();
    for alternative in raw.split('|') {
        let mut inner = engine.rule_set();
        for piece in alternative.split('+').map(str::trim).filter(|p| !p.is_empty()) {
            if piece.starts_with("child.") || piece.starts_with("c.") {
                return Err(SchemaError::Unsupported("a child rule in an alternative"));
            }
            inner = apply(engine, inner, piece, false)?;
        }
        alternatives.push(inner);
    }
    if alternatives.is_empty() {
        return Err(bad(combinator, "expects at least one alternative"));
    }
    Ok(alternatives)
}

fn bad(rule: &str, detail: &str) -> SchemaError {
    SchemaError::BadParameter {
        rule: rule.to_string(),
        detail: detail.to_string(),
    }
}

fn single_param<'a>(rule: &str, params: &[&'a str]) -> Result<&'a str, SchemaError> {
    match params {
        &[one] => Ok(one),
        _ => Err(bad(rule, "expects exactly one parameter")),
    }
}

fn float_param(rule: &str, params: &[&str]) -> Result<f64, SchemaError> {
    single_param(rule, params)?
        .parse()
        .map_err(|_| bad(rule, "expects a number"))
}

fn int_params<const N: usize>(rule: &str, params: &[&str]) -> Result<[i64; N], SchemaError> {
    let parsed: Vec<i64> = params
        .iter()
        .map(|p| p.parse().map_err(|_| bad(rule, "expects integers")))
        .collect::<Result<_, _>>()?;
    parsed
        .try_into()
        .map_err(|_| bad(rule, "wrong parameter count"))
}

fn field_params(rule: &str, params: &[&str]) -> Result<Vec<String>, SchemaError> {
    if params.is_empty() {
        return Err(bad(rule, "expects at least one field name"));
    }
    Ok(params.iter().map(|p| p.to_string()).collect())
}

/// A parameter literal: JSON scalar where it parses, bare string otherwise.
fn literal(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}
