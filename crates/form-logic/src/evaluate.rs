use std::sync::LazyLock;

use regex::Regex;

use crate::spec::{Operator, Rule};

static NUMERIC_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[+-]?(?:\d+\.?\d*|\.\d+)(?:[eE][+-]?\d+)?")
        .expect("numeric prefix pattern is valid")
});

/// Evaluates one rule against the raw value read for its target field.
pub fn evaluate_rule(rule: &Rule, raw: &str) -> bool {
    compare(rule.operator, raw, &rule.value)
}

/// Applies an operator to both sides after trimming and lower-casing them.
pub fn compare(operator: Operator, raw_left: &str, raw_right: &str) -> bool {
    let left = raw_left.trim().to_lowercase();
    let right = raw_right.trim().to_lowercase();

    match operator {
        Operator::Equals => left == right,
        Operator::NotEquals => left != right,
        Operator::Contains => !right.is_empty() && left.contains(&right),
        // An empty literal never satisfies not-contains.
        Operator::NotContains => !right.is_empty() && !left.contains(&right),
        Operator::StartsWith => left.starts_with(&right),
        Operator::EndsWith => left.ends_with(&right),
        Operator::IsEmpty => left.is_empty(),
        Operator::IsNotEmpty => !left.is_empty(),
        Operator::GreaterThan => {
            numeric_operand(&left).is_some_and(|left| left > floatval(&right))
        }
        Operator::LessThan => numeric_operand(&left).is_some_and(|left| left < floatval(&right)),
        Operator::Unknown => false,
    }
}

/// Keeps digits, `-` and `.`; a side with nothing left cannot be compared.
fn numeric_operand(left: &str) -> Option<f64> {
    let stripped: String = left
        .chars()
        .filter(|ch| ch.is_ascii_digit() || *ch == '-' || *ch == '.')
        .collect();
    (!stripped.is_empty()).then(|| floatval(&stripped))
}

/// Parses the leading float of a string; anything unparseable is 0.
pub fn floatval(raw: &str) -> f64 {
    NUMERIC_PREFIX
        .find(raw.trim_start())
        .and_then(|prefix| prefix.as_str().parse::<f64>().ok())
        .filter(|value| value.is_finite())
        .unwrap_or(0.0)
}
