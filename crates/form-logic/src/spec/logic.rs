use std::collections::BTreeMap;
use std::fmt;

use schemars::JsonSchema;
use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::LogicError;
use crate::spec::field::{FieldId, FieldKind};

/// Comparison applied by a rule, keyed by the symbols hosts emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
pub enum Operator {
    #[serde(rename = "==")]
    Equals,
    #[serde(rename = "!=")]
    NotEquals,
    #[serde(rename = "c")]
    Contains,
    #[serde(rename = "!c")]
    NotContains,
    #[serde(rename = "^")]
    StartsWith,
    #[serde(rename = "~")]
    EndsWith,
    #[serde(rename = "e")]
    IsEmpty,
    #[serde(rename = "!e")]
    IsNotEmpty,
    #[serde(rename = ">")]
    GreaterThan,
    #[serde(rename = "<")]
    LessThan,
    /// Unrecognised or missing symbol; never passes.
    #[default]
    #[serde(other)]
    Unknown,
}

impl Operator {
    /// Emptiness checks look at whether a value exists, not at its content.
    pub fn checks_presence(self) -> bool {
        matches!(self, Operator::IsEmpty | Operator::IsNotEmpty)
    }
}

/// What to do with the field when its logic evaluates true.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Hide,
    #[default]
    #[serde(other)]
    Show,
}

/// A single comparison between a target field and a literal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Rule {
    #[serde(default)]
    pub field: FieldId,
    #[serde(rename = "type", default)]
    pub kind: FieldKind,
    #[serde(default)]
    pub operator: Operator,
    #[serde(default, deserialize_with = "string_or_number")]
    #[schemars(with = "String")]
    pub value: String,
}

impl Rule {
    /// The referenced field, or `None` for rules that must be skipped.
    pub fn target(&self) -> Option<&FieldId> {
        (!self.field.is_empty()).then_some(&self.field)
    }
}

/// Rules combined with AND.
pub type Group = Vec<Rule>;

/// Conditional spec for one field: groups combined with OR plus the action.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
pub struct FieldLogic {
    #[serde(default)]
    pub logic: Vec<Group>,
    #[serde(default)]
    pub action: Action,
}

/// Conditional logic for every field of one form, in field order.
pub type FormLogic = BTreeMap<FieldId, FieldLogic>;

/// Read-only logic configuration for every form on a page, keyed by form id.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct LogicSpecification {
    forms: BTreeMap<String, FormLogic>,
}

impl LogicSpecification {
    pub fn new(forms: BTreeMap<String, FormLogic>) -> Self {
        Self { forms }
    }

    pub fn from_json(raw: &str) -> Result<Self, LogicError> {
        serde_json::from_str(raw).map_err(LogicError::Parse)
    }

    pub fn from_value(value: Value) -> Result<Self, LogicError> {
        serde_json::from_value(value).map_err(LogicError::Parse)
    }

    /// Logic for a form, or `None` when the form has no conditional fields.
    pub fn form(&self, form_id: &str) -> Option<&FormLogic> {
        self.forms.get(form_id)
    }

    pub fn insert(&mut self, form_id: impl Into<String>, logic: FormLogic) {
        self.forms.insert(form_id.into(), logic);
    }

    pub fn form_ids(&self) -> impl Iterator<Item = &str> {
        self.forms.keys().map(String::as_str)
    }
}

fn string_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    struct LiteralVisitor;

    impl<'de> Visitor<'de> for LiteralVisitor {
        type Value = String;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a string or number literal")
        }

        fn visit_str<E: de::Error>(self, value: &str) -> Result<String, E> {
            Ok(value.to_string())
        }

        fn visit_string<E: de::Error>(self, value: String) -> Result<String, E> {
            Ok(value)
        }

        fn visit_u64<E: de::Error>(self, value: u64) -> Result<String, E> {
            Ok(value.to_string())
        }

        fn visit_i64<E: de::Error>(self, value: i64) -> Result<String, E> {
            Ok(value.to_string())
        }

        fn visit_f64<E: de::Error>(self, value: f64) -> Result<String, E> {
            Ok(value.to_string())
        }

        fn visit_bool<E: de::Error>(self, value: bool) -> Result<String, E> {
            Ok(value.to_string())
        }

        fn visit_unit<E: de::Error>(self) -> Result<String, E> {
            Ok(String::new())
        }
    }

    deserializer.deserialize_any(LiteralVisitor)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_host_logic_map() {
        let spec = LogicSpecification::from_value(json!({
            "7": {
                "2": {
                    "logic": [[
                        { "field": 1, "type": "text", "operator": "==", "value": "yes" },
                        { "field": "", "type": "checkbox", "operator": "e" }
                    ]],
                    "action": "hide"
                },
                "3": { "logic": [], "action": "show" }
            }
        }))
        .expect("spec");

        let form = spec.form("7").expect("form 7");
        let logic = &form[&FieldId::from("2")];
        assert_eq!(logic.action, Action::Hide);
        assert_eq!(logic.logic[0][0].operator, Operator::Equals);
        assert_eq!(logic.logic[0][0].target(), Some(&FieldId::from("1")));
        assert_eq!(logic.logic[0][1].target(), None);
        assert!(logic.logic[0][1].value.is_empty());
        assert!(spec.form("8").is_none());
    }

    #[test]
    fn unrecognised_symbols_degrade() {
        let rule: Rule = serde_json::from_value(json!({
            "field": "4", "type": "number", "operator": "between", "value": 12
        }))
        .expect("rule");
        assert_eq!(rule.operator, Operator::Unknown);
        assert_eq!(rule.kind, FieldKind::Text);
        assert_eq!(rule.value, "12");

        let logic: FieldLogic =
            serde_json::from_value(json!({ "action": "reveal" })).expect("logic");
        assert_eq!(logic.action, Action::Show);
        assert!(logic.logic.is_empty());
    }

    #[test]
    fn incomplete_rules_do_not_block_other_fields() {
        let spec = LogicSpecification::from_json(
            r#"{
                "7": {
                    "2": { "logic": [[{ "field": 1, "type": "text", "value": "yes" }]], "action": "hide" },
                    "3": { "logic": [[{ "field": 1.0, "type": "text", "operator": "e" }]], "action": "show" },
                    "4": { "logic": [[{ "field": 2.5, "operator": "==" }]] }
                }
            }"#,
        )
        .expect("spec loads despite incomplete rules");

        let form = spec.form("7").expect("form 7");
        let missing = &form[&FieldId::from("2")].logic[0][0];
        assert_eq!(missing.operator, Operator::Unknown);
        assert_eq!(missing.target(), Some(&FieldId::from("1")));
        let float_id = &form[&FieldId::from("3")].logic[0][0];
        assert_eq!(float_id.target(), Some(&FieldId::from("1")));
        let fractional = &form[&FieldId::from("4")].logic[0][0];
        assert_eq!(fractional.target(), None);
    }
}
