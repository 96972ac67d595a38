use std::borrow::Cow;

use crate::escape::escape_text;
use crate::form::{Field, FieldInput, FormState};
use crate::spec::{FieldKind, Rule};

/// A field value as seen by one rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessedValue {
    /// Content of the field; `None` when there is nothing to compare.
    Text(Option<String>),
    /// Whether any option is active; used by emptiness checks on choice fields.
    Presence(bool),
}

impl AccessedValue {
    /// Left-hand operand handed to the rule evaluator.
    pub fn operand(&self) -> Cow<'_, str> {
        match self {
            AccessedValue::Text(Some(text)) => Cow::Borrowed(text.as_str()),
            AccessedValue::Text(None) => Cow::Borrowed(""),
            AccessedValue::Presence(true) => Cow::Borrowed("true"),
            AccessedValue::Presence(false) => Cow::Borrowed(""),
        }
    }
}

/// Reads the normalized value of the field a rule targets.
///
/// The rule's own `type` picks the extraction strategy; a field missing from the
/// form reads as empty.
pub fn value_of(form: &FormState, rule: &Rule) -> AccessedValue {
    let field = form.field(&rule.field);

    if rule.operator.checks_presence() {
        return if rule.kind.is_choice_like() {
            AccessedValue::Presence(field.is_some_and(|field| !field.active_values().is_empty()))
        } else {
            AccessedValue::Text(
                field
                    .and_then(Field::raw_value)
                    .map(str::to_string)
                    .filter(|value| !value.is_empty()),
            )
        };
    }

    let Some(field) = field else {
        return AccessedValue::Text(None);
    };

    if rule.kind.is_choice_like() {
        AccessedValue::Text(choice_value(field, rule))
    } else {
        AccessedValue::Text(text_value(field, rule.kind))
    }
}

fn choice_value(field: &Field, rule: &Rule) -> Option<String> {
    let active = field.active_values();

    if rule.kind.filters_by_literal() {
        let literal = if is_enhanced_select(field) {
            rule.value.trim()
        } else {
            rule.value.as_str()
        };
        return active
            .into_iter()
            .rev()
            .filter_map(escape_text)
            .find(|escaped| escaped == literal);
    }

    active.first().and_then(|value| escape_text(value))
}

fn text_value(field: &Field, kind: FieldKind) -> Option<String> {
    let raw = field.raw_value()?;
    if kind.escapes_raw_value() {
        escape_text(raw)
    } else {
        Some(raw.to_string())
    }
}

fn is_enhanced_select(field: &Field) -> bool {
    matches!(&field.input, FieldInput::Select(select) if select.enhanced)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::{FieldValue, SelectInput, SelectOption};
    use crate::spec::{FieldId, Operator};

    fn rule(field: &str, kind: FieldKind, operator: Operator, value: &str) -> Rule {
        Rule {
            field: FieldId::from(field),
            kind,
            operator,
            value: value.to_string(),
        }
    }

    fn form() -> FormState {
        let mut colors = Field::choice(FieldKind::Checkbox, ["Red", "Blue & Green"]);
        colors.apply(&FieldValue::Options(vec![
            "Red".into(),
            "Blue & Green".into(),
        ]));
        let mut size = Field::choice(FieldKind::Radio, ["S", "M"]);
        size.apply(&FieldValue::Text("M".into()));
        let plan = Field::select(
            FieldKind::PaymentSelect,
            SelectInput {
                options: vec![SelectOption {
                    value: "<gold>".into(),
                    selected: true,
                    placeholder: false,
                }],
                multiple: false,
                enhanced: false,
            },
        );
        FormState::new("7")
            .with_field("1", Field::text(FieldKind::Text, "hello"))
            .with_field("2", colors)
            .with_field("3", size)
            .with_field("4", plan)
            .with_field("5", Field::choice(FieldKind::Checkbox, ["x"]))
    }

    #[test]
    fn text_fields_return_raw_value() {
        let value = value_of(&form(), &rule("1", FieldKind::Text, Operator::Equals, "x"));
        assert_eq!(value.operand(), "hello");
    }

    #[test]
    fn multi_choice_keeps_option_matching_literal() {
        let form = form();
        let hit = value_of(
            &form,
            &rule("2", FieldKind::Checkbox, Operator::Equals, "Blue &amp; Green"),
        );
        assert_eq!(hit.operand(), "Blue &amp; Green");
        let miss = value_of(&form, &rule("2", FieldKind::Checkbox, Operator::Equals, "Pink"));
        assert_eq!(miss, AccessedValue::Text(None));
    }

    #[test]
    fn single_choice_returns_active_option() {
        let value = value_of(&form(), &rule("3", FieldKind::Radio, Operator::NotEquals, "S"));
        assert_eq!(value.operand(), "M");
    }

    #[test]
    fn payment_select_is_escaped() {
        let value = value_of(&form(), &rule("4", FieldKind::PaymentSelect, Operator::Equals, ""));
        assert_eq!(value.operand(), "&lt;gold&gt;");
    }

    #[test]
    fn emptiness_checks_read_presence_for_choices() {
        let form = form();
        let checked = value_of(&form, &rule("2", FieldKind::Checkbox, Operator::IsEmpty, ""));
        assert_eq!(checked, AccessedValue::Presence(true));
        let unchecked = value_of(&form, &rule("5", FieldKind::Checkbox, Operator::IsNotEmpty, ""));
        assert_eq!(unchecked, AccessedValue::Presence(false));
        assert_eq!(unchecked.operand(), "");
        let missing = value_of(&form, &rule("9", FieldKind::Text, Operator::IsEmpty, ""));
        assert_eq!(missing, AccessedValue::Text(None));
    }
}
