use tracing::trace;

use crate::accessor::value_of;
use crate::evaluate::evaluate_rule;
use crate::form::FormState;
use crate::spec::{FieldLogic, Group, Rule};

/// True when any group of the field's logic passes.
///
/// A field with no groups never passes.
pub fn passes(form: &FormState, logic: &FieldLogic) -> bool {
    logic.logic.iter().any(|group| group_passes(form, group))
}

/// True when every rule with a target field passes; rules without one are skipped.
pub fn group_passes(form: &FormState, group: &Group) -> bool {
    group
        .iter()
        .filter(|rule| rule.target().is_some())
        .all(|rule| rule_passes(form, rule))
}

fn rule_passes(form: &FormState, rule: &Rule) -> bool {
    let value = value_of(form, rule);
    let result = evaluate_rule(rule, &value.operand());
    trace!(
        form_id = %form.id,
        field_id = %rule.field,
        operator = ?rule.operator,
        left = %value.operand(),
        right = %rule.value,
        result,
        "rule evaluated"
    );
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::Field;
    use crate::spec::{Action, FieldId, FieldKind, Operator};

    fn equals(field: &str, value: &str) -> Rule {
        Rule {
            field: FieldId::from(field),
            kind: FieldKind::Text,
            operator: Operator::Equals,
            value: value.to_string(),
        }
    }

    fn form(a: bool, b: bool, c: bool) -> FormState {
        let flag = |on: bool| if on { "on" } else { "off" };
        FormState::new("1")
            .with_field("a", Field::text(FieldKind::Text, flag(a)))
            .with_field("b", Field::text(FieldKind::Text, flag(b)))
            .with_field("c", Field::text(FieldKind::Text, flag(c)))
    }

    #[test]
    fn groups_combine_or_over_and() {
        let logic = FieldLogic {
            logic: vec![
                vec![equals("a", "on"), equals("b", "on")],
                vec![equals("c", "on")],
            ],
            action: Action::Show,
        };

        for bits in 0..8u8 {
            let (a, b, c) = (bits & 1 != 0, bits & 2 != 0, bits & 4 != 0);
            assert_eq!(
                passes(&form(a, b, c), &logic),
                (a && b) || c,
                "a={a} b={b} c={c}"
            );
        }
    }

    #[test]
    fn empty_groups_pass_and_empty_logic_fails() {
        let form = form(false, false, false);
        let empty_group = FieldLogic {
            logic: vec![vec![]],
            action: Action::Show,
        };
        assert!(passes(&form, &empty_group));
        assert!(!passes(&form, &FieldLogic::default()));
    }

    #[test]
    fn rules_without_target_are_skipped() {
        let form = form(true, false, false);
        let logic = FieldLogic {
            logic: vec![vec![equals("", "never"), equals("a", "on")]],
            action: Action::Hide,
        };
        assert!(passes(&form, &logic));
    }

    #[test]
    fn rule_without_operator_fails_only_its_group() {
        let form = form(true, false, false);
        let logic: FieldLogic = serde_json::from_value(serde_json::json!({
            "logic": [
                [{ "field": "a", "type": "text", "value": "on" }],
                [{ "field": "a", "type": "text", "operator": "==", "value": "on" }]
            ],
            "action": "show"
        }))
        .expect("logic");

        assert!(!group_passes(&form, &logic.logic[0]));
        assert!(group_passes(&form, &logic.logic[1]));
        assert!(passes(&form, &logic));
    }
}
