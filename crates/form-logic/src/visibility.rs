use serde::Serialize;
use tracing::debug;

use crate::aggregate::passes;
use crate::events::{EventSink, LogicEvent};
use crate::form::FormState;
use crate::reset::{clear_hidden_fields, reset_to_defaults};
use crate::spec::{Action, FieldId, FormLogic};

pub type VisibilityMap = std::collections::BTreeMap<FieldId, bool>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    Visible,
    Hidden,
}

impl Visibility {
    /// Hidden when a passing logic hides the field or a failing logic would have shown it.
    pub fn resolve(pass: bool, action: Action) -> Self {
        match (pass, action) {
            (true, Action::Hide) | (false, Action::Show) => Visibility::Hidden,
            _ => Visibility::Visible,
        }
    }

    pub fn is_visible(self) -> bool {
        matches!(self, Visibility::Visible)
    }
}

/// Verdict for one field in one reconciliation pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldVerdict {
    pub field_id: FieldId,
    pub pass: bool,
    pub action: Action,
    pub visibility: Visibility,
}

/// Result of one reconciliation pass.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct PassOutcome {
    pub any_hidden: bool,
    pub verdicts: Vec<FieldVerdict>,
}

/// Computes visibility for every field with logic without touching the form.
pub fn resolve_visibility(logic: &FormLogic, form: &FormState) -> VisibilityMap {
    logic
        .iter()
        .map(|(field_id, field_logic)| {
            let pass = passes(form, field_logic);
            let visible = Visibility::resolve(pass, field_logic.action).is_visible();
            (field_id.clone(), visible)
        })
        .collect()
}

/// Applies verdicts to the form: hides and shows containers, restores defaults
/// on reveal and clears hidden fields when anything resolved hidden.
///
/// `trigger` is the field whose own change started the pass; it is never reset.
pub fn reconcile(
    form: &mut FormState,
    logic: &FormLogic,
    trigger: Option<&FieldId>,
    sink: &mut dyn EventSink,
) -> PassOutcome {
    let mut outcome = PassOutcome::default();

    for (field_id, field_logic) in logic {
        let pass = passes(form, field_logic);
        let visibility = Visibility::resolve(pass, field_logic.action);
        debug!(form_id = %form.id, field_id = %field_id, pass, ?visibility, "field processed");

        match visibility {
            Visibility::Hidden => {
                if let Some(field) = form.field_mut(field_id) {
                    field.hidden = true;
                }
                outcome.any_hidden = true;
            }
            Visibility::Visible => {
                let revealed = trigger != Some(field_id)
                    && form.field(field_id).is_some_and(|field| field.hidden);
                if revealed {
                    reset_to_defaults(form, field_id, sink);
                }
                if let Some(field) = form.field_mut(field_id) {
                    field.hidden = false;
                }
            }
        }

        sink.emit(LogicEvent::FieldProcessed {
            form_id: form.id.clone(),
            field_id: field_id.clone(),
            pass,
            action: field_logic.action,
        });
        outcome.verdicts.push(FieldVerdict {
            field_id: field_id.clone(),
            pass,
            action: field_logic.action,
            visibility,
        });
    }

    if outcome.any_hidden {
        clear_hidden_fields(form, sink);
    }

    sink.emit(LogicEvent::PassCompleted {
        form_id: form.id.clone(),
        trigger: trigger.cloned(),
    });
    outcome
}
