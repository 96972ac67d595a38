use serde::Serialize;
use tracing::debug;

use crate::error::LogicError;
use crate::events::EventSink;
use crate::form::{FieldValue, FormState};
use crate::reset::{capture_defaults, clear_hidden_fields};
use crate::spec::{FieldId, FormLogic, LogicSpecification};
use crate::visibility::{FieldVerdict, PassOutcome, VisibilityMap, reconcile, resolve_visibility};

/// What one external trigger did to the form.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CascadeOutcome {
    /// Reconciliation passes run: 1, or 2 when the first pass hid a field.
    pub passes: usize,
    /// Verdicts of the final pass.
    pub verdicts: Vec<FieldVerdict>,
    /// Fields whose containers are hidden once the trigger settled.
    pub hidden: Vec<FieldId>,
}

/// Conditional visibility engine over a read-only logic specification.
#[derive(Debug, Clone, Default)]
pub struct Engine {
    spec: LogicSpecification,
}

impl Engine {
    pub fn new(spec: LogicSpecification) -> Self {
        Self { spec }
    }

    pub fn spec(&self) -> &LogicSpecification {
        &self.spec
    }

    fn logic_for(&self, form: &FormState) -> Option<&FormLogic> {
        let logic = self.spec.form(&form.id);
        if logic.is_none() {
            debug!(form_id = %form.id, "form has no conditional logic");
        }
        logic
    }

    /// Page-load entry point: captures defaults and runs a single pass.
    ///
    /// Returns `None` when the form has no conditional logic.
    pub fn initialize(
        &self,
        form: &mut FormState,
        sink: &mut dyn EventSink,
    ) -> Option<CascadeOutcome> {
        capture_defaults(form);
        let logic = self.logic_for(form)?;
        let outcome = reconcile(form, logic, None, sink);
        Some(settled(form, 1, outcome))
    }

    /// A field's value changed: evaluate, then settle once if anything was hidden.
    ///
    /// Defaults are captured first when the form was never initialized.
    pub fn on_field_changed(
        &self,
        form: &mut FormState,
        field_id: &FieldId,
        sink: &mut dyn EventSink,
    ) -> Option<CascadeOutcome> {
        capture_defaults(form);
        let logic = self.logic_for(form)?;
        let first = self.evaluate(form, logic, field_id, sink);
        if !first.any_hidden {
            return Some(settled(form, 1, first));
        }
        let second = self.settle(form, logic, field_id, sink);
        Some(settled(form, 2, second))
    }

    /// Writes a value into a field and processes the change.
    pub fn apply_change(
        &self,
        form: &mut FormState,
        field_id: &FieldId,
        value: FieldValue,
        sink: &mut dyn EventSink,
    ) -> Result<Option<CascadeOutcome>, LogicError> {
        capture_defaults(form);
        form.set_value(field_id, value)?;
        Ok(self.on_field_changed(form, field_id, sink))
    }

    /// The form is about to be submitted: nothing hidden may carry a value.
    pub fn on_form_submit(&self, form: &mut FormState, sink: &mut dyn EventSink) -> Vec<FieldId> {
        clear_hidden_fields(form, sink)
    }

    /// Whether a field is currently shown. Fields without logic are always visible.
    pub fn is_visible(&self, form: &FormState, field_id: &FieldId) -> bool {
        form.is_visible(field_id)
    }

    /// Side-effect free verdicts for the form's current values.
    pub fn preview(&self, form: &FormState) -> Option<VisibilityMap> {
        self.spec
            .form(&form.id)
            .map(|logic| resolve_visibility(logic, form))
    }

    fn evaluate(
        &self,
        form: &mut FormState,
        logic: &FormLogic,
        trigger: &FieldId,
        sink: &mut dyn EventSink,
    ) -> PassOutcome {
        reconcile(form, logic, Some(trigger), sink)
    }

    /// Second and last pass: clearing hidden values may have flipped other verdicts.
    fn settle(
        &self,
        form: &mut FormState,
        logic: &FormLogic,
        trigger: &FieldId,
        sink: &mut dyn EventSink,
    ) -> PassOutcome {
        debug!(form_id = %form.id, trigger = %trigger, "settling after hidden fields were cleared");
        reconcile(form, logic, Some(trigger), sink)
    }
}

fn settled(form: &FormState, passes: usize, outcome: PassOutcome) -> CascadeOutcome {
    CascadeOutcome {
        passes,
        verdicts: outcome.verdicts,
        hidden: form.hidden_fields(),
    }
}
