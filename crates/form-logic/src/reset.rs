use tracing::debug;

use crate::events::{ChangeCause, EventSink, LogicEvent};
use crate::form::{Field, FieldInput, FormState};
use crate::spec::FieldId;

/// Records every field's initial value as its default. Runs once per form.
pub fn capture_defaults(form: &mut FormState) {
    if form.defaults_captured {
        return;
    }
    for field in form.fields.values_mut() {
        match &mut field.input {
            FieldInput::Text { value } => {
                if field.default_value.is_none() && !value.is_empty() {
                    field.default_value = Some(value.clone());
                }
            }
            FieldInput::Choice { options } => {
                for option in options.iter_mut() {
                    option.default_checked |= option.checked;
                }
            }
            FieldInput::Select(select) => {
                let joined = select
                    .options
                    .iter()
                    .filter(|option| option.selected)
                    .map(|option| option.value.as_str())
                    .collect::<Vec<_>>()
                    .join(",");
                if field.default_value.is_none() && !joined.is_empty() {
                    field.default_value = Some(joined);
                }
            }
        }
    }
    form.defaults_captured = true;
}

/// Restores a field to its captured default, or blanks it when none exists.
/// Returns whether the value changed.
pub fn reset_field(field: &mut Field) -> bool {
    let default = field.default_value.as_deref();
    match &mut field.input {
        FieldInput::Text { value } => {
            let target = default.unwrap_or_default();
            if value.as_str() == target {
                return false;
            }
            *value = target.to_string();
            true
        }
        FieldInput::Choice { options } => {
            let mut changed = false;
            for option in options.iter_mut() {
                changed |= option.checked != option.default_checked;
                option.checked = option.default_checked;
            }
            changed
        }
        FieldInput::Select(select) => select.restore(default),
    }
}

/// Empties a field so it cannot satisfy other rules. Returns whether the value changed.
pub fn clear_field(field: &mut Field) -> bool {
    match &mut field.input {
        FieldInput::Text { value } => {
            if value.is_empty() {
                return false;
            }
            value.clear();
            true
        }
        FieldInput::Choice { options } => {
            let mut changed = false;
            for option in options.iter_mut().filter(|option| option.checked) {
                option.checked = false;
                changed = true;
            }
            changed
        }
        FieldInput::Select(select) => select.clear(),
    }
}

/// Resets one field of the form to its default, notifying the sink on change.
pub fn reset_to_defaults(form: &mut FormState, field_id: &FieldId, sink: &mut dyn EventSink) {
    let Some(field) = form.fields.get_mut(field_id) else {
        return;
    };
    if reset_field(field) {
        debug!(form_id = %form.id, field_id = %field_id, "field reset to default");
        sink.emit(LogicEvent::ValueChanged {
            form_id: form.id.clone(),
            field_id: field_id.clone(),
            cause: ChangeCause::Reset,
        });
    }
}

/// Clears every field whose container is hidden. Returns the fields that changed.
pub fn clear_hidden_fields(form: &mut FormState, sink: &mut dyn EventSink) -> Vec<FieldId> {
    debug!(form_id = %form.id, "clearing hidden fields");
    let mut cleared = Vec::new();
    for (field_id, field) in form.fields.iter_mut().filter(|(_, field)| field.hidden) {
        if !clear_field(field) {
            continue;
        }
        if field.upload {
            sink.emit(LogicEvent::UploadCleared {
                form_id: form.id.clone(),
                field_id: field_id.clone(),
            });
        }
        sink.emit(LogicEvent::ValueChanged {
            form_id: form.id.clone(),
            field_id: field_id.clone(),
            cause: ChangeCause::Cleared,
        });
        cleared.push(field_id.clone());
    }
    cleared
}
