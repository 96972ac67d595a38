use std::collections::BTreeMap;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::LogicError;
use crate::spec::{FieldId, FieldKind};

/// Live state of a rendered form: field values and container visibility.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct FormState {
    pub id: String,
    #[serde(default)]
    pub fields: BTreeMap<FieldId, Field>,
    /// Set once default values have been captured; they never change afterwards.
    #[serde(default)]
    pub defaults_captured: bool,
}

/// A field and its container.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Field {
    #[serde(rename = "type", default)]
    pub kind: FieldKind,
    pub input: FieldInput,
    #[serde(default)]
    pub hidden: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,
    /// File-upload widget whose queued files are dropped when the field is cleared.
    #[serde(default)]
    pub upload: bool,
}

/// The control backing a field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "control", rename_all = "snake_case")]
pub enum FieldInput {
    Text {
        #[serde(default)]
        value: String,
    },
    /// Checkbox or radio inputs: checkboxes, radios, payment choices, ratings, NPS.
    Choice {
        #[serde(default)]
        options: Vec<ChoiceOption>,
    },
    Select(SelectInput),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ChoiceOption {
    pub value: String,
    #[serde(default)]
    pub checked: bool,
    /// Captured "checked" default marker.
    #[serde(default)]
    pub default_checked: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SelectInput {
    #[serde(default)]
    pub options: Vec<SelectOption>,
    #[serde(default)]
    pub multiple: bool,
    /// Rendered through the enhanced select widget rather than a classic `<select>`.
    #[serde(default)]
    pub enhanced: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SelectOption {
    pub value: String,
    #[serde(default)]
    pub selected: bool,
    #[serde(default)]
    pub placeholder: bool,
}

/// A value written into a field by the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    Options(Vec<String>),
}

/// Observable contract of the enhanced select widget.
pub trait EnhancedSelect {
    fn selected_values(&self) -> Vec<String>;
    fn clear_selection(&mut self);
    fn set_selected_value(&mut self, values: &[String]);
    fn has_placeholder_option(&self) -> bool;
}

impl EnhancedSelect for SelectInput {
    fn selected_values(&self) -> Vec<String> {
        self.options
            .iter()
            .filter(|option| option.selected && !option.placeholder)
            .map(|option| option.value.clone())
            .collect()
    }

    fn clear_selection(&mut self) {
        for option in &mut self.options {
            option.selected = false;
        }
    }

    fn set_selected_value(&mut self, values: &[String]) {
        for option in &mut self.options {
            option.selected = values.iter().any(|value| value == &option.value);
        }
    }

    fn has_placeholder_option(&self) -> bool {
        self.options.iter().any(|option| option.placeholder)
    }
}

impl SelectInput {
    /// Index of the first selected option, placeholders included.
    pub fn selected_index(&self) -> Option<usize> {
        self.options.iter().position(|option| option.selected)
    }

    /// Selects exactly one option by index, or nothing.
    pub fn select_index(&mut self, index: Option<usize>) {
        for (position, option) in self.options.iter_mut().enumerate() {
            option.selected = Some(position) == index;
        }
    }

    fn placeholder_index(&self) -> Option<usize> {
        self.options.iter().position(|option| option.placeholder)
    }

    fn placeholder_value(&self) -> Option<String> {
        self.placeholder_index()
            .map(|index| self.options[index].value.clone())
    }

    /// Values of every selected option, placeholders included.
    fn raw_selection(&self) -> Vec<String> {
        self.options
            .iter()
            .filter(|option| option.selected)
            .map(|option| option.value.clone())
            .collect()
    }

    /// Puts the select back to its empty state. Returns whether anything changed.
    pub(crate) fn clear(&mut self) -> bool {
        if self.enhanced {
            let mut changed = false;
            if !self.selected_values().is_empty() {
                self.clear_selection();
                changed = true;
            }
            if !self.multiple
                && self.has_placeholder_option()
                && let Some(placeholder) = self.placeholder_value()
            {
                let before = self.raw_selection();
                self.set_selected_value(std::slice::from_ref(&placeholder));
                changed |= before != self.raw_selection();
            }
            changed
        } else {
            let target = self.placeholder_index().map(|_| 0);
            if self.selected_index() == target && self.raw_selection().len() <= 1 {
                return false;
            }
            self.select_index(target);
            true
        }
    }

    /// Applies a comma-joined default selection. Returns whether anything changed.
    pub(crate) fn restore(&mut self, default: Option<&str>) -> bool {
        let mut values: Vec<String> = default
            .map(|raw| raw.split(',').map(str::to_string).collect())
            .unwrap_or_default();

        if self.enhanced {
            values.retain(|value| !value.is_empty());
            if self.selected_values() == values {
                return false;
            }
            self.clear_selection();
            self.set_selected_value(&values);
            return true;
        }

        if values.is_empty() {
            return self.clear();
        }
        if self.raw_selection() == values {
            return false;
        }
        self.set_selected_value(&values);
        true
    }
}

impl Field {
    pub fn text(kind: FieldKind, value: impl Into<String>) -> Self {
        Self::with_input(
            kind,
            FieldInput::Text {
                value: value.into(),
            },
        )
    }

    pub fn choice<I, S>(kind: FieldKind, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let options = values
            .into_iter()
            .map(|value| ChoiceOption {
                value: value.into(),
                checked: false,
                default_checked: false,
            })
            .collect();
        Self::with_input(kind, FieldInput::Choice { options })
    }

    pub fn select(kind: FieldKind, input: SelectInput) -> Self {
        Self::with_input(kind, FieldInput::Select(input))
    }

    fn with_input(kind: FieldKind, input: FieldInput) -> Self {
        Self {
            kind,
            input,
            hidden: false,
            default_value: None,
            upload: false,
        }
    }

    /// Values of the active options: checked inputs or selected non-placeholder options.
    pub fn active_values(&self) -> Vec<&str> {
        match &self.input {
            FieldInput::Text { .. } => Vec::new(),
            FieldInput::Choice { options } => options
                .iter()
                .filter(|option| option.checked)
                .map(|option| option.value.as_str())
                .collect(),
            FieldInput::Select(select) => select
                .options
                .iter()
                .filter(|option| option.selected && !option.placeholder)
                .map(|option| option.value.as_str())
                .collect(),
        }
    }

    /// The control's own value: text content or the first selected option.
    pub fn raw_value(&self) -> Option<&str> {
        match &self.input {
            FieldInput::Text { value } => Some(value.as_str()),
            FieldInput::Choice { .. } => None,
            FieldInput::Select(select) => select
                .options
                .iter()
                .find(|option| option.selected)
                .map(|option| option.value.as_str()),
        }
    }

    /// Writes a host-provided value. Returns whether the field changed.
    pub fn apply(&mut self, value: &FieldValue) -> bool {
        match (&mut self.input, value) {
            (FieldInput::Text { value: current }, FieldValue::Text(next)) => {
                if *current == *next {
                    return false;
                }
                *current = next.clone();
                true
            }
            (FieldInput::Text { value: current }, FieldValue::Options(next)) => {
                let joined = next.join(",");
                if *current == joined {
                    return false;
                }
                *current = joined;
                true
            }
            (FieldInput::Choice { options }, value) => {
                let next = value_list(value);
                let mut changed = false;
                for option in options.iter_mut() {
                    let checked = next.iter().any(|candidate| candidate == &option.value);
                    changed |= option.checked != checked;
                    option.checked = checked;
                }
                changed
            }
            (FieldInput::Select(select), value) => {
                let next = value_list(value);
                if select.raw_selection() == next {
                    return false;
                }
                select.set_selected_value(&next);
                true
            }
        }
    }
}

fn value_list(value: &FieldValue) -> Vec<String> {
    match value {
        FieldValue::Text(text) if text.is_empty() => Vec::new(),
        FieldValue::Text(text) => vec![text.clone()],
        FieldValue::Options(values) => values.clone(),
    }
}

impl FormState {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            fields: BTreeMap::new(),
            defaults_captured: false,
        }
    }

    pub fn from_json(raw: &str) -> Result<Self, LogicError> {
        serde_json::from_str(raw).map_err(LogicError::Parse)
    }

    pub fn with_field(mut self, id: impl Into<FieldId>, field: Field) -> Self {
        self.fields.insert(id.into(), field);
        self
    }

    pub fn field(&self, id: &FieldId) -> Option<&Field> {
        self.fields.get(id)
    }

    pub fn field_mut(&mut self, id: &FieldId) -> Option<&mut Field> {
        self.fields.get_mut(id)
    }

    /// Writes a value into a field, as the host does when the user edits it.
    pub fn set_value(&mut self, id: &FieldId, value: FieldValue) -> Result<bool, LogicError> {
        let field = self
            .fields
            .get_mut(id)
            .ok_or_else(|| LogicError::UnknownField(id.clone()))?;
        Ok(field.apply(&value))
    }

    pub fn set_text(&mut self, id: &FieldId, value: &str) -> Result<bool, LogicError> {
        self.set_value(id, FieldValue::Text(value.to_string()))
    }

    /// Whether the field's container is currently shown. Unknown fields count as visible.
    pub fn is_visible(&self, id: &FieldId) -> bool {
        self.fields.get(id).is_none_or(|field| !field.hidden)
    }

    pub fn hidden_fields(&self) -> Vec<FieldId> {
        self.fields
            .iter()
            .filter(|(_, field)| field.hidden)
            .map(|(id, _)| id.clone())
            .collect()
    }
}
