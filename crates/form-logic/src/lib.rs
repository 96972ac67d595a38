#![allow(missing_docs)]

pub mod accessor;
pub mod aggregate;
pub mod engine;
pub mod error;
pub mod escape;
pub mod evaluate;
pub mod events;
pub mod form;
pub mod reset;
pub mod spec;
pub mod visibility;

pub use accessor::{AccessedValue, value_of};
pub use aggregate::{group_passes, passes};
pub use engine::{CascadeOutcome, Engine};
pub use error::LogicError;
pub use escape::escape_text;
pub use evaluate::{compare, evaluate_rule, floatval};
pub use events::{ChangeCause, EventSink, LogicEvent, NullSink};
pub use form::{
    ChoiceOption, EnhancedSelect, Field, FieldInput, FieldValue, FormState, SelectInput,
    SelectOption,
};
pub use reset::{capture_defaults, clear_field, clear_hidden_fields, reset_field, reset_to_defaults};
pub use spec::{
    Action, FieldId, FieldKind, FieldLogic, FormLogic, Group, LogicSpecification, Operator, Rule,
};
pub use visibility::{
    FieldVerdict, PassOutcome, Visibility, VisibilityMap, reconcile, resolve_visibility,
};

/// JSON schema for the logic specification consumed by [`Engine`].
pub fn logic_schema() -> serde_json::Value {
    serde_json::to_value(schemars::schema_for!(LogicSpecification)).unwrap_or_default()
}

/// JSON schema for the live form state.
pub fn form_schema() -> serde_json::Value {
    serde_json::to_value(schemars::schema_for!(FormState)).unwrap_or_default()
}
