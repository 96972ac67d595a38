use serde::Serialize;

use crate::spec::{Action, FieldId};

/// Why a field value was rewritten by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeCause {
    /// Restored to its captured default after being revealed.
    Reset,
    /// Emptied because its container is hidden.
    Cleared,
}

/// Notifications for host UI integrations.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum LogicEvent {
    FieldProcessed {
        form_id: String,
        field_id: FieldId,
        pass: bool,
        action: Action,
    },
    ValueChanged {
        form_id: String,
        field_id: FieldId,
        cause: ChangeCause,
    },
    /// A file-upload widget inside a hidden container must drop its queued files.
    UploadCleared { form_id: String, field_id: FieldId },
    PassCompleted {
        form_id: String,
        trigger: Option<FieldId>,
    },
}

/// Receives engine notifications.
pub trait EventSink {
    fn emit(&mut self, event: LogicEvent);
}

impl EventSink for Vec<LogicEvent> {
    fn emit(&mut self, event: LogicEvent) {
        self.push(event);
    }
}

/// Discards every notification.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&mut self, _event: LogicEvent) {}
}
