use thiserror::Error;

use crate::spec::FieldId;

/// Failures while loading logic or form state. Evaluation itself never fails.
#[derive(Debug, Error)]
pub enum LogicError {
    #[error("failed to parse logic JSON: {0}")]
    Parse(#[source] serde_json::Error),
    #[error("field '{0}' is not part of the form")]
    UnknownField(FieldId),
}
