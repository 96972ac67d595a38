pub mod field;
pub mod logic;

pub use field::{FieldId, FieldKind};
pub use logic::{Action, FieldLogic, FormLogic, Group, LogicSpecification, Operator, Rule};
