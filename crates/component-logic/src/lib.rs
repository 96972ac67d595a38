use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use thiserror::Error;
use tracing::debug;

use form_logic::{
    Engine, FieldId, FieldValue, FormState, LogicError, LogicEvent, LogicSpecification,
    form_schema, logic_schema,
};

const DEFAULT_LOGIC: &str = include_str!("../../form-logic/tests/fixtures/logic.json");

#[derive(Debug, Error)]
enum ComponentError {
    #[error("failed to parse config: {0}")]
    ConfigParse(#[source] serde_json::Error),
    #[error("failed to parse form state: {0}")]
    StateParse(#[source] serde_json::Error),
    #[error("failed to parse field value: {0}")]
    ValueParse(#[source] serde_json::Error),
    #[error("form '{0}' has no conditional logic")]
    FormUnavailable(String),
    #[error("form state belongs to form '{actual}', expected '{expected}'")]
    FormMismatch { expected: String, actual: String },
    #[error("json encode error: {0}")]
    JsonEncode(#[source] serde_json::Error),
    #[error(transparent)]
    Logic(#[from] LogicError),
}

#[derive(Debug, Deserialize, Serialize, Default)]
struct ComponentConfig {
    #[serde(default)]
    logic_json: Option<String>,
}

fn load_logic(config_json: &str) -> Result<LogicSpecification, ComponentError> {
    let config = if config_json.trim().is_empty() {
        ComponentConfig::default()
    } else {
        serde_json::from_str(config_json).map_err(ComponentError::ConfigParse)?
    };

    let logic_json = config.logic_json.as_deref().unwrap_or(DEFAULT_LOGIC);

    Ok(LogicSpecification::from_json(logic_json)?)
}

fn ensure_form(form_id: &str, config_json: &str) -> Result<Engine, ComponentError> {
    let spec = load_logic(config_json)?;
    if spec.form(form_id).is_none() {
        Err(ComponentError::FormUnavailable(form_id.to_string()))
    } else {
        Ok(Engine::new(spec))
    }
}

fn parse_state(form_id: &str, state_json: &str) -> Result<FormState, ComponentError> {
    let state: FormState = serde_json::from_str(state_json).map_err(ComponentError::StateParse)?;
    if state.id != form_id {
        return Err(ComponentError::FormMismatch {
            expected: form_id.to_string(),
            actual: state.id,
        });
    }
    Ok(state)
}

fn respond(result: Result<Value, ComponentError>) -> String {
    match result {
        Ok(value) => serde_json::to_string(&value).unwrap_or_else(|error| {
            json!({"error": format!("json encode: {}", error)}).to_string()
        }),
        Err(err) => json!({ "error": err.to_string() }).to_string(),
    }
}

fn encode(value: &impl Serialize) -> Result<Value, ComponentError> {
    serde_json::to_value(value).map_err(ComponentError::JsonEncode)
}

fn state_response(
    state: &FormState,
    outcome: Value,
    events: &[LogicEvent],
) -> Result<Value, ComponentError> {
    Ok(json!({
        "state": encode(state)?,
        "outcome": outcome,
        "events": encode(&events)?,
    }))
}

/// Returns the conditional logic configured for a form.
pub fn describe(form_id: &str, config_json: &str) -> String {
    respond(ensure_form(form_id, config_json).and_then(|engine| {
        let logic = engine
            .spec()
            .form(form_id)
            .ok_or_else(|| ComponentError::FormUnavailable(form_id.to_string()))?;
        encode(logic)
    }))
}

/// Captures defaults and applies the page-load visibility pass.
pub fn initialize(form_id: &str, config_json: &str, state_json: &str) -> String {
    respond(ensure_form(form_id, config_json).and_then(|engine| {
        let mut state = parse_state(form_id, state_json)?;
        let mut events: Vec<LogicEvent> = Vec::new();
        let outcome = engine.initialize(&mut state, &mut events);
        state_response(&state, encode(&outcome)?, &events)
    }))
}

/// Writes a field value and runs the visibility cascade it triggers.
pub fn field_changed(
    form_id: &str,
    config_json: &str,
    state_json: &str,
    field_id: &str,
    value_json: &str,
) -> String {
    respond(ensure_form(form_id, config_json).and_then(|engine| {
        let mut state = parse_state(form_id, state_json)?;
        let value: FieldValue =
            serde_json::from_str(value_json).map_err(ComponentError::ValueParse)?;
        let field_id = FieldId::from(field_id);
        debug!(form_id, field_id = %field_id, "field changed");
        let mut events: Vec<LogicEvent> = Vec::new();
        let outcome = engine.apply_change(&mut state, &field_id, value, &mut events)?;
        state_response(&state, encode(&outcome)?, &events)
    }))
}

/// Clears hidden fields ahead of submission.
pub fn submit(form_id: &str, config_json: &str, state_json: &str) -> String {
    respond(ensure_form(form_id, config_json).and_then(|engine| {
        let mut state = parse_state(form_id, state_json)?;
        let mut events: Vec<LogicEvent> = Vec::new();
        let cleared = engine.on_form_submit(&mut state, &mut events);
        state_response(&state, json!({ "cleared": encode(&cleared)? }), &events)
    }))
}

/// Reports which fields would be visible for the current values, without side effects.
pub fn preview(form_id: &str, config_json: &str, state_json: &str) -> String {
    respond(ensure_form(form_id, config_json).and_then(|engine| {
        let state = parse_state(form_id, state_json)?;
        let visibility = engine
            .preview(&state)
            .ok_or_else(|| ComponentError::FormUnavailable(form_id.to_string()))?;
        Ok(json!({ "visibility": encode(&visibility)? }))
    }))
}

pub fn get_logic_schema() -> String {
    respond(Ok(logic_schema()))
}

pub fn get_form_schema() -> String {
    respond(Ok(form_schema()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form_7(field_1: &str) -> String {
        json!({
            "id": "7",
            "fields": {
                "1": { "type": "text", "input": { "control": "text", "value": field_1 } },
                "2": { "type": "text", "input": { "control": "text", "value": "hello" } },
                "3": { "type": "text", "input": { "control": "text", "value": "set" } },
                "4": { "type": "text", "input": { "control": "text", "value": "" } }
            }
        })
        .to_string()
    }

    fn parse(response: &str) -> Value {
        serde_json::from_str(response).expect("json")
    }

    #[test]
    fn describe_returns_form_logic() {
        let logic = parse(&describe("7", ""));
        assert_eq!(logic["2"]["action"], "hide");
        assert_eq!(logic["2"]["logic"][0][0]["operator"], "==");
    }

    #[test]
    fn describe_reports_unknown_form() {
        let response = parse(&describe("404", ""));
        assert_eq!(response["error"], "form '404' has no conditional logic");
    }

    #[test]
    fn custom_logic_config_is_used() {
        let logic = json!({
            "5": { "9": { "logic": [[{ "field": 8, "type": "text", "operator": "e" }]] } }
        });
        let config = json!({ "logic_json": logic.to_string() }).to_string();
        let response = parse(&describe("5", &config));
        assert_eq!(response["9"]["action"], "show");
    }

    #[test]
    fn initialize_captures_defaults() {
        let response = parse(&initialize("7", "", &form_7("")));
        assert_eq!(response["state"]["defaults_captured"], true);
        assert_eq!(response["state"]["fields"]["2"]["default_value"], "hello");
        assert_eq!(response["outcome"]["passes"], 1);
    }

    #[test]
    fn field_changed_hides_and_clears() {
        let initialized = parse(&initialize("7", "", &form_7("")));
        let state = initialized["state"].to_string();
        let response = parse(&field_changed("7", "", &state, "1", r#""yes""#));

        assert_eq!(response["state"]["fields"]["2"]["hidden"], true);
        assert_eq!(response["state"]["fields"]["2"]["input"]["value"], "");
        assert_eq!(response["outcome"]["passes"], 2);
        let events = response["events"].as_array().expect("events");
        assert!(events.iter().any(|event| event["event"] == "value_changed"
            && event["field_id"] == "2"
            && event["cause"] == "cleared"));
    }

    #[test]
    fn field_changed_rejects_unknown_field() {
        let response = parse(&field_changed("7", "", &form_7(""), "42", r#""x""#));
        assert_eq!(response["error"], "field '42' is not part of the form");
    }

    #[test]
    fn state_for_another_form_is_rejected() {
        let response = parse(&preview("12", "", &form_7("")));
        assert_eq!(
            response["error"],
            "form state belongs to form '7', expected '12'"
        );
    }

    #[test]
    fn preview_reports_visibility() {
        let response = parse(&preview("7", "", &form_7("yes")));
        assert_eq!(response["visibility"]["2"], false);
        assert_eq!(response["visibility"]["3"], true);
    }

    #[test]
    fn submit_clears_hidden_values() {
        let mut state = parse(&form_7(""));
        state["fields"]["3"]["hidden"] = json!(true);
        let response = parse(&submit("7", "", &state.to_string()));
        assert_eq!(response["outcome"]["cleared"], json!(["3"]));
        assert_eq!(response["state"]["fields"]["3"]["input"]["value"], "");
    }

    #[test]
    fn schemas_are_available() {
        let logic = parse(&get_logic_schema());
        assert!(logic.is_object());
        let form = parse(&get_form_schema());
        assert!(form["properties"].get("fields").is_some());
    }
}
