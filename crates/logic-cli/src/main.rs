use clap::{Parser, Subcommand, ValueEnum};
use component_logic::{
    field_changed, get_form_schema, get_logic_schema, initialize, preview, submit,
};
use serde_json::{Value, json};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

const LOGIC_ENV: &str = "FORM_LOGIC_SPEC";

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Conditional form logic CLI",
    long_about = "Evaluates field visibility for a form state against a conditional logic specification"
)]
struct Cli {
    /// Trace every rule evaluation on stderr.
    #[arg(long, global = true)]
    debug: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum OutputMode {
    Text,
    Json,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum SchemaKind {
    Logic,
    Form,
}

#[derive(Subcommand)]
enum Command {
    /// Capture defaults and apply the page-load visibility pass.
    Evaluate {
        /// Path to the logic specification JSON (defaults to FORM_LOGIC_SPEC).
        #[arg(long, value_name = "LOGIC")]
        logic: Option<PathBuf>,
        /// Path to the form state JSON.
        #[arg(long, value_name = "STATE")]
        state: PathBuf,
        /// Write the resulting form state to this file.
        #[arg(long, value_name = "OUT")]
        out: Option<PathBuf>,
        #[arg(long, value_enum, default_value_t = OutputMode::Text)]
        format: OutputMode,
    },
    /// Set a field value and run the visibility cascade it triggers.
    Change {
        #[arg(long, value_name = "LOGIC")]
        logic: Option<PathBuf>,
        #[arg(long, value_name = "STATE")]
        state: PathBuf,
        /// Field whose value changed.
        #[arg(long, value_name = "FIELD")]
        field: String,
        /// New value: a JSON string or array, or bare text.
        #[arg(long, value_name = "VALUE", allow_hyphen_values = true)]
        value: String,
        #[arg(long, value_name = "OUT")]
        out: Option<PathBuf>,
        #[arg(long, value_enum, default_value_t = OutputMode::Text)]
        format: OutputMode,
    },
    /// Clear values inside hidden fields, as done right before submission.
    Submit {
        #[arg(long, value_name = "LOGIC")]
        logic: Option<PathBuf>,
        #[arg(long, value_name = "STATE")]
        state: PathBuf,
        #[arg(long, value_name = "OUT")]
        out: Option<PathBuf>,
        #[arg(long, value_enum, default_value_t = OutputMode::Text)]
        format: OutputMode,
    },
    /// Show which fields would be visible, without changing anything.
    Preview {
        #[arg(long, value_name = "LOGIC")]
        logic: Option<PathBuf>,
        #[arg(long, value_name = "STATE")]
        state: PathBuf,
    },
    /// Print the JSON schema of the logic specification or the form state.
    Schema {
        #[arg(long, value_enum, default_value_t = SchemaKind::Logic)]
        kind: SchemaKind,
    },
}

fn main() -> CliResult<()> {
    let cli = Cli::parse();
    init_tracing(cli.debug);
    match cli.command {
        Command::Evaluate {
            logic,
            state,
            out,
            format,
        } => run_evaluate(logic, state, out, format),
        Command::Change {
            logic,
            state,
            field,
            value,
            out,
            format,
        } => run_change(logic, state, &field, &value, out, format),
        Command::Submit {
            logic,
            state,
            out,
            format,
        } => run_submit(logic, state, out, format),
        Command::Preview { logic, state } => run_preview(logic, state),
        Command::Schema { kind } => run_schema(kind),
    }
}

fn init_tracing(debug: bool) {
    tracing_subscriber::registry()
        .with(tracing_filter(debug))
        .with(
            tracing_subscriber::fmt::layer()
                .without_time()
                .with_writer(std::io::stderr),
        )
        .init();
}

/// `--debug` always traces; otherwise `RUST_LOG` applies, defaulting to warnings.
fn tracing_filter(debug: bool) -> EnvFilter {
    if debug {
        return EnvFilter::new("trace");
    }
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
}

struct Inputs {
    form_id: String,
    config_json: String,
    state_json: String,
}

fn load_inputs(logic: Option<PathBuf>, state: &Path) -> CliResult<Inputs> {
    let logic_path = resolve_logic_path(logic)?;
    let logic_json = fs::read_to_string(&logic_path)
        .map_err(|err| format!("cannot read logic {}: {}", logic_path.display(), err))?;
    let state_json = fs::read_to_string(state)
        .map_err(|err| format!("cannot read state {}: {}", state.display(), err))?;
    let state_value: Value = serde_json::from_str(&state_json)?;
    let form_id = state_value
        .get("id")
        .and_then(Value::as_str)
        .ok_or("form state is missing an id")?
        .to_string();
    let config_json = json!({ "logic_json": logic_json }).to_string();
    Ok(Inputs {
        form_id,
        config_json,
        state_json,
    })
}

fn resolve_logic_path(logic: Option<PathBuf>) -> CliResult<PathBuf> {
    if let Some(path) = logic {
        return Ok(path);
    }
    env::var_os(LOGIC_ENV)
        .map(PathBuf::from)
        .ok_or_else(|| format!("pass --logic or set {}", LOGIC_ENV).into())
}

fn parse_component_result(response: &str) -> CliResult<Value> {
    let value: Value = serde_json::from_str(response)?;
    if let Some(error) = value.get("error").and_then(Value::as_str) {
        Err(error.into())
    } else {
        Ok(value)
    }
}

/// Accepts JSON (`"text"`, `["a","b"]`) and falls back to the raw text.
fn parse_value_argument(raw: &str) -> String {
    match serde_json::from_str::<Value>(raw) {
        Ok(value @ (Value::String(_) | Value::Array(_))) => value.to_string(),
        _ => Value::String(raw.to_string()).to_string(),
    }
}

fn run_evaluate(
    logic: Option<PathBuf>,
    state: PathBuf,
    out: Option<PathBuf>,
    format: OutputMode,
) -> CliResult<()> {
    let inputs = load_inputs(logic, &state)?;
    let response = parse_component_result(&initialize(
        &inputs.form_id,
        &inputs.config_json,
        &inputs.state_json,
    ))?;
    finish(&response, out.as_deref(), format)
}

fn run_change(
    logic: Option<PathBuf>,
    state: PathBuf,
    field: &str,
    value: &str,
    out: Option<PathBuf>,
    format: OutputMode,
) -> CliResult<()> {
    let inputs = load_inputs(logic, &state)?;
    let value_json = parse_value_argument(value);
    let response = parse_component_result(&field_changed(
        &inputs.form_id,
        &inputs.config_json,
        &inputs.state_json,
        field,
        &value_json,
    ))?;
    finish(&response, out.as_deref(), format)
}

fn run_submit(
    logic: Option<PathBuf>,
    state: PathBuf,
    out: Option<PathBuf>,
    format: OutputMode,
) -> CliResult<()> {
    let inputs = load_inputs(logic, &state)?;
    let response = parse_component_result(&submit(
        &inputs.form_id,
        &inputs.config_json,
        &inputs.state_json,
    ))?;
    if let Some(cleared) = response["outcome"]["cleared"].as_array()
        && matches!(format, OutputMode::Text)
    {
        println!("Cleared fields: {}", join_ids(cleared));
    }
    finish(&response, out.as_deref(), format)
}

fn run_preview(logic: Option<PathBuf>, state: PathBuf) -> CliResult<()> {
    let inputs = load_inputs(logic, &state)?;
    let response = parse_component_result(&preview(
        &inputs.form_id,
        &inputs.config_json,
        &inputs.state_json,
    ))?;
    let visibility = response["visibility"]
        .as_object()
        .ok_or("preview returned no visibility map")?;
    for (field_id, visible) in visibility {
        let label = if visible.as_bool() == Some(true) {
            "visible"
        } else {
            "hidden"
        };
        println!("Field {}: {}", field_id, label);
    }
    Ok(())
}

fn run_schema(kind: SchemaKind) -> CliResult<()> {
    let raw = match kind {
        SchemaKind::Logic => get_logic_schema(),
        SchemaKind::Form => get_form_schema(),
    };
    let schema = parse_component_result(&raw)?;
    println!("{}", serde_json::to_string_pretty(&schema)?);
    Ok(())
}

fn finish(response: &Value, out: Option<&Path>, format: OutputMode) -> CliResult<()> {
    if let Some(path) = out {
        fs::write(path, serde_json::to_string_pretty(&response["state"])?)?;
    }
    match format {
        OutputMode::Json => println!("{}", serde_json::to_string_pretty(response)?),
        OutputMode::Text => print_summary(response),
    }
    Ok(())
}

fn print_summary(response: &Value) {
    if let Some(passes) = response["outcome"]["passes"].as_u64() {
        println!("Passes: {}", passes);
    }
    if let Some(fields) = response["state"]["fields"].as_object() {
        for (field_id, field) in fields {
            let label = if field["hidden"].as_bool() == Some(true) {
                "hidden"
            } else {
                "visible"
            };
            println!("Field {}: {}", field_id, label);
        }
    }
}

fn join_ids(ids: &[Value]) -> String {
    if ids.is_empty() {
        return "none".to_string();
    }
    ids.iter()
        .filter_map(Value::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}
