//! Output formatting: plain values or JSON.

use serde::Serialize;
use serde_json::Value;

use dfp_core::EntityState;

use crate::cli::OutputFormat;
use crate::error::CliError;

/// Render a single attribute value.
pub fn render_value(format: OutputFormat, value: &Value) -> Result<String, CliError> {
    match format {
        OutputFormat::Plain => Ok(plain(value)),
        OutputFormat::Json => render_json(value, false),
        OutputFormat::JsonCompact => render_json(value, true),
    }
}

/// Render one line (plain) or one document (JSON) per entity.
pub fn render_states(format: OutputFormat, states: &[EntityState]) -> Result<String, CliError> {
    match format {
        OutputFormat::Plain => Ok(states.iter().map(state_line).collect::<Vec<_>>().join("\n")),
        OutputFormat::Json => render_json(states, false),
        OutputFormat::JsonCompact => render_json(states, true),
    }
}

fn render_json<T: Serialize + ?Sized>(data: &T, compact: bool) -> Result<String, CliError> {
    let out = if compact {
        serde_json::to_string(data)?
    } else {
        serde_json::to_string_pretty(data)?
    };
    Ok(out)
}

/// Strings print bare; everything else prints as JSON.
fn plain(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn state_line(state: &EntityState) -> String {
    let value = state.value.as_ref().map_or_else(|| "-".to_owned(), plain);
    let unit = state.unit.as_deref().map(|u| format!(" {u}")).unwrap_or_default();
    let flag = if state.available { "" } else { " (unavailable)" };
    format!("{}: {value}{unit}{flag}", state.name)
}
