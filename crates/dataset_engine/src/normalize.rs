use dataset_core::SourceFormat;
use serde_json::{Map, Value};

use crate::Record;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum NormalizeError {
    #[error("malformed JSON: {0}")]
    Json(String),
    #[error("expected a JSON array, found {0}")]
    NotAnArray(&'static str),
    #[error("line {line}: {message}")]
    Line { line: usize, message: String },
}

/// Parse decoded text into records in source order. Any bad line or element
/// fails the whole call.
pub fn normalize(text: &str, format: SourceFormat) -> Result<Vec<Record>, NormalizeError> {
    match format {
        SourceFormat::JsonArray => normalize_array(text),
        SourceFormat::Ndjson => normalize_lines(text, parse_json_line),
        SourceFormat::DelimitedLinesAsJson => normalize_lines(text, parse_delimited_line),
    }
}

fn normalize_array(text: &str) -> Result<Vec<Record>, NormalizeError> {
    let value: Value =
        serde_json::from_str(text).map_err(|err| NormalizeError::Json(err.to_string()))?;
    match value {
        Value::Array(items) => Ok(items),
        other => Err(NormalizeError::NotAnArray(kind_name(&other))),
    }
}

fn normalize_lines(
    text: &str,
    parse: fn(&str) -> Result<Record, String>,
) -> Result<Vec<Record>, NormalizeError> {
    text.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(idx, line)| {
            parse(line.trim()).map_err(|message| NormalizeError::Line {
                line: idx + 1,
                message,
            })
        })
        .collect()
}

fn parse_json_line(line: &str) -> Result<Record, String> {
    serde_json::from_str(line).map_err(|err| err.to_string())
}

/// A JSON object line, or `<name> tokens ... </name>` sections.
fn parse_delimited_line(line: &str) -> Result<Record, String> {
    if line.starts_with('{') {
        return parse_json_line(line);
    }

    let mut record = Map::new();
    let mut tokens = line.split_whitespace();
    while let Some(token) = tokens.next() {
        let name = open_tag(token).ok_or_else(|| format!("unexpected token {token:?}"))?;
        let close = format!("</{name}>");
        let mut content = Vec::new();
        let mut closed = false;
        for inner in tokens.by_ref() {
            if inner == close {
                closed = true;
                break;
            }
            content.push(inner);
        }
        if !closed {
            return Err(format!("section <{name}> is not closed"));
        }
        if record.contains_key(name) {
            return Err(format!("section <{name}> appears twice"));
        }
        record.insert(name.to_string(), Value::String(content.join(" ")));
    }
    Ok(Value::Object(record))
}

fn open_tag(token: &str) -> Option<&str> {
    let name = token.strip_prefix('<')?.strip_suffix('>')?;
    if name.is_empty() || name.starts_with('/') {
        return None;
    }
    Some(name)
}

fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
