use serde::Deserialize;
use thiserror::Error;

use crate::models::GeneratedConnection;

/// Field the model emits last in every connection object; truncation repair anchors on it
pub const TRAILING_FIELD: &str = "\"relevanceScore\"";

/// Closing tokens appended after the last complete connection
const CLOSE_ELEMENT: &str = "\n    }\n  ]\n}";

/// Closing tokens appended when no complete connection can be located
const CLOSE_ARRAY: &str = "\n  ]\n}";

/// Errors from extracting JSON out of model output
#[derive(Debug, Error)]
pub enum RepairError {
    #[error("No JSON object found in response")]
    NoJsonObject,

    #[error("Malformed JSON after repair: {source}")]
    Malformed {
        #[source]
        source: serde_json::Error,
        snippet: String,
    },
}

impl RepairError {
    /// Tail of the repaired text, for diagnostics
    pub fn snippet(&self) -> Option<&str> {
        match self {
            RepairError::NoJsonObject => None,
            RepairError::Malformed { snippet, .. } => Some(snippet),
        }
    }
}

/// Scanner state while looking for the end of the first object
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanState {
    SeekOpenBrace,
    InObject { depth: usize },
    InString { depth: usize, escaped: bool },
}

/// Where the first top-level object starts and, if closed, ends
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ObjectSpan {
    start: usize,
    end: Option<usize>,
}

fn scan_object(text: &str) -> Option<ObjectSpan> {
    let mut state = ScanState::SeekOpenBrace;
    let mut start = None;

    for (i, ch) in text.char_indices() {
        state = match (state, ch) {
            (ScanState::SeekOpenBrace, '{') => {
                start = Some(i);
                ScanState::InObject { depth: 1 }
            }
            (ScanState::SeekOpenBrace, _) => ScanState::SeekOpenBrace,
            (ScanState::InObject { depth }, '{') => ScanState::InObject { depth: depth + 1 },
            (ScanState::InObject { depth }, '}') => {
                if depth == 1 {
                    return start.map(|s| ObjectSpan { start: s, end: Some(i) });
                }
                ScanState::InObject { depth: depth - 1 }
            }
            (ScanState::InObject { depth }, '"') => ScanState::InString { depth, escaped: false },
            (ScanState::InObject { depth }, _) => ScanState::InObject { depth },
            (ScanState::InString { depth, escaped: true }, _) => {
                ScanState::InString { depth, escaped: false }
            }
            (ScanState::InString { depth, escaped: false }, '\\') => {
                ScanState::InString { depth, escaped: true }
            }
            (ScanState::InString { depth, escaped: false }, '"') => ScanState::InObject { depth },
            (ScanState::InString { depth, escaped: false }, _) => {
                ScanState::InString { depth, escaped: false }
            }
        };
    }

    start.map(|s| ObjectSpan { start: s, end: None })
}

/// Remove markdown code fences (```json and ```) together with the whitespace after them
fn strip_code_fences(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(pos) = rest.find("```") {
        out.push_str(&rest[..pos]);
        rest = &rest[pos + 3..];
        rest = rest.strip_prefix("json").unwrap_or(rest);
        rest = rest.trim_start();
    }
    out.push_str(rest);
    out
}

/// Byte offset just past the numeric value of the last trailing field, if any
fn end_of_last_trailing_field(text: &str) -> Option<usize> {
    let anchor = text.rfind(TRAILING_FIELD)?;
    let after_key = anchor + TRAILING_FIELD.len();
    let rest = &text[after_key..];

    let after_ws = rest.trim_start();
    let colon_at = after_key + (rest.len() - after_ws.len());
    let value = after_ws.strip_prefix(':')?;
    let value_trimmed = value.trim_start();
    let value_start = colon_at + 1 + (value.len() - value_trimmed.len());

    let digits = value_trimmed
        .char_indices()
        .take_while(|(i, c)| c.is_ascii_digit() || (*c == '.' && *i > 0))
        .count();
    if digits == 0 || !value_trimmed.starts_with(|c: char| c.is_ascii_digit()) {
        return None;
    }

    Some(value_start + digits)
}

/// Turn raw model output into a string expected to be a single JSON object.
///
/// Handles markdown fences, prose around the object, and output truncated
/// after a complete connection. Other damage is left for the parser to reject.
pub fn repair_json(raw: &str) -> Result<String, RepairError> {
    let cleaned = strip_code_fences(raw);
    let text = cleaned.trim();

    let span = scan_object(text).ok_or(RepairError::NoJsonObject)?;

    if let Some(end) = span.end {
        return Ok(text[span.start..=end].to_string());
    }

    tracing::debug!("JSON object is not closed, attempting truncation repair");

    match end_of_last_trailing_field(&text[span.start..]) {
        Some(cut) => Ok(format!("{}{}", &text[span.start..span.start + cut], CLOSE_ELEMENT)),
        None => Ok(format!("{}{}", &text[span.start..], CLOSE_ARRAY)),
    }
}

#[derive(Debug, Deserialize)]
struct ConnectionsEnvelope {
    #[serde(default)]
    connections: Option<Vec<GeneratedConnection>>,
}

/// Repair and parse model output into a connection list.
///
/// `Ok(None)` means the object parsed but carried no `connections` array.
pub fn parse_connections(raw: &str) -> Result<Option<Vec<GeneratedConnection>>, RepairError> {
    let repaired = repair_json(raw)?;

    let envelope: ConnectionsEnvelope = serde_json::from_str(&repaired).map_err(|source| {
        let tail_start = repaired
            .char_indices()
            .rev()
            .nth(299)
            .map(|(i, _)| i)
            .unwrap_or(0);
        RepairError::Malformed {
            source,
            snippet: repaired[tail_start..].to_string(),
        }
    })?;

    Ok(envelope.connections)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_well_formed_is_unchanged() {
        let input = r#"{"connections": [{"name": "A", "relevanceScore": 80}]}"#;
        assert_eq!(repair_json(input).unwrap(), input);
    }

    #[test]
    fn test_strips_fences_and_prose() {
        let input = "Here you go:\n```json\n{\"connections\": []}\n```\nEnjoy!";
        assert_eq!(repair_json(input).unwrap(), "{\"connections\": []}");
    }

    #[test]
    fn test_braces_inside_strings_are_ignored() {
        let input = r#"{"connections": [{"name": "curly } brace \" {", "relevanceScore": 1}]} trailing"#;
        let repaired = repair_json(input).unwrap();
        assert!(repaired.ends_with("]}"));
        assert!(serde_json::from_str::<serde_json::Value>(&repaired).is_ok());
    }

    #[test]
    fn test_no_object() {
        assert!(matches!(repair_json("no json here"), Err(RepairError::NoJsonObject)));
        assert!(matches!(repair_json(""), Err(RepairError::NoJsonObject)));
    }

    #[test]
    fn test_truncated_after_trailing_field() {
        let input = r#"{"connections": [
    {"name": "A", "relevanceScore": 90},
    {"name": "B", "relevanceScore": 75},
    {"name": "C", "title": "Eng"#;
        let parsed = parse_connections(input).unwrap().unwrap();
        let names: Vec<_> = parsed.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["A", "B"]);
    }

    #[test]
    fn test_truncated_without_anchor() {
        let repaired = repair_json(r#"{"connections": ["#).unwrap();
        assert_eq!(repaired, "{\"connections\": [\n  ]\n}");
        assert!(parse_connections(r#"{"connections": ["#).unwrap().unwrap().is_empty());
    }

    #[test]
    fn test_anchor_without_number_falls_back() {
        let repaired = repair_json(r#"{"connections": [{"relevanceScore": "#).unwrap();
        assert!(repaired.ends_with(CLOSE_ARRAY));
    }

    #[test]
    fn test_unrecoverable_shape_is_malformed() {
        let err = parse_connections(r#"{"connections": [{"name": "A", "title"#).unwrap_err();
        assert!(matches!(err, RepairError::Malformed { .. }));
        assert!(err.snippet().is_some());
    }

    #[test]
    fn test_missing_connections_key() {
        assert!(parse_connections(r#"{"people": []}"#).unwrap().is_none());
    }

    #[test]
    fn test_scan_state_machine() {
        assert_eq!(scan_object("x{}"), Some(ObjectSpan { start: 1, end: Some(2) }));
        assert_eq!(scan_object("{{}"), Some(ObjectSpan { start: 0, end: None }));
        assert_eq!(scan_object("none"), None);
    }
}
