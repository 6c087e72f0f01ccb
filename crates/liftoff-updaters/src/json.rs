//! JSON helpers that keep the file's indentation

use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use serde_json::Value;

use liftoff_core::{Result, UpdaterError};

/// Parse JSON content, reporting errors against `file`
pub(crate) fn parse(file: &str, content: &str) -> Result<Value> {
    serde_json::from_str(content).map_err(|e| {
        UpdaterError::Parse {
            file: file.to_string(),
            message: e.to_string(),
        }
        .into()
    })
}

/// Indentation of the first indented line, two spaces when there is none
pub(crate) fn detect_indent(content: &str) -> String {
    content
        .lines()
        .skip(1)
        .map(|line| {
            let trimmed = line.trim_start_matches([' ', '\t']);
            &line[..line.len() - trimmed.len()]
        })
        .find(|indent| !indent.is_empty())
        .unwrap_or("  ")
        .to_string()
}

/// Serialize `value` pretty-printed with `indent`, with a trailing newline
pub(crate) fn to_string(value: &Value, indent: &str) -> Result<String> {
    let mut buffer = Vec::new();
    let formatter = PrettyFormatter::with_indent(indent.as_bytes());
    let mut serializer = serde_json::Serializer::with_formatter(&mut buffer, formatter);
    value.serialize(&mut serializer)?;

    let mut output =
        String::from_utf8(buffer).map_err(|e| liftoff_core::LiftoffError::other(e.to_string()))?;
    output.push('\n');
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_indent() {
        assert_eq!(detect_indent("{\n    \"a\": 1\n}"), "    ");
        assert_eq!(detect_indent("{\n\t\"a\": 1\n}"), "\t");
        assert_eq!(detect_indent("{\"a\": 1}"), "  ");
    }

    #[test]
    fn test_round_trip_keeps_key_order() {
        let content = "{\n    \"name\": \"x\",\n    \"version\": \"1.0.0\",\n    \"a\": true\n}\n";
        let value = parse("x.json", content).unwrap();
        assert_eq!(to_string(&value, &detect_indent(content)).unwrap(), content);
    }
}
