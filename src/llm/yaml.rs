//! YAML object parsing for structured LLM responses.

use serde::de::DeserializeOwned;

use crate::llm::LlmError;

/// Parse a YAML object out of an LLM response.
///
/// Models tend to wrap YAML in markdown fences despite instructions, so the
/// payload is cleansed of ``` fences before parsing.
pub fn parse_yaml_block<T: DeserializeOwned>(raw: &str) -> Result<T, LlmError> {
    let cleaned = strip_code_fences(raw);
    serde_yaml::from_str(cleaned).map_err(|e| LlmError::MalformedResponse(e.to_string()))
}

fn strip_code_fences(raw: &str) -> &str {
    if !raw.contains("```") {
        return raw;
    }
    let after_open = match raw.split_once("```") {
        Some((_, rest)) => rest,
        None => raw,
    };
    // Drop a language tag on the fence line, then anything past the close.
    let body = after_open.strip_prefix("yaml").unwrap_or(after_open);
    match body.split_once("```") {
        Some((inner, _)) => inner,
        None => body,
    }
}
