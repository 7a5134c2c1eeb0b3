//! Structured (`fc`) decode path: the model's response is either a set of tool-call
//! objects or plain text, possibly carrying the native-FC marker as a degenerate case.

use serde::Deserialize;
use serde_json::Value;

use crate::core::decision::Decision;
use crate::llm::LlmResponse;

use super::{truncate_runes, DecodeError};

pub const NATIVE_MARKER_BEGIN: &str = "<|tool_calls_section_begin|>";
pub const NATIVE_MARKER_END: &str = "<|tool_call_end|>";

#[derive(Deserialize)]
struct NativeToolCall {
    name: String,
    #[serde(default)]
    parameters: Option<Value>,
    #[serde(default)]
    arguments: Option<Value>,
}

/// Decodes a [`LlmResponse`] from the structured tool-call path into a [`Decision`].
///
/// `tool_names` gates which tool names are acceptable — the model may hallucinate a name
/// outside the definitions it was offered.
pub fn decode_structured(
    response: &LlmResponse,
    tool_names: &[String],
) -> Result<Decision, DecodeError> {
    if !response.tool_calls.is_empty() {
        if response.tool_calls.len() > 1 {
            tracing::warn!(
                count = response.tool_calls.len(),
                "model returned multiple tool calls; using only the first (§9 open question)"
            );
        }
        let call = &response.tool_calls[0];
        if !tool_names.iter().any(|n| n == &call.name) {
            return Err(DecodeError::UnknownTool(call.name.clone()));
        }
        let params = call
            .arguments
            .as_object()
            .ok_or_else(|| {
                DecodeError::InvalidArguments(format!(
                    "arguments for {} were not a JSON object",
                    call.name
                ))
            })?
            .clone()
            .into_iter()
            .collect();

        let reason = if response.content.is_empty() {
            format!("FC: call {}", call.name)
        } else {
            truncate_runes(&response.content, 200)
        };

        let mut decision = Decision::tool(call.name.clone(), params, reason);
        decision.tool_call_id = call.id.clone();
        return Ok(decision);
    }

    if !response.content.is_empty() {
        if let Some(idx) = response.content.find(NATIVE_MARKER_BEGIN) {
            return decode_native_marker(&response.content, idx);
        }
        return Ok(Decision::answer(response.content.clone(), ""));
    }

    Err(DecodeError::Empty)
}

/// Exposed for the serialized decode path's degenerate-case handling (§4.2).
pub(crate) fn decode_native_marker_pub(
    content: &str,
    marker_idx: usize,
) -> Result<Decision, DecodeError> {
    decode_native_marker(content, marker_idx)
}

fn decode_native_marker(content: &str, marker_idx: usize) -> Result<Decision, DecodeError> {
    let after_marker = &content[marker_idx + NATIVE_MARKER_BEGIN.len()..];
    let end_idx = after_marker
        .find(NATIVE_MARKER_END)
        .ok_or(DecodeError::UnparseableNativeMarker)?;
    let embedded = &after_marker[..end_idx];

    let calls: Vec<NativeToolCall> =
        serde_json::from_str(embedded).map_err(|_| DecodeError::UnparseableNativeMarker)?;
    let call = calls.first().ok_or(DecodeError::UnparseableNativeMarker)?;

    let args = call
        .parameters
        .clone()
        .or_else(|| call.arguments.clone())
        .unwrap_or_else(|| Value::Object(Default::default()));
    let params = args
        .as_object()
        .cloned()
        .ok_or(DecodeError::UnparseableNativeMarker)?
        .into_iter()
        .collect();

    let reason = truncate_runes(content[..marker_idx].trim(), 200);
    Ok(Decision::tool(call.name.clone(), params, reason))
}
