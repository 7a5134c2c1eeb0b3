//! Shared dedup-key extraction used by both the loop detector (§4.7) and the step
//! summariser's duplicate-detection pass (§4.6) — they must agree on what counts as
//! "the same call".

/// Tools keyed on their `path` argument for dedup purposes.
const PATH_KEYED_TOOLS: &[&str] = &["file_read", "file_list", "file_patch", "file_write", "file_delete", "file_move"];

/// `(tool, dedup-param)` for a tool step's raw JSON input string.
///
/// For tools in the key-param table, extracts the named parameter from the JSON input;
/// for everything else, falls back to `(tool, raw_input)`.
pub fn dedup_key(tool_name: &str, input_json: &str) -> (String, String) {
    let parsed: Option<serde_json::Value> = serde_json::from_str(input_json).ok();

    let param = if PATH_KEYED_TOOLS.contains(&tool_name) {
        parsed.as_ref().and_then(|v| v.get("path")).and_then(|v| v.as_str()).map(str::to_string)
    } else if tool_name == "shell_exec" {
        parsed.as_ref().and_then(|v| v.get("command")).and_then(|v| v.as_str()).map(str::to_string)
    } else if tool_name == "config_edit" {
        parsed.as_ref().and_then(|v| v.get("key")).and_then(|v| v.as_str()).map(str::to_string)
    } else {
        None
    };

    match param {
        Some(p) => (tool_name.to_string(), p),
        None => (tool_name.to_string(), input_json.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_keyed_tool_extracts_path_param() {
        let (tool, key) = dedup_key("file_read", r#"{"path":"a.go"}"#);
        assert_eq!(tool, "file_read");
        assert_eq!(key, "a.go");
    }

    #[test]
    fn shell_exec_keys_on_command() {
        let (_, key) = dedup_key("shell_exec", r#"{"command":"ls -la"}"#);
        assert_eq!(key, "ls -la");
    }

    #[test]
    fn config_edit_keys_on_key_field() {
        let (_, key) = dedup_key("config_edit", r#"{"key":"timeout","value":"30"}"#);
        assert_eq!(key, "timeout");
    }

    #[test]
    fn unlisted_tool_falls_back_to_raw_input() {
        let (_, key) = dedup_key("mcp_server_list", "{}");
        assert_eq!(key, "{}");
    }
}
