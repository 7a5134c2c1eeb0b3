//! Per-request read-result cache, keyed on tool+args (§3 `ReadCacheEntry`).
//!
//! Created fresh per request (§3 invariant 6: never returns results from a prior
//! request) — this implementation is a plain `HashMap` behind a `Mutex` since
//! `AgentState` is single-owner per §5, not a cross-request `DashMap`.

use std::collections::HashMap;
use std::sync::Mutex;

use serde_json::Value;

/// Tools whose successful output the tool node may cache and later serve as a duplicate
/// warning (§3).
pub const CACHEABLE_TOOLS: &[&str] = &["file_read", "file_list"];

/// Write tools that invalidate the `file_read:<path>` cache entry of their target path.
pub const WRITE_TOOLS: &[&str] = &["file_write", "file_patch", "file_delete", "file_move"];

#[derive(Clone, Debug)]
pub struct ReadCacheEntry {
    pub step_number: u32,
    pub output: String,
}

/// Builds the cache key for `file_read` — also used directly by write-tool invalidation.
pub fn file_read_cache_key(path: &str) -> String {
    format!("file_read:{path}")
}

/// Builds the cache key for any other cacheable tool, fingerprinted on the tool name and
/// an md5 of its (already-serialized) JSON arguments.
pub fn tool_cache_key(tool_name: &str, args_json: &str) -> String {
    let digest = md5::compute(args_json.as_bytes());
    format!("tool:{tool_name}:{digest:x}")
}

/// Computes the cache key for a tool call, or `None` if the tool is not cacheable.
pub fn cache_key_for(tool_name: &str, args: &Value) -> Option<String> {
    if !CACHEABLE_TOOLS.contains(&tool_name) {
        return None;
    }
    if tool_name == "file_read" {
        let path = args.get("path").and_then(|v| v.as_str()).unwrap_or("");
        return Some(file_read_cache_key(path));
    }
    Some(tool_cache_key(tool_name, &args.to_string()))
}

#[derive(Default)]
pub struct ReadCache {
    entries: Mutex<HashMap<String, ReadCacheEntry>>,
}

impl ReadCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&self, key: String, entry: ReadCacheEntry) {
        self.entries.lock().expect("read cache mutex poisoned").insert(key, entry);
    }

    pub fn get(&self, key: &str) -> Option<ReadCacheEntry> {
        self.entries.lock().expect("read cache mutex poisoned").get(key).cloned()
    }

    pub fn invalidate(&self, key: &str) {
        self.entries.lock().expect("read cache mutex poisoned").remove(key);
    }

    /// Invalidates the `file_read:<path>` key for a write tool's affected path (§3, §4.3).
    pub fn invalidate_file_read(&self, path: &str) {
        self.invalidate(&file_read_cache_key(path));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_read_cache_key_matches_spec_format() {
        assert_eq!(file_read_cache_key("a/b.rs"), "file_read:a/b.rs");
    }

    #[test]
    fn round_trip_put_get_then_invalidate_misses() {
        let cache = ReadCache::new();
        let key = file_read_cache_key("a.txt");
        cache.put(key.clone(), ReadCacheEntry { step_number: 1, output: "hi".into() });
        assert!(cache.get(&key).is_some());
        cache.invalidate(&key);
        assert!(cache.get(&key).is_none());
    }

    #[test]
    fn non_cacheable_tool_has_no_cache_key() {
        assert!(cache_key_for("shell_exec", &serde_json::json!({"command": "ls"})).is_none());
    }

    #[test]
    fn cacheable_non_file_read_tool_keys_on_tool_and_args_digest() {
        let key = cache_key_for("file_list", &serde_json::json!({"path": "."})).unwrap();
        assert!(key.starts_with("tool:file_list:"));
    }
}
