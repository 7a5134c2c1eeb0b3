use async_trait::async_trait;
use dashmap::DashMap;

/// Capacity per session. Past this, the oldest auto-generated entry is evicted first;
/// when all remaining entries are manual, the oldest overall is evicted instead.
pub const WALKTHROUGH_CAPACITY: usize = 20;

#[derive(Clone, Debug)]
pub struct WalkthroughEntry {
    pub content: String,
    /// True for entries auto-generated by the tool node after a non-meta tool call;
    /// false for entries the `walkthrough` tool wrote directly.
    pub auto: bool,
}

/// A running, FIFO-bounded narrative of what a session's agent has done, rendered into
/// the prompt so the model does not repeat earlier work.
#[async_trait]
pub trait WalkthroughStore: Send + Sync {
    async fn append(&self, session_id: &str, entry: WalkthroughEntry);

    async fn render(&self, session_id: &str) -> String;

    async fn delete(&self, session_id: &str);
}

#[derive(Default)]
pub struct InMemoryWalkthroughStore {
    entries: DashMap<String, Vec<WalkthroughEntry>>,
}

impl InMemoryWalkthroughStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl WalkthroughStore for InMemoryWalkthroughStore {
    async fn append(&self, session_id: &str, entry: WalkthroughEntry) {
        let mut entries = self.entries.entry(session_id.to_string()).or_default();
        entries.push(entry);
        if entries.len() > WALKTHROUGH_CAPACITY {
            let evict_at = entries
                .iter()
                .position(|e| e.auto)
                .unwrap_or(0);
            entries.remove(evict_at);
        }
    }

    async fn render(&self, session_id: &str) -> String {
        match self.entries.get(session_id) {
            Some(entries) => entries.iter().map(|e| format!("- {}", e.content)).collect::<Vec<_>>().join("\n"),
            None => String::new(),
        }
    }

    async fn delete(&self, session_id: &str) {
        self.entries.remove(session_id);
    }
}
