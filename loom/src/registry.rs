//! Tool registry, with a per-request overlay that can add tools without mutating the
//! process-wide base registry.

use std::collections::HashMap;
use std::sync::Arc;

use crate::tool::Tool;

/// An immutable, named set of tools.
#[derive(Default, Clone)]
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
    /// Insertion order, preserved for deterministic prompt-summary ordering.
    order: Vec<String>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, tool: Arc<dyn Tool>) -> &mut Self {
        let name = tool.name().to_string();
        if !self.tools.contains_key(&name) {
            self.order.push(name.clone());
        }
        self.tools.insert(name, tool);
        self
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    pub fn names(&self) -> &[String] {
        &self.order
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn Tool>> {
        self.order.iter().filter_map(|n| self.tools.get(n))
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Returns a request-scoped overlay that adds `extra` tools on top of this registry,
    /// without mutating it. Lookup checks the overlay first so request-scoped tools can
    /// shadow base ones.
    pub fn with_extra(&self, extra: Vec<Arc<dyn Tool>>) -> ToolRegistryLocked {
        let mut overlay = self.clone();
        for tool in extra {
            overlay.register(tool);
        }
        ToolRegistryLocked { inner: overlay }
    }

    /// Returns a registry containing only tools whose name is not in `excluded` — used to
    /// physically remove meta-tools from a projection when `SuppressMetaTools` is set.
    pub fn without(&self, excluded: &[&str]) -> ToolRegistry {
        let mut reg = ToolRegistry::new();
        for name in &self.order {
            if excluded.contains(&name.as_str()) {
                continue;
            }
            if let Some(t) = self.tools.get(name) {
                reg.register(t.clone());
            }
        }
        reg
    }
}

/// A finalized, request-scoped view of a [`ToolRegistry`]. Kept as a distinct type so
/// callers can tell "the registry the agent will resolve tools through this request"
/// apart from the mutable base registry being built up at process start.
#[derive(Clone)]
pub struct ToolRegistryLocked {
    inner: ToolRegistry,
}

impl ToolRegistryLocked {
    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.inner.get(name)
    }

    pub fn without(&self, excluded: &[&str]) -> ToolRegistry {
        self.inner.without(excluded)
    }

    pub fn as_registry(&self) -> &ToolRegistry {
        &self.inner
    }
}

impl From<ToolRegistry> for ToolRegistryLocked {
    fn from(inner: ToolRegistry) -> Self {
        ToolRegistryLocked { inner }
    }
}
