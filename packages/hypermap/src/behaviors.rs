//! # Behaviors
//!
//! A node's `script` attribute names a behavior to attach during
//! hydration. Behaviors are ordinary Rust values registered up front
//! under the identifier documents use for them; nothing is loaded at
//! runtime.
//!
//! ```rust,ignore
//! let mut registry = BehaviorRegistry::new();
//! registry.register("/assets/counter.js", |doc, node| {
//!     doc.set(node, "count", 0)?;
//!     Ok(())
//! });
//! ```

use crate::errors::ScriptLoadError;
use crate::{Document, NodeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

pub trait Behavior: Send + Sync {
    /// Attach to `node`: mutate it, register listeners, etc.
    fn attach(&self, doc: &mut Document, node: NodeId) -> anyhow::Result<()>;
}

impl<F> Behavior for F
where
    F: Fn(&mut Document, NodeId) -> anyhow::Result<()> + Send + Sync,
{
    fn attach(&self, doc: &mut Document, node: NodeId) -> anyhow::Result<()> {
        self(doc, node)
    }
}

#[derive(Default, Clone)]
pub struct BehaviorRegistry {
    behaviors: HashMap<String, Arc<dyn Behavior>>,
}

impl BehaviorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<F>(&mut self, script: impl Into<String>, behavior: F) -> &mut Self
    where
        F: Fn(&mut Document, NodeId) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.register_behavior(script, Arc::new(behavior))
    }

    pub fn register_behavior(&mut self, script: impl Into<String>, behavior: Arc<dyn Behavior>) -> &mut Self {
        self.behaviors.insert(script.into(), behavior);
        self
    }

    pub fn contains(&self, script: &str) -> bool {
        self.behaviors.contains_key(script)
    }

    /// Look up `script` and attach it to `node`
    pub fn attach(&self, script: &str, doc: &mut Document, node: NodeId) -> Result<(), ScriptLoadError> {
        let behavior = self
            .behaviors
            .get(script)
            .cloned()
            .ok_or_else(|| ScriptLoadError::NotRegistered(script.to_string()))?;

        behavior.attach(doc, node).map_err(|e| ScriptLoadError::Failed {
            script: script.to_string(),
            message: e.to_string(),
        })
    }
}

impl fmt::Debug for BehaviorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut scripts: Vec<&String> = self.behaviors.keys().collect();
        scripts.sort();
        f.debug_struct("BehaviorRegistry").field("scripts", &scripts).finish()
    }
}
