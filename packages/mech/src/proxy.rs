//! # Forwarding Proxy
//!
//! A [`NodeProxy`] wraps one node of a mirror snapshot. Reads run against
//! the snapshot. The mutators `set` and `invoke` (`$`) are forwarded to
//! the remote tree at the node's path, and resolve only once the remote
//! effect is complete and the tab's mirror has been refreshed.
//!
//! Traversal keeps results proxied: `at` on a proxy hands back proxies
//! for container nodes, so chained lookups stay bound to the same tab.

use crate::errors::{MechResult, RemoteError};
use crate::remote::{self, RemoteCall};
use crate::tab::Tab;
use hypermap::{Attributes, Document, Key, NodeId, Outcome, Path, Scalar, TreeError, Value};
use std::fmt;
use std::sync::Arc;

#[derive(Clone)]
pub struct NodeProxy {
    tab: Arc<Tab>,
    snapshot: Arc<Document>,
    node: NodeId,
}

/// Result of a proxied lookup
#[derive(Debug, Clone)]
pub enum Proxied {
    Node(NodeProxy),
    Scalar(Scalar),
}

impl Proxied {
    pub fn as_node(&self) -> Option<&NodeProxy> {
        match self {
            Proxied::Node(node) => Some(node),
            Proxied::Scalar(_) => None,
        }
    }

    pub fn into_node(self) -> Option<NodeProxy> {
        match self {
            Proxied::Node(node) => Some(node),
            Proxied::Scalar(_) => None,
        }
    }

    pub fn as_scalar(&self) -> Option<&Scalar> {
        match self {
            Proxied::Scalar(scalar) => Some(scalar),
            Proxied::Node(_) => None,
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Proxied::Node(node) => node.to_json(),
            Proxied::Scalar(scalar) => scalar.to_json(),
        }
    }
}

impl NodeProxy {
    pub(crate) fn new(tab: Arc<Tab>, snapshot: Arc<Document>, node: NodeId) -> Self {
        Self { tab, snapshot, node }
    }

    pub fn id(&self) -> NodeId {
        self.node
    }

    pub fn tab(&self) -> &Arc<Tab> {
        &self.tab
    }

    /// The mirror snapshot this proxy reads from
    pub fn document(&self) -> &Document {
        &self.snapshot
    }

    /// True once the tab has synced past this proxy's snapshot
    pub fn is_stale(&self) -> bool {
        self.tab
            .mirror()
            .map_or(true, |mirror| !Arc::ptr_eq(&mirror, &self.snapshot))
    }

    fn wrap(&self, value: Value) -> Proxied {
        match value {
            Value::Node(node) => Proxied::Node(NodeProxy::new(self.tab.clone(), self.snapshot.clone(), node)),
            Value::Scalar(scalar) => Proxied::Scalar(scalar),
        }
    }

    pub fn at(&self, path: &Path) -> Option<Proxied> {
        self.snapshot.at(self.node, path).map(|value| self.wrap(value))
    }

    pub fn at_str(&self, path: &str) -> Option<Proxied> {
        self.snapshot.at_str(self.node, path).map(|value| self.wrap(value))
    }

    pub fn get(&self, key: impl Into<Key>) -> Option<Proxied> {
        let key = key.into();
        self.snapshot.get(self.node, &key).cloned().map(|value| self.wrap(value))
    }

    pub fn path(&self) -> Path {
        self.snapshot.path(self.node)
    }

    pub fn len(&self) -> usize {
        self.snapshot.len(self.node)
    }

    pub fn is_empty(&self) -> bool {
        self.snapshot.is_empty(self.node)
    }

    pub fn has(&self, key: impl Into<Key>) -> bool {
        self.snapshot.has(self.node, key)
    }

    pub fn keys(&self) -> Vec<Key> {
        self.snapshot.keys(self.node)
    }

    pub fn attributes(&self) -> Attributes {
        self.snapshot.attributes(self.node).cloned().unwrap_or_default()
    }

    pub fn children(&self) -> Vec<NodeProxy> {
        self.snapshot
            .children(self.node)
            .into_iter()
            .map(|child| NodeProxy::new(self.tab.clone(), self.snapshot.clone(), child))
            .collect()
    }

    pub fn owner(&self) -> Option<NodeProxy> {
        self.snapshot
            .owner(self.node)
            .map(|owner| NodeProxy::new(self.tab.clone(), self.snapshot.clone(), owner))
    }

    pub fn to_json(&self) -> serde_json::Value {
        self.snapshot.to_json(self.node)
    }

    pub fn outline(&self, color: bool) -> String {
        self.snapshot.outline(self.node, color)
    }

    /// Set `key` on the remote node, then resync
    pub async fn set(&self, key: impl Into<Key>, value: serde_json::Value) -> MechResult<()> {
        let call = RemoteCall::Set {
            path: self.path(),
            key: key.into(),
            value,
        };
        self.tab.host().evaluate(call).await?;
        self.tab.sync_data().await?;
        Ok(())
    }

    /// `$`: use the child at `key` on the remote tree, optionally writing
    /// `values` into it first.
    ///
    /// Waits for the resulting navigation when the action navigates, then
    /// resyncs. Returns the proxy at this node's path in the new mirror,
    /// if the path still resolves.
    pub async fn invoke(
        &self,
        key: impl Into<Key>,
        values: Option<serde_json::Map<String, serde_json::Value>>,
    ) -> MechResult<Option<NodeProxy>> {
        let key = key.into();
        let path = self.path();
        let child = self
            .snapshot
            .get(self.node, &key)
            .and_then(Value::as_node)
            .ok_or_else(|| TreeError::NotAddressable(path.child(key.clone())))?;

        // Subscribe before the call so the settle signal cannot be missed
        let transclusion = self
            .snapshot
            .attributes(child)
            .map_or(false, Attributes::is_transclusion);
        let mut navigation = (!transclusion).then(|| self.tab.host().navigation_settled());

        tracing::debug!("Invoking {} on {}", key, path);
        let response = self
            .tab
            .host()
            .evaluate(RemoteCall::Invoke {
                path: path.clone(),
                key,
                values,
            })
            .await?;
        let outcome: Outcome =
            serde_json::from_value(response).map_err(|e| RemoteError::Protocol(e.to_string()))?;

        if let (Outcome::Navigate { .. }, Some(navigation)) = (&outcome, navigation.as_mut()) {
            let url = remote::settled(navigation).await?;
            self.tab.set_location(url);
        }

        let mirror = self.tab.sync_data().await?;
        Ok(self.tab.proxy_at(mirror, &path))
    }
}

impl fmt::Debug for NodeProxy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeProxy")
            .field("path", &self.path())
            .field("node", &self.node)
            .finish()
    }
}
