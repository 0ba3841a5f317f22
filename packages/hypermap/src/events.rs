//! # Change Events
//!
//! Every mutation produces one [`ChangeEvent`] at the mutated node. It is
//! delivered to that node's listeners, then to the listeners of each
//! ancestor in turn, up to the root.
//!
//! Listeners get `&mut Document`, so a behavior can react to a change by
//! mutating the tree further. Those nested mutations dispatch their own
//! events before the outer dispatch continues.

use crate::{Document, Key, NodeId, Value};
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq)]
pub struct ChangeEvent {
    /// Node whose container was edited
    pub target: NodeId,

    /// Node whose listeners are currently being called
    pub current_target: NodeId,

    pub key: Key,

    /// New value at `key`; `None` when the entry was deleted
    pub value: Option<Value>,
}

pub type Listener = Arc<dyn Fn(&mut Document, &ChangeEvent) + Send + Sync>;

/// Invoked after any successful mutation
pub type ContentChangedHook = Arc<dyn Fn() + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(pub(crate) u64);

pub(crate) struct Registration {
    pub id: ListenerId,
    pub node: NodeId,
    pub listener: Listener,
}
