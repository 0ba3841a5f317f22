//! # Document Tree
//!
//! A hypermap document is a tree of map and list containers with scalar
//! leaves. Containers live in an arena owned by the [`Document`] and are
//! referred to by generational [`NodeId`]s.
//!
//! ## Ownership
//!
//! ```text
//! root (map)
//!  ├─ "todos" → list ─ [0] → map { "title": "Buy milk" }
//!  └─ "completed" → 0
//! ```
//!
//! - A node sits in at most one container slot at a time
//! - Attaching a node detaches it from its previous owner first
//! - Removing a node from its container frees its whole subtree
//! - Detached nodes (from `create_*` or `import`) wait in the arena until
//!   attached or discarded
//!
//! ## Mutation
//!
//! Every mutator validates, edits, emits a [`ChangeEvent`] that bubbles
//! to the root, then calls the content-changed hook. A mutation that
//! fails validation leaves the tree untouched.

use crate::errors::{TreeError, TreeResult};
use crate::events::{ChangeEvent, ContentChangedHook, Listener, ListenerId, Registration};
use crate::{Attributes, Config, Key, Path, Value};
use indexmap::IndexMap;
use std::fmt;
use std::sync::Arc;

/// Handle to a container node inside a [`Document`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId {
    index: u32,
    generation: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Map,
    List,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Container {
    Map(IndexMap<String, Value>),
    List(Vec<Value>),
}

impl Container {
    fn kind(&self) -> NodeKind {
        match self {
            Container::Map(_) => NodeKind::Map,
            Container::List(_) => NodeKind::List,
        }
    }

    fn values(&self) -> Box<dyn Iterator<Item = &Value> + '_> {
        match self {
            Container::Map(map) => Box::new(map.values()),
            Container::List(list) => Box::new(list.iter()),
        }
    }

    fn get(&self, key: &Key) -> Option<&Value> {
        match (self, key) {
            (Container::Map(map), Key::Name(name)) => map.get(name),
            (Container::List(list), Key::Index(index)) => list.get(*index),
            _ => None,
        }
    }

    fn len(&self) -> usize {
        match self {
            Container::Map(map) => map.len(),
            Container::List(list) => list.len(),
        }
    }
}

#[derive(Debug)]
pub(crate) struct NodeData {
    pub owner: Option<NodeId>,
    pub attributes: Attributes,
    pub container: Container,
}

#[derive(Debug)]
struct Slot {
    generation: u32,
    data: Option<NodeData>,
}

/// A live hypermap tree
pub struct Document {
    slots: Vec<Slot>,
    free: Vec<u32>,
    root: NodeId,
    config: Arc<Config>,
    listeners: Vec<Registration>,
    next_listener: u64,
    content_changed: Option<ContentChangedHook>,
}

impl Document {
    /// Empty document whose root is a map
    pub fn new() -> Self {
        Self::with_config(Arc::new(Config::default()))
    }

    pub fn with_config(config: Arc<Config>) -> Self {
        let mut doc = Self {
            slots: Vec::new(),
            free: Vec::new(),
            root: NodeId { index: 0, generation: 0 },
            config,
            listeners: Vec::new(),
            next_listener: 0,
            content_changed: None,
        };
        doc.root = doc.alloc(Container::Map(IndexMap::new()), Attributes::default());
        doc
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn config(&self) -> &Arc<Config> {
        &self.config
    }

    pub(crate) fn set_root(&mut self, root: NodeId) {
        self.root = root;
    }

    // ---- arena ----------------------------------------------------------

    pub(crate) fn alloc(&mut self, container: Container, attributes: Attributes) -> NodeId {
        let data = NodeData {
            owner: None,
            attributes,
            container,
        };

        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.data = Some(data);
            NodeId {
                index,
                generation: slot.generation,
            }
        } else {
            let index = self.slots.len() as u32;
            self.slots.push(Slot {
                generation: 0,
                data: Some(data),
            });
            NodeId { index, generation: 0 }
        }
    }

    pub(crate) fn data(&self, id: NodeId) -> Option<&NodeData> {
        self.slots
            .get(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.data.as_ref())
    }

    fn data_mut(&mut self, id: NodeId) -> Option<&mut NodeData> {
        self.slots
            .get_mut(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.data.as_mut())
    }

    fn require(&self, id: NodeId) -> TreeResult<&NodeData> {
        self.data(id).ok_or(TreeError::UnknownNode(id))
    }

    fn require_mut(&mut self, id: NodeId) -> TreeResult<&mut NodeData> {
        self.data_mut(id).ok_or(TreeError::UnknownNode(id))
    }

    /// Free a node and everything below it
    pub(crate) fn free_subtree(&mut self, id: NodeId) {
        let Some(slot) = self.slots.get_mut(id.index as usize) else {
            return;
        };
        if slot.generation != id.generation {
            return;
        }
        let Some(data) = slot.data.take() else {
            return;
        };
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.index);
        self.listeners.retain(|r| r.node != id);

        let children: Vec<NodeId> = data.container.values().filter_map(Value::as_node).collect();
        for child in children {
            self.free_subtree(child);
        }
    }

    pub(crate) fn set_owner(&mut self, child: NodeId, owner: NodeId) {
        if let Some(data) = self.data_mut(child) {
            data.owner = Some(owner);
        }
    }

    /// Append an entry without validation or events
    pub(crate) fn push_entry(&mut self, owner: NodeId, key: Key, value: Value) {
        if let Some(data) = self.data_mut(owner) {
            match (&mut data.container, key) {
                (Container::Map(map), Key::Name(name)) => {
                    map.insert(name, value);
                }
                (Container::List(list), _) => list.push(value),
                _ => {}
            }
        }
    }

    /// Number of live nodes, attached or not
    pub fn node_count(&self) -> usize {
        self.slots.iter().filter(|slot| slot.data.is_some()).count()
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.data(id).is_some()
    }

    // ---- construction ---------------------------------------------------

    /// New detached, empty map node
    pub fn create_map(&mut self, attributes: Attributes) -> NodeId {
        self.alloc(Container::Map(IndexMap::new()), attributes)
    }

    /// New detached, empty list node
    pub fn create_list(&mut self) -> NodeId {
        self.alloc(Container::List(Vec::new()), Attributes::default())
    }

    /// Drop a detached node. Attached nodes must be removed with `delete`.
    pub fn discard(&mut self, id: NodeId) -> TreeResult<()> {
        let data = self.require(id)?;
        if data.owner.is_some() || id == self.root {
            return Err(TreeError::NotAddressable(self.path(id)));
        }
        self.free_subtree(id);
        Ok(())
    }

    // ---- reads ----------------------------------------------------------

    pub fn kind(&self, id: NodeId) -> Option<NodeKind> {
        self.data(id).map(|data| data.container.kind())
    }

    pub fn owner(&self, id: NodeId) -> Option<NodeId> {
        self.data(id).and_then(|data| data.owner)
    }

    pub fn attributes(&self, id: NodeId) -> Option<&Attributes> {
        self.data(id).map(|data| &data.attributes)
    }

    pub fn set_attributes(&mut self, id: NodeId, attributes: Attributes) -> TreeResult<()> {
        self.require_mut(id)?.attributes = attributes;
        Ok(())
    }

    pub fn len(&self, id: NodeId) -> usize {
        self.data(id).map(|data| data.container.len()).unwrap_or(0)
    }

    pub fn is_empty(&self, id: NodeId) -> bool {
        self.len(id) == 0
    }

    pub fn get(&self, id: NodeId, key: &Key) -> Option<&Value> {
        self.data(id).and_then(|data| data.container.get(key))
    }

    pub fn has(&self, id: NodeId, key: impl Into<Key>) -> bool {
        self.get(id, &key.into()).is_some()
    }

    /// Keys in entry order; indices for lists
    pub fn keys(&self, id: NodeId) -> Vec<Key> {
        match self.data(id).map(|data| &data.container) {
            Some(Container::Map(map)) => map.keys().map(|k| Key::Name(k.clone())).collect(),
            Some(Container::List(list)) => (0..list.len()).map(Key::Index).collect(),
            None => Vec::new(),
        }
    }

    pub fn entries(&self, id: NodeId) -> Vec<(Key, Value)> {
        match self.data(id).map(|data| &data.container) {
            Some(Container::Map(map)) => map
                .iter()
                .map(|(k, v)| (Key::Name(k.clone()), v.clone()))
                .collect(),
            Some(Container::List(list)) => list
                .iter()
                .enumerate()
                .map(|(i, v)| (Key::Index(i), v.clone()))
                .collect(),
            None => Vec::new(),
        }
    }

    /// Child containers in entry order; scalar leaves are skipped
    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        self.data(id)
            .map(|data| data.container.values().filter_map(Value::as_node).collect())
            .unwrap_or_default()
    }

    /// Resolve `path` below `id`.
    ///
    /// Returns `None` when a segment is missing, out of range, of the wrong
    /// kind for its container, or tries to descend through a scalar.
    pub fn at<'p>(&self, id: NodeId, path: impl IntoIterator<Item = &'p Key>) -> Option<Value> {
        self.data(id)?;
        let mut current = Value::Node(id);
        for key in path {
            let node = current.as_node()?;
            current = self.get(node, key)?.clone();
        }
        Some(current)
    }

    /// Resolve a slash separated path, reading numeric segments as list
    /// indices and everything else as map keys.
    pub fn at_str(&self, id: NodeId, path: &str) -> Option<Value> {
        self.resolve_path(id, &Path::parse_slashed(path))
            .and_then(|resolved| self.at(id, &resolved))
    }

    /// Turn raw slash segments into typed keys against the live tree
    pub fn resolve_path(&self, id: NodeId, raw: &Path) -> Option<Path> {
        let mut node = id;
        let mut resolved = Path::root();
        let mut keys = raw.iter().peekable();
        while let Some(key) = keys.next() {
            let typed = match (self.kind(node)?, key) {
                (NodeKind::List, Key::Name(segment)) => Key::Index(segment.parse().ok()?),
                (NodeKind::Map, Key::Index(index)) => Key::Name(index.to_string()),
                (_, key) => key.clone(),
            };
            let value = self.get(node, &typed)?;
            resolved.push(typed);
            if keys.peek().is_some() {
                node = value.as_node()?;
            }
        }
        Some(resolved)
    }

    /// Key under which `owner` holds `child` (linear scan)
    pub fn key_for(&self, owner: NodeId, child: NodeId) -> Option<Key> {
        match &self.data(owner)?.container {
            Container::Map(map) => map
                .iter()
                .find(|(_, v)| v.as_node() == Some(child))
                .map(|(k, _)| Key::Name(k.clone())),
            Container::List(list) => list
                .iter()
                .position(|v| v.as_node() == Some(child))
                .map(Key::Index),
        }
    }

    /// Keys from the root of this node's tree down to `id`
    pub fn path(&self, id: NodeId) -> Path {
        let mut keys = Vec::new();
        let mut current = id;
        while let Some(owner) = self.owner(current) {
            if let Some(key) = self.key_for(owner, current) {
                keys.push(key);
            }
            current = owner;
        }
        keys.reverse();
        Path::from(keys)
    }

    /// `id` followed by each of its ancestors up to the top of its tree
    pub fn ancestry(&self, id: NodeId) -> Vec<NodeId> {
        let mut chain = Vec::new();
        let mut current = Some(id);
        while let Some(node) = current {
            if !self.contains(node) {
                break;
            }
            chain.push(node);
            current = self.owner(node);
        }
        chain
    }

    pub fn is_ancestor_or_self(&self, candidate: NodeId, of: NodeId) -> bool {
        self.ancestry(of).contains(&candidate)
    }

    // ---- events ---------------------------------------------------------

    pub fn on_changed(
        &mut self,
        id: NodeId,
        listener: impl Fn(&mut Document, &ChangeEvent) + Send + Sync + 'static,
    ) -> TreeResult<ListenerId> {
        self.require(id)?;
        let listener_id = ListenerId(self.next_listener);
        self.next_listener += 1;
        self.listeners.push(Registration {
            id: listener_id,
            node: id,
            listener: Arc::new(listener),
        });
        Ok(listener_id)
    }

    pub fn off_changed(&mut self, listener_id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|r| r.id != listener_id);
        self.listeners.len() != before
    }

    pub fn set_content_changed_hook(&mut self, hook: impl Fn() + Send + Sync + 'static) {
        self.content_changed = Some(Arc::new(hook));
    }

    pub fn clear_content_changed_hook(&mut self) {
        self.content_changed = None;
    }

    fn emit(&mut self, target: NodeId, key: Key, value: Option<Value>) {
        let mut event = ChangeEvent {
            target,
            current_target: target,
            key,
            value,
        };

        for node in self.ancestry(target) {
            // Earlier listeners may have freed part of the chain
            if !self.contains(node) {
                break;
            }
            let listeners: Vec<Listener> = self
                .listeners
                .iter()
                .filter(|r| r.node == node)
                .map(|r| r.listener.clone())
                .collect();
            event.current_target = node;
            for listener in listeners {
                listener(self, &event);
            }
        }

        self.notify_content_changed();
    }

    pub(crate) fn notify_content_changed(&self) {
        if let Some(hook) = &self.content_changed {
            hook();
        }
    }

    // ---- mutation -------------------------------------------------------

    /// Check that `value` may be attached under `target`, then detach it
    /// from its current owner.
    fn adopt(&mut self, target: NodeId, value: &Value) -> TreeResult<()> {
        let Value::Node(child) = value else {
            return Ok(());
        };
        let child = *child;
        self.require(child)?;
        if child == self.root || self.is_ancestor_or_self(child, target) {
            return Err(TreeError::Cycle { target, child });
        }
        self.detach(child);
        Ok(())
    }

    /// Remove `child` from its owner's container without freeing it
    fn detach(&mut self, child: NodeId) {
        let Some(owner) = self.owner(child) else {
            return;
        };
        if let Some(data) = self.data_mut(owner) {
            match &mut data.container {
                Container::Map(map) => map.retain(|_, v| v.as_node() != Some(child)),
                Container::List(list) => list.retain(|v| v.as_node() != Some(child)),
            }
        }
        if let Some(data) = self.data_mut(child) {
            data.owner = None;
        }
    }

    fn claim(&mut self, owner: NodeId, value: &Value) {
        if let Value::Node(child) = value {
            if let Some(data) = self.data_mut(*child) {
                data.owner = Some(owner);
            }
        }
    }

    fn release(&mut self, old: Option<Value>, keep: &Value) {
        if let Some(Value::Node(old)) = old {
            if keep.as_node() != Some(old) {
                self.free_subtree(old);
            }
        }
    }

    /// Reject a key whose kind doesn't match the container
    fn check_key_kind(&self, target: NodeId, kind: NodeKind, key: &Key) -> TreeResult<()> {
        match (kind, key) {
            (NodeKind::Map, Key::Index(_)) => Err(TreeError::NotAList(target)),
            (NodeKind::List, Key::Name(_)) => Err(TreeError::NotAMap(target)),
            _ => Ok(()),
        }
    }

    /// True when `value` is a node already held by list `target` at an
    /// index below `index`, so detaching it shifts `index` down by one
    fn shifts_before(&self, target: NodeId, index: usize, value: &Value) -> bool {
        let Value::Node(child) = value else {
            return false;
        };
        matches!(self.key_for(target, *child), Some(Key::Index(position)) if position < index)
    }

    /// Set a map entry or replace a list element.
    ///
    /// Map keys that don't exist yet are appended; list indices must
    /// already exist. Moving a node within the same list replaces the
    /// element that was addressed before the move.
    pub fn set(&mut self, target: NodeId, key: impl Into<Key>, value: impl Into<Value>) -> TreeResult<()> {
        let mut key = key.into();
        let value = value.into();
        let kind = self.require(target)?.container.kind();
        self.check_key_kind(target, kind, &key)?;
        if let Key::Index(index) = key {
            if index >= self.len(target) {
                return Err(TreeError::NotAddressable(self.path(target).child(key.clone())));
            }
        }

        // Re-setting a child into its own slot is a structural no-op
        let same_slot = matches!(&value, Value::Node(child)
            if self.owner(*child) == Some(target) && self.key_for(target, *child).as_ref() == Some(&key));

        if !same_slot {
            let shifted = match key {
                Key::Index(index) => self.shifts_before(target, index, &value),
                Key::Name(_) => false,
            };
            self.adopt(target, &value)?;
            if let (true, Key::Index(index)) = (shifted, &mut key) {
                *index -= 1;
            }
        }

        let old = {
            let data = self.require_mut(target)?;
            match (&mut data.container, &key) {
                (Container::Map(map), Key::Name(name)) => map.insert(name.clone(), value.clone()),
                (Container::List(list), Key::Index(index)) => list
                    .get_mut(*index)
                    .map(|slot| std::mem::replace(slot, value.clone())),
                _ => None,
            }
        };
        self.claim(target, &value);
        self.release(old, &value);

        self.emit(target, key, Some(value));
        Ok(())
    }

    /// Remove a map entry or list element, freeing it if it is a node
    pub fn delete(&mut self, target: NodeId, key: impl Into<Key>) -> TreeResult<Option<Value>> {
        let key = key.into();
        let kind = self.require(target)?.container.kind();
        self.check_key_kind(target, kind, &key)?;
        let path = self.path(target);
        let removed = {
            let data = self.require_mut(target)?;
            match (&mut data.container, &key) {
                (Container::Map(map), Key::Name(name)) => map.shift_remove(name),
                (Container::List(list), Key::Index(index)) if *index < list.len() => {
                    Some(list.remove(*index))
                }
                _ => return Err(TreeError::NotAddressable(path.child(key.clone()))),
            }
        };

        let Some(removed) = removed else {
            return Ok(None);
        };
        if let Value::Node(child) = removed {
            self.free_subtree(child);
        }

        self.emit(target, key, None);
        Ok(Some(removed))
    }

    /// Insert into a list at `index` (0..=len), shifting later elements.
    ///
    /// A node moved within the same list lands before the element that
    /// was at `index` before the move.
    pub fn insert(&mut self, target: NodeId, index: usize, value: impl Into<Value>) -> TreeResult<()> {
        let value = value.into();
        if self.require(target)?.container.kind() != NodeKind::List {
            return Err(TreeError::NotAList(target));
        }
        if index > self.len(target) {
            return Err(TreeError::NotAddressable(self.path(target).child(index)));
        }
        let shifted = self.shifts_before(target, index, &value);
        self.adopt(target, &value)?;

        let index = if shifted { index - 1 } else { index };
        if let Container::List(list) = &mut self.require_mut(target)?.container {
            list.insert(index, value.clone());
        }
        self.claim(target, &value);

        self.emit(target, Key::Index(index), Some(value));
        Ok(())
    }

    pub fn append(&mut self, target: NodeId, value: impl Into<Value>) -> TreeResult<()> {
        let value = value.into();
        if self.require(target)?.container.kind() != NodeKind::List {
            return Err(TreeError::NotAList(target));
        }
        self.adopt(target, &value)?;
        let index = self.len(target);
        if let Container::List(list) = &mut self.require_mut(target)?.container {
            list.push(value.clone());
        }
        self.claim(target, &value);

        self.emit(target, Key::Index(index), Some(value));
        Ok(())
    }

    pub fn prepend(&mut self, target: NodeId, value: impl Into<Value>) -> TreeResult<()> {
        self.insert(target, 0, value)
    }

    /// Swap the container of `target` for the one of the detached node
    /// `source`, keeping `target`'s identity, slot and attributes.
    ///
    /// The previous children are freed and `source` ceases to exist.
    pub fn replace_contents(&mut self, target: NodeId, source: NodeId) -> TreeResult<()> {
        self.require(target)?;
        let source_data = self.require(source)?;
        if source_data.owner.is_some() || source == self.root || source == target {
            return Err(TreeError::NotAddressable(self.path(source)));
        }
        // `target` inside `source` would end up owning itself
        if self.is_ancestor_or_self(source, target) {
            return Err(TreeError::Cycle { target, child: source });
        }

        let replacement = {
            let data = self.require_mut(source)?;
            std::mem::replace(&mut data.container, Container::List(Vec::new()))
        };
        self.free_subtree(source);

        let previous = {
            let data = self.require_mut(target)?;
            std::mem::replace(&mut data.container, replacement)
        };
        for child in previous.values().filter_map(Value::as_node) {
            self.free_subtree(child);
        }
        for child in self.children(target) {
            if let Some(data) = self.data_mut(child) {
                data.owner = Some(target);
            }
        }

        match self.owner(target) {
            Some(owner) => {
                if let Some(key) = self.key_for(owner, target) {
                    self.emit(owner, key, Some(Value::Node(target)));
                }
            }
            None => self.notify_content_changed(),
        }
        Ok(())
    }

    /// Borrowed read view of a node
    pub fn node(&self, id: NodeId) -> Option<NodeRef<'_>> {
        self.data(id).map(|_| NodeRef { doc: self, id })
    }

    pub fn root_ref(&self) -> NodeRef<'_> {
        NodeRef {
            doc: self,
            id: self.root,
        }
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document")
            .field("root", &self.root)
            .field("nodes", &self.node_count())
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let json = self.serialize();
        match serde_json::to_string_pretty(&json) {
            Ok(s) => f.write_str(&s),
            Err(_) => Err(fmt::Error),
        }
    }
}

/// Read-only view of one node
#[derive(Clone, Copy)]
pub struct NodeRef<'a> {
    doc: &'a Document,
    id: NodeId,
}

impl<'a> NodeRef<'a> {
    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn document(&self) -> &'a Document {
        self.doc
    }

    pub fn kind(&self) -> NodeKind {
        self.doc.kind(self.id).unwrap_or(NodeKind::Map)
    }

    pub fn at<'p>(&self, path: impl IntoIterator<Item = &'p Key>) -> Option<Value> {
        self.doc.at(self.id, path)
    }

    /// Child node at `path`, if the path leads to a container
    pub fn node_at<'p>(&self, path: impl IntoIterator<Item = &'p Key>) -> Option<NodeRef<'a>> {
        let id = self.doc.at(self.id, path)?.as_node()?;
        self.doc.node(id)
    }

    pub fn path(&self) -> Path {
        self.doc.path(self.id)
    }

    pub fn owner(&self) -> Option<NodeRef<'a>> {
        self.doc.owner(self.id).and_then(|id| self.doc.node(id))
    }

    pub fn attributes(&self) -> &'a Attributes {
        self.doc
            .data(self.id)
            .map(|d| &d.attributes)
            .unwrap_or(&EMPTY_ATTRIBUTES)
    }

    pub fn len(&self) -> usize {
        self.doc.len(self.id)
    }

    pub fn is_empty(&self) -> bool {
        self.doc.is_empty(self.id)
    }

    pub fn has(&self, key: impl Into<Key>) -> bool {
        self.doc.has(self.id, key)
    }

    pub fn keys(&self) -> Vec<Key> {
        self.doc.keys(self.id)
    }

    pub fn children(&self) -> Vec<NodeRef<'a>> {
        self.doc
            .children(self.id)
            .into_iter()
            .filter_map(|id| self.doc.node(id))
            .collect()
    }

    pub fn to_json(&self) -> serde_json::Value {
        self.doc.to_json(self.id)
    }
}

impl fmt::Debug for NodeRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeRef")
            .field("id", &self.id)
            .field("path", &self.path())
            .finish()
    }
}

static EMPTY_ATTRIBUTES: Attributes = Attributes {
    href: None,
    method: None,
    rels: None,
    script: None,
};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path;
    use std::sync::Mutex;

    fn todo_doc() -> Document {
        Document::from_json_str(
            r#"{"todos":[{"@":{"href":"1/"},"title":"Buy milk","completed":false}],"completed":0}"#,
        )
        .unwrap()
    }

    #[test]
    fn test_at_resolves_mixed_paths() {
        let doc = todo_doc();
        let root = doc.root();
        assert_eq!(doc.at(root, &path!["todos", 0, "title"]).unwrap(), "Buy milk");
        assert_eq!(doc.at(root, &path![]), Some(Value::Node(root)));

        let todos = doc.at(root, &path!["todos"]).unwrap().as_node().unwrap();
        assert_eq!(doc.at(todos, &path![1]), None);
    }

    #[test]
    fn test_at_never_descends_through_scalars() {
        let doc = todo_doc();
        let root = doc.root();
        assert_eq!(doc.at(root, &path!["completed", "badPath"]), None);
        assert_eq!(doc.at(root, &path!["todos", "0"]), None);
        assert_eq!(doc.at(root, &path![0]), None);
    }

    #[test]
    fn test_at_str_interprets_segments_by_container() {
        let doc = todo_doc();
        assert_eq!(doc.at_str(doc.root(), "todos/0/title").unwrap(), "Buy milk");
        assert_eq!(doc.at_str(doc.root(), "todos/x"), None);
    }

    #[test]
    fn test_path_matches_owner_chain() {
        let doc = todo_doc();
        let root = doc.root();
        let todo = doc.at(root, &path!["todos", 0]).unwrap().as_node().unwrap();
        assert_eq!(doc.path(todo), path!["todos", 0]);
        assert!(doc.path(root).is_root());

        let owner = doc.owner(todo).unwrap();
        let mut expected = doc.path(owner);
        expected.push(doc.key_for(owner, todo).unwrap());
        assert_eq!(doc.path(todo), expected);
    }

    #[test]
    fn test_children_excludes_leaves() {
        let doc = todo_doc();
        assert_eq!(doc.children(doc.root()).len(), 1);
    }

    #[test]
    fn test_set_rejects_ancestor() {
        let mut doc = todo_doc();
        let root = doc.root();
        let todos = doc.at(root, &path!["todos"]).unwrap().as_node().unwrap();
        let todo = doc.at(todos, &path![0]).unwrap().as_node().unwrap();
        let before = doc.serialize().to_string();

        let err = doc.set(todo, "parent", todos).unwrap_err();
        assert!(matches!(err, TreeError::Cycle { .. }));
        let err = doc.set(todo, "self", todo).unwrap_err();
        assert!(matches!(err, TreeError::Cycle { .. }));
        let err = doc.append(todos, root).unwrap_err();
        assert!(matches!(err, TreeError::Cycle { .. }));

        assert_eq!(doc.serialize().to_string(), before);
    }

    #[test]
    fn test_set_reparents_node() {
        let mut doc = todo_doc();
        let root = doc.root();
        let todos = doc.at(root, &path!["todos"]).unwrap().as_node().unwrap();
        let todo = doc.at(todos, &path![0]).unwrap().as_node().unwrap();

        doc.set(root, "current", todo).unwrap();
        assert_eq!(doc.len(todos), 0);
        assert_eq!(doc.path(todo), path!["current"]);
        assert_eq!(doc.owner(todo), Some(root));
    }

    #[test]
    fn test_events_bubble_in_order() {
        let mut doc = todo_doc();
        let root = doc.root();
        let todos = doc.at(root, &path!["todos"]).unwrap().as_node().unwrap();
        let todo = doc.at(todos, &path![0]).unwrap().as_node().unwrap();

        let seen = Arc::new(Mutex::new(Vec::new()));
        for node in [root, todos, todo] {
            let seen = seen.clone();
            doc.on_changed(node, move |_, event| {
                seen.lock().unwrap().push((event.current_target, event.key.clone(), event.value.clone()));
            })
            .unwrap();
        }

        doc.set(todo, "title", "Buy cheese").unwrap();

        let seen = seen.lock().unwrap();
        let order: Vec<NodeId> = seen.iter().map(|(n, _, _)| *n).collect();
        assert_eq!(order, vec![todo, todos, root]);
        for (_, key, value) in seen.iter() {
            assert_eq!(key, &Key::from("title"));
            assert_eq!(value.as_ref().unwrap(), &"Buy cheese");
        }
    }

    #[test]
    fn test_listener_can_mutate_document() {
        let mut doc = Document::from_json_str(r#"{"input":"","output":0}"#).unwrap();
        let root = doc.root();
        doc.on_changed(root, |doc, event| {
            if event.key == Key::from("input") {
                let root = doc.root();
                let _ = doc.set(root, "output", 1);
            }
        })
        .unwrap();

        doc.set(root, "input", "test").unwrap();
        assert_eq!(doc.at(root, &path!["output"]).unwrap(), 1);
    }

    #[test]
    fn test_content_changed_hook_fires() {
        let mut doc = todo_doc();
        let count = Arc::new(Mutex::new(0));
        let hook_count = count.clone();
        doc.set_content_changed_hook(move || *hook_count.lock().unwrap() += 1);

        let root = doc.root();
        doc.set(root, "completed", 1).unwrap();
        doc.delete(root, "completed").unwrap();
        assert_eq!(*count.lock().unwrap(), 2);
    }

    #[test]
    fn test_list_mutations_shift_indices() {
        let mut doc = Document::from_json_str(r#"{"list":["middle"]}"#).unwrap();
        let list = doc.at(doc.root(), &path!["list"]).unwrap().as_node().unwrap();

        doc.prepend(list, "first").unwrap();
        doc.append(list, "last").unwrap();
        doc.insert(list, 2, "middle2").unwrap();
        doc.set(list, 1, "middle1").unwrap();
        assert_eq!(
            doc.to_json(list),
            serde_json::json!(["first", "middle1", "middle2", "last"])
        );

        doc.delete(list, 0).unwrap();
        assert_eq!(doc.at(list, &path![0]).unwrap(), "middle1");

        assert!(matches!(doc.set(list, 9, "x"), Err(TreeError::NotAddressable(_))));
        assert!(matches!(doc.insert(list, 9, "x"), Err(TreeError::NotAddressable(_))));
        assert!(matches!(doc.delete(list, 9), Err(TreeError::NotAddressable(_))));
    }

    #[test]
    fn test_set_moves_node_within_list() {
        let mut doc = Document::from_json_str(r#"{"list":[{"a":1},"b","c"]}"#).unwrap();
        let list = doc.at(doc.root(), &path!["list"]).unwrap().as_node().unwrap();
        let first = doc.at(list, &path![0]).unwrap().as_node().unwrap();

        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_keys = seen.clone();
        doc.on_changed(list, move |_, event| seen_keys.lock().unwrap().push(event.key.clone()))
            .unwrap();

        // Replaces "c", the element addressed before the move
        doc.set(list, 2, first).unwrap();
        assert_eq!(doc.to_json(list), serde_json::json!(["b", {"a": 1}]));
        assert_eq!(doc.path(first), path!["list", 1]);
        assert_eq!(*seen.lock().unwrap(), vec![Key::Index(1)]);
    }

    #[test]
    fn test_failed_set_leaves_tree_untouched() {
        let mut doc = Document::from_json_str(r#"{"list":[{"a":1},"b","c"],"map":{}}"#).unwrap();
        let root = doc.root();
        let list = doc.at(root, &path!["list"]).unwrap().as_node().unwrap();
        let map = doc.at(root, &path!["map"]).unwrap().as_node().unwrap();
        let first = doc.at(list, &path![0]).unwrap().as_node().unwrap();
        let before = doc.serialize().to_string();

        assert!(matches!(doc.set(list, 3, first), Err(TreeError::NotAddressable(_))));
        assert!(matches!(doc.set(list, "x", first), Err(TreeError::NotAMap(_))));
        assert!(matches!(doc.set(map, 0, first), Err(TreeError::NotAList(_))));
        assert!(matches!(doc.delete(list, "x"), Err(TreeError::NotAMap(_))));

        assert_eq!(doc.serialize().to_string(), before);
        assert_eq!(doc.owner(first), Some(list));
    }

    #[test]
    fn test_insert_moves_node_within_list() {
        let mut doc = Document::from_json_str(r#"{"list":[{"a":1},"b","c"]}"#).unwrap();
        let list = doc.at(doc.root(), &path!["list"]).unwrap().as_node().unwrap();
        let first = doc.at(list, &path![0]).unwrap().as_node().unwrap();

        doc.insert(list, 2, first).unwrap();
        assert_eq!(doc.to_json(list), serde_json::json!(["b", {"a": 1}, "c"]));

        doc.append(list, first).unwrap();
        assert_eq!(doc.to_json(list), serde_json::json!(["b", "c", {"a": 1}]));
        assert_eq!(doc.path(first), path!["list", 2]);
    }

    #[test]
    fn test_delete_frees_subtree() {
        let mut doc = todo_doc();
        let root = doc.root();
        let todos = doc.at(root, &path!["todos"]).unwrap().as_node().unwrap();
        let todo = doc.at(todos, &path![0]).unwrap().as_node().unwrap();
        let before = doc.node_count();

        doc.delete(root, "todos").unwrap();
        assert!(!doc.contains(todos));
        assert!(!doc.contains(todo));
        assert_eq!(doc.node_count(), before - 2);
        assert!(matches!(doc.set(todo, "title", "x"), Err(TreeError::UnknownNode(_))));
    }

    #[test]
    fn test_stale_ids_do_not_alias_reused_slots() {
        let mut doc = Document::new();
        let first = doc.create_map(Attributes::default());
        doc.discard(first).unwrap();
        let second = doc.create_map(Attributes::default());
        assert!(!doc.contains(first));
        assert!(doc.contains(second));
        assert_ne!(first, second);
    }

    #[test]
    fn test_replace_contents_keeps_identity() {
        let mut doc = Document::from_json_str(
            r#"{"counter":{"@":{"href":"/counter/","rels":["transclude"]}}}"#,
        )
        .unwrap();
        let root = doc.root();
        let counter = doc.at(root, &path!["counter"]).unwrap().as_node().unwrap();

        let fresh = doc.import(&serde_json::json!({"count": 0})).unwrap().as_node().unwrap();
        doc.replace_contents(counter, fresh).unwrap();

        assert_eq!(doc.at(counter, &path!["count"]).unwrap(), 0);
        assert_eq!(doc.path(counter), path!["counter"]);
        assert!(doc.attributes(counter).unwrap().is_transclusion());
        assert!(!doc.contains(fresh));
    }

    #[test]
    fn test_replace_contents_rejects_own_descendant() {
        let mut doc = Document::new();
        let source = doc.import(&serde_json::json!({"inner": {}})).unwrap().as_node().unwrap();
        let inner = doc.at(source, &path!["inner"]).unwrap().as_node().unwrap();

        let err = doc.replace_contents(inner, source).unwrap_err();
        assert!(matches!(err, TreeError::Cycle { .. }));
        assert_eq!(doc.owner(inner), Some(source));
        assert_eq!(doc.path(inner), path!["inner"]);
        assert_eq!(doc.to_json(source), serde_json::json!({"inner": {}}));
    }
}
