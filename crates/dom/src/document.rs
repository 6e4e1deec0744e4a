//! Arena-backed document tree.
//!
//! Invariants:
//! - Every live node has exactly one record; keys are allocated monotonically and never reused.
//! - Record slots of removed nodes are emptied and recycled for later nodes.
//! - A node has at most one parent and appears exactly once in that parent's child list.
//! - Fragments never have a parent; inserting a fragment moves its children instead.
//! - Inserting a node that already has a parent moves it (it is detached first).
//! - Detached nodes stay live until `remove` destroys them, so they can be re-inserted.

use crate::error::DomError;
use crate::types::{Event, Listener, NodeKey, NodeKind, Property};
use std::collections::HashMap;

#[derive(Debug)]
pub struct Document {
    nodes: Vec<Option<NodeRecord>>,
    /// Empty slots in `nodes`, reused before the arena grows.
    free: Vec<usize>,
    live: HashMap<NodeKey, usize>,
    next_key: u32,
}

#[derive(Debug)]
struct NodeRecord {
    kind: NodeKind,
    parent: Option<NodeKey>,
    children: Vec<NodeKey>,
    properties: Vec<(String, Property)>,
    listeners: Vec<(String, Listener)>,
}

impl NodeRecord {
    fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            parent: None,
            children: Vec::new(),
            properties: Vec::new(),
            listeners: Vec::new(),
        }
    }
}

impl Document {
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            free: Vec::new(),
            live: HashMap::new(),
            next_key: 1,
        }
    }

    fn insert_node(&mut self, kind: NodeKind) -> NodeKey {
        let key = NodeKey(self.next_key);
        self.next_key = self.next_key.wrapping_add(1);
        let record = Some(NodeRecord::new(kind));
        let index = match self.free.pop() {
            Some(index) => {
                self.nodes[index] = record;
                index
            }
            None => {
                self.nodes.push(record);
                self.nodes.len() - 1
            }
        };
        self.live.insert(key, index);
        key
    }

    pub fn create_fragment(&mut self) -> NodeKey {
        self.insert_node(NodeKind::Fragment)
    }

    /// Element names are canonicalized to ASCII lowercase.
    pub fn create_element(&mut self, name: &str) -> NodeKey {
        self.insert_node(NodeKind::Element {
            name: name.to_ascii_lowercase(),
            attributes: Vec::new(),
        })
    }

    pub fn create_text(&mut self, text: &str) -> NodeKey {
        self.insert_node(NodeKind::Text {
            text: text.to_string(),
        })
    }

    pub fn create_comment(&mut self, text: &str) -> NodeKey {
        self.insert_node(NodeKind::Comment {
            text: text.to_string(),
        })
    }

    /// Number of live nodes, attached or not.
    pub fn len(&self) -> usize {
        self.live.len()
    }

    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }

    pub fn contains(&self, key: NodeKey) -> bool {
        self.live.contains_key(&key)
    }

    fn record(&self, key: NodeKey) -> Result<&NodeRecord, DomError> {
        let index = *self.live.get(&key).ok_or(DomError::MissingNode(key))?;
        self.nodes[index].as_ref().ok_or(DomError::MissingNode(key))
    }

    fn record_mut(&mut self, key: NodeKey) -> Result<&mut NodeRecord, DomError> {
        let index = *self.live.get(&key).ok_or(DomError::MissingNode(key))?;
        self.nodes[index].as_mut().ok_or(DomError::MissingNode(key))
    }

    pub fn kind(&self, key: NodeKey) -> Option<&NodeKind> {
        self.record(key).ok().map(|r| &r.kind)
    }

    pub fn tag_name(&self, key: NodeKey) -> Option<&str> {
        match self.kind(key)? {
            NodeKind::Element { name, .. } => Some(name),
            _ => None,
        }
    }

    pub fn is_element(&self, key: NodeKey) -> bool {
        matches!(self.kind(key), Some(NodeKind::Element { .. }))
    }

    pub fn is_comment(&self, key: NodeKey) -> bool {
        matches!(self.kind(key), Some(NodeKind::Comment { .. }))
    }

    /// Character data of a text or comment node.
    pub fn character_data(&self, key: NodeKey) -> Option<&str> {
        match self.kind(key)? {
            NodeKind::Text { text } | NodeKind::Comment { text } => Some(text),
            _ => None,
        }
    }

    pub fn set_character_data(&mut self, key: NodeKey, data: &str) -> Result<(), DomError> {
        let record = self.record_mut(key)?;
        match &mut record.kind {
            NodeKind::Text { text } | NodeKind::Comment { text } => {
                text.clear();
                text.push_str(data);
                Ok(())
            }
            other => Err(DomError::WrongNodeKind {
                key,
                expected: "text",
                found: other.label(),
            }),
        }
    }

    pub fn parent(&self, key: NodeKey) -> Option<NodeKey> {
        self.record(key).ok().and_then(|r| r.parent)
    }

    pub fn children(&self, key: NodeKey) -> &[NodeKey] {
        self.record(key).map(|r| r.children.as_slice()).unwrap_or(&[])
    }

    pub fn first_child(&self, key: NodeKey) -> Option<NodeKey> {
        self.children(key).first().copied()
    }

    pub fn next_sibling(&self, key: NodeKey) -> Option<NodeKey> {
        let parent = self.parent(key)?;
        let siblings = self.children(parent);
        let pos = siblings.iter().position(|k| *k == key)?;
        siblings.get(pos + 1).copied()
    }

    pub fn append_child(&mut self, parent: NodeKey, child: NodeKey) -> Result<(), DomError> {
        self.insert_child(parent, child, None)
    }

    pub fn insert_before(
        &mut self,
        parent: NodeKey,
        child: NodeKey,
        before: NodeKey,
    ) -> Result<(), DomError> {
        self.insert_child(parent, child, Some(before))
    }

    fn insert_child(
        &mut self,
        parent: NodeKey,
        child: NodeKey,
        before: Option<NodeKey>,
    ) -> Result<(), DomError> {
        let parent_kind = &self.record(parent)?.kind;
        if !parent_kind.allows_children() {
            return Err(DomError::InvalidParent(parent));
        }
        if let Some(before) = before {
            if self.record(before)?.parent != Some(parent) {
                return Err(DomError::InvalidSibling { parent, before });
            }
        }
        if matches!(self.record(child)?.kind, NodeKind::Fragment) {
            let moved = std::mem::take(&mut self.record_mut(child)?.children);
            for node in &moved {
                self.record_mut(*node)?.parent = None;
            }
            for node in moved {
                self.attach(parent, node, before)?;
            }
            return Ok(());
        }
        if parent == child || self.is_descendant(child, parent) {
            return Err(DomError::CycleDetected { parent, child });
        }
        self.detach(child)?;
        self.attach(parent, child, before)
    }

    fn attach(
        &mut self,
        parent: NodeKey,
        child: NodeKey,
        before: Option<NodeKey>,
    ) -> Result<(), DomError> {
        let siblings = &mut self.record_mut(parent)?.children;
        match before {
            Some(before) => {
                let pos = siblings
                    .iter()
                    .position(|k| *k == before)
                    .ok_or(DomError::InvalidSibling { parent, before })?;
                siblings.insert(pos, child);
            }
            None => siblings.push(child),
        }
        self.record_mut(child)?.parent = Some(parent);
        Ok(())
    }

    /// Detach a node from its parent. The node stays live and can be re-inserted.
    pub fn detach(&mut self, key: NodeKey) -> Result<(), DomError> {
        let Some(parent) = self.record_mut(key)?.parent.take() else {
            return Ok(());
        };
        if let Ok(record) = self.record_mut(parent) {
            record.children.retain(|k| *k != key);
        }
        Ok(())
    }

    /// Detach a node and destroy it with its entire subtree. Keys in the subtree stop
    /// resolving afterwards.
    pub fn remove(&mut self, key: NodeKey) -> Result<(), DomError> {
        self.detach(key)?;
        let mut stack = vec![key];
        while let Some(current) = stack.pop() {
            let Some(index) = self.live.remove(&current) else {
                continue;
            };
            if let Some(record) = self.nodes[index].take() {
                stack.extend(record.children);
                self.free.push(index);
            }
        }
        Ok(())
    }

    fn is_descendant(&self, ancestor: NodeKey, maybe_descendant: NodeKey) -> bool {
        let mut current = self.parent(maybe_descendant);
        while let Some(node) = current {
            if node == ancestor {
                return true;
            }
            current = self.parent(node);
        }
        false
    }

    pub fn attributes(&self, key: NodeKey) -> &[(String, Option<String>)] {
        match self.kind(key) {
            Some(NodeKind::Element { attributes, .. }) => attributes,
            _ => &[],
        }
    }

    /// Valueless attributes read as the empty string.
    pub fn get_attribute(&self, key: NodeKey, name: &str) -> Option<&str> {
        self.attributes(key)
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_deref().unwrap_or(""))
    }

    pub fn has_attribute(&self, key: NodeKey, name: &str) -> bool {
        self.get_attribute(key, name).is_some()
    }

    fn attributes_mut(
        &mut self,
        key: NodeKey,
    ) -> Result<&mut Vec<(String, Option<String>)>, DomError> {
        match &mut self.record_mut(key)?.kind {
            NodeKind::Element { attributes, .. } => Ok(attributes),
            other => Err(DomError::WrongNodeKind {
                key,
                expected: "element",
                found: other.label(),
            }),
        }
    }

    pub fn set_attribute(&mut self, key: NodeKey, name: &str, value: &str) -> Result<(), DomError> {
        let attributes = self.attributes_mut(key)?;
        match attributes
            .iter_mut()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
        {
            Some((_, v)) => *v = Some(value.to_string()),
            None => attributes.push((name.to_ascii_lowercase(), Some(value.to_string()))),
        }
        Ok(())
    }

    /// Parser entry point: keeps valueless attributes as `None` and lets the first
    /// occurrence of a duplicated name win.
    pub(crate) fn push_parsed_attribute(
        &mut self,
        key: NodeKey,
        name: String,
        value: Option<String>,
    ) -> Result<(), DomError> {
        let attributes = self.attributes_mut(key)?;
        if !attributes.iter().any(|(k, _)| *k == name) {
            attributes.push((name, value));
        }
        Ok(())
    }

    /// Returns whether the attribute was present.
    pub fn remove_attribute(&mut self, key: NodeKey, name: &str) -> Result<bool, DomError> {
        let attributes = self.attributes_mut(key)?;
        let before = attributes.len();
        attributes.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
        Ok(attributes.len() != before)
    }

    pub fn property(&self, key: NodeKey, name: &str) -> Option<&Property> {
        self.record(key)
            .ok()?
            .properties
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v)
    }

    pub fn set_property(
        &mut self,
        key: NodeKey,
        name: &str,
        value: Property,
    ) -> Result<(), DomError> {
        let properties = &mut self.record_mut(key)?.properties;
        match properties.iter_mut().find(|(k, _)| k == name) {
            Some((_, v)) => *v = value,
            None => properties.push((name.to_string(), value)),
        }
        Ok(())
    }

    pub fn add_listener(
        &mut self,
        key: NodeKey,
        event: &str,
        listener: Listener,
    ) -> Result<(), DomError> {
        let listeners = &mut self.record_mut(key)?.listeners;
        if listeners
            .iter()
            .any(|(name, l)| name == event && l.ptr_eq(&listener))
        {
            return Ok(());
        }
        listeners.push((event.to_string(), listener));
        Ok(())
    }

    /// Returns whether the listener was attached.
    pub fn remove_listener(
        &mut self,
        key: NodeKey,
        event: &str,
        listener: &Listener,
    ) -> Result<bool, DomError> {
        let listeners = &mut self.record_mut(key)?.listeners;
        let before = listeners.len();
        listeners.retain(|(name, l)| !(name == event && l.ptr_eq(listener)));
        Ok(listeners.len() != before)
    }

    pub fn listener_count(&self, key: NodeKey, event: &str) -> usize {
        self.record(key)
            .map(|r| r.listeners.iter().filter(|(name, _)| name == event).count())
            .unwrap_or(0)
    }

    /// Invoke every listener registered for `event` on `key`, in registration order.
    /// Returns the number of listeners called.
    pub fn dispatch(&self, key: NodeKey, event: &str) -> usize {
        let Ok(record) = self.record(key) else {
            return 0;
        };
        let listeners: Vec<Listener> = record
            .listeners
            .iter()
            .filter(|(name, _)| name == event)
            .map(|(_, l)| l.clone())
            .collect();
        let payload = Event {
            name: event.to_string(),
            target: key,
        };
        log::trace!(target: "dom.event", "dispatch {event} to {key} ({} listeners)", listeners.len());
        for listener in &listeners {
            listener.call(&payload);
        }
        listeners.len()
    }

    /// Deep-clone a subtree of this document. The clone is detached; properties and
    /// listeners are not copied.
    pub fn clone_subtree(&mut self, key: NodeKey) -> Result<NodeKey, DomError> {
        let kind = self.record(key)?.kind.clone();
        let children = self.record(key)?.children.clone();
        let copy = self.insert_node(kind);
        for child in children {
            let child_copy = self.clone_subtree(child)?;
            self.attach(copy, child_copy, None)?;
        }
        Ok(copy)
    }

    /// Deep-copy a subtree of another document into this one (detached).
    pub fn import(&mut self, source: &Document, key: NodeKey) -> Result<NodeKey, DomError> {
        let record = source.record(key)?;
        let copy = self.insert_node(record.kind.clone());
        for child in &record.children {
            let child_copy = self.import(source, *child)?;
            self.attach(copy, child_copy, None)?;
        }
        Ok(copy)
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}
