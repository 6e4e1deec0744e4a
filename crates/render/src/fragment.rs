//! Reconciles node-position values in front of an anchor comment.
//!
//! A fragment remembers one realized child per list item. Children whose shape still
//! matches the new value are updated in place, so their nodes keep their identity.
//! Text values share one shape; template results share a shape only when they come
//! from the same source. The anchor is never moved or removed.

use crate::engine::Engine;
use crate::error::RenderError;
use crate::instance::TemplateInstance;
use crate::result::SlotContent;
use crate::value::{Value, escape_text};
use dom::{Document, DomError, NodeKey};
use std::rc::Rc;

#[derive(Debug, Default)]
pub struct NodeFragment {
    children: Vec<RealizedChild>,
}

#[derive(Debug)]
enum RealizedChild {
    /// `text` is the escaped character data currently in the document.
    Text { node: NodeKey, text: String },
    Instance(Box<TemplateInstance>),
}

impl NodeFragment {
    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Bring the nodes before `anchor` in line with `value`. `inherited` is the slot
    /// content of the instance that owns the anchor; nested results without their own
    /// slot content resolve their slots against it.
    pub(crate) fn reconcile(
        &mut self,
        doc: &mut Document,
        engine: &Engine,
        anchor: NodeKey,
        value: &Value,
        inherited: Option<&Rc<SlotContent>>,
    ) -> Result<(), RenderError> {
        let items: &[Value] = match value {
            Value::List(items) => items,
            single => std::slice::from_ref(single),
        };
        for item in items {
            check_node_value(item)?;
        }
        let parent = doc.parent(anchor).ok_or(DomError::MissingNode(anchor))?;

        for (index, item) in items.iter().enumerate() {
            match self.children.get(index).map(|child| child.same_shape(item)) {
                Some(true) => self.children[index].update(doc, engine, item)?,
                Some(false) => {
                    let mut next = RealizedChild::build(doc, engine, item, inherited)?;
                    let before = self.insertion_point(doc, index).unwrap_or(anchor);
                    next.mount(doc, parent, before)?;
                    let keep = next.mounted_nodes(doc);
                    let old = std::mem::replace(&mut self.children[index], next);
                    log::trace!(target: "render.fragment", "replace child {index} at {anchor}");
                    old.unmount(doc, &keep)?;
                }
                None => {
                    let mut next = RealizedChild::build(doc, engine, item, inherited)?;
                    next.mount(doc, parent, anchor)?;
                    self.children.push(next);
                }
            }
        }

        if self.children.len() > items.len() {
            log::trace!(
                target: "render.fragment",
                "drop {} children at {anchor}",
                self.children.len() - items.len()
            );
            for old in self.children.split_off(items.len()) {
                old.unmount(doc, &[])?;
            }
        }
        Ok(())
    }

    /// Remove every realized node. The fragment can be reconciled again afterwards.
    pub(crate) fn clear(&mut self, doc: &mut Document) -> Result<(), RenderError> {
        for old in std::mem::take(&mut self.children) {
            old.unmount(doc, &[])?;
        }
        Ok(())
    }

    /// Destroy the detached caller fragments owned by nested instances.
    pub(crate) fn release(&self, doc: &mut Document) -> Result<(), RenderError> {
        for child in &self.children {
            if let RealizedChild::Instance(instance) = child {
                instance.release(doc)?;
            }
        }
        Ok(())
    }

    pub(crate) fn collect_callers(&self, out: &mut Vec<NodeKey>) {
        for child in &self.children {
            if let RealizedChild::Instance(instance) = child {
                instance.collect_callers(out);
            }
        }
    }

    pub(crate) fn first_node(&self, doc: &Document) -> Option<NodeKey> {
        self.children.iter().find_map(|child| child.first_node(doc))
    }

    fn insertion_point(&self, doc: &Document, index: usize) -> Option<NodeKey> {
        self.children[index..]
            .iter()
            .find_map(|child| child.first_node(doc))
    }
}

fn check_node_value(value: &Value) -> Result<(), RenderError> {
    match value {
        Value::Null | Value::Bool(_) | Value::Number(_) | Value::Text(_) | Value::Result(_) => Ok(()),
        Value::Handler(_) | Value::Props(_) | Value::List(_) => {
            Err(RenderError::UnsupportedNodeValue(value.kind()))
        }
    }
}

impl RealizedChild {
    fn build(
        doc: &mut Document,
        engine: &Engine,
        value: &Value,
        inherited: Option<&Rc<SlotContent>>,
    ) -> Result<Self, RenderError> {
        if let Value::Result(result) = value {
            let mut instance = TemplateInstance::build(doc, engine, result, inherited)?;
            instance.set_values(doc, engine, result.values())?;
            return Ok(RealizedChild::Instance(Box::new(instance)));
        }
        let text = node_text(value)?;
        let node = doc.create_text(&text);
        Ok(RealizedChild::Text { node, text })
    }

    fn same_shape(&self, value: &Value) -> bool {
        match (self, value) {
            (RealizedChild::Text { .. }, value) => value.as_text().is_some(),
            (RealizedChild::Instance(instance), Value::Result(result)) => {
                instance.template_id() == result.id()
            }
            (RealizedChild::Instance(_), _) => false,
        }
    }

    fn update(&mut self, doc: &mut Document, engine: &Engine, value: &Value) -> Result<(), RenderError> {
        match self {
            RealizedChild::Text { node, text } => {
                let next = node_text(value)?;
                if *text != next {
                    doc.set_character_data(*node, &next)?;
                    *text = next;
                }
                Ok(())
            }
            RealizedChild::Instance(instance) => match value {
                Value::Result(result) => instance.set_values(doc, engine, result.values()),
                other => Err(RenderError::UnsupportedNodeValue(other.kind())),
            },
        }
    }

    fn mount(&mut self, doc: &mut Document, parent: NodeKey, before: NodeKey) -> Result<(), RenderError> {
        match self {
            RealizedChild::Text { node, .. } => Ok(doc.insert_before(parent, *node, before)?),
            RealizedChild::Instance(instance) => instance.mount(doc, parent, Some(before)),
        }
    }

    fn first_node(&self, doc: &Document) -> Option<NodeKey> {
        match self {
            RealizedChild::Text { node, .. } => Some(*node),
            RealizedChild::Instance(instance) => instance.first_node(doc),
        }
    }

    fn mounted_nodes(&self, doc: &Document) -> Vec<NodeKey> {
        match self {
            RealizedChild::Text { node, .. } => vec![*node],
            RealizedChild::Instance(instance) => instance.nodes(doc),
        }
    }

    /// Destroy the mounted nodes, except those in `keep` (nodes a replacement child has
    /// already taken over). Caller content slotted inside them is parked back in its
    /// home fragment instead of being destroyed.
    fn unmount(self, doc: &mut Document, keep: &[NodeKey]) -> Result<(), RenderError> {
        let nodes = self.mounted_nodes(doc);
        let mut parked = Vec::new();
        if let RealizedChild::Instance(instance) = &self {
            if let Some(slots) = instance.slots() {
                let mut roots = nodes.clone();
                instance.collect_callers(&mut roots);
                parked = park_slot_content(doc, slots, &roots, keep)?;
            }
        }
        for node in nodes {
            if !keep.contains(&node) && !parked.contains(&node) && doc.contains(node) {
                doc.remove(node)?;
            }
        }
        if let RealizedChild::Instance(instance) = &self {
            instance.release(doc)?;
        }
        Ok(())
    }
}

/// Move every captured slot node that sits at or below one of `roots` back into the
/// slot content's home fragment. Returns the moved nodes.
fn park_slot_content(
    doc: &mut Document,
    slots: &SlotContent,
    roots: &[NodeKey],
    keep: &[NodeKey],
) -> Result<Vec<NodeKey>, RenderError> {
    let home = slots.home();
    if !doc.contains(home) {
        return Ok(Vec::new());
    }
    let mut parked = Vec::new();
    for node in slots.nodes() {
        let movable = doc.contains(node)
            && doc.parent(node) != Some(home)
            && !keep.contains(&node)
            && is_within(doc, node, roots);
        if !movable {
            continue;
        }
        doc.append_child(home, node)?;
        parked.push(node);
    }
    if !parked.is_empty() {
        log::trace!(target: "render.fragment", "parked {} slotted nodes in {home}", parked.len());
    }
    Ok(parked)
}

fn is_within(doc: &Document, node: NodeKey, roots: &[NodeKey]) -> bool {
    let mut current = Some(node);
    while let Some(key) = current {
        if roots.contains(&key) {
            return true;
        }
        current = doc.parent(key);
    }
    false
}

fn node_text(value: &Value) -> Result<String, RenderError> {
    let text = value
        .as_text()
        .ok_or(RenderError::UnsupportedNodeValue(value.kind()))?;
    Ok(escape_text(&text).into_owned())
}
