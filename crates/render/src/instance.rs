//! Template instances: one live copy of a compiled template bound to value holes.
//!
//! Construction imports the template content into the target document and walks it
//! once (elements and comments) to record a binding per hole. Component markers bind
//! the caller content and queue a partial; slot markers receive caller content or a
//! bound copy of their default content. Components and slots resolve exactly once per
//! instance; later `set_values` calls only touch bindings.

use crate::cycle::{ElementState, SetValuesCycle, flatten_props};
use crate::engine::Engine;
use crate::error::RenderError;
use crate::fragment::NodeFragment;
use crate::result::{SlotContent, TemplateResult};
use crate::value::Value;
use dom::{Document, DomError, Listener, NodeKey, NodeKind, TreeWalker, WhatToShow};
use std::fmt;
use std::rc::Rc;
use template::{
    AttrEntry, AttrsDescriptor, Block, ComponentBlock, DEFAULT_SLOT, Marker, SourceId, Template,
};

pub struct TemplateInstance {
    template: Rc<Template>,
    /// Holds the instance nodes until they are mounted.
    content: NodeKey,
    /// Top-level nodes right after binding, anchors included.
    top: Vec<NodeKey>,
    slots: Option<Rc<SlotContent>>,
    bindings: Vec<Option<Binding>>,
    elements: Vec<ElementState>,
    partials: Vec<Partial>,
}

#[derive(Debug)]
enum Binding {
    /// Hole inside an attribute or spread of `elements[element]`.
    Attr { element: usize },
    /// `on*=${f}`: listener swapped directly, previous one detached first.
    Handler {
        node: NodeKey,
        event: String,
        current: Option<Listener>,
    },
    /// Hole between nodes, realized before `anchor`.
    Node {
        anchor: NodeKey,
        fragment: NodeFragment,
    },
    /// Hole in the props of `partials[partial]`.
    Prop { partial: usize },
}

/// A component use waiting to be resolved at its marker.
#[derive(Debug)]
struct Partial {
    marker: NodeKey,
    name: String,
    props: AttrsDescriptor,
    /// Fragment holding the bound caller content.
    caller: NodeKey,
    /// Top-level caller nodes as bound; anything else found later was realized by a hole.
    caller_statics: Vec<NodeKey>,
    /// Literal `slot` target of each component nested directly in the caller content.
    nested_targets: Vec<Option<String>>,
    /// Caller content grouped by slot, captured on first resolution.
    slots: Option<Rc<SlotContent>>,
    fragment: NodeFragment,
}

impl TemplateInstance {
    /// Compile (or fetch) the result's template and bind a fresh copy of it in `doc`.
    /// The instance is unmounted and has no values yet; call
    /// [`set_values`](Self::set_values) and [`mount`](Self::mount).
    pub fn new(
        doc: &mut Document,
        engine: &Engine,
        result: &TemplateResult,
    ) -> Result<Self, RenderError> {
        Self::build(doc, engine, result, None)
    }

    pub(crate) fn build(
        doc: &mut Document,
        engine: &Engine,
        result: &TemplateResult,
        inherited: Option<&Rc<SlotContent>>,
    ) -> Result<Self, RenderError> {
        let template = engine.template(result.source())?;
        check_value_count(&template, result.values())?;
        let content = doc.import(template.document(), template.root().content())?;
        let mut instance = TemplateInstance {
            template: Rc::clone(&template),
            content,
            top: Vec::new(),
            slots: result.slots().or(inherited).cloned(),
            bindings: (0..template.hole_count()).map(|_| None).collect(),
            elements: Vec::new(),
            partials: Vec::new(),
        };
        instance.bind_block(doc, engine, &template, template.root(), content)?;
        instance.top = doc.children(content).to_vec();
        log::debug!(
            target: "render.instance",
            "bound {:?}: {} holes, {} elements, {} partials",
            template.id(),
            instance.bindings.len(),
            instance.elements.len(),
            instance.partials.len(),
        );
        Ok(instance)
    }

    pub fn template(&self) -> &Rc<Template> {
        &self.template
    }

    pub fn template_id(&self) -> SourceId {
        self.template.id()
    }

    /// Run one reconciliation cycle: bindings in hole order, then attribute commit,
    /// then component resolution.
    pub fn set_values(
        &mut self,
        doc: &mut Document,
        engine: &Engine,
        values: &[Value],
    ) -> Result<(), RenderError> {
        check_value_count(&self.template, values)?;
        let mut cycle = SetValuesCycle::default();
        let slots = self.slots.clone();
        for (binding, value) in self.bindings.iter_mut().zip(values) {
            match binding {
                None | Some(Binding::Prop { .. }) => {}
                Some(Binding::Attr { element }) => cycle.touch(*element),
                Some(Binding::Handler {
                    node,
                    event,
                    current,
                }) => swap_handler(doc, *node, event, current, value)?,
                Some(Binding::Node { anchor, fragment }) => {
                    fragment.reconcile(doc, engine, *anchor, value, slots.as_ref())?
                }
            }
        }
        cycle.commit(doc, engine.config(), &mut self.elements, values)?;
        self.resolve_partials(doc, engine, values)
    }

    /// Move the instance nodes under `parent`, before `before` or at the end.
    pub fn mount(
        &mut self,
        doc: &mut Document,
        parent: NodeKey,
        before: Option<NodeKey>,
    ) -> Result<(), RenderError> {
        if !doc.contains(self.content) {
            return Ok(());
        }
        match before {
            Some(before) => doc.insert_before(parent, self.content, before)?,
            None => doc.append_child(parent, self.content)?,
        }
        doc.remove(self.content)?;
        Ok(())
    }

    /// The instance's top-level nodes in document order, including nodes realized
    /// in front of top-level anchors.
    pub fn nodes(&self, doc: &Document) -> Vec<NodeKey> {
        let Some(&last) = self.top.last() else {
            return Vec::new();
        };
        let first = self.first_node(doc).unwrap_or(last);
        let Some(parent) = doc.parent(last) else {
            return self.top.clone();
        };
        let siblings = doc.children(parent);
        let start = siblings.iter().position(|k| *k == first);
        let end = siblings.iter().position(|k| *k == last);
        match (start, end) {
            (Some(start), Some(end)) if start <= end => siblings[start..=end].to_vec(),
            _ => self.top.clone(),
        }
    }

    pub(crate) fn slots(&self) -> Option<&Rc<SlotContent>> {
        self.slots.as_ref()
    }

    /// Destroy the caller fragments this instance and its nested instances hold. Runs
    /// once the instance's mounted nodes are gone.
    pub(crate) fn release(&self, doc: &mut Document) -> Result<(), RenderError> {
        for binding in self.bindings.iter().flatten() {
            if let Binding::Node { fragment, .. } = binding {
                fragment.release(doc)?;
            }
        }
        for partial in &self.partials {
            partial.fragment.release(doc)?;
            if doc.contains(partial.caller) {
                doc.remove(partial.caller)?;
            }
        }
        Ok(())
    }

    /// Push the caller fragments of this instance's partials and of every nested instance.
    pub(crate) fn collect_callers(&self, out: &mut Vec<NodeKey>) {
        for binding in self.bindings.iter().flatten() {
            if let Binding::Node { fragment, .. } = binding {
                fragment.collect_callers(out);
            }
        }
        for partial in &self.partials {
            out.push(partial.caller);
            partial.fragment.collect_callers(out);
        }
    }

    pub(crate) fn first_node(&self, doc: &Document) -> Option<NodeKey> {
        let first = *self.top.first()?;
        self.fragment_at(first)
            .and_then(|fragment| fragment.first_node(doc))
            .or(Some(first))
    }

    fn fragment_at(&self, anchor: NodeKey) -> Option<&NodeFragment> {
        self.bindings
            .iter()
            .find_map(|binding| match binding {
                Some(Binding::Node { anchor: a, fragment }) if *a == anchor => Some(fragment),
                _ => None,
            })
            .or_else(|| {
                self.partials
                    .iter()
                    .find(|partial| partial.marker == anchor)
                    .map(|partial| &partial.fragment)
            })
    }

    fn set_binding(&mut self, hole: usize, binding: Binding) {
        if let Some(slot) = self.bindings.get_mut(hole) {
            *slot = Some(binding);
        }
    }

    fn bind_block(
        &mut self,
        doc: &mut Document,
        engine: &Engine,
        template: &Template,
        block: &Block,
        content: NodeKey,
    ) -> Result<(), RenderError> {
        let mut walker = TreeWalker::new(content, WhatToShow::ELEMENT.union(WhatToShow::COMMENT));
        let mut ordinal = 0;
        while let Some(node) = walker.next_node(doc) {
            if doc.is_element(node) {
                if let Some(descriptor) = block.elements().get(ordinal) {
                    if descriptor.has_holes() {
                        self.bind_element(doc, engine, node, descriptor)?;
                    }
                }
                ordinal += 1;
                continue;
            }
            let marker = doc.character_data(node).and_then(Marker::parse);
            match marker {
                Some(Marker::Value(hole)) => self.set_binding(
                    hole,
                    Binding::Node {
                        anchor: node,
                        fragment: NodeFragment::default(),
                    },
                ),
                Some(Marker::Component(index)) => {
                    if let Some(component) = block.component(index) {
                        self.bind_component(doc, engine, template, component, node)?;
                    }
                }
                Some(Marker::Slot(name)) => {
                    self.bind_slot(doc, engine, template, block, &name, node)?;
                }
                None => {}
            }
        }
        Ok(())
    }

    fn bind_element(
        &mut self,
        doc: &mut Document,
        engine: &Engine,
        node: NodeKey,
        descriptor: &AttrsDescriptor,
    ) -> Result<(), RenderError> {
        let element = self.elements.len();
        for entry in descriptor.entries() {
            match entry {
                AttrEntry::Static { .. } => {}
                AttrEntry::Handler { name, event, hole } => {
                    doc.remove_attribute(node, name)?;
                    self.set_binding(
                        *hole,
                        Binding::Handler {
                            node,
                            event: event.clone(),
                            current: None,
                        },
                    );
                }
                other => {
                    for hole in other.holes() {
                        self.set_binding(hole, Binding::Attr { element });
                    }
                }
            }
        }
        self.elements
            .push(ElementState::new(node, descriptor.clone(), engine.config()));
        Ok(())
    }

    fn bind_component(
        &mut self,
        doc: &mut Document,
        engine: &Engine,
        template: &Template,
        component: &ComponentBlock,
        marker: NodeKey,
    ) -> Result<(), RenderError> {
        let caller = doc.import(template.document(), component.children().content())?;
        self.bind_block(doc, engine, template, component.children(), caller)?;
        let partial = self.partials.len();
        for (_, hole) in component.props().hole_positions() {
            self.set_binding(hole, Binding::Prop { partial });
        }
        self.partials.push(Partial {
            marker,
            name: component.name().to_string(),
            props: component.props().clone(),
            caller,
            caller_statics: doc.children(caller).to_vec(),
            nested_targets: component
                .children()
                .components()
                .iter()
                .map(|nested| nested.slot().map(str::to_string))
                .collect(),
            slots: None,
            fragment: NodeFragment::default(),
        });
        Ok(())
    }

    fn bind_slot(
        &mut self,
        doc: &mut Document,
        engine: &Engine,
        template: &Template,
        block: &Block,
        name: &str,
        marker: NodeKey,
    ) -> Result<(), RenderError> {
        let parent = doc.parent(marker).ok_or(DomError::MissingNode(marker))?;
        let provided = self
            .slots
            .as_ref()
            .and_then(|slots| slots.get(name))
            .map(<[NodeKey]>::to_vec);
        if let Some(nodes) = provided {
            log::trace!(target: "render.instance", "slot {name:?}: {} caller nodes", nodes.len());
            for node in nodes {
                if doc.contains(node) {
                    doc.insert_before(parent, node, marker)?;
                }
            }
            return Ok(());
        }
        let Some(slot) = block.slot(name) else {
            return Ok(());
        };
        let fallback = doc.import(template.document(), slot.fallback().content())?;
        self.bind_block(doc, engine, template, slot.fallback(), fallback)?;
        doc.insert_before(parent, fallback, marker)?;
        doc.remove(fallback)?;
        Ok(())
    }

    fn resolve_partials(
        &mut self,
        doc: &mut Document,
        engine: &Engine,
        values: &[Value],
    ) -> Result<(), RenderError> {
        for partial in &mut self.partials {
            let props = flatten_props(&partial.props, values, engine.config())?;
            let component = engine
                .components()
                .get(&partial.name)
                .ok_or_else(|| RenderError::UnknownComponent(partial.name.clone()))?;
            let mut result = component(&props);
            let slots = match &partial.slots {
                Some(slots) => Rc::clone(slots),
                None => {
                    let slots = Rc::new(partial.group_caller_content(doc));
                    partial.slots = Some(Rc::clone(&slots));
                    slots
                }
            };
            result.attach_slots(slots);
            log::trace!(target: "render.instance", "resolve <{}> at {}", partial.name, partial.marker);
            partial
                .fragment
                .reconcile(doc, engine, partial.marker, &Value::Result(result), None)?;
        }
        Ok(())
    }
}

impl Partial {
    /// Group the caller's top-level nodes by target slot: an element's `slot` attribute,
    /// a nested component's literal `slot`, otherwise the default slot. Whitespace-only
    /// text is dropped. Nodes realized by a hole follow the anchor they precede.
    fn group_caller_content(&self, doc: &Document) -> SlotContent {
        let mut content = SlotContent::new(self.caller);
        let mut pending = Vec::new();
        for &node in doc.children(self.caller) {
            if !self.caller_statics.contains(&node) {
                pending.push(node);
                continue;
            }
            let target = match doc.kind(node) {
                Some(NodeKind::Element { .. }) => doc
                    .get_attribute(node, "slot")
                    .filter(|slot| !slot.is_empty())
                    .unwrap_or(DEFAULT_SLOT),
                Some(NodeKind::Text { text }) if text.trim().is_empty() => continue,
                Some(NodeKind::Comment { text }) => match Marker::parse(text) {
                    Some(Marker::Component(index)) => self
                        .nested_targets
                        .get(index)
                        .and_then(Option::as_deref)
                        .unwrap_or(DEFAULT_SLOT),
                    _ => DEFAULT_SLOT,
                },
                _ => DEFAULT_SLOT,
            };
            for realized in pending.drain(..) {
                content.push(target, realized);
            }
            content.push(target, node);
        }
        for realized in pending {
            content.push(DEFAULT_SLOT, realized);
        }
        content
    }
}

fn check_value_count(template: &Template, values: &[Value]) -> Result<(), RenderError> {
    if values.len() != template.hole_count() {
        return Err(RenderError::ValueCount {
            expected: template.hole_count(),
            found: values.len(),
        });
    }
    Ok(())
}

fn swap_handler(
    doc: &mut Document,
    node: NodeKey,
    event: &str,
    current: &mut Option<Listener>,
    value: &Value,
) -> Result<(), RenderError> {
    let next = match value {
        Value::Handler(listener) => Some(listener),
        Value::Null => None,
        other => {
            return Err(RenderError::UnsupportedAttrValue {
                name: format!("on{event}"),
                kind: other.kind(),
            });
        }
    };
    if current.as_ref() == next {
        return Ok(());
    }
    if let Some(old) = current.take() {
        doc.remove_listener(node, event, &old)?;
    }
    if let Some(listener) = next {
        doc.add_listener(node, event, listener.clone())?;
        *current = Some(listener.clone());
    }
    Ok(())
}

impl fmt::Debug for TemplateInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TemplateInstance")
            .field("template", &self.template.id())
            .field("top", &self.top)
            .field("bindings", &self.bindings)
            .field("elements", &self.elements.len())
            .field("partials", &self.partials)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::html;

    fn pair(a: &str, b: &str) -> TemplateResult {
        html!("<p>" {a} "</p><i>" {b} "</i>")
    }

    #[test]
    fn binds_mounts_and_lists_nodes() {
        let engine = Engine::new();
        let mut doc = Document::new();
        let body = doc.create_element("body");
        let result = pair("x", "y");
        let mut instance = TemplateInstance::new(&mut doc, &engine, &result).unwrap();
        instance.set_values(&mut doc, &engine, result.values()).unwrap();
        instance.mount(&mut doc, body, None).unwrap();

        assert_eq!(doc.text_content(body), "xy");
        assert_eq!(instance.nodes(&doc), doc.children(body));
        assert!(!doc.contains(instance.content));
    }

    #[test]
    fn nodes_include_values_realized_at_the_top() {
        let engine = Engine::new();
        let mut doc = Document::new();
        let body = doc.create_element("body");
        let tail = doc.create_comment("tail");
        doc.append_child(body, tail).unwrap();

        let result = html!("" {vec!["a", "b"]} "<b>c</b>");
        let mut instance = TemplateInstance::new(&mut doc, &engine, &result).unwrap();
        instance.set_values(&mut doc, &engine, result.values()).unwrap();
        instance.mount(&mut doc, body, Some(tail)).unwrap();

        let nodes = instance.nodes(&doc);
        assert_eq!(nodes.len(), 4);
        assert_eq!(doc.character_data(nodes[0]), Some("a"));
        assert_eq!(doc.children(body).last(), Some(&tail));
    }

    #[test]
    fn rejects_wrong_value_count() {
        let engine = Engine::new();
        let mut doc = Document::new();
        let result = pair("x", "y");
        let mut instance = TemplateInstance::new(&mut doc, &engine, &result).unwrap();
        assert_eq!(
            instance.set_values(&mut doc, &engine, &["only".into()]),
            Err(RenderError::ValueCount {
                expected: 2,
                found: 1
            })
        );
    }
}
