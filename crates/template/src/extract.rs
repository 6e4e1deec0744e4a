//! Component and slot extraction.
//!
//! Runs over freshly parsed template content. Registered component elements and `slot`
//! elements are cut out of the tree, replaced by `$c<i>$` / `$s:<name>$` comments, and
//! their children become nested blocks. Afterwards every remaining element of a block
//! gets an [`AttrsDescriptor`], indexed by its position in a forward element walk.

use crate::cache::ComponentLookup;
use crate::descriptor::AttrsDescriptor;
use crate::error::TemplateError;
use crate::marker::{Marker, contains_value_hole, is_valid_slot_name};
use dom::{Document, NodeKey, TreeWalker, WhatToShow};
use std::collections::HashSet;

pub const DEFAULT_SLOT: &str = "default";

/// A unit of template content with its own element descriptors.
///
/// The root of a template is a block; so is the caller content written between a
/// component's tags, and so is the default content of each `slot`.
#[derive(Debug)]
pub struct Block {
    content: NodeKey,
    elements: Vec<AttrsDescriptor>,
    components: Vec<ComponentBlock>,
    slots: Vec<SlotBlock>,
}

#[derive(Debug)]
pub struct ComponentBlock {
    name: String,
    props: AttrsDescriptor,
    /// Literal `slot` attribute of the component element, when the component itself is
    /// caller content targeting a named slot.
    slot: Option<String>,
    children: Block,
}

#[derive(Debug)]
pub struct SlotBlock {
    name: String,
    fallback: Block,
}

impl Block {
    /// Fragment in the template document holding this block's nodes.
    pub fn content(&self) -> NodeKey {
        self.content
    }

    pub fn elements(&self) -> &[AttrsDescriptor] {
        &self.elements
    }

    pub fn components(&self) -> &[ComponentBlock] {
        &self.components
    }

    pub fn component(&self, index: usize) -> Option<&ComponentBlock> {
        self.components.get(index)
    }

    pub fn slots(&self) -> &[SlotBlock] {
        &self.slots
    }

    pub fn slot(&self, name: &str) -> Option<&SlotBlock> {
        self.slots.iter().find(|slot| slot.name == name)
    }

    /// Every hole referenced from this block and the blocks nested in it.
    pub(crate) fn collect_holes(&self, doc: &Document, holes: &mut Vec<usize>) {
        for descriptor in &self.elements {
            holes.extend(descriptor.hole_positions().map(|(_, hole)| hole));
        }
        let mut walker = TreeWalker::new(self.content, WhatToShow::COMMENT);
        while let Some(node) = walker.next_node(doc) {
            if let Some(Marker::Value(hole)) = doc.character_data(node).and_then(Marker::parse) {
                holes.push(hole);
            }
        }
        for component in &self.components {
            holes.extend(component.props.hole_positions().map(|(_, hole)| hole));
            component.children.collect_holes(doc, holes);
        }
        for slot in &self.slots {
            slot.fallback.collect_holes(doc, holes);
        }
    }
}

impl ComponentBlock {
    /// Registered tag name, lowercase.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn props(&self) -> &AttrsDescriptor {
        &self.props
    }

    pub fn slot(&self) -> Option<&str> {
        self.slot.as_deref()
    }

    /// Caller content written between the component's tags.
    pub fn children(&self) -> &Block {
        &self.children
    }
}

impl SlotBlock {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fallback(&self) -> &Block {
        &self.fallback
    }
}

pub(crate) struct Extractor<'a> {
    doc: &'a mut Document,
    components: &'a dyn ComponentLookup,
    slot_names: HashSet<String>,
}

impl<'a> Extractor<'a> {
    pub(crate) fn new(doc: &'a mut Document, components: &'a dyn ComponentLookup) -> Self {
        Self {
            doc,
            components,
            slot_names: HashSet::new(),
        }
    }

    pub(crate) fn extract(&mut self, content: NodeKey) -> Result<Block, TemplateError> {
        let mut components = Vec::new();
        let mut slots = Vec::new();
        self.visit(content, &mut components, &mut slots)?;

        let mut elements = Vec::new();
        let mut walker = TreeWalker::new(content, WhatToShow::ELEMENT);
        while let Some(element) = walker.next_node(self.doc) {
            elements.push(AttrsDescriptor::extract(self.doc, element)?);
        }
        Ok(Block {
            content,
            elements,
            components,
            slots,
        })
    }

    fn visit(
        &mut self,
        parent: NodeKey,
        components: &mut Vec<ComponentBlock>,
        slots: &mut Vec<SlotBlock>,
    ) -> Result<(), TemplateError> {
        let children = self.doc.children(parent).to_vec();
        for child in children.into_iter().rev() {
            let Some(name) = self.doc.tag_name(child).map(str::to_string) else {
                continue;
            };
            if self.components.is_component(&name) {
                let block = self.component(child, name, components.len())?;
                components.push(block);
            } else if name == "slot" {
                slots.push(self.slot(child)?);
            } else {
                self.visit(child, components, slots)?;
            }
        }
        Ok(())
    }

    fn component(
        &mut self,
        element: NodeKey,
        name: String,
        index: usize,
    ) -> Result<ComponentBlock, TemplateError> {
        log::trace!(target: "template.extract", "component <{name}> -> {}", Marker::Component(index));
        let props = AttrsDescriptor::from_element(self.doc, element)?;
        let slot = self
            .doc
            .get_attribute(element, "slot")
            .filter(|slot| !contains_value_hole(slot))
            .map(str::to_string);
        let content = self.take_children(element)?;
        let children = self.extract(content)?;
        self.replace_with_marker(element, Marker::Component(index))?;
        Ok(ComponentBlock {
            name,
            props,
            slot,
            children,
        })
    }

    fn slot(&mut self, element: NodeKey) -> Result<SlotBlock, TemplateError> {
        let name = match self.doc.get_attribute(element, "name") {
            None | Some("") => DEFAULT_SLOT.to_string(),
            Some(name) if contains_value_hole(name) => return Err(TemplateError::SlotNameIsHole),
            Some(name) if !is_valid_slot_name(name) => {
                return Err(TemplateError::InvalidSlotName(name.to_string()));
            }
            Some(name) => name.to_string(),
        };
        if !self.slot_names.insert(name.clone()) {
            return Err(TemplateError::DuplicateSlot(name));
        }
        log::trace!(target: "template.extract", "slot {name:?}");
        let content = self.take_children(element)?;
        let fallback = self.extract(content)?;
        self.replace_with_marker(element, Marker::Slot(name.clone()))?;
        Ok(SlotBlock { name, fallback })
    }

    fn take_children(&mut self, element: NodeKey) -> Result<NodeKey, TemplateError> {
        let fragment = self.doc.create_fragment();
        for child in self.doc.children(element).to_vec() {
            self.doc.append_child(fragment, child)?;
        }
        Ok(fragment)
    }

    fn replace_with_marker(&mut self, element: NodeKey, marker: Marker) -> Result<(), TemplateError> {
        let parent = self.doc.parent(element).ok_or(dom::DomError::MissingNode(element))?;
        let comment = self.doc.create_comment(&marker.to_string());
        self.doc.insert_before(parent, comment, element)?;
        self.doc.remove(element)?;
        Ok(())
    }
}
