//! Per-element attribute descriptors.
//!
//! A descriptor lists an element's attributes in source order. Static entries keep
//! their literal text; every other entry references one or more value holes by global
//! index. When a descriptor is flattened at commit time, later entries win over earlier
//! ones for the same name, so a spread placed after `class="x"` can override it.

use crate::error::TemplateError;
use crate::marker::{AttrPart, split_value_holes};
use dom::{Document, NodeKey};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AttrEntry {
    /// Literal attribute; `None` for a valueless attribute like `disabled`.
    Static { name: String, value: Option<String> },
    /// `name=${v}`: the whole value is one hole.
    Value { name: String, hole: usize },
    /// `name="a ${v} b ${w}"`: literal text mixed with holes.
    Interpolated { name: String, parts: Vec<AttrPart> },
    /// `onclick=${f}`: event listener hole. `event` is the name without `on`.
    Handler {
        name: String,
        event: String,
        hole: usize,
    },
    /// `<div ${props}>`: the hole supplies a whole name/value map.
    Spread { hole: usize },
}

impl AttrEntry {
    pub fn name(&self) -> Option<&str> {
        match self {
            AttrEntry::Static { name, .. }
            | AttrEntry::Value { name, .. }
            | AttrEntry::Interpolated { name, .. }
            | AttrEntry::Handler { name, .. } => Some(name),
            AttrEntry::Spread { .. } => None,
        }
    }

    pub fn holes(&self) -> Vec<usize> {
        match self {
            AttrEntry::Static { .. } => Vec::new(),
            AttrEntry::Value { hole, .. }
            | AttrEntry::Handler { hole, .. }
            | AttrEntry::Spread { hole } => vec![*hole],
            AttrEntry::Interpolated { parts, .. } => parts
                .iter()
                .filter_map(|part| match part {
                    AttrPart::Hole(hole) => Some(*hole),
                    AttrPart::Literal(_) => None,
                })
                .collect(),
        }
    }

    fn is_handler(&self) -> bool {
        matches!(self, AttrEntry::Handler { .. })
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AttrsDescriptor {
    entries: Vec<AttrEntry>,
}

impl AttrsDescriptor {
    pub fn new(entries: Vec<AttrEntry>) -> Self {
        Self { entries }
    }

    /// Describe the attributes of `element` as parsed from marked-up markup.
    pub fn from_element(doc: &Document, element: NodeKey) -> Result<Self, TemplateError> {
        let mut entries = Vec::new();
        for (name, value) in doc.attributes(element) {
            entries.push(classify(name, value.as_deref())?);
        }
        Ok(Self { entries })
    }

    /// Build the descriptor and remove every hole-bearing attribute from the template
    /// element, except handler attributes, which instances drop when they bind.
    pub(crate) fn extract(doc: &mut Document, element: NodeKey) -> Result<Self, TemplateError> {
        let descriptor = Self::from_element(doc, element)?;
        let dynamic: Vec<String> = doc
            .attributes(element)
            .iter()
            .zip(&descriptor.entries)
            .filter(|(_, entry)| !matches!(entry, AttrEntry::Static { .. }) && !entry.is_handler())
            .map(|((name, _), _)| name.clone())
            .collect();
        for name in dynamic {
            doc.remove_attribute(element, &name)?;
        }
        Ok(descriptor)
    }

    pub fn entries(&self) -> &[AttrEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether any entry references a hole.
    pub fn has_holes(&self) -> bool {
        self.entries
            .iter()
            .any(|entry| !matches!(entry, AttrEntry::Static { .. }))
    }

    /// `(entry index, hole index)` for every hole, in entry order.
    pub fn hole_positions(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.entries
            .iter()
            .enumerate()
            .flat_map(|(index, entry)| entry.holes().into_iter().map(move |hole| (index, hole)))
    }
}

fn classify(name: &str, value: Option<&str>) -> Result<AttrEntry, TemplateError> {
    let name_parts = split_value_holes(name);
    match name_parts.as_slice() {
        [AttrPart::Hole(hole)] => return Ok(AttrEntry::Spread { hole: *hole }),
        [AttrPart::Literal(_)] => {}
        _ => return Err(TemplateError::AttributeNameHole(name.to_string())),
    }

    let Some(value) = value else {
        return Ok(AttrEntry::Static {
            name: name.to_string(),
            value: None,
        });
    };
    let parts = split_value_holes(value);
    if !parts.iter().any(|part| matches!(part, AttrPart::Hole(_))) {
        return Ok(AttrEntry::Static {
            name: name.to_string(),
            value: Some(value.to_string()),
        });
    }

    if let Some(event) = name.strip_prefix("on") {
        return match parts.as_slice() {
            [AttrPart::Hole(hole)] => Ok(AttrEntry::Handler {
                name: name.to_string(),
                event: event.to_string(),
                hole: *hole,
            }),
            _ => Err(TemplateError::HandlerInterpolation(name.to_string())),
        };
    }
    match parts.as_slice() {
        [AttrPart::Hole(hole)] => Ok(AttrEntry::Value {
            name: name.to_string(),
            hole: *hole,
        }),
        _ => Ok(AttrEntry::Interpolated {
            name: name.to_string(),
            parts,
        }),
    }
}
