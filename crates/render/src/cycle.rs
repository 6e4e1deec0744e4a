//! Attribute merge and commit for one `set_values` call.
//!
//! Every element with holes is flattened from its descriptor and the current values
//! into an ordered name/value map (later entries win), compared with the map kept from
//! the previous cycle, and only differing names are written to the document. Names
//! that disappeared since the previous cycle are removed.

use crate::engine::EngineConfig;
use crate::error::RenderError;
use crate::value::{Props, Value};
use dom::{Document, NodeKey, Property};
use template::{AttrEntry, AttrPart, AttrsDescriptor};

/// Flattened attribute state of one element.
pub(crate) type AttrMap = Props;

/// Binding state of one element that has hole-bearing attributes.
#[derive(Debug)]
pub(crate) struct ElementState {
    pub(crate) node: NodeKey,
    pub(crate) descriptor: AttrsDescriptor,
    /// What the document currently reflects. Seeded with the static attributes so the
    /// first commit leaves them alone.
    pub(crate) baseline: AttrMap,
}

impl ElementState {
    pub(crate) fn new(node: NodeKey, descriptor: AttrsDescriptor, config: &EngineConfig) -> Self {
        let mut baseline = AttrMap::new();
        for entry in descriptor.entries() {
            if let AttrEntry::Static { name, value } = entry {
                baseline.insert(name.as_str(), static_value(name, value.as_deref(), config));
            }
        }
        Self {
            node,
            descriptor,
            baseline,
        }
    }
}

/// Elements touched during one cycle, in first-touch order.
#[derive(Debug, Default)]
pub(crate) struct SetValuesCycle {
    touched: Vec<usize>,
}

impl SetValuesCycle {
    pub(crate) fn touch(&mut self, element: usize) {
        if !self.touched.contains(&element) {
            self.touched.push(element);
        }
    }

    pub(crate) fn commit(
        self,
        doc: &mut Document,
        config: &EngineConfig,
        elements: &mut [ElementState],
        values: &[Value],
    ) -> Result<(), RenderError> {
        for index in self.touched {
            let Some(state) = elements.get_mut(index) else {
                continue;
            };
            let next = flatten(&state.descriptor, values, config)?;
            commit_element(doc, config, state.node, &state.baseline, &next)?;
            state.baseline = next;
        }
        Ok(())
    }
}

fn static_value(name: &str, value: Option<&str>, config: &EngineConfig) -> Value {
    match value {
        Some(text) => Value::Text(text.to_string()),
        None if config.is_boolean_attribute(name) => Value::Bool(true),
        None => Value::Text(String::new()),
    }
}

/// Overlay every entry of `descriptor`, with holes resolved from `values`. Handler
/// entries are skipped: their listeners are swapped directly by the handler binding.
pub(crate) fn flatten(
    descriptor: &AttrsDescriptor,
    values: &[Value],
    config: &EngineConfig,
) -> Result<AttrMap, RenderError> {
    overlay(descriptor, values, config, false)
}

/// Component props: like [`flatten`], but handler entries are passed through as props.
pub(crate) fn flatten_props(
    descriptor: &AttrsDescriptor,
    values: &[Value],
    config: &EngineConfig,
) -> Result<Props, RenderError> {
    overlay(descriptor, values, config, true)
}

fn overlay(
    descriptor: &AttrsDescriptor,
    values: &[Value],
    config: &EngineConfig,
    keep_handlers: bool,
) -> Result<AttrMap, RenderError> {
    let mut map = AttrMap::new();
    for entry in descriptor.entries() {
        match entry {
            AttrEntry::Static { name, value } => {
                map.insert(name.as_str(), static_value(name, value.as_deref(), config));
            }
            AttrEntry::Value { name, hole } => {
                map.insert(name.as_str(), hole_value(values, *hole));
            }
            AttrEntry::Interpolated { name, parts } => {
                map.insert(name.as_str(), Value::Text(interpolate(name, parts, values)?));
            }
            AttrEntry::Handler { name, hole, .. } => {
                if keep_handlers {
                    map.insert(name.as_str(), hole_value(values, *hole));
                }
            }
            AttrEntry::Spread { hole } => spread_into(&mut map, hole_value(values, *hole))?,
        }
    }
    Ok(map)
}

fn hole_value(values: &[Value], hole: usize) -> Value {
    values.get(hole).cloned().unwrap_or(Value::Null)
}

fn interpolate(name: &str, parts: &[AttrPart], values: &[Value]) -> Result<String, RenderError> {
    let mut out = String::new();
    for part in parts {
        match part {
            AttrPart::Literal(text) => out.push_str(text),
            AttrPart::Hole(hole) => {
                let value = values.get(*hole).unwrap_or(&Value::Null);
                let text = value.as_text().ok_or_else(|| RenderError::UnsupportedAttrValue {
                    name: name.to_string(),
                    kind: value.kind(),
                })?;
                out.push_str(&text);
            }
        }
    }
    Ok(out)
}

fn spread_into(map: &mut AttrMap, value: Value) -> Result<(), RenderError> {
    match value {
        Value::Null => Ok(()),
        Value::Props(props) => {
            for (name, value) in props.iter() {
                map.insert(name.to_ascii_lowercase(), value.clone());
            }
            Ok(())
        }
        other => Err(RenderError::UnsupportedAttrValue {
            name: "(spread)".to_string(),
            kind: other.kind(),
        }),
    }
}

fn commit_element(
    doc: &mut Document,
    config: &EngineConfig,
    node: NodeKey,
    previous: &AttrMap,
    next: &AttrMap,
) -> Result<(), RenderError> {
    for (name, value) in next.iter() {
        let prev = previous.get(name);
        if prev == Some(value) {
            continue;
        }
        log::trace!(target: "render.cycle", "{node} {name} = {value:?}");
        apply_attr(doc, config, node, name, value, prev)?;
    }
    for (name, prev) in previous.iter() {
        if next.get(name).is_none() {
            log::trace!(target: "render.cycle", "{node} {name} removed");
            remove_attr(doc, config, node, name, prev)?;
        }
    }
    Ok(())
}

fn apply_attr(
    doc: &mut Document,
    config: &EngineConfig,
    node: NodeKey,
    name: &str,
    value: &Value,
    prev: Option<&Value>,
) -> Result<(), RenderError> {
    if let Some(event) = name.strip_prefix("on") {
        if let Some(Value::Handler(old)) = prev {
            doc.remove_listener(node, event, old)?;
        }
        return match value {
            Value::Handler(listener) => Ok(doc.add_listener(node, event, listener.clone())?),
            Value::Null => Ok(()),
            other => Err(unsupported(name, other)),
        };
    }
    if name == "value" {
        let text = value.as_text().ok_or_else(|| unsupported(name, value))?;
        if prev.is_none() {
            doc.set_attribute(node, name, &text)?;
        } else {
            doc.set_property(node, name, Property::Text(text.into_owned()))?;
        }
        return Ok(());
    }
    if config.is_boolean_attribute(name) {
        let on = value.is_truthy();
        if on {
            doc.set_attribute(node, name, name)?;
        } else {
            doc.remove_attribute(node, name)?;
        }
        doc.set_property(node, name, Property::Bool(on))?;
        return Ok(());
    }
    if value.is_null() {
        doc.remove_attribute(node, name)?;
        return Ok(());
    }
    let text = value.as_text().ok_or_else(|| unsupported(name, value))?;
    doc.set_attribute(node, name, &text)?;
    Ok(())
}

fn remove_attr(
    doc: &mut Document,
    config: &EngineConfig,
    node: NodeKey,
    name: &str,
    prev: &Value,
) -> Result<(), RenderError> {
    if let Some(event) = name.strip_prefix("on") {
        if let Value::Handler(old) = prev {
            doc.remove_listener(node, event, old)?;
        }
        return Ok(());
    }
    doc.remove_attribute(node, name)?;
    if config.is_boolean_attribute(name) {
        doc.set_property(node, name, Property::Bool(false))?;
    }
    Ok(())
}

fn unsupported(name: &str, value: &Value) -> RenderError {
    RenderError::UnsupportedAttrValue {
        name: name.to_string(),
        kind: value.kind(),
    }
}
