use crate::value::Value;
use dom::NodeKey;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;
use template::{SourceId, TemplateSource};

/// One evaluation of a template call site: its source identity plus fresh values.
///
/// Results are cheap, disposable descriptions; compilation happens when a result is
/// first bound through an [`Engine`](crate::Engine).
#[derive(Clone)]
pub struct TemplateResult {
    source: &'static TemplateSource,
    values: Vec<Value>,
    key: Option<String>,
    slots: Option<Rc<SlotContent>>,
}

impl TemplateResult {
    pub fn new(source: &'static TemplateSource, values: Vec<Value>) -> Self {
        Self {
            source,
            values,
            key: None,
            slots: None,
        }
    }

    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    pub fn source(&self) -> &'static TemplateSource {
        self.source
    }

    pub fn id(&self) -> SourceId {
        self.source.id()
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    pub fn slots(&self) -> Option<&Rc<SlotContent>> {
        self.slots.as_ref()
    }

    /// Caller content for this result's `slot` markers. Set by component resolution.
    pub(crate) fn attach_slots(&mut self, slots: Rc<SlotContent>) {
        self.slots = Some(slots);
    }
}

impl PartialEq for TemplateResult {
    fn eq(&self, other: &Self) -> bool {
        self.id() == other.id() && self.key == other.key && self.values == other.values
    }
}

impl fmt::Debug for TemplateResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TemplateResult")
            .field("source", &self.id())
            .field("values", &self.values)
            .field("key", &self.key)
            .field("slots", &self.slots.is_some())
            .finish()
    }
}

/// Live caller nodes grouped by target slot name, captured once per component use.
///
/// `home` is the detached fragment the caller content was bound in. Slotted nodes go
/// back there whenever the instance holding them is torn down, so a later instance can
/// slot them again.
#[derive(Debug)]
pub struct SlotContent {
    home: NodeKey,
    groups: HashMap<String, Vec<NodeKey>>,
}

impl SlotContent {
    pub(crate) fn new(home: NodeKey) -> Self {
        Self {
            home,
            groups: HashMap::new(),
        }
    }

    pub(crate) fn push(&mut self, slot: &str, node: NodeKey) {
        self.groups.entry(slot.to_string()).or_default().push(node);
    }

    pub(crate) fn home(&self) -> NodeKey {
        self.home
    }

    pub fn get(&self, slot: &str) -> Option<&[NodeKey]> {
        self.groups
            .get(slot)
            .map(Vec::as_slice)
            .filter(|nodes| !nodes.is_empty())
    }

    pub fn slot_names(&self) -> impl Iterator<Item = &str> {
        self.groups.keys().map(String::as_str)
    }

    /// Every captured node, in no particular slot order.
    pub fn nodes(&self) -> impl Iterator<Item = NodeKey> + '_ {
        self.groups.values().flatten().copied()
    }
}

/// Build a [`TemplateResult`] from literal segments and `{expr}` values.
///
/// ```ignore
/// let card = html!("<h2 class=" {class} ">" {title} "</h2>");
/// ```
///
/// Each invocation declares its own `static` source, so every call site is one
/// template identity however often it runs.
#[macro_export]
macro_rules! html {
    ($first:literal $({ $value:expr } $segment:literal)*) => {{
        static SOURCE: $crate::TemplateSource =
            $crate::TemplateSource::new(&[$first $(, $segment)*]);
        $crate::TemplateResult::new(
            &SOURCE,
            ::std::vec![$($crate::Value::from($value)),*],
        )
    }};
}

#[cfg(test)]
mod tests {
    use super::*;

    fn heading(title: &str) -> TemplateResult {
        html!("<h1>" {title} "</h1>")
    }

    #[test]
    fn macro_keeps_one_identity_per_call_site() {
        let a = heading("a");
        let b = heading("b");
        let other = html!("<h1>" {"a"} "</h1>");
        assert_eq!(a.id(), b.id());
        assert_ne!(a.id(), other.id());
        assert_eq!(a.values(), &[Value::from("a")]);
        assert_eq!(a.source().segments(), &["<h1>", "</h1>"]);
    }

    #[test]
    fn static_markup_has_no_values() {
        let result = html!("<br>");
        assert!(result.values().is_empty());
        assert_eq!(result.source().hole_count(), 0);
    }

    #[test]
    fn equality_covers_source_values_and_key() {
        assert_eq!(heading("x"), heading("x"));
        assert_ne!(heading("x"), heading("y"));
        assert_ne!(heading("x"), heading("x").with_key("k"));
    }
}
