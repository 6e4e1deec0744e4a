use crate::result::TemplateResult;
use crate::value::Props;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use template::ComponentLookup;

/// A registered component: flattened props in, template result out.
pub type Component = Rc<dyn Fn(&Props) -> TemplateResult>;

/// Component functions by tag name. Names are stored lowercase, matching how the
/// markup parser reports tag names.
#[derive(Default)]
pub struct ComponentRegistry {
    components: RefCell<HashMap<String, Component>>,
}

impl ComponentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `component` under `name`, replacing any earlier registration.
    pub fn define(&self, name: &str, component: impl Fn(&Props) -> TemplateResult + 'static) {
        let name = name.to_ascii_lowercase();
        log::debug!(target: "render.registry", "define <{name}>");
        self.components
            .borrow_mut()
            .insert(name, Rc::new(component));
    }

    pub fn get(&self, name: &str) -> Option<Component> {
        self.components
            .borrow()
            .get(&name.to_ascii_lowercase())
            .cloned()
    }

    /// Unregister `name`. Templates already compiled keep treating the tag as a
    /// component, so rendering them afterwards fails with `UnknownComponent`.
    pub fn remove(&self, name: &str) -> Option<Component> {
        let name = name.to_ascii_lowercase();
        log::debug!(target: "render.registry", "remove <{name}>");
        self.components.borrow_mut().remove(&name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.components
            .borrow()
            .contains_key(&name.to_ascii_lowercase())
    }

    pub fn len(&self) -> usize {
        self.components.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.borrow().is_empty()
    }
}

impl ComponentLookup for ComponentRegistry {
    fn is_component(&self, name: &str) -> bool {
        self.contains(name)
    }
}

impl std::fmt::Debug for ComponentRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let components = self.components.borrow();
        let mut names: Vec<&str> = components.keys().map(String::as_str).collect();
        names.sort_unstable();
        f.debug_struct("ComponentRegistry")
            .field("components", &names)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::html;

    #[test]
    fn names_are_case_insensitive_and_redefinable() {
        let registry = ComponentRegistry::new();
        registry.define("X-Card", |_| html!("<p>one</p>"));
        assert!(registry.is_component("x-card"));
        assert!(registry.contains("X-CARD"));

        registry.define("x-card", |_| html!("<p>two</p>"));
        assert_eq!(registry.len(), 1);
        let component = registry.get("x-card").unwrap();
        assert_eq!(component(&Props::new()).source().segments(), &["<p>two</p>"]);
    }

    #[test]
    fn unknown_names_are_ordinary_elements() {
        let registry = ComponentRegistry::new();
        assert!(!registry.is_component("div"));
        assert!(registry.get("div").is_none());
        assert!(registry.is_empty());
    }
}
