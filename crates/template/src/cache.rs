use crate::error::TemplateError;
use crate::source::{SourceId, TemplateSource};
use crate::template::Template;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// Decides which tag names are components while a template is compiled.
///
/// Names reach the lookup lowercased. A template compiled before a component is
/// registered keeps treating that tag as an ordinary element.
pub trait ComponentLookup {
    fn is_component(&self, name: &str) -> bool;
}

/// Lookup that knows no components.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoComponents;

impl ComponentLookup for NoComponents {
    fn is_component(&self, _name: &str) -> bool {
        false
    }
}

impl ComponentLookup for &[&str] {
    fn is_component(&self, name: &str) -> bool {
        self.iter().any(|known| known.eq_ignore_ascii_case(name))
    }
}

impl<const N: usize> ComponentLookup for [&str; N] {
    fn is_component(&self, name: &str) -> bool {
        self.as_slice().is_component(name)
    }
}

/// Compiled templates keyed by source identity. Entries are never evicted; a failed
/// compile is not cached, so the next use of the source reports the error again.
#[derive(Debug, Default)]
pub struct TemplateCache {
    templates: RefCell<HashMap<SourceId, Rc<Template>>>,
}

impl TemplateCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, source: &'static TemplateSource) -> Option<Rc<Template>> {
        self.templates.borrow().get(&source.id()).cloned()
    }

    pub fn get_or_compile(
        &self,
        source: &'static TemplateSource,
        components: &dyn ComponentLookup,
    ) -> Result<Rc<Template>, TemplateError> {
        if let Some(template) = self.get(source) {
            return Ok(template);
        }
        let template = Rc::new(Template::compile(source, components)?);
        self.templates
            .borrow_mut()
            .insert(source.id(), Rc::clone(&template));
        Ok(template)
    }

    pub fn len(&self) -> usize {
        self.templates.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.borrow().is_empty()
    }
}
