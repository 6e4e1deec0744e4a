use crate::error::RenderError;
use crate::registry::ComponentRegistry;
use crate::result::TemplateResult;
use crate::value::Props;
use std::rc::Rc;
use template::{Template, TemplateCache, TemplateSource};

/// Attributes committed as booleans: present with their own name as value when truthy,
/// removed otherwise, and mirrored to a live boolean property.
pub const DEFAULT_BOOLEAN_ATTRIBUTES: &[&str] = &[
    "checked",
    "disabled",
    "selected",
    "readonly",
    "required",
    "hidden",
    "multiple",
    "autofocus",
    "open",
];

#[derive(Clone, Debug)]
pub struct EngineConfig {
    /// Lowercase attribute names with boolean commit semantics.
    pub boolean_attributes: Vec<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            boolean_attributes: DEFAULT_BOOLEAN_ATTRIBUTES
                .iter()
                .map(|name| name.to_string())
                .collect(),
        }
    }
}

impl EngineConfig {
    pub fn is_boolean_attribute(&self, name: &str) -> bool {
        self.boolean_attributes.iter().any(|known| known == name)
    }
}

/// Shared rendering context: the compiled-template cache and the component registry.
///
/// One engine is typically shared as `Rc<Engine>` by every render tree of a program.
/// Components must be defined before the first template that uses their tag compiles.
#[derive(Debug, Default)]
pub struct Engine {
    config: EngineConfig,
    templates: TemplateCache,
    components: ComponentRegistry,
}

impl Engine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: EngineConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn templates(&self) -> &TemplateCache {
        &self.templates
    }

    pub fn components(&self) -> &ComponentRegistry {
        &self.components
    }

    pub fn define(&self, name: &str, component: impl Fn(&Props) -> TemplateResult + 'static) {
        self.components.define(name, component);
    }

    /// The compiled template for `source`, compiling it on first use.
    pub fn template(&self, source: &'static TemplateSource) -> Result<Rc<Template>, RenderError> {
        Ok(self.templates.get_or_compile(source, &self.components)?)
    }
}
