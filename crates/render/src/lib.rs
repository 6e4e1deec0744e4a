//! Incremental rendering of compiled templates.
//!
//! A [`TemplateResult`] (usually built with [`html!`]) names a template call site and
//! carries fresh values. The first render binds a [`TemplateInstance`] of the compiled
//! template; every later render with a result from the same call site only pushes new
//! values through the instance's bindings, so unchanged nodes keep their identity.
//!
//! ```ignore
//! fn heading(title: &str) -> TemplateResult {
//!     html!("<h1>" {title} "</h1>")
//! }
//!
//! let mut tree = RenderTree::new(Rc::new(Engine::new()));
//! let body = tree.document_mut().create_element("body");
//! tree.render(heading("hello"), body)?;
//! tree.render(heading("hello2"), body)?; // same <h1>, new text
//! ```

mod cycle;
mod engine;
mod error;
mod fragment;
mod instance;
mod registry;
mod result;
mod tree;
mod value;

pub use crate::engine::{DEFAULT_BOOLEAN_ATTRIBUTES, Engine, EngineConfig};
pub use crate::error::RenderError;
pub use crate::fragment::NodeFragment;
pub use crate::instance::TemplateInstance;
pub use crate::registry::{Component, ComponentRegistry};
pub use crate::result::{SlotContent, TemplateResult};
pub use crate::tree::RenderTree;
pub use crate::value::{Props, Value, escape_text};

pub use dom::{Event, Listener};
pub use template::{Template, TemplateError, TemplateSource};
