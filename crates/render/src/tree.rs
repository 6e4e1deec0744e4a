use crate::engine::Engine;
use crate::error::RenderError;
use crate::fragment::NodeFragment;
use crate::value::Value;
use dom::{Document, NodeKey};
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::rc::Rc;

/// A document plus the render roots mounted into its containers.
///
/// Each container gets a `root` anchor comment on first render; every later render
/// into the same container reconciles against what is already there.
#[derive(Debug)]
pub struct RenderTree {
    document: Document,
    engine: Rc<Engine>,
    roots: HashMap<NodeKey, Root>,
}

#[derive(Debug)]
struct Root {
    anchor: NodeKey,
    fragment: NodeFragment,
}

impl RenderTree {
    pub fn new(engine: Rc<Engine>) -> Self {
        Self::with_document(engine, Document::new())
    }

    pub fn with_document(engine: Rc<Engine>, document: Document) -> Self {
        Self {
            document,
            engine,
            roots: HashMap::new(),
        }
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    /// Direct tree access, e.g. to create containers. Nodes owned by a render root
    /// should only be changed through [`render`](Self::render).
    pub fn document_mut(&mut self) -> &mut Document {
        &mut self.document
    }

    pub fn engine(&self) -> &Rc<Engine> {
        &self.engine
    }

    /// Render `value` into `container`: text, numbers, booleans, null, template
    /// results, or a flat list of those.
    pub fn render(&mut self, value: impl Into<Value>, container: NodeKey) -> Result<(), RenderError> {
        let value = value.into();
        let document = &mut self.document;
        let root = match self.roots.entry(container) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => {
                let anchor = document.create_comment("root");
                document.append_child(container, anchor)?;
                log::debug!(target: "render.tree", "new root in {container}");
                entry.insert(Root {
                    anchor,
                    fragment: NodeFragment::default(),
                })
            }
        };
        root.fragment
            .reconcile(document, &self.engine, root.anchor, &value, None)
    }

    /// Remove everything rendered into `container`, anchor included. Returns whether
    /// the container had a root.
    pub fn unmount(&mut self, container: NodeKey) -> Result<bool, RenderError> {
        let Some(mut root) = self.roots.remove(&container) else {
            return Ok(false);
        };
        root.fragment.clear(&mut self.document)?;
        if self.document.contains(root.anchor) {
            self.document.remove(root.anchor)?;
        }
        log::debug!(target: "render.tree", "unmounted root in {container}");
        Ok(true)
    }

    pub fn is_mounted(&self, container: NodeKey) -> bool {
        self.roots.contains_key(&container)
    }
}
