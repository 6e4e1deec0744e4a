use crate::document::Document;
use crate::types::{NodeKey, NodeKind};

/// Node-kind filter for [`TreeWalker`]. Skipped nodes are still descended into.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WhatToShow(u8);

impl WhatToShow {
    pub const ELEMENT: WhatToShow = WhatToShow(1);
    pub const TEXT: WhatToShow = WhatToShow(1 << 1);
    pub const COMMENT: WhatToShow = WhatToShow(1 << 2);
    pub const ALL: WhatToShow = WhatToShow(0b111);

    pub const fn union(self, other: WhatToShow) -> WhatToShow {
        WhatToShow(self.0 | other.0)
    }

    fn shows(self, kind: &NodeKind) -> bool {
        let bit = match kind {
            NodeKind::Element { .. } => Self::ELEMENT.0,
            NodeKind::Text { .. } => Self::TEXT.0,
            NodeKind::Comment { .. } => Self::COMMENT.0,
            NodeKind::Fragment => 0,
        };
        self.0 & bit != 0
    }
}

/// Lazy pre-order walk over the descendants of `root`.
///
/// The walker holds no borrow of the document between steps, so callers may mutate the
/// tree while walking. Nodes inserted before the current node are not visited; the
/// current node itself must stay attached below `root`. One-shot: once exhausted it
/// keeps returning `None`.
#[derive(Debug)]
pub struct TreeWalker {
    root: NodeKey,
    current: NodeKey,
    show: WhatToShow,
    done: bool,
}

impl TreeWalker {
    pub fn new(root: NodeKey, show: WhatToShow) -> Self {
        Self {
            root,
            current: root,
            show,
            done: false,
        }
    }

    pub fn current(&self) -> NodeKey {
        self.current
    }

    pub fn next_node(&mut self, doc: &Document) -> Option<NodeKey> {
        if self.done {
            return None;
        }
        loop {
            let Some(next) = self.following(doc, self.current) else {
                self.done = true;
                return None;
            };
            self.current = next;
            if doc.kind(next).is_some_and(|kind| self.show.shows(kind)) {
                return Some(next);
            }
        }
    }

    fn following(&self, doc: &Document, node: NodeKey) -> Option<NodeKey> {
        if let Some(child) = doc.first_child(node) {
            return Some(child);
        }
        let mut current = node;
        loop {
            if current == self.root {
                return None;
            }
            if let Some(sibling) = doc.next_sibling(current) {
                return Some(sibling);
            }
            current = doc.parent(current)?;
        }
    }
}

/// First descendant element of `root` with the given tag name, in document order.
pub fn find_element(doc: &Document, root: NodeKey, name: &str) -> Option<NodeKey> {
    let mut walker = TreeWalker::new(root, WhatToShow::ELEMENT);
    while let Some(node) = walker.next_node(doc) {
        if doc
            .tag_name(node)
            .is_some_and(|tag| tag.eq_ignore_ascii_case(name))
        {
            return Some(node);
        }
    }
    None
}

pub fn find_elements(doc: &Document, root: NodeKey, name: &str) -> Vec<NodeKey> {
    let mut out = Vec::new();
    let mut walker = TreeWalker::new(root, WhatToShow::ELEMENT);
    while let Some(node) = walker.next_node(doc) {
        if doc
            .tag_name(node)
            .is_some_and(|tag| tag.eq_ignore_ascii_case(name))
        {
            out.push(node);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build() -> (Document, NodeKey) {
        let mut doc = Document::new();
        let root = doc.parse_fragment("<div><!--a--><p>x<em>y</em></p></div><!--b--><span></span>").unwrap();
        (doc, root)
    }

    #[test]
    fn walks_elements_and_comments_in_document_order() {
        let (doc, root) = build();
        let mut walker = TreeWalker::new(root, WhatToShow::ELEMENT.union(WhatToShow::COMMENT));
        let mut seen = Vec::new();
        while let Some(node) = walker.next_node(&doc) {
            seen.push(match doc.kind(node) {
                Some(NodeKind::Element { name, .. }) => name.clone(),
                Some(NodeKind::Comment { text }) => format!("!{text}"),
                _ => unreachable!("filtered"),
            });
        }
        assert_eq!(seen, ["div", "!a", "p", "em", "!b", "span"]);
        assert_eq!(walker.next_node(&doc), None);
    }

    #[test]
    fn insertion_before_current_is_not_visited() {
        let mut doc = Document::new();
        let root = doc.parse_fragment("<!--m--><b></b>").unwrap();
        let mut walker = TreeWalker::new(root, WhatToShow::ALL);
        let marker = walker.next_node(&doc).unwrap();
        let inserted = doc.create_element("i");
        doc.insert_before(root, inserted, marker).unwrap();
        let next = walker.next_node(&doc).unwrap();
        assert_eq!(doc.tag_name(next), Some("b"));
    }

    #[test]
    fn finds_elements_by_tag() {
        let (doc, root) = build();
        let p = find_element(&doc, root, "P").unwrap();
        assert_eq!(doc.tag_name(p), Some("p"));
        assert_eq!(find_elements(&doc, root, "em").len(), 1);
        assert!(find_element(&doc, root, "table").is_none());
    }
}
