use crate::cache::ComponentLookup;
use crate::error::TemplateError;
use crate::extract::{Block, Extractor};
use crate::parser::mark_holes;
use crate::source::{SourceId, TemplateSource};
use dom::Document;

/// A compiled template: marked-up content plus the descriptors needed to bind it.
///
/// Immutable once built. Instances import `root().content()` (and nested blocks) from
/// [`Template::document`] into their own document.
#[derive(Debug)]
pub struct Template {
    id: SourceId,
    document: Document,
    root: Block,
    hole_count: usize,
    markup: String,
}

impl Template {
    pub fn compile(
        source: &'static TemplateSource,
        components: &dyn ComponentLookup,
    ) -> Result<Template, TemplateError> {
        let markup = mark_holes(source.segments());
        let mut document = Document::new();
        let content = document.parse_fragment(&markup)?;
        let root = Extractor::new(&mut document, components).extract(content)?;

        let hole_count = source.hole_count();
        let mut holes = Vec::with_capacity(hole_count);
        root.collect_holes(&document, &mut holes);
        holes.sort_unstable();
        if let Some(missing) = (0..hole_count).find(|hole| holes.binary_search(hole).is_err()) {
            return Err(TemplateError::UnreachableHole(missing));
        }

        log::debug!(
            target: "template.compile",
            "compiled {:?}: {hole_count} holes, {} elements, {} components, {} slots",
            source.id(),
            root.elements().len(),
            root.components().len(),
            root.slots().len(),
        );
        Ok(Template {
            id: source.id(),
            document,
            root,
            hole_count,
            markup,
        })
    }

    pub fn id(&self) -> SourceId {
        self.id
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn root(&self) -> &Block {
        &self.root
    }

    pub fn hole_count(&self) -> usize {
        self.hole_count
    }

    /// Joined markup with hole markers, before extraction.
    pub fn markup(&self) -> &str {
        &self.markup
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::NoComponents;
    use crate::descriptor::AttrEntry;

    #[test]
    fn compiles_markup_and_descriptors() {
        static SOURCE: TemplateSource =
            TemplateSource::new(&["<h1 title=\"a ", "\">", "</h1>"]);
        let template = Template::compile(&SOURCE, &NoComponents).unwrap();
        assert_eq!(template.markup(), "<h1 title=\"a $v0$\"><!--$v1$--></h1>");
        assert_eq!(template.hole_count(), 2);
        assert_eq!(template.id(), SOURCE.id());
        let root = template.root();
        assert_eq!(
            template.document().inner_html(root.content()),
            "<h1><!--$v1$--></h1>"
        );
        assert!(matches!(
            root.elements()[0].entries(),
            [AttrEntry::Interpolated { name, .. }] if name == "title"
        ));
    }

    #[test]
    fn holes_swallowed_by_rawtext_are_rejected() {
        static SOURCE: TemplateSource = TemplateSource::new(&["<script>", "</script>"]);
        assert_eq!(
            Template::compile(&SOURCE, &NoComponents).unwrap_err(),
            TemplateError::UnreachableHole(0)
        );
    }
}
