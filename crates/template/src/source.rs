use std::fmt;

/// The static segments of one template call site.
///
/// Identity is the address of the `TemplateSource` itself, never its text: two sources
/// with identical segments are still two templates. Declare sources as `static` items
/// (the `html!` macro does this per call site) or create them with [`TemplateSource::leak`].
pub struct TemplateSource {
    segments: &'static [&'static str],
}

/// Address-based identity of a [`TemplateSource`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SourceId(usize);

impl TemplateSource {
    pub const fn new(segments: &'static [&'static str]) -> Self {
        Self { segments }
    }

    /// Build a source at runtime. The segments and the source live for the rest of the
    /// process, matching the lifetime of compiled templates.
    pub fn leak<S: Into<String>>(segments: impl IntoIterator<Item = S>) -> &'static TemplateSource {
        let segments: Vec<&'static str> = segments
            .into_iter()
            .map(|s| &*Box::leak(s.into().into_boxed_str()))
            .collect();
        Box::leak(Box::new(TemplateSource {
            segments: Box::leak(segments.into_boxed_slice()),
        }))
    }

    pub fn segments(&self) -> &'static [&'static str] {
        self.segments
    }

    /// Number of interpolation holes, one between each pair of segments.
    pub fn hole_count(&self) -> usize {
        self.segments.len().saturating_sub(1)
    }

    pub fn id(&'static self) -> SourceId {
        SourceId(std::ptr::from_ref(self) as usize)
    }
}

impl fmt::Debug for TemplateSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TemplateSource")
            .field("address", &std::ptr::from_ref(self))
            .field("segments", &self.segments)
            .finish()
    }
}
