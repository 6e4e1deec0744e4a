use dom::DomError;
use template::TemplateError;

/// Errors surfaced synchronously by render and update calls.
///
/// A failure part way through an update leaves every binding that already ran in place;
/// there is no rollback.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RenderError {
    #[error(transparent)]
    Template(#[from] TemplateError),
    #[error(transparent)]
    Dom(#[from] DomError),
    #[error("cannot render a {0} value between nodes")]
    UnsupportedNodeValue(&'static str),
    #[error("cannot use a {kind} value for attribute {name:?}")]
    UnsupportedAttrValue { name: String, kind: &'static str },
    #[error("template expects {expected} values, got {found}")]
    ValueCount { expected: usize, found: usize },
    #[error("component <{0}> is not registered")]
    UnknownComponent(String),
}
