use dom::DomError;

/// Errors raised while compiling a template. They surface to whichever render call
/// first triggers compilation of the source.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TemplateError {
    #[error("slot name {0:?} must match [A-Za-z0-9_-]+")]
    InvalidSlotName(String),
    #[error("slot name cannot be an interpolated value")]
    SlotNameIsHole,
    #[error("slot {0:?} is declared more than once")]
    DuplicateSlot(String),
    #[error("event handler attribute {0:?} must be exactly one interpolated value")]
    HandlerInterpolation(String),
    #[error("attribute name {0:?} embeds an interpolated value; use a spread instead")]
    AttributeNameHole(String),
    #[error("value hole {0} does not land in an attribute or between nodes")]
    UnreachableHole(usize),
    #[error(transparent)]
    Dom(#[from] DomError),
}
