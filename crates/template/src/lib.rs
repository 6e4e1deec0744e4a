//! Template compilation.
//!
//! A template starts as the static segments of one call site ([`TemplateSource`]).
//! Segments are joined with hole markers, parsed into a private document, and split
//! into blocks: components and slots are cut out and replaced by marker comments, and
//! every element gets an attribute descriptor. The result is cached per source identity.

mod cache;
mod descriptor;
mod error;
mod extract;
pub mod marker;
mod parser;
mod source;
mod template;

pub use crate::cache::{ComponentLookup, NoComponents, TemplateCache};
pub use crate::descriptor::{AttrEntry, AttrsDescriptor};
pub use crate::error::TemplateError;
pub use crate::extract::{Block, ComponentBlock, DEFAULT_SLOT, SlotBlock};
pub use crate::marker::{AttrPart, Marker};
pub use crate::parser::mark_holes;
pub use crate::source::{SourceId, TemplateSource};
pub use crate::template::Template;
