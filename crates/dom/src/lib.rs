//! Host document tree for template instances.
//!
//! Provides everything the renderer needs from a tree API: node creation, deep clone
//! and cross-document import, a lazy element/comment walker, attributes and live
//! properties, listeners, sibling insertion and removal, plus a lenient markup parser
//! and serializer.

mod document;
mod entities;
mod error;
pub mod markup;
mod serialize;
pub mod traverse;
mod types;

pub use crate::document::Document;
pub use crate::error::DomError;
pub use crate::traverse::{TreeWalker, WhatToShow, find_element, find_elements};
pub use crate::types::{Event, Listener, NodeKey, NodeKind, Property};
