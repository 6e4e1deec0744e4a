//! Joins template segments into markup with hole markers.
//!
//! Each hole is classified by scanning the segment that precedes it: if the last `<`
//! comes after the last `>`, the hole sits inside a tag and becomes an inline `$v<i>$`;
//! if the last `>` comes after the last `<`, it sits between nodes and becomes a
//! `<!--$v<i>$-->` comment. A segment containing neither keeps the previous state.
//! The scan is lexical only: a `>` inside a quoted attribute value flips the state.

use crate::marker::Marker;
use memchr::memrchr;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum HoleContext {
    Node,
    Attribute,
}

impl HoleContext {
    fn after(self, segment: &str) -> HoleContext {
        let bytes = segment.as_bytes();
        match (memrchr(b'<', bytes), memrchr(b'>', bytes)) {
            (Some(open), Some(close)) if open > close => HoleContext::Attribute,
            (Some(_), None) => HoleContext::Attribute,
            (Some(_), Some(_)) | (None, Some(_)) => HoleContext::Node,
            (None, None) => self,
        }
    }
}

/// Returns the marked-up markup for `segments`; holes are numbered from zero in source
/// order.
pub fn mark_holes(segments: &[&str]) -> String {
    let mut out = String::with_capacity(segments.iter().map(|s| s.len() + 12).sum());
    let mut context = HoleContext::Node;
    let last = segments.len().saturating_sub(1);
    for (index, segment) in segments.iter().enumerate() {
        out.push_str(segment);
        if index == last {
            break;
        }
        context = context.after(segment);
        let marker = Marker::Value(index);
        match context {
            HoleContext::Attribute => out.push_str(&marker.to_string()),
            HoleContext::Node => {
                out.push_str("<!--");
                out.push_str(&marker.to_string());
                out.push_str("-->");
            }
        }
    }
    log::trace!(target: "template.parse", "marked {} holes: {out}", last);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_holes_become_comments() {
        assert_eq!(mark_holes(&["<h1>", "</h1>"]), "<h1><!--$v0$--></h1>");
        assert_eq!(mark_holes(&["", ""]), "<!--$v0$-->");
    }

    #[test]
    fn attribute_holes_are_inlined() {
        assert_eq!(
            mark_holes(&["<div class=\"foo ", " bar ", " qaz\"></div>"]),
            "<div class=\"foo $v0$ bar $v1$ qaz\"></div>"
        );
        assert_eq!(mark_holes(&["<input ", ">"]), "<input $v0$>");
    }

    #[test]
    fn state_persists_across_neutral_segments() {
        assert_eq!(
            mark_holes(&["<p>", " and ", "</p>"]),
            "<p><!--$v0$--> and <!--$v1$--></p>"
        );
        assert_eq!(
            mark_holes(&["<a href=", " title=", ">", "</a>"]),
            "<a href=$v0$ title=$v1$><!--$v2$--></a>"
        );
    }

    #[test]
    fn single_segment_has_no_markers() {
        assert_eq!(mark_holes(&["<br>"]), "<br>");
        assert_eq!(mark_holes(&[]), "");
    }
}
