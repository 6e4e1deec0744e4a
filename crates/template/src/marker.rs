//! Placeholder tokens embedded in template markup.
//!
//! Formats (exact, case-sensitive): `$v<N>$` value hole, `$c<N>$` component, `$s:<name>$`
//! slot. A value token can appear inline in attribute text; component and slot tokens
//! only ever appear as the whole text of a comment node. User content that happens to
//! contain these tokens is misread; that collision is accepted.

use memchr::memchr;
use std::fmt;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Marker {
    Value(usize),
    Component(usize),
    Slot(String),
}

/// A run of attribute text: literal characters or one value hole.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AttrPart {
    Literal(String),
    Hole(usize),
}

impl Marker {
    /// Parse a comment's text. Only an exact token is a marker.
    pub fn parse(text: &str) -> Option<Marker> {
        let inner = text.strip_prefix('$')?.strip_suffix('$')?;
        if let Some(name) = inner.strip_prefix("s:") {
            return is_valid_slot_name(name).then(|| Marker::Slot(name.to_string()));
        }
        let (kind, digits) = inner.split_at_checked(1)?;
        let index = parse_index(digits)?;
        match kind {
            "v" => Some(Marker::Value(index)),
            "c" => Some(Marker::Component(index)),
            _ => None,
        }
    }
}

impl fmt::Display for Marker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Marker::Value(index) => write!(f, "$v{index}$"),
            Marker::Component(index) => write!(f, "$c{index}$"),
            Marker::Slot(name) => write!(f, "$s:{name}$"),
        }
    }
}

fn parse_index(digits: &str) -> Option<usize> {
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

/// Slot names are plain identifiers: `[A-Za-z0-9_-]+`.
pub fn is_valid_slot_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-')
}

/// Split attribute text into literal runs and value holes, in order.
pub fn split_value_holes(text: &str) -> Vec<AttrPart> {
    let bytes = text.as_bytes();
    let mut parts = Vec::new();
    let mut literal_start = 0;
    let mut i = 0;
    while let Some(rel) = memchr(b'$', &bytes[i..]) {
        let start = i + rel;
        if let Some((index, end)) = value_token_at(text, start) {
            if literal_start < start {
                parts.push(AttrPart::Literal(text[literal_start..start].to_string()));
            }
            parts.push(AttrPart::Hole(index));
            literal_start = end;
            i = end;
        } else {
            i = start + 1;
        }
    }
    if literal_start < text.len() {
        parts.push(AttrPart::Literal(text[literal_start..].to_string()));
    }
    parts
}

pub fn contains_value_hole(text: &str) -> bool {
    split_value_holes(text)
        .iter()
        .any(|part| matches!(part, AttrPart::Hole(_)))
}

/// Matches `$v<digits>$` starting at byte `start`; returns the index and the end offset.
fn value_token_at(text: &str, start: usize) -> Option<(usize, usize)> {
    let rest = text.get(start..)?.strip_prefix("$v")?;
    let digits_len = rest.bytes().take_while(u8::is_ascii_digit).count();
    if digits_len == 0 || rest.as_bytes().get(digits_len) != Some(&b'$') {
        return None;
    }
    let index = rest[..digits_len].parse().ok()?;
    Some((index, start + 2 + digits_len + 1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_exact_markers_only() {
        assert_eq!(Marker::parse("$v12$"), Some(Marker::Value(12)));
        assert_eq!(Marker::parse("$c0$"), Some(Marker::Component(0)));
        assert_eq!(Marker::parse("$s:main-area$"), Some(Marker::Slot("main-area".into())));
        assert_eq!(Marker::parse(" $v1$"), None);
        assert_eq!(Marker::parse("$v$"), None);
        assert_eq!(Marker::parse("$x1$"), None);
        assert_eq!(Marker::parse("$s:bad name$"), None);
        assert_eq!(Marker::parse("root"), None);
    }

    #[test]
    fn display_round_trips_through_parse() {
        for marker in [
            Marker::Value(3),
            Marker::Component(10),
            Marker::Slot("default".into()),
        ] {
            assert_eq!(Marker::parse(&marker.to_string()), Some(marker));
        }
    }

    #[test]
    fn splits_multi_hole_attribute_text() {
        assert_eq!(
            split_value_holes("foo $v0$ bar $v11$ qaz"),
            vec![
                AttrPart::Literal("foo ".into()),
                AttrPart::Hole(0),
                AttrPart::Literal(" bar ".into()),
                AttrPart::Hole(11),
                AttrPart::Literal(" qaz".into()),
            ]
        );
        assert_eq!(split_value_holes("$v2$"), vec![AttrPart::Hole(2)]);
        assert_eq!(
            split_value_holes("cost: $5 $v$"),
            vec![AttrPart::Literal("cost: $5 $v$".into())]
        );
    }

    #[test]
    fn validates_slot_names() {
        assert!(is_valid_slot_name("header_2"));
        assert!(!is_valid_slot_name(""));
        assert!(!is_valid_slot_name("a b"));
        assert!(!is_valid_slot_name("$v0$"));
    }
}
