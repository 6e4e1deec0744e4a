//! Markup tokenizer and fragment builder for template content.
//!
//! Tag and attribute names are ASCII `[A-Za-z0-9:_$-]`, lowercased. `$` is part of the
//! name set so `$v0$`-style markers parse as attribute names.
//!
//! This is a lenient builder, not an HTML5 tree constructor: there are no implied end
//! tags. End tags without a matching open element are dropped and open elements are
//! closed at end of input. `script` and `style` bodies are kept as raw text. Entities
//! are decoded in text and in quoted attribute values only.

use crate::document::Document;
use crate::error::DomError;
use crate::entities::decode_entities;
use crate::types::NodeKey;
use memchr::{memchr, memchr_iter};

const COMMENT_OPEN: &str = "<!--";
const COMMENT_CLOSE: &str = "-->";

/// Elements whose body is not tokenized.
const RAWTEXT_ELEMENTS: &[&str] = &["script", "style"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Doctype(String),
    StartTag {
        name: String,
        attributes: Vec<(String, Option<String>)>,
        self_closing: bool,
    },
    EndTag(String),
    Comment(String),
    Text(String),
}

fn has_prefix_at(bytes: &[u8], at: usize, prefix: &[u8]) -> bool {
    bytes
        .get(at..at + prefix.len())
        .is_some_and(|window| window.eq_ignore_ascii_case(prefix))
}

fn is_name_char(c: u8) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, b'-' | b'_' | b':' | b'$')
}

/// Span of the `</name ...>` that closes a raw text body, as (start, end) offsets into
/// `body`. Only whitespace may sit between the name and `>`.
fn rawtext_close(body: &str, name: &str) -> Option<(usize, usize)> {
    let bytes = body.as_bytes();
    memchr_iter(b'<', bytes).find_map(|lt| {
        if bytes.get(lt + 1) != Some(&b'/') || !has_prefix_at(bytes, lt + 2, name.as_bytes()) {
            return None;
        }
        let after = lt + 2 + name.len();
        let gt = after + bytes[after..].iter().take_while(|b| b.is_ascii_whitespace()).count();
        (bytes.get(gt) == Some(&b'>')).then_some((lt, gt + 1))
    })
}

pub fn is_void_element(name: &str) -> bool {
    matches!(
        name,
        "area"
            | "base"
            | "br"
            | "col"
            | "embed"
            | "hr"
            | "img"
            | "input"
            | "link"
            | "meta"
            | "param"
            | "source"
            | "track"
            | "wbr"
    )
}

pub fn tokenize(input: &str) -> Vec<Token> {
    let mut scanner = Scanner {
        input,
        bytes: input.as_bytes(),
        pos: 0,
        out: Vec::new(),
    };
    scanner.run();
    scanner.out
}

/// Byte cursor over the input. Slices are only cut next to ASCII structural bytes, so
/// every offset stays on a UTF-8 boundary.
struct Scanner<'a> {
    input: &'a str,
    bytes: &'a [u8],
    pos: usize,
    out: Vec<Token>,
}

impl Scanner<'_> {
    fn run(&mut self) {
        while self.pos < self.bytes.len() {
            let more = if self.bytes[self.pos] != b'<' {
                self.text();
                true
            } else if self.input[self.pos..].starts_with(COMMENT_OPEN) {
                self.comment()
            } else if has_prefix_at(self.bytes, self.pos, b"<!doctype") {
                self.doctype()
            } else if self.bytes.get(self.pos + 1) == Some(&b'/') {
                self.end_tag();
                true
            } else {
                self.start_tag()
            };
            if !more {
                break;
            }
        }
    }

    fn find(&self, byte: u8, from: usize) -> Option<usize> {
        memchr(byte, &self.bytes[from..]).map(|rel| from + rel)
    }

    fn name_end(&self, from: usize) -> usize {
        from + self.bytes[from..].iter().take_while(|b| is_name_char(**b)).count()
    }

    fn skip_whitespace(&mut self) {
        while self.bytes.get(self.pos).is_some_and(u8::is_ascii_whitespace) {
            self.pos += 1;
        }
    }

    fn text(&mut self) {
        let end = self.find(b'<', self.pos).unwrap_or(self.bytes.len());
        let decoded = decode_entities(&self.input[self.pos..end]);
        if !decoded.is_empty() {
            self.out.push(Token::Text(decoded));
        }
        self.pos = end;
    }

    /// Returns false when the comment runs to the end of input.
    fn comment(&mut self) -> bool {
        let body = self.pos + COMMENT_OPEN.len();
        let Some(len) = self.input[body..].find(COMMENT_CLOSE) else {
            self.out.push(Token::Comment(self.input[body..].to_string()));
            return false;
        };
        self.out.push(Token::Comment(self.input[body..body + len].to_string()));
        self.pos = body + len + COMMENT_CLOSE.len();
        true
    }

    fn doctype(&mut self) -> bool {
        let body = self.pos + 2;
        let Some(gt) = self.find(b'>', body) else {
            return false;
        };
        self.out.push(Token::Doctype(self.input[body..gt].trim().to_string()));
        self.pos = gt + 1;
        true
    }

    fn end_tag(&mut self) {
        let start = self.pos + 2;
        let end = self.name_end(start);
        self.out.push(Token::EndTag(self.input[start..end].to_ascii_lowercase()));
        self.pos = self.find(b'>', end).map_or(self.bytes.len(), |gt| gt + 1);
    }

    fn start_tag(&mut self) -> bool {
        let start = self.pos + 1;
        let end = self.name_end(start);
        if end == start {
            // `<` that opens no tag
            self.out.push(Token::Text("<".to_string()));
            self.pos += 1;
            return true;
        }
        let name = self.input[start..end].to_ascii_lowercase();
        self.pos = end;
        let mut attributes = Vec::new();
        let mut self_closing = false;
        loop {
            self.skip_whitespace();
            match self.bytes.get(self.pos) {
                None => break,
                Some(b'>') => {
                    self.pos += 1;
                    break;
                }
                Some(b'/') if self.bytes.get(self.pos + 1) == Some(&b'>') => {
                    self_closing = true;
                    self.pos += 2;
                    break;
                }
                Some(_) => {
                    if let Some(attribute) = self.attribute() {
                        attributes.push(attribute);
                    }
                }
            }
        }
        self_closing |= is_void_element(&name);
        let rawtext = !self_closing && RAWTEXT_ELEMENTS.contains(&name.as_str());
        self.out.push(Token::StartTag {
            name: name.clone(),
            attributes,
            self_closing,
        });
        if rawtext {
            return self.rawtext(name);
        }
        true
    }

    /// One `name`, `name=value` or `name="value"`. Stray bytes are skipped.
    fn attribute(&mut self) -> Option<(String, Option<String>)> {
        let start = self.pos;
        let end = self.name_end(start);
        if end == start {
            self.pos += 1;
            return None;
        }
        let name = self.input[start..end].to_ascii_lowercase();
        self.pos = end;
        self.skip_whitespace();
        if self.bytes.get(self.pos) != Some(&b'=') {
            return Some((name, None));
        }
        self.pos += 1;
        self.skip_whitespace();
        let value = match self.bytes.get(self.pos) {
            Some(&(quote @ (b'"' | b'\''))) => {
                let open = self.pos + 1;
                let close = self.find(quote, open).unwrap_or(self.bytes.len());
                self.pos = (close + 1).min(self.bytes.len());
                decode_entities(&self.input[open..close])
            }
            _ => {
                let open = self.pos;
                while let Some(&b) = self.bytes.get(self.pos) {
                    let closes = b == b'>' || (b == b'/' && self.bytes.get(self.pos + 1) == Some(&b'>'));
                    if b.is_ascii_whitespace() || closes {
                        break;
                    }
                    self.pos += 1;
                }
                self.input[open..self.pos].to_string()
            }
        };
        Some((name, Some(value)))
    }

    /// Body of `script`/`style` up to its close tag, kept verbatim.
    fn rawtext(&mut self, name: String) -> bool {
        let body = &self.input[self.pos..];
        let (text_end, resume) = match rawtext_close(body, &name) {
            Some((start, end)) => (start, Some(self.pos + end)),
            None => (body.len(), None),
        };
        if text_end > 0 {
            self.out.push(Token::Text(body[..text_end].to_string()));
        }
        self.out.push(Token::EndTag(name));
        match resume {
            Some(pos) => {
                self.pos = pos;
                true
            }
            None => false,
        }
    }
}

impl Document {
    /// Parse markup into a new detached fragment and return the fragment key.
    ///
    /// Parsing is lenient: malformed markup produces whatever tree the builder recovers.
    pub fn parse_fragment(&mut self, markup: &str) -> Result<NodeKey, DomError> {
        let fragment = self.create_fragment();
        let mut open_elements: Vec<(NodeKey, String)> = Vec::new();

        for token in tokenize(markup) {
            let parent = open_elements.last().map_or(fragment, |(key, _)| *key);
            match token {
                Token::Doctype(_) => {}
                Token::Comment(text) => {
                    let node = self.create_comment(&text);
                    self.append_child(parent, node)?;
                }
                Token::Text(text) => {
                    let node = self.create_text(&text);
                    self.append_child(parent, node)?;
                }
                Token::StartTag {
                    name,
                    attributes,
                    self_closing,
                } => {
                    let node = self.create_element(&name);
                    for (attr, value) in attributes {
                        self.push_parsed_attribute(node, attr, value)?;
                    }
                    self.append_child(parent, node)?;
                    if !self_closing {
                        open_elements.push((node, name));
                    }
                }
                Token::EndTag(name) => {
                    if let Some(pos) = open_elements.iter().rposition(|(_, open)| *open == name) {
                        open_elements.truncate(pos);
                    } else {
                        log::trace!(target: "dom.markup", "ignoring unmatched end tag </{name}>");
                    }
                }
            }
        }
        Ok(fragment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokenizes_placeholder_attribute_names() {
        let tokens = tokenize(r#"<div $v0$ title="a $v1$ b" id=$v2$>"#);
        assert_eq!(
            tokens,
            vec![Token::StartTag {
                name: "div".into(),
                attributes: vec![
                    ("$v0$".into(), None),
                    ("title".into(), Some("a $v1$ b".into())),
                    ("id".into(), Some("$v2$".into())),
                ],
                self_closing: false,
            }]
        );
    }

    #[test]
    fn tokenizes_comments_and_decodes_text() {
        let tokens = tokenize("a &amp; b<!--$v0$-->");
        assert_eq!(
            tokens,
            vec![Token::Text("a & b".into()), Token::Comment("$v0$".into())]
        );
    }

    #[test]
    fn keeps_script_rawtext_verbatim() {
        let tokens = tokenize("<script>if (a < b) {}</ScRiPt ><p>");
        assert_eq!(tokens[1], Token::Text("if (a < b) {}".into()));
        assert_eq!(tokens[2], Token::EndTag("script".into()));
        assert!(matches!(&tokens[3], Token::StartTag { name, .. } if name == "p"));
    }

    #[test]
    fn builds_nested_fragment_with_void_elements() {
        let mut doc = Document::new();
        let root = doc.parse_fragment("<ul><li>one<br>two</li><li>three</li></ul><input disabled>").unwrap();
        let top = doc.children(root).to_vec();
        assert_eq!(top.len(), 2);
        let items = doc.children(top[0]).to_vec();
        assert_eq!(items.len(), 2);
        assert_eq!(doc.children(items[0]).len(), 3);
        assert_eq!(doc.tag_name(top[1]), Some("input"));
        assert_eq!(doc.attributes(top[1]), &[("disabled".to_string(), None)]);
    }

    #[test]
    fn parsed_fragment_is_detached_and_keeps_first_duplicate_attribute() {
        let mut doc = Document::new();
        let root = doc.parse_fragment(r#"<p id="a" id="b">x</p>"#).unwrap();
        assert_eq!(doc.parent(root), None);
        let p = doc.children(root)[0];
        assert_eq!(doc.get_attribute(p, "id"), Some("a"));
        assert_eq!(doc.len(), 3);
    }

    #[test]
    fn ignores_unmatched_end_tags() {
        let mut doc = Document::new();
        let root = doc.parse_fragment("<div></span>text</div>").unwrap();
        let div = doc.children(root)[0];
        assert_eq!(doc.children(div).len(), 1);
    }

    #[test]
    fn lone_angle_bracket_is_text() {
        let tokens = tokenize("a < b");
        assert_eq!(
            tokens,
            vec![
                Token::Text("a ".into()),
                Token::Text("<".into()),
                Token::Text(" b".into())
            ]
        );
    }
}
