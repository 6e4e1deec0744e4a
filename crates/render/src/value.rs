use crate::result::TemplateResult;
use dom::{Event, Listener};
use std::borrow::Cow;

/// A value bound to one template hole.
///
/// Which variants are accepted depends on where the hole landed: between nodes, text
/// values, results and flat lists of those; in an attribute, text values and handlers;
/// as a spread, [`Props`] or `Null`.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
    Handler(Listener),
    Props(Props),
    Result(TemplateResult),
    List(Vec<Value>),
}

impl Value {
    pub fn handler(f: impl Fn(&Event) + 'static) -> Value {
        Value::Handler(Listener::new(f))
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Number(_) => "number",
            Value::Text(_) => "text",
            Value::Handler(_) => "handler",
            Value::Props(_) => "props",
            Value::Result(_) => "template result",
            Value::List(_) => "list",
        }
    }

    /// Text form of scalar values: `Null` and `false` are empty, `true` is `"true"`,
    /// numbers use their shortest decimal form. `None` for every other variant.
    pub fn as_text(&self) -> Option<Cow<'_, str>> {
        match self {
            Value::Null | Value::Bool(false) => Some(Cow::Borrowed("")),
            Value::Bool(true) => Some(Cow::Borrowed("true")),
            Value::Number(n) => Some(Cow::Owned(n.to_string())),
            Value::Text(text) => Some(Cow::Borrowed(text)),
            Value::Handler(_) | Value::Props(_) | Value::Result(_) | Value::List(_) => None,
        }
    }

    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Number(n) => *n != 0.0 && !n.is_nan(),
            Value::Text(text) => !text.is_empty(),
            Value::Handler(_) | Value::Props(_) | Value::Result(_) | Value::List(_) => true,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

/// Escape `&`, `<` and `>` for placement as character data.
pub fn escape_text(text: &str) -> Cow<'_, str> {
    if !text.contains(['&', '<', '>']) {
        return Cow::Borrowed(text);
    }
    let mut out = String::with_capacity(text.len() + 8);
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(ch),
        }
    }
    Cow::Owned(out)
}

/// Ordered name/value map handed to components and used for attribute spreads.
/// Inserting an existing name replaces its value in place.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Props {
    entries: Vec<(String, Value)>,
}

impl Props {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        let name = name.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == name) {
            Some((_, v)) => *v = value,
            None => self.entries.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entries.iter().find(|(k, _)| k == name).map(|(_, v)| v)
    }

    /// Text of a scalar prop; empty when absent.
    pub fn text(&self, name: &str) -> String {
        self.get(name)
            .and_then(Value::as_text)
            .map(Cow::into_owned)
            .unwrap_or_default()
    }

    pub fn remove(&mut self, name: &str) -> Option<Value> {
        let pos = self.entries.iter().position(|(k, _)| k == name)?;
        Some(self.entries.remove(pos).1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Props {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut props = Props::new();
        for (name, value) in iter {
            props.insert(name, value);
        }
        props
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

impl From<&String> for Value {
    fn from(value: &String) -> Self {
        Value::Text(value.clone())
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

macro_rules! number_from {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Value {
                fn from(value: $ty) -> Self {
                    Value::Number(value as f64)
                }
            }
        )*
    };
}

number_from!(i32, i64, u32, u64, usize, f32, f64);

impl From<Listener> for Value {
    fn from(value: Listener) -> Self {
        Value::Handler(value)
    }
}

impl From<Props> for Value {
    fn from(value: Props) -> Self {
        Value::Props(value)
    }
}

impl From<TemplateResult> for Value {
    fn from(value: TemplateResult) -> Self {
        Value::Result(value)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(value: Vec<T>) -> Self {
        Value::List(value.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalar_text_forms() {
        assert_eq!(Value::Null.as_text().unwrap(), "");
        assert_eq!(Value::Bool(false).as_text().unwrap(), "");
        assert_eq!(Value::Bool(true).as_text().unwrap(), "true");
        assert_eq!(Value::from(3).as_text().unwrap(), "3");
        assert_eq!(Value::from(1.5).as_text().unwrap(), "1.5");
        assert!(Value::from(vec!["a"]).as_text().is_none());
    }

    #[test]
    fn escapes_markup_characters() {
        assert_eq!(escape_text("<b>&</b>"), "&lt;b&gt;&amp;&lt;/b&gt;");
        assert!(matches!(escape_text("plain"), Cow::Borrowed("plain")));
    }

    #[test]
    fn handlers_compare_by_identity() {
        let a = Value::handler(|_| {});
        let b = Value::handler(|_| {});
        assert_eq!(a, a.clone());
        assert_ne!(a, b);
    }

    #[test]
    fn props_replace_in_place() {
        let mut props: Props = [("a", 1), ("b", 2)].into_iter().collect();
        props.insert("a", 3);
        let names: Vec<_> = props.iter().map(|(k, _)| k).collect();
        assert_eq!(names, vec!["a", "b"]);
        assert_eq!(props.get("a"), Some(&Value::Number(3.0)));
        assert_eq!(props.text("missing"), "");
    }

    #[test]
    fn truthiness() {
        assert!(!Value::Null.is_truthy());
        assert!(!Value::from("").is_truthy());
        assert!(Value::from("no").is_truthy());
        assert!(!Value::from(0).is_truthy());
        assert!(Value::from(Props::new()).is_truthy());
    }
}
