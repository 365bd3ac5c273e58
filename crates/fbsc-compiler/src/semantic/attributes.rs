use fbsc_common::{Diagnostic, Span};
use indexmap::IndexMap;

use crate::ast::Metadata;

/// The raw value of one attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttributeValue {
    /// Written as a bare key: `(deprecated)`.
    Flag,
    /// Written as `key: value`; string values are unquoted.
    Value(String),
}

#[derive(Debug, Clone)]
pub struct Attribute {
    pub value: AttributeValue,
    pub span: Span,
}

impl Attribute {
    /// The value text, treating an empty value like a bare flag.
    pub fn text(&self) -> Option<&str> {
        match &self.value {
            AttributeValue::Value(text) if !text.is_empty() => Some(text),
            _ => None,
        }
    }
}

/// Outcome of reading an integer-valued attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntAttribute {
    Absent,
    /// Present, but as a flag or with text that is not an `i32`.
    Invalid,
    Value(i32),
}

/// Ordered, case-sensitive map of one declaration's attributes.
#[derive(Debug, Clone, Default)]
pub struct AttributeMap {
    entries: IndexMap<String, Attribute>,
}

impl AttributeMap {
    /// Reduce a parsed metadata list to a map.
    ///
    /// A repeated key yields a warning; the later value replaces the earlier
    /// one and the key keeps its first position.
    pub fn build(metadata: &Metadata) -> (AttributeMap, Vec<Diagnostic>) {
        let mut map = AttributeMap::default();
        let mut diagnostics = Vec::new();

        for entry in &metadata.entries {
            let value = match &entry.value {
                Some(v) => AttributeValue::Value(v.text.clone()),
                None => AttributeValue::Flag,
            };
            let attribute = Attribute {
                value,
                span: entry.span.clone(),
            };
            if let Some(previous) = map.entries.insert(entry.key.clone(), attribute) {
                diagnostics.push(
                    Diagnostic::warning(format!("duplicate attribute `{}`", entry.key))
                        .with_span(entry.span.clone())
                        .with_related(previous.span, "previously set here"),
                );
            }
        }

        (map, diagnostics)
    }

    pub fn get(&self, key: &str) -> Option<&Attribute> {
        self.entries.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn span_of(&self, key: &str) -> Option<&Span> {
        self.entries.get(key).map(|a| &a.span)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Attribute)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Resolve `key` with the three-outcome rule: absent gives `absent`,
    /// a bare flag (or empty value) gives `present`, and an explicit value
    /// goes through `parse`. A value `parse` rejects reports an error naming
    /// `expected` and falls back to `absent`.
    pub fn resolve<T>(
        &self,
        key: &str,
        absent: T,
        present: T,
        expected: &str,
        parse: impl FnOnce(&str) -> Option<T>,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> T {
        let Some(attribute) = self.get(key) else {
            return absent;
        };
        let Some(text) = attribute.text() else {
            return present;
        };
        match parse(text) {
            Some(value) => value,
            None => {
                diagnostics.push(
                    Diagnostic::error(format!(
                        "invalid value `{}` for attribute `{}`; expected {}",
                        text, key, expected
                    ))
                    .with_span(attribute.span.clone()),
                );
                absent
            }
        }
    }

    /// Read `key` as an `i32`.
    pub fn integer(&self, key: &str) -> IntAttribute {
        match self.get(key) {
            None => IntAttribute::Absent,
            Some(attribute) => attribute
                .text()
                .and_then(|text| text.trim().parse::<i32>().ok())
                .map_or(IntAttribute::Invalid, IntAttribute::Value),
        }
    }
}

/// Case-insensitive `true` / `false`.
pub fn parse_bool(text: &str) -> Option<bool> {
    let text = text.trim();
    if text.eq_ignore_ascii_case("true") {
        Some(true)
    } else if text.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}
