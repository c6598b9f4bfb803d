//! LDAP-style target filters
//!
//! Grammar (RFC 1960 subset as used by service registries):
//!
//! ```text
//! filter     := '(' component ')'
//! component  := '&' filter+ | '|' filter+ | '!' filter | item
//! item       := attr ('=' | '~=' | '>=' | '<=') value
//! ```
//!
//! A value of `*` tests presence, other unescaped `*` characters make a
//! substring match. `\` escapes the next character. Attribute names are
//! matched case-insensitively against the property set.

use crate::constants::OBJECT_CLASS;
use crate::error::{Error, Result};
use crate::value_objects::Properties;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Parsed filter expression
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterNode {
    /// All children must match
    And(Vec<FilterNode>),
    /// At least one child must match
    Or(Vec<FilterNode>),
    /// Child must not match
    Not(Box<FilterNode>),
    /// `attr=value`
    Equal { attr: String, value: String },
    /// `attr~=value`, case and whitespace insensitive
    Approx { attr: String, value: String },
    /// `attr>=value`
    GreaterEq { attr: String, value: String },
    /// `attr<=value`
    LessEq { attr: String, value: String },
    /// `attr=*`
    Present { attr: String },
    /// `attr=ini*any*fin`
    Substring {
        attr: String,
        initial: Option<String>,
        any: Vec<String>,
        last: Option<String>,
    },
}

/// A target filter together with its source text
#[derive(Debug, Clone)]
pub struct Filter {
    source: String,
    root: FilterNode,
}

impl Filter {
    /// Parse a filter string
    pub fn parse(source: &str) -> Result<Self> {
        let mut parser = Parser {
            source,
            bytes: source.as_bytes(),
            pos: 0,
        };
        parser.skip_ws();
        let root = parser.filter()?;
        parser.skip_ws();
        if parser.pos != parser.bytes.len() {
            return Err(parser.error("trailing characters after filter"));
        }
        Ok(Self {
            source: source.trim().to_string(),
            root,
        })
    }

    /// `(objectClass=<interface>)`
    pub fn object_class(interface: &str) -> Self {
        Self {
            source: format!("({OBJECT_CLASS}={})", escape(interface)),
            root: FilterNode::Equal {
                attr: OBJECT_CLASS.to_string(),
                value: interface.to_string(),
            },
        }
    }

    /// Source text of the filter
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Parsed expression tree
    pub fn root(&self) -> &FilterNode {
        &self.root
    }

    /// Conjunction of two filters
    pub fn and(&self, other: &Filter) -> Filter {
        Filter {
            source: format!("(&{}{})", self.source, other.source),
            root: FilterNode::And(vec![self.root.clone(), other.root.clone()]),
        }
    }

    /// Evaluate the filter against a property set
    pub fn matches(&self, properties: &Properties) -> bool {
        self.root.matches(properties)
    }
}

impl PartialEq for Filter {
    fn eq(&self, other: &Self) -> bool {
        self.root == other.root
    }
}

impl Eq for Filter {}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

impl FromStr for Filter {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl Serialize for Filter {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.source)
    }
}

impl<'de> Deserialize<'de> for Filter {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let source = String::deserialize(deserializer)?;
        Filter::parse(&source).map_err(serde::de::Error::custom)
    }
}

/// Escape the characters that are special inside filter values
pub fn escape(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '(' | ')' | '*' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

impl FilterNode {
    /// Evaluate this node against a property set
    pub fn matches(&self, properties: &Properties) -> bool {
        match self {
            Self::And(children) => children.iter().all(|c| c.matches(properties)),
            Self::Or(children) => children.iter().any(|c| c.matches(properties)),
            Self::Not(child) => !child.matches(properties),
            Self::Present { attr } => properties.get_ignore_case(attr).is_some(),
            Self::Equal { attr, value } => {
                lookup(properties, attr, |v| compare(v, value) == Some(Ordering::Equal))
            }
            Self::Approx { attr, value } => lookup(properties, attr, |v| approx(v, value)),
            Self::GreaterEq { attr, value } => lookup(properties, attr, |v| {
                matches!(compare(v, value), Some(Ordering::Greater | Ordering::Equal))
            }),
            Self::LessEq { attr, value } => lookup(properties, attr, |v| {
                matches!(compare(v, value), Some(Ordering::Less | Ordering::Equal))
            }),
            Self::Substring {
                attr,
                initial,
                any,
                last,
            } => lookup(properties, attr, |v| {
                v.as_str()
                    .is_some_and(|s| substring(s, initial.as_deref(), any, last.as_deref()))
            }),
        }
    }
}

/// Apply `test` to the attribute value, or to each element of an array value
fn lookup(properties: &Properties, attr: &str, test: impl Fn(&Value) -> bool) -> bool {
    match properties.get_ignore_case(attr) {
        Some(Value::Array(values)) => values.iter().any(&test),
        Some(value) => test(value),
        None => false,
    }
}

fn compare(actual: &Value, expected: &str) -> Option<Ordering> {
    match actual {
        Value::String(s) => Some(s.as_str().cmp(expected)),
        Value::Bool(b) => expected
            .trim()
            .parse::<bool>()
            .ok()
            .filter(|e| e == b)
            .map(|_| Ordering::Equal),
        Value::Number(n) => {
            let expected = expected.trim();
            if let (Some(a), Ok(e)) = (n.as_i64(), expected.parse::<i64>()) {
                return Some(a.cmp(&e));
            }
            let a = n.as_f64()?;
            let e = expected.parse::<f64>().ok()?;
            a.partial_cmp(&e)
        }
        _ => None,
    }
}

fn approx(actual: &Value, expected: &str) -> bool {
    let normalize = |s: &str| -> String {
        s.chars()
            .filter(|c| !c.is_whitespace())
            .flat_map(char::to_lowercase)
            .collect()
    };
    match actual {
        Value::String(s) => normalize(s) == normalize(expected),
        other => compare(other, expected) == Some(Ordering::Equal),
    }
}

fn substring(s: &str, initial: Option<&str>, any: &[String], last: Option<&str>) -> bool {
    let mut rest = s;
    if let Some(prefix) = initial {
        match rest.strip_prefix(prefix) {
            Some(r) => rest = r,
            None => return false,
        }
    }
    for part in any {
        match rest.find(part.as_str()) {
            Some(idx) => rest = &rest[idx + part.len()..],
            None => return false,
        }
    }
    last.is_none_or(|suffix| rest.ends_with(suffix))
}

struct Parser<'a> {
    source: &'a str,
    bytes: &'a [u8],
    pos: usize,
}

impl Parser<'_> {
    fn error(&self, message: &str) -> Error {
        Error::filter(self.source, format!("{message} at offset {}", self.pos))
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn skip_ws(&mut self) {
        while self.peek().is_some_and(|b| b.is_ascii_whitespace()) {
            self.pos += 1;
        }
    }

    fn expect(&mut self, byte: u8) -> Result<()> {
        if self.peek() == Some(byte) {
            self.pos += 1;
            Ok(())
        } else {
            Err(self.error(&format!("expected '{}'", byte as char)))
        }
    }

    fn filter(&mut self) -> Result<FilterNode> {
        self.expect(b'(')?;
        self.skip_ws();
        let node = match self.peek() {
            Some(b'&') => {
                self.pos += 1;
                FilterNode::And(self.filter_list()?)
            }
            Some(b'|') => {
                self.pos += 1;
                FilterNode::Or(self.filter_list()?)
            }
            Some(b'!') => {
                self.pos += 1;
                self.skip_ws();
                FilterNode::Not(Box::new(self.filter()?))
            }
            Some(_) => self.item()?,
            None => return Err(self.error("unexpected end of filter")),
        };
        self.skip_ws();
        self.expect(b')')?;
        Ok(node)
    }

    fn filter_list(&mut self) -> Result<Vec<FilterNode>> {
        let mut children = Vec::new();
        self.skip_ws();
        while self.peek() == Some(b'(') {
            children.push(self.filter()?);
            self.skip_ws();
        }
        if children.is_empty() {
            return Err(self.error("empty filter list"));
        }
        Ok(children)
    }

    fn item(&mut self) -> Result<FilterNode> {
        let start = self.pos;
        while let Some(b) = self.peek() {
            if matches!(b, b'=' | b'~' | b'<' | b'>' | b'(' | b')') {
                break;
            }
            self.pos += 1;
        }
        let attr = self.source[start..self.pos].trim().to_string();
        if attr.is_empty() {
            return Err(self.error("missing attribute name"));
        }

        let op = match self.peek() {
            Some(b'=') => {
                self.pos += 1;
                b'='
            }
            Some(op @ (b'~' | b'<' | b'>')) => {
                self.pos += 1;
                self.expect(b'=')?;
                op
            }
            _ => return Err(self.error("expected comparison operator")),
        };

        let segments = self.value()?;
        match op {
            b'=' => Ok(equality_node(attr, segments)),
            _ => {
                if segments.len() > 1 {
                    return Err(self.error("wildcards are only allowed in equality items"));
                }
                let value = segments.into_iter().next().unwrap_or_default();
                Ok(match op {
                    b'~' => FilterNode::Approx { attr, value },
                    b'>' => FilterNode::GreaterEq { attr, value },
                    _ => FilterNode::LessEq { attr, value },
                })
            }
        }
    }

    /// Value split on unescaped `*`
    fn value(&mut self) -> Result<Vec<String>> {
        let mut segments = vec![String::new()];
        let mut buf: Vec<u8> = Vec::new();
        loop {
            match self.peek() {
                None => return Err(self.error("unterminated value")),
                Some(b')') => break,
                Some(b'(') => return Err(self.error("unescaped '(' in value")),
                Some(b'\\') => {
                    self.pos += 1;
                    let escaped = self.peek().ok_or_else(|| self.error("dangling escape"))?;
                    buf.push(escaped);
                    self.pos += 1;
                }
                Some(b'*') => {
                    self.pos += 1;
                    flush(&mut segments, &mut buf);
                    segments.push(String::new());
                }
                Some(b) => {
                    buf.push(b);
                    self.pos += 1;
                }
            }
        }
        flush(&mut segments, &mut buf);
        Ok(segments)
    }
}

fn flush(segments: &mut [String], buf: &mut Vec<u8>) {
    if let Some(segment) = segments.last_mut() {
        segment.push_str(&String::from_utf8_lossy(buf));
    }
    buf.clear();
}

fn equality_node(attr: String, mut segments: Vec<String>) -> FilterNode {
    if segments.len() == 1 {
        let value = segments.pop().unwrap_or_default();
        return FilterNode::Equal { attr, value };
    }
    if segments.len() == 2 && segments.iter().all(String::is_empty) {
        return FilterNode::Present { attr };
    }
    let last = segments.pop().filter(|s| !s.is_empty());
    let initial = Some(segments.remove(0)).filter(|s| !s.is_empty());
    let any = segments.into_iter().filter(|s| !s.is_empty()).collect();
    FilterNode::Substring {
        attr,
        initial,
        any,
        last,
    }
}
