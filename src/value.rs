//! Argument model
//!
//! Arguments are JSON values: positional arguments are a list, keyword
//! arguments a map. Field names address into them with `.attr` and `[item]`.

use serde_json::{Map, Value};

use crate::error::{FormatError, LookupError};
use crate::parser::{Accessor, FieldHead, FieldPath};

/// Positional and keyword arguments for one expansion
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Args {
    pub positional: Vec<Value>,
    pub keyword: Map<String, Value>,
}

impl Args {
    /// Create empty arguments
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a positional argument
    pub fn arg(mut self, value: impl Into<Value>) -> Self {
        self.positional.push(value.into());
        self
    }

    /// Bind a keyword argument
    pub fn kwarg(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.keyword.insert(name.into(), value.into());
        self
    }

    /// Build keyword arguments from a JSON object.
    ///
    /// An array becomes positional arguments; any other value becomes the
    /// single positional argument.
    pub fn from_json(value: Value) -> Self {
        match value {
            Value::Object(keyword) => Self {
                positional: Vec::new(),
                keyword,
            },
            Value::Array(positional) => Self {
                positional,
                keyword: Map::new(),
            },
            other => Self::new().arg(other),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.positional.is_empty() && self.keyword.is_empty()
    }

    /// Resolve a split field name against these arguments.
    pub fn resolve(&self, path: &FieldPath) -> Result<Value, FormatError> {
        let mut current = match &path.head {
            FieldHead::Index(i) => self
                .positional
                .get(*i)
                .ok_or_else(|| LookupError::index_out_of_range(*i, self.positional.len()))?,
            FieldHead::Name(name) => self
                .keyword
                .get(name)
                .ok_or_else(|| LookupError::key_not_found(name))?,
        }
        .clone();

        for accessor in &path.rest {
            current = access(&current, accessor)?;
        }
        Ok(current)
    }
}

fn access(value: &Value, accessor: &Accessor) -> Result<Value, FormatError> {
    match accessor {
        Accessor::Attr(attr) => match value {
            Value::Object(map) => map
                .get(attr)
                .cloned()
                .ok_or_else(|| LookupError::attribute_not_found(type_name(value), attr).into()),
            _ => Err(LookupError::attribute_not_found(type_name(value), attr).into()),
        },
        Accessor::Item(key) => match (value, parse_index(key)) {
            (Value::Array(items), Some(i)) => items
                .get(i)
                .cloned()
                .ok_or_else(|| LookupError::index_out_of_range(i, items.len()).into()),
            (Value::String(s), Some(i)) => s
                .chars()
                .nth(i)
                .map(|c| Value::String(c.to_string()))
                .ok_or_else(|| LookupError::index_out_of_range(i, s.chars().count()).into()),
            (Value::Array(_), None) | (Value::String(_), None) => Err(FormatError::InvalidIndex {
                type_name: type_name(value),
                key: key.clone(),
            }),
            (Value::Object(map), _) => map
                .get(key)
                .cloned()
                .ok_or_else(|| LookupError::key_not_found(key).into()),
            _ => Err(FormatError::NotSubscriptable {
                type_name: type_name(value),
            }),
        },
    }
}

fn parse_index(key: &str) -> Option<usize> {
    if !key.is_empty() && key.bytes().all(|b| b.is_ascii_digit()) {
        key.parse().ok()
    } else {
        None
    }
}

/// Short type name used in error messages
pub fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_f64() => "float",
        Value::Number(_) => "integer",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Plain text form of a value (the `s` conversion)
pub fn display_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Representation form of a value (the `r` conversion)
pub fn repr_string(value: &Value) -> String {
    value.to_string()
}

/// Representation with every non-ASCII character escaped (the `a` conversion)
pub fn ascii_string(value: &Value) -> String {
    let repr = repr_string(value);
    let mut out = String::with_capacity(repr.len());
    for c in repr.chars() {
        if c.is_ascii() {
            out.push(c);
        } else {
            let mut units = [0u16; 2];
            for unit in c.encode_utf16(&mut units) {
                out.push_str(&format!("\\u{:04x}", unit));
            }
        }
    }
    out
}
