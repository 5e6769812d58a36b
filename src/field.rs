//! Field Token
//!
//! A [`FieldToken`] stands in for a value that ordinary lookup could not
//! produce. It travels through the convert and render hooks collecting the
//! field's conversion and format spec, so a policy deciding on a substitute
//! sees the whole field.

use serde_json::Value;

use crate::error::LookupError;

/// Result of the lookup hook: a real value, or a token for a missing field
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Resolved(Value),
    Pending(FieldToken),
}

impl FieldValue {
    pub fn is_pending(&self) -> bool {
        matches!(self, FieldValue::Pending(_))
    }

    /// The token, if this field is still pending
    pub fn as_token(&self) -> Option<&FieldToken> {
        match self {
            FieldValue::Pending(token) => Some(token),
            FieldValue::Resolved(_) => None,
        }
    }
}

/// One substitution site whose lookup failed.
///
/// `value` and `raw_object` use `None` as the "no value" marker, so a
/// supplied `Value::Null` or empty string still counts as a value.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldToken {
    /// Field name as written; `None` when the failure was an index error
    pub key: Option<String>,
    pub conversion: Option<char>,
    pub format_spec: Option<String>,
    /// Substitute chosen by a policy, inserted verbatim
    pub value: Option<Value>,
    /// Object produced before fallback substitution; converted and formatted
    /// like an ordinary value
    pub raw_object: Option<Value>,
    pub error: LookupError,
}

impl FieldToken {
    /// Build a token for a failed lookup.
    ///
    /// Index failures drop the key: with auto numbering there is no reliable
    /// index to write back.
    pub fn from_error(error: LookupError, key: &str) -> Self {
        let key = if error.is_index_error() {
            None
        } else {
            Some(key.to_string())
        };
        Self {
            key,
            conversion: None,
            format_spec: None,
            value: None,
            raw_object: None,
            error,
        }
    }

    /// True while neither a substitute nor a raw object is available
    pub fn is_missing(&self) -> bool {
        self.value.is_none() && self.raw_object.is_none()
    }

    /// Canonical `{key!conv:spec}` text of this field
    pub fn field_text(&self) -> String {
        let mut text = String::from("{");
        if let Some(key) = &self.key {
            text.push_str(key);
        }
        if let Some(conv) = self.conversion {
            text.push('!');
            text.push(conv);
        }
        if let Some(spec) = self.format_spec.as_deref().filter(|s| !s.is_empty()) {
            text.push(':');
            text.push_str(spec);
        }
        text.push('}');
        text
    }
}
