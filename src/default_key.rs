//! Inline default values
//!
//! A field name may carry its own fallback:
//!
//! ```text
//! {loss._[--]:.2f}     -> value of `loss` formatted with .2f, or "--"
//! ```
//!
//! The suffix is an attribute named after the marker (`_` by default)
//! followed by an index whose text is the default. The default is inserted
//! verbatim; the field's conversion and format spec only apply to a real
//! value.

use serde_json::Value;
use tracing::debug;

use crate::error::{FormatError, LookupError};
use crate::field::FieldValue;
use crate::formatter::Formatter;
use crate::parser::{split_field_name, Accessor, FieldHead};
use crate::policy::Policy;
use crate::value::Args;

pub const DEFAULT_MARKER: &str = "_";

/// Split `base.<marker>[default]` into `(base, default)`.
///
/// With an empty marker the syntax is `base[default]`. Returns `None` when
/// the key does not end in the default syntax.
pub fn split_default_key(key: &str, marker: &str) -> Option<(String, String)> {
    let path = split_field_name(key).ok()?;
    let default = match path.rest.last()? {
        Accessor::Item(text) => text.clone(),
        Accessor::Attr(_) => return None,
    };

    let suffix = if marker.is_empty() {
        format!("[{}]", default)
    } else {
        let n = path.rest.len();
        match n.checked_sub(2).map(|i| &path.rest[i]) {
            Some(Accessor::Attr(attr)) if attr == marker => {}
            _ => return None,
        }
        format!(".{}[{}]", marker, default)
    };

    let base = key.strip_suffix(&suffix)?;
    Some((base.to_string(), default))
}

/// Use per-field defaults written into the key.
///
/// Fields without the default syntax, and fields addressing a positional
/// argument, get ordinary missing-field handling.
#[derive(Debug, Clone)]
pub struct DefaultValue {
    marker: String,
}

impl DefaultValue {
    pub fn new(marker: impl Into<String>) -> Self {
        Self {
            marker: marker.into(),
        }
    }

    pub fn marker(&self) -> &str {
        &self.marker
    }
}

impl Default for DefaultValue {
    fn default() -> Self {
        Self::new(DEFAULT_MARKER)
    }
}

impl Policy for DefaultValue {
    fn name(&self) -> &'static str {
        "default"
    }

    fn missing_field(
        &self,
        formatter: &Formatter,
        _error: &LookupError,
        key: &str,
        args: &Args,
    ) -> Result<Option<FieldValue>, FormatError> {
        let Some((base, default)) = split_default_key(key, &self.marker) else {
            return Ok(None);
        };
        if matches!(split_field_name(&base)?.head, FieldHead::Index(_)) {
            return Ok(None);
        }

        let (field, _) = formatter.lookup(&base, args)?;
        match field {
            FieldValue::Pending(mut token) if token.is_missing() => {
                debug!(key, default = %default, "using inline default");
                token.key = Some(key.to_string());
                token.value = Some(Value::String(default));
                Ok(Some(FieldValue::Pending(token)))
            }
            other => Ok(Some(other)),
        }
    }
}
