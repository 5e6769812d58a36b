//! Missing-value policies
//!
//! A [`Policy`] overrides one or more steps of field resolution. Every
//! method defaults to "not handled", so a policy only implements the steps it
//! cares about. A [`Formatter`] holds an ordered list of policies and, for
//! each step, asks them from the last-declared to the first; the first one
//! that handles the step wins.
//!
//! | Policy | Step | Effect |
//! |---|---|---|
//! | [`PassThrough`] | missing value | re-emit `{key!conv:spec}` |
//! | [`Wildcard`] | missing value | insert `*` |
//! | [`DefaultValue`](crate::DefaultValue) | missing field | use `key._[default]` |
//! | [`RegexValidate`] | render | check `/pattern/` specs |

use std::fmt;

use regex::Regex;
use serde_json::Value;

use crate::error::{FormatError, LookupError};
use crate::field::{FieldToken, FieldValue};
use crate::formatter::Formatter;
use crate::value::{display_string, Args};

/// A resolution strategy plugged into a [`Formatter`].
///
/// Implementations must be stateless across calls: one formatter may expand
/// many templates concurrently.
pub trait Policy: fmt::Debug + Send + Sync {
    /// Short name used in logs and configuration
    fn name(&self) -> &'static str;

    /// Called when ordinary lookup of `key` fails.
    ///
    /// Return `Some` to supply the field's value (or a pre-resolved token)
    /// instead of the default missing-field token.
    fn missing_field(
        &self,
        _formatter: &Formatter,
        _error: &LookupError,
        _key: &str,
        _args: &Args,
    ) -> Result<Option<FieldValue>, FormatError> {
        Ok(None)
    }

    /// Runs after the conversion flag is stored on a token.
    ///
    /// Returns true when the policy handled the token.
    fn after_convert(&self, _token: &mut FieldToken) -> bool {
        false
    }

    /// Substitute for a field that is still missing at render time.
    fn missing_value(&self, _token: &FieldToken) -> Option<Value> {
        None
    }

    /// Render a real value, or `None` to fall through to ordinary formatting.
    fn render(
        &self,
        _formatter: &Formatter,
        _value: &Value,
        _spec: &str,
    ) -> Option<Result<String, FormatError>> {
        None
    }
}

// ============================================================================
// Pass-through
// ============================================================================

/// Leave missing fields in place so a later pass can fill them.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassThrough;

impl Policy for PassThrough {
    fn name(&self) -> &'static str {
        "partial"
    }

    fn missing_value(&self, token: &FieldToken) -> Option<Value> {
        Some(Value::String(token.field_text()))
    }
}

// ============================================================================
// Wildcard
// ============================================================================

/// Replace missing fields with a glob wildcard.
///
/// The wildcard is inserted verbatim, so numeric specs such as `:.2f` do not
/// reject it.
#[derive(Debug, Clone)]
pub struct Wildcard {
    text: String,
}

impl Wildcard {
    pub const DEFAULT_TEXT: &'static str = "*";

    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

impl Default for Wildcard {
    fn default() -> Self {
        Self::new(Self::DEFAULT_TEXT)
    }
}

impl Policy for Wildcard {
    fn name(&self) -> &'static str {
        "glob"
    }

    fn missing_value(&self, _token: &FieldToken) -> Option<Value> {
        Some(Value::String(self.text.clone()))
    }
}

// ============================================================================
// Regex validation
// ============================================================================

/// Validate values against `/pattern/` format specs.
///
/// The value's text form must match the pattern from its first character
/// (the match need not reach the end). Other specs format normally.
#[derive(Debug, Clone, Copy, Default)]
pub struct RegexValidate;

impl RegexValidate {
    fn validate(value: &Value, spec: &str, pattern: &str) -> Result<String, FormatError> {
        let text = display_string(value);
        let re = Regex::new(&format!("^(?:{})", pattern)).map_err(|e| {
            FormatError::InvalidPattern {
                pattern: spec.to_string(),
                message: e.to_string(),
            }
        })?;
        if re.is_match(&text) {
            Ok(text)
        } else {
            Err(FormatError::PatternMismatch {
                value: text,
                pattern: spec.to_string(),
            })
        }
    }
}

impl Policy for RegexValidate {
    fn name(&self) -> &'static str {
        "regex"
    }

    fn render(
        &self,
        _formatter: &Formatter,
        value: &Value,
        spec: &str,
    ) -> Option<Result<String, FormatError>> {
        // A lone `/` both opens and closes: an empty pattern.
        let body = spec.strip_prefix('/')?;
        let pattern = if body.is_empty() { body } else { body.strip_suffix('/')? };
        Some(Self::validate(value, spec, pattern))
    }
}
