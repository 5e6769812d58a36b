//! Template expansion and the resolution hooks
//!
//! Expansion walks the template's segments and, for every field, runs three
//! hooks in order:
//!
//! 1. [`Formatter::lookup`] resolves the field name. A recognised lookup
//!    failure becomes a [`FieldToken`] instead of an error.
//! 2. [`Formatter::convert`] applies the `!conversion` to a real value, or
//!    records it on the token.
//! 3. [`Formatter::render`] formats a real value with its (expanded) spec, or
//!    asks the policies for a substitute and only then gives up with the
//!    original lookup error.
//!
//! The format spec is itself a template and is expanded between steps 2 and
//! 3, up to a fixed nesting depth.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, trace};

use crate::config::FormatterConfig;
use crate::default_key::DefaultValue;
use crate::error::{FormatError, LookupError};
use crate::field::{FieldToken, FieldValue};
use crate::format_spec::format_value;
use crate::parser::{parse_template, split_field_name, FieldHead};
use crate::policy::{PassThrough, Policy, RegexValidate, Wildcard};
use crate::value::{ascii_string, display_string, repr_string, Args};

/// Default nesting budget: the template itself plus one level of fields
/// inside format specs.
pub const DEFAULT_MAX_DEPTH: usize = 2;

/// Expands templates, delegating missing-field decisions to its policies.
///
/// Cheap to clone; policies are shared.
#[derive(Clone)]
pub struct Formatter {
    policies: Vec<Arc<dyn Policy>>,
    max_depth: usize,
    reject_unused_args: bool,
}

impl fmt::Debug for Formatter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Formatter")
            .field("policies", &self.policy_names())
            .field("max_depth", &self.max_depth)
            .field("reject_unused_args", &self.reject_unused_args)
            .finish()
    }
}

impl Default for Formatter {
    fn default() -> Self {
        Self::new()
    }
}

/// Per-call expansion state
#[derive(Debug, Default)]
struct Expansion {
    numbering: Numbering,
    used: HashSet<String>,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
enum Numbering {
    #[default]
    Unset,
    Auto(usize),
    Manual,
}

impl Numbering {
    /// Assign the next automatic index to an empty field name.
    fn field_name(&mut self, name: &str) -> Result<String, FormatError> {
        if name.is_empty() {
            match *self {
                Numbering::Manual => Err(FormatError::MixedNumbering),
                Numbering::Unset => {
                    *self = Numbering::Auto(1);
                    Ok("0".to_string())
                }
                Numbering::Auto(next) => {
                    *self = Numbering::Auto(next + 1);
                    Ok(next.to_string())
                }
            }
        } else if name.bytes().all(|b| b.is_ascii_digit()) {
            if let Numbering::Auto(_) = self {
                return Err(FormatError::MixedNumbering);
            }
            *self = Numbering::Manual;
            Ok(name.to_string())
        } else {
            Ok(name.to_string())
        }
    }
}

impl Formatter {
    /// A formatter with no policies: missing fields are errors.
    pub fn new() -> Self {
        Self {
            policies: Vec::new(),
            max_depth: DEFAULT_MAX_DEPTH,
            reject_unused_args: false,
        }
    }

    /// Leaves missing fields in the output as `{key!conv:spec}`.
    pub fn partial() -> Self {
        Self::new().with_policy(PassThrough)
    }

    /// Replaces missing fields with `*`.
    pub fn glob() -> Self {
        Self::new().with_policy(Wildcard::default())
    }

    /// Honours `key._[default]` fallbacks.
    pub fn defaults() -> Self {
        Self::new().with_policy(DefaultValue::default())
    }

    /// Validates `/pattern/` specs; no missing-value handling.
    pub fn regex() -> Self {
        Self::new().with_policy(RegexValidate)
    }

    /// Build a formatter from configuration.
    pub fn from_config(config: &FormatterConfig) -> Self {
        let mut formatter = Self::new()
            .with_max_depth(config.max_depth)
            .with_reject_unused_args(config.reject_unused_args);
        for kind in &config.policies {
            formatter.policies.push(kind.build(config));
        }
        formatter
    }

    /// Append a policy; it takes precedence over those already present.
    pub fn with_policy(mut self, policy: impl Policy + 'static) -> Self {
        self.policies.push(Arc::new(policy));
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_reject_unused_args(mut self, reject: bool) -> Self {
        self.reject_unused_args = reject;
        self
    }

    pub fn policy_names(&self) -> Vec<&'static str> {
        self.policies.iter().map(|p| p.name()).collect()
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Expand `template` with `args`.
    pub fn format(&self, template: &str, args: &Args) -> Result<String, FormatError> {
        let mut expansion = Expansion::default();
        let output = self.vformat(template, args, self.max_depth, &mut expansion)?;
        self.check_unused_args(&expansion.used, args)?;
        Ok(output)
    }

    fn vformat(
        &self,
        template: &str,
        args: &Args,
        depth: usize,
        expansion: &mut Expansion,
    ) -> Result<String, FormatError> {
        let mut output = String::with_capacity(template.len());

        for segment in parse_template(template)? {
            output.push_str(&segment.literal);
            let Some(field) = segment.field else {
                continue;
            };

            let name = expansion.numbering.field_name(&field.name)?;
            let (value, used) = self.lookup(&name, args)?;
            expansion.used.insert(used);

            let value = self.convert(value, field.conversion)?;

            let nested = depth
                .checked_sub(1)
                .ok_or(FormatError::RecursionDepthExceeded {
                    max_depth: self.max_depth,
                })?;
            let spec = self.vformat(&field.format_spec, args, nested, expansion)?;

            output.push_str(&self.render(value, &spec)?);
        }

        Ok(output)
    }

    // ========================================================================
    // Hooks
    // ========================================================================

    /// Resolve a field name; returns the value (or token) and the argument
    /// name it addressed.
    pub fn lookup(&self, key: &str, args: &Args) -> Result<(FieldValue, String), FormatError> {
        let path = split_field_name(key)?;
        let used = match &path.head {
            FieldHead::Index(i) => i.to_string(),
            FieldHead::Name(name) => name.clone(),
        };

        match args.resolve(&path) {
            Ok(value) => Ok((FieldValue::Resolved(value), used)),
            Err(FormatError::Lookup(error)) => {
                trace!(key, %error, "field lookup missed");
                Ok((self.missing_field(error, key, args)?, used))
            }
            Err(e) => Err(e),
        }
    }

    /// Handle a lookup failure: let a policy claim it, else build a token.
    pub fn missing_field(
        &self,
        error: LookupError,
        key: &str,
        args: &Args,
    ) -> Result<FieldValue, FormatError> {
        for policy in self.policies.iter().rev() {
            if let Some(field) = policy.missing_field(self, &error, key, args)? {
                debug!(policy = policy.name(), key, "policy resolved missing field");
                return Ok(field);
            }
        }
        Ok(FieldValue::Pending(FieldToken::from_error(error, key)))
    }

    /// Apply a conversion, or record it on a pending token.
    pub fn convert(
        &self,
        field: FieldValue,
        conversion: Option<char>,
    ) -> Result<FieldValue, FormatError> {
        match field {
            FieldValue::Resolved(value) => {
                Ok(FieldValue::Resolved(convert_value(value, conversion)?))
            }
            FieldValue::Pending(mut token) => {
                token.conversion = conversion;
                for policy in self.policies.iter().rev() {
                    if policy.after_convert(&mut token) {
                        break;
                    }
                }
                Ok(FieldValue::Pending(token))
            }
        }
    }

    /// Produce the final text for a field.
    pub fn render(&self, field: FieldValue, format_spec: &str) -> Result<String, FormatError> {
        let mut token = match field {
            FieldValue::Resolved(value) => return self.render_value(&value, format_spec),
            FieldValue::Pending(token) => token,
        };
        token.format_spec = (!format_spec.is_empty()).then(|| format_spec.to_string());

        if token.is_missing() {
            token.value = self.missing_value(&token);
        }

        if let Some(value) = token.value.take() {
            return Ok(display_string(&value));
        }
        if let Some(object) = token.raw_object.take() {
            let object = convert_value(object, token.conversion)?;
            return self.render_value(&object, format_spec);
        }

        trace!(field = %token.field_text(), "no substitute for missing field");
        Err(token.error.into())
    }

    fn missing_value(&self, token: &FieldToken) -> Option<Value> {
        self.policies.iter().rev().find_map(|policy| {
            let value = policy.missing_value(token)?;
            debug!(policy = policy.name(), field = %token.field_text(), "substituting missing field");
            Some(value)
        })
    }

    /// Ordinary formatting of a real value, with policy render overrides.
    pub fn render_value(&self, value: &Value, format_spec: &str) -> Result<String, FormatError> {
        for policy in self.policies.iter().rev() {
            if let Some(rendered) = policy.render(self, value, format_spec) {
                return rendered;
            }
        }
        format_value(value, format_spec)
    }

    fn check_unused_args(&self, used: &HashSet<String>, args: &Args) -> Result<(), FormatError> {
        if !self.reject_unused_args {
            return Ok(());
        }
        let unused: Vec<String> = (0..args.positional.len())
            .map(|i| i.to_string())
            .chain(args.keyword.keys().cloned())
            .filter(|name| !used.contains(name))
            .collect();
        if unused.is_empty() {
            Ok(())
        } else {
            Err(FormatError::UnusedArguments(unused))
        }
    }
}

/// Apply a `!conversion` to a value.
pub fn convert_value(value: Value, conversion: Option<char>) -> Result<Value, FormatError> {
    match conversion {
        None => Ok(value),
        Some('s') => Ok(Value::String(display_string(&value))),
        Some('r') => Ok(Value::String(repr_string(&value))),
        Some('a') => Ok(Value::String(ascii_string(&value))),
        Some(other) => Err(FormatError::UnknownConversion(other)),
    }
}

/// Merge formatters into one whose policies are the union of theirs.
///
/// Policies keep their order, so on conflicts those of later formatters take
/// precedence. Depth and unused-argument settings come from the last
/// formatter.
pub fn combine<I>(formatters: I) -> Formatter
where
    I: IntoIterator<Item = Formatter>,
{
    formatters
        .into_iter()
        .fold(Formatter::new(), |mut combined, formatter| {
            combined.policies.extend(formatter.policies);
            combined.max_depth = formatter.max_depth;
            combined.reject_unused_args = formatter.reject_unused_args;
            combined
        })
}
