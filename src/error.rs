//! Error types for template expansion and configuration.

use std::fmt;
use thiserror::Error;

/// The three ways ordinary field lookup can fail.
///
/// These are the only failures a policy may neutralise.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LookupErrorKind {
    /// Keyword argument or mapping member not found
    KeyNotFound,
    /// Positional argument or sequence element out of range
    IndexOutOfRange,
    /// Dotted attribute access on a value that has no such member
    AttributeNotFound,
}

impl fmt::Display for LookupErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LookupErrorKind::KeyNotFound => "key not found",
            LookupErrorKind::IndexOutOfRange => "index out of range",
            LookupErrorKind::AttributeNotFound => "attribute not found",
        };
        f.write_str(name)
    }
}

/// A failed field lookup.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {detail}")]
pub struct LookupError {
    pub kind: LookupErrorKind,
    pub detail: String,
}

impl LookupError {
    pub fn key_not_found(key: impl fmt::Display) -> Self {
        Self {
            kind: LookupErrorKind::KeyNotFound,
            detail: format!("'{}'", key),
        }
    }

    pub fn index_out_of_range(index: usize, len: usize) -> Self {
        Self {
            kind: LookupErrorKind::IndexOutOfRange,
            detail: format!("replacement index {} out of range (length {})", index, len),
        }
    }

    pub fn attribute_not_found(type_name: &str, attr: &str) -> Self {
        Self {
            kind: LookupErrorKind::AttributeNotFound,
            detail: format!("{} value has no attribute '{}'", type_name, attr),
        }
    }

    pub fn is_index_error(&self) -> bool {
        self.kind == LookupErrorKind::IndexOutOfRange
    }
}

/// Errors raised while expanding a template.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormatError {
    #[error(transparent)]
    Lookup(#[from] LookupError),

    #[error("Input ({value}) did not match the regex pattern ({pattern})")]
    PatternMismatch { value: String, pattern: String },

    #[error("invalid regex pattern {pattern}: {message}")]
    InvalidPattern { pattern: String, message: String },

    #[error("max string recursion exceeded (max depth {max_depth})")]
    RecursionDepthExceeded { max_depth: usize },

    #[error("{message} (at offset {position})")]
    Syntax { message: String, position: usize },

    #[error("cannot switch from manual field specification to automatic field numbering")]
    MixedNumbering,

    #[error("unknown conversion specifier {0}")]
    UnknownConversion(char),

    #[error("invalid format specifier '{0}'")]
    InvalidFormatSpec(String),

    #[error("unknown format code '{code}' for {type_name} value")]
    UnknownFormatCode { code: char, type_name: &'static str },

    #[error("{0}")]
    SpecNotAllowed(String),

    #[error("unsupported format string passed to {type_name} value: '{spec}'")]
    UnsupportedFormatSpec {
        type_name: &'static str,
        spec: String,
    },

    #[error("{type_name} value is not subscriptable")]
    NotSubscriptable { type_name: &'static str },

    #[error("{type_name} indices must be integers, not '{key}'")]
    InvalidIndex { type_name: &'static str, key: String },

    #[error("unused arguments: {}", .0.join(", "))]
    UnusedArguments(Vec<String>),
}

impl FormatError {
    pub fn syntax(message: impl Into<String>, position: usize) -> Self {
        FormatError::Syntax {
            message: message.into(),
            position,
        }
    }

    /// The underlying lookup failure, if this is one.
    pub fn as_lookup(&self) -> Option<&LookupError> {
        match self {
            FormatError::Lookup(e) => Some(e),
            _ => None,
        }
    }
}

/// Errors raised while loading a formatter configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}
