//! Partial string formatting
//!
//! Expands `{field}` templates, filling in the fields whose values are
//! available and deciding per policy what happens to the rest.
//!
//! Key concepts:
//! - A field that fails lookup becomes a [`FieldToken`] instead of an error
//! - A [`Policy`] decides what replaces a missing field: its own text
//!   (partial), a wildcard (glob), or an inline default (`key._[default]`)
//! - The original lookup error is raised only when no policy supplied a
//!   substitute
//! - Policies compose; later-declared ones win on conflicts ([`combine`])
//!
//! # Example
//!
//! ```
//! use partial_format::{combine, pformat, gformat, dformat, Args, Formatter};
//!
//! let name = "{param}/{id}/{loss:.2f}.csv";
//!
//! // Fill what we know now, the rest later.
//! let stage = pformat(name, &Args::new().kwarg("param", "lr0.1")).unwrap();
//! assert_eq!(stage, "lr0.1/{id}/{loss:.2f}.csv");
//! let done = pformat(&stage, &Args::new().kwarg("id", 7).kwarg("loss", 0.25)).unwrap();
//! assert_eq!(done, "lr0.1/7/0.25.csv");
//!
//! // Build a glob pattern from the same template.
//! let pattern = gformat(name, &Args::new().kwarg("param", "lr0.1")).unwrap();
//! assert_eq!(pattern, "lr0.1/*/*.csv");
//!
//! // Inline defaults bypass the numeric spec.
//! let file = dformat("{name}/loss_{loss._[--]:.2f}", &Args::new().kwarg("name", "abc")).unwrap();
//! assert_eq!(file, "abc/loss_--");
//!
//! // Mix policies.
//! let xformat = combine([Formatter::defaults(), Formatter::partial()]);
//! assert_eq!(xformat.format("{x._[--]:.2f}{unit}", &Args::new()).unwrap(), "--{unit}");
//! ```

pub mod config;
pub mod default_key;
pub mod error;
pub mod field;
pub mod format_spec;
pub mod formatter;
pub mod parser;
pub mod policy;
pub mod value;

use once_cell::sync::Lazy;

pub use config::{FormatterConfig, PolicyKind};
pub use default_key::{split_default_key, DefaultValue};
pub use error::{ConfigError, FormatError, LookupError, LookupErrorKind};
pub use field::{FieldToken, FieldValue};
pub use format_spec::{format_value, FormatSpec};
pub use formatter::{combine, convert_value, Formatter, DEFAULT_MAX_DEPTH};
pub use policy::{PassThrough, Policy, RegexValidate, Wildcard};
pub use value::Args;

/// Leaves missing fields in place
pub static PARTIAL: Lazy<Formatter> = Lazy::new(Formatter::partial);

/// Replaces missing fields with `*`
pub static GLOB: Lazy<Formatter> = Lazy::new(Formatter::glob);

/// Honours `key._[default]` fallbacks
pub static DEFAULT: Lazy<Formatter> = Lazy::new(Formatter::defaults);

/// Validates `/pattern/` format specs
pub static REGEX: Lazy<Formatter> = Lazy::new(Formatter::regex);

/// Partial formatting with [`PARTIAL`]
pub fn pformat(template: &str, args: &Args) -> Result<String, FormatError> {
    PARTIAL.format(template, args)
}

/// Glob formatting with [`GLOB`]
pub fn gformat(template: &str, args: &Args) -> Result<String, FormatError> {
    GLOB.format(template, args)
}

/// Default-value formatting with [`DEFAULT`]
pub fn dformat(template: &str, args: &Args) -> Result<String, FormatError> {
    DEFAULT.format(template, args)
}

/// Regex-validated formatting with [`REGEX`]
pub fn reformat(template: &str, args: &Args) -> Result<String, FormatError> {
    REGEX.format(template, args)
}
