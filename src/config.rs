//! Formatter configuration
//!
//! ```yaml
//! policies: [default, partial]
//! max_depth: 2
//! default_marker: "_"
//! wildcard: "*"
//! reject_unused_args: false
//! ```
//!
//! Every key is optional. Policies are listed in precedence order: later
//! entries win where two policies handle the same step.

use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::default_key::{DefaultValue, DEFAULT_MARKER};
use crate::error::ConfigError;
use crate::formatter::{Formatter, DEFAULT_MAX_DEPTH};
use crate::policy::{PassThrough, Policy, RegexValidate, Wildcard};

/// Named policy variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PolicyKind {
    Partial,
    Glob,
    Default,
    Regex,
}

impl PolicyKind {
    pub(crate) fn build(self, config: &FormatterConfig) -> Arc<dyn Policy> {
        match self {
            PolicyKind::Partial => Arc::new(PassThrough),
            PolicyKind::Glob => Arc::new(Wildcard::new(config.wildcard.clone())),
            PolicyKind::Default => Arc::new(DefaultValue::new(config.default_marker.clone())),
            PolicyKind::Regex => Arc::new(RegexValidate),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FormatterConfig {
    pub policies: Vec<PolicyKind>,
    /// Nesting budget for fields inside format specs
    pub max_depth: usize,
    /// Attribute name introducing an inline default (`key._[default]`)
    pub default_marker: String,
    /// Text substituted by the glob policy
    pub wildcard: String,
    pub reject_unused_args: bool,
}

impl Default for FormatterConfig {
    fn default() -> Self {
        Self {
            policies: Vec::new(),
            max_depth: DEFAULT_MAX_DEPTH,
            default_marker: DEFAULT_MARKER.to_string(),
            wildcard: Wildcard::DEFAULT_TEXT.to_string(),
            reject_unused_args: false,
        }
    }
}

impl FormatterConfig {
    /// Parse and validate a YAML document.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let config = Self::from_yaml_str(&yaml)?;
        info!(
            path = %path.display(),
            policies = ?config.policies,
            "loaded formatter config"
        );
        Ok(config)
    }

    /// The marker must survive field-name splitting as a single attribute.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self
            .default_marker
            .contains(|c| matches!(c, '.' | '[' | ']' | '{' | '}' | ':' | '!'))
        {
            return Err(ConfigError::Invalid(format!(
                "default_marker '{}' may not contain field syntax characters",
                self.default_marker
            )));
        }
        Ok(())
    }

    pub fn build(&self) -> Formatter {
        Formatter::from_config(self)
    }
}
