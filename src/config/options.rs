//! Declarative options documents.

use serde::{Deserialize, Serialize};

use super::config::{Config, ConfigBuilder, TypeGroup};
use super::error::ConfigError;
use crate::value::TypeTag;

/// ConfigOptions is the serializable form of a Config.
///
/// Every key is optional; keys not listed here are rejected.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigOptions {
    pub exclude_paths: Vec<String>,
    pub exclude_regex_paths: Vec<String>,
    pub exclude_types: Vec<String>,
    pub ignore_type_in_groups: Vec<Vec<String>>,
    pub ignore_numeric_type_changes: bool,
    pub ignore_string_type_changes: bool,
    pub significant_digits: Option<u32>,
    pub number_format_notation: Option<String>,
    pub math_epsilon: Option<f64>,
    pub ignore_string_case: bool,
    pub ignore_order: bool,
    pub report_repetition: bool,
    pub ignore_nan_inequality: bool,
    pub ignore_private_variables: Option<bool>,
    pub verbose_level: Option<u8>,
    pub hasher: Option<String>,
}

impl ConfigOptions {
    /// Option keys accepted in an options document.
    pub const KEYS: &'static [&'static str] = &[
        "exclude_paths",
        "exclude_regex_paths",
        "exclude_types",
        "ignore_type_in_groups",
        "ignore_numeric_type_changes",
        "ignore_string_type_changes",
        "significant_digits",
        "number_format_notation",
        "math_epsilon",
        "ignore_string_case",
        "ignore_order",
        "report_repetition",
        "ignore_nan_inequality",
        "ignore_private_variables",
        "verbose_level",
        "hasher",
    ];

    /// Reads options from a generic document, rejecting unknown keys.
    pub fn from_document(doc: serde_json::Value) -> Result<Self, ConfigError> {
        match &doc {
            serde_json::Value::Null => return Ok(ConfigOptions::default()),
            serde_json::Value::Object(fields) => {
                if let Some(name) = fields.keys().find(|k| !Self::KEYS.contains(&k.as_str())) {
                    return Err(ConfigError::UnknownOption { name: name.clone() });
                }
            }
            other => {
                return Err(ConfigError::Parse(format!(
                    "expected a mapping of options, got {}",
                    other
                )))
            }
        }
        serde_json::from_value(doc).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Converts the options into a builder.
    pub fn into_builder(self) -> ConfigBuilder {
        let mut builder = Config::builder()
            .ignore_numeric_type_changes(self.ignore_numeric_type_changes)
            .ignore_string_type_changes(self.ignore_string_type_changes)
            .ignore_string_case(self.ignore_string_case)
            .ignore_order(self.ignore_order)
            .report_repetition(self.report_repetition)
            .ignore_nan_inequality(self.ignore_nan_inequality);

        for path in self.exclude_paths {
            builder = builder.exclude_path(path);
        }
        for pattern in self.exclude_regex_paths {
            builder = builder.exclude_regex_path(pattern);
        }
        for tag in self.exclude_types {
            builder = builder.exclude_type(tag);
        }
        for group in self.ignore_type_in_groups {
            builder = builder.ignore_type_in_group(TypeGroup::of(group.into_iter().map(TypeTag::from)));
        }
        if let Some(digits) = self.significant_digits {
            builder = builder.significant_digits(digits);
        }
        if let Some(notation) = self.number_format_notation {
            builder = builder.number_format_notation_name(notation);
        }
        if let Some(epsilon) = self.math_epsilon {
            builder = builder.math_epsilon(epsilon);
        }
        if let Some(private) = self.ignore_private_variables {
            builder = builder.ignore_private_variables(private);
        }
        if let Some(level) = self.verbose_level {
            builder = builder.verbose_level(level);
        }
        if let Some(hasher) = self.hasher {
            builder = builder.hasher_name(hasher);
        }
        builder
    }
}

impl TryFrom<ConfigOptions> for Config {
    type Error = ConfigError;

    fn try_from(options: ConfigOptions) -> Result<Self, Self::Error> {
        options.into_builder().build()
    }
}

impl Config {
    /// Builds a Config from a JSON options document.
    pub fn from_json(json: &str) -> Result<Config, ConfigError> {
        let doc: serde_json::Value =
            serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;
        Config::try_from(ConfigOptions::from_document(doc)?)
    }

    /// Builds a Config from a YAML options document.
    pub fn from_yaml(yaml: &str) -> Result<Config, ConfigError> {
        if yaml.trim().is_empty() {
            return Config::try_from(ConfigOptions::default());
        }
        let doc: serde_json::Value =
            serde_yaml::from_str(yaml).map_err(|e| ConfigError::Parse(e.to_string()))?;
        Config::try_from(ConfigOptions::from_document(doc)?)
    }
}
