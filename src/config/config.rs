//! Comparison configuration and its builder.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeSet;
use std::sync::Arc;

use super::error::ConfigError;
use super::exclude::{normalize_path, Exclusions};
use crate::hash::{hasher_by_name, HashFunction, Sha256Hasher};
use crate::value::{Number, NumberNotation, TypeTag};

/// Places used for canonical numbers when numeric types are interchangeable
/// and no precision was configured.
pub const DEFAULT_NUMERIC_GROUP_PRECISION: u32 = 12;

/// Largest accepted significant digit count.
pub const MAX_SIGNIFICANT_DIGITS: u32 = 17;

/// Prefix marking private keys and fields.
pub const PRIVATE_PREFIX: &str = "__";

/// Largest accepted verbose level of the text view.
pub const MAX_VERBOSE_LEVEL: u8 = 2;

type FormatFn = dyn Fn(&Number, u32, NumberNotation) -> String + Send + Sync;

/// NumberFormatter renders a number at a precision for hashing and for
/// precision comparisons.
#[derive(Clone)]
pub struct NumberFormatter(Arc<FormatFn>);

impl NumberFormatter {
    pub fn new<F>(format: F) -> Self
    where
        F: Fn(&Number, u32, NumberNotation) -> String + Send + Sync + 'static,
    {
        NumberFormatter(Arc::new(format))
    }

    pub fn format(&self, n: &Number, digits: u32, notation: NumberNotation) -> String {
        (self.0)(n, digits, notation)
    }
}

impl Default for NumberFormatter {
    fn default() -> Self {
        NumberFormatter::new(|n, digits, notation| n.to_precision(digits, notation))
    }
}

impl std::fmt::Debug for NumberFormatter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("NumberFormatter")
    }
}

/// TypeGroup is a set of type tags treated as mutually substitutable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeGroup {
    name: String,
    members: BTreeSet<TypeTag>,
}

impl TypeGroup {
    /// Creates a group; the name is used as the canonical tag of its members.
    pub fn new(name: impl Into<String>, members: impl IntoIterator<Item = TypeTag>) -> Self {
        TypeGroup {
            name: name.into(),
            members: members.into_iter().collect(),
        }
    }

    /// Creates a group named after its members, e.g. `int|str`.
    pub fn of(members: impl IntoIterator<Item = TypeTag>) -> Self {
        let members: BTreeSet<TypeTag> = members.into_iter().collect();
        let name = members
            .iter()
            .map(TypeTag::as_str)
            .collect::<Vec<_>>()
            .join("|");
        TypeGroup { name, members }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn contains(&self, tag: &TypeTag) -> bool {
        self.members.contains(tag)
    }

    pub fn members(&self) -> impl Iterator<Item = &TypeTag> {
        self.members.iter()
    }
}

/// All numeric types.
pub static NUMBER_GROUP: Lazy<TypeGroup> =
    Lazy::new(|| TypeGroup::new("number", [TypeTag::INT, TypeTag::UINT, TypeTag::FLOAT]));

/// Text and raw bytes.
pub static STRING_GROUP: Lazy<TypeGroup> =
    Lazy::new(|| TypeGroup::new("str", [TypeTag::STR, TypeTag::BYTES]));

/// Config holds every option of the hashing and diff engines.
///
/// A Config is validated once when built and is immutable afterwards.
#[derive(Debug, Clone)]
pub struct Config {
    exclusions: Exclusions,
    type_groups: Vec<TypeGroup>,
    significant_digits: Option<u32>,
    notation: NumberNotation,
    number_formatter: NumberFormatter,
    math_epsilon: Option<f64>,
    ignore_string_case: bool,
    ignore_order: bool,
    report_repetition: bool,
    ignore_nan_inequality: bool,
    ignore_private_variables: bool,
    verbose_level: u8,
    hasher: Arc<dyn HashFunction>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            exclusions: Exclusions::default(),
            type_groups: Vec::new(),
            significant_digits: None,
            notation: NumberNotation::Fixed,
            number_formatter: NumberFormatter::default(),
            math_epsilon: None,
            ignore_string_case: false,
            ignore_order: false,
            report_repetition: false,
            ignore_nan_inequality: false,
            ignore_private_variables: true,
            verbose_level: 1,
            hasher: Arc::new(Sha256Hasher),
        }
    }
}

impl Config {
    /// Creates a new ConfigBuilder.
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::new()
    }

    pub fn exclusions(&self) -> &Exclusions {
        &self.exclusions
    }

    pub fn type_groups(&self) -> &[TypeGroup] {
        &self.type_groups
    }

    pub fn significant_digits(&self) -> Option<u32> {
        self.significant_digits
    }

    pub fn number_format_notation(&self) -> NumberNotation {
        self.notation
    }

    pub fn math_epsilon(&self) -> Option<f64> {
        self.math_epsilon
    }

    pub fn ignore_string_case(&self) -> bool {
        self.ignore_string_case
    }

    pub fn ignore_order(&self) -> bool {
        self.ignore_order
    }

    pub fn report_repetition(&self) -> bool {
        self.report_repetition
    }

    pub fn ignore_nan_inequality(&self) -> bool {
        self.ignore_nan_inequality
    }

    pub fn ignore_private_variables(&self) -> bool {
        self.ignore_private_variables
    }

    /// How much detail the text view carries: 0 drops the values of type
    /// changes, 2 adds the values of added and removed keys and attributes.
    pub fn verbose_level(&self) -> u8 {
        self.verbose_level
    }

    /// Formats a number at `digits` places with the configured formatter.
    pub fn format_number(&self, n: &Number, digits: u32) -> String {
        self.number_formatter.format(n, digits, self.notation)
    }

    pub fn hasher(&self) -> &dyn HashFunction {
        self.hasher.as_ref()
    }

    /// Returns the first group containing `tag`.
    pub fn group_of(&self, tag: &TypeTag) -> Option<&TypeGroup> {
        self.type_groups.iter().find(|g| g.contains(tag))
    }

    /// Returns true if values of the two types may be compared directly.
    pub fn types_equivalent(&self, a: &TypeTag, b: &TypeTag) -> bool {
        a == b || self.type_groups.iter().any(|g| g.contains(a) && g.contains(b))
    }

    /// Returns the tag used in canonical encodings: the group name when the
    /// type belongs to a group, else the type itself.
    pub fn canonical_tag<'a>(&'a self, tag: &'a TypeTag) -> &'a str {
        match self.group_of(tag) {
            Some(group) => group.name(),
            None => tag.as_str(),
        }
    }

    /// Returns true if text and bytes are folded without their type tag.
    pub fn folds_string_types(&self) -> bool {
        self.group_of(&TypeTag::STR)
            .map_or(false, |g| g.contains(&TypeTag::BYTES))
    }

    /// Returns the precision used for canonical numbers.
    pub fn numeric_precision(&self) -> Option<u32> {
        self.significant_digits.or_else(|| {
            let grouped = [TypeTag::INT, TypeTag::UINT, TypeTag::FLOAT]
                .iter()
                .any(|t| self.group_of(t).is_some());
            grouped.then_some(DEFAULT_NUMERIC_GROUP_PRECISION)
        })
    }

    /// Returns true if a mapping key or record field is private and skipped.
    pub fn is_private_name(&self, name: &str) -> bool {
        self.ignore_private_variables && name.starts_with(PRIVATE_PREFIX)
    }
}

/// ConfigBuilder collects options and validates them in [`ConfigBuilder::build`].
#[derive(Debug, Default)]
pub struct ConfigBuilder {
    exclude_paths: Vec<String>,
    exclude_regex_paths: Vec<String>,
    exclude_types: Vec<TypeTag>,
    type_groups: Vec<TypeGroup>,
    ignore_numeric_type_changes: bool,
    ignore_string_type_changes: bool,
    significant_digits: Option<u32>,
    notation: Option<String>,
    math_epsilon: Option<f64>,
    ignore_string_case: bool,
    ignore_order: bool,
    report_repetition: bool,
    ignore_nan_inequality: bool,
    ignore_private_variables: Option<bool>,
    verbose_level: Option<u8>,
    number_formatter: Option<NumberFormatter>,
    hasher: Option<Arc<dyn HashFunction>>,
    hasher_name: Option<String>,
}

impl ConfigBuilder {
    /// Creates a new ConfigBuilder.
    pub fn new() -> Self {
        ConfigBuilder::default()
    }

    /// Excludes an exact path such as `root['secret']`.
    pub fn exclude_path(mut self, path: impl Into<String>) -> Self {
        self.exclude_paths.push(path.into());
        self
    }

    /// Excludes every path matching a regular expression.
    pub fn exclude_regex_path(mut self, pattern: impl Into<String>) -> Self {
        self.exclude_regex_paths.push(pattern.into());
        self
    }

    pub fn exclude_type(mut self, tag: impl Into<TypeTag>) -> Self {
        self.exclude_types.push(tag.into());
        self
    }

    /// Declares a set of types mutually substitutable.
    pub fn ignore_type_in_group(mut self, group: TypeGroup) -> Self {
        self.type_groups.push(group);
        self
    }

    pub fn ignore_numeric_type_changes(mut self, value: bool) -> Self {
        self.ignore_numeric_type_changes = value;
        self
    }

    pub fn ignore_string_type_changes(mut self, value: bool) -> Self {
        self.ignore_string_type_changes = value;
        self
    }

    pub fn significant_digits(mut self, digits: u32) -> Self {
        self.significant_digits = Some(digits);
        self
    }

    pub fn number_format_notation(mut self, notation: NumberNotation) -> Self {
        self.notation = Some(match notation {
            NumberNotation::Fixed => "f".to_string(),
            NumberNotation::Exponential => "e".to_string(),
        });
        self
    }

    /// Sets the notation by its short name, validated at build time.
    pub fn number_format_notation_name(mut self, name: impl Into<String>) -> Self {
        self.notation = Some(name.into());
        self
    }

    /// Treats numbers within `epsilon` of each other as equal.
    pub fn math_epsilon(mut self, epsilon: f64) -> Self {
        self.math_epsilon = Some(epsilon);
        self
    }

    pub fn ignore_string_case(mut self, value: bool) -> Self {
        self.ignore_string_case = value;
        self
    }

    pub fn ignore_order(mut self, value: bool) -> Self {
        self.ignore_order = value;
        self
    }

    pub fn report_repetition(mut self, value: bool) -> Self {
        self.report_repetition = value;
        self
    }

    pub fn ignore_nan_inequality(mut self, value: bool) -> Self {
        self.ignore_nan_inequality = value;
        self
    }

    pub fn ignore_private_variables(mut self, value: bool) -> Self {
        self.ignore_private_variables = Some(value);
        self
    }

    /// Sets the detail level of the text view, 0 to 2.
    pub fn verbose_level(mut self, level: u8) -> Self {
        self.verbose_level = Some(level);
        self
    }

    /// Replaces the function that renders numbers at a precision.
    pub fn number_to_string<F>(mut self, format: F) -> Self
    where
        F: Fn(&Number, u32, NumberNotation) -> String + Send + Sync + 'static,
    {
        self.number_formatter = Some(NumberFormatter::new(format));
        self
    }

    /// Uses a custom hash function.
    pub fn hasher(mut self, hasher: Arc<dyn HashFunction>) -> Self {
        self.hasher = Some(hasher);
        self.hasher_name = None;
        self
    }

    /// Selects a built-in hash function by name, validated at build time.
    pub fn hasher_name(mut self, name: impl Into<String>) -> Self {
        self.hasher_name = Some(name.into());
        self.hasher = None;
        self
    }

    /// Validates the options and builds the Config.
    pub fn build(self) -> Result<Config, ConfigError> {
        let mut patterns = Vec::with_capacity(self.exclude_regex_paths.len());
        for pattern in self.exclude_regex_paths {
            let re = Regex::new(&pattern)
                .map_err(|source| ConfigError::InvalidPattern { pattern, source })?;
            patterns.push(re);
        }

        if let Some(digits) = self.significant_digits {
            if digits > MAX_SIGNIFICANT_DIGITS {
                return Err(ConfigError::invalid_option(
                    "significant_digits",
                    format!("must be at most {}", MAX_SIGNIFICANT_DIGITS),
                ));
            }
        }

        if let Some(epsilon) = self.math_epsilon {
            if !epsilon.is_finite() || epsilon < 0.0 {
                return Err(ConfigError::invalid_option(
                    "math_epsilon",
                    "must be a finite, non-negative number",
                ));
            }
        }

        let verbose_level = self.verbose_level.unwrap_or(1);
        if verbose_level > MAX_VERBOSE_LEVEL {
            return Err(ConfigError::invalid_option(
                "verbose_level",
                format!("must be at most {}", MAX_VERBOSE_LEVEL),
            ));
        }

        let notation = match self.notation {
            Some(name) => NumberNotation::from_name(&name).ok_or_else(|| {
                ConfigError::invalid_option(
                    "number_format_notation",
                    format!("expected 'f' or 'e', got {:?}", name),
                )
            })?,
            None => NumberNotation::Fixed,
        };

        let hasher = match (self.hasher, self.hasher_name) {
            (Some(hasher), _) => hasher,
            (None, Some(name)) => {
                hasher_by_name(&name).ok_or(ConfigError::UnknownHasher(name))?
            }
            (None, None) => Arc::new(Sha256Hasher),
        };

        let mut type_groups = self.type_groups;
        if self.ignore_numeric_type_changes {
            type_groups.push(NUMBER_GROUP.clone());
        }
        if self.ignore_string_type_changes {
            type_groups.push(STRING_GROUP.clone());
        }

        let exclusions = Exclusions::new(
            self.exclude_paths.iter().map(|p| normalize_path(p)).collect(),
            patterns,
            self.exclude_types.into_iter().collect(),
        );

        Ok(Config {
            exclusions,
            type_groups,
            significant_digits: self.significant_digits,
            notation,
            number_formatter: self.number_formatter.unwrap_or_default(),
            math_epsilon: self.math_epsilon,
            ignore_string_case: self.ignore_string_case,
            ignore_order: self.ignore_order,
            report_repetition: self.report_repetition,
            ignore_nan_inequality: self.ignore_nan_inequality,
            ignore_private_variables: self.ignore_private_variables.unwrap_or(true),
            verbose_level,
            hasher,
        })
    }
}
