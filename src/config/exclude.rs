//! Exclusion rules shared by the hashing and diff engines.

use regex::Regex;
use std::collections::BTreeSet;

use crate::value::{TypeTag, Value};

/// Exclusions decides which paths and types are skipped.
#[derive(Debug, Clone, Default)]
pub struct Exclusions {
    paths: BTreeSet<String>,
    patterns: Vec<Regex>,
    types: BTreeSet<TypeTag>,
}

impl Exclusions {
    pub(crate) fn new(paths: BTreeSet<String>, patterns: Vec<Regex>, types: BTreeSet<TypeTag>) -> Self {
        Exclusions {
            paths,
            patterns,
            types,
        }
    }

    /// Returns true if no rule is configured.
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty() && self.patterns.is_empty() && self.types.is_empty()
    }

    /// Returns true if any rule depends on the path.
    pub fn has_path_rules(&self) -> bool {
        !self.paths.is_empty() || !self.patterns.is_empty()
    }

    pub fn excludes_path(&self, path: &str) -> bool {
        self.paths.contains(path) || self.patterns.iter().any(|re| re.is_match(path))
    }

    pub fn excludes_type(&self, tag: &TypeTag) -> bool {
        self.types.contains(tag)
    }

    /// Returns true if the value at `path` must be skipped.
    pub fn excludes(&self, path: &str, value: &Value) -> bool {
        if self.is_empty() {
            return false;
        }
        (!self.types.is_empty() && self.excludes_type(&value.type_tag())) || self.excludes_path(path)
    }

    /// Iterates the exact excluded paths.
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.paths.iter().map(String::as_str)
    }
}

/// Normalizes a user supplied path to the rendered path syntax.
///
/// `['a']`, `root["a"]` and `root['a']` all become `root['a']`.
pub fn normalize_path(path: &str) -> String {
    let trimmed = path.trim();
    let mut normalized = if trimmed.starts_with("root") {
        trimmed.to_string()
    } else {
        format!("root{}", trimmed)
    };
    if normalized.contains('"') {
        normalized = normalized.replace("[\"", "['").replace("\"]", "']");
    }
    normalized
}
