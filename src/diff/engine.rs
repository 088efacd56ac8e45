//! The diff engine: a lock-step walk over two value trees.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::rc::Rc;
use tracing::{debug, trace, warn};

use super::flat::DiffReport;
use super::report::{ChangeDetail, ReportType, TreeReport, Warning};
use super::text::{is_multiline, line_diff};
use crate::config::Config;
use crate::hash::{HashCache, HashToken, Unprocessed, VisitedSet, Walker};
use crate::level::{ComparisonLevel, Relationship};
use crate::value::{Mapping, Node, Number, Record, TypeTag, Value};

const NO_FIELDS: &str = "value has no extractable fields";

/// DeepDiff compares value trees under one Config.
///
/// Each comparison starts from an empty hash cache. A cache handed in
/// through [`DeepDiff::with_cache`] is kept instead and grows across
/// comparisons, so repeated comparisons against a shared baseline reuse
/// its tokens; the caller must keep the hashed containers alive and
/// unchanged while it does.
#[derive(Debug)]
pub struct DeepDiff<'c> {
    config: &'c Config,
    cache: HashCache,
    keep_cache: bool,
}

impl<'c> DeepDiff<'c> {
    pub fn new(config: &'c Config) -> Self {
        DeepDiff {
            config,
            cache: HashCache::new(),
            keep_cache: false,
        }
    }

    /// Uses a cache from an earlier call and keeps it across comparisons.
    pub fn with_cache(mut self, cache: HashCache) -> Self {
        self.cache = cache;
        self.keep_cache = true;
        self
    }

    pub fn config(&self) -> &Config {
        self.config
    }

    /// Compares `left` with `right`, keeping every reported level.
    pub fn compare(&mut self, left: &Value, right: &Value) -> TreeReport {
        debug!(
            left_type = %left.type_tag(),
            right_type = %right.type_tag(),
            ignore_order = self.config.ignore_order(),
            "starting diff"
        );
        if !self.keep_cache {
            self.cache.clear();
        }

        let mut differ = Differ {
            config: self.config,
            cache: &mut self.cache,
            tree: TreeReport::new(),
            hash_unprocessed: Vec::new(),
        };
        let root = ComparisonLevel::root(left.clone(), right.clone());
        let visited = VisitedSet::new().with_value(left).with_value(right);
        differ.diff_level(&root, &visited);

        let mut report = differ.finish();
        report.sort();
        report.set_verbose_level(self.config.verbose_level());
        debug!(
            changes = report.len(),
            warnings = report.diagnostics().len(),
            "diff finished"
        );
        report
    }

    /// Returns the hash cache of the last comparison for reuse.
    pub fn into_cache(self) -> HashCache {
        self.cache
    }
}

/// Compares `left` with `right` and returns the flat report.
pub fn diff(left: &Value, right: &Value, config: &Config) -> DiffReport {
    DiffReport::from(&diff_tree(left, right, config))
}

/// Compares `left` with `right` and returns the tree report.
pub fn diff_tree(left: &Value, right: &Value, config: &Config) -> TreeReport {
    DeepDiff::new(config).compare(left, right)
}

/// Differ holds the state of one comparison call.
pub(super) struct Differ<'a> {
    pub(super) config: &'a Config,
    pub(super) cache: &'a mut HashCache,
    pub(super) tree: TreeReport,
    pub(super) hash_unprocessed: Vec<Unprocessed>,
}

impl<'a> Differ<'a> {
    fn finish(mut self) -> TreeReport {
        for item in std::mem::take(&mut self.hash_unprocessed) {
            let type_tag = item.type_tag();
            self.tree.diagnostics_mut().push(Warning::Unprocessed {
                path: item.path,
                type_tag,
            });
        }
        self.tree
    }

    /// Hashes a value met while comparing, at `path`.
    pub(super) fn hash(&mut self, value: &Value, path: &str, visited: &VisitedSet) -> Option<HashToken> {
        Walker::new(self.config, &mut *self.cache, &mut self.hash_unprocessed).hash_value(value, path, visited)
    }

    /// Returns true if the level's path or either side's type is excluded.
    pub(super) fn is_excluded(&self, level: &ComparisonLevel) -> bool {
        let exclusions = self.config.exclusions();
        if exclusions.is_empty() {
            return false;
        }
        let type_excluded = [level.left(), level.right()]
            .into_iter()
            .flatten()
            .any(|v| exclusions.excludes_type(&v.type_tag()));
        type_excluded || (exclusions.has_path_rules() && exclusions.excludes_path(level.path()))
    }

    /// Records a change unless its path is excluded.
    pub(super) fn report(&mut self, level: Rc<ComparisonLevel>, report_type: ReportType, detail: ChangeDetail) {
        if self.is_excluded(&level) {
            return;
        }
        if level.classify(report_type) {
            trace!(path = level.path(), report_type = %report_type, "change recorded");
            self.tree.push(report_type, level, detail);
        }
    }

    /// Compares a child pair unless either side is already on the path.
    pub(super) fn descend(
        &mut self,
        level: &Rc<ComparisonLevel>,
        left: Value,
        right: Value,
        relationship: Relationship,
        visited: &VisitedSet,
    ) {
        if visited.contains_value(&left) || visited.contains_value(&right) {
            trace!(parent = level.path(), "cycle detected, not descending");
            return;
        }
        let children = visited.with_value(&left).with_value(&right);
        let child = level.branch_deeper(Some(left), Some(right), relationship);
        self.diff_level(&child, &children);
    }

    pub(super) fn diff_level(&mut self, level: &Rc<ComparisonLevel>, visited: &VisitedSet) {
        let (left, right) = match (level.left(), level.right()) {
            (Some(l), Some(r)) => (l.clone(), r.clone()),
            _ => return,
        };

        if left.same_instance(&right) {
            return;
        }
        if self.is_excluded(level) {
            return;
        }

        let (left_tag, right_tag) = (left.type_tag(), right.type_tag());
        if !self.config.types_equivalent(&left_tag, &right_tag) {
            self.report(Rc::clone(level), ReportType::TypeChanges, ChangeDetail::None);
            return;
        }

        if self.config.ignore_nan_inequality() && left.is_nan() && right.is_nan() {
            return;
        }

        match (&left, &right) {
            (Value::Null, Value::Null) => {}
            (Value::Bool(a), Value::Bool(b)) => {
                if a != b {
                    self.report(Rc::clone(level), ReportType::ValuesChanged, ChangeDetail::None);
                }
            }
            (Value::Number(a), Value::Number(b)) => self.diff_numbers(level, a, b),
            (Value::Mapping(a), Value::Mapping(b)) => self.diff_mappings(level, a, b, visited),
            (Value::Record(a), Value::Record(b)) => self.diff_records(level, a, b, visited),
            (Value::Sequence(a), Value::Sequence(b)) => {
                if self.config.ignore_order() {
                    self.diff_unordered(level, a, b, visited);
                } else {
                    self.diff_ordered(level, a, b, visited);
                }
            }
            (Value::Set(a), Value::Set(b)) => self.diff_sets(level, a, b, visited),
            (Value::Opaque(_), _) | (_, Value::Opaque(_)) => self.report_unprocessed(level),
            _ => match (text_of(&left), text_of(&right)) {
                (Some(a), Some(b)) => self.diff_text(level, &a, &b),
                _ => self.diff_by_hash(level, &left, &right),
            },
        }
    }

    fn diff_numbers(&mut self, level: &Rc<ComparisonLevel>, a: &Number, b: &Number) {
        let equal = if let Some(epsilon) = self.config.math_epsilon() {
            a.is_close(b, epsilon)
        } else if self.config.significant_digits().is_some() {
            Walker::canonical_number(self.config, a) == Walker::canonical_number(self.config, b)
        } else {
            a.numeric_eq(b)
        };
        if !equal {
            self.report(Rc::clone(level), ReportType::ValuesChanged, ChangeDetail::None);
        }
    }

    fn diff_text(&mut self, level: &Rc<ComparisonLevel>, a: &str, b: &str) {
        let (a, b) = if self.config.ignore_string_case() {
            (Cow::Owned(a.to_lowercase()), Cow::Owned(b.to_lowercase()))
        } else {
            (Cow::Borrowed(a), Cow::Borrowed(b))
        };
        if a == b {
            return;
        }
        let detail = if is_multiline(&a, &b) {
            ChangeDetail::LineDiff(line_diff(&a, &b))
        } else {
            ChangeDetail::None
        };
        self.report(Rc::clone(level), ReportType::ValuesChanged, detail);
    }

    /// Compares values of different categories that share a type group.
    ///
    /// Both values are already on the visited path, so hashing starts from
    /// a fresh set; the hasher guards cycles inside each value itself.
    fn diff_by_hash(&mut self, level: &Rc<ComparisonLevel>, left: &Value, right: &Value) {
        let path = level.path().to_string();
        let left_token = self.hash(left, &path, &VisitedSet::new());
        let right_token = self.hash(right, &path, &VisitedSet::new());
        if left_token != right_token {
            self.report(Rc::clone(level), ReportType::ValuesChanged, ChangeDetail::None);
        }
    }

    fn report_unprocessed(&mut self, level: &Rc<ComparisonLevel>) {
        if self.is_excluded(level) {
            return;
        }
        for value in [level.left(), level.right()].into_iter().flatten() {
            if let Value::Opaque(_) = value {
                let type_tag = value.type_tag();
                warn!(path = level.path(), type_tag = %type_tag, "value has no extractable fields, left unprocessed");
                self.tree.diagnostics_mut().push(Warning::Unprocessed {
                    path: level.path().to_string(),
                    type_tag,
                });
            }
        }
        self.report(
            Rc::clone(level),
            ReportType::Unprocessed,
            ChangeDetail::Reason(NO_FIELDS.to_string()),
        );
    }

    /// Returns the key under which a mapping key is matched across sides,
    /// folded by the same rules as hashing.
    fn normalize_key(&self, key: &Value) -> String {
        let folded_text = |tag, s: &str| {
            let s = if self.config.ignore_string_case() {
                s.to_lowercase()
            } else {
                s.to_string()
            };
            format!("{}:{}", self.config.canonical_tag(tag), s)
        };
        match key {
            Value::Text(s) => folded_text(&TypeTag::STR, s),
            Value::Bytes(b) => folded_text(&TypeTag::BYTES, &String::from_utf8_lossy(b)),
            Value::Number(n) => Walker::canonical_number(self.config, n),
            other => format!("{}:{}", other.type_tag(), other),
        }
    }

    fn mapping_entries(&mut self, level: &ComparisonLevel, node: &Node<Mapping>) -> BTreeMap<String, (Value, Value)> {
        let entries: Vec<(Value, Value)> = node
            .borrow()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        let mut normalized = BTreeMap::new();
        for (key, item) in entries {
            if let Value::Text(name) = &key {
                if self.config.is_private_name(name) {
                    continue;
                }
            }
            let normal = self.normalize_key(&key);
            if normalized.contains_key(&normal) {
                warn!(path = level.path(), key = %normal, "mapping keys collide after normalization");
                self.tree.diagnostics_mut().push(Warning::KeyCollision {
                    path: level.path().to_string(),
                    key: normal.clone(),
                });
            }
            normalized.insert(normal, (key, item));
        }
        normalized
    }

    fn diff_mappings(
        &mut self,
        level: &Rc<ComparisonLevel>,
        left: &Node<Mapping>,
        right: &Node<Mapping>,
        visited: &VisitedSet,
    ) {
        let left_entries = self.mapping_entries(level, left);
        let mut right_entries = self.mapping_entries(level, right);

        for (normal, (key, item)) in left_entries {
            match right_entries.remove(&normal) {
                Some((_, right_item)) => {
                    self.descend(level, item, right_item, Relationship::DictKey(key), visited);
                }
                None => {
                    let child = level.branch_deeper(Some(item), None, Relationship::DictKey(key));
                    self.report(child, ReportType::DictionaryItemRemoved, ChangeDetail::None);
                }
            }
        }
        for (_, (key, item)) in right_entries {
            let child = level.branch_deeper(None, Some(item), Relationship::DictKey(key));
            self.report(child, ReportType::DictionaryItemAdded, ChangeDetail::None);
        }
    }

    fn record_fields(&self, node: &Node<Record>) -> Vec<(String, Value)> {
        node.borrow()
            .fields
            .iter()
            .filter(|(name, _)| !self.config.is_private_name(name))
            .cloned()
            .collect()
    }

    fn diff_records(
        &mut self,
        level: &Rc<ComparisonLevel>,
        left: &Node<Record>,
        right: &Node<Record>,
        visited: &VisitedSet,
    ) {
        let left_fields = self.record_fields(left);
        let mut right_fields: BTreeMap<String, Value> = self.record_fields(right).into_iter().collect();

        for (name, item) in left_fields {
            match right_fields.remove(&name) {
                Some(right_item) => {
                    self.descend(level, item, right_item, Relationship::Attribute(name), visited);
                }
                None => {
                    let child = level.branch_deeper(Some(item), None, Relationship::Attribute(name));
                    self.report(child, ReportType::AttributeRemoved, ChangeDetail::None);
                }
            }
        }
        for (name, item) in right_fields {
            let child = level.branch_deeper(None, Some(item), Relationship::Attribute(name));
            self.report(child, ReportType::AttributeAdded, ChangeDetail::None);
        }
    }
}

/// Returns the text of a string-like value.
fn text_of(value: &Value) -> Option<Cow<'_, str>> {
    match value {
        Value::Text(s) => Some(Cow::Borrowed(s.as_str())),
        Value::Bytes(b) => Some(String::from_utf8_lossy(b)),
        _ => None,
    }
}
