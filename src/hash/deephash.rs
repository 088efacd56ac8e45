//! Canonical content hashing of value trees.

use std::collections::BTreeMap;
use tracing::{debug, trace, warn};

use super::cache::HashCache;
use super::function::HashToken;
use super::visited::VisitedSet;
use crate::config::Config;
use crate::level::{child_path, Relationship, ROOT};
use crate::value::{Mapping, Node, Number, Opaque, Record, TypeTag, Value};

/// Canonical encoding of null.
pub const NONE_TOKEN: &str = "NONE";

/// Unprocessed is a value whose content could not be inspected.
#[derive(Debug, Clone, PartialEq)]
pub struct Unprocessed {
    pub path: String,
    pub value: Value,
}

impl Unprocessed {
    pub fn type_tag(&self) -> TypeTag {
        self.value.type_tag()
    }
}

/// Walker computes hash tokens for one Config, memoizing into a cache.
pub(crate) struct Walker<'a> {
    config: &'a Config,
    cache: &'a mut HashCache,
    unprocessed: &'a mut Vec<Unprocessed>,
}

impl<'a> Walker<'a> {
    pub(crate) fn new(
        config: &'a Config,
        cache: &'a mut HashCache,
        unprocessed: &'a mut Vec<Unprocessed>,
    ) -> Self {
        Walker {
            config,
            cache,
            unprocessed,
        }
    }

    /// Hashes `value` found at `path`.
    ///
    /// Returns None when the value is skipped: it is excluded, or it is a
    /// container already entered on the current path.
    pub(crate) fn hash_value(
        &mut self,
        value: &Value,
        path: &str,
        visited: &VisitedSet,
    ) -> Option<HashToken> {
        if visited.contains_value(value) {
            trace!(path, "cycle detected, skipping");
            return None;
        }
        if self.config.exclusions().excludes(path, value) {
            return None;
        }
        if let Some(token) = self.cache.get(value) {
            return Some(token.clone());
        }

        let canonical = match value {
            Value::Null => NONE_TOKEN.to_string(),
            Value::Bool(b) => format!("{}:{}", TypeTag::BOOL, b),
            Value::Number(n) => self.encode_number(n),
            Value::Text(s) => self.encode_text(&TypeTag::STR, s),
            Value::Bytes(b) => self.encode_text(&TypeTag::BYTES, &String::from_utf8_lossy(b)),
            Value::Mapping(node) => self.encode_mapping(value, node, path, visited),
            Value::Record(node) => self.encode_record(value, node, path, visited),
            Value::Sequence(node) => {
                let (tag, items) = {
                    let seq = node.borrow();
                    (seq.tag.clone(), seq.items.clone())
                };
                let children = visited.with_value(value);
                let mut tokens = Vec::with_capacity(items.len());
                for (i, item) in items.iter().enumerate() {
                    let item_path = child_path(path, &Relationship::index(i));
                    if let Some(token) = self.hash_value(item, &item_path, &children) {
                        tokens.push(token);
                    }
                }
                self.encode_iterable(&tag, tokens)
            }
            Value::Set(node) => {
                let (tag, items) = {
                    let set = node.borrow();
                    (set.tag.clone(), set.items.clone())
                };
                let children = visited.with_value(value);
                let mut tokens = Vec::with_capacity(items.len());
                for item in &items {
                    let item_path = child_path(path, &Relationship::set_member(item.clone()));
                    if let Some(token) = self.hash_value(item, &item_path, &children) {
                        tokens.push(token);
                    }
                }
                self.encode_iterable(&tag, tokens)
            }
            Value::Opaque(node) => self.encode_opaque(value, node, path),
        };

        let token = self.config.hasher().hash(&canonical);
        self.cache.insert(value, token.clone());
        Some(token)
    }

    /// Returns the canonical form of a number: tagged with its group name
    /// when numeric types are interchangeable, rounded when a precision
    /// applies.
    pub(crate) fn canonical_number(config: &Config, n: &Number) -> String {
        let tag = n.type_tag();
        let repr = match config.numeric_precision() {
            Some(digits) => config.format_number(n, digits),
            None => n.to_string(),
        };
        format!("{}:{}", config.canonical_tag(&tag), repr)
    }

    fn encode_number(&self, n: &Number) -> String {
        Self::canonical_number(self.config, n)
    }

    fn encode_text(&self, tag: &TypeTag, s: &str) -> String {
        let folded = if self.config.ignore_string_case() {
            s.to_lowercase()
        } else {
            s.to_string()
        };
        if self.config.folds_string_types() {
            folded
        } else {
            format!("{}:{}", tag, folded)
        }
    }

    fn encode_mapping(
        &mut self,
        value: &Value,
        node: &Node<Mapping>,
        path: &str,
        visited: &VisitedSet,
    ) -> String {
        let (tag, entries) = {
            let mapping = node.borrow();
            let entries: Vec<(Value, Value)> =
                mapping.iter().map(|(k, v)| (k.clone(), v.clone())).collect();
            (mapping.tag.clone(), entries)
        };
        let children = visited.with_value(value);

        let mut encoded = Vec::with_capacity(entries.len());
        for (key, item) in &entries {
            if let Value::Text(name) = key {
                if self.config.is_private_name(name) {
                    continue;
                }
            }
            let item_path = child_path(path, &Relationship::DictKey(key.clone()));
            let key_token = self.hash_value(key, &item_path, &children);
            let item_token = self.hash_value(item, &item_path, &children);
            if let (Some(k), Some(v)) = (key_token, item_token) {
                encoded.push(format!("{}=>{}", k, v));
            }
        }
        encoded.sort();
        format!("{}:{{{}}}", self.config.canonical_tag(&tag), encoded.join(";"))
    }

    fn encode_record(
        &mut self,
        value: &Value,
        node: &Node<Record>,
        path: &str,
        visited: &VisitedSet,
    ) -> String {
        let (tag, fields) = {
            let record = node.borrow();
            (record.tag.clone(), record.fields.clone())
        };
        let children = visited.with_value(value);

        let mut encoded = Vec::with_capacity(fields.len());
        for (name, item) in &fields {
            if self.config.is_private_name(name) {
                continue;
            }
            let item_path = child_path(path, &Relationship::attribute(name.clone()));
            if let Some(token) = self.hash_value(item, &item_path, &children) {
                encoded.push(format!("{}=>{}", name, token));
            }
        }
        encoded.sort();
        format!("{}:{{{}}}", self.config.canonical_tag(&tag), encoded.join(";"))
    }

    fn encode_iterable(&self, tag: &TypeTag, tokens: Vec<HashToken>) -> String {
        let mut counts: BTreeMap<String, usize> = BTreeMap::new();
        for token in tokens {
            *counts.entry(token.to_string()).or_insert(0) += 1;
        }
        let joined = if self.config.report_repetition() {
            counts
                .iter()
                .map(|(token, count)| format!("{}|{}", token, count))
                .collect::<Vec<_>>()
                .join(",")
        } else {
            counts.into_keys().collect::<Vec<_>>().join(",")
        };
        format!("{}:{}", self.config.canonical_tag(tag), joined)
    }

    fn encode_opaque(&mut self, value: &Value, node: &Node<Opaque>, path: &str) -> String {
        let tag = node.borrow().tag.clone();
        warn!(path, type_tag = %tag, "value has no enumerable fields, left unprocessed");
        self.unprocessed.push(Unprocessed {
            path: path.to_string(),
            value: value.clone(),
        });
        // Distinct instances must never collide, the same instance always matches.
        format!("{}:unprocessed@{}", tag, node.id())
    }
}

/// DeepHash is the hash table of every value reachable from a root.
///
/// Lookups go through [`DeepHash::get`], by identity for containers and
/// by value for scalars.
#[derive(Debug, Clone)]
pub struct DeepHash {
    root: Option<HashToken>,
    hashes: HashCache,
    unprocessed: Vec<Unprocessed>,
}

impl DeepHash {
    /// Hashes `value` and everything reachable from it.
    pub fn new(value: &Value, config: &Config) -> Self {
        DeepHash::with_cache(value, config, HashCache::new())
    }

    /// Hashes `value`, reusing tokens already present in `cache`.
    pub fn with_cache(value: &Value, config: &Config, mut cache: HashCache) -> Self {
        let mut unprocessed = Vec::new();
        let root = Walker::new(config, &mut cache, &mut unprocessed).hash_value(
            value,
            ROOT,
            &VisitedSet::new(),
        );
        debug!(
            entries = cache.len(),
            unprocessed = unprocessed.len(),
            hasher = config.hasher().name(),
            "hashed value tree"
        );
        DeepHash {
            root,
            hashes: cache,
            unprocessed,
        }
    }

    /// Token of the root value; None if the root itself was excluded.
    pub fn root(&self) -> Option<&HashToken> {
        self.root.as_ref()
    }

    /// Looks up the token of any value reached while hashing.
    pub fn get(&self, value: &Value) -> Option<&HashToken> {
        self.hashes.get(value)
    }

    pub fn hashes(&self) -> &HashCache {
        &self.hashes
    }

    /// Values that were reported as unprocessed.
    pub fn unprocessed(&self) -> &[Unprocessed] {
        &self.unprocessed
    }

    /// Returns the cache for reuse in later calls with the same Config.
    pub fn into_cache(self) -> HashCache {
        self.hashes
    }
}

/// Hashes `value`, returning the token table and the unprocessed values.
pub fn hash(value: &Value, config: &Config) -> (HashCache, Vec<Unprocessed>) {
    let deep = DeepHash::new(value, config);
    (deep.hashes, deep.unprocessed)
}
