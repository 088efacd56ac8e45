//! Two-tier memo of computed hash tokens.

use std::collections::HashMap;

use super::function::HashToken;
use crate::value::{NodeId, Number, Value};

/// Equality key for scalar values.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum ScalarKey {
    Null,
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(u64),
    Text(String),
    Bytes(Vec<u8>),
}

impl ScalarKey {
    fn of(value: &Value) -> Option<ScalarKey> {
        match value {
            Value::Null => Some(ScalarKey::Null),
            Value::Bool(b) => Some(ScalarKey::Bool(*b)),
            Value::Number(Number::Int(i)) => Some(ScalarKey::Int(*i)),
            Value::Number(Number::UInt(u)) => Some(ScalarKey::UInt(*u)),
            Value::Number(Number::Float(f)) => Some(ScalarKey::Float(f.to_bits())),
            Value::Text(s) => Some(ScalarKey::Text(s.clone())),
            Value::Bytes(b) => Some(ScalarKey::Bytes(b.clone())),
            _ => None,
        }
    }
}

/// HashCache memoizes tokens by container identity and by scalar value.
///
/// Tokens depend on the Config they were computed with, so a cache must
/// only be reused with the same Config. Identity entries are only valid
/// while the containers they were computed for are alive and unchanged.
#[derive(Debug, Clone, Default)]
pub struct HashCache {
    by_identity: HashMap<NodeId, HashToken>,
    by_value: HashMap<ScalarKey, HashToken>,
}

impl HashCache {
    pub fn new() -> Self {
        HashCache::default()
    }

    /// Looks up the token of a value, by identity for containers.
    pub fn get(&self, value: &Value) -> Option<&HashToken> {
        match value.node_id() {
            Some(id) => self.by_identity.get(&id),
            None => ScalarKey::of(value).and_then(|key| self.by_value.get(&key)),
        }
    }

    pub fn insert(&mut self, value: &Value, token: HashToken) {
        match value.node_id() {
            Some(id) => {
                self.by_identity.insert(id, token);
            }
            None => {
                if let Some(key) = ScalarKey::of(value) {
                    self.by_value.insert(key, token);
                }
            }
        }
    }

    pub fn len(&self) -> usize {
        self.by_identity.len() + self.by_value.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&mut self) {
        self.by_identity.clear();
        self.by_value.clear();
    }
}

/// HashEntry groups equal items of one sequence under their token.
#[derive(Debug, Clone)]
pub struct HashEntry {
    pub token: HashToken,
    /// The first item seen with this token.
    pub item: Value,
    /// Positions of every item with this token, ascending.
    pub indexes: Vec<usize>,
}

impl HashEntry {
    pub fn new(token: HashToken, item: Value, index: usize) -> Self {
        HashEntry {
            token,
            item,
            indexes: vec![index],
        }
    }

    /// Number of occurrences.
    pub fn count(&self) -> usize {
        self.indexes.len()
    }
}
