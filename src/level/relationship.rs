//! Relationships between a comparison level and its parent.

use std::fmt::{self, Write};

use crate::value::{write_quoted, Value};

/// Name of the top-level path.
pub const ROOT: &str = "root";

/// Relationship describes how a child value is reached from its parent.
#[derive(Debug, Clone, PartialEq)]
pub enum Relationship {
    /// The top-level comparison.
    Root,
    /// Value stored under a mapping key.
    DictKey(Value),
    /// Named field of a record.
    Attribute(String),
    /// Position in a sequence.
    Index { index: usize, subscriptable: bool },
    /// Member of a set, addressed by the member itself.
    SetMember(Value),
}

impl Relationship {
    /// Creates a new mapping key relationship.
    pub fn dict_key(key: impl Into<Value>) -> Self {
        Relationship::DictKey(key.into())
    }

    /// Creates a new attribute relationship.
    pub fn attribute(name: impl Into<String>) -> Self {
        Relationship::Attribute(name.into())
    }

    /// Creates a new index relationship into an indexable sequence.
    pub fn index(index: usize) -> Self {
        Relationship::Index {
            index,
            subscriptable: true,
        }
    }

    /// Creates a new set member relationship.
    pub fn set_member(member: Value) -> Self {
        Relationship::SetMember(member)
    }

    /// Returns true if the child can be fetched back through its parameter.
    pub fn is_subscriptable(&self) -> bool {
        match self {
            Relationship::Index { subscriptable, .. } => *subscriptable,
            Relationship::SetMember(_) => false,
            _ => true,
        }
    }

    /// Appends this relationship's path segment.
    pub fn write_path(&self, out: &mut String) {
        // Writing into a String cannot fail.
        let _ = write!(out, "{}", self);
    }
}

impl fmt::Display for Relationship {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Relationship::Root => f.write_str(ROOT),
            Relationship::DictKey(key) | Relationship::SetMember(key) => {
                f.write_char('[')?;
                match key {
                    Value::Text(s) => write_quoted(f, s)?,
                    other => write!(f, "{}", other)?,
                }
                f.write_char(']')
            }
            Relationship::Attribute(name) => write!(f, ".{}", name),
            Relationship::Index { index, .. } => write!(f, "[{}]", index),
        }
    }
}

/// Renders the path of a child reached from `parent` through `relationship`.
pub fn child_path(parent: &str, relationship: &Relationship) -> String {
    let mut path = String::with_capacity(parent.len() + 8);
    path.push_str(parent);
    relationship.write_path(&mut path);
    path
}
