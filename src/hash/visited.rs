//! Persistent ancestor sets used as cycle guards.

use std::rc::Rc;

use crate::value::{NodeId, Value};

#[derive(Debug)]
struct Link {
    id: NodeId,
    parent: Option<Rc<Link>>,
}

/// VisitedSet holds the identities entered along one root-to-node path.
///
/// Adding an identity returns a new set sharing its tail with the parent;
/// the parent set is never modified, so sibling branches do not see each
/// other's entries.
#[derive(Debug, Clone, Default)]
pub struct VisitedSet {
    head: Option<Rc<Link>>,
    len: usize,
}

impl VisitedSet {
    pub fn new() -> Self {
        VisitedSet::default()
    }

    /// Returns a set containing this set's identities plus `id`.
    pub fn with(&self, id: NodeId) -> VisitedSet {
        VisitedSet {
            head: Some(Rc::new(Link {
                id,
                parent: self.head.clone(),
            })),
            len: self.len + 1,
        }
    }

    /// Adds the identity of a container value; scalars leave the set as is.
    pub fn with_value(&self, value: &Value) -> VisitedSet {
        match value.node_id() {
            Some(id) if !self.contains(id) => self.with(id),
            _ => self.clone(),
        }
    }

    pub fn contains(&self, id: NodeId) -> bool {
        let mut link = self.head.as_deref();
        while let Some(l) = link {
            if l.id == id {
                return true;
            }
            link = l.parent.as_deref();
        }
        false
    }

    /// Returns true if `value` is a container already on the path.
    pub fn contains_value(&self, value: &Value) -> bool {
        value.node_id().map_or(false, |id| self.contains(id))
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}
