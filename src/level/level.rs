//! Comparison levels: one node of the lock-step walk over two trees.

use once_cell::unsync::OnceCell;
use std::rc::Rc;

use super::relationship::{Relationship, ROOT};
use crate::diff::ReportType;
use crate::value::Value;

/// ComparisonLevel pairs corresponding left and right values.
///
/// Levels form a tree through their parent links. A side is `None` when
/// the value is absent on that side (an addition or a removal). The
/// rendered path is computed on first use and cached; the relationship
/// that produces it cannot change after construction.
#[derive(Debug)]
pub struct ComparisonLevel {
    left: Option<Value>,
    right: Option<Value>,
    relationship: Relationship,
    parent: Option<Rc<ComparisonLevel>>,
    depth: usize,
    report_type: OnceCell<ReportType>,
    path: OnceCell<String>,
}

impl ComparisonLevel {
    /// Creates the top-level comparison.
    pub fn root(left: Value, right: Value) -> Rc<Self> {
        Rc::new(ComparisonLevel {
            left: Some(left),
            right: Some(right),
            relationship: Relationship::Root,
            parent: None,
            depth: 0,
            report_type: OnceCell::new(),
            path: OnceCell::new(),
        })
    }

    /// Creates a child level whose parent is `self`.
    pub fn branch_deeper(
        self: &Rc<Self>,
        left: Option<Value>,
        right: Option<Value>,
        relationship: Relationship,
    ) -> Rc<Self> {
        Rc::new(ComparisonLevel {
            left,
            right,
            relationship,
            parent: Some(Rc::clone(self)),
            depth: self.depth + 1,
            report_type: OnceCell::new(),
            path: OnceCell::new(),
        })
    }

    pub fn left(&self) -> Option<&Value> {
        self.left.as_ref()
    }

    pub fn right(&self) -> Option<&Value> {
        self.right.as_ref()
    }

    pub fn relationship(&self) -> &Relationship {
        &self.relationship
    }

    pub fn parent(&self) -> Option<&Rc<ComparisonLevel>> {
        self.parent.as_ref()
    }

    /// Number of relationships between this level and the root.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Returns the path from the root, e.g. `root['a'][0].name`.
    pub fn path(&self) -> &str {
        self.path.get_or_init(|| match &self.parent {
            Some(parent) => {
                let mut path = parent.path().to_string();
                self.relationship.write_path(&mut path);
                path
            }
            None => ROOT.to_string(),
        })
    }

    /// Returns the relationships from the root down to this level.
    pub fn relationships(&self) -> Vec<&Relationship> {
        let mut chain = Vec::with_capacity(self.depth + 1);
        let mut level = Some(self);
        while let Some(l) = level {
            chain.push(&l.relationship);
            level = l.parent.as_deref();
        }
        chain.reverse();
        chain
    }

    /// Returns how this level was classified, if it was reported.
    pub fn report_type(&self) -> Option<ReportType> {
        self.report_type.get().copied()
    }

    /// Classifies the level. A level is classified at most once; returns
    /// false if it already was.
    pub(crate) fn classify(&self, report_type: ReportType) -> bool {
        self.report_type.set(report_type).is_ok()
    }
}
