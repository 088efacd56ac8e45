//! Sequence and set comparisons.

use std::collections::BTreeMap;
use std::rc::Rc;

use super::engine::Differ;
use super::report::{ChangeDetail, ReportType, Repetition};
use crate::hash::{HashEntry, HashToken, VisitedSet};
use crate::level::{child_path, ComparisonLevel, Relationship};
use crate::value::{Node, Sequence, SetValue, Value};

fn items_of(node: &Node<Sequence>) -> (Vec<Value>, bool) {
    let seq = node.borrow();
    (seq.items.clone(), seq.subscriptable)
}

fn index(i: usize, subscriptable: bool) -> Relationship {
    Relationship::Index {
        index: i,
        subscriptable,
    }
}

impl Differ<'_> {
    /// Compares two sequences position by position.
    pub(super) fn diff_ordered(
        &mut self,
        level: &Rc<ComparisonLevel>,
        left: &Node<Sequence>,
        right: &Node<Sequence>,
        visited: &VisitedSet,
    ) {
        let (left_items, subscriptable) = items_of(left);
        let (right_items, _) = items_of(right);
        let len = left_items.len().max(right_items.len());

        for i in 0..len {
            match (left_items.get(i), right_items.get(i)) {
                (Some(l), Some(r)) => {
                    self.descend(level, l.clone(), r.clone(), index(i, subscriptable), visited);
                }
                (Some(l), None) => {
                    let child = level.branch_deeper(Some(l.clone()), None, index(i, subscriptable));
                    self.report(child, ReportType::IterableItemRemoved, ChangeDetail::None);
                }
                (None, Some(r)) => {
                    let child = level.branch_deeper(None, Some(r.clone()), index(i, subscriptable));
                    self.report(child, ReportType::IterableItemAdded, ChangeDetail::None);
                }
                (None, None) => {}
            }
        }
    }

    /// Groups the items of a sequence by hash token.
    fn hash_table(
        &mut self,
        level: &ComparisonLevel,
        items: &[Value],
        visited: &VisitedSet,
    ) -> BTreeMap<HashToken, HashEntry> {
        let mut table: BTreeMap<HashToken, HashEntry> = BTreeMap::new();
        for (i, item) in items.iter().enumerate() {
            let path = child_path(level.path(), &Relationship::index(i));
            let Some(token) = self.hash(item, &path, visited) else {
                continue;
            };
            table
                .entry(token.clone())
                .and_modify(|entry| entry.indexes.push(i))
                .or_insert_with(|| HashEntry::new(token, item.clone(), i));
        }
        table
    }

    /// Compares two sequences as multisets.
    ///
    /// Items present on one side only are reported at their first index, or
    /// at every index when repetition is reported. Items on both sides with
    /// different counts are reported as a repetition change at their first
    /// index on the left.
    pub(super) fn diff_unordered(
        &mut self,
        level: &Rc<ComparisonLevel>,
        left: &Node<Sequence>,
        right: &Node<Sequence>,
        visited: &VisitedSet,
    ) {
        let (left_items, subscriptable) = items_of(left);
        let (right_items, _) = items_of(right);
        let left_table = self.hash_table(level, &left_items, visited);
        let right_table = self.hash_table(level, &right_items, visited);
        let every_index = self.config.report_repetition();

        for (token, entry) in &left_table {
            match right_table.get(token) {
                None => {
                    let indexes = if every_index { &entry.indexes[..] } else { &entry.indexes[..1] };
                    for &i in indexes {
                        let child = level.branch_deeper(Some(entry.item.clone()), None, index(i, subscriptable));
                        self.report(child, ReportType::IterableItemRemoved, ChangeDetail::None);
                    }
                }
                Some(other) if every_index && other.count() != entry.count() => {
                    let repetition = Repetition {
                        old_repeat: entry.count(),
                        new_repeat: other.count(),
                        old_indexes: entry.indexes.clone(),
                        new_indexes: other.indexes.clone(),
                    };
                    let child = level.branch_deeper(
                        Some(entry.item.clone()),
                        Some(other.item.clone()),
                        index(entry.indexes[0], subscriptable),
                    );
                    self.report(child, ReportType::RepetitionChange, ChangeDetail::Repetition(repetition));
                }
                Some(_) => {}
            }
        }

        for (token, entry) in &right_table {
            if left_table.contains_key(token) {
                continue;
            }
            let indexes = if every_index { &entry.indexes[..] } else { &entry.indexes[..1] };
            for &i in indexes {
                let child = level.branch_deeper(None, Some(entry.item.clone()), index(i, subscriptable));
                self.report(child, ReportType::IterableItemAdded, ChangeDetail::None);
            }
        }
    }

    fn set_members(
        &mut self,
        level: &ComparisonLevel,
        node: &Node<SetValue>,
        visited: &VisitedSet,
    ) -> BTreeMap<HashToken, Value> {
        let items = node.borrow().items.clone();
        let mut members = BTreeMap::new();
        for item in items {
            let path = child_path(level.path(), &Relationship::set_member(item.clone()));
            if let Some(token) = self.hash(&item, &path, visited) {
                members.entry(token).or_insert(item);
            }
        }
        members
    }

    /// Compares two sets by the symmetric difference of member hashes.
    pub(super) fn diff_sets(
        &mut self,
        level: &Rc<ComparisonLevel>,
        left: &Node<SetValue>,
        right: &Node<SetValue>,
        visited: &VisitedSet,
    ) {
        let left_members = self.set_members(level, left, visited);
        let right_members = self.set_members(level, right, visited);

        for (token, item) in &left_members {
            if !right_members.contains_key(token) {
                let child = level.branch_deeper(Some(item.clone()), None, Relationship::set_member(item.clone()));
                self.report(child, ReportType::SetItemRemoved, ChangeDetail::None);
            }
        }
        for (token, item) in &right_members {
            if !left_members.contains_key(token) {
                let child = level.branch_deeper(None, Some(item.clone()), Relationship::set_member(item.clone()));
                self.report(child, ReportType::SetItemAdded, ChangeDetail::None);
            }
        }
    }
}
