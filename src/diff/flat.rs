//! Flat projection of a diff: report type to path to change record.

use std::collections::BTreeMap;
use std::fmt;

use super::report::{Change, ChangeDetail, Diagnostics, ReportType, TreeReport, Warning};
use crate::value::{TypeTag, Value};

/// ChangeRecord is the detail stored for one path.
#[derive(Debug, Clone, PartialEq)]
pub enum ChangeRecord {
    /// An added or removed item; holds the side that is present.
    Item { value: Value },
    ValueChange {
        old_value: Value,
        new_value: Value,
        /// Unified line diff, for multi-line strings.
        diff: Option<String>,
    },
    TypeChange {
        old_type: TypeTag,
        new_type: TypeTag,
        old_value: Value,
        new_value: Value,
    },
    Repetition {
        value: Value,
        old_repeat: usize,
        new_repeat: usize,
        old_indexes: Vec<usize>,
        new_indexes: Vec<usize>,
    },
    Unprocessed {
        left: Option<Value>,
        right: Option<Value>,
        reason: String,
    },
}

impl ChangeRecord {
    fn from_change(report_type: ReportType, change: &Change) -> ChangeRecord {
        let level = &change.level;
        let left = level.left().cloned();
        let right = level.right().cloned();

        match (report_type, &change.detail) {
            (ReportType::Unprocessed, detail) => ChangeRecord::Unprocessed {
                left,
                right,
                reason: match detail {
                    ChangeDetail::Reason(reason) => reason.clone(),
                    _ => String::new(),
                },
            },
            (ReportType::RepetitionChange, ChangeDetail::Repetition(rep)) => ChangeRecord::Repetition {
                value: left.or(right).unwrap_or_default(),
                old_repeat: rep.old_repeat,
                new_repeat: rep.new_repeat,
                old_indexes: rep.old_indexes.clone(),
                new_indexes: rep.new_indexes.clone(),
            },
            (ReportType::TypeChanges, _) => {
                let old_value = left.unwrap_or_default();
                let new_value = right.unwrap_or_default();
                ChangeRecord::TypeChange {
                    old_type: old_value.type_tag(),
                    new_type: new_value.type_tag(),
                    old_value,
                    new_value,
                }
            }
            (t, _) if t.is_item_change() => ChangeRecord::Item {
                value: left.or(right).unwrap_or_default(),
            },
            (_, detail) => ChangeRecord::ValueChange {
                old_value: left.unwrap_or_default(),
                new_value: right.unwrap_or_default(),
                diff: match detail {
                    ChangeDetail::LineDiff(diff) => Some(diff.clone()),
                    _ => None,
                },
            },
        }
    }
}

impl fmt::Display for ChangeRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChangeRecord::Item { value } => write!(f, "{}", value),
            ChangeRecord::ValueChange {
                old_value,
                new_value,
                ..
            } => write!(f, "{} -> {}", old_value, new_value),
            ChangeRecord::TypeChange {
                old_type,
                new_type,
                old_value,
                new_value,
            } => write!(f, "{} {} -> {} {}", old_type, old_value, new_type, new_value),
            ChangeRecord::Repetition {
                value,
                old_repeat,
                new_repeat,
                ..
            } => write!(f, "{} repeated {} -> {} times", value, old_repeat, new_repeat),
            ChangeRecord::Unprocessed { reason, .. } => f.write_str(reason),
        }
    }
}

/// DiffReport groups change records by report type, keyed by path.
///
/// An empty report means the two values were equal under the Config.
#[derive(Debug, Clone, PartialEq)]
pub struct DiffReport {
    changes: BTreeMap<ReportType, BTreeMap<String, ChangeRecord>>,
    diagnostics: Diagnostics,
    verbose_level: u8,
}

impl Default for DiffReport {
    fn default() -> Self {
        DiffReport {
            changes: BTreeMap::new(),
            diagnostics: Diagnostics::default(),
            verbose_level: 1,
        }
    }
}

impl DiffReport {
    pub fn new() -> Self {
        DiffReport::default()
    }

    /// Detail level of the text view: 0 drops values from type changes,
    /// 2 maps added and removed keys and attributes to their values.
    pub fn verbose_level(&self) -> u8 {
        self.verbose_level
    }

    pub fn with_verbose_level(mut self, level: u8) -> Self {
        self.verbose_level = level;
        self
    }

    /// Returns true if there are no changes.
    pub fn is_empty(&self) -> bool {
        self.changes.values().all(BTreeMap::is_empty)
    }

    /// Total number of change records.
    pub fn len(&self) -> usize {
        self.changes.values().map(BTreeMap::len).sum()
    }

    /// Returns the record for one path of one report type.
    pub fn get(&self, report_type: ReportType, path: &str) -> Option<&ChangeRecord> {
        self.changes.get(&report_type).and_then(|m| m.get(path))
    }

    /// Returns the records of one report type.
    pub fn bucket(&self, report_type: ReportType) -> Option<&BTreeMap<String, ChangeRecord>> {
        self.changes.get(&report_type).filter(|m| !m.is_empty())
    }

    /// Returns the reported paths of one report type, sorted.
    pub fn paths(&self, report_type: ReportType) -> Vec<&str> {
        self.changes
            .get(&report_type)
            .map(|m| m.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }

    /// Returns the report types with at least one record.
    pub fn report_types(&self) -> impl Iterator<Item = ReportType> + '_ {
        self.changes
            .iter()
            .filter(|(_, m)| !m.is_empty())
            .map(|(t, _)| *t)
    }

    /// Iterates every record in report type then path order.
    pub fn iter(&self) -> impl Iterator<Item = (ReportType, &str, &ChangeRecord)> {
        self.changes.iter().flat_map(|(t, m)| {
            m.iter()
                .map(move |(path, record)| (*t, path.as_str(), record))
        })
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }
}

impl From<&TreeReport> for DiffReport {
    fn from(tree: &TreeReport) -> Self {
        let mut report = DiffReport {
            changes: BTreeMap::new(),
            diagnostics: tree.diagnostics().clone(),
            verbose_level: tree.verbose_level(),
        };
        for (report_type, change) in tree.iter() {
            let path = change.path().to_string();
            let record = ChangeRecord::from_change(report_type, change);
            let replaced = report
                .changes
                .entry(report_type)
                .or_default()
                .insert(path.clone(), record);
            if replaced.is_some() {
                report.diagnostics.push(Warning::PathCollision { report_type, path });
            }
        }
        report
    }
}

impl fmt::Display for DiffReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for report_type in self.report_types() {
            if !first {
                writeln!(f)?;
            }
            first = false;
            write!(f, "- {}:", report_type)?;
            if let Some(records) = self.changes.get(&report_type) {
                for (path, record) in records {
                    write!(f, "\n  {}: {}", path, record)?;
                }
            }
        }
        Ok(())
    }
}
