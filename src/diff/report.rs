//! Report types and the tree projection of a diff.

use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use crate::level::ComparisonLevel;
use crate::value::TypeTag;

/// ReportType classifies a recorded change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ReportType {
    DictionaryItemAdded,
    DictionaryItemRemoved,
    AttributeAdded,
    AttributeRemoved,
    ValuesChanged,
    TypeChanges,
    IterableItemAdded,
    IterableItemRemoved,
    SetItemAdded,
    SetItemRemoved,
    RepetitionChange,
    Unprocessed,
}

impl ReportType {
    /// Every report type, in report order.
    pub const ALL: [ReportType; 12] = [
        ReportType::DictionaryItemAdded,
        ReportType::DictionaryItemRemoved,
        ReportType::AttributeAdded,
        ReportType::AttributeRemoved,
        ReportType::ValuesChanged,
        ReportType::TypeChanges,
        ReportType::IterableItemAdded,
        ReportType::IterableItemRemoved,
        ReportType::SetItemAdded,
        ReportType::SetItemRemoved,
        ReportType::RepetitionChange,
        ReportType::Unprocessed,
    ];

    /// Returns the canonical name used in serialized reports.
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportType::DictionaryItemAdded => "dictionary_item_added",
            ReportType::DictionaryItemRemoved => "dictionary_item_removed",
            ReportType::AttributeAdded => "attribute_added",
            ReportType::AttributeRemoved => "attribute_removed",
            ReportType::ValuesChanged => "values_changed",
            ReportType::TypeChanges => "type_changes",
            ReportType::IterableItemAdded => "iterable_item_added",
            ReportType::IterableItemRemoved => "iterable_item_removed",
            ReportType::SetItemAdded => "set_item_added",
            ReportType::SetItemRemoved => "set_item_removed",
            ReportType::RepetitionChange => "repetition_change",
            ReportType::Unprocessed => "unprocessed",
        }
    }

    pub fn from_name(name: &str) -> Option<ReportType> {
        ReportType::ALL.iter().copied().find(|t| t.as_str() == name)
    }

    /// Returns true for additions and removals, whose detail is only the
    /// present side's value.
    pub fn is_item_change(&self) -> bool {
        !matches!(
            self,
            ReportType::ValuesChanged
                | ReportType::TypeChanges
                | ReportType::RepetitionChange
                | ReportType::Unprocessed
        )
    }
}

impl fmt::Display for ReportType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Repetition describes an element whose occurrence count changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Repetition {
    pub old_repeat: usize,
    pub new_repeat: usize,
    pub old_indexes: Vec<usize>,
    pub new_indexes: Vec<usize>,
}

/// ChangeDetail is the payload attached to a level when it is reported.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ChangeDetail {
    #[default]
    None,
    /// Unified line diff of two multi-line strings.
    LineDiff(String),
    Repetition(Repetition),
    /// Why a value was left unprocessed.
    Reason(String),
}

/// Change is one reported level.
#[derive(Debug, Clone)]
pub struct Change {
    pub level: Rc<ComparisonLevel>,
    pub detail: ChangeDetail,
}

impl Change {
    pub fn path(&self) -> &str {
        self.level.path()
    }
}

/// Warning is a non-fatal condition met during a call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Warning {
    /// A value with no extractable fields was skipped.
    Unprocessed { path: String, type_tag: TypeTag },
    /// Two mapping keys normalized to the same key; the later one wins.
    KeyCollision { path: String, key: String },
    /// Two changes of one report type render to the same path; the flat
    /// report keeps the later one.
    PathCollision { report_type: ReportType, path: String },
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Warning::Unprocessed { path, type_tag } => {
                write!(f, "{}: value of type {} left unprocessed", path, type_tag)
            }
            Warning::KeyCollision { path, key } => {
                write!(f, "{}: keys collide after normalization as {}", path, key)
            }
            Warning::PathCollision { report_type, path } => {
                write!(f, "{}: several {} changes share this path", path, report_type)
            }
        }
    }
}

/// Diagnostics collects the warnings of one call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Diagnostics {
    warnings: Vec<Warning>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Diagnostics::default()
    }

    pub fn push(&mut self, warning: Warning) {
        if !self.warnings.contains(&warning) {
            self.warnings.push(warning);
        }
    }

    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    pub fn is_empty(&self) -> bool {
        self.warnings.is_empty()
    }

    pub fn len(&self) -> usize {
        self.warnings.len()
    }
}

/// TreeReport keeps every reported level, grouped by report type.
///
/// Levels keep their parent chain, so callers can walk from a change back
/// to the root and inspect both sides at every step.
#[derive(Debug, Clone)]
pub struct TreeReport {
    changes: BTreeMap<ReportType, Vec<Change>>,
    diagnostics: Diagnostics,
    verbose_level: u8,
}

impl Default for TreeReport {
    fn default() -> Self {
        TreeReport {
            changes: BTreeMap::new(),
            diagnostics: Diagnostics::default(),
            verbose_level: 1,
        }
    }
}

impl TreeReport {
    pub fn new() -> Self {
        TreeReport::default()
    }

    pub(crate) fn set_verbose_level(&mut self, level: u8) {
        self.verbose_level = level;
    }

    /// Detail level the text view of this report is rendered with.
    pub fn verbose_level(&self) -> u8 {
        self.verbose_level
    }

    pub(crate) fn push(&mut self, report_type: ReportType, level: Rc<ComparisonLevel>, detail: ChangeDetail) {
        self.changes
            .entry(report_type)
            .or_default()
            .push(Change { level, detail });
    }

    pub(crate) fn diagnostics_mut(&mut self) -> &mut Diagnostics {
        &mut self.diagnostics
    }

    /// Orders each bucket by path.
    pub(crate) fn sort(&mut self) {
        for changes in self.changes.values_mut() {
            changes.sort_by(|a, b| a.path().cmp(b.path()));
        }
    }

    /// Returns true if no change was recorded.
    pub fn is_empty(&self) -> bool {
        self.changes.values().all(Vec::is_empty)
    }

    /// Total number of recorded changes.
    pub fn len(&self) -> usize {
        self.changes.values().map(Vec::len).sum()
    }

    /// Returns the changes of one type, sorted by path.
    pub fn get(&self, report_type: ReportType) -> &[Change] {
        self.changes
            .get(&report_type)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn report_types(&self) -> impl Iterator<Item = ReportType> + '_ {
        self.changes
            .iter()
            .filter(|(_, changes)| !changes.is_empty())
            .map(|(t, _)| *t)
    }

    pub fn iter(&self) -> impl Iterator<Item = (ReportType, &Change)> {
        self.changes
            .iter()
            .flat_map(|(t, changes)| changes.iter().map(move |c| (*t, c)))
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }
}
