//! Diff module - Categorized comparison of two value trees.
//!
//! The engine walks both trees in lock-step through comparison levels and
//! records every addition, removal and mutation under a report type. The
//! result is available as a tree of levels or as a flat report keyed by
//! path, which can be rendered as JSON or YAML.

mod engine;
mod flat;
mod iterable;
mod render;
mod report;
mod text;

#[cfg(test)]
mod diff_test;

pub use engine::*;
pub use flat::*;
pub use render::*;
pub use report::*;
pub use text::*;
