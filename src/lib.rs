//! # Structural Diff
//!
//! Canonical hashing and categorized diffing of nested value trees.
//!
//! This library computes a content hash of a value tree that does not
//! depend on mapping key order or sequence order, and a diff between two
//! trees listing every addition, removal and mutation by path. Both
//! engines terminate on self-referential values and honor the same
//! exclusion and type-equivalence rules.
//!
//! ## Modules
//!
//! - [`value`] - In-memory value trees with shared, identity-bearing containers
//! - [`config`] - Validated comparison options, exclusions and type groups
//! - [`hash`] - Canonical encoding, pluggable hash functions and hash caches
//! - [`level`] - Comparison levels and the paths they render
//! - [`diff`] - The diff engine and its tree, flat and text projections

pub mod config;
pub mod diff;
pub mod hash;
pub mod level;
pub mod value;

pub use config::{Config, ConfigBuilder, ConfigError, TypeGroup};
pub use diff::{diff, diff_tree, ChangeRecord, Converters, DeepDiff, DiffReport, RenderError, ReportType, TreeReport};
pub use hash::{hash, DeepHash, HashCache, HashFunction, HashToken};
pub use level::{ComparisonLevel, Relationship};
pub use value::Value;
