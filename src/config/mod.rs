//! Config module - Options shared by the hashing and diff engines.
//!
//! Options are validated once, when the Config is built; an invalid or
//! unknown option fails before any value is traversed.

mod config;
mod error;
mod exclude;
mod options;

pub use config::*;
pub use error::*;
pub use exclude::*;
pub use options::*;
