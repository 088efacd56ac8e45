//! Level module - Comparison levels and the relationships that link them.
//!
//! Each level renders its own path lazily from its parent chain.

mod level;
mod relationship;

pub use level::*;
pub use relationship::*;
