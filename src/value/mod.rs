//! Value module - In-memory representation of arbitrary nested values.
//!
//! Scalars are held inline; containers are shared handles with a stable
//! identity so that self-referential graphs can be represented and walked.

mod convert;
mod node;
mod number;
mod value;

pub use convert::*;
pub use node::*;
pub use number::*;
pub use value::*;
