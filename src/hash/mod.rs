//! Hash module - Canonical encoding and content hashing of value trees.
//!
//! A value is encoded into a canonical string that ignores mapping key
//! order and sequence order, and the string is passed through a pluggable
//! hash function. Tokens are memoized per value identity.

mod cache;
mod deephash;
mod function;
mod visited;


pub use cache::*;
pub use deephash::*;
pub use function::*;
pub use visited::*;
