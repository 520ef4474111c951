//! Types and utilities shared by the document engines.

pub mod placeholder;
pub mod xml;

pub use placeholder::{MatchTally, PlaceholderMap, Replacer};
