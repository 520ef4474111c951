//! XML helpers shared by the format-specific engines.

pub mod escape;
pub mod splice;

pub use escape::{escape_text, needs_space_preserve, unescape_text};
pub use splice::{Splice, apply_splices};
