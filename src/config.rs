//! Configuration for template substitution.
//!
//! Options are plain data: they can be built in code with the `with_*` methods
//! or deserialized from the calling application's configuration file.
//!
//! # Examples
//!
//! ```rust
//! use docstamp::SubstitutionOptions;
//!
//! // Create with defaults
//! let options = SubstitutionOptions::default();
//! assert!(options.inline_rewritten_cells);
//!
//! // Or customize
//! let options = SubstitutionOptions::new()
//!     .with_max_part_bytes(16 * 1024 * 1024)
//!     .with_inline_rewritten_cells(false);
//! ```

use serde::{Deserialize, Serialize};

/// Default maximum uncompressed size permitted for any single part inflated into memory.
pub const DEFAULT_MAX_PART_BYTES: u64 = 256 * 1024 * 1024; // 256MiB

/// Tunables shared by both substitution engines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SubstitutionOptions {
    /// Upper bound for the inflated size of any part read from a template.
    ///
    /// Guards against ZIP bombs and forged size headers.
    pub max_part_bytes: u64,

    /// Spreadsheets only: turn a rewritten shared-string cell into an inline
    /// string cell holding its own text.
    ///
    /// The shared-string entry is rewritten either way; with this disabled the
    /// cell keeps pointing at the (now rewritten) table slot.
    pub inline_rewritten_cells: bool,

    /// Add `xml:space="preserve"` to rewritten text elements whose new value
    /// has leading or trailing whitespace.
    pub preserve_space: bool,
}

impl Default for SubstitutionOptions {
    fn default() -> Self {
        Self {
            max_part_bytes: DEFAULT_MAX_PART_BYTES,
            inline_rewritten_cells: true,
            preserve_space: true,
        }
    }
}

impl SubstitutionOptions {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn with_max_part_bytes(mut self, limit: u64) -> Self {
        self.max_part_bytes = limit;
        self
    }

    #[inline]
    pub fn with_inline_rewritten_cells(mut self, inline: bool) -> Self {
        self.inline_rewritten_cells = inline;
        self
    }

    #[inline]
    pub fn with_preserve_space(mut self, preserve: bool) -> Self {
        self.preserve_space = preserve;
        self
    }
}
