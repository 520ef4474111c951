//! Placeholder matching.
//!
//! All keys of a [`PlaceholderMap`] are compiled into one Aho-Corasick
//! automaton with leftmost-longest semantics. A text node is scanned once:
//! at each position the longest key that matches there wins, and replacement
//! values are emitted without being scanned again. With `{{DATE}}` and
//! `{{DATE_LONG}}` both present, `{{DATE_LONG}}` is therefore never eaten by
//! the shorter key, whatever order the map iterates in.

use std::collections::{BTreeMap, HashMap};

use aho_corasick::{AhoCorasick, BuildError, MatchKind};

/// Literal marker to replacement text. Keys are matched case-sensitively as
/// plain substrings.
pub type PlaceholderMap = HashMap<String, String>;

/// A compiled set of placeholders.
#[derive(Debug, Clone)]
pub struct Replacer {
    /// `None` when no usable key was supplied
    automaton: Option<AhoCorasick>,
    keys: Vec<String>,
    values: Vec<String>,
}

impl Replacer {
    /// Compile `placeholders`.
    ///
    /// Empty keys are dropped; an empty marker would match between every pair
    /// of characters.
    pub fn new(placeholders: &PlaceholderMap) -> Result<Self, BuildError> {
        let mut pairs: Vec<(&String, &String)> = placeholders
            .iter()
            .filter(|(key, _)| {
                if key.is_empty() {
                    tracing::debug!("ignoring empty placeholder key");
                    false
                } else {
                    true
                }
            })
            .collect();
        // Stable pattern ids make reports and logs reproducible.
        pairs.sort_unstable_by(|a, b| a.0.cmp(b.0));

        let keys: Vec<String> = pairs.iter().map(|(k, _)| (*k).clone()).collect();
        let values: Vec<String> = pairs.iter().map(|(_, v)| (*v).clone()).collect();

        let automaton = if keys.is_empty() {
            None
        } else {
            Some(
                AhoCorasick::builder()
                    .match_kind(MatchKind::LeftmostLongest)
                    .build(&keys)?,
            )
        };

        Ok(Self {
            automaton,
            keys,
            values,
        })
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// The usable keys, sorted.
    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    /// A zeroed tally sized for this replacer.
    pub fn tally(&self) -> MatchTally {
        MatchTally {
            counts: vec![0; self.keys.len()],
        }
    }

    /// Replace every placeholder occurrence in `text`.
    ///
    /// Returns `None` when the text is left as it was, either because nothing
    /// matched or because every match was replaced by itself. Matches are
    /// counted in `tally` in both cases.
    pub fn replace(&self, text: &str, tally: &mut MatchTally) -> Option<String> {
        let automaton = self.automaton.as_ref()?;

        let mut matches = automaton.find_iter(text).peekable();
        matches.peek()?;

        let mut out = String::with_capacity(text.len());
        let mut last = 0;
        for m in matches {
            let id = m.pattern().as_usize();
            out.push_str(&text[last..m.start()]);
            out.push_str(&self.values[id]);
            tally.counts[id] += 1;
            last = m.end();
        }
        out.push_str(&text[last..]);

        if out == text { None } else { Some(out) }
    }

    /// Per-key counts of `tally`, keyed by placeholder.
    pub fn summarize(&self, tally: &MatchTally) -> BTreeMap<String, usize> {
        self.keys
            .iter()
            .cloned()
            .zip(tally.counts.iter().copied())
            .collect()
    }
}

/// Number of replacements made per key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchTally {
    counts: Vec<usize>,
}

impl MatchTally {
    /// Total replacements across all keys.
    pub fn total(&self) -> usize {
        self.counts.iter().sum()
    }
}
