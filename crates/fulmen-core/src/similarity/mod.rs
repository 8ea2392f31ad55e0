//! Unicode-aware text similarity: normalization, edit-distance metrics,
//! and ranked suggestion over candidate lists.
//!
//! All metrics operate on grapheme clusters, so combining marks and emoji
//! sequences count as single units.

mod fold;
mod metrics;
mod suggest;

pub use fold::{NormalizeOptions, casefold, equals_ignore_case, normalize, strip_accents};
pub use metrics::{
    Metric, damerau_osa, damerau_unrestricted, distance, jaro_winkler, levenshtein, score,
    substring_score,
};
pub use suggest::{Suggestion, SuggestOptions, suggest};
