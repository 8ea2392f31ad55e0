//! Ranked suggestions over a candidate list.

use serde::{Deserialize, Serialize};

use super::fold::{NormalizeOptions, normalize};
use super::metrics::{Metric, score};

/// Similarity threshold used for "did you mean" candidates.
pub const DEFAULT_MIN_SCORE: f64 = 0.6;
/// Default cap on returned suggestions.
pub const DEFAULT_MAX_SUGGESTIONS: usize = 3;

/// A ranked candidate: the raw candidate string and its similarity score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suggestion {
    pub value: String,
    pub score: f64,
}

/// Options for [`suggest`].
#[derive(Debug, Clone)]
pub struct SuggestOptions {
    /// Minimum score to include a candidate. Default 0.6.
    pub min_score: f64,
    /// Maximum number of suggestions returned. Default 3.
    pub max_suggestions: usize,
    /// Metric used for scoring. Default levenshtein.
    pub metric: Metric,
    /// Normalize input and candidates before scoring. Default true.
    pub normalize: bool,
    /// Normalization applied when `normalize` is on.
    pub normalize_options: NormalizeOptions,
}

impl Default for SuggestOptions {
    fn default() -> Self {
        Self {
            min_score: DEFAULT_MIN_SCORE,
            max_suggestions: DEFAULT_MAX_SUGGESTIONS,
            metric: Metric::default(),
            normalize: true,
            normalize_options: NormalizeOptions::default(),
        }
    }
}

/// Rank `candidates` by similarity to `input`.
///
/// Scoring runs on normalized forms when `options.normalize` is set, but
/// the returned `value` is always the raw candidate. Ordering is score
/// descending, ties alphabetically ascending on the raw value.
pub fn suggest<S: AsRef<str>>(input: &str, candidates: &[S], options: &SuggestOptions) -> Vec<Suggestion> {
    let needle = if options.normalize {
        normalize(input, &options.normalize_options)
    } else {
        input.to_string()
    };

    let mut ranked: Vec<Suggestion> = candidates
        .iter()
        .filter_map(|candidate| {
            let raw = candidate.as_ref();
            let target = if options.normalize {
                normalize(raw, &options.normalize_options)
            } else {
                raw.to_string()
            };
            let s = score(&needle, &target, options.metric);
            (s >= options.min_score).then(|| Suggestion {
                value: raw.to_string(),
                score: s,
            })
        })
        .collect();

    ranked.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then_with(|| a.value.cmp(&b.value))
    });
    ranked.truncate(options.max_suggestions);
    ranked
}
