//! Edit-distance metrics and normalized similarity scoring.
//!
//! Edit metrics (`levenshtein`, `damerau_osa`, `damerau_unrestricted`)
//! return whole edit counts; `jaro_winkler` and `substring` return a
//! similarity in [0, 1] directly. [`score`] maps all of them onto [0, 1].

use std::str::FromStr;

use unicode_segmentation::UnicodeSegmentation;

use crate::diagnostics::SimilarityError;

/// Metric selector. The string forms match the shared fixture categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Metric {
    #[default]
    Levenshtein,
    DamerauOsa,
    DamerauUnrestricted,
    JaroWinkler,
    Substring,
}

impl Metric {
    pub fn as_str(self) -> &'static str {
        match self {
            Metric::Levenshtein => "levenshtein",
            Metric::DamerauOsa => "damerau_osa",
            Metric::DamerauUnrestricted => "damerau_unrestricted",
            Metric::JaroWinkler => "jaro_winkler",
            Metric::Substring => "substring",
        }
    }

    /// True for metrics whose `distance` is an edit count.
    pub fn is_edit_metric(self) -> bool {
        matches!(
            self,
            Metric::Levenshtein | Metric::DamerauOsa | Metric::DamerauUnrestricted
        )
    }
}

impl FromStr for Metric {
    type Err = SimilarityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "levenshtein" => Ok(Metric::Levenshtein),
            "damerau_osa" => Ok(Metric::DamerauOsa),
            "damerau_unrestricted" => Ok(Metric::DamerauUnrestricted),
            "jaro_winkler" => Ok(Metric::JaroWinkler),
            "substring" => Ok(Metric::Substring),
            other => Err(SimilarityError::UnknownMetric {
                name: other.to_string(),
            }),
        }
    }
}

fn graphemes(s: &str) -> Vec<&str> {
    s.graphemes(true).collect()
}

/// Levenshtein edit distance over grapheme clusters.
pub fn levenshtein(a: &str, b: &str) -> usize {
    let ga = graphemes(a);
    let gb = graphemes(b);
    strsim::generic_levenshtein(&ga, &gb)
}

/// Damerau-Levenshtein with unbounded transpositions, over graphemes.
pub fn damerau_unrestricted(a: &str, b: &str) -> usize {
    let ga = graphemes(a);
    let gb = graphemes(b);
    strsim::generic_damerau_levenshtein(&ga, &gb)
}

/// Optimal string alignment: at most one swap per adjacent pair.
///
/// No generic OSA kernel exists upstream, so this is a direct DP over
/// grapheme clusters.
pub fn damerau_osa(a: &str, b: &str) -> usize {
    let ga = graphemes(a);
    let gb = graphemes(b);
    let (n, m) = (ga.len(), gb.len());
    if n == 0 {
        return m;
    }
    if m == 0 {
        return n;
    }

    // Three rolling rows: two-back is needed for the transposition case.
    let mut prev2: Vec<usize> = vec![0; m + 1];
    let mut prev: Vec<usize> = (0..=m).collect();
    let mut curr: Vec<usize> = vec![0; m + 1];

    for i in 1..=n {
        curr[0] = i;
        for j in 1..=m {
            let cost = usize::from(ga[i - 1] != gb[j - 1]);
            let mut best = (prev[j] + 1).min(curr[j - 1] + 1).min(prev[j - 1] + cost);
            if i > 1 && j > 1 && ga[i - 1] == gb[j - 2] && ga[i - 2] == gb[j - 1] {
                best = best.min(prev2[j - 2] + 1);
            }
            curr[j] = best;
        }
        std::mem::swap(&mut prev2, &mut prev);
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[m]
}

/// Jaro-Winkler similarity in [0, 1] over graphemes; the boosted common
/// prefix is capped at 4 units.
pub fn jaro_winkler(a: &str, b: &str) -> f64 {
    let ga = graphemes(a);
    let gb = graphemes(b);
    strsim::generic_jaro_winkler(&ga, &gb)
}

/// Substring similarity in [0, 1]: 1.0 when the shorter string is contained
/// in the longer, otherwise the longest common substring length over the
/// longer length.
pub fn substring_score(a: &str, b: &str) -> f64 {
    let ga = graphemes(a);
    let gb = graphemes(b);
    let (shorter, longer) = if ga.len() <= gb.len() {
        (&ga, &gb)
    } else {
        (&gb, &ga)
    };
    if longer.is_empty() {
        return 1.0;
    }
    if shorter.is_empty() {
        return 0.0;
    }
    if contains_run(longer, shorter) {
        return 1.0;
    }
    longest_common_run(shorter, longer) as f64 / longer.len() as f64
}

fn contains_run(haystack: &[&str], needle: &[&str]) -> bool {
    haystack.windows(needle.len()).any(|w| w == needle)
}

fn longest_common_run(a: &[&str], b: &[&str]) -> usize {
    // Classic LCSubstring DP, one rolling row.
    let mut prev = vec![0usize; b.len() + 1];
    let mut best = 0;
    for i in 1..=a.len() {
        let mut curr = vec![0usize; b.len() + 1];
        for j in 1..=b.len() {
            if a[i - 1] == b[j - 1] {
                curr[j] = prev[j - 1] + 1;
                best = best.max(curr[j]);
            }
        }
        prev = curr;
    }
    best
}

/// Metric-dispatching distance.
///
/// Edit metrics return a whole edit count (as `f64`); `jaro_winkler` and
/// `substring` return their similarity in [0, 1].
pub fn distance(a: &str, b: &str, metric: Metric) -> f64 {
    match metric {
        Metric::Levenshtein => levenshtein(a, b) as f64,
        Metric::DamerauOsa => damerau_osa(a, b) as f64,
        Metric::DamerauUnrestricted => damerau_unrestricted(a, b) as f64,
        Metric::JaroWinkler => jaro_winkler(a, b),
        Metric::Substring => substring_score(a, b),
    }
}

/// Normalized similarity in [0, 1].
///
/// For edit metrics: `1 − d / max(|a|, |b|)` over grapheme lengths, with
/// two empty strings scoring 1. Score-valued metrics pass through.
pub fn score(a: &str, b: &str, metric: Metric) -> f64 {
    if metric.is_edit_metric() {
        let max_len = graphemes(a).len().max(graphemes(b).len());
        if max_len == 0 {
            return 1.0;
        }
        1.0 - distance(a, b, metric) / max_len as f64
    } else {
        distance(a, b, metric)
    }
}
