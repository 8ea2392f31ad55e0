//! Casefolding, accent stripping, and the default normalization pipeline.

use caseless::default_case_fold_str;
use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

/// Options for [`normalize`].
#[derive(Debug, Clone)]
pub struct NormalizeOptions {
    /// Trim outer whitespace. Default true.
    pub trim: bool,
    /// Apply Unicode casefolding. Default true.
    pub casefold: bool,
    /// BCP-47-ish locale tag; only `tr`/`az` change behavior (dotted and
    /// dotless I).
    pub locale: Option<String>,
    /// Strip accents (combining marks) after folding. Default false.
    pub strip_accents: bool,
}

impl Default for NormalizeOptions {
    fn default() -> Self {
        Self {
            trim: true,
            casefold: true,
            locale: None,
            strip_accents: false,
        }
    }
}

/// Locale-aware Unicode casefold.
///
/// Uses the default (full) case fold; under Turkic locales the dotted and
/// dotless I pairs fold per `tr` rules before the default fold runs.
pub fn casefold(s: &str, locale: Option<&str>) -> String {
    if locale.is_some_and(is_turkic) {
        let pre: String = s
            .chars()
            .map(|c| match c {
                // Turkish: dotted capital İ folds to i, plain I to dotless ı.
                '\u{0130}' => 'i',
                'I' => '\u{0131}',
                other => other,
            })
            .collect();
        default_case_fold_str(&pre)
    } else {
        default_case_fold_str(s)
    }
}

fn is_turkic(locale: &str) -> bool {
    let base = locale.split(['-', '_']).next().unwrap_or(locale);
    base.eq_ignore_ascii_case("tr") || base.eq_ignore_ascii_case("az")
}

/// Remove combining marks: decompose (NFD), drop marks, recompose (NFC).
pub fn strip_accents(s: &str) -> String {
    s.nfd().filter(|c| !is_combining_mark(*c)).nfc().collect()
}

/// Default pipeline: trim, casefold, optional accent strip.
pub fn normalize(s: &str, options: &NormalizeOptions) -> String {
    let base = if options.trim { s.trim() } else { s };
    let mut out = if options.casefold {
        casefold(base, options.locale.as_deref())
    } else {
        base.to_string()
    };
    if options.strip_accents {
        out = strip_accents(&out);
    }
    out
}

/// `normalize(a) == normalize(b)` under the given options.
pub fn equals_ignore_case(a: &str, b: &str, options: Option<&NormalizeOptions>) -> bool {
    let default = NormalizeOptions::default();
    let opts = options.unwrap_or(&default);
    normalize(a, opts) == normalize(b, opts)
}
