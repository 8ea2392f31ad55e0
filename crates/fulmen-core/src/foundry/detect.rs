//! Content-based MIME detection: exact magic numbers plus heuristic
//! detectors for line-oriented text formats.

use std::io::Read;
use std::path::Path;

use super::signature::{MagicDatabase, MatchStrategy, UTF8_BOM};

/// Default number of bytes sampled from files and streams.
pub const DEFAULT_BYTES_TO_READ: usize = 512;

/// Options for file and stream detection.
#[derive(Debug, Clone)]
pub struct DetectOptions {
    /// Sample size read from the input. Default 512.
    pub bytes_to_read: usize,
    /// When nothing matches, fall back to an extension lookup.
    pub extension_fallback: bool,
}

impl Default for DetectOptions {
    fn default() -> Self {
        Self {
            bytes_to_read: DEFAULT_BYTES_TO_READ,
            extension_fallback: false,
        }
    }
}

/// Strip a leading UTF-8 BOM from the sample.
pub fn strip_bom(sample: &[u8]) -> &[u8] {
    sample.strip_prefix(UTF8_BOM).unwrap_or(sample)
}

/// Run the database against a byte sample, returning the winning MIME
/// string. Signatures are consulted in descending priority; heuristics
/// interleave with exact patterns.
pub fn detect_mime_str(db: &MagicDatabase, sample: &[u8]) -> Option<&'static str> {
    let sample = strip_bom(sample);
    if sample.is_empty() {
        return None;
    }
    for signature in db.signatures() {
        let hit = match signature.strategy {
            MatchStrategy::Exact => signature.patterns.iter().any(|p| p.matches(sample)),
            MatchStrategy::Heuristic => run_heuristic(signature.mime_type, sample),
        };
        if hit {
            return Some(signature.mime_type);
        }
    }
    None
}

/// Read up to `bytes_to_read` from a stream and detect.
pub fn detect_stream_mime_str(
    db: &MagicDatabase,
    reader: &mut dyn Read,
    bytes_to_read: usize,
) -> std::io::Result<Option<&'static str>> {
    let sample = read_prefix(reader, bytes_to_read)?;
    Ok(detect_mime_str(db, &sample))
}

/// Read a file's prefix and detect.
pub fn detect_file_mime_str(
    db: &MagicDatabase,
    path: &Path,
    bytes_to_read: usize,
) -> std::io::Result<Option<&'static str>> {
    let mut file = std::fs::File::open(path)?;
    detect_stream_mime_str(db, &mut file, bytes_to_read)
}

fn read_prefix(reader: &mut dyn Read, limit: usize) -> std::io::Result<Vec<u8>> {
    let mut sample = Vec::with_capacity(limit.min(DEFAULT_BYTES_TO_READ));
    let mut taken = reader.take(limit as u64);
    taken.read_to_end(&mut sample)?;
    Ok(sample)
}

// ---- heuristics ----

fn run_heuristic(mime_type: &str, sample: &[u8]) -> bool {
    match mime_type {
        "application/x-ndjson" => looks_like_ndjson(sample),
        "application/yaml" => looks_like_yaml(sample),
        "text/csv" => looks_like_csv(sample),
        "application/x-protobuf" => looks_like_protobuf(sample),
        "text/plain" => looks_like_text(sample),
        _ => false,
    }
}

fn text_window(sample: &[u8]) -> Option<&str> {
    let window = &sample[..sample.len().min(DEFAULT_BYTES_TO_READ)];
    std::str::from_utf8(window).ok()
}

/// NDJSON: at least two non-empty lines, the first two (and a third
/// complete one, when present) each parsing as JSON.
fn looks_like_ndjson(sample: &[u8]) -> bool {
    let Some(text) = text_window(sample) else {
        return false;
    };
    let lines: Vec<&str> = text
        .split('\n')
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();
    if lines.len() < 2 {
        return false;
    }
    let checked = lines.len().min(3);
    lines[..checked]
        .iter()
        .all(|line| serde_json::from_str::<serde_json::Value>(line).is_ok())
}

/// YAML: over the first ~10 non-blank, non-comment lines, at least two
/// `key: value` or `- item` lines and no JSON-structural indicators.
fn looks_like_yaml(sample: &[u8]) -> bool {
    let Some(text) = text_window(sample) else {
        return false;
    };
    let lines: Vec<&str> = text
        .lines()
        .filter(|l| {
            let t = l.trim();
            !t.is_empty() && !t.starts_with('#')
        })
        .take(10)
        .collect();
    if lines.is_empty() {
        return false;
    }
    let mut yaml_ish = 0;
    for line in &lines {
        let t = line.trim();
        if t.contains('{') || t.contains('[') || t.ends_with(',') {
            return false;
        }
        if is_yaml_mapping_line(t) || (t.starts_with("- ") && t.len() > 2) {
            yaml_ish += 1;
        }
    }
    yaml_ish >= 2
}

fn is_yaml_mapping_line(line: &str) -> bool {
    let Some((key, rest)) = line.split_once(':') else {
        return false;
    };
    if key.is_empty() || key.contains(char::is_whitespace) {
        return false;
    }
    rest.is_empty() || rest.starts_with(' ')
}

/// CSV: one delimiter out of `,` `;` TAB appears at least once and yields
/// the same field count on every non-empty line of the sample.
fn looks_like_csv(sample: &[u8]) -> bool {
    let Some(text) = text_window(sample) else {
        return false;
    };
    let lines: Vec<&str> = text.lines().filter(|l| !l.trim().is_empty()).collect();
    if lines.is_empty() {
        return false;
    }
    for delimiter in [',', ';', '\t'] {
        let first = lines[0].matches(delimiter).count();
        if first == 0 {
            continue;
        }
        if lines
            .iter()
            .all(|line| line.matches(delimiter).count() == first)
        {
            return true;
        }
    }
    false
}

/// Protobuf: the first byte decodes as a plausible field tag and the
/// sample looks binary.
fn looks_like_protobuf(sample: &[u8]) -> bool {
    let Some(&first) = sample.first() else {
        return false;
    };
    let wire_type = first & 0x07;
    let field_number = first >> 3;
    if !matches!(wire_type, 0 | 1 | 2 | 5) || field_number == 0 {
        return false;
    }
    binary_ratio(sample) > 0.10
}

/// Plain text: a non-empty sample whose binary-byte ratio stays under 5%.
fn looks_like_text(sample: &[u8]) -> bool {
    !sample.is_empty() && binary_ratio(sample) < 0.05
}

/// Share of control bytes below 0x20, TAB/LF/CR excluded.
fn binary_ratio(sample: &[u8]) -> f64 {
    let window = &sample[..sample.len().min(DEFAULT_BYTES_TO_READ)];
    if window.is_empty() {
        return 0.0;
    }
    let binary = window
        .iter()
        .filter(|&&b| b < 0x20 && b != b'\t' && b != b'\n' && b != b'\r')
        .count();
    binary as f64 / window.len() as f64
}
