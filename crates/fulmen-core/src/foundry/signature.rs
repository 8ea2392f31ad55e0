//! Magic-number signature model and the built-in database.
//!
//! Signatures are evaluated in descending priority; exact and heuristic
//! strategies interleave so NDJSON (9) is consulted before the plain JSON
//! magic (8).

/// UTF-8 byte-order mark, stripped before any pattern evaluation.
pub const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

/// How a signature decides a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchStrategy {
    /// Byte-wise comparison of patterns at fixed offsets.
    Exact,
    /// Strategy-specific content detector keyed by MIME type.
    Heuristic,
}

/// One byte pattern at a fixed offset, with an optional mask applied to
/// both sides before comparison.
#[derive(Debug, Clone)]
pub struct BytePattern {
    pub offset: usize,
    pub bytes: Vec<u8>,
    pub mask: Option<Vec<u8>>,
    pub description: &'static str,
}

impl BytePattern {
    pub fn at(offset: usize, bytes: &[u8], description: &'static str) -> Self {
        Self {
            offset,
            bytes: bytes.to_vec(),
            mask: None,
            description,
        }
    }

    pub fn with_mask(mut self, mask: &[u8]) -> Self {
        self.mask = Some(mask.to_vec());
        self
    }

    /// Compare the pattern against `sample`, masking both sides.
    pub fn matches(&self, sample: &[u8]) -> bool {
        let end = self.offset + self.bytes.len();
        if sample.len() < end {
            return false;
        }
        let window = &sample[self.offset..end];
        match &self.mask {
            None => window == self.bytes.as_slice(),
            Some(mask) => {
                if mask.len() != self.bytes.len() {
                    return false;
                }
                window
                    .iter()
                    .zip(&self.bytes)
                    .zip(mask)
                    .all(|((got, want), m)| got & m == want & m)
            }
        }
    }
}

/// A prioritized detection signature.
#[derive(Debug, Clone)]
pub struct Signature {
    pub mime_type: &'static str,
    /// Higher priorities are consulted first.
    pub priority: i32,
    pub strategy: MatchStrategy,
    pub patterns: Vec<BytePattern>,
}

impl Signature {
    pub fn exact(mime_type: &'static str, priority: i32, patterns: Vec<BytePattern>) -> Self {
        Self {
            mime_type,
            priority,
            strategy: MatchStrategy::Exact,
            patterns,
        }
    }

    pub fn heuristic(mime_type: &'static str, priority: i32) -> Self {
        Self {
            mime_type,
            priority,
            strategy: MatchStrategy::Heuristic,
            patterns: Vec::new(),
        }
    }
}

/// Ordered signature database.
#[derive(Debug, Clone)]
pub struct MagicDatabase {
    signatures: Vec<Signature>,
}

impl MagicDatabase {
    /// The built-in database, highest priority first.
    pub fn builtin() -> Self {
        let mut db = Self {
            signatures: vec![
                Signature::exact(
                    "application/xml",
                    10,
                    vec![BytePattern::at(0, b"<?xml", "XML declaration")],
                ),
                Signature::exact(
                    "image/png",
                    10,
                    vec![BytePattern::at(
                        0,
                        &[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A],
                        "PNG header",
                    )],
                ),
                Signature::exact(
                    "application/gzip",
                    10,
                    vec![BytePattern::at(0, &[0x1F, 0x8B], "gzip header")],
                ),
                Signature::exact(
                    "application/zip",
                    10,
                    vec![
                        BytePattern::at(0, &[0x50, 0x4B, 0x03, 0x04], "zip local header"),
                        BytePattern::at(0, &[0x50, 0x4B, 0x05, 0x06], "zip empty archive"),
                    ],
                ),
                Signature::exact(
                    "application/pdf",
                    10,
                    vec![BytePattern::at(0, b"%PDF", "PDF header")],
                ),
                Signature::heuristic("application/x-ndjson", 9),
                Signature::exact(
                    "application/json",
                    8,
                    vec![
                        BytePattern::at(0, b"{", "JSON object open"),
                        BytePattern::at(0, b"[", "JSON array open"),
                    ],
                ),
                Signature::heuristic("application/yaml", 7),
                Signature::heuristic("text/csv", 6),
                Signature::heuristic("application/x-protobuf", 5),
                Signature::heuristic("text/plain", 1),
            ],
        };
        db.sort();
        db
    }

    /// An empty database for custom registration.
    pub fn empty() -> Self {
        Self {
            signatures: Vec::new(),
        }
    }

    /// Register a signature, keeping priority order.
    pub fn register(&mut self, signature: Signature) {
        self.signatures.push(signature);
        self.sort();
    }

    pub fn signatures(&self) -> &[Signature] {
        &self.signatures
    }

    fn sort(&mut self) {
        // Stable: equal priorities keep registration order.
        self.signatures.sort_by_key(|s| std::cmp::Reverse(s.priority));
    }
}

impl Default for MagicDatabase {
    fn default() -> Self {
        Self::builtin()
    }
}
