//! Embedded foundry reference catalogs: MIME types, countries, HTTP
//! statuses, and named patterns.
//!
//! Catalog data is compiled into the binary, parsed once behind a
//! `LazyLock`, and structurally checked before first use. Lookups return
//! owned clones so callers can never observe shared mutation.

use std::collections::HashMap;
use std::sync::LazyLock;

use serde::{Deserialize, Serialize};

use crate::diagnostics::{Diagnostic, FoundryCatalogError};

const MIME_TYPES_JSON: &str = include_str!("../../data/mime-types.json");
const COUNTRIES_JSON: &str = include_str!("../../data/countries.json");
const HTTP_STATUSES_JSON: &str = include_str!("../../data/http-statuses.json");
const PATTERNS_JSON: &str = include_str!("../../data/patterns.json");

/// A MIME catalog entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MimeEntry {
    /// Canonical lowercase MIME string.
    pub mime: String,
    /// Lowercase extensions, no leading dot.
    #[serde(default)]
    pub extensions: Vec<String>,
    pub description: String,
    #[serde(default)]
    pub binary: bool,
}

/// An ISO-3166 country entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountryEntry {
    pub name: String,
    /// Uppercase alpha-2 code.
    pub alpha2: String,
    /// Uppercase alpha-3 code.
    pub alpha3: String,
    /// Zero-padded three-digit numeric code.
    pub numeric: String,
}

/// An HTTP status entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HttpStatusEntry {
    pub code: u16,
    pub reason: String,
    /// informational | success | redirection | client-error | server-error
    pub group: String,
}

/// A named regular-expression pattern.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternEntry {
    pub name: String,
    pub pattern: String,
    pub description: String,
}

#[derive(Debug, Deserialize)]
struct RawCatalog<T> {
    version: String,
    entries: Vec<T>,
}

/// Parsed catalog plus its lookup indices.
#[derive(Debug)]
pub(crate) struct MimeCatalog {
    pub version: String,
    pub entries: Vec<MimeEntry>,
    by_mime: HashMap<String, usize>,
    by_extension: HashMap<String, usize>,
}

#[derive(Debug)]
pub(crate) struct CountryCatalog {
    pub version: String,
    pub entries: Vec<CountryEntry>,
    by_alpha2: HashMap<String, usize>,
    by_alpha3: HashMap<String, usize>,
    by_numeric: HashMap<String, usize>,
}

#[derive(Debug)]
pub(crate) struct HttpStatusCatalog {
    pub version: String,
    pub entries: Vec<HttpStatusEntry>,
    by_code: HashMap<u16, usize>,
}

#[derive(Debug)]
pub(crate) struct PatternCatalog {
    pub version: String,
    pub entries: Vec<PatternEntry>,
    by_name: HashMap<String, usize>,
}

fn parse_catalog<T: serde::de::DeserializeOwned>(
    name: &'static str,
    json: &str,
) -> Result<RawCatalog<T>, FoundryCatalogError> {
    let raw: RawCatalog<T> =
        serde_json::from_str(json).map_err(|e| FoundryCatalogError::Corrupt {
            catalog: name,
            source: Box::new(e),
        })?;
    if raw.version.is_empty() {
        return Err(FoundryCatalogError::Mismatch {
            catalog: name,
            diagnostics: vec![
                Diagnostic::error("catalog version must be non-empty").with_pointer("/version"),
            ],
        });
    }
    Ok(raw)
}

impl MimeCatalog {
    fn load() -> Result<Self, FoundryCatalogError> {
        let raw: RawCatalog<MimeEntry> = parse_catalog("mime-types", MIME_TYPES_JSON)?;
        let mut by_mime = HashMap::new();
        let mut by_extension = HashMap::new();
        let mut diagnostics = Vec::new();
        for (i, entry) in raw.entries.iter().enumerate() {
            if entry.mime != entry.mime.to_lowercase() {
                diagnostics.push(
                    Diagnostic::error("mime string must be lowercase")
                        .with_pointer(format!("/entries/{}/mime", i)),
                );
            }
            if by_mime.insert(entry.mime.clone(), i).is_some() {
                diagnostics.push(
                    Diagnostic::error(format!("duplicate mime entry: {}", entry.mime))
                        .with_pointer(format!("/entries/{}/mime", i)),
                );
            }
            for ext in &entry.extensions {
                by_extension.entry(ext.to_lowercase()).or_insert(i);
            }
        }
        if !diagnostics.is_empty() {
            return Err(FoundryCatalogError::Mismatch {
                catalog: "mime-types",
                diagnostics,
            });
        }
        Ok(Self {
            version: raw.version,
            entries: raw.entries,
            by_mime,
            by_extension,
        })
    }

    pub fn by_mime(&self, mime: &str) -> Option<&MimeEntry> {
        self.by_mime
            .get(&mime.trim().to_lowercase())
            .map(|&i| &self.entries[i])
    }

    pub fn by_extension(&self, ext: &str) -> Option<&MimeEntry> {
        let key = ext.trim().trim_start_matches('.').to_lowercase();
        self.by_extension.get(&key).map(|&i| &self.entries[i])
    }
}

impl CountryCatalog {
    fn load() -> Result<Self, FoundryCatalogError> {
        let raw: RawCatalog<CountryEntry> = parse_catalog("countries", COUNTRIES_JSON)?;
        let mut by_alpha2 = HashMap::new();
        let mut by_alpha3 = HashMap::new();
        let mut by_numeric = HashMap::new();
        let mut diagnostics = Vec::new();
        for (i, entry) in raw.entries.iter().enumerate() {
            if entry.alpha2.len() != 2 || entry.alpha2 != entry.alpha2.to_uppercase() {
                diagnostics.push(
                    Diagnostic::error("alpha2 must be two uppercase letters")
                        .with_pointer(format!("/entries/{}/alpha2", i)),
                );
            }
            if entry.alpha3.len() != 3 || entry.alpha3 != entry.alpha3.to_uppercase() {
                diagnostics.push(
                    Diagnostic::error("alpha3 must be three uppercase letters")
                        .with_pointer(format!("/entries/{}/alpha3", i)),
                );
            }
            if entry.numeric.len() != 3 || !entry.numeric.bytes().all(|b| b.is_ascii_digit()) {
                diagnostics.push(
                    Diagnostic::error("numeric must be three digits, zero-padded")
                        .with_pointer(format!("/entries/{}/numeric", i)),
                );
            }
            by_alpha2.insert(entry.alpha2.clone(), i);
            by_alpha3.insert(entry.alpha3.clone(), i);
            by_numeric.insert(entry.numeric.clone(), i);
        }
        if !diagnostics.is_empty() {
            return Err(FoundryCatalogError::Mismatch {
                catalog: "countries",
                diagnostics,
            });
        }
        Ok(Self {
            version: raw.version,
            entries: raw.entries,
            by_alpha2,
            by_alpha3,
            by_numeric,
        })
    }

    pub fn by_alpha2(&self, code: &str) -> Option<&CountryEntry> {
        self.by_alpha2
            .get(&code.trim().to_uppercase())
            .map(|&i| &self.entries[i])
    }

    pub fn by_alpha3(&self, code: &str) -> Option<&CountryEntry> {
        self.by_alpha3
            .get(&code.trim().to_uppercase())
            .map(|&i| &self.entries[i])
    }

    pub fn by_numeric(&self, code: &str) -> Option<&CountryEntry> {
        self.by_numeric.get(code).map(|&i| &self.entries[i])
    }
}

impl HttpStatusCatalog {
    fn load() -> Result<Self, FoundryCatalogError> {
        let raw: RawCatalog<HttpStatusEntry> = parse_catalog("http-statuses", HTTP_STATUSES_JSON)?;
        let mut by_code = HashMap::new();
        let mut diagnostics = Vec::new();
        for (i, entry) in raw.entries.iter().enumerate() {
            if !(100..=599).contains(&entry.code) {
                diagnostics.push(
                    Diagnostic::error("status code out of range")
                        .with_pointer(format!("/entries/{}/code", i)),
                );
            }
            if by_code.insert(entry.code, i).is_some() {
                diagnostics.push(
                    Diagnostic::error(format!("duplicate status code: {}", entry.code))
                        .with_pointer(format!("/entries/{}/code", i)),
                );
            }
        }
        if !diagnostics.is_empty() {
            return Err(FoundryCatalogError::Mismatch {
                catalog: "http-statuses",
                diagnostics,
            });
        }
        Ok(Self {
            version: raw.version,
            entries: raw.entries,
            by_code,
        })
    }

    pub fn by_code(&self, code: u16) -> Option<&HttpStatusEntry> {
        self.by_code.get(&code).map(|&i| &self.entries[i])
    }
}

impl PatternCatalog {
    fn load() -> Result<Self, FoundryCatalogError> {
        let raw: RawCatalog<PatternEntry> = parse_catalog("patterns", PATTERNS_JSON)?;
        let mut by_name = HashMap::new();
        let mut diagnostics = Vec::new();
        for (i, entry) in raw.entries.iter().enumerate() {
            if regex::Regex::new(&entry.pattern).is_err() {
                diagnostics.push(
                    Diagnostic::error(format!("pattern '{}' does not compile", entry.name))
                        .with_pointer(format!("/entries/{}/pattern", i)),
                );
            }
            if by_name.insert(entry.name.clone(), i).is_some() {
                diagnostics.push(
                    Diagnostic::error(format!("duplicate pattern name: {}", entry.name))
                        .with_pointer(format!("/entries/{}/name", i)),
                );
            }
        }
        if !diagnostics.is_empty() {
            return Err(FoundryCatalogError::Mismatch {
                catalog: "patterns",
                diagnostics,
            });
        }
        Ok(Self {
            version: raw.version,
            entries: raw.entries,
            by_name,
        })
    }

    pub fn by_name(&self, name: &str) -> Option<&PatternEntry> {
        self.by_name.get(name).map(|&i| &self.entries[i])
    }
}

pub(crate) static MIME_CATALOG: LazyLock<Result<MimeCatalog, FoundryCatalogError>> =
    LazyLock::new(MimeCatalog::load);
pub(crate) static COUNTRY_CATALOG: LazyLock<Result<CountryCatalog, FoundryCatalogError>> =
    LazyLock::new(CountryCatalog::load);
pub(crate) static HTTP_STATUS_CATALOG: LazyLock<Result<HttpStatusCatalog, FoundryCatalogError>> =
    LazyLock::new(HttpStatusCatalog::load);
pub(crate) static PATTERN_CATALOG: LazyLock<Result<PatternCatalog, FoundryCatalogError>> =
    LazyLock::new(PatternCatalog::load);

/// Re-borrow a cached load result. Load failures are terminal for the
/// process but re-reported on every access.
pub(crate) fn cached<'a, T>(
    slot: &'a LazyLock<Result<T, FoundryCatalogError>>,
) -> Result<&'a T, FoundryCatalogError> {
    match &**slot {
        Ok(catalog) => Ok(catalog),
        Err(FoundryCatalogError::Corrupt { catalog, source }) => {
            Err(FoundryCatalogError::Corrupt {
                catalog: *catalog,
                source: source.to_string().into(),
            })
        }
        Err(FoundryCatalogError::Mismatch {
            catalog,
            diagnostics,
        }) => Err(FoundryCatalogError::Mismatch {
            catalog: *catalog,
            diagnostics: diagnostics.clone(),
        }),
    }
}
