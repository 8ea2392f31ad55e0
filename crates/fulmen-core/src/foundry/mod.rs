//! Foundry: content-format detection plus reference-catalog lookups
//! (MIME types, countries, HTTP statuses, named patterns).

mod catalogs;
mod detect;
mod signature;

use std::io::Read;
use std::path::Path;

pub use catalogs::{CountryEntry, HttpStatusEntry, MimeEntry, PatternEntry};
pub use detect::{DEFAULT_BYTES_TO_READ, DetectOptions, strip_bom};
pub use signature::{BytePattern, MagicDatabase, MatchStrategy, Signature, UTF8_BOM};

use catalogs::{COUNTRY_CATALOG, HTTP_STATUS_CATALOG, MIME_CATALOG, PATTERN_CATALOG, cached};

use crate::diagnostics::FoundryCatalogError;
use crate::telemetry::{FOUNDRY_LOOKUP_COUNT, Telemetry};

/// Numeric country-code input: a number or any string spelling of it.
/// Normalized to the zero-padded three-digit form before lookup.
#[derive(Debug, Clone)]
pub struct NumericCode(Option<String>);

impl From<u16> for NumericCode {
    fn from(value: u16) -> Self {
        NumericCode(Some(format!("{:03}", value)))
    }
}

impl From<u32> for NumericCode {
    fn from(value: u32) -> Self {
        NumericCode((value <= 999).then(|| format!("{:03}", value)))
    }
}

impl From<&str> for NumericCode {
    fn from(value: &str) -> Self {
        let trimmed = value.trim();
        let ok = !trimmed.is_empty()
            && trimmed.len() <= 3
            && trimmed.bytes().all(|b| b.is_ascii_digit());
        NumericCode(ok.then(|| format!("{:0>3}", trimmed)))
    }
}

impl From<String> for NumericCode {
    fn from(value: String) -> Self {
        NumericCode::from(value.as_str())
    }
}

/// Detection and catalog facade.
#[derive(Debug, Clone, Default)]
pub struct Foundry {
    database: MagicDatabase,
    telemetry: Telemetry,
}

impl Foundry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_telemetry(mut self, telemetry: Telemetry) -> Self {
        self.telemetry = telemetry;
        self
    }

    /// Swap in a custom signature database.
    pub fn with_database(mut self, database: MagicDatabase) -> Self {
        self.database = database;
        self
    }

    // ---- detection ----

    /// Detect a buffer's format and return its MIME catalog entry.
    pub fn detect_mime_type(
        &self,
        sample: &[u8],
    ) -> Result<Option<MimeEntry>, FoundryCatalogError> {
        match detect::detect_mime_str(&self.database, sample) {
            Some(mime) => self.get_mime_type(mime),
            None => Ok(None),
        }
    }

    /// Detect a file's format by sampling its head; optionally fall back
    /// to an extension lookup when nothing matches.
    pub fn detect_mime_type_from_file(
        &self,
        path: &Path,
        options: &DetectOptions,
    ) -> Result<Option<MimeEntry>, FoundryCatalogError> {
        let detected =
            detect::detect_file_mime_str(&self.database, path, options.bytes_to_read).map_err(
                |e| FoundryCatalogError::Corrupt {
                    catalog: "magic-numbers",
                    source: Box::new(e),
                },
            )?;
        match detected {
            Some(mime) => self.get_mime_type(mime),
            None if options.extension_fallback => {
                let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
                    return Ok(None);
                };
                self.get_mime_type_by_extension(ext)
            }
            None => Ok(None),
        }
    }

    /// Detect a stream's format, reading at most `bytes_to_read` bytes.
    pub fn detect_mime_type_from_stream(
        &self,
        reader: &mut dyn Read,
        options: &DetectOptions,
    ) -> Result<Option<MimeEntry>, FoundryCatalogError> {
        let detected =
            detect::detect_stream_mime_str(&self.database, reader, options.bytes_to_read)
                .map_err(|e| FoundryCatalogError::Corrupt {
                    catalog: "magic-numbers",
                    source: Box::new(e),
                })?;
        match detected {
            Some(mime) => self.get_mime_type(mime),
            None => Ok(None),
        }
    }

    // ---- MIME catalog ----

    pub fn get_mime_type(&self, mime: &str) -> Result<Option<MimeEntry>, FoundryCatalogError> {
        let catalog = cached(&MIME_CATALOG)?;
        Ok(self.observed(catalog.by_mime(mime).cloned()))
    }

    pub fn get_mime_type_by_extension(
        &self,
        extension: &str,
    ) -> Result<Option<MimeEntry>, FoundryCatalogError> {
        let catalog = cached(&MIME_CATALOG)?;
        Ok(self.observed(catalog.by_extension(extension).cloned()))
    }

    pub fn is_supported_mime_type(&self, mime: &str) -> Result<bool, FoundryCatalogError> {
        Ok(self.get_mime_type(mime)?.is_some())
    }

    pub fn list_mime_types(&self) -> Result<Vec<MimeEntry>, FoundryCatalogError> {
        Ok(cached(&MIME_CATALOG)?.entries.clone())
    }

    pub fn mime_catalog_version(&self) -> Result<String, FoundryCatalogError> {
        Ok(cached(&MIME_CATALOG)?.version.clone())
    }

    // ---- country catalog ----

    pub fn get_country_by_alpha2(
        &self,
        code: &str,
    ) -> Result<Option<CountryEntry>, FoundryCatalogError> {
        let catalog = cached(&COUNTRY_CATALOG)?;
        Ok(self.observed(catalog.by_alpha2(code).cloned()))
    }

    pub fn get_country_by_alpha3(
        &self,
        code: &str,
    ) -> Result<Option<CountryEntry>, FoundryCatalogError> {
        let catalog = cached(&COUNTRY_CATALOG)?;
        Ok(self.observed(catalog.by_alpha3(code).cloned()))
    }

    /// Numeric lookup accepting a number or string, normalized to the
    /// padded three-digit form.
    pub fn get_country_by_numeric(
        &self,
        code: impl Into<NumericCode>,
    ) -> Result<Option<CountryEntry>, FoundryCatalogError> {
        let NumericCode(Some(padded)) = code.into() else {
            return Ok(None);
        };
        let catalog = cached(&COUNTRY_CATALOG)?;
        Ok(self.observed(catalog.by_numeric(&padded).cloned()))
    }

    pub fn list_countries(&self) -> Result<Vec<CountryEntry>, FoundryCatalogError> {
        Ok(cached(&COUNTRY_CATALOG)?.entries.clone())
    }

    // ---- HTTP status catalog ----

    pub fn get_http_status(
        &self,
        code: u16,
    ) -> Result<Option<HttpStatusEntry>, FoundryCatalogError> {
        let catalog = cached(&HTTP_STATUS_CATALOG)?;
        Ok(self.observed(catalog.by_code(code).cloned()))
    }

    pub fn list_http_statuses(&self) -> Result<Vec<HttpStatusEntry>, FoundryCatalogError> {
        Ok(cached(&HTTP_STATUS_CATALOG)?.entries.clone())
    }

    // ---- pattern catalog ----

    pub fn get_pattern(&self, name: &str) -> Result<Option<PatternEntry>, FoundryCatalogError> {
        let catalog = cached(&PATTERN_CATALOG)?;
        Ok(self.observed(catalog.by_name(name).cloned()))
    }

    pub fn list_patterns(&self) -> Result<Vec<PatternEntry>, FoundryCatalogError> {
        Ok(cached(&PATTERN_CATALOG)?.entries.clone())
    }

    fn observed<T>(&self, hit: Option<T>) -> Option<T> {
        if hit.is_some() {
            self.telemetry.metrics.counter(FOUNDRY_LOOKUP_COUNT, 1);
        }
        hit
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::telemetry::{RecordingSink, Telemetry};

    #[test]
    fn detect_returns_catalog_entry() {
        let foundry = Foundry::new();
        let entry = foundry.detect_mime_type(b"{\"a\":1}\n{\"b\":2}").unwrap().unwrap();
        assert_eq!(entry.mime, "application/x-ndjson");
        assert!(entry.extensions.contains(&"ndjson".to_string()));
    }

    #[test]
    fn detect_nothing_on_unknown_binary() {
        let foundry = Foundry::new();
        let junk: Vec<u8> = (0..64u8).cycle().take(256).collect();
        assert!(foundry.detect_mime_type(&junk).unwrap().is_none());
    }

    #[test]
    fn country_numeric_spellings_agree() {
        let foundry = Foundry::new();
        let by_number = foundry.get_country_by_numeric(76u16).unwrap().unwrap();
        let by_short = foundry.get_country_by_numeric("76").unwrap().unwrap();
        let by_padded = foundry.get_country_by_numeric("076").unwrap().unwrap();
        assert_eq!(by_number, by_short);
        assert_eq!(by_short, by_padded);
        assert_eq!(by_number.name, "Brazil");
    }

    #[test]
    fn country_numeric_rejects_garbage() {
        let foundry = Foundry::new();
        assert!(foundry.get_country_by_numeric("abc").unwrap().is_none());
        assert!(foundry.get_country_by_numeric("1234").unwrap().is_none());
        assert!(foundry.get_country_by_numeric("").unwrap().is_none());
        assert!(foundry.get_country_by_numeric(1000u32).unwrap().is_none());
    }

    #[test]
    fn alpha_lookups_case_insensitive() {
        let foundry = Foundry::new();
        assert_eq!(
            foundry.get_country_by_alpha2("de").unwrap().unwrap().name,
            "Germany"
        );
        assert_eq!(
            foundry.get_country_by_alpha3("deu").unwrap().unwrap().name,
            "Germany"
        );
    }

    #[test]
    fn lookups_return_clones() {
        let foundry = Foundry::new();
        let mut first = foundry.get_mime_type("application/json").unwrap().unwrap();
        first.description = "mutated".to_string();
        let second = foundry.get_mime_type("application/json").unwrap().unwrap();
        assert_ne!(second.description, "mutated");
    }

    #[test]
    fn successful_lookups_count() {
        let sink = Arc::new(RecordingSink::new());
        let foundry =
            Foundry::new().with_telemetry(Telemetry::disabled().with_metrics(sink.clone()));
        foundry.get_mime_type("application/json").unwrap();
        foundry.get_country_by_alpha2("BR").unwrap();
        foundry.get_http_status(404).unwrap();
        // A miss does not count.
        foundry.get_mime_type("application/does-not-exist").unwrap();
        assert_eq!(sink.counter_total(FOUNDRY_LOOKUP_COUNT), 3);
    }

    #[test]
    fn http_and_pattern_lookup() {
        let foundry = Foundry::new();
        assert_eq!(
            foundry.get_http_status(503).unwrap().unwrap().group,
            "server-error"
        );
        assert!(foundry.get_pattern("uuid").unwrap().is_some());
        assert!(!foundry.list_patterns().unwrap().is_empty());
    }

    #[test]
    fn is_supported_mime_type_accepts_known() {
        let foundry = Foundry::new();
        assert!(foundry.is_supported_mime_type("TEXT/CSV").unwrap());
        assert!(!foundry.is_supported_mime_type("application/nope").unwrap());
    }

    #[test]
    fn extension_fallback_for_files() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("notes.md");
        // Markdown content has no magic; a single prose line is text/plain,
        // so use an empty file to force the fallback path.
        std::fs::write(&path, b"").unwrap();

        let foundry = Foundry::new();
        let no_fallback = foundry
            .detect_mime_type_from_file(&path, &DetectOptions::default())
            .unwrap();
        assert!(no_fallback.is_none());

        let opts = DetectOptions {
            extension_fallback: true,
            ..Default::default()
        };
        let entry = foundry.detect_mime_type_from_file(&path, &opts).unwrap().unwrap();
        assert_eq!(entry.mime, "text/markdown");
    }

    #[test]
    fn stream_detection_via_facade() {
        let foundry = Foundry::new();
        let mut cursor = std::io::Cursor::new(b"name: x\nversion: 1\n".to_vec());
        let entry = foundry
            .detect_mime_type_from_stream(&mut cursor, &DetectOptions::default())
            .unwrap()
            .unwrap();
        assert_eq!(entry.mime, "application/yaml");
    }

    #[test]
    fn missing_file_wraps_into_catalog_error() {
        let foundry = Foundry::new();
        let err = foundry
            .detect_mime_type_from_file(Path::new("/no/such/file"), &DetectOptions::default())
            .unwrap_err();
        assert_eq!(err.catalog(), "magic-numbers");
    }
}
