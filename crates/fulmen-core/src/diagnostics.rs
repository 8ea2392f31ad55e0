//! Diagnostic records, error taxonomy, and the uniform error renderer.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::asset_id::AssetCategory;
use crate::similarity::Suggestion;

pub type CoreResult<T> = Result<T, FulmenError>;

/// Severity of a single validation finding.
///
/// Ordering is by decreasing severity so that diagnostics can be sorted
/// with `Error` first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Error,
    Warn,
    Info,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "ERROR"),
            Severity::Warn => write!(f, "WARN"),
            Severity::Info => write!(f, "INFO"),
        }
    }
}

/// Which validation engine produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EngineSource {
    /// The in-process `jsonschema` engine.
    LibraryEngine,
    /// The external `goneat` binary bridge.
    ExternalBinary,
}

impl fmt::Display for EngineSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineSource::LibraryEngine => write!(f, "library-engine"),
            EngineSource::ExternalBinary => write!(f, "external-binary"),
        }
    }
}

/// A single structured validation finding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
    /// JSON Pointer into the validated data, when the finding is localized.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pointer: Option<String>,
    /// The schema keyword that fired (`required`, `type`, ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keyword: Option<String>,
    /// Engine that produced the finding. Uniform across one result.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<EngineSource>,
}

impl Diagnostic {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            message: message.into(),
            pointer: None,
            keyword: None,
            source: None,
        }
    }

    pub fn warn(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warn,
            message: message.into(),
            pointer: None,
            keyword: None,
            source: None,
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Info,
            message: message.into(),
            pointer: None,
            keyword: None,
            source: None,
        }
    }

    pub fn with_pointer(mut self, pointer: impl Into<String>) -> Self {
        self.pointer = Some(pointer.into());
        self
    }

    pub fn with_keyword(mut self, keyword: impl Into<String>) -> Self {
        self.keyword = Some(keyword.into());
        self
    }

    pub fn with_source(mut self, source: EngineSource) -> Self {
        self.source = Some(source);
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.severity)?;
        if let Some(pointer) = &self.pointer {
            let shown = if pointer.is_empty() { "/" } else { pointer };
            write!(f, " {}", shown)?;
        }
        if let Some(keyword) = &self.keyword {
            write!(f, " ({})", keyword)?;
        }
        write!(f, ": {}", self.message)?;
        if let Some(source) = &self.source {
            write!(f, " [{}]", source)?;
        }
        Ok(())
    }
}

/// Outcome of validating one data document against one schema.
///
/// `valid` is true iff no diagnostic has [`Severity::Error`]. An invalid
/// document is a business outcome, not an exceptional condition: callers
/// receive this record rather than an error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationReport {
    pub valid: bool,
    pub diagnostics: Vec<Diagnostic>,
    pub source: EngineSource,
}

impl ValidationReport {
    /// Build a report from diagnostics, deriving `valid` and stamping the
    /// engine source onto every diagnostic.
    pub fn from_diagnostics(mut diagnostics: Vec<Diagnostic>, source: EngineSource) -> Self {
        for diag in &mut diagnostics {
            diag.source = Some(source);
        }
        let valid = !diagnostics.iter().any(|d| d.severity == Severity::Error);
        Self {
            valid,
            diagnostics,
            source,
        }
    }

    /// A passing report with no findings.
    pub fn passing(source: EngineSource) -> Self {
        Self {
            valid: true,
            diagnostics: Vec::new(),
            source,
        }
    }

    pub fn error_count(&self) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Error)
            .count()
    }
}

/// Typed failure reason for schema export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExportFailureReason {
    FileExists,
    WriteFailed,
    InvalidFormat,
    ProvenanceFailed,
    Unknown,
}

impl fmt::Display for ExportFailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ExportFailureReason::FileExists => "FILE_EXISTS",
            ExportFailureReason::WriteFailed => "WRITE_FAILED",
            ExportFailureReason::InvalidFormat => "INVALID_FORMAT",
            ExportFailureReason::ProvenanceFailed => "PROVENANCE_FAILED",
            ExportFailureReason::Unknown => "UNKNOWN",
        };
        write!(f, "{}", s)
    }
}

/// Asset catalog errors.
#[derive(Error, Debug)]
pub enum AssetError {
    #[error("asset not found: {asset_id} in {category}")]
    NotFound {
        asset_id: String,
        category: AssetCategory,
        /// Up to three fuzzy candidates from the category's ID set.
        suggestions: Vec<Suggestion>,
    },

    #[error("invalid asset id '{asset_id}' for {category}: {reason}")]
    InvalidId {
        asset_id: String,
        category: AssetCategory,
        reason: String,
    },

    #[error("failed to read asset: {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse asset {asset_id}: {message}")]
    Parse {
        asset_id: String,
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

/// Schema registry, validator, and export errors.
#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("schema not found: {schema_id}")]
    NotFound {
        schema_id: String,
        suggestions: Vec<Suggestion>,
    },

    #[error("failed to parse schema {schema_id}")]
    Parse {
        schema_id: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("schema {schema_id} failed meta-schema validation")]
    MetaSchema {
        schema_id: String,
        diagnostics: Vec<Diagnostic>,
    },

    #[error("failed to compile schema {schema_id}")]
    Compile {
        schema_id: String,
        diagnostics: Vec<Diagnostic>,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("failed to parse data file {path}")]
    DataParse {
        path: PathBuf,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("validation engine failure for schema {schema_id} ({source_engine})")]
    Engine {
        schema_id: String,
        source_engine: EngineSource,
        diagnostics: Vec<Diagnostic>,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("schema export failed ({reason})")]
    Export {
        reason: ExportFailureReason,
        out_path: Option<PathBuf>,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error(transparent)]
    Asset(#[from] AssetError),
}

/// Foundry catalog load/lookup errors.
#[derive(Error, Debug)]
pub enum FoundryCatalogError {
    #[error("foundry catalog '{catalog}' is unavailable or corrupt")]
    Corrupt {
        catalog: &'static str,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("foundry catalog '{catalog}' failed schema checks")]
    Mismatch {
        catalog: &'static str,
        diagnostics: Vec<Diagnostic>,
    },
}

impl FoundryCatalogError {
    pub fn catalog(&self) -> &'static str {
        match self {
            FoundryCatalogError::Corrupt { catalog, .. } => catalog,
            FoundryCatalogError::Mismatch { catalog, .. } => catalog,
        }
    }
}

/// Similarity fixture/engine errors.
#[derive(Error, Debug)]
pub enum SimilarityError {
    #[error("similarity catalog failure")]
    Catalog {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("unknown similarity metric: {name}")]
    UnknownMetric { name: String },
}

/// App identity resolution errors.
#[derive(Error, Debug)]
pub enum AppIdentityError {
    #[error("identity file not found: {}", identity_path.display())]
    NotFound {
        identity_path: PathBuf,
        searched_paths: Vec<PathBuf>,
    },

    #[error("no identity source available")]
    NoSource { searched_paths: Vec<PathBuf> },

    #[error("identity {} is invalid", identity_path.as_deref().map(|p| p.display().to_string()).unwrap_or_else(|| "document".to_string()))]
    Invalid {
        identity_path: Option<PathBuf>,
        diagnostics: Vec<Diagnostic>,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("embedded identity already registered")]
    AlreadyRegistered,

    #[error("failed to read identity file: {}", identity_path.display())]
    Read {
        identity_path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Umbrella error for the public surface.
#[derive(Error, Debug)]
pub enum FulmenError {
    #[error(transparent)]
    Asset(#[from] AssetError),
    #[error(transparent)]
    Schema(#[from] SchemaError),
    #[error(transparent)]
    Foundry(#[from] FoundryCatalogError),
    #[error(transparent)]
    Similarity(#[from] SimilarityError),
    #[error(transparent)]
    Identity(#[from] AppIdentityError),
}

/// Render any taxonomy error in the stable multi-line form used for logs:
/// the message first, then enumerated diagnostics, then a "Did you mean"
/// line when suggestions exist.
pub fn render(error: &FulmenError) -> String {
    let mut out = error.to_string();

    match error {
        FulmenError::Asset(AssetError::NotFound { suggestions, .. })
        | FulmenError::Schema(SchemaError::NotFound { suggestions, .. }) => {
            push_suggestions(&mut out, suggestions);
        }
        FulmenError::Schema(SchemaError::MetaSchema { diagnostics, .. })
        | FulmenError::Schema(SchemaError::Compile { diagnostics, .. })
        | FulmenError::Schema(SchemaError::Engine { diagnostics, .. })
        | FulmenError::Foundry(FoundryCatalogError::Mismatch { diagnostics, .. })
        | FulmenError::Identity(AppIdentityError::Invalid { diagnostics, .. }) => {
            push_diagnostics(&mut out, diagnostics);
        }
        _ => {}
    }

    // Walk the cause chain so native error codes stay visible.
    let mut cause = std::error::Error::source(error);
    while let Some(err) = cause {
        out.push_str("\n  caused by: ");
        out.push_str(&err.to_string());
        cause = err.source();
    }

    out
}

fn push_diagnostics(out: &mut String, diagnostics: &[Diagnostic]) {
    for diag in diagnostics {
        out.push_str("\n  ");
        out.push_str(&diag.to_string());
    }
}

fn push_suggestions(out: &mut String, suggestions: &[Suggestion]) {
    if suggestions.is_empty() {
        return;
    }
    let rendered: Vec<String> = suggestions
        .iter()
        .map(|s| format!("{} ({:.0}%)", s.value, s.score * 100.0))
        .collect();
    out.push_str("\n  Did you mean: ");
    out.push_str(&rendered.join(", "));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_orders_error_first() {
        assert!(Severity::Error < Severity::Warn);
        assert!(Severity::Warn < Severity::Info);
    }

    #[test]
    fn severity_serializes_uppercase() {
        assert_eq!(serde_json::to_string(&Severity::Error).unwrap(), "\"ERROR\"");
        assert_eq!(serde_json::to_string(&Severity::Warn).unwrap(), "\"WARN\"");
    }

    #[test]
    fn engine_source_serializes_kebab() {
        assert_eq!(
            serde_json::to_string(&EngineSource::LibraryEngine).unwrap(),
            "\"library-engine\""
        );
        assert_eq!(
            serde_json::to_string(&EngineSource::ExternalBinary).unwrap(),
            "\"external-binary\""
        );
    }

    #[test]
    fn report_valid_iff_no_errors() {
        let report = ValidationReport::from_diagnostics(
            vec![Diagnostic::warn("soft"), Diagnostic::info("note")],
            EngineSource::LibraryEngine,
        );
        assert!(report.valid);
        assert_eq!(report.error_count(), 0);

        let report = ValidationReport::from_diagnostics(
            vec![Diagnostic::warn("soft"), Diagnostic::error("hard")],
            EngineSource::LibraryEngine,
        );
        assert!(!report.valid);
        assert_eq!(report.error_count(), 1);
    }

    #[test]
    fn report_stamps_uniform_source() {
        let report = ValidationReport::from_diagnostics(
            vec![Diagnostic::error("a"), Diagnostic::error("b")],
            EngineSource::ExternalBinary,
        );
        assert!(
            report
                .diagnostics
                .iter()
                .all(|d| d.source == Some(EngineSource::ExternalBinary))
        );
    }

    #[test]
    fn diagnostic_display_includes_pointer_and_keyword() {
        let diag = Diagnostic::error("missing field")
            .with_pointer("/app/vendor")
            .with_keyword("required")
            .with_source(EngineSource::LibraryEngine);
        let rendered = diag.to_string();
        assert!(rendered.contains("[ERROR]"));
        assert!(rendered.contains("/app/vendor"));
        assert!(rendered.contains("(required)"));
        assert!(rendered.contains("[library-engine]"));
    }

    #[test]
    fn diagnostic_display_shows_root_pointer() {
        let diag = Diagnostic::error("bad").with_pointer("");
        assert!(diag.to_string().contains(" /"));
    }

    #[test]
    fn render_appends_did_you_mean() {
        let err = FulmenError::Asset(AssetError::NotFound {
            asset_id: "standards/READM.md".into(),
            category: AssetCategory::Docs,
            suggestions: vec![Suggestion {
                value: "standards/README.md".into(),
                score: 0.95,
            }],
        });
        let rendered = render(&err);
        assert!(rendered.contains("asset not found"));
        assert!(rendered.contains("Did you mean: standards/README.md (95%)"));
    }

    #[test]
    fn render_enumerates_diagnostics() {
        let err = FulmenError::Schema(SchemaError::MetaSchema {
            schema_id: "crucible/v1.0.0/thing".into(),
            diagnostics: vec![
                Diagnostic::error("bad type").with_pointer("/properties/x"),
                Diagnostic::error("bad enum").with_pointer("/properties/y"),
            ],
        });
        let rendered = render(&err);
        assert!(rendered.contains("/properties/x"));
        assert!(rendered.contains("/properties/y"));
    }

    #[test]
    fn render_walks_cause_chain() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err = FulmenError::Asset(AssetError::Read {
            path: PathBuf::from("/tmp/x"),
            source: io,
        });
        let rendered = render(&err);
        assert!(rendered.contains("caused by: denied"));
    }

    #[test]
    fn diagnostic_serialization_roundtrip() {
        let original = Diagnostic::error("required property missing")
            .with_pointer("/app")
            .with_keyword("required")
            .with_source(EngineSource::LibraryEngine);
        let json = serde_json::to_string(&original).unwrap();
        let back: Diagnostic = serde_json::from_str(&json).unwrap();
        assert_eq!(back.severity, original.severity);
        assert_eq!(back.pointer, original.pointer);
        assert_eq!(back.keyword, original.keyword);
        assert_eq!(back.source, original.source);
    }

    #[test]
    fn export_reason_display_is_screaming_snake() {
        assert_eq!(ExportFailureReason::FileExists.to_string(), "FILE_EXISTS");
        assert_eq!(ExportFailureReason::WriteFailed.to_string(), "WRITE_FAILED");
        assert_eq!(
            ExportFailureReason::InvalidFormat.to_string(),
            "INVALID_FORMAT"
        );
    }
}
