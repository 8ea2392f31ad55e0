//! Schema registry and validator: lazy-loaded compiled JSON Schemas,
//! uniform diagnostics, canonical normalization, export, and the optional
//! external-binary bridge.

mod bridge;
mod export;
mod normalize;
mod registry;

pub use bridge::{ExternalValidator, GONEAT_BINARY};
pub use export::{ExportFormat, ExportOptions, ExportOutcome, Provenance};
pub use normalize::{
    ComparisonResult, NormalizeSchemaOptions, canonicalize, compare_schemas, normalize_schema,
    normalize_schema_value,
};
pub use registry::{CompiledSchema, EnginePreference, SchemaRegistry, ValidateOptions};

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Source encoding of a schema document on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaFormat {
    Json,
    Yaml,
}

impl SchemaFormat {
    pub fn from_path(path: &std::path::Path) -> Self {
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        if ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml") {
            SchemaFormat::Yaml
        } else {
            SchemaFormat::Json
        }
    }
}

/// Registry metadata for one schema.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaInfo {
    pub id: String,
    pub format: SchemaFormat,
    pub path: PathBuf,
    pub relative_path: String,
    /// `v<semver>` segment of the ID, when present.
    pub version: Option<String>,
    /// `description` field of the loaded document; populated on load.
    pub description: Option<String>,
    /// Draft token from `$schema` (`2020-12`, `07`), when declared.
    pub schema_draft: Option<String>,
}

/// Extract the draft token from a `$schema` URI.
pub(crate) fn draft_token(schema_uri: &str) -> Option<String> {
    if schema_uri.contains("2020-12") {
        Some("2020-12".to_string())
    } else if schema_uri.contains("2019-09") {
        Some("2019-09".to_string())
    } else if schema_uri.contains("draft-07") {
        Some("07".to_string())
    } else if schema_uri.contains("draft-06") {
        Some("06".to_string())
    } else if schema_uri.contains("draft-04") {
        Some("04".to_string())
    } else {
        None
    }
}
