//! Materialize a registry schema to disk, optionally stamped with
//! provenance.
//!
//! The only write path in the library. Everything else treats the vendored
//! tree as read-only.

use std::path::{Path, PathBuf};

use chrono::{SecondsFormat, Utc};
use serde::Serialize;

use super::normalize::{NormalizeSchemaOptions, normalize_schema_value};
use super::registry::SchemaRegistry;
use crate::diagnostics::{ExportFailureReason, SchemaError};

/// Requested output encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportFormat {
    Json,
    Yaml,
    /// Decide by the output path's extension.
    #[default]
    Auto,
}

impl std::str::FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "json" => Ok(ExportFormat::Json),
            "yaml" => Ok(ExportFormat::Yaml),
            "auto" => Ok(ExportFormat::Auto),
            other => Err(format!("unknown export format: {}", other)),
        }
    }
}

/// Options for [`SchemaRegistry::export_schema`].
#[derive(Debug, Clone)]
pub struct ExportOptions {
    pub schema_id: String,
    pub out_path: PathBuf,
    /// Stamp provenance onto the artifact. Default true.
    pub include_provenance: bool,
    /// Re-validate the schema against its meta-schema first. Default true.
    pub validate: bool,
    /// Replace an existing file. Default false.
    pub overwrite: bool,
    pub format: ExportFormat,
    /// Base for relative `out_path` values.
    pub base_dir: Option<PathBuf>,
}

impl ExportOptions {
    pub fn new(schema_id: impl Into<String>, out_path: impl Into<PathBuf>) -> Self {
        Self {
            schema_id: schema_id.into(),
            out_path: out_path.into(),
            include_provenance: true,
            validate: true,
            overwrite: false,
            format: ExportFormat::Auto,
            base_dir: None,
        }
    }
}

/// Provenance block recorded on exported artifacts.
#[derive(Debug, Clone, Serialize)]
pub struct Provenance {
    pub crucible_version: String,
    pub library_version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revision: Option<String>,
    /// RFC3339 UTC export timestamp.
    pub exported_at: String,
}

/// What an export produced.
#[derive(Debug, Clone)]
pub struct ExportOutcome {
    pub out_path: PathBuf,
    pub format: super::SchemaFormat,
    /// Side-car provenance file, for JSON exports with provenance on.
    pub provenance_path: Option<PathBuf>,
}

fn export_error(
    reason: ExportFailureReason,
    out_path: Option<&Path>,
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
) -> SchemaError {
    SchemaError::Export {
        reason,
        out_path: out_path.map(Path::to_path_buf),
        source,
    }
}

impl SchemaRegistry {
    /// Export a schema to `out_path`.
    ///
    /// JSON output is the canonical pretty form; YAML output serializes the
    /// canonical value. Provenance lands as leading `#` comments for YAML
    /// and as a `<out>.provenance.yaml` side-car for JSON.
    pub fn export_schema(&self, options: &ExportOptions) -> Result<ExportOutcome, SchemaError> {
        let out_path = match &options.base_dir {
            Some(base) if options.out_path.is_relative() => base.join(&options.out_path),
            _ => options.out_path.clone(),
        };

        let format = resolve_format(options.format, &out_path)?;
        let compiled = self.get_schema(&options.schema_id)?;

        if options.validate {
            let report = self.validate_schema(&compiled.document);
            if !report.valid {
                return Err(SchemaError::MetaSchema {
                    schema_id: options.schema_id.clone(),
                    diagnostics: report.diagnostics,
                });
            }
        }

        if out_path.exists() && !options.overwrite {
            return Err(export_error(
                ExportFailureReason::FileExists,
                Some(&out_path),
                None,
            ));
        }

        let provenance = options.include_provenance.then(|| {
            let crucible = self.catalog().crucible_version();
            Provenance {
                crucible_version: crucible.version,
                library_version: env!("CARGO_PKG_VERSION").to_string(),
                revision: crucible.commit,
                exported_at: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
            }
        });

        let body = match format {
            super::SchemaFormat::Json => {
                normalize_schema_value(&compiled.document, &NormalizeSchemaOptions::default())
            }
            super::SchemaFormat::Yaml => {
                let yaml = serde_yaml::to_string(&super::normalize::canonicalize(
                    &compiled.document,
                ))
                .map_err(|e| {
                    export_error(ExportFailureReason::Unknown, Some(&out_path), Some(Box::new(e)))
                })?;
                match &provenance {
                    Some(p) => format!("{}{}", yaml_header(p), yaml),
                    None => yaml,
                }
            }
        };

        if let Some(parent) = out_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                export_error(ExportFailureReason::WriteFailed, Some(&out_path), Some(Box::new(e)))
            })?;
        }
        std::fs::write(&out_path, &body).map_err(|e| {
            export_error(ExportFailureReason::WriteFailed, Some(&out_path), Some(Box::new(e)))
        })?;

        let provenance_path = match (&provenance, format) {
            (Some(p), super::SchemaFormat::Json) => {
                let sidecar = sidecar_path(&out_path);
                let rendered = serde_yaml::to_string(p).map_err(|e| {
                    export_error(
                        ExportFailureReason::ProvenanceFailed,
                        Some(&out_path),
                        Some(Box::new(e)),
                    )
                })?;
                std::fs::write(&sidecar, rendered).map_err(|e| {
                    export_error(
                        ExportFailureReason::ProvenanceFailed,
                        Some(&out_path),
                        Some(Box::new(e)),
                    )
                })?;
                Some(sidecar)
            }
            _ => None,
        };

        Ok(ExportOutcome {
            out_path,
            format,
            provenance_path,
        })
    }
}

fn resolve_format(
    requested: ExportFormat,
    out_path: &Path,
) -> Result<super::SchemaFormat, SchemaError> {
    match requested {
        ExportFormat::Json => Ok(super::SchemaFormat::Json),
        ExportFormat::Yaml => Ok(super::SchemaFormat::Yaml),
        ExportFormat::Auto => {
            let ext = out_path
                .extension()
                .and_then(|e| e.to_str())
                .unwrap_or("")
                .to_ascii_lowercase();
            match ext.as_str() {
                "json" => Ok(super::SchemaFormat::Json),
                "yaml" | "yml" => Ok(super::SchemaFormat::Yaml),
                _ => Err(export_error(
                    ExportFailureReason::InvalidFormat,
                    Some(out_path),
                    Some(format!("cannot infer format from extension '{}'", ext).into()),
                )),
            }
        }
    }
}

fn yaml_header(provenance: &Provenance) -> String {
    let mut header = String::new();
    header.push_str(&format!("# crucible_version: {}\n", provenance.crucible_version));
    header.push_str(&format!("# library_version: {}\n", provenance.library_version));
    if let Some(revision) = &provenance.revision {
        header.push_str(&format!("# revision: {}\n", revision));
    }
    header.push_str(&format!("# exported_at: {}\n", provenance.exported_at));
    header
}

fn sidecar_path(out_path: &Path) -> PathBuf {
    let mut name = out_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    name.push_str(".provenance.yaml");
    out_path.with_file_name(name)
}
