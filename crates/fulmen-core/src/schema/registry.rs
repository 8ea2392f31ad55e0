//! Lazy, memoized schema registry and the validation entry points.
//!
//! Compilation happens at most once per schema ID per process. Concurrent
//! callers share a per-entry latch; a compile failure is terminal and is
//! re-reported on every subsequent access.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, OnceLock};
use std::time::Duration;

use serde_json::Value;

use super::bridge::ExternalValidator;
use super::{SchemaFormat, SchemaInfo, draft_token};
use crate::asset_id::AssetCategory;
use crate::catalog::{AssetCatalog, ListOptions};
use crate::diagnostics::{
    AssetError, Diagnostic, EngineSource, SchemaError, ValidationReport,
};
use crate::telemetry::{LogLevel, Telemetry};

/// A schema with its compiled validator, shared behind `Arc`.
pub struct CompiledSchema {
    pub info: SchemaInfo,
    pub document: Value,
    pub validator: jsonschema::Validator,
}

impl std::fmt::Debug for CompiledSchema {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompiledSchema")
            .field("info", &self.info)
            .finish_non_exhaustive()
    }
}

/// Terminal compile failure, cached per schema ID.
#[derive(Debug, Clone)]
struct CachedFailure {
    message: String,
    diagnostics: Vec<Diagnostic>,
}

impl CachedFailure {
    fn to_error(&self, schema_id: &str) -> SchemaError {
        SchemaError::Compile {
            schema_id: schema_id.to_string(),
            diagnostics: self.diagnostics.clone(),
            source: Some(self.message.clone().into()),
        }
    }
}

type CompileSlot = Arc<OnceLock<Result<Arc<CompiledSchema>, CachedFailure>>>;

/// Which engine a validation call should use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EnginePreference {
    #[default]
    Library,
    External,
}

/// Options for [`SchemaRegistry::validate_data_with`].
#[derive(Debug, Clone)]
pub struct ValidateOptions {
    pub engine: EnginePreference,
    /// Explicit path to the external binary; PATH is probed otherwise.
    pub external_path: Option<PathBuf>,
    /// Fall back to the in-process engine when the external one is
    /// unavailable or fails. Default true.
    pub fallback: bool,
    /// Subprocess timeout, honoured when supplied.
    pub timeout: Option<Duration>,
}

impl Default for ValidateOptions {
    fn default() -> Self {
        Self {
            engine: EnginePreference::Library,
            external_path: None,
            fallback: true,
            timeout: None,
        }
    }
}

/// Registry over the schema category of one vendored tree.
#[derive(Debug)]
pub struct SchemaRegistry {
    catalog: AssetCatalog,
    cache: Mutex<HashMap<String, CompileSlot>>,
    telemetry: Telemetry,
}

impl SchemaRegistry {
    pub fn new(catalog: AssetCatalog) -> Self {
        Self {
            catalog,
            cache: Mutex::new(HashMap::new()),
            telemetry: Telemetry::disabled(),
        }
    }

    pub fn with_telemetry(mut self, telemetry: Telemetry) -> Self {
        self.telemetry = telemetry;
        self
    }

    pub fn catalog(&self) -> &AssetCatalog {
        &self.catalog
    }

    /// Sorted schema metadata, optionally filtered by ID prefix.
    pub fn list_schemas(&self, prefix: Option<&str>) -> Result<Vec<SchemaInfo>, SchemaError> {
        let options = ListOptions {
            prefix: prefix.map(str::to_string),
            limit: None,
        };
        let assets = self
            .catalog
            .list_assets(AssetCategory::Schemas, &options)
            .map_err(SchemaError::Asset)?;
        Ok(assets
            .into_iter()
            .map(|asset| SchemaInfo {
                format: SchemaFormat::from_path(&asset.path),
                path: asset.path,
                relative_path: asset.relative_path,
                version: asset.version,
                description: None,
                schema_draft: None,
                id: asset.id,
            })
            .collect())
    }

    /// Metadata plus the memoized compiled validator for one schema.
    pub fn get_schema(&self, id: &str) -> Result<Arc<CompiledSchema>, SchemaError> {
        // Resolve the asset first so a missing schema is never cached as a
        // terminal failure.
        let asset = self
            .catalog
            .get_asset(AssetCategory::Schemas, id)
            .map_err(|e| match e {
                AssetError::NotFound {
                    asset_id,
                    suggestions,
                    ..
                } => SchemaError::NotFound {
                    schema_id: asset_id,
                    suggestions,
                },
                other => SchemaError::Asset(other),
            })?;

        let slot: CompileSlot = {
            let mut cache = self.cache.lock().expect("schema cache poisoned");
            cache.entry(id.to_string()).or_default().clone()
        };
        let mut compiled_now = false;
        let outcome = slot.get_or_init(|| {
            compiled_now = true;
            self.compile(id, &asset.path, &asset.relative_path)
        });
        if compiled_now {
            let ok = outcome.is_ok().to_string();
            self.telemetry.logger.log(
                LogLevel::Debug,
                "schema.compile",
                &[("schema_id", id), ("ok", ok.as_str())],
            );
        }
        match outcome {
            Ok(compiled) => Ok(compiled.clone()),
            Err(failure) => Err(failure.to_error(id)),
        }
    }

    fn compile(
        &self,
        id: &str,
        path: &Path,
        relative_path: &str,
    ) -> Result<Arc<CompiledSchema>, CachedFailure> {
        let text = std::fs::read_to_string(path).map_err(|e| CachedFailure {
            message: format!("failed to read {}: {}", path.display(), e),
            diagnostics: Vec::new(),
        })?;
        let format = SchemaFormat::from_path(path);
        let document = parse_document(&text, format).map_err(|e| CachedFailure {
            message: format!("failed to parse schema document: {}", e),
            diagnostics: vec![Diagnostic::error(e.to_string())],
        })?;

        let validator = jsonschema::validator_for(&document).map_err(|e| CachedFailure {
            message: format!("schema compilation failed: {}", e),
            diagnostics: vec![
                Diagnostic::error(e.to_string()).with_pointer(e.instance_path.to_string()),
            ],
        })?;

        let description = document
            .get("description")
            .and_then(Value::as_str)
            .map(str::to_string);
        let schema_draft = document
            .get("$schema")
            .and_then(Value::as_str)
            .and_then(draft_token);
        let version = crate::asset_id::extract_version(id);

        Ok(Arc::new(CompiledSchema {
            info: SchemaInfo {
                id: id.to_string(),
                format,
                path: path.to_path_buf(),
                relative_path: relative_path.to_string(),
                version,
                description,
                schema_draft,
            },
            document,
            validator,
        }))
    }

    /// Validate data with the in-process engine.
    ///
    /// An invalid document is a result, not an error: diagnostics carry a
    /// JSON pointer and the firing keyword, and `valid` is false iff any
    /// diagnostic is an ERROR.
    pub fn validate_data(&self, data: &Value, id: &str) -> Result<ValidationReport, SchemaError> {
        let compiled = self.get_schema(id)?;
        Ok(run_library_engine(&compiled, data))
    }

    /// Validate data, honouring an engine preference with fallback.
    pub fn validate_data_with(
        &self,
        data: &Value,
        id: &str,
        options: &ValidateOptions,
    ) -> Result<ValidationReport, SchemaError> {
        let compiled = self.get_schema(id)?;
        if options.engine == EnginePreference::Library {
            return Ok(run_library_engine(&compiled, data));
        }

        let bridge_outcome = ExternalValidator::probe(options.external_path.as_deref())
            .ok_or_else(|| SchemaError::Engine {
                schema_id: id.to_string(),
                source_engine: EngineSource::ExternalBinary,
                diagnostics: Vec::new(),
                source: Some("external validator binary not found".into()),
            })
            .and_then(|bridge| bridge.validate(&compiled.info.path, data, options.timeout, id));

        match bridge_outcome {
            Ok(report) => Ok(report),
            Err(bridge_err) if options.fallback => {
                let mut report = run_library_engine(&compiled, data);
                report.diagnostics.push(
                    Diagnostic::info(format!(
                        "external engine unavailable, used library engine: {}",
                        bridge_err
                    ))
                    .with_source(EngineSource::LibraryEngine),
                );
                Ok(report)
            }
            Err(bridge_err) => Err(bridge_err),
        }
    }

    /// Read a JSON/YAML data file (by extension) and validate it.
    ///
    /// A file that cannot be read or parsed is an error; an invalid
    /// document is a result.
    pub fn validate_file_by_schema_id(
        &self,
        path: &Path,
        id: &str,
    ) -> Result<ValidationReport, SchemaError> {
        let text = std::fs::read_to_string(path).map_err(|e| SchemaError::DataParse {
            path: path.to_path_buf(),
            source: Box::new(e),
        })?;
        let format = SchemaFormat::from_path(path);
        let data = parse_document(&text, format).map_err(|e| SchemaError::DataParse {
            path: path.to_path_buf(),
            source: e,
        })?;
        self.validate_data(&data, id)
    }

    /// Validate a schema document against its declared meta-schema.
    pub fn validate_schema(&self, content: &Value) -> ValidationReport {
        match jsonschema::meta::validate(content) {
            Ok(()) => ValidationReport::passing(EngineSource::LibraryEngine),
            Err(error) => {
                let diagnostic = Diagnostic::error(error.to_string())
                    .with_pointer(error.instance_path.to_string())
                    .with_keyword(keyword_from_schema_path(&error.schema_path.to_string()));
                ValidationReport::from_diagnostics(vec![diagnostic], EngineSource::LibraryEngine)
            }
        }
    }
}

fn run_library_engine(compiled: &CompiledSchema, data: &Value) -> ValidationReport {
    let diagnostics: Vec<Diagnostic> = compiled
        .validator
        .iter_errors(data)
        .map(|error| {
            Diagnostic::error(error.to_string())
                .with_pointer(error.instance_path.to_string())
                .with_keyword(keyword_from_schema_path(&error.schema_path.to_string()))
        })
        .collect();
    ValidationReport::from_diagnostics(diagnostics, EngineSource::LibraryEngine)
}

/// The firing keyword is the last non-index segment of the schema path.
fn keyword_from_schema_path(schema_path: &str) -> String {
    schema_path
        .rsplit('/')
        .find(|seg| !seg.is_empty() && !seg.bytes().all(|b| b.is_ascii_digit()))
        .unwrap_or("schema")
        .to_string()
}

fn parse_document(
    text: &str,
    format: SchemaFormat,
) -> Result<Value, Box<dyn std::error::Error + Send + Sync>> {
    match format {
        SchemaFormat::Json => Ok(serde_json::from_str(text)?),
        SchemaFormat::Yaml => {
            let yaml: serde_yaml::Value = serde_yaml::from_str(text)?;
            Ok(serde_json::to_value(yaml)?)
        }
    }
}
