//! # fulmen-core
//!
//! Curated catalog of vendored Crucible assets (documentation, JSON
//! schemas, YAML configuration defaults, and reference data tables) plus
//! the primitives consuming applications need around them:
//!
//! - Asset catalog with canonical IDs, filtering, and fuzzy-suggestion
//!   errors
//! - Lazy, memoized schema registry and validator with uniform diagnostics
//! - Foundry content detection (magic numbers + heuristics) and reference
//!   catalogs (MIME types, countries, HTTP statuses, patterns)
//! - Unicode-aware text similarity, normalization, and ranked suggestions
//! - Process-wide application identity resolution
//!
//! ## Stability Tiers
//!
//! - **Stable** -- `asset_id`, `catalog`, `diagnostics`, `exit_codes`,
//!   `similarity`. Breaking changes require a major version bump.
//! - **Unstable** -- `schema`, `foundry`, `identity`, `telemetry`.
//!   Interfaces may change on minor releases.

/// Canonical asset-ID grammar and path↔id normalization.
///
/// **Stability: stable** -- breaking changes require a major version bump.
pub mod asset_id;
/// Read-only catalog over the vendored asset tree.
///
/// **Stability: stable** -- breaking changes require a major version bump.
pub mod catalog;
/// Diagnostic records and the error taxonomy.
///
/// **Stability: stable** -- breaking changes require a major version bump.
pub mod diagnostics;
/// Shared exit-code taxonomy for CLI collaborators.
///
/// **Stability: stable** -- breaking changes require a major version bump.
pub mod exit_codes;
/// Content-format detection and foundry reference catalogs.
///
/// **Stability: unstable** -- interface may change on minor releases.
pub mod foundry;
/// Lossless frontmatter splitting for vendored documentation.
pub mod frontmatter;
/// Application identity resolution.
///
/// **Stability: unstable** -- interface may change on minor releases.
pub mod identity;
/// Schema registry, validator, normalization, export, and bridge.
///
/// **Stability: unstable** -- interface may change on minor releases.
pub mod schema;
/// Text similarity, normalization, and suggestions.
///
/// **Stability: stable** -- breaking changes require a major version bump.
pub mod similarity;
/// Abstract logging and metrics hooks.
///
/// **Stability: unstable** -- interface may change on minor releases.
pub mod telemetry;
/// Vendored-tree sync metadata.
pub mod version;

pub use asset_id::{
    AssetCategory, CATEGORIES, asset_id_to_path, check_asset_id, extract_config_category,
    extract_schema_kind, extract_version, path_to_asset_id, validate_asset_id,
};
pub use catalog::{Asset, AssetCatalog, DocContent, DocListOptions, ListOptions};
pub use diagnostics::{
    AppIdentityError, AssetError, CoreResult, Diagnostic, EngineSource, ExportFailureReason,
    FoundryCatalogError, FulmenError, SchemaError, Severity, SimilarityError, ValidationReport,
    render,
};
pub use exit_codes::ExitCode;
pub use foundry::{
    CountryEntry, DetectOptions, Foundry, HttpStatusEntry, MagicDatabase, MimeEntry, PatternEntry,
};
pub use identity::{
    ConfigIdentifiers, Identity, LoadOptions, build_env_var, clear_embedded_identity,
    clear_identity_cache, get_embedded_identity, get_env_var, has_embedded_identity,
    load_identity, register_embedded_identity,
};
pub use schema::{
    ComparisonResult, ExportFormat, ExportOptions, ExportOutcome, NormalizeSchemaOptions,
    SchemaFormat, SchemaInfo, SchemaRegistry, ValidateOptions, compare_schemas, normalize_schema,
};
pub use similarity::{
    Metric, NormalizeOptions, SuggestOptions, Suggestion, casefold, distance, equals_ignore_case,
    normalize, score, strip_accents, suggest,
};
pub use telemetry::{Logger, MetricsSink, Telemetry, TracingLogger};
pub use version::CrucibleVersion;
