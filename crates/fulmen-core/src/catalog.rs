//! Read-only catalog over the vendored Crucible asset tree.
//!
//! The tree is produced by the build-time sync tool and is never mutated
//! here. Listings are walked on demand, sorted by canonical ID, and never
//! read file contents; per-document parsing (frontmatter, YAML configs)
//! happens only for operations that ask for it.

use std::path::{Path, PathBuf};
use std::time::{Instant, SystemTime};

use serde_yaml::Value;
use walkdir::WalkDir;

use crate::asset_id::{
    AssetCategory, CATEGORIES, asset_id_to_path, check_asset_id, extract_config_category,
    extract_schema_kind, extract_version, path_to_asset_id,
};
use crate::diagnostics::AssetError;
use crate::frontmatter::{parse_frontmatter, split_frontmatter};
use crate::similarity::{SuggestOptions, suggest};
use crate::telemetry::{
    LogLevel, PATHFINDER_FIND_MS, PATHFINDER_SECURITY_WARNINGS, Telemetry,
};
use crate::version::{CrucibleVersion, read_crucible_version};

/// A vendored asset, addressable by canonical ID.
#[derive(Debug, Clone)]
pub struct Asset {
    pub id: String,
    pub category: AssetCategory,
    /// Absolute path on disk.
    pub path: PathBuf,
    /// Path relative to the vendored root, `/`-separated.
    pub relative_path: String,
    pub size: u64,
    pub modified: Option<SystemTime>,
    /// Parsed frontmatter mapping; populated for docs when a listing had to
    /// read the document (status/tags filters).
    pub metadata: Option<Value>,
    /// `v<semver>` path segment, when one exists (schemas/configs).
    pub version: Option<String>,
    /// First path segment: schema kind or config category.
    pub kind: Option<String>,
}

/// Filters shared by every category listing.
#[derive(Debug, Clone, Default)]
pub struct ListOptions {
    /// Keep only IDs starting with this prefix.
    pub prefix: Option<String>,
    /// Cap the result length; `Some(0)` yields an empty list.
    pub limit: Option<usize>,
}

/// Documentation listing filters.
#[derive(Debug, Clone, Default)]
pub struct DocListOptions {
    pub prefix: Option<String>,
    pub limit: Option<usize>,
    /// Match `status` in the document frontmatter.
    pub status: Option<String>,
    /// Every tag must be present in the frontmatter `tags` array.
    pub tags: Vec<String>,
}

impl DocListOptions {
    fn needs_metadata(&self) -> bool {
        self.status.is_some() || !self.tags.is_empty()
    }
}

/// A document body with its parsed frontmatter.
///
/// `content` has the frontmatter block stripped; concatenating the raw
/// block back in front reconstructs the stored bytes exactly.
#[derive(Debug, Clone)]
pub struct DocContent {
    pub content: String,
    pub metadata: Option<Value>,
}

/// Extensions accepted on disk per category, tried in order when resolving
/// an ID back to a file.
const SCHEMA_FILE_SUFFIXES: &[&str] = &[".schema.json", ".json", ".yaml", ".yml"];
const CONFIG_FILE_SUFFIXES: &[&str] = &[".yaml", ".yml"];

/// Read-only index over one vendored tree root.
#[derive(Debug, Clone)]
pub struct AssetCatalog {
    root: PathBuf,
    telemetry: Telemetry,
}

impl AssetCatalog {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            telemetry: Telemetry::disabled(),
        }
    }

    pub fn with_telemetry(mut self, telemetry: Telemetry) -> Self {
        self.telemetry = telemetry;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The four category tags, in fixed order.
    pub fn list_categories(&self) -> &'static [AssetCategory; 4] {
        CATEGORIES
    }

    /// List a category's assets sorted by ID, applying prefix/limit.
    ///
    /// A missing category directory yields an empty list, not an error.
    pub fn list_assets(
        &self,
        category: AssetCategory,
        options: &ListOptions,
    ) -> Result<Vec<Asset>, AssetError> {
        if options.limit == Some(0) {
            return Ok(Vec::new());
        }
        let mut assets = self.walk_category(category)?;
        if let Some(prefix) = &options.prefix {
            assets.retain(|a| a.id.starts_with(prefix.as_str()));
        }
        assets.sort_by(|a, b| a.id.cmp(&b.id));
        // Two on-disk spellings of the same ID (e.g. `.yaml` next to
        // `.json`) collapse to the first in path order.
        assets.dedup_by(|a, b| a.id == b.id);
        if let Some(limit) = options.limit {
            assets.truncate(limit);
        }
        Ok(assets)
    }

    /// Resolve a single asset by ID, with fuzzy suggestions on miss.
    pub fn get_asset(&self, category: AssetCategory, id: &str) -> Result<Asset, AssetError> {
        check_asset_id(id, category).map_err(|reason| AssetError::InvalidId {
            asset_id: id.to_string(),
            category,
            reason,
        })?;
        for relative in self.candidate_paths(category, id) {
            let path = self.root.join(&relative);
            if let Ok(meta) = std::fs::metadata(&path) {
                if meta.is_file() {
                    return Ok(self.asset_from_parts(category, id, path, relative, &meta));
                }
            }
        }
        Err(self.not_found(category, id))
    }

    /// Raw UTF-8 contents of an asset.
    pub fn read_asset(&self, category: AssetCategory, id: &str) -> Result<String, AssetError> {
        let asset = self.get_asset(category, id)?;
        std::fs::read_to_string(&asset.path).map_err(|source| AssetError::Read {
            path: asset.path.clone(),
            source,
        })
    }

    // ---- documentation ----

    /// List docs, optionally filtering on frontmatter status and tags.
    ///
    /// Status/tags filters read each candidate's frontmatter; matched
    /// assets carry the parsed mapping in `metadata`.
    pub fn list_documentation(&self, options: &DocListOptions) -> Result<Vec<Asset>, AssetError> {
        let base = ListOptions {
            prefix: options.prefix.clone(),
            // Filtering may drop entries, so the limit applies after it.
            limit: if options.needs_metadata() {
                None
            } else {
                options.limit
            },
        };
        if options.limit == Some(0) {
            return Ok(Vec::new());
        }
        let mut assets = self.list_assets(AssetCategory::Docs, &base)?;
        if options.needs_metadata() {
            let mut kept = Vec::new();
            for mut asset in assets {
                let Some(metadata) = self.doc_metadata_for(&asset)? else {
                    continue;
                };
                if !doc_matches(&metadata, options) {
                    continue;
                }
                asset.metadata = Some(metadata);
                kept.push(asset);
            }
            if let Some(limit) = options.limit {
                kept.truncate(limit);
            }
            assets = kept;
        }
        Ok(assets)
    }

    /// Raw document content, frontmatter delimiters intact.
    pub fn get_documentation(&self, id: &str) -> Result<String, AssetError> {
        self.read_asset(AssetCategory::Docs, id)
    }

    /// Document content with the frontmatter block stripped, plus the
    /// parsed frontmatter.
    pub fn get_documentation_with_metadata(&self, id: &str) -> Result<DocContent, AssetError> {
        let raw = self.get_documentation(id)?;
        let metadata = parse_frontmatter(&raw).map_err(|e| AssetError::Parse {
            asset_id: id.to_string(),
            message: "invalid frontmatter YAML".to_string(),
            source: Some(Box::new(e)),
        })?;
        let split = split_frontmatter(&raw);
        Ok(DocContent {
            content: split.content.to_string(),
            metadata,
        })
    }

    /// Parsed frontmatter only; `Ok(None)` when the document does not
    /// exist.
    pub fn get_documentation_metadata(&self, id: &str) -> Result<Option<Value>, AssetError> {
        match self.get_documentation(id) {
            Ok(raw) => parse_frontmatter(&raw).map_err(|e| AssetError::Parse {
                asset_id: id.to_string(),
                message: "invalid frontmatter YAML".to_string(),
                source: Some(Box::new(e)),
            }),
            Err(AssetError::NotFound { .. }) => Ok(None),
            Err(other) => Err(other),
        }
    }

    // ---- schemas ----

    /// List schema assets, optionally filtered by kind (first ID segment).
    pub fn list_schemas(&self, kind: Option<&str>) -> Result<Vec<Asset>, AssetError> {
        let mut assets = self.list_assets(AssetCategory::Schemas, &ListOptions::default())?;
        if let Some(kind) = kind {
            assets.retain(|a| a.kind.as_deref() == Some(kind));
        }
        Ok(assets)
    }

    /// Load a schema document as a JSON value (JSON or YAML source).
    pub fn load_schema_by_id(&self, id: &str) -> Result<serde_json::Value, AssetError> {
        let asset = self.get_asset(AssetCategory::Schemas, id)?;
        let text = std::fs::read_to_string(&asset.path).map_err(|source| AssetError::Read {
            path: asset.path.clone(),
            source,
        })?;
        parse_json_or_yaml(&text, &asset.path).map_err(|e| AssetError::Parse {
            asset_id: id.to_string(),
            message: "schema document is not valid JSON/YAML".to_string(),
            source: Some(e),
        })
    }

    // ---- config defaults ----

    /// List config-default assets, optionally filtered by category (first
    /// ID segment). Entries without a recognizable version carry
    /// `version: None`.
    pub fn list_config_defaults(&self, category: Option<&str>) -> Result<Vec<Asset>, AssetError> {
        let mut assets = self.list_assets(AssetCategory::Configs, &ListOptions::default())?;
        if let Some(category) = category {
            assets.retain(|a| a.kind.as_deref() == Some(category));
        }
        Ok(assets)
    }

    /// YAML-parsed config defaults for a category/version pair.
    ///
    /// `version` accepts both `v1.0.0` and `1.0.0`.
    pub fn get_config_defaults(&self, category: &str, version: &str) -> Result<Value, AssetError> {
        let bare = version.strip_prefix('v').unwrap_or(version);
        let candidates = self.list_config_defaults(Some(category))?;
        let found = candidates
            .iter()
            .find(|a| a.version.as_deref() == Some(bare));
        let Some(asset) = found else {
            let id = format!("{}/v{}", category, bare);
            return Err(self.not_found(AssetCategory::Configs, &id));
        };
        let text = std::fs::read_to_string(&asset.path).map_err(|source| AssetError::Read {
            path: asset.path.clone(),
            source,
        })?;
        serde_yaml::from_str(&text).map_err(|e| AssetError::Parse {
            asset_id: asset.id.clone(),
            message: "config defaults are not valid YAML".to_string(),
            source: Some(Box::new(e)),
        })
    }

    // ---- version metadata ----

    /// Version record of the vendored tree. Never errors.
    pub fn crucible_version(&self) -> CrucibleVersion {
        read_crucible_version(&self.root)
    }

    // ---- internals ----

    fn walk_category(&self, category: AssetCategory) -> Result<Vec<Asset>, AssetError> {
        let prefix = category.prefix();
        let dir = self.root.join(prefix.trim_end_matches('/'));
        if !dir.is_dir() {
            return Ok(Vec::new());
        }

        let started = Instant::now();
        let mut assets = Vec::new();
        let mut skipped_links: u64 = 0;

        for entry in WalkDir::new(&dir).follow_links(false).into_iter().flatten() {
            if entry.path_is_symlink() {
                skipped_links += 1;
                continue;
            }
            if !entry.file_type().is_file() {
                continue;
            }
            let Ok(rel) = entry.path().strip_prefix(&dir) else {
                continue;
            };
            let rel_str = rel.to_string_lossy().replace('\\', "/");
            if !category_accepts(category, &rel_str) {
                continue;
            }
            let relative_path = format!("{}{}", prefix, rel_str);
            let id = path_to_asset_id(&relative_path, category);
            if check_asset_id(&id, category).is_err() {
                continue;
            }
            let Ok(meta) = entry.metadata() else { continue };
            assets.push(self.asset_from_parts(
                category,
                &id,
                entry.path().to_path_buf(),
                relative_path,
                &meta,
            ));
        }

        if skipped_links > 0 {
            self.telemetry
                .metrics
                .counter(PATHFINDER_SECURITY_WARNINGS, skipped_links);
            let count = skipped_links.to_string();
            self.telemetry.logger.log(
                LogLevel::Warn,
                "catalog.walk.symlinks_skipped",
                &[("category", category.as_str()), ("count", count.as_str())],
            );
        }
        self.telemetry.metrics.histogram(
            PATHFINDER_FIND_MS,
            started.elapsed().as_secs_f64() * 1000.0,
        );

        Ok(assets)
    }

    fn asset_from_parts(
        &self,
        category: AssetCategory,
        id: &str,
        path: PathBuf,
        relative_path: String,
        meta: &std::fs::Metadata,
    ) -> Asset {
        let (version, kind) = match category {
            AssetCategory::Schemas => {
                (extract_version(id), Some(extract_schema_kind(id)))
            }
            AssetCategory::Configs => {
                (extract_version(id), Some(extract_config_category(id)))
            }
            AssetCategory::Docs | AssetCategory::Templates => (None, None),
        };
        Asset {
            id: id.to_string(),
            category,
            path,
            relative_path,
            size: meta.len(),
            modified: meta.modified().ok(),
            metadata: None,
            version,
            kind,
        }
    }

    /// Relative paths an ID may live at, canonical extension first.
    fn candidate_paths(&self, category: AssetCategory, id: &str) -> Vec<String> {
        match category {
            AssetCategory::Docs | AssetCategory::Templates => {
                vec![asset_id_to_path(id, category)]
            }
            AssetCategory::Schemas => SCHEMA_FILE_SUFFIXES
                .iter()
                .map(|suffix| format!("{}{}{}", category.prefix(), id, suffix))
                .collect(),
            AssetCategory::Configs => CONFIG_FILE_SUFFIXES
                .iter()
                .map(|suffix| format!("{}{}{}", category.prefix(), id, suffix))
                .collect(),
        }
    }

    fn not_found(&self, category: AssetCategory, id: &str) -> AssetError {
        let candidates: Vec<String> = self
            .list_assets(category, &ListOptions::default())
            .map(|assets| assets.into_iter().map(|a| a.id).collect())
            .unwrap_or_default();
        let suggestions = suggest(id, &candidates, &SuggestOptions::default());
        AssetError::NotFound {
            asset_id: id.to_string(),
            category,
            suggestions,
        }
    }

    fn doc_metadata_for(&self, asset: &Asset) -> Result<Option<Value>, AssetError> {
        let raw = std::fs::read_to_string(&asset.path).map_err(|source| AssetError::Read {
            path: asset.path.clone(),
            source,
        })?;
        // Unparseable frontmatter excludes the doc from filtered listings
        // rather than failing the whole walk.
        Ok(parse_frontmatter(&raw).ok().flatten())
    }
}

fn category_accepts(category: AssetCategory, rel_path: &str) -> bool {
    let lowered = rel_path.to_ascii_lowercase();
    match category {
        AssetCategory::Docs => lowered.ends_with(".md"),
        AssetCategory::Schemas => {
            SCHEMA_FILE_SUFFIXES.iter().any(|s| lowered.ends_with(s))
        }
        AssetCategory::Configs => {
            CONFIG_FILE_SUFFIXES.iter().any(|s| lowered.ends_with(s))
        }
        AssetCategory::Templates => true,
    }
}

fn doc_matches(metadata: &Value, options: &DocListOptions) -> bool {
    if let Some(wanted) = &options.status {
        let got = metadata.get("status").and_then(Value::as_str);
        if got != Some(wanted.as_str()) {
            return false;
        }
    }
    if !options.tags.is_empty() {
        let Some(tags) = metadata.get("tags").and_then(Value::as_sequence) else {
            return false;
        };
        let have: Vec<&str> = tags.iter().filter_map(Value::as_str).collect();
        if !options.tags.iter().all(|t| have.contains(&t.as_str())) {
            return false;
        }
    }
    true
}

fn parse_json_or_yaml(
    text: &str,
    path: &Path,
) -> Result<serde_json::Value, Box<dyn std::error::Error + Send + Sync>> {
    let is_yaml = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("yaml") || e.eq_ignore_ascii_case("yml"));
    if is_yaml {
        let value: Value = serde_yaml::from_str(text)?;
        Ok(serde_json::to_value(value)?)
    } else {
        Ok(serde_json::from_str(text)?)
    }
}
