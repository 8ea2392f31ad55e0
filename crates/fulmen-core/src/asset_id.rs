//! Canonical asset-ID grammar and path↔id normalization.
//!
//! IDs are derived from relative paths under a category root and the
//! mapping is a bijection: `asset_id_to_path(path_to_asset_id(p, c), c)`
//! returns `p` for any well-formed path. All separators are normalized to
//! `/`; case is preserved.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The four asset categories, in their fixed listing order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetCategory {
    Docs,
    Schemas,
    Configs,
    Templates,
}

/// Fixed-order category listing. Referentially stable across calls.
pub const CATEGORIES: &[AssetCategory; 4] = &[
    AssetCategory::Docs,
    AssetCategory::Schemas,
    AssetCategory::Configs,
    AssetCategory::Templates,
];

/// Well-known path prefixes under the vendored tree, one per category.
pub const DOCS_PREFIX: &str = "docs/crucible-ts/";
pub const SCHEMAS_PREFIX: &str = "schemas/crucible-ts/";
pub const CONFIGS_PREFIX: &str = "config/crucible-ts/";
pub const TEMPLATES_PREFIX: &str = "templates/crucible-ts/";

impl AssetCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            AssetCategory::Docs => "docs",
            AssetCategory::Schemas => "schemas",
            AssetCategory::Configs => "configs",
            AssetCategory::Templates => "templates",
        }
    }

    /// The category's path prefix under the vendored tree root.
    pub fn prefix(self) -> &'static str {
        match self {
            AssetCategory::Docs => DOCS_PREFIX,
            AssetCategory::Schemas => SCHEMAS_PREFIX,
            AssetCategory::Configs => CONFIGS_PREFIX,
            AssetCategory::Templates => TEMPLATES_PREFIX,
        }
    }

    /// Canonical file extension appended when turning an ID back into a
    /// path. Docs keep `.md` inside the ID itself.
    pub fn canonical_extension(self) -> &'static str {
        match self {
            AssetCategory::Docs => "",
            AssetCategory::Schemas => ".schema.json",
            AssetCategory::Configs => ".yaml",
            AssetCategory::Templates => "",
        }
    }
}

impl fmt::Display for AssetCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for AssetCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "docs" => Ok(AssetCategory::Docs),
            "schemas" => Ok(AssetCategory::Schemas),
            "configs" | "config" => Ok(AssetCategory::Configs),
            "templates" => Ok(AssetCategory::Templates),
            other => Err(format!("unknown asset category: {}", other)),
        }
    }
}

/// Extensions stripped from schema and config paths when deriving an ID.
/// Longest first so `.schema.json` wins over `.json`.
const STRIPPED_EXTENSIONS: &[&str] = &[".schema.json", ".json", ".yaml", ".yml"];

/// Derive the canonical asset ID from a path.
///
/// Separators are normalized to `/`, the well-known category prefix is
/// stripped if present, and category-specific trailing extensions are
/// removed (`.schema.json`/`.json`/`.yaml`/`.yml` for schemas and configs;
/// docs keep `.md`; templates keep everything).
pub fn path_to_asset_id(path: &str, category: AssetCategory) -> String {
    let mut id = path.replace('\\', "/");
    if let Some(rest) = id.strip_prefix(category.prefix()) {
        id = rest.to_string();
    }
    id = id.trim_matches('/').to_string();
    match category {
        AssetCategory::Schemas | AssetCategory::Configs => {
            for ext in STRIPPED_EXTENSIONS {
                if let Some(stripped) = id.strip_suffix(ext) {
                    id = stripped.to_string();
                    break;
                }
            }
        }
        AssetCategory::Docs | AssetCategory::Templates => {}
    }
    id
}

/// Inverse of [`path_to_asset_id`]: prepend the category prefix and append
/// the canonical extension.
pub fn asset_id_to_path(id: &str, category: AssetCategory) -> String {
    format!("{}{}{}", category.prefix(), id, category.canonical_extension())
}

/// Check an ID against the category's structural invariants, returning the
/// violation reason on failure.
pub fn check_asset_id(id: &str, category: AssetCategory) -> Result<(), String> {
    if id.is_empty() {
        return Err("id is empty".to_string());
    }
    if id.contains('\\') {
        return Err("id contains a backslash".to_string());
    }
    if id.starts_with('/') || id.ends_with('/') {
        return Err("id has a leading or trailing slash".to_string());
    }
    if id.contains("//") {
        return Err("id contains an empty path segment".to_string());
    }
    if id.split('/').any(|seg| seg == "." || seg == "..") {
        return Err("id contains a path traversal segment".to_string());
    }
    match category {
        AssetCategory::Docs => {
            if !id.ends_with(".md") {
                return Err("doc ids must end in .md".to_string());
            }
        }
        AssetCategory::Schemas | AssetCategory::Configs | AssetCategory::Templates => {
            let lowered = id.to_ascii_lowercase();
            for ext in [".json", ".yaml", ".yml"] {
                if lowered.ends_with(ext) {
                    return Err(format!(
                        "{} ids must not carry a file extension ({})",
                        category, ext
                    ));
                }
            }
        }
    }
    Ok(())
}

/// Boolean form of [`check_asset_id`].
pub fn validate_asset_id(id: &str, category: AssetCategory) -> bool {
    check_asset_id(id, category).is_ok()
}

/// Recognize a `v<semver>` path segment in an ID and return the bare
/// semver, or `None` when no segment qualifies.
pub fn extract_version(id: &str) -> Option<String> {
    id.split('/').find_map(|segment| {
        let bare = segment.strip_prefix('v')?;
        semver::Version::parse(bare).ok().map(|v| v.to_string())
    })
}

/// First path segment of a schema ID, or `"unknown"` for bare ids.
pub fn extract_schema_kind(id: &str) -> String {
    first_segment_or_unknown(id)
}

/// First path segment of a config ID, or `"unknown"` for bare ids.
pub fn extract_config_category(id: &str) -> String {
    first_segment_or_unknown(id)
}

fn first_segment_or_unknown(id: &str) -> String {
    match id.split_once('/') {
        Some((first, _)) if !first.is_empty() => first.to_string(),
        _ => "unknown".to_string(),
    }
}
