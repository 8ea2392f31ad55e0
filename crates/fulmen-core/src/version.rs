//! Vendored-tree sync metadata.
//!
//! The build-time sync tool records what it vendored in
//! `.crucible/metadata/sync-keys.yaml`. Reading it never fails: absence or
//! a malformed file yields the literal fallbacks instead.

use std::path::Path;

use serde::{Deserialize, Serialize};

/// Relative location of the sync record under the vendored root.
pub const SYNC_KEYS_PATH: &str = ".crucible/metadata/sync-keys.yaml";

/// Version record of the vendored Crucible tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrucibleVersion {
    pub version: String,
    pub commit: Option<String>,
    #[serde(rename = "syncedAt")]
    pub synced_at: Option<String>,
    pub dirty: bool,
    #[serde(rename = "syncMethod")]
    pub sync_method: Option<String>,
}

impl Default for CrucibleVersion {
    fn default() -> Self {
        Self {
            version: "unknown".to_string(),
            commit: None,
            synced_at: None,
            dirty: false,
            sync_method: None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawSyncKeys {
    #[serde(default)]
    version: Option<String>,
    #[serde(default)]
    commit: Option<String>,
    #[serde(default, rename = "syncedAt")]
    synced_at: Option<String>,
    #[serde(default)]
    dirty: Option<bool>,
    #[serde(default, rename = "syncMethod")]
    sync_method: Option<String>,
}

/// Read the sync record under `root`, falling back field-by-field.
pub fn read_crucible_version(root: &Path) -> CrucibleVersion {
    let path = root.join(SYNC_KEYS_PATH);
    let Ok(text) = std::fs::read_to_string(&path) else {
        return CrucibleVersion::default();
    };
    let Ok(raw) = serde_yaml::from_str::<RawSyncKeys>(&text) else {
        return CrucibleVersion::default();
    };
    CrucibleVersion {
        version: raw.version.unwrap_or_else(|| "unknown".to_string()),
        commit: raw.commit,
        synced_at: raw.synced_at,
        dirty: raw.dirty.unwrap_or(false),
        sync_method: raw.sync_method,
    }
}
