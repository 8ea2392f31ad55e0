//! Process-wide application identity resolution.
//!
//! An identity is discovered through an ordered precedence chain (explicit
//! path, environment variable, filesystem ancestor search, embedded
//! fallback), validated against the identity schema, and published frozen
//! behind `Arc`. A source that is selected but missing or invalid fails
//! the load; the chain never silently falls through past a hit.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::{Arc, LazyLock, Mutex};

use serde::{Deserialize, Serialize};

use crate::diagnostics::{AppIdentityError, Diagnostic};

/// Environment variable naming an identity file.
pub const IDENTITY_PATH_ENV: &str = "FULMEN_APP_IDENTITY_PATH";
/// Directory and file name probed during ancestor search.
pub const IDENTITY_DIR: &str = ".fulmen";
pub const IDENTITY_FILE: &str = "app.yaml";

const IDENTITY_SCHEMA_JSON: &str = include_str!("../schemas/app-identity.schema.json");

/// Required identity fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppIdentity {
    pub binary_name: String,
    pub vendor: String,
    pub env_prefix: String,
    pub config_name: String,
    pub description: String,
}

/// Known repository categories for `metadata.repository_category`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RepositoryCategory {
    Cli,
    Workhorse,
    Service,
    Library,
    Pipeline,
    Codex,
    Sdk,
}

/// Open metadata mapping with named well-known fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IdentityMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub support_email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repository_category: Option<RepositoryCategory>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub telemetry_namespace: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registry_id: Option<String>,
    /// Anything else the host application records.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_yaml::Value>,
}

/// A validated, frozen application identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Identity {
    pub app: AppIdentity,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<IdentityMetadata>,
}

/// Frozen `{ vendor, config_name }` pair for config-path helpers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConfigIdentifiers {
    pub vendor: String,
    pub config_name: String,
}

/// Options for [`load_identity`].
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    /// Explicit identity file path; highest precedence.
    pub path: Option<PathBuf>,
    /// Ancestor-search origin. Defaults to the current directory.
    pub start_dir: Option<PathBuf>,
    /// Skip schema validation of the loaded document.
    pub skip_validation: bool,
}

// The embedded slot is first-write-wins; the cache is monotonic per
// resolved path. Both carry test-only resets.
static EMBEDDED: Mutex<Option<Arc<Identity>>> = Mutex::new(None);
static CACHE: LazyLock<Mutex<HashMap<PathBuf, Arc<Identity>>>> =
    LazyLock::new(|| Mutex::new(HashMap::new()));

// Compiling the vendored identity schema cannot fail for a released
// build; treat breakage as a packaging defect.
static IDENTITY_VALIDATOR: LazyLock<jsonschema::Validator> = LazyLock::new(|| {
    let schema: serde_json::Value =
        serde_json::from_str(IDENTITY_SCHEMA_JSON).expect("embedded identity schema is valid JSON");
    jsonschema::validator_for(&schema).expect("embedded identity schema compiles")
});

/// Validate a YAML identity document against the identity schema.
pub fn validate_identity_value(value: &serde_yaml::Value) -> Result<(), Vec<Diagnostic>> {
    let json = serde_json::to_value(value)
        .map_err(|e| vec![Diagnostic::error(format!("identity is not JSON-mappable: {}", e))])?;
    let diagnostics: Vec<Diagnostic> = IDENTITY_VALIDATOR
        .iter_errors(&json)
        .map(|error| {
            Diagnostic::error(error.to_string()).with_pointer(error.instance_path.to_string())
        })
        .collect();
    if diagnostics.is_empty() {
        Ok(())
    } else {
        Err(diagnostics)
    }
}

fn parse_identity(
    value: serde_yaml::Value,
    identity_path: Option<&Path>,
    skip_validation: bool,
) -> Result<Identity, AppIdentityError> {
    if !skip_validation {
        validate_identity_value(&value).map_err(|diagnostics| AppIdentityError::Invalid {
            identity_path: identity_path.map(Path::to_path_buf),
            diagnostics,
            source: None,
        })?;
    }
    serde_yaml::from_value(value).map_err(|e| AppIdentityError::Invalid {
        identity_path: identity_path.map(Path::to_path_buf),
        diagnostics: Vec::new(),
        source: Some(Box::new(e)),
    })
}

// ---- embedded identity ----

/// Parse, validate, and store the embedded identity. First-wins: a second
/// registration fails; a validation failure leaves the slot empty.
pub fn register_embedded_identity(yaml: &str) -> Result<(), AppIdentityError> {
    let value: serde_yaml::Value =
        serde_yaml::from_str(yaml).map_err(|e| AppIdentityError::Invalid {
            identity_path: None,
            diagnostics: Vec::new(),
            source: Some(Box::new(e)),
        })?;
    register_embedded_identity_value(value)
}

/// Value form of [`register_embedded_identity`].
pub fn register_embedded_identity_value(value: serde_yaml::Value) -> Result<(), AppIdentityError> {
    let identity = parse_identity(value, None, false)?;
    let mut slot = EMBEDDED.lock().expect("embedded identity slot poisoned");
    if slot.is_some() {
        return Err(AppIdentityError::AlreadyRegistered);
    }
    *slot = Some(Arc::new(identity));
    Ok(())
}

pub fn has_embedded_identity() -> bool {
    EMBEDDED
        .lock()
        .expect("embedded identity slot poisoned")
        .is_some()
}

pub fn get_embedded_identity() -> Option<Arc<Identity>> {
    EMBEDDED
        .lock()
        .expect("embedded identity slot poisoned")
        .clone()
}

/// Test-only reset of the embedded slot.
pub fn clear_embedded_identity() {
    *EMBEDDED.lock().expect("embedded identity slot poisoned") = None;
}

/// Test-only reset of the path-keyed identity cache.
pub fn clear_identity_cache() {
    CACHE
        .lock()
        .expect("identity cache poisoned")
        .clear();
}

// ---- discovery ----

/// Execute the precedence chain and return the frozen identity.
///
/// Order: explicit path, `FULMEN_APP_IDENTITY_PATH`, closest-ancestor
/// `.fulmen/app.yaml`, embedded identity. A selected source that is
/// missing or invalid fails the load without trying later sources.
pub fn load_identity(options: &LoadOptions) -> Result<Arc<Identity>, AppIdentityError> {
    let mut searched = Vec::new();

    if let Some(path) = &options.path {
        return load_from_file(path, options.skip_validation, vec![path.clone()]);
    }

    if let Some(env_path) = std::env::var_os(IDENTITY_PATH_ENV) {
        let path = PathBuf::from(env_path);
        return load_from_file(&path, options.skip_validation, vec![path.clone()]);
    }

    let start = match &options.start_dir {
        Some(dir) => dir.clone(),
        None => std::env::current_dir().map_err(|e| AppIdentityError::Read {
            identity_path: PathBuf::from("."),
            source: e,
        })?,
    };
    let mut cursor: Option<&Path> = Some(start.as_path());
    while let Some(dir) = cursor {
        let candidate = dir.join(IDENTITY_DIR).join(IDENTITY_FILE);
        if candidate.is_file() {
            searched.push(candidate.clone());
            return load_from_file(&candidate, options.skip_validation, searched);
        }
        searched.push(candidate);
        cursor = dir.parent();
    }

    if let Some(embedded) = get_embedded_identity() {
        return Ok(embedded);
    }

    Err(AppIdentityError::NoSource {
        searched_paths: searched,
    })
}

fn load_from_file(
    path: &Path,
    skip_validation: bool,
    searched_paths: Vec<PathBuf>,
) -> Result<Arc<Identity>, AppIdentityError> {
    if !path.is_file() {
        return Err(AppIdentityError::NotFound {
            identity_path: path.to_path_buf(),
            searched_paths,
        });
    }
    let resolved = std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());

    if let Some(cached) = CACHE
        .lock()
        .expect("identity cache poisoned")
        .get(&resolved)
    {
        return Ok(cached.clone());
    }

    let text = std::fs::read_to_string(&resolved).map_err(|e| AppIdentityError::Read {
        identity_path: resolved.clone(),
        source: e,
    })?;
    let value: serde_yaml::Value =
        serde_yaml::from_str(&text).map_err(|e| AppIdentityError::Invalid {
            identity_path: Some(resolved.clone()),
            diagnostics: Vec::new(),
            source: Some(Box::new(e)),
        })?;
    let identity = Arc::new(parse_identity(value, Some(&resolved), skip_validation)?);

    CACHE
        .lock()
        .expect("identity cache poisoned")
        .insert(resolved, identity.clone());
    Ok(identity)
}

// ---- convenience helpers ----

pub fn get_binary_name(options: &LoadOptions) -> Result<String, AppIdentityError> {
    Ok(load_identity(options)?.app.binary_name.clone())
}

pub fn get_vendor(options: &LoadOptions) -> Result<String, AppIdentityError> {
    Ok(load_identity(options)?.app.vendor.clone())
}

pub fn get_env_prefix(options: &LoadOptions) -> Result<String, AppIdentityError> {
    Ok(load_identity(options)?.app.env_prefix.clone())
}

pub fn get_config_name(options: &LoadOptions) -> Result<String, AppIdentityError> {
    Ok(load_identity(options)?.app.config_name.clone())
}

/// `metadata.telemetry_namespace`, falling back to the binary name.
pub fn get_telemetry_namespace(options: &LoadOptions) -> Result<String, AppIdentityError> {
    let identity = load_identity(options)?;
    Ok(identity
        .metadata
        .as_ref()
        .and_then(|m| m.telemetry_namespace.clone())
        .unwrap_or_else(|| identity.app.binary_name.clone()))
}

pub fn get_config_identifiers(options: &LoadOptions) -> Result<ConfigIdentifiers, AppIdentityError> {
    let identity = load_identity(options)?;
    Ok(ConfigIdentifiers {
        vendor: identity.app.vendor.clone(),
        config_name: identity.app.config_name.clone(),
    })
}

/// Uppercase `key` and replace anything outside `[A-Z0-9_]` with `_`.
fn sanitize_env_key(key: &str) -> String {
    key.to_uppercase()
        .chars()
        .map(|c| {
            if c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// `env_prefix` + sanitized uppercase key.
pub fn build_env_var(key: &str, options: &LoadOptions) -> Result<String, AppIdentityError> {
    let identity = load_identity(options)?;
    Ok(format!("{}{}", identity.app.env_prefix, sanitize_env_key(key)))
}

/// Process-environment lookup of the built variable name.
pub fn get_env_var(key: &str, options: &LoadOptions) -> Result<Option<String>, AppIdentityError> {
    let name = build_env_var(key, options)?;
    Ok(std::env::var(name).ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    // Embedded slot, cache, and env vars are process-global; serialize.
    static GLOBAL_LOCK: Mutex<()> = Mutex::new(());

    fn lock() -> std::sync::MutexGuard<'static, ()> {
        let guard = GLOBAL_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        clear_embedded_identity();
        clear_identity_cache();
        unsafe { std::env::remove_var(IDENTITY_PATH_ENV) };
        guard
    }

    const VALID_YAML: &str = "\
app:
  binary_name: fulmen
  vendor: fulmenhq
  env_prefix: FULMEN_
  config_name: fulmen
  description: Crucible asset helper
metadata:
  repository_category: library
  telemetry_namespace: fulmen-core
";

    fn write_identity(dir: &Path, yaml: &str) -> PathBuf {
        let fulmen_dir = dir.join(IDENTITY_DIR);
        fs::create_dir_all(&fulmen_dir).unwrap();
        let path = fulmen_dir.join(IDENTITY_FILE);
        fs::write(&path, yaml).unwrap();
        path
    }

    #[test]
    fn register_embedded_first_wins() {
        let _guard = lock();
        register_embedded_identity(VALID_YAML).unwrap();
        assert!(has_embedded_identity());
        let second = register_embedded_identity(VALID_YAML);
        assert!(matches!(second, Err(AppIdentityError::AlreadyRegistered)));
        clear_embedded_identity();
        assert!(!has_embedded_identity());
    }

    #[test]
    fn invalid_embedded_leaves_slot_empty() {
        let _guard = lock();
        let bad = "app:\n  binary_name: Not Valid!\n";
        assert!(register_embedded_identity(bad).is_err());
        assert!(!has_embedded_identity());
    }

    #[test]
    fn validation_reports_pattern_violations() {
        let _guard = lock();
        let bad = "\
app:
  binary_name: UPPER
  vendor: fulmenhq
  env_prefix: lower_
  config_name: fulmen
  description: x
";
        let err = register_embedded_identity(bad).unwrap_err();
        match err {
            AppIdentityError::Invalid { diagnostics, .. } => {
                assert!(!diagnostics.is_empty());
                assert!(
                    diagnostics
                        .iter()
                        .any(|d| d.pointer.as_deref() == Some("/app/binary_name"))
                );
            }
            other => panic!("expected Invalid, got {:?}", other),
        }
    }

    #[test]
    fn explicit_path_wins_over_everything() {
        let _guard = lock();
        let temp = TempDir::new().unwrap();
        let explicit = temp.path().join("explicit.yaml");
        fs::write(&explicit, VALID_YAML.replace("fulmen\n", "explicit-app\n")).unwrap();
        register_embedded_identity(VALID_YAML).unwrap();

        let identity = load_identity(&LoadOptions {
            path: Some(explicit),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(identity.app.binary_name, "explicit-app");
    }

    #[test]
    fn env_var_beats_ancestors_and_embedded() {
        let _guard = lock();
        let temp = TempDir::new().unwrap();
        let project = temp.path().join("project");
        fs::create_dir_all(&project).unwrap();
        write_identity(&project, &VALID_YAML.replace("fulmen\n", "ancestor-app\n"));

        let env_file = temp.path().join("env.yaml");
        fs::write(&env_file, VALID_YAML.replace("fulmen\n", "env-app\n")).unwrap();
        unsafe { std::env::set_var(IDENTITY_PATH_ENV, &env_file) };
        register_embedded_identity(VALID_YAML).unwrap();

        let identity = load_identity(&LoadOptions {
            start_dir: Some(project),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(identity.app.binary_name, "env-app");
        unsafe { std::env::remove_var(IDENTITY_PATH_ENV) };
    }

    #[test]
    fn missing_env_file_fails_without_fallthrough() {
        let _guard = lock();
        register_embedded_identity(VALID_YAML).unwrap();
        unsafe { std::env::set_var(IDENTITY_PATH_ENV, "/no/such/identity.yaml") };

        let err = load_identity(&LoadOptions::default()).unwrap_err();
        match err {
            AppIdentityError::NotFound { identity_path, .. } => {
                assert_eq!(identity_path, PathBuf::from("/no/such/identity.yaml"));
            }
            other => panic!("expected NotFound, got {:?}", other),
        }
        unsafe { std::env::remove_var(IDENTITY_PATH_ENV) };
    }

    #[test]
    fn closest_ancestor_wins() {
        let _guard = lock();
        let temp = TempDir::new().unwrap();
        let outer = temp.path();
        let inner = outer.join("workspace/service");
        fs::create_dir_all(&inner).unwrap();
        write_identity(outer, &VALID_YAML.replace("fulmen\n", "outer-app\n"));
        write_identity(&inner, &VALID_YAML.replace("fulmen\n", "inner-app\n"));

        let identity = load_identity(&LoadOptions {
            start_dir: Some(inner),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(identity.app.binary_name, "inner-app");
    }

    #[test]
    fn invalid_ancestor_file_does_not_reach_embedded() {
        let _guard = lock();
        let temp = TempDir::new().unwrap();
        write_identity(temp.path(), "app:\n  binary_name: Broken Name\n");
        register_embedded_identity(VALID_YAML).unwrap();

        let err = load_identity(&LoadOptions {
            start_dir: Some(temp.path().to_path_buf()),
            ..Default::default()
        })
        .unwrap_err();
        assert!(matches!(err, AppIdentityError::Invalid { .. }));
    }

    #[test]
    fn embedded_is_last_resort() {
        let _guard = lock();
        let temp = TempDir::new().unwrap();
        register_embedded_identity(VALID_YAML).unwrap();
        let identity = load_identity(&LoadOptions {
            start_dir: Some(temp.path().to_path_buf()),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(identity.app.binary_name, "fulmen");
    }

    #[test]
    fn no_source_reports_searched_paths() {
        let _guard = lock();
        let temp = TempDir::new().unwrap();
        let err = load_identity(&LoadOptions {
            start_dir: Some(temp.path().to_path_buf()),
            ..Default::default()
        })
        .unwrap_err();
        match err {
            AppIdentityError::NoSource { searched_paths } => {
                assert!(!searched_paths.is_empty());
                assert!(
                    searched_paths[0].ends_with(Path::new(".fulmen/app.yaml")),
                    "unexpected first searched path: {:?}",
                    searched_paths[0]
                );
            }
            other => panic!("expected NoSource, got {:?}", other),
        }
    }

    #[test]
    fn loads_are_cached_by_resolved_path() {
        let _guard = lock();
        let temp = TempDir::new().unwrap();
        let path = write_identity(temp.path(), VALID_YAML);
        let options = LoadOptions {
            path: Some(path.clone()),
            ..Default::default()
        };
        let a = load_identity(&options).unwrap();
        // Rewrite the file; the cache still serves the first load.
        fs::write(&path, VALID_YAML.replace("fulmen\n", "changed\n")).unwrap();
        let b = load_identity(&options).unwrap();
        assert!(Arc::ptr_eq(&a, &b));

        clear_identity_cache();
        let c = load_identity(&options).unwrap();
        assert_eq!(c.app.binary_name, "changed");
    }

    #[test]
    fn skip_validation_accepts_nonconforming_shape() {
        let _guard = lock();
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("loose.yaml");
        // The lowercase env_prefix violates the schema pattern but still
        // deserializes.
        fs::write(
            &path,
            "app:\n  binary_name: fulmen\n  vendor: fulmenhq\n  env_prefix: fulmen_\n  config_name: fulmen\n  description: x\nmetadata:\n  custom_field: 42\n",
        )
        .unwrap();
        let strict = load_identity(&LoadOptions {
            path: Some(path.clone()),
            ..Default::default()
        });
        assert!(matches!(strict, Err(AppIdentityError::Invalid { .. })));

        let identity = load_identity(&LoadOptions {
            path: Some(path),
            skip_validation: true,
            ..Default::default()
        })
        .unwrap();
        assert_eq!(identity.app.env_prefix, "fulmen_");
        let metadata = identity.metadata.as_ref().unwrap();
        assert!(metadata.extra.contains_key("custom_field"));
    }

    #[test]
    fn helpers_project_fields() {
        let _guard = lock();
        let temp = TempDir::new().unwrap();
        let path = write_identity(temp.path(), VALID_YAML);
        let options = LoadOptions {
            path: Some(path),
            ..Default::default()
        };
        assert_eq!(get_binary_name(&options).unwrap(), "fulmen");
        assert_eq!(get_vendor(&options).unwrap(), "fulmenhq");
        assert_eq!(get_env_prefix(&options).unwrap(), "FULMEN_");
        assert_eq!(get_config_name(&options).unwrap(), "fulmen");
        assert_eq!(get_telemetry_namespace(&options).unwrap(), "fulmen-core");
        let ids = get_config_identifiers(&options).unwrap();
        assert_eq!(ids.vendor, "fulmenhq");
        assert_eq!(ids.config_name, "fulmen");
    }

    #[test]
    fn telemetry_namespace_falls_back_to_binary_name() {
        let _guard = lock();
        let temp = TempDir::new().unwrap();
        let yaml = "\
app:
  binary_name: bare
  vendor: fulmenhq
  env_prefix: BARE_
  config_name: bare
  description: no metadata
";
        let path = write_identity(temp.path(), yaml);
        let options = LoadOptions {
            path: Some(path),
            ..Default::default()
        };
        assert_eq!(get_telemetry_namespace(&options).unwrap(), "bare");
    }

    #[test]
    fn env_var_building_sanitizes() {
        let _guard = lock();
        let temp = TempDir::new().unwrap();
        let path = write_identity(temp.path(), VALID_YAML);
        let options = LoadOptions {
            path: Some(path),
            ..Default::default()
        };
        assert_eq!(build_env_var("log-level", &options).unwrap(), "FULMEN_LOG_LEVEL");
        assert_eq!(build_env_var("cache.dir", &options).unwrap(), "FULMEN_CACHE_DIR");
        assert_eq!(build_env_var("TOKEN", &options).unwrap(), "FULMEN_TOKEN");

        unsafe { std::env::set_var("FULMEN_LOG_LEVEL", "debug") };
        assert_eq!(
            get_env_var("log-level", &options).unwrap().as_deref(),
            Some("debug")
        );
        unsafe { std::env::remove_var("FULMEN_LOG_LEVEL") };
        assert_eq!(get_env_var("log-level", &options).unwrap(), None);
    }

    #[test]
    fn sanitize_env_key_rules() {
        assert_eq!(sanitize_env_key("log-level"), "LOG_LEVEL");
        assert_eq!(sanitize_env_key("a.b c"), "A_B_C");
        assert_eq!(sanitize_env_key("ALREADY_OK_9"), "ALREADY_OK_9");
    }
}
