//! Manifest loading.
//!
//! A manifest groups asset documents into named collections, each with its
//! own output directory:
//!
//! ```json
//! {
//!   "collections": [
//!     {
//!       "name": "props",
//!       "output_dir": "../build/props",
//!       "assets": ["props/rock.json", "props/barrel.json"]
//!     }
//!   ]
//! }
//! ```
//!
//! Loading is eager: every document is read, parsed, resolved and validated
//! before anything is rendered, and all validation failures are reported
//! together.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::asset::AssetConfig;
use crate::error::{
    ConfigError, ErrorCode, ValidationError, ValidationResult, ValidationWarning, WarningCode,
};
use crate::paths::{document_dir, resolve_path, resolve_paths};
use crate::validation::{validate_asset, validate_source_scene};

/// Manifest document as written on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    /// Collections to build, in order.
    #[serde(default)]
    pub collections: Vec<Collection>,
}

/// A named group of assets sharing an output directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Collection {
    /// Collection name, unique within the manifest.
    pub name: String,

    /// Root output directory, relative to the manifest.
    pub output_dir: PathBuf,

    /// Asset documents, relative to the manifest.
    #[serde(default)]
    pub assets: Vec<PathBuf>,
}

/// A manifest with every document loaded and validated.
#[derive(Debug, Clone)]
pub struct LoadedManifest {
    /// Path of the manifest document.
    pub path: PathBuf,
    /// Collections in manifest order.
    pub collections: Vec<LoadedCollection>,
    /// Warnings of the manifest itself.
    pub warnings: Vec<ValidationWarning>,
}

impl LoadedManifest {
    /// Total number of assets across all collections.
    pub fn asset_count(&self) -> usize {
        self.collections.iter().map(|c| c.assets.len()).sum()
    }
}

/// A collection whose documents passed validation.
#[derive(Debug, Clone)]
pub struct LoadedCollection {
    /// Collection name.
    pub name: String,
    /// Resolved output directory.
    pub output_dir: PathBuf,
    /// Assets in document order.
    pub assets: Vec<LoadedAsset>,
}

/// A validated asset and the document it came from.
#[derive(Debug, Clone)]
pub struct LoadedAsset {
    /// Path of the asset document.
    pub document_path: PathBuf,
    /// Config with paths resolved.
    pub config: AssetConfig,
    /// Validation warnings for this document.
    pub warnings: Vec<ValidationWarning>,
}

fn read_document(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn parse_asset(path: &Path) -> Result<AssetConfig, ConfigError> {
    let json = read_document(path)?;
    let mut config = AssetConfig::from_json(&json).map_err(|source| ConfigError::Schema {
        path: path.to_path_buf(),
        source,
    })?;
    resolve_paths(&mut config, &document_dir(path));
    Ok(config)
}

fn check_asset(config: &AssetConfig) -> ValidationResult {
    let mut result = validate_asset(config);
    validate_source_scene(config, &mut result);
    result
}

/// Loads and validates a single asset document.
///
/// Relative paths in the document resolve against its directory.
pub fn load_asset(path: &Path) -> Result<LoadedAsset, ConfigError> {
    let config = parse_asset(path)?;
    match check_asset(&config).into_result() {
        Ok(warnings) => Ok(LoadedAsset {
            document_path: path.to_path_buf(),
            config,
            warnings,
        }),
        Err(errors) => Err(ConfigError::Invalid {
            path: path.to_path_buf(),
            errors,
        }),
    }
}

/// Loads a manifest and every asset document it lists.
///
/// Io and schema errors abort loading at the first failing document.
/// Validation errors are collected across all documents; if any are found
/// they are returned together as [`ConfigError::Multiple`].
pub fn load_manifest(path: &Path) -> Result<LoadedManifest, ConfigError> {
    let json = read_document(path)?;
    let manifest: Manifest = serde_json::from_str(&json).map_err(|source| ConfigError::Schema {
        path: path.to_path_buf(),
        source,
    })?;
    let base_dir = document_dir(path);

    let mut failures = Vec::new();
    let mut manifest_result = ValidationResult::default();
    check_collections(&manifest, &mut manifest_result);

    // Resolved asset output directory -> collection that claimed it.
    let mut claimed: HashMap<PathBuf, String> = HashMap::new();

    let mut collections = Vec::with_capacity(manifest.collections.len());
    for collection in &manifest.collections {
        let output_dir = resolve_path(&collection.output_dir, &base_dir);
        let mut assets = Vec::with_capacity(collection.assets.len());
        let mut seen_ids: HashSet<String> = HashSet::new();

        for asset_path in &collection.assets {
            let document_path = resolve_path(asset_path, &base_dir);
            let config = parse_asset(&document_path)?;
            let mut result = check_asset(&config);

            if !seen_ids.insert(config.id.clone()) {
                result.add_error(ValidationError::with_path(
                    ErrorCode::DuplicateAssetId,
                    format!(
                        "id '{}' is already used in collection '{}'",
                        config.id, collection.name
                    ),
                    "id",
                ));
            } else if let Some(owner) = claimed.get(&config.output_dir(&output_dir)) {
                result.add_error(ValidationError::with_path(
                    ErrorCode::DuplicateAssetId,
                    format!(
                        "id '{}' in collection '{}' writes to the same directory as collection '{}'",
                        config.id, collection.name, owner
                    ),
                    "id",
                ));
            } else {
                claimed.insert(config.output_dir(&output_dir), collection.name.clone());
            }

            match result.into_result() {
                Ok(warnings) => assets.push(LoadedAsset {
                    document_path,
                    config,
                    warnings,
                }),
                Err(errors) => failures.push(ConfigError::Invalid {
                    path: document_path,
                    errors,
                }),
            }
        }

        collections.push(LoadedCollection {
            name: collection.name.clone(),
            output_dir,
            assets,
        });
    }

    let warnings = match manifest_result.into_result() {
        Ok(warnings) => warnings,
        Err(errors) => {
            failures.insert(
                0,
                ConfigError::Invalid {
                    path: path.to_path_buf(),
                    errors,
                },
            );
            Vec::new()
        }
    };

    if !failures.is_empty() {
        return Err(ConfigError::Multiple(failures));
    }

    Ok(LoadedManifest {
        path: path.to_path_buf(),
        collections,
        warnings,
    })
}

fn check_collections(manifest: &Manifest, result: &mut ValidationResult) {
    if manifest.collections.is_empty() {
        result.add_error(ValidationError::with_path(
            ErrorCode::NoCollections,
            "collections must have at least one entry",
            "collections",
        ));
    }

    let mut names: HashSet<&str> = HashSet::new();
    for (i, collection) in manifest.collections.iter().enumerate() {
        if !names.insert(collection.name.as_str()) {
            result.add_error(ValidationError::with_path(
                ErrorCode::DuplicateCollection,
                format!("collection '{}' is declared more than once", collection.name),
                format!("collections[{}].name", i),
            ));
        }
        if collection.assets.is_empty() {
            result.add_warning(ValidationWarning::with_path(
                WarningCode::EmptyCollection,
                format!("collection '{}' lists no assets", collection.name),
                format!("collections[{}].assets", i),
            ));
        }
    }
}
