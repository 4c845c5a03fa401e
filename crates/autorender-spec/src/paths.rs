//! Path resolution for config documents.
//!
//! Relative paths in a document are relative to the directory that holds the
//! document, not to the working directory of the process. The document
//! directory itself is made absolute when it is read, so resolved paths stay
//! valid after the backends change directory or hand them to Blender.

use std::path::{Path, PathBuf};

use crate::asset::AssetConfig;

/// Resolves `path` against `base_dir`. Absolute paths are returned unchanged.
pub fn resolve_path(path: &Path, base_dir: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base_dir.join(path)
    }
}

/// Resolves every path field of `config` against `base_dir`.
///
/// Applying this twice with the same absolute `base_dir` is a no-op the
/// second time.
pub fn resolve_paths(config: &mut AssetConfig, base_dir: &Path) {
    config.source_scene_path = resolve_path(&config.source_scene_path, base_dir);
}

/// Absolute directory that relative paths in the document at
/// `document_path` resolve against.
///
/// A relative document path is anchored at the current working directory.
/// If that directory cannot be read the relative form is kept.
pub fn document_dir(document_path: &Path) -> PathBuf {
    let dir = match document_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::path::absolute(dir).unwrap_or_else(|_| dir.to_path_buf())
}
