//! Autorender asset configuration library
//!
//! This crate provides the config model of the autorender pipeline: the
//! per-asset documents, manifests that group them into collections, path
//! resolution, and validation.
//!
//! # Overview
//!
//! Every asset document is a JSON object tagged by `variant`:
//!
//! - **`material`**: bake a material's diffuse, normal, roughness and metallic
//!   textures and pack an ORM texture
//! - **`animated_sprite`**: render objects frame by frame and assemble sprite sheets
//! - **`animated_scene`**: bake actions to keyframes and export a GLB
//!
//! # Example
//!
//! ```
//! use autorender_spec::{AssetConfig, AssetVariant};
//! use autorender_spec::validation::validate_asset;
//!
//! let config = AssetConfig::from_json(r#"{
//!     "id": "rock01",
//!     "variant": "material",
//!     "source_scene_path": "rock.blend",
//!     "material_name": "Rock",
//!     "texture_size": 256
//! }"#).unwrap();
//!
//! assert!(matches!(config.variant, AssetVariant::Material(_)));
//! assert!(validate_asset(&config).is_ok());
//! ```
//!
//! # Modules
//!
//! - [`asset`]: Tagged asset config and output layout
//! - [`material`], [`sprite`], [`scene`]: Variant payloads
//! - [`manifest`]: Collections and eager loading
//! - [`paths`]: Document-relative path resolution
//! - [`validation`]: Semantic checks
//! - [`error`]: Error and warning types

pub mod asset;
pub mod error;
pub mod manifest;
pub mod material;
pub mod paths;
pub mod scene;
pub mod sprite;
pub mod validation;

// Re-export commonly used types at the crate root
pub use asset::{AssetConfig, AssetKind, AssetVariant};
pub use error::{
    BackendError, ConfigError, ErrorCode, ValidationError, ValidationResult, ValidationWarning,
    WarningCode,
};
pub use manifest::{
    load_asset, load_manifest, Collection, LoadedAsset, LoadedCollection, LoadedManifest,
    Manifest,
};
pub use material::MaterialConfig;
pub use paths::{resolve_path, resolve_paths};
pub use scene::{ActionConfig, AnimatedSceneConfig};
pub use sprite::{
    AnimatedSpriteConfig, CameraConfig, CameraPlacement, CameraView, FrameRange, FrameRangeError,
    ObjectConfig, CAMERA_OBJECT_NAME,
};
pub use validation::{is_valid_asset_id, validate_asset, validate_source_scene};
