//! Per-asset config documents.
//!
//! An asset document is a JSON object with a `variant` tag that selects the
//! handler and the shape of the remaining fields:
//!
//! ```json
//! {
//!   "id": "rock01",
//!   "variant": "material",
//!   "source_scene_path": "scenes/rock.blend",
//!   "material_name": "Rock",
//!   "texture_size": 256
//! }
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::material::MaterialConfig;
use crate::scene::AnimatedSceneConfig;
use crate::sprite::AnimatedSpriteConfig;

/// One asset to produce.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetConfig {
    /// Stable identifier, used as the output subdirectory name.
    pub id: String,

    /// Scene file the asset is extracted from.
    #[serde(alias = "blend_file_path")]
    pub source_scene_path: PathBuf,

    /// Variant payload, tagged by `variant`.
    #[serde(flatten)]
    pub variant: AssetVariant,
}

/// The variant-specific part of an asset config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "variant", rename_all = "snake_case")]
pub enum AssetVariant {
    /// Baked material texture set.
    Material(MaterialConfig),
    /// Sprite sheets rendered from animated objects.
    AnimatedSprite(AnimatedSpriteConfig),
    /// Baked animation clips exported as GLB.
    AnimatedScene(AnimatedSceneConfig),
}

/// Variant tag without payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetKind {
    /// `material`
    Material,
    /// `animated_sprite`
    AnimatedSprite,
    /// `animated_scene`
    AnimatedScene,
}

impl AssetKind {
    /// Returns the variant tag as written in config documents.
    pub fn as_str(&self) -> &'static str {
        match self {
            AssetKind::Material => "material",
            AssetKind::AnimatedSprite => "animated_sprite",
            AssetKind::AnimatedScene => "animated_scene",
        }
    }

    /// Output subfolder for assets of this kind.
    pub fn subfolder(&self) -> &'static str {
        match self {
            AssetKind::Material => "materials",
            AssetKind::AnimatedSprite => "spritesheets",
            AssetKind::AnimatedScene => "anim_scenes",
        }
    }
}

impl std::fmt::Display for AssetKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl AssetVariant {
    /// Returns the payload-free tag.
    pub fn kind(&self) -> AssetKind {
        match self {
            AssetVariant::Material(_) => AssetKind::Material,
            AssetVariant::AnimatedSprite(_) => AssetKind::AnimatedSprite,
            AssetVariant::AnimatedScene(_) => AssetKind::AnimatedScene,
        }
    }
}

impl AssetConfig {
    /// Creates an asset config.
    pub fn new(
        id: impl Into<String>,
        source_scene_path: impl Into<PathBuf>,
        variant: AssetVariant,
    ) -> Self {
        Self {
            id: id.into(),
            source_scene_path: source_scene_path.into(),
            variant,
        }
    }

    /// Parses an asset document.
    ///
    /// Missing fields, unknown `variant` tags and type mismatches are all
    /// reported here; semantic checks live in [`crate::validation`].
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Serializes the config to pretty-printed JSON.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Returns the variant tag.
    pub fn kind(&self) -> AssetKind {
        self.variant.kind()
    }

    /// Directory this asset writes to: `<output_dir>/<subfolder>/<id>`.
    pub fn output_dir(&self, collection_output_dir: &Path) -> PathBuf {
        collection_output_dir
            .join(self.kind().subfolder())
            .join(&self.id)
    }
}
