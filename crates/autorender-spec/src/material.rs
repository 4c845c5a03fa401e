//! Material bake config.

use serde::{Deserialize, Serialize};

/// Parameters of the `material` variant.
///
/// A material asset bakes diffuse, normal, roughness and metallic textures of
/// one material and packs roughness and metallic into an ORM texture.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaterialConfig {
    /// Name of the material in the source scene.
    pub material_name: String,

    /// Edge length of the square output textures in pixels.
    pub texture_size: u32,
}

impl MaterialConfig {
    /// Creates a material config.
    pub fn new(material_name: impl Into<String>, texture_size: u32) -> Self {
        Self {
            material_name: material_name.into(),
            texture_size,
        }
    }
}
