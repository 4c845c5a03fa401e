//! The render engine boundary.
//!
//! Every scene operation the pipeline needs goes through [`RenderEngine`].
//! Calls are synchronous and act on one loaded scene at a time; components
//! receive the engine as `&mut dyn RenderEngine`, so only one of them can
//! drive it at any moment.
//!
//! Two implementations exist:
//!
//! - [`BlenderEngine`] runs each command in a Blender subprocess against a
//!   working copy of the source `.blend` file.
//! - [`MemoryEngine`] evaluates a JSON scene document in process. It renders
//!   and bakes flat colours and records every call, which makes it suitable
//!   for tests and dry runs.

mod blender;
mod memory;

pub use blender::{BlenderEngine, EngineCommand, EngineReport};
pub use memory::{
    ActionDocument, AnimationDocument, EngineCall, MaterialDocument, MemoryEngine, ObjectDocument,
    SceneDocument, SCENE_DOCUMENT_SUFFIX,
};

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::EngineResult;
use crate::shader_graph::{GraphEdit, ShaderGraph};

/// Blender object type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ObjectKind {
    Mesh,
    Armature,
    Camera,
    Light,
    Empty,
    #[serde(other)]
    Other,
}

/// An NLA track and its strips.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NlaTrack {
    pub name: String,
    #[serde(default)]
    pub strips: Vec<NlaStrip>,
}

/// An action placed on a track.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NlaStrip {
    pub action: String,
    pub start_frame: i32,
}

/// Object as reported by [`RenderEngine::scene_info`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectInfo {
    pub name: String,
    pub kind: ObjectKind,
    /// Material per slot; `None` for an empty slot.
    #[serde(default)]
    pub material_slots: Vec<Option<String>>,
    #[serde(default)]
    pub has_animation_data: bool,
    #[serde(default)]
    pub active_action: Option<String>,
    #[serde(default)]
    pub nla_tracks: Vec<NlaTrack>,
}

/// Action as reported by [`RenderEngine::scene_info`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionInfo {
    pub name: String,
    /// First and last keyed frame.
    pub frame_range: (i32, i32),
}

/// Summary of the loaded scene.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SceneInfo {
    #[serde(default)]
    pub objects: Vec<ObjectInfo>,
    #[serde(default)]
    pub actions: Vec<ActionInfo>,
    #[serde(default)]
    pub materials: Vec<String>,
}

impl SceneInfo {
    /// Looks up an object by name.
    pub fn object(&self, name: &str) -> Option<&ObjectInfo> {
        self.objects.iter().find(|o| o.name == name)
    }

    /// Looks up an action by name.
    pub fn action(&self, name: &str) -> Option<&ActionInfo> {
        self.actions.iter().find(|a| a.name == name)
    }

    /// Returns true if a material with this name exists.
    pub fn has_material(&self, name: &str) -> bool {
        self.materials.iter().any(|m| m == name)
    }
}

/// Output image settings for renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderTarget {
    /// Square resolution in pixels.
    pub resolution: u32,
    /// Render the world background as transparent.
    pub transparent_background: bool,
}

impl RenderTarget {
    /// Square RGBA PNG target with transparent background.
    pub fn transparent(resolution: u32) -> Self {
        Self {
            resolution,
            transparent_background: true,
        }
    }
}

/// Orthographic camera placement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CameraSetup {
    /// Name of the camera object.
    pub object: String,
    pub location: [f64; 3],
    /// XYZ Euler rotation in radians.
    pub rotation: [f64; 3],
    pub ortho_scale: f64,
}

/// How surfaces are shaded in renders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ShadingMode {
    /// Materials as authored, unlit emission passes through unchanged.
    Emission,
    /// Solid shading with a matcap in place of materials and lights.
    Matcap {
        studio_light: String,
        scene_lights: bool,
        scene_world: bool,
    },
}

/// Matcap that maps surface normals to colours.
pub const NORMAL_MATCAP: &str = "check_normal+y.exr";

impl ShadingMode {
    /// Matcap shading for normal passes: fixed normal matcap, no scene lights or world.
    pub fn normal_matcap() -> Self {
        ShadingMode::Matcap {
            studio_light: NORMAL_MATCAP.to_string(),
            scene_lights: false,
            scene_world: false,
        }
    }
}

/// Texture bake type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BakeChannel {
    /// Surface emission (used with isolated materials).
    Emit,
    /// Diffuse colour only, no lighting.
    Diffuse,
    /// Tangent-space normals.
    Normal,
    /// Roughness.
    Roughness,
}

impl BakeChannel {
    /// Colour space the channel is stored in unless a request overrides it.
    pub fn default_color_space(&self) -> BakeColorSpace {
        match self {
            BakeChannel::Emit | BakeChannel::Diffuse => BakeColorSpace::Color,
            BakeChannel::Normal | BakeChannel::Roughness => BakeColorSpace::Data,
        }
    }
}

/// How baked values are stored in the image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BakeColorSpace {
    /// sRGB-encoded colour.
    Color,
    /// Raw values (`Non-Color`), no transfer function.
    Data,
}

/// A texture bake of one object to one image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BakeRequest {
    pub object: String,
    pub channel: BakeChannel,
    pub color_space: BakeColorSpace,
    /// Square image size in pixels.
    pub size: u32,
    pub output: PathBuf,
}

impl BakeRequest {
    /// Creates a request stored in the channel's default colour space.
    pub fn new(
        object: impl Into<String>,
        channel: BakeChannel,
        size: u32,
        output: impl Into<PathBuf>,
    ) -> Self {
        Self {
            object: object.into(),
            channel,
            color_space: channel.default_color_space(),
            size,
            output: output.into(),
        }
    }

    /// Overrides the colour space.
    pub fn with_color_space(mut self, color_space: BakeColorSpace) -> Self {
        self.color_space = color_space;
        self
    }
}

/// Settings for baking animation to keyframes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyframeBakeOptions {
    pub frame_start: i32,
    pub frame_end: i32,
    pub step: u32,
    pub visual_keying: bool,
    pub clear_constraints: bool,
    pub clear_parents: bool,
    pub use_current_action: bool,
}

impl KeyframeBakeOptions {
    /// Visual keying over `frame_start..=frame_end`, keeping constraints and
    /// parents and writing into the current action.
    pub fn visual(frame_start: i32, frame_end: i32, step: u32) -> Self {
        Self {
            frame_start,
            frame_end,
            step,
            visual_keying: true,
            clear_constraints: false,
            clear_parents: false,
            use_current_action: true,
        }
    }
}

/// How animations are written on export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AnimationExportMode {
    /// One animation per action.
    Actions,
    /// One animation per NLA track.
    NlaTracks,
}

/// GLB export settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportOptions {
    pub output: PathBuf,
    pub animation_mode: AnimationExportMode,
    pub force_sampling: bool,
    pub apply_transforms: bool,
}

impl ExportOptions {
    /// GLB with one animation per action, no forced resampling, transforms applied.
    pub fn glb_actions(output: impl Into<PathBuf>) -> Self {
        Self {
            output: output.into(),
            animation_mode: AnimationExportMode::Actions,
            force_sampling: false,
            apply_transforms: true,
        }
    }
}

/// Command surface of a render engine.
pub trait RenderEngine {
    /// Short engine name for logs.
    fn name(&self) -> &'static str;

    /// Opens a scene file, discarding any previously loaded scene.
    fn load_scene(&mut self, path: &Path) -> EngineResult<()>;

    /// Discards every change since the last `load_scene`.
    fn revert_scene(&mut self) -> EngineResult<()>;

    /// Objects, actions and materials of the loaded scene.
    fn scene_info(&mut self) -> EngineResult<SceneInfo>;

    /// Sets output resolution and background.
    fn set_render_target(&mut self, target: &RenderTarget) -> EngineResult<()>;

    /// Makes the camera orthographic and places it.
    fn set_camera(&mut self, camera: &CameraSetup) -> EngineResult<()>;

    /// Selects render shading.
    fn set_shading(&mut self, shading: &ShadingMode) -> EngineResult<()>;

    /// Sets (or with `None` clears) the active action of an object,
    /// creating animation data when needed.
    fn bind_action(&mut self, object: &str, action: Option<&str>) -> EngineResult<()>;

    /// Removes animation data from every object.
    fn clear_animation(&mut self) -> EngineResult<()>;

    /// Creates animation data on an object if it has none.
    fn ensure_animation_data(&mut self, object: &str) -> EngineResult<()>;

    /// Deletes an action from the scene.
    fn remove_action(&mut self, action: &str) -> EngineResult<()>;

    /// Removes all NLA tracks of an object.
    fn clear_nla_tracks(&mut self, object: &str) -> EngineResult<()>;

    /// Makes the object the only selected and active one; armatures enter
    /// pose mode with every bone selected.
    fn select_for_bake(&mut self, object: &str) -> EngineResult<()>;

    /// Bakes the object's evaluated motion into its active action.
    fn bake_to_keyframes(&mut self, object: &str, options: &KeyframeBakeOptions)
        -> EngineResult<()>;

    /// Adds an NLA track.
    fn create_nla_track(&mut self, object: &str, track: &str) -> EngineResult<()>;

    /// Places an action on a track.
    fn add_strip(
        &mut self,
        object: &str,
        track: &str,
        action: &str,
        start_frame: i32,
    ) -> EngineResult<()>;

    /// Snapshot of a material's node graph.
    fn material_graph(&mut self, material: &str) -> EngineResult<ShaderGraph>;

    /// Creates a material with the default node graph. Returns its actual name.
    fn create_material(&mut self, name: &str) -> EngineResult<String>;

    /// Copies a material under a new name. Returns the copy's actual name.
    fn duplicate_material(&mut self, material: &str, new_name: &str) -> EngineResult<String>;

    /// Applies edits to a material's node graph.
    fn apply_graph_edits(&mut self, material: &str, edits: &[GraphEdit]) -> EngineResult<()>;

    /// Puts a material into an object's slot; `slot == slot count` appends.
    fn assign_material(&mut self, object: &str, slot: usize, material: &str) -> EngineResult<()>;

    /// Deletes a material.
    fn remove_material(&mut self, material: &str) -> EngineResult<()>;

    /// Adds a plane carrying `material` for texture bakes. Returns the plane's name.
    fn add_bake_plane(&mut self, material: &str) -> EngineResult<String>;

    /// Bakes one channel of an object's material to an image file.
    fn bake_texture(&mut self, request: &BakeRequest) -> EngineResult<()>;

    /// Renders `frame` through the scene camera to `output`.
    fn render_active_frame(&mut self, frame: i32, output: &Path) -> EngineResult<()>;

    /// Exports the scene.
    fn export_scene(&mut self, options: &ExportOptions) -> EngineResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scene_info_lookup() {
        let info: SceneInfo = serde_json::from_str(
            r#"{
                "objects": [{"name": "rig", "kind": "ARMATURE"}, {"name": "Lamp", "kind": "LIGHT_PROBE"}],
                "actions": [{"name": "Walk", "frame_range": [1, 24]}],
                "materials": ["Skin"]
            }"#,
        )
        .unwrap();

        assert_eq!(info.object("rig").unwrap().kind, ObjectKind::Armature);
        assert_eq!(info.object("Lamp").unwrap().kind, ObjectKind::Other);
        assert_eq!(info.action("Walk").unwrap().frame_range, (1, 24));
        assert!(info.has_material("Skin"));
        assert!(info.object("missing").is_none());
    }

    #[test]
    fn test_keyframe_bake_defaults() {
        let opts = KeyframeBakeOptions::visual(1, 30, 2);
        assert!(opts.visual_keying);
        assert!(!opts.clear_constraints);
        assert!(!opts.clear_parents);
        assert!(opts.use_current_action);
    }

    #[test]
    fn test_export_defaults() {
        let opts = ExportOptions::glb_actions("out/model.glb");
        assert_eq!(opts.animation_mode, AnimationExportMode::Actions);
        assert!(!opts.force_sampling);
        assert!(opts.apply_transforms);
    }
}
