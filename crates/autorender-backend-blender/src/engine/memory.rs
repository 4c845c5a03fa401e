//! In-process engine over JSON scene documents.
//!
//! A scene document lists objects, actions and materials (with their node
//! graphs). The engine applies every command to an in-memory copy of the
//! document, renders and bakes flat colours derived from the material
//! graphs, writes a minimal GLB on export, and journals every call.
//!
//! ```json
//! {
//!   "objects": [
//!     {"name": "Camera", "kind": "CAMERA"},
//!     {"name": "knight", "kind": "MESH", "material_slots": ["Armor", null]}
//!   ],
//!   "actions": [{"name": "Walk", "frame_range": [1, 24]}],
//!   "materials": [{"name": "Armor"}]
//! }
//! ```

use std::path::{Path, PathBuf};

use autorender_backend_texture::png::{write_rgba, PngConfig};
use image::{Rgba, RgbaImage};
use serde::{Deserialize, Serialize};

use super::{
    ActionInfo, BakeChannel, BakeRequest, CameraSetup, ExportOptions, KeyframeBakeOptions,
    NlaStrip, NlaTrack, ObjectInfo, ObjectKind, RenderEngine, RenderTarget, SceneInfo,
    ShadingMode,
};
use crate::error::{EngineError, EngineResult};
use crate::shader_graph::{GraphEdit, ShaderGraph};

/// Suffix of scene documents.
pub const SCENE_DOCUMENT_SUFFIX: &str = "scene.json";

const GLB_MAGIC: &[u8; 4] = b"glTF";
const GLB_VERSION: u32 = 2;
const GLB_CHUNK_JSON: u32 = 0x4E4F_534A;

/// Scene document root.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SceneDocument {
    #[serde(default)]
    pub objects: Vec<ObjectDocument>,
    #[serde(default)]
    pub actions: Vec<ActionDocument>,
    #[serde(default)]
    pub materials: Vec<MaterialDocument>,
}

/// Object in a scene document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectDocument {
    pub name: String,
    pub kind: ObjectKind,
    #[serde(default)]
    pub material_slots: Vec<Option<String>>,
    #[serde(default)]
    pub animation: Option<AnimationDocument>,
}

/// Animation data of an object.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnimationDocument {
    #[serde(default)]
    pub active_action: Option<String>,
    #[serde(default)]
    pub nla_tracks: Vec<NlaTrack>,
}

/// Action in a scene document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionDocument {
    pub name: String,
    pub frame_range: (i32, i32),
    /// Set once the action holds baked keyframes.
    #[serde(default)]
    pub baked: bool,
}

/// Material in a scene document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialDocument {
    pub name: String,
    #[serde(default = "ShaderGraph::principled_default")]
    pub graph: ShaderGraph,
}

impl SceneDocument {
    /// Parses a scene document.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    fn object(&self, name: &str) -> EngineResult<&ObjectDocument> {
        self.objects
            .iter()
            .find(|o| o.name == name)
            .ok_or_else(|| EngineError::UnknownObject(name.to_string()))
    }

    fn object_mut(&mut self, name: &str) -> EngineResult<&mut ObjectDocument> {
        self.objects
            .iter_mut()
            .find(|o| o.name == name)
            .ok_or_else(|| EngineError::UnknownObject(name.to_string()))
    }

    fn action_mut(&mut self, name: &str) -> EngineResult<&mut ActionDocument> {
        self.actions
            .iter_mut()
            .find(|a| a.name == name)
            .ok_or_else(|| EngineError::UnknownAction(name.to_string()))
    }

    fn has_action(&self, name: &str) -> bool {
        self.actions.iter().any(|a| a.name == name)
    }

    fn material(&self, name: &str) -> EngineResult<&MaterialDocument> {
        self.materials
            .iter()
            .find(|m| m.name == name)
            .ok_or_else(|| EngineError::UnknownMaterial(name.to_string()))
    }

    fn material_mut(&mut self, name: &str) -> EngineResult<&mut MaterialDocument> {
        self.materials
            .iter_mut()
            .find(|m| m.name == name)
            .ok_or_else(|| EngineError::UnknownMaterial(name.to_string()))
    }

    /// `base`, or `base.001`, `base.002`, ... whichever is free first.
    fn unique_name(&self, base: &str, taken: impl Fn(&str) -> bool) -> String {
        if !taken(base) {
            return base.to_string();
        }
        (1..)
            .map(|i| format!("{}.{:03}", base, i))
            .find(|name| !taken(name))
            .unwrap_or_else(|| base.to_string())
    }

    fn unique_material_name(&self, base: &str) -> String {
        self.unique_name(base, |n| self.materials.iter().any(|m| m.name == n))
    }

    fn unique_object_name(&self, base: &str) -> String {
        self.unique_name(base, |n| self.objects.iter().any(|o| o.name == n))
    }

    fn info(&self) -> SceneInfo {
        SceneInfo {
            objects: self
                .objects
                .iter()
                .map(|o| ObjectInfo {
                    name: o.name.clone(),
                    kind: o.kind,
                    material_slots: o.material_slots.clone(),
                    has_animation_data: o.animation.is_some(),
                    active_action: o.animation.as_ref().and_then(|a| a.active_action.clone()),
                    nla_tracks: o
                        .animation
                        .as_ref()
                        .map(|a| a.nla_tracks.clone())
                        .unwrap_or_default(),
                })
                .collect(),
            actions: self
                .actions
                .iter()
                .map(|a| ActionInfo {
                    name: a.name.clone(),
                    frame_range: a.frame_range,
                })
                .collect(),
            materials: self.materials.iter().map(|m| m.name.clone()).collect(),
        }
    }
}

/// One recorded engine call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineCall {
    pub method: &'static str,
    pub args: Vec<String>,
}

impl std::fmt::Display for EngineCall {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}({})", self.method, self.args.join(", "))
    }
}

#[derive(Debug, Clone, Default)]
struct RenderState {
    target: Option<RenderTarget>,
    camera: Option<CameraSetup>,
    shading: Option<ShadingMode>,
    /// Last object given a material since the scene was loaded or reverted.
    assigned: Option<String>,
}

/// In-process [`RenderEngine`] over a [`SceneDocument`].
#[derive(Debug, Default)]
pub struct MemoryEngine {
    pristine: Option<SceneDocument>,
    scene: Option<SceneDocument>,
    render: RenderState,
    selected: Option<String>,
    journal: Vec<EngineCall>,
    png: PngConfig,
}

impl MemoryEngine {
    /// Creates an engine with no scene loaded.
    pub fn new() -> Self {
        Self::default()
    }

    /// Every call made so far, in order.
    pub fn calls(&self) -> &[EngineCall] {
        &self.journal
    }

    /// Calls to one method, in order.
    pub fn calls_to<'a>(&'a self, method: &'a str) -> impl Iterator<Item = &'a EngineCall> + 'a {
        self.journal.iter().filter(move |c| c.method == method)
    }

    /// Current state of the loaded scene.
    pub fn scene(&self) -> Option<&SceneDocument> {
        self.scene.as_ref()
    }

    /// Document path used for a scene path: `x.scene.json` as is, otherwise
    /// the sibling `x.scene.json` of `x.blend`.
    pub fn document_path(path: &Path) -> PathBuf {
        let is_document = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.ends_with(SCENE_DOCUMENT_SUFFIX));
        if is_document {
            path.to_path_buf()
        } else {
            path.with_extension(SCENE_DOCUMENT_SUFFIX)
        }
    }

    fn record(&mut self, method: &'static str, args: &[&dyn std::fmt::Display]) {
        let call = EngineCall {
            method,
            args: args.iter().map(|a| a.to_string()).collect(),
        };
        log::debug!("memory engine: {}", call);
        self.journal.push(call);
    }

    fn scene_mut(&mut self) -> EngineResult<&mut SceneDocument> {
        self.scene.as_mut().ok_or(EngineError::NoScene)
    }

    fn scene_ref(&self) -> EngineResult<&SceneDocument> {
        self.scene.as_ref().ok_or(EngineError::NoScene)
    }

    fn animation_mut<'a>(
        scene: &'a mut SceneDocument,
        object: &str,
    ) -> EngineResult<&'a mut AnimationDocument> {
        scene.object_mut(object)?.animation.as_mut().ok_or_else(|| {
            EngineError::InvalidState(format!("object '{}' has no animation data", object))
        })
    }

    fn slot_graph(&self, object: &str) -> EngineResult<Option<&ShaderGraph>> {
        let scene = self.scene_ref()?;
        let obj = scene.object(object)?;
        match obj.material_slots.iter().flatten().next() {
            Some(material) => Ok(Some(&scene.material(material)?.graph)),
            None => Ok(None),
        }
    }

    /// Object whose surface fills the frame: the object last given a
    /// material, else the first mesh with an active action, else the first
    /// mesh with material slots.
    fn render_subject<'a>(
        scene: &'a SceneDocument,
        assigned: Option<&str>,
    ) -> Option<&'a ObjectDocument> {
        let meshes = || {
            scene
                .objects
                .iter()
                .filter(|o| o.kind == ObjectKind::Mesh && !o.material_slots.is_empty())
        };
        assigned
            .and_then(|name| meshes().find(|o| o.name == name))
            .or_else(|| {
                meshes().find(|o| {
                    o.animation
                        .as_ref()
                        .is_some_and(|a| a.active_action.is_some())
                })
            })
            .or_else(|| meshes().next())
    }

    fn surface_color(graph: &ShaderGraph) -> [f64; 4] {
        graph
            .emitted_color()
            .or_else(|| graph.principled_input("Base Color").map(|v| v.to_color()))
            .unwrap_or([0.0, 0.0, 0.0, 1.0])
    }

    fn write_flat(&self, size: u32, color: [f64; 4], output: &Path) -> EngineResult<()> {
        let image = RgbaImage::from_pixel(size, size, Rgba(to_rgba8(color)));
        write_rgba(&image, output, &self.png)?;
        Ok(())
    }
}

fn to_rgba8(color: [f64; 4]) -> [u8; 4] {
    color.map(|c| (c.clamp(0.0, 1.0) * 255.0).round() as u8)
}

fn write_glb(path: &Path, json: &serde_json::Value) -> EngineResult<()> {
    let mut chunk = serde_json::to_vec(json).map_err(std::io::Error::from)?;
    while chunk.len() % 4 != 0 {
        chunk.push(b' ');
    }

    let total = 12 + 8 + chunk.len();
    let mut out = Vec::with_capacity(total);
    out.extend_from_slice(GLB_MAGIC);
    out.extend_from_slice(&GLB_VERSION.to_le_bytes());
    out.extend_from_slice(&(total as u32).to_le_bytes());
    out.extend_from_slice(&(chunk.len() as u32).to_le_bytes());
    out.extend_from_slice(&GLB_CHUNK_JSON.to_le_bytes());
    out.extend_from_slice(&chunk);

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, out)?;
    Ok(())
}

/// `[x, y, z]` as `x,y,z` for the journal.
fn join_components(values: &[f64; 3]) -> String {
    values
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join(",")
}

impl RenderEngine for MemoryEngine {
    fn name(&self) -> &'static str {
        "memory"
    }

    fn load_scene(&mut self, path: &Path) -> EngineResult<()> {
        self.record("load_scene", &[&path.display()]);
        let doc_path = Self::document_path(path);
        let json = std::fs::read_to_string(&doc_path)?;
        let doc = SceneDocument::from_json(&json).map_err(|source| EngineError::SceneDocument {
            path: doc_path,
            source,
        })?;
        self.pristine = Some(doc.clone());
        self.scene = Some(doc);
        self.render = RenderState::default();
        self.selected = None;
        Ok(())
    }

    fn revert_scene(&mut self) -> EngineResult<()> {
        self.record("revert_scene", &[]);
        let pristine = self.pristine.clone().ok_or(EngineError::NoScene)?;
        self.scene = Some(pristine);
        self.render = RenderState::default();
        self.selected = None;
        Ok(())
    }

    fn scene_info(&mut self) -> EngineResult<SceneInfo> {
        self.record("scene_info", &[]);
        Ok(self.scene_ref()?.info())
    }

    fn set_render_target(&mut self, target: &RenderTarget) -> EngineResult<()> {
        self.record("set_render_target", &[&target.resolution]);
        self.scene_ref()?;
        self.render.target = Some(*target);
        Ok(())
    }

    fn set_camera(&mut self, camera: &CameraSetup) -> EngineResult<()> {
        let location = join_components(&camera.location);
        let rotation = join_components(&camera.rotation);
        self.record(
            "set_camera",
            &[&camera.object, &location, &rotation, &camera.ortho_scale],
        );
        let obj = self.scene_ref()?.object(&camera.object)?;
        if obj.kind != ObjectKind::Camera {
            return Err(EngineError::InvalidState(format!(
                "object '{}' is not a camera",
                camera.object
            )));
        }
        self.render.camera = Some(camera.clone());
        Ok(())
    }

    fn set_shading(&mut self, shading: &ShadingMode) -> EngineResult<()> {
        let label = match shading {
            ShadingMode::Emission => "emission".to_string(),
            ShadingMode::Matcap { studio_light, .. } => format!("matcap:{}", studio_light),
        };
        self.record("set_shading", &[&label]);
        self.scene_ref()?;
        self.render.shading = Some(shading.clone());
        Ok(())
    }

    fn bind_action(&mut self, object: &str, action: Option<&str>) -> EngineResult<()> {
        self.record("bind_action", &[&object, &action.unwrap_or("-")]);
        let scene = self.scene_mut()?;
        if let Some(action) = action {
            if !scene.has_action(action) {
                return Err(EngineError::UnknownAction(action.to_string()));
            }
        }
        let obj = scene.object_mut(object)?;
        match action {
            Some(action) => {
                obj.animation.get_or_insert_with(Default::default).active_action =
                    Some(action.to_string());
            }
            None => {
                if let Some(anim) = obj.animation.as_mut() {
                    anim.active_action = None;
                }
            }
        }
        Ok(())
    }

    fn clear_animation(&mut self) -> EngineResult<()> {
        self.record("clear_animation", &[]);
        for obj in &mut self.scene_mut()?.objects {
            obj.animation = None;
        }
        Ok(())
    }

    fn ensure_animation_data(&mut self, object: &str) -> EngineResult<()> {
        self.record("ensure_animation_data", &[&object]);
        self.scene_mut()?
            .object_mut(object)?
            .animation
            .get_or_insert_with(Default::default);
        Ok(())
    }

    fn remove_action(&mut self, action: &str) -> EngineResult<()> {
        self.record("remove_action", &[&action]);
        let scene = self.scene_mut()?;
        if !scene.has_action(action) {
            return Err(EngineError::UnknownAction(action.to_string()));
        }
        scene.actions.retain(|a| a.name != action);
        for anim in scene.objects.iter_mut().filter_map(|o| o.animation.as_mut()) {
            if anim.active_action.as_deref() == Some(action) {
                anim.active_action = None;
            }
            for track in &mut anim.nla_tracks {
                track.strips.retain(|s| s.action != action);
            }
        }
        Ok(())
    }

    fn clear_nla_tracks(&mut self, object: &str) -> EngineResult<()> {
        self.record("clear_nla_tracks", &[&object]);
        if let Some(anim) = self.scene_mut()?.object_mut(object)?.animation.as_mut() {
            anim.nla_tracks.clear();
        }
        Ok(())
    }

    fn select_for_bake(&mut self, object: &str) -> EngineResult<()> {
        self.record("select_for_bake", &[&object]);
        self.scene_ref()?.object(object)?;
        self.selected = Some(object.to_string());
        Ok(())
    }

    fn bake_to_keyframes(
        &mut self,
        object: &str,
        options: &KeyframeBakeOptions,
    ) -> EngineResult<()> {
        self.record(
            "bake_to_keyframes",
            &[&object, &options.frame_start, &options.frame_end, &options.step],
        );
        if self.selected.as_deref() != Some(object) {
            return Err(EngineError::InvalidState(format!(
                "object '{}' must be selected before baking",
                object
            )));
        }
        if options.step == 0 || options.frame_end < options.frame_start {
            return Err(EngineError::InvalidState(format!(
                "cannot bake frames {}..={} with step {}",
                options.frame_start, options.frame_end, options.step
            )));
        }

        let scene = self.scene_mut()?;
        let action = Self::animation_mut(scene, object)?
            .active_action
            .clone()
            .ok_or_else(|| {
                EngineError::InvalidState(format!("object '{}' has no active action", object))
            })?;
        scene.action_mut(&action)?.baked = true;
        Ok(())
    }

    fn create_nla_track(&mut self, object: &str, track: &str) -> EngineResult<()> {
        self.record("create_nla_track", &[&object, &track]);
        let scene = self.scene_mut()?;
        Self::animation_mut(scene, object)?.nla_tracks.push(NlaTrack {
            name: track.to_string(),
            strips: Vec::new(),
        });
        Ok(())
    }

    fn add_strip(
        &mut self,
        object: &str,
        track: &str,
        action: &str,
        start_frame: i32,
    ) -> EngineResult<()> {
        self.record("add_strip", &[&object, &track, &action, &start_frame]);
        let scene = self.scene_mut()?;
        if !scene.has_action(action) {
            return Err(EngineError::UnknownAction(action.to_string()));
        }
        let anim = Self::animation_mut(scene, object)?;
        let track = anim
            .nla_tracks
            .iter_mut()
            .find(|t| t.name == track)
            .ok_or_else(|| EngineError::InvalidState(format!("no NLA track '{}'", track)))?;
        track.strips.push(NlaStrip {
            action: action.to_string(),
            start_frame,
        });
        Ok(())
    }

    fn material_graph(&mut self, material: &str) -> EngineResult<ShaderGraph> {
        self.record("material_graph", &[&material]);
        Ok(self.scene_ref()?.material(material)?.graph.clone())
    }

    fn create_material(&mut self, name: &str) -> EngineResult<String> {
        self.record("create_material", &[&name]);
        let scene = self.scene_mut()?;
        let name = scene.unique_material_name(name);
        scene.materials.push(MaterialDocument {
            name: name.clone(),
            graph: ShaderGraph::principled_default(),
        });
        Ok(name)
    }

    fn duplicate_material(&mut self, material: &str, new_name: &str) -> EngineResult<String> {
        self.record("duplicate_material", &[&material, &new_name]);
        let scene = self.scene_mut()?;
        let graph = scene.material(material)?.graph.clone();
        let name = scene.unique_material_name(new_name);
        scene.materials.push(MaterialDocument {
            name: name.clone(),
            graph,
        });
        Ok(name)
    }

    fn apply_graph_edits(&mut self, material: &str, edits: &[GraphEdit]) -> EngineResult<()> {
        self.record("apply_graph_edits", &[&material, &edits.len()]);
        let material = self.scene_mut()?.material_mut(material)?;
        let mut graph = material.graph.clone();
        graph.apply(edits)?;
        material.graph = graph;
        Ok(())
    }

    fn assign_material(&mut self, object: &str, slot: usize, material: &str) -> EngineResult<()> {
        self.record("assign_material", &[&object, &slot, &material]);
        let scene = self.scene_mut()?;
        scene.material(material)?;
        let obj = scene.object_mut(object)?;
        match slot.cmp(&obj.material_slots.len()) {
            std::cmp::Ordering::Less => obj.material_slots[slot] = Some(material.to_string()),
            std::cmp::Ordering::Equal => obj.material_slots.push(Some(material.to_string())),
            std::cmp::Ordering::Greater => {
                return Err(EngineError::InvalidState(format!(
                    "object '{}' has {} material slots, cannot assign slot {}",
                    object,
                    obj.material_slots.len(),
                    slot
                )))
            }
        }
        self.render.assigned = Some(object.to_string());
        Ok(())
    }

    fn remove_material(&mut self, material: &str) -> EngineResult<()> {
        self.record("remove_material", &[&material]);
        let scene = self.scene_mut()?;
        scene.material(material)?;
        scene.materials.retain(|m| m.name != material);
        for slot in scene.objects.iter_mut().flat_map(|o| o.material_slots.iter_mut()) {
            if slot.as_deref() == Some(material) {
                *slot = None;
            }
        }
        Ok(())
    }

    fn add_bake_plane(&mut self, material: &str) -> EngineResult<String> {
        self.record("add_bake_plane", &[&material]);
        let scene = self.scene_mut()?;
        scene.material(material)?;
        let name = scene.unique_object_name("Plane");
        scene.objects.push(ObjectDocument {
            name: name.clone(),
            kind: ObjectKind::Mesh,
            material_slots: vec![Some(material.to_string())],
            animation: None,
        });
        Ok(name)
    }

    fn bake_texture(&mut self, request: &BakeRequest) -> EngineResult<()> {
        let channel = format!("{:?}", request.channel);
        let color_space = format!("{:?}", request.color_space);
        self.record(
            "bake_texture",
            &[
                &request.object,
                &channel,
                &color_space,
                &request.output.display(),
            ],
        );
        let graph = self.slot_graph(&request.object)?.ok_or_else(|| {
            EngineError::InvalidState(format!("object '{}' has no material", request.object))
        })?;

        let color = match request.channel {
            BakeChannel::Emit => graph.emitted_color().unwrap_or([0.0, 0.0, 0.0, 1.0]),
            BakeChannel::Diffuse => graph
                .principled_input("Base Color")
                .map(|v| v.to_color())
                .unwrap_or([0.0, 0.0, 0.0, 1.0]),
            BakeChannel::Roughness => graph
                .principled_input("Roughness")
                .map(|v| v.to_color())
                .unwrap_or([0.0, 0.0, 0.0, 1.0]),
            BakeChannel::Normal => [0.5, 0.5, 1.0, 1.0],
        };
        self.write_flat(request.size, color, &request.output)
    }

    fn render_active_frame(&mut self, frame: i32, output: &Path) -> EngineResult<()> {
        self.record("render_active_frame", &[&frame, &output.display()]);
        let target = self.render.target.ok_or_else(|| {
            EngineError::InvalidState("render target is not set".to_string())
        })?;
        if self.render.camera.is_none() {
            return Err(EngineError::InvalidState("camera is not set".to_string()));
        }

        let scene = self.scene_ref()?;
        let subject = Self::render_subject(scene, self.render.assigned.as_deref());

        let color = match (&self.render.shading, subject) {
            (Some(ShadingMode::Matcap { .. }), _) => [0.5, 0.5, 1.0, 1.0],
            (_, Some(obj)) => match self.slot_graph(&obj.name)? {
                Some(graph) => Self::surface_color(graph),
                None => [0.0, 0.0, 0.0, 1.0],
            },
            (_, None) => [0.0, 0.0, 0.0, 1.0],
        };

        // The subject covers the middle half of the frame.
        let size = target.resolution;
        let (lo, hi) = (size / 4, size - size / 4);
        let background = if target.transparent_background {
            [0, 0, 0, 0]
        } else {
            [0, 0, 0, 255]
        };
        let fill = to_rgba8(color);
        let image = RgbaImage::from_fn(size, size, |x, y| {
            if (lo..hi).contains(&x) && (lo..hi).contains(&y) {
                Rgba(fill)
            } else {
                Rgba(background)
            }
        });
        write_rgba(&image, output, &self.png)?;
        Ok(())
    }

    fn export_scene(&mut self, options: &ExportOptions) -> EngineResult<()> {
        self.record("export_scene", &[&options.output.display()]);
        let scene = self.scene_ref()?;

        let nodes: Vec<_> = scene
            .objects
            .iter()
            .map(|o| serde_json::json!({ "name": o.name }))
            .collect();
        let animations: Vec<_> = scene
            .objects
            .iter()
            .filter_map(|o| o.animation.as_ref())
            .flat_map(|a| a.nla_tracks.iter())
            .flat_map(|t| t.strips.iter())
            .map(|s| serde_json::json!({ "name": s.action, "channels": [], "samplers": [] }))
            .collect();

        let roots: Vec<usize> = (0..nodes.len()).collect();
        let doc = serde_json::json!({
            "asset": { "version": "2.0", "generator": "autorender memory engine" },
            "scene": 0,
            "scenes": [{ "nodes": roots }],
            "nodes": nodes,
            "animations": animations,
        });
        write_glb(&options.output, &doc)
    }
}
