//! Animated sprite handler.
//!
//! Renders every sampled frame twice through an orthographic camera: once
//! with each material replaced by its isolated base colour, once with a
//! normal matcap. The frames of each pass are then laid out on a sprite
//! sheet.
//!
//! Output layout under the asset directory:
//!
//! ```text
//! diffuse/diffuse_0001.png ...
//! normal/normal_0001.png ...
//! spritesheet_diffuse.png
//! spritesheet_normal.png
//! ```

use std::path::{Path, PathBuf};

use autorender_backend_texture::{assemble_to_file, PngConfig, SheetLayout};
use autorender_spec::{AnimatedSpriteConfig, CAMERA_OBJECT_NAME};

use crate::engine::{CameraSetup, ObjectKind, RenderEngine, RenderTarget, SceneInfo, ShadingMode};
use crate::error::{PipelineError, ReferenceKind, Stage, StageError, StageExt};
use crate::isolate::{ChannelIsolator, DIFFUSE_INPUT};

pub const DIFFUSE_PASS: &str = "diffuse";
pub const NORMAL_PASS: &str = "normal";

/// File name of a single frame render.
pub fn frame_file_name(pass: &str, frame: i32) -> String {
    format!("{}_{:04}.png", pass, frame)
}

/// File name of a pass's sprite sheet.
pub fn sheet_file_name(pass: &str) -> String {
    format!("spritesheet_{}.png", pass)
}

/// Files written for one sprite.
#[derive(Debug, Clone, PartialEq)]
pub struct SpriteResult {
    /// Rendered frame numbers in order.
    pub frames: Vec<i32>,
    pub diffuse_frames: Vec<PathBuf>,
    pub normal_frames: Vec<PathBuf>,
    pub diffuse_sheet: PathBuf,
    pub normal_sheet: PathBuf,
    pub layout: SheetLayout,
}

impl SpriteResult {
    /// Every written file.
    pub fn outputs(&self) -> Vec<PathBuf> {
        self.diffuse_frames
            .iter()
            .chain(&self.normal_frames)
            .cloned()
            .chain([self.diffuse_sheet.clone(), self.normal_sheet.clone()])
            .collect()
    }
}

/// A material slot temporarily holding an isolated copy.
struct SlotSwap {
    object: String,
    slot: usize,
    original: String,
    derived: String,
}

/// Renders the sprite frames and sheets of `config` into `output_dir`.
pub fn generate(
    engine: &mut dyn RenderEngine,
    isolator: &mut ChannelIsolator,
    source_scene: &Path,
    config: &AnimatedSpriteConfig,
    output_dir: &Path,
    png: &PngConfig,
) -> Result<SpriteResult, StageError> {
    let range = config.frame_range();
    range.check().stage(Stage::Setup)?;

    engine.load_scene(source_scene).stage(Stage::Setup)?;
    let info = engine.scene_info().stage(Stage::Setup)?;
    check_references(&info, config).stage(Stage::Setup)?;

    let diffuse_dir = output_dir.join(DIFFUSE_PASS);
    let normal_dir = output_dir.join(NORMAL_PASS);
    let mut result = SpriteResult {
        frames: Vec::with_capacity(range.frame_count()),
        diffuse_frames: Vec::new(),
        normal_frames: Vec::new(),
        diffuse_sheet: output_dir.join(sheet_file_name(DIFFUSE_PASS)),
        normal_sheet: output_dir.join(sheet_file_name(NORMAL_PASS)),
        layout: SheetLayout::new(config.sheet_width, config.sprite_size, range.frame_count())
            .stage(Stage::Assemble)?,
    };

    for frame in range.frames() {
        log::debug!("rendering frame {}", frame);

        setup(engine, config).stage(Stage::Setup)?;
        let swaps = swap_in_base_colors(engine, isolator, config).stage(Stage::Extract)?;
        let diffuse = diffuse_dir.join(frame_file_name(DIFFUSE_PASS, frame));
        engine
            .set_shading(&ShadingMode::Emission)
            .stage(Stage::Render)?;
        engine
            .render_active_frame(frame, &diffuse)
            .stage(Stage::Render)?;
        restore(engine, &swaps).stage(Stage::Extract)?;

        setup(engine, config).stage(Stage::Setup)?;
        let normal = normal_dir.join(frame_file_name(NORMAL_PASS, frame));
        engine
            .set_shading(&ShadingMode::normal_matcap())
            .stage(Stage::Render)?;
        engine.render_active_frame(frame, &normal).stage(Stage::Render)?;

        result.frames.push(frame);
        result.diffuse_frames.push(diffuse);
        result.normal_frames.push(normal);
    }

    for (frames, sheet) in [
        (&result.diffuse_frames, &result.diffuse_sheet),
        (&result.normal_frames, &result.normal_sheet),
    ] {
        assemble_to_file(config.sheet_width, config.sprite_size, frames, sheet, png)
            .stage(Stage::Assemble)?;
    }

    log::info!(
        "assembled {} frames into {}x{} sheets",
        result.frames.len(),
        result.layout.dimensions().0,
        result.layout.dimensions().1
    );
    Ok(result)
}

/// Verifies the camera, every object and every action exist.
fn check_references(info: &SceneInfo, config: &AnimatedSpriteConfig) -> Result<(), PipelineError> {
    match info.object(CAMERA_OBJECT_NAME) {
        Some(camera) if camera.kind == ObjectKind::Camera => {}
        _ => return Err(PipelineError::missing(ReferenceKind::Camera, CAMERA_OBJECT_NAME)),
    }

    for object in &config.object_configs {
        if info.object(&object.object_name).is_none() {
            return Err(PipelineError::missing(ReferenceKind::Object, &object.object_name));
        }
        if let Some(action) = &object.action_name {
            if info.action(action).is_none() {
                return Err(PipelineError::missing(ReferenceKind::Action, action));
            }
        }
    }
    Ok(())
}

/// Reverts the scene and applies render target, camera and actions.
fn setup(engine: &mut dyn RenderEngine, config: &AnimatedSpriteConfig) -> Result<(), PipelineError> {
    engine.revert_scene()?;
    engine.set_render_target(&RenderTarget::transparent(config.sprite_size))?;

    let placement = config.camera.view.placement();
    engine.set_camera(&CameraSetup {
        object: CAMERA_OBJECT_NAME.to_string(),
        location: placement.location,
        rotation: placement.rotation,
        ortho_scale: config.camera.ortho_scale,
    })?;

    for object in &config.object_configs {
        if let Some(action) = &object.action_name {
            engine.bind_action(&object.object_name, Some(action))?;
        }
    }
    Ok(())
}

/// Gives every slot of every sprite object a material, then swaps each one
/// for its isolated base colour.
fn swap_in_base_colors(
    engine: &mut dyn RenderEngine,
    isolator: &mut ChannelIsolator,
    config: &AnimatedSpriteConfig,
) -> Result<Vec<SlotSwap>, PipelineError> {
    let info = engine.scene_info()?;
    let mut swaps = Vec::new();

    for object in &config.object_configs {
        let name = object.object_name.as_str();
        let slots = info
            .object(name)
            .map(|o| o.material_slots.clone())
            .ok_or_else(|| PipelineError::missing(ReferenceKind::Object, name))?;

        let mut materials = Vec::with_capacity(slots.len().max(1));
        if slots.is_empty() {
            let material = engine.create_material(&format!("{}_Material", name))?;
            engine.assign_material(name, 0, &material)?;
            materials.push(material);
        }
        for (slot, material) in slots.into_iter().enumerate() {
            let material = match material {
                Some(material) => material,
                None => {
                    let material = engine.create_material(&format!("{}_{}_Material", name, slot))?;
                    engine.assign_material(name, slot, &material)?;
                    material
                }
            };
            materials.push(material);
        }

        for (slot, original) in materials.into_iter().enumerate() {
            if let Some(derived) = isolator.isolate(engine, &original, DIFFUSE_INPUT)? {
                engine.assign_material(name, slot, &derived)?;
                swaps.push(SlotSwap {
                    object: name.to_string(),
                    slot,
                    original,
                    derived,
                });
            }
        }
    }

    Ok(swaps)
}

/// Puts the original materials back and deletes the isolated copies.
fn restore(engine: &mut dyn RenderEngine, swaps: &[SlotSwap]) -> Result<(), PipelineError> {
    for swap in swaps {
        engine.assign_material(&swap.object, swap.slot, &swap.original)?;
        engine.remove_material(&swap.derived)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::MemoryEngine;
    use autorender_backend_texture::png::read_rgba;
    use autorender_spec::{CameraConfig, CameraView, FrameRangeError, ObjectConfig};
    use pretty_assertions::assert_eq;

    const SCENE: &str = r#"{
        "objects": [
            {"name": "Camera", "kind": "CAMERA"},
            {"name": "knight", "kind": "MESH", "material_slots": ["Armor", null]},
            {"name": "crate", "kind": "MESH"}
        ],
        "actions": [{"name": "Walk", "frame_range": [1, 24]}],
        "materials": [{"name": "Armor"}]
    }"#;

    /// A glowing mesh listed ahead of a green knight.
    const DECOY_SCENE: &str = r#"{
        "objects": [
            {"name": "Camera", "kind": "CAMERA"},
            {"name": "lamp", "kind": "MESH", "material_slots": ["Glow"]},
            {"name": "knight", "kind": "MESH", "material_slots": ["Armor"]}
        ],
        "actions": [{"name": "Walk", "frame_range": [1, 24]}],
        "materials": [
            {"name": "Glow", "graph": {
                "nodes": [
                    {"name": "Emission", "kind": "EMISSION", "inputs": {"Color": [1.0, 0.0, 0.0, 1.0]}},
                    {"name": "Material Output", "kind": "OUTPUT_MATERIAL"}
                ],
                "links": [{"from_node": "Emission", "from_socket": "Emission",
                           "to_node": "Material Output", "to_socket": "Surface"}]
            }},
            {"name": "Armor", "graph": {
                "nodes": [
                    {"name": "Principled BSDF", "kind": "BSDF_PRINCIPLED",
                     "inputs": {"Base Color": [0.4, 0.6, 0.2, 1.0], "Roughness": 0.5, "Metallic": 0.0}},
                    {"name": "Material Output", "kind": "OUTPUT_MATERIAL"}
                ],
                "links": [{"from_node": "Principled BSDF", "from_socket": "BSDF",
                           "to_node": "Material Output", "to_socket": "Surface"}]
            }}
        ]
    }"#;

    fn run(
        config: &AnimatedSpriteConfig,
    ) -> (tempfile::TempDir, Result<SpriteResult, StageError>, MemoryEngine) {
        run_scene(SCENE, config)
    }

    fn run_scene(
        scene: &str,
        config: &AnimatedSpriteConfig,
    ) -> (tempfile::TempDir, Result<SpriteResult, StageError>, MemoryEngine) {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("knight.scene.json");
        std::fs::write(&source, scene).unwrap();
        let mut engine = MemoryEngine::new();
        let result = generate(
            &mut engine,
            &mut ChannelIsolator::new(),
            &source,
            config,
            &dir.path().join("out"),
            &PngConfig::default(),
        );
        (dir, result, engine)
    }

    #[test]
    fn test_frame_file_name() {
        assert_eq!(frame_file_name(DIFFUSE_PASS, 7), "diffuse_0007.png");
        assert_eq!(sheet_file_name(NORMAL_PASS), "spritesheet_normal.png");
    }

    #[test]
    fn test_renders_both_passes_and_sheets() {
        let config = AnimatedSpriteConfig::new(8, 2)
            .with_frames(1, 7, 2, true)
            .with_object(ObjectConfig::animated("knight", "Walk"));
        let (_dir, result, engine) = run(&config);
        let result = result.unwrap();

        assert_eq!(result.frames, vec![1, 3, 5, 7]);
        assert_eq!(result.outputs().len(), 10);
        assert!(result.diffuse_frames[3].ends_with("diffuse/diffuse_0007.png"));

        let sheet = read_rgba(&result.diffuse_sheet).unwrap();
        assert_eq!(sheet.dimensions(), (16, 16));
        let normal = read_rgba(&result.normal_sheet).unwrap();
        assert_eq!(normal.get_pixel(4, 4).0, [128, 128, 255, 255]);

        // Two setups per frame.
        assert_eq!(engine.calls_to("revert_scene").count(), 8);
        assert_eq!(engine.calls_to("render_active_frame").count(), 8);
    }

    #[test]
    fn test_empty_slots_get_default_materials() {
        let config = AnimatedSpriteConfig::new(8, 4)
            .with_frames(1, 2, 1, false)
            .with_object(ObjectConfig::still("knight"))
            .with_object(ObjectConfig::still("crate"));
        let (_dir, result, engine) = run(&config);
        result.unwrap();

        let created: Vec<_> = engine
            .calls_to("create_material")
            .map(|c| c.args[0].clone())
            .collect();
        assert_eq!(created, vec!["knight_1_Material", "crate_Material"]);
        assert_eq!(engine.calls_to("duplicate_material").count(), 3);
    }

    #[test]
    fn test_derived_materials_restored_after_render() {
        let config = AnimatedSpriteConfig::new(8, 4)
            .with_frames(1, 2, 1, false)
            .with_object(ObjectConfig::still("knight"));
        let (_dir, result, engine) = run(&config);
        result.unwrap();

        let doc = engine.scene().unwrap();
        assert!(doc.materials.iter().all(|m| !m.name.starts_with("___")));
    }

    #[test]
    fn test_diffuse_pass_shows_configured_object() {
        let config = AnimatedSpriteConfig::new(8, 1)
            .with_frames(1, 2, 1, false)
            .with_object(ObjectConfig::animated("knight", "Walk"));
        let (_dir, result, _engine) = run_scene(DECOY_SCENE, &config);
        let result = result.unwrap();

        let frame = read_rgba(&result.diffuse_frames[0]).unwrap();
        assert_eq!(frame.get_pixel(4, 4).0, [102, 153, 51, 255]);
    }

    #[test]
    fn test_side_camera_placement() {
        let config = AnimatedSpriteConfig::new(8, 4)
            .with_frames(1, 2, 1, false)
            .with_camera(CameraConfig::new(CameraView::Side, 3.5))
            .with_object(ObjectConfig::still("knight"));
        let (_dir, result, engine) = run(&config);
        result.unwrap();

        let camera = engine.calls_to("set_camera").next().unwrap();
        assert_eq!(camera.args[0], "Camera");
        assert_eq!(camera.args[1], "-10,0,0");
        let rotation: Vec<f64> = camera.args[2]
            .split(',')
            .map(|v| v.parse().unwrap())
            .collect();
        assert_eq!(rotation[0], 0.0);
        assert!((rotation[1] - std::f64::consts::FRAC_PI_2).abs() < 1e-9);
        assert_eq!(rotation[2], 0.0);
        assert_eq!(camera.args[3], "3.5");
    }

    #[test]
    fn test_indivisible_range_rejected_before_rendering() {
        let config = AnimatedSpriteConfig::new(8, 4)
            .with_frames(1, 24, 5, false)
            .with_object(ObjectConfig::still("knight"));
        let (_dir, result, engine) = run(&config);

        let err = result.unwrap_err();
        assert_eq!(err.stage, Stage::Setup);
        assert!(matches!(
            err.source,
            PipelineError::FrameRange(FrameRangeError::StepMismatch { .. })
        ));
        assert!(engine.calls().is_empty());
    }

    #[test]
    fn test_oversized_sheet_rejected_before_rendering() {
        let config = AnimatedSpriteConfig::new(8192, 1_000_000)
            .with_frames(1, 24, 1, false)
            .with_object(ObjectConfig::still("knight"));
        let (_dir, result, engine) = run(&config);

        let err = result.unwrap_err();
        assert_eq!(err.stage, Stage::Assemble);
        assert_eq!(engine.calls_to("render_active_frame").count(), 0);
    }

    #[test]
    fn test_missing_action_is_fatal_before_any_frame() {
        let config = AnimatedSpriteConfig::new(8, 4)
            .with_object(ObjectConfig::animated("knight", "Run"));
        let (_dir, result, engine) = run(&config);

        let err = result.unwrap_err();
        assert!(matches!(
            err.source,
            PipelineError::Reference {
                kind: ReferenceKind::Action,
                ..
            }
        ));
        assert_eq!(engine.calls_to("render_active_frame").count(), 0);
    }
}
