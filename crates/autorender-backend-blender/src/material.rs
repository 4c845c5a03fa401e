//! Material texture set handler.
//!
//! Bakes one material onto a plane: diffuse, roughness and metallic through
//! channel isolation and emission bakes, normals directly, then packs
//! roughness and metallic into an ORM texture.

use std::path::{Path, PathBuf};

use autorender_backend_texture::{pack_to_file, ChannelSlot, PackedImageSpec, PngConfig};
use autorender_spec::MaterialConfig;

use crate::engine::{BakeChannel, BakeColorSpace, BakeRequest, RenderEngine};
use crate::error::{PipelineError, ReferenceKind, Stage, StageError, StageExt};
use crate::isolate::{ChannelIsolator, DIFFUSE_INPUT, METALLIC_INPUT, ROUGHNESS_INPUT};

pub const DIFFUSE_FILE: &str = "diffuse.png";
pub const NORMAL_FILE: &str = "normal.png";
pub const ROUGHNESS_FILE: &str = "roughness.png";
pub const METALLIC_FILE: &str = "metallic.png";
pub const ORM_FILE: &str = "orm.png";

/// Files written for one material.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaterialResult {
    pub diffuse: PathBuf,
    pub normal: PathBuf,
    pub roughness: PathBuf,
    /// Absent when the metallic channel could not be isolated.
    pub metallic: Option<PathBuf>,
    pub orm: PathBuf,
}

impl MaterialResult {
    /// Every written file.
    pub fn outputs(&self) -> Vec<PathBuf> {
        let mut out = vec![self.diffuse.clone(), self.normal.clone(), self.roughness.clone()];
        out.extend(self.metallic.clone());
        out.push(self.orm.clone());
        out
    }
}

/// Bakes the texture set of `config.material_name` into `output_dir`.
pub fn generate(
    engine: &mut dyn RenderEngine,
    isolator: &mut ChannelIsolator,
    source_scene: &Path,
    config: &MaterialConfig,
    output_dir: &Path,
    png: &PngConfig,
) -> Result<MaterialResult, StageError> {
    let material = config.material_name.as_str();

    engine.load_scene(source_scene).stage(Stage::Setup)?;
    let info = engine.scene_info().stage(Stage::Setup)?;
    if !info.has_material(material) {
        return Err(PipelineError::missing(ReferenceKind::Material, material)).stage(Stage::Setup);
    }
    let plane = engine.add_bake_plane(material).stage(Stage::Setup)?;
    let target = BakeTarget {
        plane: &plane,
        material,
        size: config.texture_size,
    };

    let diffuse = output_dir.join(DIFFUSE_FILE);
    if !target.bake_isolated(engine, isolator, DIFFUSE_INPUT, BakeColorSpace::Color, &diffuse)? {
        target.bake(engine, BakeChannel::Diffuse, &diffuse)?;
    }

    let roughness = output_dir.join(ROUGHNESS_FILE);
    if !target.bake_isolated(engine, isolator, ROUGHNESS_INPUT, BakeColorSpace::Data, &roughness)? {
        target.bake(engine, BakeChannel::Roughness, &roughness)?;
    }

    let metallic_path = output_dir.join(METALLIC_FILE);
    let metallic = if target.bake_isolated(
        engine,
        isolator,
        METALLIC_INPUT,
        BakeColorSpace::Data,
        &metallic_path,
    )? {
        Some(metallic_path)
    } else {
        log::warn!("skipping metallic texture of material '{}'", material);
        None
    };

    let normal = output_dir.join(NORMAL_FILE);
    target.bake(engine, BakeChannel::Normal, &normal)?;

    // ORM: occlusion absent, roughness in G, metallic in B.
    let spec = PackedImageSpec::new(output_dir, ORM_FILE, config.texture_size, config.texture_size)
        .with_green(&roughness)
        .with_slot(ChannelSlot::Blue, metallic.clone());
    let orm = pack_to_file(&spec, png).stage(Stage::Pack)?;

    Ok(MaterialResult {
        diffuse,
        normal,
        roughness,
        metallic,
        orm,
    })
}

/// The bake plane of one material.
struct BakeTarget<'a> {
    plane: &'a str,
    material: &'a str,
    size: u32,
}

impl BakeTarget<'_> {
    fn bake(
        &self,
        engine: &mut dyn RenderEngine,
        channel: BakeChannel,
        output: &Path,
    ) -> Result<(), StageError> {
        self.bake_as(engine, channel, channel.default_color_space(), output)
    }

    fn bake_as(
        &self,
        engine: &mut dyn RenderEngine,
        channel: BakeChannel,
        color_space: BakeColorSpace,
        output: &Path,
    ) -> Result<(), StageError> {
        let request =
            BakeRequest::new(self.plane, channel, self.size, output).with_color_space(color_space);
        engine.bake_texture(&request).stage(Stage::Bake)
    }

    /// Isolates `input`, bakes its emission, then puts the original material
    /// back. Returns false when the input cannot be isolated.
    ///
    /// Scalar inputs must be baked as [`BakeColorSpace::Data`] so the stored
    /// bytes are the input values themselves.
    fn bake_isolated(
        &self,
        engine: &mut dyn RenderEngine,
        isolator: &mut ChannelIsolator,
        input: &str,
        color_space: BakeColorSpace,
        output: &Path,
    ) -> Result<bool, StageError> {
        let Some(derived) = isolator
            .isolate(engine, self.material, input)
            .stage(Stage::Extract)?
        else {
            return Ok(false);
        };

        engine
            .assign_material(self.plane, 0, &derived)
            .stage(Stage::Extract)?;
        self.bake_as(engine, BakeChannel::Emit, color_space, output)?;
        engine
            .assign_material(self.plane, 0, self.material)
            .stage(Stage::Extract)?;
        engine.remove_material(&derived).stage(Stage::Extract)?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::MemoryEngine;
    use autorender_backend_texture::png::read_rgba;

    const SCENE: &str = r#"{
        "objects": [],
        "materials": [
            {"name": "Rock", "graph": {
                "nodes": [
                    {"name": "Principled BSDF", "kind": "BSDF_PRINCIPLED",
                     "inputs": {"Base Color": [0.4, 0.6, 0.2, 1.0], "Roughness": 0.8, "Metallic": 0.0}},
                    {"name": "Material Output", "kind": "OUTPUT_MATERIAL"}
                ],
                "links": [{"from_node": "Principled BSDF", "from_socket": "BSDF", "to_node": "Material Output", "to_socket": "Surface"}]
            }},
            {"name": "Glow", "graph": {
                "nodes": [
                    {"name": "Emission", "kind": "EMISSION", "inputs": {"Color": [1.0, 0.0, 0.0, 1.0]}},
                    {"name": "Material Output", "kind": "OUTPUT_MATERIAL"}
                ],
                "links": [{"from_node": "Emission", "from_socket": "Emission", "to_node": "Material Output", "to_socket": "Surface"}]
            }}
        ]
    }"#;

    fn run(
        material: &str,
    ) -> (tempfile::TempDir, Result<MaterialResult, StageError>, MemoryEngine) {
        let dir = tempfile::tempdir().unwrap();
        let scene = dir.path().join("rock.scene.json");
        std::fs::write(&scene, SCENE).unwrap();

        let mut engine = MemoryEngine::new();
        let result = generate(
            &mut engine,
            &mut ChannelIsolator::new(),
            &scene,
            &MaterialConfig::new(material, 16),
            &dir.path().join("out"),
            &PngConfig::default(),
        );
        (dir, result, engine)
    }

    #[test]
    fn test_full_texture_set() {
        let (_dir, result, engine) = run("Rock");
        let result = result.unwrap();
        assert_eq!(result.outputs().len(), 5);

        let diffuse = read_rgba(&result.diffuse).unwrap();
        assert_eq!(diffuse.get_pixel(0, 0).0, [102, 153, 51, 255]);

        let orm = read_rgba(&result.orm).unwrap();
        assert_eq!(orm.get_pixel(5, 5).0, [0, 204, 0, 255]);

        // Derived materials are gone again.
        let materials: Vec<_> = engine
            .scene()
            .unwrap()
            .materials
            .iter()
            .map(|m| m.name.as_str())
            .collect();
        assert_eq!(materials, vec!["Rock", "Glow"]);
    }

    #[test]
    fn test_non_principled_material_falls_back() {
        let (_dir, result, engine) = run("Glow");
        let result = result.unwrap();
        assert!(result.metallic.is_none());
        assert_eq!(result.outputs().len(), 4);

        let bakes: Vec<_> = engine
            .calls_to("bake_texture")
            .map(|c| c.args[1].clone())
            .collect();
        assert_eq!(bakes, vec!["Diffuse", "Roughness", "Normal"]);
    }

    #[test]
    fn test_scalar_channels_baked_as_data() {
        let (_dir, result, engine) = run("Rock");
        result.unwrap();

        let bakes: Vec<(String, String, String)> = engine
            .calls_to("bake_texture")
            .map(|c| (c.args[1].clone(), c.args[2].clone(), c.args[3].clone()))
            .map(|(channel, space, output)| {
                let file = Path::new(&output)
                    .file_name()
                    .unwrap()
                    .to_string_lossy()
                    .into_owned();
                (channel, space, file)
            })
            .collect();
        assert_eq!(
            bakes,
            vec![
                ("Emit".into(), "Color".into(), DIFFUSE_FILE.into()),
                ("Emit".into(), "Data".into(), ROUGHNESS_FILE.into()),
                ("Emit".into(), "Data".into(), METALLIC_FILE.into()),
                ("Normal".into(), "Data".into(), NORMAL_FILE.into()),
            ]
        );
    }

    #[test]
    fn test_missing_material() {
        let (_dir, result, _engine) = run("Marble");
        let err = result.unwrap_err();
        assert_eq!(err.stage, Stage::Setup);
        assert!(matches!(
            err.source,
            PipelineError::Reference {
                kind: ReferenceKind::Material,
                ..
            }
        ));
    }
}
