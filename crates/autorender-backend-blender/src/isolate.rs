//! Material channel isolation.
//!
//! Produces a copy of a material whose surface emits one principled BSDF
//! input unshaded, so that an emission bake or render captures exactly that
//! channel. The source material is never modified.

use crate::engine::RenderEngine;
use crate::error::EngineError;
use crate::shader_graph::plan_isolation;

/// Principled input holding the albedo.
pub const DIFFUSE_INPUT: &str = "Base Color";
/// Principled input holding roughness.
pub const ROUGHNESS_INPUT: &str = "Roughness";
/// Principled input holding metalness.
pub const METALLIC_INPUT: &str = "Metallic";

const EMISSION_NODE_NAME: &str = "Emission";

/// Creates isolated material copies with unique names.
///
/// Names follow `___{Input}Export_{n}` with spaces removed from the input
/// name, for example `___BaseColorExport_0`. The counter is shared by every
/// isolation made through one isolator.
#[derive(Debug, Default)]
pub struct ChannelIsolator {
    next_id: u32,
}

impl ChannelIsolator {
    pub fn new() -> Self {
        Self::default()
    }

    fn derived_name(&mut self, input: &str) -> String {
        let compact: String = input.chars().filter(|c| !c.is_whitespace()).collect();
        let name = format!("___{}Export_{}", compact, self.next_id);
        self.next_id += 1;
        name
    }

    /// Isolates `input` of `material` into a new material and returns its name.
    ///
    /// Returns `Ok(None)` when the material's graph does not have the shape
    /// isolation needs (no output, surface not fed by a principled BSDF, no
    /// such input); nothing is left behind in that case. Engine failures are
    /// returned as errors.
    pub fn isolate(
        &mut self,
        engine: &mut dyn RenderEngine,
        material: &str,
        input: &str,
    ) -> Result<Option<String>, EngineError> {
        let wanted = self.derived_name(input);
        let derived = engine.duplicate_material(material, &wanted)?;
        let graph = engine.material_graph(&derived)?;

        let edits = match plan_isolation(&graph, input, EMISSION_NODE_NAME) {
            Ok(edits) => edits,
            Err(shape) => {
                log::warn!(
                    "cannot isolate '{}' of material '{}': {}",
                    input,
                    material,
                    shape
                );
                engine.remove_material(&derived)?;
                return Ok(None);
            }
        };

        engine.apply_graph_edits(&derived, &edits)?;
        log::debug!("isolated '{}' of '{}' as '{}'", input, material, derived);
        Ok(Some(derived))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::MemoryEngine;
    use crate::shader_graph::{GraphEdit, NodeKind, NodeLink, ShaderGraph, SocketValue};

    const SCENE: &str = r#"{
        "objects": [{"name": "rock", "kind": "MESH", "material_slots": ["Rock"]}],
        "materials": [
            {"name": "Rock"},
            {"name": "Glow", "graph": {
                "nodes": [
                    {"name": "Emission", "kind": "EMISSION", "inputs": {"Color": [1.0, 0.0, 0.0, 1.0]}},
                    {"name": "Material Output", "kind": "OUTPUT_MATERIAL"}
                ],
                "links": [{"from_node": "Emission", "from_socket": "Emission", "to_node": "Material Output", "to_socket": "Surface"}]
            }}
        ]
    }"#;

    fn engine() -> (tempfile::TempDir, MemoryEngine) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rock.scene.json");
        std::fs::write(&path, SCENE).unwrap();
        let mut engine = MemoryEngine::new();
        engine.load_scene(&path).unwrap();
        (dir, engine)
    }

    #[test]
    fn test_derived_names_count_up() {
        let mut isolator = ChannelIsolator::new();
        assert_eq!(isolator.derived_name("Base Color"), "___BaseColorExport_0");
        assert_eq!(isolator.derived_name("Roughness"), "___RoughnessExport_1");
    }

    #[test]
    fn test_isolate_scalar_input() {
        let (_dir, mut engine) = engine();
        let mut isolator = ChannelIsolator::new();

        let derived = isolator
            .isolate(&mut engine, "Rock", ROUGHNESS_INPUT)
            .unwrap()
            .unwrap();
        assert_eq!(derived, "___RoughnessExport_0");

        let graph = engine.material_graph(&derived).unwrap();
        assert_eq!(graph.emitted_color(), Some([0.5, 0.5, 0.5, 1.0]));
    }

    #[test]
    fn test_source_material_untouched() {
        let (_dir, mut engine) = engine();
        let before = engine.material_graph("Rock").unwrap();
        ChannelIsolator::new()
            .isolate(&mut engine, "Rock", DIFFUSE_INPUT)
            .unwrap();
        assert_eq!(engine.material_graph("Rock").unwrap(), before);
        assert_eq!(before, ShaderGraph::principled_default());
    }

    #[test]
    fn test_linked_input_is_forwarded() {
        let (_dir, mut engine) = engine();
        engine
            .apply_graph_edits(
                "Rock",
                &[
                    GraphEdit::AddNode {
                        name: "Tint".into(),
                        kind: NodeKind::Rgb,
                    },
                    GraphEdit::SetInput {
                        node: "Tint".into(),
                        socket: "Color".into(),
                        value: SocketValue::Color([0.2, 0.4, 0.6, 1.0]),
                    },
                    GraphEdit::Link(NodeLink::new("Tint", "Color", "Principled BSDF", "Base Color")),
                ],
            )
            .unwrap();

        let derived = ChannelIsolator::new()
            .isolate(&mut engine, "Rock", DIFFUSE_INPUT)
            .unwrap()
            .unwrap();
        let graph = engine.material_graph(&derived).unwrap();
        let emission = graph.link_into("Emission", "Color").unwrap();
        assert_eq!(emission.from_node, "Tint");
        assert_eq!(graph.emitted_color(), Some([0.2, 0.4, 0.6, 1.0]));
    }

    #[test]
    fn test_unsupported_shape_leaves_nothing_behind() {
        let (_dir, mut engine) = engine();
        let materials_before = engine.scene_info().unwrap().materials;

        let result = ChannelIsolator::new()
            .isolate(&mut engine, "Glow", METALLIC_INPUT)
            .unwrap();
        assert!(result.is_none());
        assert_eq!(engine.scene_info().unwrap().materials, materials_before);
    }

    #[test]
    fn test_unknown_material_is_an_error() {
        let (_dir, mut engine) = engine();
        let err = ChannelIsolator::new()
            .isolate(&mut engine, "Missing", DIFFUSE_INPUT)
            .unwrap_err();
        assert!(matches!(err, EngineError::UnknownMaterial(_)));
    }
}
