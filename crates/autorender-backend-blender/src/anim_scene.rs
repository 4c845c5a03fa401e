//! Animated scene handler.
//!
//! Bakes each configured action of one object into sampled keyframes, then
//! places every baked action on its own NLA track and exports the scene as
//! GLB. All bakes finish before the first track is created: a strip placed
//! earlier would be evaluated by the following bakes.

use std::path::{Path, PathBuf};

use autorender_spec::AnimatedSceneConfig;

use crate::engine::{ExportOptions, KeyframeBakeOptions, NlaStrip, RenderEngine, SceneInfo};
use crate::error::{PipelineError, ReferenceKind, Stage, StageError, StageExt};

pub const MODEL_FILE: &str = "model.glb";

/// Result of an animated scene export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SceneResult {
    /// Path to the exported GLB file.
    pub output_path: PathBuf,
    /// Placed strips, one per track, in config order.
    pub strips: Vec<NlaStrip>,
}

/// Bakes and exports `config` into `output_dir/model.glb`.
pub fn generate(
    engine: &mut dyn RenderEngine,
    source_scene: &Path,
    config: &AnimatedSceneConfig,
    output_dir: &Path,
) -> Result<SceneResult, StageError> {
    let object = config.object_name.as_str();

    engine.load_scene(source_scene).stage(Stage::Setup)?;
    let info = engine.scene_info().stage(Stage::Setup)?;
    check_references(&info, config).stage(Stage::Setup)?;

    engine.clear_animation().stage(Stage::Setup)?;
    for action in &info.actions {
        if !config.action_names().any(|name| name == action.name) {
            log::debug!("removing unused action '{}'", action.name);
            engine.remove_action(&action.name).stage(Stage::Setup)?;
        }
    }
    engine.ensure_animation_data(object).stage(Stage::Setup)?;

    for action in &config.action_configs {
        let name = action.action_name.as_str();
        let (start, end) = frame_range(&info, name).stage(Stage::Bake)?;
        log::info!(
            "baking '{}' on '{}' over {}..={} every {} frames",
            name,
            object,
            start,
            end,
            action.bake_step
        );

        engine.bind_action(object, Some(name)).stage(Stage::Bake)?;
        engine.clear_nla_tracks(object).stage(Stage::Bake)?;
        engine.select_for_bake(object).stage(Stage::Bake)?;
        engine
            .bake_to_keyframes(object, &KeyframeBakeOptions::visual(start, end, action.bake_step))
            .stage(Stage::Bake)?;
    }

    // Baking can change the key range, so strips start from the baked range.
    let baked = engine.scene_info().stage(Stage::Sequence)?;
    let mut strips = Vec::with_capacity(config.action_configs.len());
    for name in config.action_names() {
        let (start, _) = frame_range(&baked, name).stage(Stage::Sequence)?;
        engine.create_nla_track(object, name).stage(Stage::Sequence)?;
        engine
            .add_strip(object, name, name, start)
            .stage(Stage::Sequence)?;
        strips.push(NlaStrip {
            action: name.to_string(),
            start_frame: start,
        });
    }

    engine.bind_action(object, None).stage(Stage::Export)?;
    let output_path = output_dir.join(MODEL_FILE);
    engine
        .export_scene(&ExportOptions::glb_actions(&output_path))
        .stage(Stage::Export)?;

    Ok(SceneResult {
        output_path,
        strips,
    })
}

fn check_references(info: &SceneInfo, config: &AnimatedSceneConfig) -> Result<(), PipelineError> {
    if info.object(&config.object_name).is_none() {
        return Err(PipelineError::missing(ReferenceKind::Object, &config.object_name));
    }
    for name in config.action_names() {
        if info.action(name).is_none() {
            return Err(PipelineError::missing(ReferenceKind::Action, name));
        }
    }
    Ok(())
}

fn frame_range(info: &SceneInfo, action: &str) -> Result<(i32, i32), PipelineError> {
    info.action(action)
        .map(|a| a.frame_range)
        .ok_or_else(|| PipelineError::missing(ReferenceKind::Action, action))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::MemoryEngine;
    use autorender_spec::ActionConfig;
    use pretty_assertions::assert_eq;

    const SCENE: &str = r#"{
        "objects": [
            {"name": "rig", "kind": "ARMATURE", "animation": {"active_action": "Old"}},
            {"name": "prop", "kind": "MESH", "animation": {"active_action": "Spin"}}
        ],
        "actions": [
            {"name": "Walk", "frame_range": [1, 24]},
            {"name": "Jump", "frame_range": [10, 40]},
            {"name": "Old", "frame_range": [1, 5]},
            {"name": "Spin", "frame_range": [1, 5]}
        ]
    }"#;

    fn run(
        config: &AnimatedSceneConfig,
    ) -> (tempfile::TempDir, Result<SceneResult, StageError>, MemoryEngine) {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("rig.scene.json");
        std::fs::write(&source, SCENE).unwrap();
        let mut engine = MemoryEngine::new();
        let result = generate(&mut engine, &source, config, &dir.path().join("out"));
        (dir, result, engine)
    }

    fn walk_and_jump() -> AnimatedSceneConfig {
        AnimatedSceneConfig::new("rig")
            .with_action(ActionConfig::new("Walk"))
            .with_action(ActionConfig::new("Jump").with_step(2))
    }

    #[test]
    fn test_tracks_follow_config_order() {
        let (_dir, result, engine) = run(&walk_and_jump());
        let result = result.unwrap();

        assert!(result.output_path.ends_with("model.glb"));
        assert!(result.output_path.exists());
        assert_eq!(
            result.strips,
            vec![
                NlaStrip {
                    action: "Walk".into(),
                    start_frame: 1
                },
                NlaStrip {
                    action: "Jump".into(),
                    start_frame: 10
                },
            ]
        );

        let doc = engine.scene().unwrap();
        let rig = doc.objects.iter().find(|o| o.name == "rig").unwrap();
        let anim = rig.animation.as_ref().unwrap();
        assert_eq!(anim.active_action, None);
        let names: Vec<_> = anim.nla_tracks.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["Walk", "Jump"]);
    }

    #[test]
    fn test_all_bakes_before_first_strip() {
        let (_dir, result, engine) = run(&walk_and_jump());
        result.unwrap();

        let calls = engine.calls();
        let last_bake = calls
            .iter()
            .rposition(|c| c.method == "bake_to_keyframes")
            .unwrap();
        let first_track = calls
            .iter()
            .position(|c| c.method == "create_nla_track")
            .unwrap();
        assert!(last_bake < first_track);

        let bakes: Vec<_> = engine
            .calls_to("bake_to_keyframes")
            .map(|c| c.to_string())
            .collect();
        assert_eq!(
            bakes,
            vec![
                "bake_to_keyframes(rig, 1, 24, 1)",
                "bake_to_keyframes(rig, 10, 40, 2)"
            ]
        );
    }

    #[test]
    fn test_unreferenced_actions_removed_and_animation_cleared() {
        let (_dir, result, engine) = run(&walk_and_jump());
        result.unwrap();

        let doc = engine.scene().unwrap();
        let actions: Vec<_> = doc.actions.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(actions, vec!["Walk", "Jump"]);
        assert!(doc.actions.iter().all(|a| a.baked));

        let prop = doc.objects.iter().find(|o| o.name == "prop").unwrap();
        assert!(prop.animation.is_none());
    }

    #[test]
    fn test_unknown_action_fatal_before_baking() {
        let config = AnimatedSceneConfig::new("rig")
            .with_action(ActionConfig::new("Walk"))
            .with_action(ActionConfig::new("Crawl"));
        let (_dir, result, engine) = run(&config);

        let err = result.unwrap_err();
        assert_eq!(err.stage, Stage::Setup);
        assert_eq!(err.source.to_string(), "action 'Crawl' not found in source scene");
        assert_eq!(engine.calls_to("clear_animation").count(), 0);
        assert_eq!(engine.calls_to("bake_to_keyframes").count(), 0);
    }

    #[test]
    fn test_unknown_object_fatal() {
        let config = AnimatedSceneConfig::new("ghost").with_action(ActionConfig::new("Walk"));
        let (_dir, result, _engine) = run(&config);
        assert!(matches!(
            result.unwrap_err().source,
            PipelineError::Reference {
                kind: ReferenceKind::Object,
                ..
            }
        ));
    }
}
