//! End-to-end tests for baked animation export.

use autorender_backend_blender::{FailurePolicy, Stage};
use autorender_spec::{ActionConfig, AnimatedSceneConfig, AssetConfig, AssetVariant};
use autorender_tests::fixtures::{ProjectFixture, RIG_SCENE};
use autorender_tests::{render_asset, render_manifest, validate_glb};
use pretty_assertions::assert_eq;
use std::path::Path;

fn rig_anims(scene: &Path, actions: &[(&str, u32)]) -> AssetConfig {
    let config = actions
        .iter()
        .fold(AnimatedSceneConfig::new("rig"), |config, (name, step)| {
            config.with_action(ActionConfig::new(*name).with_step(*step))
        });
    AssetConfig::new("rig_anims", scene, AssetVariant::AnimatedScene(config))
}

#[test]
fn baked_actions_exported_in_config_order() {
    let project = ProjectFixture::new();
    let scene = project.add_scene("rig", RIG_SCENE);
    let doc = project.add_asset(&rig_anims(&scene, &[("Run", 2), ("Walk", 1)]));
    let manifest = project.add_manifest(&[("characters", vec![doc])]);

    let summary = render_manifest(&manifest, FailurePolicy::Abort);
    assert!(summary.is_success(), "{:?}", summary.failures);

    let glb_path = project
        .output_dir()
        .join("anim_scenes")
        .join("rig_anims")
        .join("model.glb");
    assert_eq!(summary.assets[0].outputs.len(), 1);
    assert_eq!(summary.assets[0].outputs[0].path, glb_path);

    let info = validate_glb(&std::fs::read(&glb_path).unwrap()).unwrap();
    assert_eq!(info.version, 2);
    // Leftover actions are removed and other objects lose their animation.
    assert_eq!(info.animation_names(), vec!["Run", "Walk"]);

    let nodes: Vec<&str> = info.json["nodes"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|n| n["name"].as_str())
        .collect();
    assert_eq!(nodes, vec!["rig", "prop"]);
}

#[test]
fn unknown_action_fails_before_export() {
    let project = ProjectFixture::new();
    let scene = project.add_scene("rig", RIG_SCENE);

    let failure = render_asset(
        &rig_anims(&scene, &[("Walk", 1), ("Crawl", 1)]),
        &project.output_dir(),
    )
    .unwrap_err();

    assert_eq!(failure.stage, Stage::Setup);
    assert_eq!(failure.asset_id, "rig_anims");
    assert!(failure.to_string().contains("Crawl"));
    assert!(!project
        .output_dir()
        .join("anim_scenes/rig_anims/model.glb")
        .exists());
}

#[test]
fn rerender_replaces_previous_output() {
    let project = ProjectFixture::new();
    let scene = project.add_scene("rig", RIG_SCENE);
    let out = project.output_dir();

    render_asset(&rig_anims(&scene, &[("Walk", 1), ("Run", 1)]), &out).unwrap();
    let report = render_asset(&rig_anims(&scene, &[("Walk", 1)]), &out).unwrap();

    let info = validate_glb(&std::fs::read(&report.outputs[0].path).unwrap()).unwrap();
    assert_eq!(info.animation_names(), vec!["Walk"]);
}
