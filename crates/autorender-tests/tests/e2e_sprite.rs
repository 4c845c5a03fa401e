//! End-to-end tests for animated sprite sheets.

use autorender_backend_blender::{FailurePolicy, Stage};
use autorender_backend_texture::png::read_rgba;
use autorender_spec::{
    AnimatedSpriteConfig, AssetConfig, AssetVariant, CameraConfig, CameraView, ObjectConfig,
};
use autorender_tests::fixtures::{ProjectFixture, KNIGHT_SCENE};
use autorender_tests::harness::read_png_info;
use autorender_tests::{render_asset, render_manifest};
use pretty_assertions::assert_eq;
use std::path::Path;

fn knight_walk(scene: &Path, sprite: AnimatedSpriteConfig) -> AssetConfig {
    AssetConfig::new(
        "knight_walk",
        scene,
        AssetVariant::AnimatedSprite(sprite.with_object(ObjectConfig::animated("knight", "Walk"))),
    )
}

#[test]
fn walk_cycle_sheet_layout() {
    let project = ProjectFixture::new();
    let scene = project.add_scene("knight", KNIGHT_SCENE);
    let sprite = AnimatedSpriteConfig::new(16, 10)
        .with_frames(1, 24, 1, true)
        .with_camera(CameraConfig::new(CameraView::Side, 4.0));
    let doc = project.add_asset(&knight_walk(&scene, sprite));
    let manifest = project.add_manifest(&[("characters", vec![doc])]);

    let summary = render_manifest(&manifest, FailurePolicy::Abort);
    assert!(summary.is_success(), "{:?}", summary.failures);

    let dir = project.output_dir().join("spritesheets").join("knight_walk");
    // 24 frames per pass plus two sheets.
    assert_eq!(summary.assets[0].outputs.len(), 50);
    assert!(dir.join("diffuse").join("diffuse_0001.png").exists());
    assert!(dir.join("normal").join("normal_0024.png").exists());

    let info = read_png_info(&dir.join("spritesheet_diffuse.png"));
    assert_eq!((info.width, info.height), (160, 48));

    // Frame index 23 sits at row 2, column 3.
    let diffuse = read_rgba(&dir.join("spritesheet_diffuse.png")).unwrap();
    assert_eq!(diffuse.get_pixel(48 + 8, 32 + 8).0, [204, 204, 204, 255]);
    assert_eq!(diffuse.get_pixel(48, 32).0, [0, 0, 0, 0]);
    // The last row is only partly filled.
    assert_eq!(diffuse.get_pixel(64 + 8, 32 + 8).0, [0, 0, 0, 0]);

    let normal = read_rgba(&dir.join("spritesheet_normal.png")).unwrap();
    assert_eq!(normal.get_pixel(48 + 8, 32 + 8).0, [128, 128, 255, 255]);
}

#[test]
fn frame_step_samples_every_nth_frame() {
    let project = ProjectFixture::new();
    let scene = project.add_scene("knight", KNIGHT_SCENE);
    let sprite = AnimatedSpriteConfig::new(8, 4).with_frames(1, 21, 5, false);

    let report = render_asset(&knight_walk(&scene, sprite), &project.output_dir()).unwrap();

    let diffuse_frames: Vec<String> = report
        .outputs
        .iter()
        .filter(|o| o.path.parent().map(|p| p.ends_with("diffuse")).unwrap_or(false))
        .map(|o| o.path.file_name().unwrap().to_string_lossy().to_string())
        .collect();
    assert_eq!(
        diffuse_frames,
        vec![
            "diffuse_0001.png",
            "diffuse_0006.png",
            "diffuse_0011.png",
            "diffuse_0016.png"
        ]
    );

    let info = read_png_info(&report.output_dir.join("spritesheet_normal.png"));
    assert_eq!((info.width, info.height), (32, 8));
}

#[test]
fn indivisible_range_rejected_before_rendering() {
    let project = ProjectFixture::new();
    let scene = project.add_scene("knight", KNIGHT_SCENE);
    let sprite = AnimatedSpriteConfig::new(8, 4).with_frames(1, 24, 5, true);

    let failure = render_asset(&knight_walk(&scene, sprite), &project.output_dir()).unwrap_err();
    assert_eq!(failure.stage, Stage::Setup);

    let dir = project.output_dir().join("spritesheets").join("knight_walk");
    assert!(!dir.join("diffuse").exists());
    assert!(!dir.join("spritesheet_diffuse.png").exists());
}

#[test]
fn missing_camera_fails_asset() {
    let project = ProjectFixture::new();
    let scene = project.add_scene(
        "knight",
        r#"{
            "objects": [{"name": "knight", "kind": "MESH", "material_slots": ["Armor"]}],
            "actions": [{"name": "Walk", "frame_range": [1, 24]}],
            "materials": [{"name": "Armor"}]
        }"#,
    );
    let sprite = AnimatedSpriteConfig::new(8, 4).with_frames(1, 4, 1, true);

    let failure = render_asset(&knight_walk(&scene, sprite), &project.output_dir()).unwrap_err();
    assert_eq!(failure.stage, Stage::Setup);
    assert!(failure.to_string().contains("Camera"), "{}", failure);
}
