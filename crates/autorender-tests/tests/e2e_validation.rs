//! End-to-end tests for config loading and validation.
//!
//! Every document of a manifest is validated before anything renders, and
//! all validation failures are reported together.

use autorender_spec::{
    load_asset, load_manifest, ActionConfig, AnimatedSceneConfig, AnimatedSpriteConfig,
    AssetConfig, AssetKind, AssetVariant, BackendError, ConfigError, ErrorCode, MaterialConfig,
    ObjectConfig, WarningCode,
};
use autorender_tests::fixtures::{ProjectFixture, KNIGHT_SCENE, RIG_SCENE, ROCK_SCENE};
use pretty_assertions::assert_eq;

#[test]
fn manifest_with_every_variant_loads() {
    let project = ProjectFixture::new();
    let rock = project.add_scene("rock", ROCK_SCENE);
    let knight = project.add_scene("knight", KNIGHT_SCENE);
    let rig = project.add_scene("rig", RIG_SCENE);

    let docs = vec![
        project.add_asset(&AssetConfig::new(
            "rock01",
            &rock,
            AssetVariant::Material(MaterialConfig::new("Rock", 512)),
        )),
        project.add_asset(&AssetConfig::new(
            "knight_walk",
            &knight,
            AssetVariant::AnimatedSprite(
                AnimatedSpriteConfig::new(64, 8)
                    .with_frames(1, 24, 1, true)
                    .with_object(ObjectConfig::animated("knight", "Walk")),
            ),
        )),
        project.add_asset(&AssetConfig::new(
            "rig_anims",
            &rig,
            AssetVariant::AnimatedScene(
                AnimatedSceneConfig::new("rig").with_action(ActionConfig::new("Walk")),
            ),
        )),
    ];
    let manifest = project.add_manifest(&[("game", docs)]);

    let loaded = load_manifest(&manifest).unwrap();
    let kinds: Vec<AssetKind> = loaded.collections[0]
        .assets
        .iter()
        .map(|a| a.config.kind())
        .collect();
    assert_eq!(
        kinds,
        vec![
            AssetKind::Material,
            AssetKind::AnimatedSprite,
            AssetKind::AnimatedScene
        ]
    );
    // Source paths are resolved against the asset documents.
    assert!(loaded.collections[0]
        .assets
        .iter()
        .all(|a| a.config.source_scene_path.is_absolute()));
}

#[test]
fn legacy_blend_file_path_accepted() {
    let project = ProjectFixture::new();
    project.add_scene("rock", ROCK_SCENE);
    let doc = project.add_raw_asset(
        "rock01.json",
        r#"{
            "id": "rock01",
            "blend_file_path": "../scenes/rock.scene.json",
            "variant": "material",
            "material_name": "Rock",
            "texture_size": 128
        }"#,
    );

    let asset = load_asset(&doc).unwrap();
    assert!(asset.config.source_scene_path.ends_with("rock.scene.json"));
    assert!(asset.warnings.is_empty());
}

#[test]
fn unknown_variant_is_schema_error() {
    let project = ProjectFixture::new();
    project.add_scene("rock", ROCK_SCENE);
    let doc = project.add_raw_asset(
        "rock01.json",
        r#"{"id": "rock01", "source_scene_path": "../scenes/rock.scene.json", "variant": "hologram"}"#,
    );

    let err = load_asset(&doc).unwrap_err();
    assert!(matches!(err, ConfigError::Schema { .. }));
    assert_eq!(err.code(), "CONFIG_002");
}

#[test]
fn all_invalid_documents_reported_together() {
    let project = ProjectFixture::new();
    let knight = project.add_scene("knight", KNIGHT_SCENE);
    let rock = project.add_scene("rock", ROCK_SCENE);

    let bad_range = project.add_asset(&AssetConfig::new(
        "knight_walk",
        &knight,
        AssetVariant::AnimatedSprite(
            AnimatedSpriteConfig::new(64, 8)
                .with_frames(1, 24, 5, true)
                .with_object(ObjectConfig::animated("knight", "Walk")),
        ),
    ));
    let missing_scene = project.add_asset(&AssetConfig::new(
        "barrel01",
        project.path().join("scenes/barrel.scene.json"),
        AssetVariant::Material(MaterialConfig::new("Wood", 256)),
    ));
    let good = project.add_asset(&AssetConfig::new(
        "rock01",
        &rock,
        AssetVariant::Material(MaterialConfig::new("Rock", 256)),
    ));
    let manifest = project.add_manifest(&[("game", vec![bad_range, missing_scene, good])]);

    let err = load_manifest(&manifest).unwrap_err();
    let codes: Vec<ErrorCode> = err.validation_errors().iter().map(|(_, e)| e.code).collect();
    assert_eq!(
        codes,
        vec![ErrorCode::FrameStepMismatch, ErrorCode::SourceSceneMissing]
    );

    // Nothing was rendered.
    assert!(!project.output_dir().exists());
}

#[test]
fn duplicate_id_within_collection_rejected() {
    let project = ProjectFixture::new();
    let rock = project.add_scene("rock", ROCK_SCENE);
    let first = project.add_asset(&AssetConfig::new(
        "rock01",
        &rock,
        AssetVariant::Material(MaterialConfig::new("Rock", 256)),
    ));
    let second = project.add_raw_asset(
        "rock01_copy.json",
        r#"{"id": "rock01", "source_scene_path": "../scenes/rock.scene.json",
            "variant": "material", "material_name": "Glow", "texture_size": 256}"#,
    );
    let manifest = project.add_manifest(&[("props", vec![first, second])]);

    let err = load_manifest(&manifest).unwrap_err();
    let errors = err.validation_errors();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].1.code, ErrorCode::DuplicateAssetId);
    assert!(errors[0].0.ends_with("rock01_copy.json"));
}

#[test]
fn same_id_across_collections_sharing_output_rejected() {
    let project = ProjectFixture::new();
    let rock = project.add_scene("rock", ROCK_SCENE);
    let doc = project.add_asset(&AssetConfig::new(
        "rock01",
        &rock,
        AssetVariant::Material(MaterialConfig::new("Rock", 256)),
    ));
    // Both collections write under the fixture's single output directory.
    let manifest = project.add_manifest(&[("props", vec![doc.clone()]), ("extras", vec![doc])]);

    let err = load_manifest(&manifest).unwrap_err();
    let errors = err.validation_errors();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].1.code, ErrorCode::DuplicateAssetId);
    assert!(errors[0].1.message.contains("'extras'"));
    assert!(!project.output_dir().exists());
}

#[test]
fn non_power_of_two_size_warns() {
    let project = ProjectFixture::new();
    let rock = project.add_scene("rock", ROCK_SCENE);
    let doc = project.add_asset(&AssetConfig::new(
        "rock01",
        &rock,
        AssetVariant::Material(MaterialConfig::new("Rock", 300)),
    ));

    let asset = load_asset(&doc).unwrap();
    assert_eq!(asset.warnings.len(), 1);
    assert_eq!(asset.warnings[0].code, WarningCode::NonPowerOfTwoSize);
}
