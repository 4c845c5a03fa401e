//! Asset config validation.
//!
//! Validation runs after parsing and before any engine call. Every problem
//! found is collected into one [`ValidationResult`] so a broken config
//! reports all of its errors at once.


use std::collections::HashSet;
use std::sync::OnceLock;

use regex::Regex;

use crate::asset::{AssetConfig, AssetVariant};
use crate::error::{ErrorCode, ValidationError, ValidationResult, ValidationWarning, WarningCode};
use crate::material::MaterialConfig;
use crate::scene::AnimatedSceneConfig;
use crate::sprite::{AnimatedSpriteConfig, FrameRangeError};

/// Regex pattern for valid asset ids.
///
/// An id names a single output directory, so it is 1-64 ASCII letters,
/// digits, underscores, hyphens or dots and may not start with a dot. That
/// rules out path separators, whitespace, `.` and `..`.
const ASSET_ID_PATTERN: &str = r"^[A-Za-z0-9_][A-Za-z0-9_.-]{0,63}$";

/// Largest texture or sprite edge accepted, in pixels.
pub const MAX_IMAGE_SIZE: u32 = 8192;

/// Largest sprite sheet edge accepted, in pixels.
pub const MAX_SHEET_SIZE: u32 = 16384;

static ASSET_ID_REGEX: OnceLock<Regex> = OnceLock::new();

fn asset_id_regex() -> &'static Regex {
    ASSET_ID_REGEX.get_or_init(|| Regex::new(ASSET_ID_PATTERN).expect("invalid regex pattern"))
}

/// Returns true if `id` is usable as an asset id (and output directory name).
pub fn is_valid_asset_id(id: &str) -> bool {
    asset_id_regex().is_match(id)
}

/// Validates one asset config.
///
/// Only the config itself is inspected; whether the source scene exists is
/// checked by [`validate_source_scene`].
///
/// # Example
/// ```
/// use autorender_spec::{AssetConfig, AssetVariant, MaterialConfig};
/// use autorender_spec::validation::validate_asset;
///
/// let config = AssetConfig::new(
///     "rock01",
///     "/scenes/rock.blend",
///     AssetVariant::Material(MaterialConfig::new("Rock", 256)),
/// );
/// assert!(validate_asset(&config).is_ok());
/// ```
pub fn validate_asset(config: &AssetConfig) -> ValidationResult {
    let mut result = ValidationResult::default();

    validate_asset_id(config, &mut result);

    match &config.variant {
        AssetVariant::Material(material) => validate_material(material, &mut result),
        AssetVariant::AnimatedSprite(sprite) => validate_sprite(sprite, &mut result),
        AssetVariant::AnimatedScene(scene) => validate_scene(scene, &mut result),
    }

    result
}

/// Checks that the (already resolved) source scene path points at a file.
pub fn validate_source_scene(config: &AssetConfig, result: &mut ValidationResult) {
    if !config.source_scene_path.is_file() {
        result.add_error(ValidationError::with_path(
            ErrorCode::SourceSceneMissing,
            format!(
                "source scene '{}' does not exist",
                config.source_scene_path.display()
            ),
            "source_scene_path",
        ));
    }
}

fn validate_asset_id(config: &AssetConfig, result: &mut ValidationResult) {
    if !is_valid_asset_id(&config.id) {
        result.add_error(ValidationError::with_path(
            ErrorCode::InvalidAssetId,
            format!(
                "id must match pattern '{}', got '{}'",
                ASSET_ID_PATTERN, config.id
            ),
            "id",
        ));
    }
}

fn validate_image_size(size: u32, field: &str, result: &mut ValidationResult) {
    if size == 0 || size > MAX_IMAGE_SIZE {
        result.add_error(ValidationError::with_path(
            ErrorCode::InvalidSize,
            format!("{} must be in 1..={}, got {}", field, MAX_IMAGE_SIZE, size),
            field,
        ));
    }
}

fn validate_name(name: &str, path: impl Into<String>, result: &mut ValidationResult) {
    if name.trim().is_empty() {
        let path = path.into();
        result.add_error(ValidationError::with_path(
            ErrorCode::EmptyName,
            format!("{} cannot be empty", path),
            path,
        ));
    }
}

fn validate_material(material: &MaterialConfig, result: &mut ValidationResult) {
    validate_name(&material.material_name, "material_name", result);
    validate_image_size(material.texture_size, "texture_size", result);

    if material.texture_size > 0 && !material.texture_size.is_power_of_two() {
        result.add_warning(ValidationWarning::with_path(
            WarningCode::NonPowerOfTwoSize,
            format!("texture_size {} is not a power of two", material.texture_size),
            "texture_size",
        ));
    }
}

fn validate_sprite(sprite: &AnimatedSpriteConfig, result: &mut ValidationResult) {
    validate_image_size(sprite.sprite_size, "sprite_size", result);

    if sprite.sheet_width == 0 {
        result.add_error(ValidationError::with_path(
            ErrorCode::InvalidSheetWidth,
            "sheet_width must be at least 1",
            "sheet_width",
        ));
    }

    let range = sprite.frame_range();
    match range.check() {
        Ok(()) => validate_sheet_size(sprite, range.frame_count(), result),
        Err(err) => {
            let (code, path) = match err {
                FrameRangeError::ZeroStep => (ErrorCode::InvalidFrameStep, "frame_step"),
                FrameRangeError::Empty { .. } => (ErrorCode::EmptyFrameRange, "end_frame"),
                FrameRangeError::StepMismatch { .. } => {
                    (ErrorCode::FrameStepMismatch, "frame_step")
                }
            };
            result.add_error(ValidationError::with_path(code, err.to_string(), path));
        }
    }

    let scale = sprite.camera.ortho_scale;
    if !scale.is_finite() || scale <= 0.0 {
        result.add_error(ValidationError::with_path(
            ErrorCode::InvalidOrthoScale,
            format!("ortho_scale must be finite and positive, got {}", scale),
            "camera.ortho_scale",
        ));
    }

    if sprite.object_configs.is_empty() {
        result.add_error(ValidationError::with_path(
            ErrorCode::NoObjects,
            "object_configs must have at least one entry",
            "object_configs",
        ));
    }

    for (i, object) in sprite.object_configs.iter().enumerate() {
        validate_name(
            &object.object_name,
            format!("object_configs[{}].object_name", i),
            result,
        );
        match &object.action_name {
            Some(action) => validate_name(
                action,
                format!("object_configs[{}].action_name", i),
                result,
            ),
            None => result.add_warning(ValidationWarning::with_path(
                WarningCode::StaticSpriteObject,
                format!(
                    "object '{}' has no action and renders the same pose on every frame",
                    object.object_name
                ),
                format!("object_configs[{}]", i),
            )),
        }
    }
}

/// Checks that both sheet edges stay within [`MAX_SHEET_SIZE`].
fn validate_sheet_size(
    sprite: &AnimatedSpriteConfig,
    frame_count: usize,
    result: &mut ValidationResult,
) {
    if sprite.sheet_width == 0 || sprite.sprite_size == 0 {
        return;
    }
    let size = u64::from(sprite.sprite_size);
    let width = u64::from(sprite.sheet_width) * size;
    let rows = frame_count.div_ceil(sprite.sheet_width as usize) as u64;
    let height = rows.saturating_mul(size);
    if width > u64::from(MAX_SHEET_SIZE) || height > u64::from(MAX_SHEET_SIZE) {
        result.add_error(ValidationError::with_path(
            ErrorCode::SheetTooLarge,
            format!(
                "sprite sheet would be {}x{} pixels, larger than {} per edge",
                width, height, MAX_SHEET_SIZE
            ),
            "sheet_width",
        ));
    }
}

fn validate_scene(scene: &AnimatedSceneConfig, result: &mut ValidationResult) {
    validate_name(&scene.object_name, "object_name", result);

    if scene.action_configs.is_empty() {
        result.add_error(ValidationError::with_path(
            ErrorCode::NoActions,
            "action_configs must have at least one entry",
            "action_configs",
        ));
        return;
    }

    let mut seen: HashSet<&str> = HashSet::new();
    for (i, action) in scene.action_configs.iter().enumerate() {
        validate_name(
            &action.action_name,
            format!("action_configs[{}].action_name", i),
            result,
        );

        if !seen.insert(action.action_name.as_str()) {
            result.add_error(ValidationError::with_path(
                ErrorCode::DuplicateActionName,
                format!("action '{}' is listed more than once", action.action_name),
                format!("action_configs[{}].action_name", i),
            ));
        }

        if action.bake_step == 0 {
            result.add_error(ValidationError::with_path(
                ErrorCode::InvalidBakeStep,
                "bake_step must be greater than 0",
                format!("action_configs[{}].bake_step", i),
            ));
        }
    }
}
