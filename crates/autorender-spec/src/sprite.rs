//! Animated sprite config types.
//!
//! An animated sprite renders one or more objects through an orthographic
//! camera, frame by frame, and assembles the frames into sprite sheets.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Name of the camera object every sprite scene must provide.
pub const CAMERA_OBJECT_NAME: &str = "Camera";

/// Parameters of the `animated_sprite` variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnimatedSpriteConfig {
    /// Width and height of each rendered frame in pixels.
    pub sprite_size: u32,

    /// Number of tiles per sheet row.
    pub sheet_width: u32,

    /// First frame to render.
    #[serde(default = "default_start_frame")]
    pub start_frame: i32,

    /// Frame the loop runs up to (exclusive unless `include_last_frame`).
    #[serde(default = "default_end_frame")]
    pub end_frame: i32,

    /// Distance between two sampled frames.
    #[serde(default = "default_frame_step")]
    pub frame_step: u32,

    /// Whether `end_frame` itself is rendered.
    #[serde(default)]
    pub include_last_frame: bool,

    /// Camera view and scale.
    #[serde(default)]
    pub camera: CameraConfig,

    /// Objects to render, with the action each one plays.
    #[serde(default)]
    pub object_configs: Vec<ObjectConfig>,
}

fn default_start_frame() -> i32 {
    1
}

fn default_end_frame() -> i32 {
    24
}

fn default_frame_step() -> u32 {
    1
}

impl AnimatedSpriteConfig {
    /// Creates a config with default frame range and camera.
    pub fn new(sprite_size: u32, sheet_width: u32) -> Self {
        Self {
            sprite_size,
            sheet_width,
            start_frame: default_start_frame(),
            end_frame: default_end_frame(),
            frame_step: default_frame_step(),
            include_last_frame: false,
            camera: CameraConfig::default(),
            object_configs: Vec::new(),
        }
    }

    /// Sets the frame range.
    pub fn with_frames(mut self, start: i32, end: i32, step: u32, include_last: bool) -> Self {
        self.start_frame = start;
        self.end_frame = end;
        self.frame_step = step;
        self.include_last_frame = include_last;
        self
    }

    /// Sets the camera.
    pub fn with_camera(mut self, camera: CameraConfig) -> Self {
        self.camera = camera;
        self
    }

    /// Adds an object to render.
    pub fn with_object(mut self, object: ObjectConfig) -> Self {
        self.object_configs.push(object);
        self
    }

    /// Frame sampling described by this config.
    pub fn frame_range(&self) -> FrameRange {
        FrameRange {
            start: self.start_frame,
            end: self.end_frame,
            step: self.frame_step,
            include_last: self.include_last_frame,
        }
    }
}

/// An object rendered into the sprite, with an optional action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectConfig {
    /// Name of the object in the source scene.
    pub object_name: String,

    /// Action bound to the object while rendering; `None` renders it as is.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action_name: Option<String>,
}

impl ObjectConfig {
    /// Creates an object config with an action.
    pub fn animated(object_name: impl Into<String>, action_name: impl Into<String>) -> Self {
        Self {
            object_name: object_name.into(),
            action_name: Some(action_name.into()),
        }
    }

    /// Creates an object config without an action.
    pub fn still(object_name: impl Into<String>) -> Self {
        Self {
            object_name: object_name.into(),
            action_name: None,
        }
    }
}

/// Camera direction for sprite renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CameraView {
    /// Looking along +Y.
    #[serde(alias = "front")]
    Front,
    /// Looking along +X.
    #[serde(alias = "side")]
    Side,
    /// Looking down -Z.
    #[default]
    #[serde(alias = "top")]
    Top,
}

impl CameraView {
    /// Returns the view as the uppercase identifier used in config documents.
    pub fn as_str(&self) -> &'static str {
        match self {
            CameraView::Front => "FRONT",
            CameraView::Side => "SIDE",
            CameraView::Top => "TOP",
        }
    }

    /// Camera location and Euler rotation (radians) for this view.
    pub fn placement(&self) -> CameraPlacement {
        match self {
            CameraView::Front => CameraPlacement {
                location: [0.0, -10.0, 0.0],
                rotation: [0.0, 0.0, 0.0],
            },
            CameraView::Side => CameraPlacement {
                location: [-10.0, 0.0, 0.0],
                rotation: [0.0, std::f64::consts::FRAC_PI_2, 0.0],
            },
            CameraView::Top => CameraPlacement {
                location: [0.0, 0.0, 10.0],
                rotation: [0.0, 0.0, 0.0],
            },
        }
    }
}

impl std::fmt::Display for CameraView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Location and rotation of the render camera.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraPlacement {
    /// World-space location.
    pub location: [f64; 3],
    /// XYZ Euler rotation in radians.
    pub rotation: [f64; 3],
}

/// Orthographic camera settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraConfig {
    /// Direction the camera looks from.
    #[serde(default)]
    pub view: CameraView,

    /// Orthographic scale (world units covered by the frame).
    #[serde(default = "default_ortho_scale")]
    pub ortho_scale: f64,
}

fn default_ortho_scale() -> f64 {
    2.0
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            view: CameraView::default(),
            ortho_scale: default_ortho_scale(),
        }
    }
}

impl CameraConfig {
    /// Creates a camera config.
    pub fn new(view: CameraView, ortho_scale: f64) -> Self {
        Self { view, ortho_scale }
    }
}

/// Frame sampling of an animated sprite.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameRange {
    /// First sampled frame.
    pub start: i32,
    /// Upper bound of the loop.
    pub end: i32,
    /// Distance between samples.
    pub step: u32,
    /// Whether `end` is sampled.
    pub include_last: bool,
}

/// Reasons a frame range is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FrameRangeError {
    /// Step of zero would never advance.
    #[error("frame_step must be greater than 0")]
    ZeroStep,

    /// The loop would not run at all.
    #[error("frame range {start}..{end} (include_last_frame = {include_last}) contains no frames")]
    Empty {
        start: i32,
        end: i32,
        include_last: bool,
    },

    /// The last sample would not land on `end`.
    #[error("frame span {span} ({start}..{end}) is not divisible by frame_step {step}")]
    StepMismatch {
        start: i32,
        end: i32,
        span: i64,
        step: u32,
    },
}

impl FrameRange {
    /// Creates a frame range.
    pub fn new(start: i32, end: i32, step: u32, include_last: bool) -> Self {
        Self {
            start,
            end,
            step,
            include_last,
        }
    }

    fn span(&self) -> i64 {
        i64::from(self.end) - i64::from(self.start)
    }

    /// Checks that the range is non-empty and evenly divided by the step.
    pub fn check(&self) -> Result<(), FrameRangeError> {
        if self.step == 0 {
            return Err(FrameRangeError::ZeroStep);
        }

        let span = self.span();
        let empty = if self.include_last { span < 0 } else { span <= 0 };
        if empty {
            return Err(FrameRangeError::Empty {
                start: self.start,
                end: self.end,
                include_last: self.include_last,
            });
        }

        if span % i64::from(self.step) != 0 {
            return Err(FrameRangeError::StepMismatch {
                start: self.start,
                end: self.end,
                span,
                step: self.step,
            });
        }

        Ok(())
    }

    /// Number of frames a checked range yields.
    ///
    /// `floor(span / step)`, plus one when the last frame is included and
    /// lands on the step grid.
    pub fn frame_count(&self) -> usize {
        if self.step == 0 {
            return 0;
        }
        let span = self.span();
        if span < 0 {
            return 0;
        }
        let step = i64::from(self.step);
        let last = usize::from(self.include_last && span % step == 0);
        (span / step) as usize + last
    }

    /// Iterates the sampled frames in render order.
    pub fn frames(&self) -> impl Iterator<Item = i32> {
        let FrameRange {
            start,
            end,
            step,
            include_last,
        } = *self;
        let step = i64::from(step.max(1));
        let end = i64::from(end);
        let mut next = i64::from(start);
        std::iter::from_fn(move || {
            let more = if include_last { next <= end } else { next < end };
            if !more {
                return None;
            }
            let frame = next;
            next += step;
            Some(frame as i32)
        })
    }
}
