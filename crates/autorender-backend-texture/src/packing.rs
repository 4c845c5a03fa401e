//! Channel packing of grayscale-with-alpha maps into one RGBA texture.
//!
//! Each of the three colour channels of the output takes the luminance of
//! one optional source image. The output alpha at every pixel is the maximum
//! of the three source alphas, so a pixel is as opaque as its most opaque
//! contributor. Absent slots contribute zero to both colour and alpha.
//!
//! # Example
//!
//! ```no_run
//! use autorender_backend_texture::packing::{pack_to_file, PackedImageSpec};
//! use autorender_backend_texture::png::PngConfig;
//!
//! // ORM: occlusion absent, roughness in green, metallic in blue.
//! let spec = PackedImageSpec::new("out/materials/rock01", "orm.png", 256, 256)
//!     .with_green("out/materials/rock01/roughness.png")
//!     .with_blue("out/materials/rock01/metallic.png");
//!
//! let path = pack_to_file(&spec, &PngConfig::default()).unwrap();
//! ```

use std::path::{Path, PathBuf};

use autorender_spec::BackendError;
use image::imageops::{self, FilterType};
use image::{GrayAlphaImage, Rgba, RgbaImage};

use crate::png::{read_luma_alpha, write_rgba, PngConfig, PngError};

/// Output channel a source is packed into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelSlot {
    /// Red channel
    Red,
    /// Green channel
    Green,
    /// Blue channel
    Blue,
}

impl std::fmt::Display for ChannelSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ChannelSlot::Red => "red",
            ChannelSlot::Green => "green",
            ChannelSlot::Blue => "blue",
        };
        write!(f, "{}", name)
    }
}

/// What to pack and where to write it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackedImageSpec {
    /// Source for the red channel; `None` packs zeros.
    pub red: Option<PathBuf>,
    /// Source for the green channel; `None` packs zeros.
    pub green: Option<PathBuf>,
    /// Source for the blue channel; `None` packs zeros.
    pub blue: Option<PathBuf>,
    /// Output width in pixels.
    pub width: u32,
    /// Output height in pixels.
    pub height: u32,
    /// Directory the packed image is written to. Created if missing.
    pub output_dir: PathBuf,
    /// File name of the packed image.
    pub output_file_name: String,
}

impl PackedImageSpec {
    /// Creates a spec with all slots absent.
    pub fn new(
        output_dir: impl Into<PathBuf>,
        output_file_name: impl Into<String>,
        width: u32,
        height: u32,
    ) -> Self {
        Self {
            red: None,
            green: None,
            blue: None,
            width,
            height,
            output_dir: output_dir.into(),
            output_file_name: output_file_name.into(),
        }
    }

    /// Sets the red source.
    pub fn with_red(mut self, path: impl Into<PathBuf>) -> Self {
        self.red = Some(path.into());
        self
    }

    /// Sets the green source.
    pub fn with_green(mut self, path: impl Into<PathBuf>) -> Self {
        self.green = Some(path.into());
        self
    }

    /// Sets the blue source.
    pub fn with_blue(mut self, path: impl Into<PathBuf>) -> Self {
        self.blue = Some(path.into());
        self
    }

    /// Sets a slot from an optional path.
    pub fn with_slot(mut self, slot: ChannelSlot, path: Option<PathBuf>) -> Self {
        match slot {
            ChannelSlot::Red => self.red = path,
            ChannelSlot::Green => self.green = path,
            ChannelSlot::Blue => self.blue = path,
        }
        self
    }

    /// Full path of the packed image.
    pub fn output_path(&self) -> PathBuf {
        self.output_dir.join(&self.output_file_name)
    }

    fn slots(&self) -> [(ChannelSlot, Option<&Path>); 3] {
        [
            (ChannelSlot::Red, self.red.as_deref()),
            (ChannelSlot::Green, self.green.as_deref()),
            (ChannelSlot::Blue, self.blue.as_deref()),
        ]
    }
}

/// Errors that can occur during channel packing.
#[derive(Debug, thiserror::Error)]
pub enum PackingError {
    /// Target size has a zero dimension.
    #[error("invalid target size {width}x{height}")]
    InvalidSize { width: u32, height: u32 },

    /// A source image could not be read.
    #[error("failed to load {slot} source: {source}")]
    Load {
        slot: ChannelSlot,
        #[source]
        source: PngError,
    },

    /// The packed image could not be written.
    #[error("failed to write packed image: {0}")]
    Write(#[source] PngError),
}

impl BackendError for PackingError {
    fn code(&self) -> &'static str {
        match self {
            PackingError::InvalidSize { .. } => "PACK_001",
            PackingError::Load { .. } => "PACK_002",
            PackingError::Write(_) => "PACK_003",
        }
    }

    fn category(&self) -> &'static str {
        "texture"
    }
}

/// Resizes `image` to `width` x `height` with nearest-neighbour sampling.
///
/// Images that already have the target size are returned unchanged.
fn normalize(image: GrayAlphaImage, width: u32, height: u32) -> GrayAlphaImage {
    if image.dimensions() == (width, height) {
        image
    } else {
        imageops::resize(&image, width, height, FilterType::Nearest)
    }
}

/// Packs up to three luminance-alpha images into one RGBA image.
///
/// Sources whose size differs from the target are resized first.
///
/// # Returns
///
/// The packed image, or [`PackingError::InvalidSize`] for a zero target size.
pub fn pack_images(
    red: Option<GrayAlphaImage>,
    green: Option<GrayAlphaImage>,
    blue: Option<GrayAlphaImage>,
    width: u32,
    height: u32,
) -> Result<RgbaImage, PackingError> {
    if width == 0 || height == 0 {
        return Err(PackingError::InvalidSize { width, height });
    }

    let red = red.map(|img| normalize(img, width, height));
    let green = green.map(|img| normalize(img, width, height));
    let blue = blue.map(|img| normalize(img, width, height));

    let sample = |img: &Option<GrayAlphaImage>, x: u32, y: u32| -> [u8; 2] {
        match img {
            Some(img) => img.get_pixel(x, y).0,
            None => [0, 0],
        }
    };

    Ok(RgbaImage::from_fn(width, height, |x, y| {
        let [r, ra] = sample(&red, x, y);
        let [g, ga] = sample(&green, x, y);
        let [b, ba] = sample(&blue, x, y);
        Rgba([r, g, b, ra.max(ga).max(ba)])
    }))
}

/// Loads the sources named by `spec` and packs them.
pub fn pack(spec: &PackedImageSpec) -> Result<RgbaImage, PackingError> {
    if spec.width == 0 || spec.height == 0 {
        return Err(PackingError::InvalidSize {
            width: spec.width,
            height: spec.height,
        });
    }

    let mut loaded: [Option<GrayAlphaImage>; 3] = [None, None, None];
    for (i, (slot, path)) in spec.slots().into_iter().enumerate() {
        if let Some(path) = path {
            let image =
                read_luma_alpha(path).map_err(|source| PackingError::Load { slot, source })?;
            log::debug!(
                "packing {} <- {} ({}x{})",
                slot,
                path.display(),
                image.width(),
                image.height()
            );
            loaded[i] = Some(image);
        }
    }

    let [red, green, blue] = loaded;
    pack_images(red, green, blue, spec.width, spec.height)
}

/// Packs and writes the image to `spec.output_path()`, creating the output directory.
pub fn pack_to_file(spec: &PackedImageSpec, config: &PngConfig) -> Result<PathBuf, PackingError> {
    let packed = pack(spec)?;
    let path = spec.output_path();
    write_rgba(&packed, &path, config).map_err(PackingError::Write)?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::LumaA;

    fn constant(width: u32, height: u32, luma: u8, alpha: u8) -> GrayAlphaImage {
        GrayAlphaImage::from_pixel(width, height, LumaA([luma, alpha]))
    }

    #[test]
    fn test_opaque_constant_sources() {
        let packed = pack_images(
            Some(constant(8, 8, 10, 255)),
            Some(constant(8, 8, 204, 255)),
            Some(constant(8, 8, 0, 255)),
            8,
            8,
        )
        .unwrap();

        for pixel in packed.pixels() {
            assert_eq!(pixel.0, [10, 204, 0, 255]);
        }
    }

    #[test]
    fn test_all_absent_is_transparent_black() {
        let packed = pack_images(None, None, None, 16, 4).unwrap();
        assert_eq!(packed.dimensions(), (16, 4));
        assert!(packed.pixels().all(|p| p.0 == [0, 0, 0, 0]));
    }

    #[test]
    fn test_alpha_is_max_of_slots() {
        let packed = pack_images(
            Some(constant(2, 2, 50, 10)),
            None,
            Some(constant(2, 2, 70, 200)),
            2,
            2,
        )
        .unwrap();
        assert_eq!(packed.get_pixel(1, 1).0, [50, 0, 70, 200]);
    }

    #[test]
    fn test_mismatched_sizes_are_resized() {
        let mut small = constant(2, 2, 0, 255);
        small.put_pixel(1, 0, LumaA([255, 255]));

        let packed = pack_images(Some(small), Some(constant(7, 3, 9, 9)), None, 4, 4).unwrap();
        assert_eq!(packed.dimensions(), (4, 4));
        // Nearest-neighbour: the top-right quadrant comes from source pixel (1, 0).
        assert_eq!(packed.get_pixel(3, 0).0[0], 255);
        assert_eq!(packed.get_pixel(0, 0).0[0], 0);
        assert_eq!(packed.get_pixel(2, 3).0[1], 9);
    }

    #[test]
    fn test_zero_size_rejected() {
        let err = pack_images(None, None, None, 0, 8).unwrap_err();
        assert!(matches!(err, PackingError::InvalidSize { width: 0, height: 8 }));
        assert_eq!(err.code(), "PACK_001");
    }

    #[test]
    fn test_pack_to_file_creates_output_dir() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("roughness.png");
        let gray = RgbaImage::from_pixel(4, 4, Rgba([204, 204, 204, 255]));
        write_rgba(&gray, &source, &PngConfig::default()).unwrap();

        let spec = PackedImageSpec::new(dir.path().join("out/deep"), "orm.png", 8, 8)
            .with_slot(ChannelSlot::Green, Some(source));
        let path = pack_to_file(&spec, &PngConfig::default()).unwrap();

        assert_eq!(path, dir.path().join("out/deep/orm.png"));
        let written = crate::png::read_rgba(&path).unwrap();
        assert_eq!(written.dimensions(), (8, 8));
        assert_eq!(written.get_pixel(5, 5).0, [0, 204, 0, 255]);
    }

    #[test]
    fn test_missing_source_reports_slot() {
        let dir = tempfile::tempdir().unwrap();
        let spec =
            PackedImageSpec::new(dir.path(), "orm.png", 4, 4).with_blue(dir.path().join("nope.png"));
        let err = pack(&spec).unwrap_err();
        assert!(matches!(
            err,
            PackingError::Load {
                slot: ChannelSlot::Blue,
                ..
            }
        ));
    }
}
