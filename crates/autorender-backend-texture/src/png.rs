//! Deterministic PNG reading and writing.
//!
//! Writes use fixed compression settings so that identical pixels always
//! encode to identical bytes, which keeps output hashes stable between runs.

use std::io::Write;
use std::path::{Path, PathBuf};

use autorender_spec::BackendError;
use image::{GrayAlphaImage, RgbaImage};
use png::{BitDepth, ColorType, Compression, Encoder, FilterType};
use thiserror::Error;

/// Errors from PNG operations.
#[derive(Debug, Error)]
pub enum PngError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("PNG encoding error: {0}")]
    Encoding(#[from] png::EncodingError),

    #[error("failed to decode {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("Invalid dimensions: {0}")]
    InvalidDimensions(String),
}

impl BackendError for PngError {
    fn code(&self) -> &'static str {
        match self {
            PngError::Io { .. } => "PNG_001",
            PngError::Encoding(_) => "PNG_002",
            PngError::Decode { .. } => "PNG_003",
            PngError::InvalidDimensions(_) => "PNG_004",
        }
    }

    fn category(&self) -> &'static str {
        "texture"
    }
}

/// PNG export configuration for deterministic output.
#[derive(Debug, Clone)]
pub struct PngConfig {
    /// Compression level. Use a fixed value for determinism.
    pub compression: Compression,
    /// Filter type. Use a fixed value for determinism.
    pub filter: FilterType,
}

impl Default for PngConfig {
    fn default() -> Self {
        Self {
            compression: Compression::Default,
            filter: FilterType::NoFilter,
        }
    }
}

/// Write an RGBA image to a PNG file, creating parent directories.
pub fn write_rgba(image: &RgbaImage, path: &Path, config: &PngConfig) -> Result<(), PngError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|source| PngError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    let file = std::fs::File::create(path).map_err(|source| PngError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let writer = std::io::BufWriter::new(file);

    write_rgba_to_writer(image, writer, config)
}

/// Write an RGBA image to any writer.
pub fn write_rgba_to_writer<W: Write>(
    image: &RgbaImage,
    writer: W,
    config: &PngConfig,
) -> Result<(), PngError> {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return Err(PngError::InvalidDimensions(format!(
            "cannot encode a {}x{} image",
            width, height
        )));
    }

    let mut encoder = Encoder::new(writer, width, height);
    encoder.set_color(ColorType::Rgba);
    encoder.set_depth(BitDepth::Eight);
    encoder.set_compression(config.compression);
    encoder.set_filter(config.filter);

    // The png crate writes no timestamp chunk unless asked to.
    let mut png_writer = encoder.write_header()?;
    png_writer.write_image_data(image.as_raw())?;

    Ok(())
}

/// Write to a `Vec<u8>` and return the bytes with their hash.
pub fn write_rgba_to_vec_with_hash(
    image: &RgbaImage,
    config: &PngConfig,
) -> Result<(Vec<u8>, String), PngError> {
    let mut data = Vec::new();
    write_rgba_to_writer(image, &mut data, config)?;
    let hash = hash_bytes(&data);
    Ok((data, hash))
}

/// Compute the BLAKE3 hash of encoded data.
pub fn hash_bytes(data: &[u8]) -> String {
    blake3::hash(data).to_hex().to_string()
}

/// Compute the BLAKE3 hash of a file's contents.
pub fn hash_file(path: &Path) -> Result<String, PngError> {
    let data = std::fs::read(path).map_err(|source| PngError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(hash_bytes(&data))
}

fn open(path: &Path) -> Result<image::DynamicImage, PngError> {
    image::open(path).map_err(|source| PngError::Decode {
        path: path.to_path_buf(),
        source,
    })
}

/// Read any supported image file as 8-bit RGBA.
pub fn read_rgba(path: &Path) -> Result<RgbaImage, PngError> {
    Ok(open(path)?.to_rgba8())
}

/// Read any supported image file as 8-bit luminance plus alpha.
pub fn read_luma_alpha(path: &Path) -> Result<GrayAlphaImage, PngError> {
    Ok(open(path)?.to_luma_alpha8())
}
