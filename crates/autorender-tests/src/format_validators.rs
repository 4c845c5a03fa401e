//! Binary format validators for test infrastructure.
//!
//! These parse file headers of generated outputs and return structured
//! information, so tests can check format details without a full decoder.

use std::fmt;

/// Error type for format validation failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatError {
    /// The format being validated.
    pub format: &'static str,
    /// Description of what went wrong.
    pub message: String,
    /// Byte offset where the error occurred, if applicable.
    pub offset: Option<usize>,
}

impl FormatError {
    /// Create a new format error.
    pub fn new(format: &'static str, message: impl Into<String>) -> Self {
        Self {
            format,
            message: message.into(),
            offset: None,
        }
    }

    /// Create a format error with a byte offset.
    pub fn at_offset(format: &'static str, message: impl Into<String>, offset: usize) -> Self {
        Self {
            format,
            message: message.into(),
            offset: Some(offset),
        }
    }
}

impl fmt::Display for FormatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(offset) = self.offset {
            write!(f, "{} error at offset {}: {}", self.format, offset, self.message)
        } else {
            write!(f, "{} error: {}", self.format, self.message)
        }
    }
}

impl std::error::Error for FormatError {}

/// Information extracted from a PNG IHDR chunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PngInfo {
    /// Image width in pixels.
    pub width: u32,
    /// Image height in pixels.
    pub height: u32,
    /// Bit depth (1, 2, 4, 8, or 16).
    pub bit_depth: u8,
    /// Color type (0=grayscale, 2=RGB, 3=indexed, 4=grayscale+alpha, 6=RGBA).
    pub color_type: u8,
    /// Interlace method (0 = none, 1 = Adam7).
    pub interlace_method: u8,
}

impl PngInfo {
    /// Returns true for 8-bit RGBA without interlacing.
    pub fn is_rgba8(&self) -> bool {
        self.color_type == 6 && self.bit_depth == 8 && self.interlace_method == 0
    }
}

/// Validate PNG file format and extract IHDR information.
pub fn validate_png(data: &[u8]) -> Result<PngInfo, FormatError> {
    const PNG_SIGNATURE: [u8; 8] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];
    const MIN_HEADER_SIZE: usize = 8 + 8 + 13; // signature + chunk header + IHDR data

    if data.len() < MIN_HEADER_SIZE {
        return Err(FormatError::new(
            "PNG",
            format!(
                "File too short: {} bytes (minimum {} required)",
                data.len(),
                MIN_HEADER_SIZE
            ),
        ));
    }

    if data[0..8] != PNG_SIGNATURE {
        return Err(FormatError::at_offset("PNG", "Invalid PNG signature", 0));
    }

    let chunk_length = u32::from_be_bytes([data[8], data[9], data[10], data[11]]);
    if &data[12..16] != b"IHDR" {
        return Err(FormatError::at_offset(
            "PNG",
            format!("First chunk must be IHDR, got {:?}", &data[12..16]),
            12,
        ));
    }
    if chunk_length != 13 {
        return Err(FormatError::at_offset(
            "PNG",
            format!("IHDR chunk must be 13 bytes, got {}", chunk_length),
            8,
        ));
    }

    let ihdr = &data[16..29];
    let width = u32::from_be_bytes([ihdr[0], ihdr[1], ihdr[2], ihdr[3]]);
    let height = u32::from_be_bytes([ihdr[4], ihdr[5], ihdr[6], ihdr[7]]);
    if width == 0 || height == 0 {
        return Err(FormatError::new(
            "PNG",
            format!("Invalid dimensions: {}x{}", width, height),
        ));
    }

    Ok(PngInfo {
        width,
        height,
        bit_depth: ihdr[8],
        color_type: ihdr[9],
        interlace_method: ihdr[12],
    })
}

/// Information extracted from a GLB container.
#[derive(Debug, Clone, PartialEq)]
pub struct GlbInfo {
    /// glTF version (should be 2).
    pub version: u32,
    /// Total file length in bytes.
    pub length: u32,
    /// Parsed JSON chunk.
    pub json: serde_json::Value,
    /// Length of the binary chunk (if present).
    pub bin_chunk_length: Option<u32>,
}

impl GlbInfo {
    /// Names of the animations in the JSON chunk, in order.
    pub fn animation_names(&self) -> Vec<String> {
        self.json["animations"]
            .as_array()
            .map(|anims| {
                anims
                    .iter()
                    .filter_map(|a| a["name"].as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Validate GLB (glTF Binary) file format and parse its JSON chunk.
pub fn validate_glb(data: &[u8]) -> Result<GlbInfo, FormatError> {
    const GLB_MAGIC: &[u8; 4] = b"glTF";
    const HEADER_SIZE: usize = 12;
    const CHUNK_HEADER_SIZE: usize = 8;
    const JSON_CHUNK_TYPE: u32 = 0x4E4F534A; // "JSON" in little-endian
    const BIN_CHUNK_TYPE: u32 = 0x004E4942; // "BIN\0" in little-endian

    let read_u32 = |at: usize| u32::from_le_bytes([data[at], data[at + 1], data[at + 2], data[at + 3]]);

    if data.len() < HEADER_SIZE + CHUNK_HEADER_SIZE {
        return Err(FormatError::new(
            "GLB",
            format!("File too short: {} bytes", data.len()),
        ));
    }
    if &data[0..4] != GLB_MAGIC {
        return Err(FormatError::at_offset(
            "GLB",
            format!("Invalid GLB magic: expected 'glTF', got {:?}", &data[0..4]),
            0,
        ));
    }

    let version = read_u32(4);
    if version != 2 {
        return Err(FormatError::at_offset(
            "GLB",
            format!("Unsupported GLB version: {} (expected 2)", version),
            4,
        ));
    }

    let length = read_u32(8);
    if length as usize != data.len() {
        return Err(FormatError::new(
            "GLB",
            format!("Declared length {} does not match file size {}", length, data.len()),
        ));
    }

    let json_length = read_u32(12) as usize;
    if read_u32(16) != JSON_CHUNK_TYPE {
        return Err(FormatError::at_offset("GLB", "First chunk must be JSON", 16));
    }
    let json_start = HEADER_SIZE + CHUNK_HEADER_SIZE;
    let json_end = json_start + json_length;
    if json_end > data.len() {
        return Err(FormatError::at_offset("GLB", "JSON chunk exceeds file size", 12));
    }
    let json: serde_json::Value = serde_json::from_slice(&data[json_start..json_end])
        .map_err(|e| FormatError::at_offset("GLB", format!("Invalid JSON chunk: {}", e), json_start))?;

    let mut bin_chunk_length = None;
    if json_end + CHUNK_HEADER_SIZE <= data.len() && read_u32(json_end + 4) == BIN_CHUNK_TYPE {
        bin_chunk_length = Some(read_u32(json_end));
    }

    Ok(GlbInfo {
        version,
        length,
        json,
        bin_chunk_length,
    })
}
