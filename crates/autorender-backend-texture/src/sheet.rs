//! Sprite sheet grid layout and assembly.
//!
//! Frames are laid out row-major on a grid of square tiles: frame `i` goes to
//! row `i / columns`, column `i % columns`. There is no padding and frames
//! are never scaled. A frame larger than the tile is clipped to it; a smaller
//! one leaves the rest of the tile transparent.

use std::path::{Path, PathBuf};

use autorender_spec::BackendError;
use image::imageops;
use image::RgbaImage;
use thiserror::Error;

use crate::png::{read_rgba, write_rgba, PngConfig, PngError};

/// Errors from sprite sheet assembly.
#[derive(Debug, Error)]
pub enum SheetError {
    #[error("sheet must have at least one column")]
    ZeroColumns,

    #[error("tile size must be greater than 0")]
    ZeroTileSize,

    #[error("no frames to assemble")]
    NoFrames,

    #[error("sheet of {columns}x{rows} tiles of {tile_size}px exceeds {max}px per edge")]
    TooLarge {
        columns: u32,
        rows: usize,
        tile_size: u32,
        max: u32,
    },

    #[error("layout expects {expected} frames, got {actual}")]
    FrameCountMismatch { expected: usize, actual: usize },

    #[error("failed to load frame {index}: {source}")]
    Load {
        index: usize,
        #[source]
        source: PngError,
    },

    #[error("failed to write sheet: {0}")]
    Write(#[source] PngError),
}

impl BackendError for SheetError {
    fn code(&self) -> &'static str {
        match self {
            SheetError::ZeroColumns => "SHEET_001",
            SheetError::ZeroTileSize => "SHEET_002",
            SheetError::NoFrames => "SHEET_003",
            SheetError::FrameCountMismatch { .. } => "SHEET_004",
            SheetError::Load { .. } => "SHEET_005",
            SheetError::Write(_) => "SHEET_006",
            SheetError::TooLarge { .. } => "SHEET_007",
        }
    }

    fn category(&self) -> &'static str {
        "texture"
    }
}

pub use autorender_spec::validation::MAX_SHEET_SIZE;

/// Grid placement of `frame_count` square tiles in rows of `columns`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SheetLayout {
    /// Tiles per row.
    pub columns: u32,
    /// Tile edge length in pixels.
    pub tile_size: u32,
    /// Number of frames placed.
    pub frame_count: usize,
}

impl SheetLayout {
    /// Creates a layout.
    pub fn new(columns: u32, tile_size: u32, frame_count: usize) -> Result<Self, SheetError> {
        if columns == 0 {
            return Err(SheetError::ZeroColumns);
        }
        if tile_size == 0 {
            return Err(SheetError::ZeroTileSize);
        }
        if frame_count == 0 {
            return Err(SheetError::NoFrames);
        }

        let rows = frame_count.div_ceil(columns as usize);
        let edge = |tiles: usize| {
            u32::try_from(tiles)
                .ok()
                .and_then(|t| t.checked_mul(tile_size))
                .filter(|&px| px <= MAX_SHEET_SIZE)
        };
        if edge(columns as usize).is_none() || edge(rows).is_none() {
            return Err(SheetError::TooLarge {
                columns,
                rows,
                tile_size,
                max: MAX_SHEET_SIZE,
            });
        }
        Ok(Self {
            columns,
            tile_size,
            frame_count,
        })
    }

    /// Number of rows, `ceil(frame_count / columns)`.
    pub fn rows(&self) -> u32 {
        let columns = self.columns as usize;
        self.frame_count.div_ceil(columns) as u32
    }

    /// `(row, column)` of frame `index`.
    pub fn cell(&self, index: usize) -> (u32, u32) {
        let columns = self.columns as usize;
        ((index / columns) as u32, (index % columns) as u32)
    }

    /// Top-left pixel of frame `index`.
    pub fn origin(&self, index: usize) -> (u32, u32) {
        let (row, col) = self.cell(index);
        (col * self.tile_size, row * self.tile_size)
    }

    /// Sheet size in pixels, `(columns * tile, rows * tile)`.
    ///
    /// Both edges are at most [`MAX_SHEET_SIZE`].
    pub fn dimensions(&self) -> (u32, u32) {
        (self.columns * self.tile_size, self.rows() * self.tile_size)
    }
}

/// Pastes `frames` onto a transparent sheet according to `layout`.
pub fn assemble(layout: &SheetLayout, frames: &[RgbaImage]) -> Result<RgbaImage, SheetError> {
    if frames.len() != layout.frame_count {
        return Err(SheetError::FrameCountMismatch {
            expected: layout.frame_count,
            actual: frames.len(),
        });
    }

    let (width, height) = layout.dimensions();
    let mut sheet = RgbaImage::new(width, height);
    let tile = layout.tile_size;

    for (index, frame) in frames.iter().enumerate() {
        let (x, y) = layout.origin(index);
        if frame.width() > tile || frame.height() > tile {
            let clipped = imageops::crop_imm(
                frame,
                0,
                0,
                frame.width().min(tile),
                frame.height().min(tile),
            )
            .to_image();
            imageops::replace(&mut sheet, &clipped, i64::from(x), i64::from(y));
        } else {
            imageops::replace(&mut sheet, frame, i64::from(x), i64::from(y));
        }
    }

    Ok(sheet)
}

/// Loads frame images from disk and assembles them in the given order.
pub fn assemble_from_files(
    columns: u32,
    tile_size: u32,
    frames: &[PathBuf],
) -> Result<(SheetLayout, RgbaImage), SheetError> {
    let layout = SheetLayout::new(columns, tile_size, frames.len())?;
    let images = frames
        .iter()
        .enumerate()
        .map(|(index, path)| read_rgba(path).map_err(|source| SheetError::Load { index, source }))
        .collect::<Result<Vec<_>, _>>()?;
    let sheet = assemble(&layout, &images)?;
    Ok((layout, sheet))
}

/// Assembles frame files into a sheet and writes it to `output`.
pub fn assemble_to_file(
    columns: u32,
    tile_size: u32,
    frames: &[PathBuf],
    output: &Path,
    config: &PngConfig,
) -> Result<SheetLayout, SheetError> {
    let (layout, sheet) = assemble_from_files(columns, tile_size, frames)?;
    write_rgba(&sheet, output, config).map_err(SheetError::Write)?;
    log::debug!(
        "wrote {}x{} sheet with {} frames to {}",
        sheet.width(),
        sheet.height(),
        layout.frame_count,
        output.display()
    );
    Ok(layout)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;
    use pretty_assertions::assert_eq;

    fn solid(size: u32, value: u8) -> RgbaImage {
        RgbaImage::from_pixel(size, size, Rgba([value, value, value, 255]))
    }

    #[test]
    fn test_layout_24_frames_10_columns() {
        let layout = SheetLayout::new(10, 32, 24).unwrap();
        assert_eq!(layout.rows(), 3);
        assert_eq!(layout.dimensions(), (320, 96));
        assert_eq!(layout.cell(23), (2, 3));
        assert_eq!(layout.origin(23), (3 * 32, 2 * 32));
        assert_eq!(layout.origin(0), (0, 0));
        assert_eq!(layout.origin(10), (0, 32));
    }

    #[test]
    fn test_layout_width_is_fixed_by_columns() {
        let layout = SheetLayout::new(8, 16, 3).unwrap();
        assert_eq!(layout.dimensions(), (128, 16));
    }

    #[test]
    fn test_layout_rejects_degenerate_input() {
        assert!(matches!(SheetLayout::new(0, 8, 1), Err(SheetError::ZeroColumns)));
        assert!(matches!(SheetLayout::new(1, 0, 1), Err(SheetError::ZeroTileSize)));
        assert!(matches!(SheetLayout::new(1, 8, 0), Err(SheetError::NoFrames)));
    }

    #[test]
    fn test_layout_rejects_oversized_sheet() {
        let err = SheetLayout::new(1_000_000, 8192, 23).unwrap_err();
        assert!(matches!(err, SheetError::TooLarge { rows: 1, .. }));
        assert_eq!(err.code(), "SHEET_007");

        // One column, many rows.
        assert!(matches!(
            SheetLayout::new(1, 1024, 17),
            Err(SheetError::TooLarge { rows: 17, .. })
        ));
        assert!(matches!(
            SheetLayout::new(u32::MAX, u32::MAX, usize::MAX),
            Err(SheetError::TooLarge { .. })
        ));

        let edge = SheetLayout::new(16, 1024, 256).unwrap();
        assert_eq!(edge.dimensions(), (MAX_SHEET_SIZE, MAX_SHEET_SIZE));
    }

    #[test]
    fn test_assemble_places_frames() {
        let layout = SheetLayout::new(2, 4, 3).unwrap();
        let frames = vec![solid(4, 10), solid(4, 20), solid(4, 30)];
        let sheet = assemble(&layout, &frames).unwrap();

        assert_eq!(sheet.dimensions(), (8, 8));
        assert_eq!(sheet.get_pixel(1, 1).0, [10, 10, 10, 255]);
        assert_eq!(sheet.get_pixel(5, 1).0, [20, 20, 20, 255]);
        assert_eq!(sheet.get_pixel(1, 5).0, [30, 30, 30, 255]);
        // Unused cell stays transparent.
        assert_eq!(sheet.get_pixel(6, 6).0, [0, 0, 0, 0]);
    }

    #[test]
    fn test_oversized_frame_is_clipped_to_tile() {
        let layout = SheetLayout::new(2, 4, 2).unwrap();
        let frames = vec![solid(6, 99), solid(2, 50)];
        let sheet = assemble(&layout, &frames).unwrap();

        // The first frame does not bleed into the second tile.
        assert_eq!(sheet.get_pixel(4, 0).0, [50, 50, 50, 255]);
        assert_eq!(sheet.get_pixel(3, 3).0, [99, 99, 99, 255]);
        // The undersized second frame leaves transparency.
        assert_eq!(sheet.get_pixel(7, 3).0, [0, 0, 0, 0]);
    }

    #[test]
    fn test_frame_count_mismatch() {
        let layout = SheetLayout::new(2, 4, 3).unwrap();
        let err = assemble(&layout, &[solid(4, 1)]).unwrap_err();
        assert!(matches!(
            err,
            SheetError::FrameCountMismatch {
                expected: 3,
                actual: 1
            }
        ));
    }

    #[test]
    fn test_assemble_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut paths = Vec::new();
        for i in 0..5u8 {
            let path = dir.path().join(format!("frame_{:04}.png", i));
            write_rgba(&solid(8, i * 40), &path, &PngConfig::default()).unwrap();
            paths.push(path);
        }

        let output = dir.path().join("sheet.png");
        let layout = assemble_to_file(4, 8, &paths, &output, &PngConfig::default()).unwrap();
        assert_eq!(layout.dimensions(), (32, 16));

        let sheet = read_rgba(&output).unwrap();
        assert_eq!(sheet.dimensions(), (32, 16));
        assert_eq!(sheet.get_pixel(0, 8).0, [160, 160, 160, 255]);
    }

    #[test]
    fn test_missing_frame_reports_index() {
        let dir = tempfile::tempdir().unwrap();
        let paths = vec![dir.path().join("missing.png")];
        let err = assemble_from_files(1, 8, &paths).unwrap_err();
        assert!(matches!(err, SheetError::Load { index: 0, .. }));
    }
}
