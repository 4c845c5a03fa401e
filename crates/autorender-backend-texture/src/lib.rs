//! Autorender Image Backend
//!
//! This crate holds the image work of the autorender pipeline that does not
//! need a render engine: packing grayscale maps into one texture, laying out
//! rendered frames as sprite sheets, and encoding PNGs deterministically.
//!
//! # Features
//!
//! - **Channel packing**: up to three luminance+alpha sources into RGB, alpha = max
//! - **Sprite sheets**: row-major grid layout with no padding or scaling
//! - **Deterministic PNG**: fixed encoder settings for byte-identical output
//!
//! # Example
//!
//! ```
//! use autorender_backend_texture::sheet::SheetLayout;
//!
//! let layout = SheetLayout::new(10, 64, 24).unwrap();
//! assert_eq!(layout.dimensions(), (640, 192));
//! assert_eq!(layout.origin(23), (192, 128));
//! ```

pub mod packing;
pub mod png;
pub mod sheet;

// Re-export main types for convenience
pub use packing::{pack, pack_images, pack_to_file, ChannelSlot, PackedImageSpec, PackingError};
pub use png::{PngConfig, PngError};
pub use sheet::{
    assemble, assemble_from_files, assemble_to_file, SheetError, SheetLayout, MAX_SHEET_SIZE,
};
