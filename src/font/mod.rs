//! Font loading, shaping and glyph caching
//!
//! Handles:
//! - Font face loading and rasterization (freetype)
//! - Text shaping (rustybuzz)
//! - Atlas slot allocation (fixed-grid shelf packing)
//! - Glyph cache (glyph index -> atlas slot + quad + bearings)
//! - The public [`Font`] lifecycle object
//! - System font discovery (fontconfig)

pub mod atlas;
pub mod cache;
pub mod fontconfig;
pub mod freetype;
pub mod instance;
pub mod shaper;

use std::path::Path;

use crate::error::Result;

pub use atlas::{AtlasAllocator, AtlasCell, CellSize};
pub use cache::{CacheEntry, GlyphCache};
pub use freetype::{FtFace, FtLibrary};
pub use instance::Font;
pub use shaper::HbShaper;

/// Pixel layout of a rasterized glyph bitmap
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    /// 8-bit grayscale coverage (the only format the atlas accepts)
    Gray8,
    /// 1-bit monochrome
    Mono,
    /// Horizontal LCD (3 bytes per pixel)
    Lcd,
    /// Vertical LCD (3 rows per pixel)
    LcdVertical,
    /// Color bitmap (emoji)
    Bgra,
    /// Anything else the rasterizer may report
    Other,
}

/// One rasterized glyph, as handed over by the rasterizer
#[derive(Debug, Clone)]
pub struct RasterGlyph {
    pub format: PixelFormat,
    /// Bitmap width (pixels)
    pub width: u32,
    /// Bitmap height (rows)
    pub rows: u32,
    /// Bytes per row; negative means rows are stored bottom-up
    pub pitch: i32,
    /// Distance from the pen to the bitmap's left edge
    pub left: i32,
    /// Distance from the baseline to the bitmap's top row
    pub top: i32,
    /// Raw rows in storage order, `|pitch|` bytes apart
    pub buffer: Vec<u8>,
}

impl RasterGlyph {
    /// Row length of the source buffer in pixels (one byte per pixel)
    pub fn row_length(&self) -> u32 {
        self.pitch.unsigned_abs()
    }

    /// True when the first stored row is the bottom of the glyph
    pub fn is_bottom_up(&self) -> bool {
        self.pitch < 0
    }

    /// Glyphs such as space have no pixels at all
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.rows == 0
    }

    /// Minimum buffer size for an upload of `width x rows` at this pitch
    pub fn required_len(&self) -> usize {
        if self.is_empty() {
            return 0;
        }
        (self.rows as usize - 1) * self.row_length() as usize + self.width as usize
    }
}

/// Face-wide metrics needed to size atlas cells
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FaceMetrics {
    /// Baseline-to-baseline distance (font units)
    pub height: i32,
    /// Largest advance width in the face (font units)
    pub max_advance_width: i32,
    pub units_per_em: u32,
    /// Vertical pixels per em at the current size
    pub y_ppem: u32,
}

impl FaceMetrics {
    /// Scale a font-unit metric to whole pixels, rounding up
    pub fn to_pixels(&self, metric: i32) -> u32 {
        if self.units_per_em == 0 {
            return 0;
        }
        let px = f64::from(metric) * f64::from(self.y_ppem) / f64::from(self.units_per_em);
        px.ceil().max(0.0) as u32
    }
}

/// One entry of shaping output; all values are 26.6 fixed point except the index
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShapedGlyph {
    /// Glyph index in the face (not a codepoint)
    pub glyph_index: u32,
    pub x_advance: i32,
    pub y_advance: i32,
    pub x_offset: i32,
    pub y_offset: i32,
}

/// A face that can produce glyph bitmaps
pub trait GlyphRasterizer {
    /// Select the pixel size for subsequent metrics and rasterization
    fn set_pixel_size(&mut self, pixel_size: u32) -> Result<()>;

    /// Metrics at the current pixel size
    fn metrics(&self) -> FaceMetrics;

    /// Render one glyph by index
    fn rasterize(&mut self, glyph_index: u32) -> Result<RasterGlyph>;
}

/// A face that can shape a UTF-8 run (left-to-right)
pub trait TextShaper {
    fn shape(&self, text: &str) -> Vec<ShapedGlyph>;
}

/// Process-wide font library: opens faces that both rasterize and shape
pub trait FontLibrary {
    type Face: GlyphRasterizer + TextShaper;

    fn open_face(&self, path: &Path) -> Result<Self::Face>;
}
