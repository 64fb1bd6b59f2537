//! Atlas slot allocator
//!
//! The cache texture is divided into a fixed grid of cells sized from the
//! face metrics. Glyphs are placed left-to-right on shelves of uniform height;
//! every glyph consumes a full cell column regardless of its actual width.
//! Nothing is ever evicted: once full, the atlas rejects new glyphs until it
//! is rebuilt.

use log::debug;

use super::FaceMetrics;
use crate::constants::MAX_SLOTS;
use crate::error::{Result, TextError};

/// Size of one atlas cell (pixels)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellSize {
    pub width: u32,
    pub height: u32,
}

impl CellSize {
    /// Cell from max advance width and line height at the current size
    pub fn from_metrics(metrics: &FaceMetrics) -> Self {
        Self {
            width: metrics.to_pixels(metrics.max_advance_width).max(1),
            height: metrics.to_pixels(metrics.height).max(1),
        }
    }
}

/// Placement of one glyph inside the atlas
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AtlasCell {
    /// Slot index (also the geometry slot)
    pub slot: usize,
    /// Top-left texel X
    pub x: u32,
    /// Top-left texel Y
    pub y: u32,
}

/// Monotonic shelf allocator over a W x H texture
#[derive(Debug, Clone)]
pub struct AtlasAllocator {
    width: u32,
    height: u32,
    cell: CellSize,
    capacity: usize,
    cursor_x: u32,
    cursor_y: u32,
    count: usize,
}

impl AtlasAllocator {
    pub fn new(width: u32, height: u32, cell: CellSize) -> Self {
        let cell = CellSize {
            width: cell.width.max(1),
            height: cell.height.max(1),
        };
        let columns = (width / cell.width) as usize;
        let rows = (height / cell.height) as usize;
        let capacity = (columns * rows).min(MAX_SLOTS);

        debug!(
            "Atlas {}x{}: cell {}x{}, {} slots",
            width, height, cell.width, cell.height, capacity
        );

        Self {
            width,
            height,
            cell,
            capacity,
            cursor_x: 0,
            cursor_y: 0,
            count: 0,
        }
    }

    /// Reserve the next cell for a bitmap of the given size
    ///
    /// Wraps to the next shelf when the bitmap would cross the right edge.
    /// State is only advanced on success.
    pub fn allocate(&mut self, bitmap_width: u32, bitmap_rows: u32) -> Result<AtlasCell> {
        if self.count >= self.capacity {
            return Err(TextError::CacheOverflow {
                capacity: self.capacity,
            });
        }

        let mut x = self.cursor_x;
        let mut y = self.cursor_y;
        if x + bitmap_width > self.width {
            x = 0;
            y += self.cell.height;
        }

        // Bitmap must stay inside the texture
        if x + bitmap_width > self.width || y + bitmap_rows.max(1) > self.height {
            return Err(TextError::CacheOverflow {
                capacity: self.capacity,
            });
        }

        self.cursor_x = x + self.cell.width;
        self.cursor_y = y;
        let slot = self.count;
        self.count += 1;

        Ok(AtlasCell { slot, x, y })
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of cells handed out
    pub fn count(&self) -> usize {
        self.count
    }

    pub fn is_full(&self) -> bool {
        self.count >= self.capacity
    }

    pub fn cell_size(&self) -> CellSize {
        self.cell
    }

    /// Texture dimensions (width, height)
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}
