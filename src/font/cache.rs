//! Glyph cache
//!
//! Maps glyph indices to atlas slots. A glyph is rasterized, uploaded and
//! given geometry the first time it is seen; every later lookup is a hash-map
//! hit. Entries are never removed.

use log::{debug, info};
use std::collections::HashMap;

use super::atlas::{AtlasAllocator, CellSize};
use super::{FaceMetrics, GlyphRasterizer, PixelFormat};
use crate::constants::ATLAS_TEXTURE_UNIT;
use crate::error::{Result, TextError};
use crate::gpu::device::{GpuDevice, TexRegion};
use crate::gpu::geometry::{GeometryBuffer, GlyphQuad};

/// A cached glyph
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheEntry {
    /// Atlas and geometry slot
    pub slot: usize,
    /// Pen to bitmap left edge (pixels)
    pub bearing_x: i32,
    /// Baseline to bitmap bottom edge (pixels)
    pub bearing_y: i32,
}

/// Atlas texture, geometry and the glyph -> slot map of one font
pub struct GlyphCache<D: GpuDevice> {
    entries: HashMap<u32, CacheEntry>,
    allocator: AtlasAllocator,
    geometry: GeometryBuffer<D>,
    texture: D::Texture,
}

impl<D: GpuDevice> GlyphCache<D> {
    /// Create an empty cache of `width x height` texels for the given face metrics
    pub fn new(device: &D, metrics: &FaceMetrics, width: u32, height: u32) -> Result<Self> {
        let allocator = AtlasAllocator::new(width, height, CellSize::from_metrics(metrics));

        let texture = device.create_texture_r8(width, height)?;
        let geometry = match GeometryBuffer::new(device, allocator.capacity()) {
            Ok(g) => g,
            Err(e) => {
                device.delete_texture(texture);
                return Err(e);
            }
        };

        let cell = allocator.cell_size();
        info!(
            "Glyph cache created: {}x{} atlas, cell {}x{}, {} slots",
            width,
            height,
            cell.width,
            cell.height,
            allocator.capacity()
        );

        Ok(Self {
            entries: HashMap::new(),
            allocator,
            geometry,
            texture,
        })
    }

    /// Return the entry for `glyph_index`, caching the glyph if needed
    ///
    /// A glyph that fails (overflow, wrong bitmap format) is not cached and
    /// does not consume a slot.
    pub fn resolve<R>(&mut self, device: &D, rasterizer: &mut R, glyph_index: u32) -> Result<CacheEntry>
    where
        R: GlyphRasterizer + ?Sized,
    {
        if let Some(entry) = self.entries.get(&glyph_index) {
            return Ok(*entry);
        }

        if self.allocator.is_full() {
            return Err(TextError::CacheOverflow {
                capacity: self.allocator.capacity(),
            });
        }

        let bitmap = rasterizer.rasterize(glyph_index)?;

        if !bitmap.is_empty() && bitmap.format != PixelFormat::Gray8 {
            return Err(TextError::UnsupportedGlyphFormat {
                glyph: glyph_index,
                format: bitmap.format,
            });
        }
        if bitmap.buffer.len() < bitmap.required_len() {
            return Err(TextError::Raster(format!(
                "glyph {} bitmap truncated: {} bytes, need {}",
                glyph_index,
                bitmap.buffer.len(),
                bitmap.required_len()
            )));
        }

        let cell = self.allocator.allocate(bitmap.width, bitmap.rows)?;

        if !bitmap.is_empty() {
            let region = TexRegion {
                x: cell.x,
                y: cell.y,
                width: bitmap.width,
                height: bitmap.rows,
            };
            device.upload_r8(self.texture, region, bitmap.row_length(), &bitmap.buffer);
        }

        let (atlas_width, atlas_height) = self.allocator.dimensions();
        let quad = GlyphQuad::new(
            &cell,
            bitmap.width,
            bitmap.rows,
            bitmap.is_bottom_up(),
            atlas_width,
            atlas_height,
        );
        self.geometry.write(device, cell.slot, &quad)?;

        let entry = CacheEntry {
            slot: cell.slot,
            bearing_x: bitmap.left,
            bearing_y: bitmap.top - bitmap.rows as i32,
        };
        self.entries.insert(glyph_index, entry);

        debug!(
            "Glyph {} cached: slot {} at ({}, {}), {}x{}",
            glyph_index, cell.slot, cell.x, cell.y, bitmap.width, bitmap.rows
        );

        Ok(entry)
    }

    /// Lookup without caching
    pub fn get(&self, glyph_index: u32) -> Option<CacheEntry> {
        self.entries.get(&glyph_index).copied()
    }

    /// Number of cached glyphs
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.allocator.capacity()
    }

    pub fn cell_size(&self) -> CellSize {
        self.allocator.cell_size()
    }

    /// Atlas texture dimensions (width, height)
    pub fn atlas_size(&self) -> (u32, u32) {
        self.allocator.dimensions()
    }

    /// Bind atlas texture and geometry for drawing
    pub fn bind(&self, device: &D) {
        device.bind_texture(ATLAS_TEXTURE_UNIT, Some(self.texture));
        self.geometry.bind(device);
    }

    /// Release resources
    pub fn destroy(&self, device: &D) {
        self.geometry.destroy(device);
        device.delete_texture(self.texture);
    }
}
