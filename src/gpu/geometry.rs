//! Per-font quad storage
//!
//! Vertex and index buffers are sized for every atlas slot up front. A slot's
//! quad is written once, when its glyph is cached, and never touched again;
//! drawing a glyph is a 6-index draw at `slot * 6`.

use log::debug;

use super::device::{BufferTarget, GpuDevice};
use crate::constants::{
    ATTRIB_POSITION, ATTRIB_TEXCOORD, INDICES_PER_GLYPH, SLOT_INDEX_BYTES, SLOT_VERTEX_BYTES,
    VERTEX_STRIDE, VERTICES_PER_GLYPH,
};
use crate::error::{Result, TextError};
use crate::font::AtlasCell;

/// Quad vertex: local position (pixels) + atlas UV
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GlyphVertex {
    pub x: f32,
    pub y: f32,
    pub s: f32,
    pub t: f32,
}

/// Four vertices of one glyph: bottom-left, bottom-right, top-left, top-right
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GlyphQuad {
    pub vertices: [GlyphVertex; VERTICES_PER_GLYPH],
}

impl GlyphQuad {
    /// Build the quad for a `width x rows` bitmap stored at `cell`
    ///
    /// `bottom_up` flips the vertical texture mapping so the glyph appears
    /// upright whichever row order the rasterizer used.
    pub fn new(
        cell: &AtlasCell,
        width: u32,
        rows: u32,
        bottom_up: bool,
        atlas_width: u32,
        atlas_height: u32,
    ) -> Self {
        let aw = atlas_width.max(1) as f32;
        let ah = atlas_height.max(1) as f32;

        let s0 = cell.x as f32 / aw;
        let s1 = (cell.x + width) as f32 / aw;
        let t_first = cell.y as f32 / ah;
        let t_last = (cell.y + rows) as f32 / ah;

        // First stored row is the top of the glyph unless bottom_up
        let (t_bottom, t_top) = if bottom_up {
            (t_first, t_last)
        } else {
            (t_last, t_first)
        };

        let w = width as f32;
        let h = rows as f32;
        Self {
            vertices: [
                GlyphVertex { x: 0.0, y: 0.0, s: s0, t: t_bottom },
                GlyphVertex { x: w, y: 0.0, s: s1, t: t_bottom },
                GlyphVertex { x: 0.0, y: h, s: s0, t: t_top },
                GlyphVertex { x: w, y: h, s: s1, t: t_top },
            ],
        }
    }

    fn to_bytes(&self) -> Vec<u8> {
        self.vertices
            .iter()
            .flat_map(|v| [v.x, v.y, v.s, v.t])
            .flat_map(f32::to_ne_bytes)
            .collect()
    }
}

/// Two triangles (BL, TL, TR) and (BL, TR, BR) for a slot
pub fn quad_indices(slot: usize) -> [u16; INDICES_PER_GLYPH] {
    let base = (slot * VERTICES_PER_GLYPH) as u16;
    [0, 2, 3, 0, 3, 1].map(|i| base + i)
}

/// Vertex array + vertex/index buffers covering every slot
pub struct GeometryBuffer<D: GpuDevice> {
    vao: D::VertexArray,
    vbo: D::Buffer,
    ibo: D::Buffer,
    capacity: usize,
    written: Vec<bool>,
}

impl<D: GpuDevice> GeometryBuffer<D> {
    /// Allocate storage for `capacity` quads
    pub fn new(device: &D, capacity: usize) -> Result<Self> {
        let vao = device.create_vertex_array()?;
        device.bind_vertex_array(Some(vao));

        let vbo = match device.create_buffer(BufferTarget::Vertex, capacity * SLOT_VERTEX_BYTES) {
            Ok(b) => b,
            Err(e) => {
                device.bind_vertex_array(None);
                device.delete_vertex_array(vao);
                return Err(e);
            }
        };

        // a_pos: vec2 at offset 0, a_uv: vec2 at offset 8
        device.vertex_attribute(ATTRIB_POSITION, 2, VERTEX_STRIDE, 0);
        device.vertex_attribute(ATTRIB_TEXCOORD, 2, VERTEX_STRIDE, 2 * std::mem::size_of::<f32>());

        let ibo = match device.create_buffer(BufferTarget::Index, capacity * SLOT_INDEX_BYTES) {
            Ok(b) => b,
            Err(e) => {
                device.bind_vertex_array(None);
                device.delete_buffer(vbo);
                device.delete_vertex_array(vao);
                return Err(e);
            }
        };

        device.bind_vertex_array(None);
        debug!("Geometry buffer allocated: {} slots", capacity);

        Ok(Self {
            vao,
            vbo,
            ibo,
            capacity,
            written: vec![false; capacity],
        })
    }

    /// Write the quad and indices for `slot` (once per slot)
    pub fn write(&mut self, device: &D, slot: usize, quad: &GlyphQuad) -> Result<()> {
        if slot >= self.capacity {
            return Err(TextError::Gpu(format!(
                "geometry slot {} out of range ({} slots)",
                slot, self.capacity
            )));
        }
        if self.written[slot] {
            return Err(TextError::Gpu(format!("geometry slot {} already written", slot)));
        }

        let indices: Vec<u8> = quad_indices(slot)
            .iter()
            .flat_map(|i| i.to_ne_bytes())
            .collect();

        // Index buffer binding is vertex array state
        device.bind_vertex_array(Some(self.vao));
        device.buffer_sub_data(
            BufferTarget::Vertex,
            self.vbo,
            slot * SLOT_VERTEX_BYTES,
            &quad.to_bytes(),
        );
        device.buffer_sub_data(BufferTarget::Index, self.ibo, slot * SLOT_INDEX_BYTES, &indices);
        device.bind_vertex_array(None);

        self.written[slot] = true;
        Ok(())
    }

    /// Bind the vertex array for drawing
    pub fn bind(&self, device: &D) {
        device.bind_vertex_array(Some(self.vao));
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn is_written(&self, slot: usize) -> bool {
        self.written.get(slot).copied().unwrap_or(false)
    }

    /// Release resources
    pub fn destroy(&self, device: &D) {
        device.delete_buffer(self.ibo);
        device.delete_buffer(self.vbo);
        device.delete_vertex_array(self.vao);
    }
}
