//! Global constants for gltext
//!
//! Atlas defaults, geometry layout and pen defaults shared across modules.

// ============================================================================
// Atlas Constants
// ============================================================================

/// Default cache texture edge length (pixels) when none is given
pub const DEFAULT_CACHE_SIZE: u32 = 256;

/// Upper bound on atlas slots: the last vertex of the last quad must fit a u16 index
pub const MAX_SLOTS: usize = (u16::MAX as usize + 1) / VERTICES_PER_GLYPH;

// ============================================================================
// Geometry Constants
// ============================================================================

/// Vertices per glyph quad
pub const VERTICES_PER_GLYPH: usize = 4;

/// Indices per glyph quad (2 triangles)
pub const INDICES_PER_GLYPH: usize = 6;

/// Per-vertex data: position(2) + UV(2)
pub const VERTEX_FLOATS: usize = 4;

/// Bytes per vertex
pub const VERTEX_STRIDE: usize = VERTEX_FLOATS * std::mem::size_of::<f32>();

/// Bytes of vertex data per slot
pub const SLOT_VERTEX_BYTES: usize = VERTICES_PER_GLYPH * VERTEX_STRIDE;

/// Bytes of index data per slot
pub const SLOT_INDEX_BYTES: usize = INDICES_PER_GLYPH * std::mem::size_of::<u16>();

// ============================================================================
// Shader Attribute Locations
// ============================================================================

/// Quad vertex position
pub const ATTRIB_POSITION: u32 = 0;

/// Atlas texture coordinate
pub const ATTRIB_TEXCOORD: u32 = 1;

/// Texture unit the atlas is bound to while drawing
pub const ATLAS_TEXTURE_UNIT: u32 = 0;

// ============================================================================
// Pen Defaults
// ============================================================================

/// Initial pen color (white)
pub const DEFAULT_PEN_COLOR: [f32; 3] = [1.0, 1.0, 1.0];

/// Bits of fraction in 26.6 fixed point
pub const FIXED_26_6_SHIFT: i32 = 6;
