//! Test doubles
//!
//! `RecordingDevice` logs every GPU call and tracks live objects so tests can
//! check draw counts, uploads and leaks without a GL context. `FakeLibrary`
//! opens scripted faces: glyph index equals the codepoint, metrics describe a
//! 1000-unit monospace face with a 600-unit advance, and a few characters
//! produce special bitmaps.

use std::cell::RefCell;
use std::collections::HashSet;
use std::path::Path;
use std::rc::Rc;

use crate::error::{Result, TextError};
use crate::font::shaper::units_to_26_6;
use crate::font::{
    FaceMetrics, FontLibrary, GlyphRasterizer, PixelFormat, RasterGlyph, ShapedGlyph, TextShaper,
};
use crate::gpu::device::{BufferTarget, GpuDevice, TexRegion};

#[derive(Debug, Clone, PartialEq)]
pub enum GpuCall {
    CreateProgram { attributes: Vec<(u32, String)> },
    DeleteProgram(u32),
    UseProgram(Option<u32>),
    Uniform1i { name: String, value: i32 },
    Uniform2i { name: String, x: i32, y: i32 },
    Uniform3f { name: String, x: f32, y: f32, z: f32 },
    CreateVertexArray(u32),
    BindVertexArray(Option<u32>),
    DeleteVertexArray(u32),
    CreateBuffer { target: BufferTarget, size: usize },
    BufferSubData { target: BufferTarget, offset: usize, len: usize },
    DeleteBuffer(u32),
    VertexAttribute { location: u32, components: i32, stride: usize, offset: usize },
    CreateTexture { width: u32, height: u32 },
    BindTexture { unit: u32, texture: Option<u32> },
    Upload { texture: u32, region: TexRegion, row_length: u32, pixels: Vec<u8> },
    DeleteTexture(u32),
    DrawIndexed { count: usize, first_index: usize },
}

#[derive(Default)]
struct DeviceLog {
    calls: Vec<GpuCall>,
    next_handle: u32,
    live: HashSet<u32>,
    /// Buffers that may still be created before creation starts failing
    buffers_before_failure: Option<usize>,
    fail_program: bool,
    fail_texture: bool,
}

/// GPU device that records calls instead of issuing them
#[derive(Clone, Default)]
pub struct RecordingDevice {
    log: Rc<RefCell<DeviceLog>>,
}

impl RecordingDevice {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<GpuCall> {
        self.log.borrow().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.log.borrow_mut().calls.clear();
    }

    /// Number of programs, buffers, vertex arrays and textures not yet deleted
    pub fn live_objects(&self) -> usize {
        self.log.borrow().live.len()
    }

    pub fn draws(&self) -> Vec<(usize, usize)> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                GpuCall::DrawIndexed { count, first_index } => Some((count, first_index)),
                _ => None,
            })
            .collect()
    }

    pub fn uploads(&self) -> Vec<(TexRegion, u32, Vec<u8>)> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                GpuCall::Upload {
                    region,
                    row_length,
                    pixels,
                    ..
                } => Some((region, row_length, pixels)),
                _ => None,
            })
            .collect()
    }

    pub fn program_compiles(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, GpuCall::CreateProgram { .. }))
            .count()
    }

    /// Let `n` more buffers be created, then fail
    pub fn fail_buffer_after(&self, n: usize) {
        self.log.borrow_mut().buffers_before_failure = Some(n);
    }

    pub fn fail_program(&self, fail: bool) {
        self.log.borrow_mut().fail_program = fail;
    }

    pub fn fail_texture(&self, fail: bool) {
        self.log.borrow_mut().fail_texture = fail;
    }

    fn record(&self, call: GpuCall) {
        self.log.borrow_mut().calls.push(call);
    }

    fn create_handle(&self) -> u32 {
        let mut log = self.log.borrow_mut();
        log.next_handle += 1;
        let handle = log.next_handle;
        log.live.insert(handle);
        handle
    }

    fn release(&self, handle: u32) {
        let mut log = self.log.borrow_mut();
        assert!(log.live.remove(&handle), "double delete of handle {}", handle);
    }
}

impl GpuDevice for RecordingDevice {
    type Program = u32;
    type Uniform = String;
    type Buffer = u32;
    type Texture = u32;
    type VertexArray = u32;

    fn create_program(&self, _vs: &str, _fs: &str, attributes: &[(u32, &str)]) -> Result<u32> {
        self.record(GpuCall::CreateProgram {
            attributes: attributes
                .iter()
                .map(|(loc, name)| (*loc, name.to_string()))
                .collect(),
        });
        if self.log.borrow().fail_program {
            return Err(TextError::Gpu("link failed".to_string()));
        }
        Ok(self.create_handle())
    }

    fn delete_program(&self, program: u32) {
        self.record(GpuCall::DeleteProgram(program));
        self.release(program);
    }

    fn use_program(&self, program: Option<u32>) {
        self.record(GpuCall::UseProgram(program));
    }

    fn uniform_location(&self, _program: u32, name: &str) -> Option<String> {
        Some(name.to_string())
    }

    fn uniform_1_i32(&self, location: &String, value: i32) {
        self.record(GpuCall::Uniform1i {
            name: location.clone(),
            value,
        });
    }

    fn uniform_2_i32(&self, location: &String, x: i32, y: i32) {
        self.record(GpuCall::Uniform2i {
            name: location.clone(),
            x,
            y,
        });
    }

    fn uniform_3_f32(&self, location: &String, x: f32, y: f32, z: f32) {
        self.record(GpuCall::Uniform3f {
            name: location.clone(),
            x,
            y,
            z,
        });
    }

    fn create_vertex_array(&self) -> Result<u32> {
        let vao = self.create_handle();
        self.record(GpuCall::CreateVertexArray(vao));
        Ok(vao)
    }

    fn bind_vertex_array(&self, vao: Option<u32>) {
        self.record(GpuCall::BindVertexArray(vao));
    }

    fn delete_vertex_array(&self, vao: u32) {
        self.record(GpuCall::DeleteVertexArray(vao));
        self.release(vao);
    }

    fn create_buffer(&self, target: BufferTarget, size: usize) -> Result<u32> {
        {
            let mut log = self.log.borrow_mut();
            match log.buffers_before_failure {
                Some(0) => return Err(TextError::Gpu("out of memory".to_string())),
                Some(ref mut n) => *n -= 1,
                None => {}
            }
        }
        self.record(GpuCall::CreateBuffer { target, size });
        Ok(self.create_handle())
    }

    fn buffer_sub_data(&self, target: BufferTarget, _buffer: u32, offset: usize, data: &[u8]) {
        self.record(GpuCall::BufferSubData {
            target,
            offset,
            len: data.len(),
        });
    }

    fn delete_buffer(&self, buffer: u32) {
        self.record(GpuCall::DeleteBuffer(buffer));
        self.release(buffer);
    }

    fn vertex_attribute(&self, location: u32, components: i32, stride: usize, offset: usize) {
        self.record(GpuCall::VertexAttribute {
            location,
            components,
            stride,
            offset,
        });
    }

    fn create_texture_r8(&self, width: u32, height: u32) -> Result<u32> {
        if self.log.borrow().fail_texture {
            return Err(TextError::Gpu("texture allocation failed".to_string()));
        }
        self.record(GpuCall::CreateTexture { width, height });
        Ok(self.create_handle())
    }

    fn bind_texture(&self, unit: u32, texture: Option<u32>) {
        self.record(GpuCall::BindTexture { unit, texture });
    }

    fn upload_r8(&self, texture: u32, region: TexRegion, row_length: u32, pixels: &[u8]) {
        self.record(GpuCall::Upload {
            texture,
            region,
            row_length,
            pixels: pixels.to_vec(),
        });
    }

    fn delete_texture(&self, texture: u32) {
        self.record(GpuCall::DeleteTexture(texture));
        self.release(texture);
    }

    fn draw_indexed(&self, count: usize, first_index: usize) {
        self.record(GpuCall::DrawIndexed { count, first_index });
    }
}

// ============================================================================
// Fake fonts
// ============================================================================

/// Path that `FakeLibrary` refuses to open
pub const MISSING_FONT: &str = "missing.ttf";

/// Rendered with no pixels
pub const EMPTY_GLYPH: char = ' ';
/// Rendered with negative pitch (rows stored bottom-up)
pub const BOTTOM_UP_GLYPH: char = 'v';
/// Rendered as a 1-bit bitmap
pub const MONO_GLYPH: char = '#';
/// Shaped with a (2px, 3px) offset
pub const OFFSET_GLYPH: char = '^';

const UNITS_PER_EM: u32 = 1000;
const ADVANCE_UNITS: i32 = 600;
const HEIGHT_UNITS: i32 = 1000;

#[derive(Default)]
struct FontLog {
    opens: usize,
    live_faces: usize,
    rasterizations: usize,
}

/// Font library producing scripted faces
#[derive(Clone, Default)]
pub struct FakeLibrary {
    log: Rc<RefCell<FontLog>>,
}

impl FakeLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn opens(&self) -> usize {
        self.log.borrow().opens
    }

    pub fn live_faces(&self) -> usize {
        self.log.borrow().live_faces
    }

    pub fn rasterizations(&self) -> usize {
        self.log.borrow().rasterizations
    }
}

impl FontLibrary for FakeLibrary {
    type Face = FakeFace;

    fn open_face(&self, path: &Path) -> Result<FakeFace> {
        if path == Path::new(MISSING_FONT) {
            return Err(TextError::Raster(format!("cannot open {}", path.display())));
        }
        let mut log = self.log.borrow_mut();
        log.opens += 1;
        log.live_faces += 1;
        Ok(FakeFace {
            log: Rc::clone(&self.log),
            size_px: 0,
        })
    }
}

pub struct FakeFace {
    log: Rc<RefCell<FontLog>>,
    size_px: u32,
}

impl FakeFace {
    /// Advance of every glyph at the current size (26.6)
    pub fn advance(&self) -> i32 {
        units_to_26_6(ADVANCE_UNITS, self.size_px, UNITS_PER_EM)
    }
}

impl Drop for FakeFace {
    fn drop(&mut self) {
        self.log.borrow_mut().live_faces -= 1;
    }
}

impl GlyphRasterizer for FakeFace {
    fn set_pixel_size(&mut self, pixel_size: u32) -> Result<()> {
        if pixel_size == 0 {
            return Err(TextError::Raster("pixel size must be non-zero".to_string()));
        }
        self.size_px = pixel_size;
        Ok(())
    }

    fn metrics(&self) -> FaceMetrics {
        FaceMetrics {
            height: HEIGHT_UNITS,
            max_advance_width: ADVANCE_UNITS,
            units_per_em: UNITS_PER_EM,
            y_ppem: self.size_px,
        }
    }

    fn rasterize(&mut self, glyph_index: u32) -> Result<RasterGlyph> {
        self.log.borrow_mut().rasterizations += 1;

        let ch = char::from_u32(glyph_index).unwrap_or('?');
        if ch == EMPTY_GLYPH {
            return Ok(RasterGlyph {
                format: PixelFormat::Gray8,
                width: 0,
                rows: 0,
                pitch: 0,
                left: 0,
                top: 0,
                buffer: Vec::new(),
            });
        }

        let width = self.size_px / 2;
        let rows = self.size_px * 3 / 4;
        let stride = width + 2;
        // Row r of the glyph (top = 0) is filled with a recognizable byte
        let row_bytes = |r: u32| vec![(glyph_index as u8).wrapping_add(r as u8); stride as usize];

        let (pitch, buffer): (i32, Vec<u8>) = if ch == BOTTOM_UP_GLYPH {
            (-(stride as i32), (0..rows).rev().flat_map(row_bytes).collect())
        } else {
            (stride as i32, (0..rows).flat_map(row_bytes).collect())
        };

        let format = if ch == MONO_GLYPH {
            PixelFormat::Mono
        } else {
            PixelFormat::Gray8
        };

        Ok(RasterGlyph {
            format,
            width,
            rows,
            pitch,
            left: 1,
            top: rows as i32 - 2,
            buffer,
        })
    }
}

impl TextShaper for FakeFace {
    fn shape(&self, text: &str) -> Vec<ShapedGlyph> {
        text.chars()
            .map(|ch| {
                let (x_offset, y_offset) = if ch == OFFSET_GLYPH {
                    (2 << 6, 3 << 6)
                } else {
                    (0, 0)
                };
                ShapedGlyph {
                    glyph_index: ch as u32,
                    x_advance: self.advance(),
                    y_advance: 0,
                    x_offset,
                    y_offset,
                }
            })
            .collect()
    }
}
