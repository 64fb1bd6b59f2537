//! GPU device abstraction
//!
//! The narrow set of GL operations the glyph pipeline needs, expressed as a
//! trait so the cache and renderer can be driven by something other than a
//! live context. The production implementation is `glow::Context`.

use glow::HasContext;
use std::fmt;

use crate::error::{Result, TextError};

/// Which buffer binding point a buffer lives on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferTarget {
    /// Per-vertex attributes
    Vertex,
    /// u16 element indices
    Index,
}

impl BufferTarget {
    fn gl_target(self) -> u32 {
        match self {
            BufferTarget::Vertex => glow::ARRAY_BUFFER,
            BufferTarget::Index => glow::ELEMENT_ARRAY_BUFFER,
        }
    }
}

/// Destination rectangle of a texture upload (texels)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TexRegion {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// GL operations used by the glyph pipeline
///
/// Buffers are bound to their target on creation and on every sub-data call.
/// Index buffers attach to whatever vertex array is bound at the time.
pub trait GpuDevice {
    type Program: Copy + fmt::Debug;
    type Uniform: Clone + fmt::Debug;
    type Buffer: Copy + fmt::Debug;
    type Texture: Copy + fmt::Debug;
    type VertexArray: Copy + fmt::Debug;

    /// Compile and link a program, binding attribute names to locations first
    fn create_program(
        &self,
        vertex_src: &str,
        fragment_src: &str,
        attributes: &[(u32, &str)],
    ) -> Result<Self::Program>;
    fn delete_program(&self, program: Self::Program);
    fn use_program(&self, program: Option<Self::Program>);
    fn uniform_location(&self, program: Self::Program, name: &str) -> Option<Self::Uniform>;
    fn uniform_1_i32(&self, location: &Self::Uniform, value: i32);
    fn uniform_2_i32(&self, location: &Self::Uniform, x: i32, y: i32);
    fn uniform_3_f32(&self, location: &Self::Uniform, x: f32, y: f32, z: f32);

    fn create_vertex_array(&self) -> Result<Self::VertexArray>;
    fn bind_vertex_array(&self, vao: Option<Self::VertexArray>);
    fn delete_vertex_array(&self, vao: Self::VertexArray);

    /// Create a buffer of `size` bytes (contents undefined)
    fn create_buffer(&self, target: BufferTarget, size: usize) -> Result<Self::Buffer>;
    fn buffer_sub_data(&self, target: BufferTarget, buffer: Self::Buffer, offset: usize, data: &[u8]);
    fn delete_buffer(&self, buffer: Self::Buffer);

    /// Enable a float attribute reading from the bound vertex buffer
    fn vertex_attribute(&self, location: u32, components: i32, stride: usize, offset: usize);

    /// Create a zero-filled single-channel 8-bit texture
    fn create_texture_r8(&self, width: u32, height: u32) -> Result<Self::Texture>;
    /// Bind (or unbind) a texture on a texture unit
    fn bind_texture(&self, unit: u32, texture: Option<Self::Texture>);
    /// Upload 8-bit rows into a region; `row_length` is the source stride in pixels
    fn upload_r8(&self, texture: Self::Texture, region: TexRegion, row_length: u32, pixels: &[u8]);
    fn delete_texture(&self, texture: Self::Texture);

    /// Draw `count` u16 indices as triangles starting at index `first_index`
    fn draw_indexed(&self, count: usize, first_index: usize);
}

impl GpuDevice for glow::Context {
    type Program = glow::Program;
    type Uniform = glow::UniformLocation;
    type Buffer = glow::Buffer;
    type Texture = glow::Texture;
    type VertexArray = glow::VertexArray;

    fn create_program(
        &self,
        vertex_src: &str,
        fragment_src: &str,
        attributes: &[(u32, &str)],
    ) -> Result<glow::Program> {
        unsafe {
            let vs = compile_shader(self, glow::VERTEX_SHADER, vertex_src)?;
            let fs = match compile_shader(self, glow::FRAGMENT_SHADER, fragment_src) {
                Ok(fs) => fs,
                Err(e) => {
                    self.delete_shader(vs);
                    return Err(e);
                }
            };

            let program = match HasContext::create_program(self) {
                Ok(p) => p,
                Err(e) => {
                    self.delete_shader(vs);
                    self.delete_shader(fs);
                    return Err(TextError::Gpu(format!("Failed to create program: {}", e)));
                }
            };

            self.attach_shader(program, vs);
            self.attach_shader(program, fs);
            for &(location, name) in attributes {
                self.bind_attrib_location(program, location, name);
            }
            self.link_program(program);

            // Shader objects no longer needed after linking
            self.detach_shader(program, vs);
            self.detach_shader(program, fs);
            self.delete_shader(vs);
            self.delete_shader(fs);

            if !self.get_program_link_status(program) {
                let log = self.get_program_info_log(program);
                HasContext::delete_program(self, program);
                return Err(TextError::Gpu(format!("Shader link failed: {}", log)));
            }

            Ok(program)
        }
    }

    fn delete_program(&self, program: glow::Program) {
        unsafe { HasContext::delete_program(self, program) }
    }

    fn use_program(&self, program: Option<glow::Program>) {
        unsafe { HasContext::use_program(self, program) }
    }

    fn uniform_location(&self, program: glow::Program, name: &str) -> Option<glow::UniformLocation> {
        unsafe { self.get_uniform_location(program, name) }
    }

    fn uniform_1_i32(&self, location: &glow::UniformLocation, value: i32) {
        unsafe { HasContext::uniform_1_i32(self, Some(location), value) }
    }

    fn uniform_2_i32(&self, location: &glow::UniformLocation, x: i32, y: i32) {
        unsafe { HasContext::uniform_2_i32(self, Some(location), x, y) }
    }

    fn uniform_3_f32(&self, location: &glow::UniformLocation, x: f32, y: f32, z: f32) {
        unsafe { HasContext::uniform_3_f32(self, Some(location), x, y, z) }
    }

    fn create_vertex_array(&self) -> Result<glow::VertexArray> {
        unsafe {
            HasContext::create_vertex_array(self)
                .map_err(|e| TextError::Gpu(format!("Failed to create VAO: {}", e)))
        }
    }

    fn bind_vertex_array(&self, vao: Option<glow::VertexArray>) {
        unsafe { HasContext::bind_vertex_array(self, vao) }
    }

    fn delete_vertex_array(&self, vao: glow::VertexArray) {
        unsafe { HasContext::delete_vertex_array(self, vao) }
    }

    fn create_buffer(&self, target: BufferTarget, size: usize) -> Result<glow::Buffer> {
        let size = i32::try_from(size)
            .map_err(|_| TextError::Gpu(format!("Buffer too large: {} bytes", size)))?;
        unsafe {
            let buffer = HasContext::create_buffer(self)
                .map_err(|e| TextError::Gpu(format!("Failed to create buffer: {}", e)))?;
            self.bind_buffer(target.gl_target(), Some(buffer));
            self.buffer_data_size(target.gl_target(), size, glow::STATIC_DRAW);
            Ok(buffer)
        }
    }

    fn buffer_sub_data(&self, target: BufferTarget, buffer: glow::Buffer, offset: usize, data: &[u8]) {
        unsafe {
            self.bind_buffer(target.gl_target(), Some(buffer));
            self.buffer_sub_data_u8_slice(target.gl_target(), offset as i32, data);
        }
    }

    fn delete_buffer(&self, buffer: glow::Buffer) {
        unsafe { HasContext::delete_buffer(self, buffer) }
    }

    fn vertex_attribute(&self, location: u32, components: i32, stride: usize, offset: usize) {
        unsafe {
            self.enable_vertex_attrib_array(location);
            self.vertex_attrib_pointer_f32(
                location,
                components,
                glow::FLOAT,
                false,
                stride as i32,
                offset as i32,
            );
        }
    }

    fn create_texture_r8(&self, width: u32, height: u32) -> Result<glow::Texture> {
        let zeros = vec![0u8; width as usize * height as usize];
        unsafe {
            let tex = HasContext::create_texture(self)
                .map_err(|e| TextError::Gpu(format!("Failed to create texture: {}", e)))?;

            HasContext::bind_texture(self, glow::TEXTURE_2D, Some(tex));
            self.pixel_store_i32(glow::UNPACK_ALIGNMENT, 1);
            self.tex_image_2d(
                glow::TEXTURE_2D,
                0,
                glow::R8 as i32,
                width as i32,
                height as i32,
                0,
                glow::RED,
                glow::UNSIGNED_BYTE,
                Some(&zeros),
            );
            self.pixel_store_i32(glow::UNPACK_ALIGNMENT, 4);

            // Glyphs are drawn 1:1, no filtering across cells
            self.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_MIN_FILTER, glow::NEAREST as i32);
            self.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_MAG_FILTER, glow::NEAREST as i32);
            self.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_WRAP_S, glow::CLAMP_TO_EDGE as i32);
            self.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_WRAP_T, glow::CLAMP_TO_EDGE as i32);

            HasContext::bind_texture(self, glow::TEXTURE_2D, None);
            Ok(tex)
        }
    }

    fn bind_texture(&self, unit: u32, texture: Option<glow::Texture>) {
        unsafe {
            self.active_texture(glow::TEXTURE0 + unit);
            // A sampler object on the unit would override the texture's own parameters
            self.bind_sampler(unit, None);
            HasContext::bind_texture(self, glow::TEXTURE_2D, texture);
        }
    }

    fn upload_r8(&self, texture: glow::Texture, region: TexRegion, row_length: u32, pixels: &[u8]) {
        unsafe {
            HasContext::bind_texture(self, glow::TEXTURE_2D, Some(texture));
            self.pixel_store_i32(glow::UNPACK_ALIGNMENT, 1);
            self.pixel_store_i32(glow::UNPACK_ROW_LENGTH, row_length as i32);
            self.tex_sub_image_2d(
                glow::TEXTURE_2D,
                0,
                region.x as i32,
                region.y as i32,
                region.width as i32,
                region.height as i32,
                glow::RED,
                glow::UNSIGNED_BYTE,
                glow::PixelUnpackData::Slice(pixels),
            );
            self.pixel_store_i32(glow::UNPACK_ROW_LENGTH, 0);
            self.pixel_store_i32(glow::UNPACK_ALIGNMENT, 4);
            HasContext::bind_texture(self, glow::TEXTURE_2D, None);
        }
    }

    fn delete_texture(&self, texture: glow::Texture) {
        unsafe { HasContext::delete_texture(self, texture) }
    }

    fn draw_indexed(&self, count: usize, first_index: usize) {
        let byte_offset = first_index * std::mem::size_of::<u16>();
        unsafe {
            self.draw_elements(
                glow::TRIANGLES,
                count as i32,
                glow::UNSIGNED_SHORT,
                byte_offset as i32,
            );
        }
    }
}

/// Compile individual shader
unsafe fn compile_shader(gl: &glow::Context, shader_type: u32, source: &str) -> Result<glow::Shader> {
    let shader = gl
        .create_shader(shader_type)
        .map_err(|e| TextError::Gpu(format!("Failed to create shader: {}", e)))?;

    gl.shader_source(shader, source);
    gl.compile_shader(shader);

    if !gl.get_shader_compile_status(shader) {
        let log = gl.get_shader_info_log(shader);
        gl.delete_shader(shader);
        let type_name = match shader_type {
            glow::VERTEX_SHADER => "vertex",
            glow::FRAGMENT_SHADER => "fragment",
            _ => "unknown",
        };
        return Err(TextError::Gpu(format!(
            "{} shader compile failed: {}",
            type_name, log
        )));
    }

    Ok(shader)
}
