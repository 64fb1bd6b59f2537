//! Framebuffer Object (FBO) for offscreen rendering
//!
//! RGBA8 color target that can be read back and saved as PNG

use anyhow::{anyhow, Context, Result};
use glow::HasContext;
use log::info;
use std::path::Path;

/// Offscreen RGBA8 render target
pub struct Fbo {
    framebuffer: glow::Framebuffer,
    texture: glow::Texture,
    width: u32,
    height: u32,
}

impl Fbo {
    /// Create FBO with specified size
    pub fn new(gl: &glow::Context, width: u32, height: u32) -> Result<Self> {
        unsafe {
            // Create texture for color attachment
            let texture = gl
                .create_texture()
                .map_err(|e| anyhow!("Failed to create FBO texture: {}", e))?;
            gl.bind_texture(glow::TEXTURE_2D, Some(texture));
            gl.tex_image_2d(
                glow::TEXTURE_2D,
                0,
                glow::RGBA8 as i32,
                width as i32,
                height as i32,
                0,
                glow::RGBA,
                glow::UNSIGNED_BYTE,
                None,
            );
            gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_MIN_FILTER, glow::NEAREST as i32);
            gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_MAG_FILTER, glow::NEAREST as i32);
            gl.bind_texture(glow::TEXTURE_2D, None);

            let framebuffer = match gl.create_framebuffer() {
                Ok(fb) => fb,
                Err(e) => {
                    gl.delete_texture(texture);
                    return Err(anyhow!("Failed to create FBO: {}", e));
                }
            };
            gl.bind_framebuffer(glow::FRAMEBUFFER, Some(framebuffer));
            gl.framebuffer_texture_2d(
                glow::FRAMEBUFFER,
                glow::COLOR_ATTACHMENT0,
                glow::TEXTURE_2D,
                Some(texture),
                0,
            );

            let status = gl.check_framebuffer_status(glow::FRAMEBUFFER);
            gl.bind_framebuffer(glow::FRAMEBUFFER, None);
            if status != glow::FRAMEBUFFER_COMPLETE {
                gl.delete_framebuffer(framebuffer);
                gl.delete_texture(texture);
                return Err(anyhow!("FBO incomplete: status={}", status));
            }

            info!("FBO created: {}x{}", width, height);

            Ok(Self {
                framebuffer,
                texture,
                width,
                height,
            })
        }
    }

    /// Bind FBO for rendering and cover it with the viewport
    pub fn bind(&self, gl: &glow::Context) {
        unsafe {
            gl.bind_framebuffer(glow::FRAMEBUFFER, Some(self.framebuffer));
            gl.viewport(0, 0, self.width as i32, self.height as i32);
        }
    }

    /// Unbind FBO (return to default framebuffer)
    pub fn unbind(&self, gl: &glow::Context) {
        unsafe {
            gl.bind_framebuffer(glow::FRAMEBUFFER, None);
        }
    }

    /// Clear entire FBO
    pub fn clear(&self, gl: &glow::Context, r: f32, g: f32, b: f32, a: f32) {
        unsafe {
            gl.bind_framebuffer(glow::FRAMEBUFFER, Some(self.framebuffer));
            gl.clear_color(r, g, b, a);
            gl.clear(glow::COLOR_BUFFER_BIT);
        }
    }

    /// Read the FBO back as top-down RGBA rows
    pub fn read_rgba(&self, gl: &glow::Context) -> Vec<u8> {
        let mut pixels = vec![0u8; self.width as usize * self.height as usize * 4];
        unsafe {
            gl.bind_framebuffer(glow::FRAMEBUFFER, Some(self.framebuffer));
            gl.pixel_store_i32(glow::PACK_ALIGNMENT, 1);
            gl.read_pixels(
                0,
                0,
                self.width as i32,
                self.height as i32,
                glow::RGBA,
                glow::UNSIGNED_BYTE,
                glow::PixelPackData::Slice(&mut pixels),
            );
        }
        // OpenGL origin is bottom-left
        flip_rows(&pixels, self.width as usize * 4)
    }

    /// Save the current contents as PNG
    pub fn save_png(&self, gl: &glow::Context, path: &Path) -> Result<()> {
        let pixels = self.read_rgba(gl);
        write_png(path, self.width, self.height, &pixels)?;
        info!("Saved {}x{} image: {}", self.width, self.height, path.display());
        Ok(())
    }

    /// Get FBO size
    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Release resources
    pub fn destroy(&self, gl: &glow::Context) {
        unsafe {
            gl.delete_framebuffer(self.framebuffer);
            gl.delete_texture(self.texture);
        }
    }
}

/// Reverse row order of a tightly packed image
pub fn flip_rows(pixels: &[u8], row_size: usize) -> Vec<u8> {
    if row_size == 0 {
        return Vec::new();
    }
    pixels
        .chunks_exact(row_size)
        .rev()
        .flatten()
        .copied()
        .collect()
}

/// Write top-down RGBA8 pixels as PNG
pub fn write_png(path: &Path, width: u32, height: u32, rgba: &[u8]) -> Result<()> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    let mut encoder = png::Encoder::new(std::io::BufWriter::new(file), width, height);
    encoder.set_color(png::ColorType::Rgba);
    encoder.set_depth(png::BitDepth::Eight);
    let mut writer = encoder.write_header()?;
    writer.write_image_data(rgba)?;
    Ok(())
}
