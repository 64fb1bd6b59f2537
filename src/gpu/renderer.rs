//! Text drawing
//!
//! Shapes a run, resolves every glyph through the font's cache, then issues
//! one indexed draw per glyph while advancing the pen.

use log::{trace, warn};

use super::device::GpuDevice;
use super::shader::GlyphProgram;
use crate::constants::{DEFAULT_PEN_COLOR, FIXED_26_6_SHIFT, INDICES_PER_GLYPH};
use crate::error::Result;
use crate::font::{CacheEntry, GlyphCache, GlyphRasterizer, ShapedGlyph, TextShaper};

/// Drawing cursor: baseline position (pixels, bottom-left origin) and color
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PenState {
    pub x: i32,
    pub y: i32,
    pub color: [f32; 3],
}

impl Default for PenState {
    fn default() -> Self {
        Self {
            x: 0,
            y: 0,
            color: DEFAULT_PEN_COLOR,
        }
    }
}

/// Borrowed view over one font's face and cache plus the shared program
pub struct TextRenderer<'a, D: GpuDevice, F> {
    device: &'a D,
    program: &'a GlyphProgram<D>,
    face: &'a mut F,
    cache: &'a mut GlyphCache<D>,
}

impl<'a, D, F> TextRenderer<'a, D, F>
where
    D: GpuDevice,
    F: GlyphRasterizer + TextShaper,
{
    pub fn new(
        device: &'a D,
        program: &'a GlyphProgram<D>,
        face: &'a mut F,
        cache: &'a mut GlyphCache<D>,
    ) -> Self {
        Self {
            device,
            program,
            face,
            cache,
        }
    }

    /// Shape `text` and resolve each glyph, caching as needed
    pub fn resolve_run(&mut self, text: &str) -> Result<Vec<(CacheEntry, ShapedGlyph)>> {
        let shaped = self.face.shape(text);
        let mut run = Vec::with_capacity(shaped.len());
        for glyph in shaped {
            let entry = self
                .cache
                .resolve(self.device, &mut *self.face, glyph.glyph_index)?;
            run.push((entry, glyph));
        }
        Ok(run)
    }

    /// Cache every glyph of `text` without drawing; returns how many were new
    pub fn cache_characters(&mut self, text: &str) -> Result<usize> {
        let before = self.cache.len();
        self.resolve_run(text)?;
        let added = self.cache.len() - before;
        trace!("Pre-cached {} new glyphs", added);
        Ok(added)
    }

    /// Draw `text` at the pen and advance it
    ///
    /// The whole run is resolved first; on error nothing is drawn and the pen
    /// is unchanged.
    pub fn draw(&mut self, text: &str, pen: &mut PenState, display: (u32, u32)) -> Result<()> {
        let run = self.resolve_run(text)?;
        if run.is_empty() {
            return Ok(());
        }
        if display.0 == 0 || display.1 == 0 {
            warn!("Drawing with an empty display size; nothing will be visible");
        }

        let device = self.device;
        self.cache.bind(device);
        self.program.bind(device);
        self.program.set_scale(device, display.0 as i32, display.1 as i32);
        self.program.set_color(device, pen.color);

        for (entry, glyph) in &run {
            let x = pen.x + (glyph.x_offset >> FIXED_26_6_SHIFT) + entry.bearing_x;
            let y = pen.y + (glyph.y_offset >> FIXED_26_6_SHIFT) + entry.bearing_y;
            self.program.set_position(device, x, y);
            device.draw_indexed(INDICES_PER_GLYPH, entry.slot * INDICES_PER_GLYPH);

            pen.x += glyph.x_advance >> FIXED_26_6_SHIFT;
            pen.y += glyph.y_advance >> FIXED_26_6_SHIFT;
        }

        device.bind_vertex_array(None);
        Ok(())
    }
}
