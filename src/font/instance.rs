//! Font handle
//!
//! A [`Font`] is either empty or ready. A ready font owns a face opened from
//! the shared library, a glyph cache with its own GPU objects, the pen and the
//! display size. Copies re-open everything from scratch; two fonts never
//! share a cache.

use log::{debug, info};
use std::path::{Path, PathBuf};
use std::rc::Rc;

use super::atlas::CellSize;
use super::cache::GlyphCache;
use super::freetype::FtLibrary;
use super::{FontLibrary, GlyphRasterizer};
use crate::constants::DEFAULT_CACHE_SIZE;
use crate::error::{Result, TextError};
use crate::gpu::device::GpuDevice;
use crate::gpu::renderer::{PenState, TextRenderer};
use crate::gpu::runtime::{GlyphRuntime, SharedRuntime};

/// Font on a live GL context with FreeType/rustybuzz
pub type GlFont = Font<glow::Context, FtLibrary>;
/// Runtime for [`GlFont`]
pub type GlRuntime = SharedRuntime<glow::Context, FtLibrary>;

/// Everything needed to (re)open a font
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FontParams {
    pub path: PathBuf,
    pub pixel_size: u32,
    pub cache_width: u32,
    pub cache_height: u32,
}

struct FontState<D: GpuDevice, L: FontLibrary> {
    runtime: Rc<GlyphRuntime<D, L>>,
    params: FontParams,
    face: L::Face,
    cache: GlyphCache<D>,
    pen: PenState,
    display: (u32, u32),
}

impl<D: GpuDevice, L: FontLibrary> FontState<D, L> {
    /// Open face, set size and build an empty cache
    ///
    /// Anything created before a failure is released on the way out.
    fn open(runtime: Rc<GlyphRuntime<D, L>>, params: FontParams) -> Result<Self> {
        let mut face = runtime.library().open_face(&params.path)?;
        face.set_pixel_size(params.pixel_size)?;
        let cache = GlyphCache::new(
            runtime.device(),
            &face.metrics(),
            params.cache_width,
            params.cache_height,
        )?;

        info!(
            "Font ready: {} at {}px ({}x{} cache, {} slots)",
            params.path.display(),
            params.pixel_size,
            params.cache_width,
            params.cache_height,
            cache.capacity()
        );

        Ok(Self {
            runtime,
            params,
            face,
            cache,
            pen: PenState::default(),
            display: (0, 0),
        })
    }

    fn renderer(&mut self) -> TextRenderer<'_, D, L::Face> {
        TextRenderer::new(
            self.runtime.device(),
            self.runtime.program(),
            &mut self.face,
            &mut self.cache,
        )
    }
}

impl<D: GpuDevice, L: FontLibrary> Drop for FontState<D, L> {
    fn drop(&mut self) {
        self.cache.destroy(self.runtime.device());
        debug!("Font released: {}", self.params.path.display());
    }
}

/// Public font handle
pub struct Font<D: GpuDevice, L: FontLibrary> {
    state: Option<FontState<D, L>>,
}

impl<D: GpuDevice, L: FontLibrary> Default for Font<D, L> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<D: GpuDevice, L: FontLibrary> Font<D, L> {
    /// A font with nothing loaded; only copy, assignment and drop are valid
    pub fn empty() -> Self {
        Self { state: None }
    }

    /// Load `path` at `pixel_size` with a `cache_width x cache_height` atlas
    pub fn new(
        runtime: &SharedRuntime<D, L>,
        path: impl AsRef<Path>,
        pixel_size: u32,
        cache_width: u32,
        cache_height: u32,
    ) -> Result<Self> {
        let params = FontParams {
            path: path.as_ref().to_path_buf(),
            pixel_size,
            cache_width,
            cache_height,
        };
        let state = FontState::open(runtime.instance()?, params)?;
        Ok(Self { state: Some(state) })
    }

    /// Load with the default square cache
    pub fn with_default_cache(
        runtime: &SharedRuntime<D, L>,
        path: impl AsRef<Path>,
        pixel_size: u32,
    ) -> Result<Self> {
        Self::new(
            runtime,
            path,
            pixel_size,
            DEFAULT_CACHE_SIZE,
            DEFAULT_CACHE_SIZE,
        )
    }

    pub fn is_ready(&self) -> bool {
        self.state.is_some()
    }

    /// Independent copy: same file, size, cache dimensions, pen and display
    ///
    /// The copy starts with an empty cache of its own.
    pub fn try_clone(&self) -> Result<Self> {
        let Some(src) = &self.state else {
            return Ok(Self::empty());
        };
        let mut state = FontState::open(Rc::clone(&src.runtime), src.params.clone())?;
        state.pen = src.pen;
        state.display = src.display;
        Ok(Self { state: Some(state) })
    }

    /// Replace this font with a copy of `other`
    ///
    /// The current state is released first; if the copy fails this font is
    /// left empty.
    pub fn assign_from(&mut self, other: &Self) -> Result<()> {
        self.state = None;
        *self = other.try_clone()?;
        Ok(())
    }

    fn state(&self) -> Result<&FontState<D, L>> {
        self.state.as_ref().ok_or(TextError::InvalidState)
    }

    fn state_mut(&mut self) -> Result<&mut FontState<D, L>> {
        self.state.as_mut().ok_or(TextError::InvalidState)
    }

    /// Viewport size the pen coordinates map onto
    pub fn set_display_size(&mut self, width: u32, height: u32) -> Result<()> {
        self.state_mut()?.display = (width, height);
        Ok(())
    }

    /// Baseline origin of the next glyph (0,0 is bottom-left)
    pub fn set_pen_position(&mut self, x: i32, y: i32) -> Result<()> {
        let pen = &mut self.state_mut()?.pen;
        pen.x = x;
        pen.y = y;
        Ok(())
    }

    pub fn set_pen_color(&mut self, r: f32, g: f32, b: f32) -> Result<()> {
        self.state_mut()?.pen.color = [r, g, b];
        Ok(())
    }

    /// Change the pixel size, dropping every cached glyph
    ///
    /// Pen and display size carry over. On failure the font is left empty.
    pub fn set_point_size(&mut self, pixel_size: u32) -> Result<()> {
        let old = self.state.take().ok_or(TextError::InvalidState)?;
        let runtime = Rc::clone(&old.runtime);
        let params = FontParams {
            pixel_size,
            ..old.params.clone()
        };
        let (pen, display) = (old.pen, old.display);
        drop(old);

        let mut state = FontState::open(runtime, params)?;
        state.pen = pen;
        state.display = display;
        self.state = Some(state);
        Ok(())
    }

    /// Cache the glyphs of `text` without drawing; returns how many were new
    pub fn cache_characters(&mut self, text: &str) -> Result<usize> {
        self.state_mut()?.renderer().cache_characters(text)
    }

    /// Draw `text` at the pen and advance the pen
    pub fn draw(&mut self, text: &str) -> Result<()> {
        let state = self.state_mut()?;
        let mut pen = state.pen;
        let display = state.display;
        state.renderer().draw(text, &mut pen, display)?;
        state.pen = pen;
        Ok(())
    }

    pub fn pen_position(&self) -> Result<(i32, i32)> {
        let pen = self.state()?.pen;
        Ok((pen.x, pen.y))
    }

    pub fn pen_color(&self) -> Result<[f32; 3]> {
        Ok(self.state()?.pen.color)
    }

    pub fn point_size(&self) -> Result<u32> {
        Ok(self.state()?.params.pixel_size)
    }

    pub fn display_size(&self) -> Result<(u32, u32)> {
        Ok(self.state()?.display)
    }

    pub fn cached_glyph_count(&self) -> Result<usize> {
        Ok(self.state()?.cache.len())
    }

    pub fn cache_capacity(&self) -> Result<usize> {
        Ok(self.state()?.cache.capacity())
    }

    pub fn cell_size(&self) -> Result<CellSize> {
        Ok(self.state()?.cache.cell_size())
    }

    pub fn params(&self) -> Result<&FontParams> {
        Ok(&self.state()?.params)
    }
}
