//! FreeType wrapper
//!
//! Loads faces from disk, sets pixel sizes and renders glyphs by index into
//! 8-bit coverage bitmaps. Each face carries a rustybuzz shaper over the same
//! font bytes; shaped advances are taken from FreeType's hinted metrics so
//! the pen moves in step with the rendered bitmaps.

use freetype::bitmap::PixelMode;
use freetype::face::LoadFlag;
use freetype::Library;
use log::{debug, info, trace};
use std::cell::RefCell;
use std::collections::HashMap;
use std::path::Path;
use std::rc::Rc;

use super::shaper::HbShaper;
use super::{
    FaceMetrics, FontLibrary, GlyphRasterizer, PixelFormat, RasterGlyph, ShapedGlyph, TextShaper,
};
use crate::error::{Result, TextError};

/// Map FreeType's pixel mode onto our format enum
fn pixel_format(mode: PixelMode) -> PixelFormat {
    match mode {
        PixelMode::Gray => PixelFormat::Gray8,
        PixelMode::Mono => PixelFormat::Mono,
        PixelMode::Lcd => PixelFormat::Lcd,
        PixelMode::LcdV => PixelFormat::LcdVertical,
        PixelMode::Bgra => PixelFormat::Bgra,
        _ => PixelFormat::Other,
    }
}

/// FreeType library handle (one per runtime)
pub struct FtLibrary {
    library: Library,
}

impl FtLibrary {
    /// Initialize FreeType
    pub fn init() -> Result<Self> {
        let library = Library::init()
            .map_err(|e| TextError::Raster(format!("FreeType initialization failed: {:?}", e)))?;
        info!("FreeType initialized");
        Ok(Self { library })
    }
}

impl FontLibrary for FtLibrary {
    type Face = FtFace;

    fn open_face(&self, path: &Path) -> Result<FtFace> {
        let data = std::fs::read(path).map_err(|e| {
            TextError::Raster(format!("Failed to read font {}: {}", path.display(), e))
        })?;

        // freetype-rs requires Rc<Vec<u8>>; the shaper shares the same bytes
        let font_data: Rc<Vec<u8>> = Rc::new(data);

        let face = self
            .library
            .new_memory_face(Rc::clone(&font_data), 0)
            .map_err(|e| {
                TextError::Raster(format!("FreeType font loading failed: {:?}", e))
            })?;

        let shaper = HbShaper::new(font_data, 0)?;

        let family = face.family_name().unwrap_or_else(|| "unknown".to_string());
        info!("FreeType face loaded: {} ({})", family, path.display());

        Ok(FtFace {
            face,
            shaper,
            size_px: 0,
            advances: RefCell::new(HashMap::new()),
        })
    }
}

/// One FreeType face plus the shaper bound to it
pub struct FtFace {
    face: freetype::Face,
    shaper: HbShaper,
    /// Current pixel size (0 until set)
    size_px: u32,
    /// Hinted advances (26.6) at the current size, by glyph index
    advances: RefCell<HashMap<u32, (i32, i32)>>,
}

impl FtFace {
    /// Current pixel size
    pub fn size(&self) -> u32 {
        self.size_px
    }

    /// Hinted pen advance of a glyph at the current size (26.6)
    pub fn hinted_advance(&self, glyph_index: u32) -> Option<(i32, i32)> {
        if let Some(&advance) = self.advances.borrow().get(&glyph_index) {
            return Some(advance);
        }
        self.face.load_glyph(glyph_index, LoadFlag::DEFAULT).ok()?;
        let vector = self.face.glyph().advance();
        let advance = (vector.x as i32, vector.y as i32);
        self.advances.borrow_mut().insert(glyph_index, advance);
        Some(advance)
    }
}

impl GlyphRasterizer for FtFace {
    fn set_pixel_size(&mut self, pixel_size: u32) -> Result<()> {
        if pixel_size == 0 {
            return Err(TextError::Raster("pixel size must be non-zero".to_string()));
        }
        self.face
            .set_pixel_sizes(0, pixel_size)
            .map_err(|e| TextError::Raster(format!("FreeType size setting failed: {:?}", e)))?;
        self.size_px = pixel_size;
        self.advances.borrow_mut().clear();

        let metrics = self.metrics();
        self.shaper.set_scale(metrics.y_ppem, metrics.units_per_em);
        debug!(
            "Face size set: {}px (ppem={}, upem={})",
            pixel_size, metrics.y_ppem, metrics.units_per_em
        );
        Ok(())
    }

    fn metrics(&self) -> FaceMetrics {
        let y_ppem = self
            .face
            .size_metrics()
            .map(|m| u32::from(m.y_ppem))
            .unwrap_or(0);
        FaceMetrics {
            height: i32::from(self.face.height()),
            max_advance_width: i32::from(self.face.max_advance_width()),
            units_per_em: u32::try_from(self.face.em_size()).unwrap_or(0),
            y_ppem,
        }
    }

    fn rasterize(&mut self, glyph_index: u32) -> Result<RasterGlyph> {
        self.face
            .load_glyph(glyph_index, LoadFlag::RENDER)
            .map_err(|e| {
                TextError::Raster(format!("Failed to render glyph {}: {:?}", glyph_index, e))
            })?;

        let glyph = self.face.glyph();
        let bitmap = glyph.bitmap();

        let format = bitmap
            .pixel_mode()
            .map(pixel_format)
            .unwrap_or(PixelFormat::Other);

        Ok(RasterGlyph {
            format,
            width: u32::try_from(bitmap.width()).unwrap_or(0),
            rows: u32::try_from(bitmap.rows()).unwrap_or(0),
            pitch: bitmap.pitch(),
            left: glyph.bitmap_left(),
            top: glyph.bitmap_top(),
            buffer: bitmap.buffer().to_vec(),
        })
    }
}

impl TextShaper for FtFace {
    fn shape(&self, text: &str) -> Vec<ShapedGlyph> {
        let mut glyphs = self.shaper.shape(text);
        for glyph in &mut glyphs {
            match self.hinted_advance(glyph.glyph_index) {
                Some((x, y)) => {
                    glyph.x_advance = x;
                    glyph.y_advance = y;
                }
                None => trace!(
                    "No hinted advance for glyph {}, keeping shaped advance",
                    glyph.glyph_index
                ),
            }
        }
        glyphs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pixel_format_mapping() {
        assert_eq!(pixel_format(PixelMode::Gray), PixelFormat::Gray8);
        assert_eq!(pixel_format(PixelMode::Mono), PixelFormat::Mono);
        assert_eq!(pixel_format(PixelMode::Lcd), PixelFormat::Lcd);
        assert_eq!(pixel_format(PixelMode::LcdV), PixelFormat::LcdVertical);
        assert_eq!(pixel_format(PixelMode::Bgra), PixelFormat::Bgra);
        assert_eq!(pixel_format(PixelMode::Gray4), PixelFormat::Other);
    }

    #[test]
    fn test_open_missing_file() {
        let Ok(library) = FtLibrary::init() else {
            return;
        };
        let result = library.open_face(Path::new("/nonexistent/gltext-missing.ttf"));
        assert!(matches!(result, Err(TextError::Raster(_))));
    }

    /// System monospace face at `size`, if the machine has one
    fn system_face(library: &FtLibrary, size: u32) -> Option<(std::path::PathBuf, FtFace)> {
        let path = crate::font::fontconfig::find_system_monospace().ok()?;
        let mut face = library.open_face(&path).ok()?;
        face.set_pixel_size(size).ok()?;
        Some((path, face))
    }

    /// FreeType's own hinted advance, read straight from the glyph slot
    fn freetype_advance(face: &FtFace, glyph_index: u32) -> i32 {
        face.face
            .load_glyph(glyph_index, LoadFlag::DEFAULT)
            .unwrap();
        face.face.glyph().advance().x as i32
    }

    #[test]
    fn test_rasterize_system_font() {
        let Ok(library) = FtLibrary::init() else {
            return;
        };
        let Some((_, mut face)) = system_face(&library, 16) else {
            return;
        };

        let glyph = face.shape("A")[0].glyph_index;
        let raster = face.rasterize(glyph).unwrap();
        assert_eq!(raster.format, PixelFormat::Gray8);
        assert!(raster.width > 0 && raster.rows > 0);
        assert!(raster.buffer.len() >= raster.rows as usize * raster.pitch.unsigned_abs() as usize);
        assert!(raster.buffer.iter().any(|&b| b > 0));
    }

    #[test]
    fn test_shaped_advances_are_hinted() {
        let Ok(library) = FtLibrary::init() else {
            return;
        };
        let Some((_, face)) = system_face(&library, 16) else {
            return;
        };

        let glyphs = face.shape("Hello, gltext!");
        assert!(!glyphs.is_empty());
        for glyph in &glyphs {
            let expected = freetype_advance(&face, glyph.glyph_index);
            assert_eq!(glyph.x_advance, expected);
            // Hinted advances land on whole pixels
            assert_eq!(glyph.x_advance % 64, 0);
            assert_eq!(glyph.y_advance, 0);
        }
    }

    #[test]
    fn test_system_font_cache_and_draw() {
        use crate::font::instance::Font;
        use crate::gpu::runtime::SharedRuntime;
        use crate::testing::RecordingDevice;

        let Ok(library) = FtLibrary::init() else {
            return;
        };
        // Reference face is dropped before the library moves into the runtime
        let (path, expected_pen) = {
            let Some((path, face)) = system_face(&library, 16) else {
                return;
            };
            let advance: i32 = face
                .shape("AB")
                .iter()
                .map(|g| freetype_advance(&face, g.glyph_index) >> 6)
                .sum();
            (path, advance)
        };

        let device = RecordingDevice::new();
        let runtime = SharedRuntime::new(device.clone(), library);
        let mut font = Font::new(&runtime, &path, 16, 128, 128).unwrap();
        font.set_display_size(300, 300).unwrap();

        assert_eq!(font.cache_characters("AB").unwrap(), 2);
        assert_eq!(device.uploads().len(), 2);

        device.clear_calls();
        font.draw("AB").unwrap();
        assert_eq!(device.draws(), vec![(6, 0), (6, 6)]);
        assert!(device.uploads().is_empty());
        assert_eq!(font.pen_position().unwrap(), (expected_pen, 0));
    }
}
