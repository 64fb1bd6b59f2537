//! Text shaping
//!
//! Uses rustybuzz to turn a UTF-8 run into positioned glyph indices.
//! rustybuzz works in font units; positions are rescaled to 26.6 fixed point
//! at the face's current ppem. These are unhinted, so the FreeType face
//! replaces the advances with its own hinted ones.

use log::trace;
use std::rc::Rc;

use super::ShapedGlyph;
use crate::constants::FIXED_26_6_SHIFT;
use crate::error::{Result, TextError};

/// Convert font units to 26.6 fixed point at `ppem` pixels per em
pub fn units_to_26_6(units: i32, ppem: u32, units_per_em: u32) -> i32 {
    if units_per_em == 0 {
        return 0;
    }
    let scaled = f64::from(units) * f64::from(ppem) * f64::from(1 << FIXED_26_6_SHIFT)
        / f64::from(units_per_em);
    scaled.round() as i32
}

/// Shaper bound to one font's bytes
///
/// The parsed face borrows `_font_data`; it is declared first so it drops
/// before the bytes it points into.
pub struct HbShaper {
    face: rustybuzz::Face<'static>,
    _font_data: Rc<Vec<u8>>,
    ppem: u32,
    units_per_em: u32,
}

impl HbShaper {
    /// Create shaper over font data (fails if rustybuzz cannot parse it)
    pub fn new(font_data: Rc<Vec<u8>>, face_index: u32) -> Result<Self> {
        // SAFETY: the Vec's heap buffer is kept alive by `font_data` for as
        // long as `face` exists, and an Rc'd Vec is never mutated or moved.
        let bytes: &'static [u8] =
            unsafe { std::slice::from_raw_parts(font_data.as_ptr(), font_data.len()) };
        let face = rustybuzz::Face::from_slice(bytes, face_index).ok_or_else(|| {
            TextError::Raster("rustybuzz could not parse font data".to_string())
        })?;
        Ok(Self {
            face,
            _font_data: font_data,
            ppem: 0,
            units_per_em: 0,
        })
    }

    /// Follow the rasterizer's size
    pub fn set_scale(&mut self, ppem: u32, units_per_em: u32) {
        self.ppem = ppem;
        self.units_per_em = units_per_em;
    }

    /// Shape one left-to-right run
    pub fn shape(&self, text: &str) -> Vec<ShapedGlyph> {
        if text.is_empty() {
            return Vec::new();
        }

        let mut buffer = rustybuzz::UnicodeBuffer::new();
        buffer.push_str(text);
        buffer.set_direction(rustybuzz::Direction::LeftToRight);
        buffer.guess_segment_properties();

        let glyph_buffer = rustybuzz::shape(&self.face, &[], buffer);

        let scale = |v: i32| units_to_26_6(v, self.ppem, self.units_per_em);
        let shaped: Vec<ShapedGlyph> = glyph_buffer
            .glyph_infos()
            .iter()
            .zip(glyph_buffer.glyph_positions())
            .map(|(info, pos)| ShapedGlyph {
                glyph_index: info.glyph_id,
                x_advance: scale(pos.x_advance),
                y_advance: scale(pos.y_advance),
                x_offset: scale(pos.x_offset),
                y_offset: scale(pos.y_offset),
            })
            .collect();

        trace!("Shaped {:?} -> {} glyphs", text, shaped.len());
        shaped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_units_to_26_6() {
        // 1000 upem, 16 ppem: 600 units = 9.6px = 614.4 -> 614
        assert_eq!(units_to_26_6(600, 16, 1000), 614);
        // Full em at 32px
        assert_eq!(units_to_26_6(2048, 32, 2048), 32 * 64);
        assert_eq!(units_to_26_6(-500, 16, 1000), -512);
        assert_eq!(units_to_26_6(100, 16, 0), 0);
    }

    #[test]
    fn test_rejects_garbage() {
        let data = Rc::new(vec![0u8; 64]);
        assert!(matches!(
            HbShaper::new(data, 0),
            Err(TextError::Raster(_))
        ));
    }

    #[test]
    fn test_shaper_owns_font_bytes() {
        let Ok(path) = crate::font::fontconfig::find_system_monospace() else {
            return;
        };
        let Ok(bytes) = std::fs::read(&path) else {
            return;
        };
        let data = Rc::new(bytes);
        let mut shaper = HbShaper::new(Rc::clone(&data), 0).unwrap();
        drop(data);

        shaper.set_scale(16, 2048);
        let first = shaper.shape("AB");
        assert_eq!(first.len(), 2);
        assert!(first.iter().all(|g| g.glyph_index != 0));
        assert_eq!(shaper.shape("AB"), first);
        assert!(shaper.shape("").is_empty());
    }
}
