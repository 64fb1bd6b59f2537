//! Error types
//!
//! Every fallible library call returns [`TextError`]. The demo binary and the
//! helper modules around it use `anyhow` and convert through `?`.

use thiserror::Error;

use crate::font::PixelFormat;

/// Library result type
pub type Result<T> = std::result::Result<T, TextError>;

/// Errors reported by fonts, the glyph cache and the GPU layer
#[derive(Debug, Error)]
pub enum TextError {
    /// Font file could not be opened/parsed, or the pixel size was rejected
    #[error("rasterizer error: {0}")]
    Raster(String),

    /// Every atlas slot is taken and a new glyph was requested
    #[error("glyph cache overflow ({capacity} slots in use)")]
    CacheOverflow { capacity: usize },

    /// The rasterizer produced something other than an 8-bit grayscale bitmap
    #[error("glyph {glyph} rasterized as {format:?}, expected 8-bit grayscale")]
    UnsupportedGlyphFormat { glyph: u32, format: PixelFormat },

    /// Operation requires a ready font but the font is empty
    #[error("operation not permitted on an empty font")]
    InvalidState,

    /// GPU object creation or shader compilation failed
    #[error("GPU error: {0}")]
    Gpu(String),

    /// The shared runtime failed to initialize earlier and cannot be used
    #[error("glyph runtime unavailable (initialization failed earlier)")]
    RuntimeUnavailable,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let e = TextError::CacheOverflow { capacity: 42 };
        assert_eq!(e.to_string(), "glyph cache overflow (42 slots in use)");

        let e = TextError::UnsupportedGlyphFormat {
            glyph: 7,
            format: PixelFormat::Mono,
        };
        assert!(e.to_string().contains("glyph 7"));
        assert!(e.to_string().contains("Mono"));

        assert_eq!(
            TextError::InvalidState.to_string(),
            "operation not permitted on an empty font"
        );
    }

    #[test]
    fn test_converts_into_anyhow() {
        fn fails() -> anyhow::Result<()> {
            Err(TextError::Raster("bad magic".to_string()))?;
            Ok(())
        }
        let err = fails().unwrap_err();
        assert_eq!(err.to_string(), "rasterizer error: bad magic");
    }
}
