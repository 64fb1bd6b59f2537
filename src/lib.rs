//! gltext - shaped text rendering on OpenGL ES
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────┐
//! │  Font (pen, display size, lifecycle)     │
//! ├──────────────────────────────────────────┤
//! │  TextRenderer: shape → resolve → draw    │
//! │                  ↓                       │
//! │  GlyphCache: rasterize → atlas slot      │
//! │              → upload → quad geometry    │
//! ├──────────────────────────────────────────┤
//! │  SharedRuntime: font library + program   │
//! └──────────────────────────────────────────┘
//! ```
//!
//! Each font owns a fixed-size atlas texture. Glyphs are cached on first use
//! and never evicted; once the atlas is full, new glyphs fail with
//! [`TextError::CacheOverflow`]. Output is premultiplied alpha.

pub mod config;
pub mod constants;
pub mod error;
pub mod font;
pub mod gpu;
pub mod utils;

#[cfg(test)]
mod testing;

pub use error::{Result, TextError};
pub use font::instance::{FontParams, GlFont, GlRuntime};
pub use font::{Font, FtLibrary};
pub use gpu::{GpuDevice, PenState, SharedRuntime};
