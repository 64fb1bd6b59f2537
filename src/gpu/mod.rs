//! GPU rendering with OpenGL ES
//!
//! Handles:
//! - The device seam the glyph pipeline draws through
//! - Glyph shader, per-font quad geometry and the text renderer
//! - The shared runtime (library + compiled program)
//! - Headless EGL context and offscreen target for the demo

pub mod context;
pub mod device;
pub mod fbo;
pub mod geometry;
pub mod renderer;
pub mod runtime;
pub mod shader;

pub use context::HeadlessContext;
pub use device::{BufferTarget, GpuDevice, TexRegion};
pub use fbo::Fbo;
pub use geometry::{GeometryBuffer, GlyphQuad, GlyphVertex};
pub use renderer::{PenState, TextRenderer};
pub use runtime::{GlyphRuntime, SharedRuntime};
pub use shader::GlyphProgram;
