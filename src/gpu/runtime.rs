//! Shared glyph runtime
//!
//! One font library and one compiled glyph program serve every font created
//! from the same [`SharedRuntime`]. The runtime is built on first use and
//! released when the last font holding it goes away.

use log::{info, warn};
use std::cell::{OnceCell, RefCell};
use std::rc::Rc;

use super::device::GpuDevice;
use super::shader::GlyphProgram;
use crate::error::{Result, TextError};
use crate::font::FontLibrary;

/// GPU device, font library and glyph program
pub struct GlyphRuntime<D: GpuDevice, L: FontLibrary> {
    device: D,
    library: L,
    program: GlyphProgram<D>,
}

impl<D: GpuDevice, L: FontLibrary> GlyphRuntime<D, L> {
    /// Compile the glyph program on `device`
    pub fn new(device: D, library: L) -> Result<Self> {
        let program = GlyphProgram::new(&device)?;
        info!("Glyph runtime initialized");
        Ok(Self {
            device,
            library,
            program,
        })
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    pub fn library(&self) -> &L {
        &self.library
    }

    pub fn program(&self) -> &GlyphProgram<D> {
        &self.program
    }
}

impl<D: GpuDevice, L: FontLibrary> Drop for GlyphRuntime<D, L> {
    fn drop(&mut self) {
        self.program.destroy(&self.device);
        info!("Glyph runtime released");
    }
}

/// Lazily constructed [`GlyphRuntime`]
///
/// Holds the device and library until [`instance`](Self::instance) is first
/// called. If construction fails, the runtime stays unavailable.
pub struct SharedRuntime<D: GpuDevice, L: FontLibrary> {
    pending: RefCell<Option<(D, L)>>,
    runtime: OnceCell<Rc<GlyphRuntime<D, L>>>,
}

impl<D: GpuDevice, L: FontLibrary> SharedRuntime<D, L> {
    pub fn new(device: D, library: L) -> Self {
        Self {
            pending: RefCell::new(Some((device, library))),
            runtime: OnceCell::new(),
        }
    }

    /// Get the runtime, building it on first call
    pub fn instance(&self) -> Result<Rc<GlyphRuntime<D, L>>> {
        if let Some(runtime) = self.runtime.get() {
            return Ok(Rc::clone(runtime));
        }

        let (device, library) = self
            .pending
            .borrow_mut()
            .take()
            .ok_or(TextError::RuntimeUnavailable)?;

        let runtime = match GlyphRuntime::new(device, library) {
            Ok(runtime) => Rc::new(runtime),
            Err(e) => {
                warn!("Glyph runtime initialization failed: {}", e);
                return Err(e);
            }
        };
        Ok(Rc::clone(self.runtime.get_or_init(|| runtime)))
    }

    pub fn is_initialized(&self) -> bool {
        self.runtime.get().is_some()
    }
}
