//! GPU context management
//!
//! Headless EGL + OpenGL ES setup for offscreen rendering

use anyhow::{anyhow, Context, Result};
use glow::HasContext;
use khronos_egl as egl;
use log::{info, warn};
use std::ffi::c_void;

// EGL_PLATFORM_SURFACELESS_MESA (EGL extension)
const EGL_PLATFORM_SURFACELESS_MESA: egl::Enum = 0x31DD;

/// EGL instance type (dynamic loading)
type EglInstance = egl::Instance<egl::Dynamic<libloading::Library, egl::EGL1_5>>;

/// EGL context with an optional pbuffer surface
///
/// Rendering is expected to go to an FBO; the pbuffer only exists to give the
/// context something to be current on where surfaceless contexts are not
/// supported.
pub struct HeadlessContext {
    instance: EglInstance,
    display: egl::Display,
    context: egl::Context,
    surface: Option<egl::Surface>,
}

impl HeadlessContext {
    /// Create an OpenGL ES 3 context and make it current
    pub fn new(width: u32, height: u32) -> Result<Self> {
        // Load EGL library
        let lib = unsafe {
            libloading::Library::new("libEGL.so.1")
                .or_else(|_| libloading::Library::new("libEGL.so"))
                .context("Failed to load EGL library")?
        };

        let instance: EglInstance = unsafe {
            egl::DynamicInstance::<egl::EGL1_5>::load_required_from(lib)
                .context("Failed to create EGL instance")?
        };

        let display = Self::open_display(&instance)?;

        instance
            .initialize(display)
            .context("Failed to initialize EGL")?;

        if let Ok(version_str) = instance.query_string(Some(display), egl::VERSION) {
            info!("EGL version: {}", version_str.to_string_lossy());
        }

        instance
            .bind_api(egl::OPENGL_ES_API)
            .context("Failed to bind OpenGL ES API")?;

        let config = Self::choose_config(&instance, display, egl::PBUFFER_BIT)
            .or_else(|_| Self::choose_config(&instance, display, 0))
            .context("Failed to choose EGL config")?;

        let context_attribs = [egl::CONTEXT_CLIENT_VERSION, 3, egl::NONE];
        let context = instance
            .create_context(display, config, None, &context_attribs)
            .context("Failed to create EGL context")?;

        let pbuffer_attribs = [
            egl::WIDTH,
            width as egl::Int,
            egl::HEIGHT,
            height as egl::Int,
            egl::NONE,
        ];
        let surface = match instance.create_pbuffer_surface(display, config, &pbuffer_attribs) {
            Ok(s) => Some(s),
            Err(e) => {
                warn!("pbuffer unavailable ({}), using surfaceless context", e);
                None
            }
        };

        instance
            .make_current(display, surface, surface, Some(context))
            .context("Failed to make EGL context current")?;

        info!("Headless EGL context created ({}x{})", width, height);

        Ok(Self {
            instance,
            display,
            context,
            surface,
        })
    }

    /// Surfaceless platform first, then the default display
    fn open_display(instance: &EglInstance) -> Result<egl::Display> {
        let surfaceless = unsafe {
            instance.get_platform_display(
                EGL_PLATFORM_SURFACELESS_MESA,
                std::ptr::null_mut(),
                &[egl::ATTRIB_NONE],
            )
        };
        if let Ok(display) = surfaceless {
            return Ok(display);
        }

        unsafe { instance.get_display(egl::DEFAULT_DISPLAY) }
            .ok_or_else(|| anyhow!("Failed to get EGL display"))
    }

    /// Choose an RGBA8 ES3 config
    fn choose_config(
        instance: &EglInstance,
        display: egl::Display,
        surface_type: egl::Int,
    ) -> Result<egl::Config> {
        let config_attribs = [
            egl::SURFACE_TYPE,
            surface_type,
            egl::RED_SIZE,
            8,
            egl::GREEN_SIZE,
            8,
            egl::BLUE_SIZE,
            8,
            egl::ALPHA_SIZE,
            8,
            egl::RENDERABLE_TYPE,
            egl::OPENGL_ES3_BIT,
            egl::NONE,
        ];

        instance
            .choose_first_config(display, &config_attribs)
            .context("choose_first_config failed")?
            .ok_or_else(|| anyhow!("No suitable EGL config found"))
    }

    /// Load GL function pointers
    pub fn get_proc_address(&self, name: &str) -> *const c_void {
        self.instance
            .get_proc_address(name)
            .map(|f| f as *const c_void)
            .unwrap_or(std::ptr::null())
    }

    /// Create a glow context bound to this EGL context
    pub fn load_gl(&self) -> glow::Context {
        let gl = unsafe { glow::Context::from_loader_function(|name| self.get_proc_address(name)) };

        unsafe {
            info!("OpenGL ES: {}", gl.get_parameter_string(glow::VERSION));
            info!("Renderer: {}", gl.get_parameter_string(glow::RENDERER));
        }

        gl
    }
}

impl Drop for HeadlessContext {
    fn drop(&mut self) {
        let _ = self.instance.make_current(self.display, None, None, None);
        if let Some(surface) = self.surface {
            let _ = self.instance.destroy_surface(self.display, surface);
        }
        let _ = self.instance.destroy_context(self.display, self.context);
        let _ = self.instance.terminate(self.display);
    }
}
