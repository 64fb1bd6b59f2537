//! Shader management
//!
//! GLSL ES 3.00 program for drawing cached glyph quads

use log::info;

use super::device::GpuDevice;
use crate::constants::{ATLAS_TEXTURE_UNIT, ATTRIB_POSITION, ATTRIB_TEXCOORD};
use crate::error::{Result, TextError};

/// Glyph vertex shader (GLSL ES 3.00)
///
/// Input:
///   a_pos: Quad-local vertex position (pixels)
///   a_uv:  Atlas texture coordinates
/// Uniform:
///   u_scale:    Display size (pixels)
///   u_position: Quad origin on screen (pixels, bottom-left origin)
const GLYPH_VERTEX_SHADER: &str = r#"#version 300 es
precision highp float;

in vec2 a_pos;
in vec2 a_uv;

uniform ivec2 u_scale;
uniform ivec2 u_position;

out vec2 v_uv;

void main() {
    vec2 pixel = a_pos + vec2(u_position);
    gl_Position = vec4(pixel / vec2(u_scale) * 2.0 - 1.0, 0.0, 1.0);
    v_uv = a_uv;
}
"#;

/// Glyph fragment shader
///
/// Atlas R channel is coverage; output is premultiplied alpha.
const GLYPH_FRAGMENT_SHADER: &str = r#"#version 300 es
precision mediump float;

in vec2 v_uv;

uniform sampler2D u_atlas;
uniform vec3 u_color;

out vec4 frag_color;

void main() {
    float coverage = texture(u_atlas, v_uv).r;
    frag_color = vec4(u_color * coverage, coverage);
}
"#;

type Uniforms<D> = (
    <D as GpuDevice>::Uniform,
    <D as GpuDevice>::Uniform,
    <D as GpuDevice>::Uniform,
    <D as GpuDevice>::Uniform,
);

/// u_scale, u_position, u_color, u_atlas
fn lookup_uniforms<D: GpuDevice>(device: &D, program: D::Program) -> Result<Uniforms<D>> {
    let uniform = |name: &str| {
        device
            .uniform_location(program, name)
            .ok_or_else(|| TextError::Gpu(format!("{} uniform not found", name)))
    };
    Ok((
        uniform("u_scale")?,
        uniform("u_position")?,
        uniform("u_color")?,
        uniform("u_atlas")?,
    ))
}

/// Compiled glyph program and its uniform locations
pub struct GlyphProgram<D: GpuDevice> {
    program: D::Program,
    u_scale: D::Uniform,
    u_position: D::Uniform,
    u_color: D::Uniform,
}

impl<D: GpuDevice> GlyphProgram<D> {
    /// Compile and link the glyph program
    pub fn new(device: &D) -> Result<Self> {
        let program = device.create_program(
            GLYPH_VERTEX_SHADER,
            GLYPH_FRAGMENT_SHADER,
            &[(ATTRIB_POSITION, "a_pos"), (ATTRIB_TEXCOORD, "a_uv")],
        )?;

        let (u_scale, u_position, u_color, u_atlas) = match lookup_uniforms(device, program) {
            Ok(u) => u,
            Err(e) => {
                device.delete_program(program);
                return Err(e);
            }
        };

        // Sampler never changes
        device.use_program(Some(program));
        device.uniform_1_i32(&u_atlas, ATLAS_TEXTURE_UNIT as i32);
        device.use_program(None);

        info!("Glyph shader compiled");
        Ok(Self {
            program,
            u_scale,
            u_position,
            u_color,
        })
    }

    /// Activate shader
    pub fn bind(&self, device: &D) {
        device.use_program(Some(self.program));
    }

    /// Display size used to map pixels to clip space
    pub fn set_scale(&self, device: &D, width: i32, height: i32) {
        device.uniform_2_i32(&self.u_scale, width, height);
    }

    /// Screen position of the current quad's origin
    pub fn set_position(&self, device: &D, x: i32, y: i32) {
        device.uniform_2_i32(&self.u_position, x, y);
    }

    pub fn set_color(&self, device: &D, color: [f32; 3]) {
        device.uniform_3_f32(&self.u_color, color[0], color[1], color[2]);
    }

    /// Release resources
    pub fn destroy(&self, device: &D) {
        device.delete_program(self.program);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{GpuCall, RecordingDevice};

    #[test]
    fn test_attribute_bindings() {
        let device = RecordingDevice::new();
        let program = GlyphProgram::new(&device).unwrap();
        assert_eq!(
            device.calls()[0],
            GpuCall::CreateProgram {
                attributes: vec![(0, "a_pos".to_string()), (1, "a_uv".to_string())],
            }
        );
        assert!(device.calls().contains(&GpuCall::Uniform1i {
            name: "u_atlas".to_string(),
            value: 0,
        }));
        program.destroy(&device);
        assert_eq!(device.live_objects(), 0);
    }

    #[test]
    fn test_link_failure() {
        let device = RecordingDevice::new();
        device.fail_program(true);
        assert!(matches!(GlyphProgram::new(&device), Err(TextError::Gpu(_))));
        assert_eq!(device.live_objects(), 0);
    }

    #[test]
    fn test_shader_sources() {
        assert!(GLYPH_VERTEX_SHADER.starts_with("#version 300 es"));
        assert!(GLYPH_FRAGMENT_SHADER.contains("u_color * coverage"));
    }
}
