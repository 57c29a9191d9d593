//! Ready-made shader units for common cases
//!
//! Vertex units read a position from the first input slot (a 3-component
//! position gets `w = 1`) and copy every remaining input word through to
//! their varyings unchanged, so the varying layout is whatever attributes
//! follow the position.

use crate::error::Result;
use crate::format::DataFormat;
use crate::shader::{FnShader, ShaderProgram, ShaderStatus};
use crate::shader_buffer::ShaderBuffer;

/// Binding read by [`transform_vertex`]
pub const MVP: &str = "mvp";
/// Binding read by [`textured_fragment`]
pub const TEXTURE: &str = "texture";

/// Read a position slot as homogeneous coordinates
fn read_position(input: &mut ShaderBuffer) -> Result<[f32; 4]> {
    let arity = input.current_format().map_or(0, |f| f.arity());
    let mut p = input.read_vec4()?;
    if arity < 4 {
        p[3] = 1.0;
    }
    Ok(p)
}

/// Copy the rest of `input` into the rest of `output` word for word
fn forward_varyings(input: &mut ShaderBuffer, output: &mut ShaderBuffer) {
    for _ in 4..output.len() {
        output.write_raw(input.read_raw());
    }
}

fn with_position(varyings: &[DataFormat]) -> Vec<DataFormat> {
    std::iter::once(DataFormat::VEC4)
        .chain(varyings.iter().map(DataFormat::internal))
        .collect()
}

/// Position is already in clip space
pub fn passthrough_vertex(varyings: &[DataFormat]) -> FnShader {
    FnShader::vertex(with_position(varyings), |_, input, output| {
        let p = read_position(input)?;
        output.write_vec4(p)?;
        forward_varyings(input, output);
        Ok(ShaderStatus::Emit)
    })
}

/// Position is multiplied by the `mvp` matrix binding
pub fn transform_vertex(varyings: &[DataFormat]) -> FnShader {
    FnShader::vertex(with_position(varyings), |bindings, input, output| {
        let mvp = bindings.mat4(MVP)?;
        let p = read_position(input)?;
        output.write_vec4(mvp.transform(p))?;
        forward_varyings(input, output);
        Ok(ShaderStatus::Emit)
    })
}

pub fn constant_fragment(color: [f32; 4]) -> FnShader {
    FnShader::fragment(vec![DataFormat::VEC4], move |_, _, output| {
        output.write_vec4(color)?;
        Ok(ShaderStatus::Emit)
    })
}

/// Color from the first varying; a 3-component color gets alpha 1
pub fn varying_color_fragment() -> FnShader {
    FnShader::fragment(vec![DataFormat::VEC4], |_, input, output| {
        input.advance();
        let color = read_position(input)?;
        output.write_vec4(color)?;
        Ok(ShaderStatus::Emit)
    })
}

/// Samples the `texture` binding at the first varying (`uv`); fully
/// transparent texels are discarded
pub fn textured_fragment() -> FnShader {
    FnShader::fragment(vec![DataFormat::VEC4], |bindings, input, output| {
        input.advance();
        let uv = input.read_vec2()?;
        let texel = bindings.sampler(TEXTURE)?.sample(uv);
        if texel[3] == 0.0 {
            return Ok(ShaderStatus::Discard);
        }
        output.write_vec4(texel)?;
        Ok(ShaderStatus::Emit)
    })
}

/// Clip-space positions, one constant color
pub fn flat_program(color: [f32; 4]) -> Result<ShaderProgram> {
    ShaderProgram::new(
        Box::new(passthrough_vertex(&[])),
        Box::new(constant_fragment(color)),
    )
}

/// `mvp`-transformed positions with a per-vertex color attribute
pub fn vertex_color_program(color_format: DataFormat) -> Result<ShaderProgram> {
    ShaderProgram::new(
        Box::new(transform_vertex(&[color_format])),
        Box::new(varying_color_fragment()),
    )
}

/// `mvp`-transformed positions with a `uv` attribute sampling `texture`
pub fn textured_program() -> Result<ShaderProgram> {
    ShaderProgram::new(
        Box::new(transform_vertex(&[DataFormat::VEC2])),
        Box::new(textured_fragment()),
    )
}
