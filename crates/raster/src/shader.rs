//! Shader units and programs
//!
//! A shader unit is one programmable stage. It reads a [`ShaderBuffer`]
//! laid out by the previous stage and writes one laid out by its own
//! [`ShaderUnit::output_format`]:
//!
//! ```text
//! vertex attributes -> [vertex unit] -> clip position + varyings
//!                                           | clip, project, interpolate
//!                                           v
//!                      [fragment unit] <- interpolated varyings
//!                            |
//!                            v
//!                        RGBA color -> pixel write
//! ```
//!
//! External parameters (matrices, colors, samplers) are attached by name as
//! [`Binding`]s before a draw call and stay fixed for its duration.

use crate::error::{RasterError, Result};
use crate::format::DataFormat;
use crate::shader_buffer::ShaderBuffer;
use crate::texture::Sampler;
use prism_core::graphics::Mat4;
use prism_core::logging::{log, LogCategory, LogLevel};
use std::collections::HashMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

/// What a unit asks the pipeline to do with its output
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShaderStatus {
    /// Use the output (vertex continues down the pipeline, fragment is written)
    Emit,
    /// Drop the fragment; vertex units should not return this
    Discard,
}

/// A named external parameter
#[derive(Debug, Clone)]
pub enum Binding {
    Int(i32),
    Float(f32),
    Vec2([f32; 2]),
    Vec3([f32; 3]),
    Vec4([f32; 4]),
    Mat4(Mat4),
    Sampler(Sampler),
}

/// Name → binding table owned by a shader unit
#[derive(Debug, Clone, Default)]
pub struct Bindings {
    values: HashMap<String, Binding>,
}

impl Bindings {
    pub fn set(&mut self, name: &str, value: Binding) {
        self.values.insert(name.to_string(), value);
    }

    pub fn get(&self, name: &str) -> Option<&Binding> {
        self.values.get(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    fn missing(name: &str) -> RasterError {
        RasterError::MissingBinding(name.to_string())
    }

    pub fn int(&self, name: &str) -> Result<i32> {
        match self.get(name) {
            Some(Binding::Int(v)) => Ok(*v),
            _ => Err(Self::missing(name)),
        }
    }

    pub fn float(&self, name: &str) -> Result<f32> {
        match self.get(name) {
            Some(Binding::Float(v)) => Ok(*v),
            _ => Err(Self::missing(name)),
        }
    }

    pub fn vec2(&self, name: &str) -> Result<[f32; 2]> {
        match self.get(name) {
            Some(Binding::Vec2(v)) => Ok(*v),
            _ => Err(Self::missing(name)),
        }
    }

    pub fn vec3(&self, name: &str) -> Result<[f32; 3]> {
        match self.get(name) {
            Some(Binding::Vec3(v)) => Ok(*v),
            _ => Err(Self::missing(name)),
        }
    }

    pub fn vec4(&self, name: &str) -> Result<[f32; 4]> {
        match self.get(name) {
            Some(Binding::Vec4(v)) => Ok(*v),
            _ => Err(Self::missing(name)),
        }
    }

    pub fn mat4(&self, name: &str) -> Result<Mat4> {
        match self.get(name) {
            Some(Binding::Mat4(m)) => Ok(*m),
            _ => Err(Self::missing(name)),
        }
    }

    pub fn sampler(&self, name: &str) -> Result<&Sampler> {
        match self.get(name) {
            Some(Binding::Sampler(s)) => Ok(s),
            _ => Err(Self::missing(name)),
        }
    }
}

/// One programmable pipeline stage
pub trait ShaderUnit: Send {
    fn stage(&self) -> ShaderStage;

    /// Slot layout of the buffer `execute` writes
    fn output_format(&self) -> &[DataFormat];

    /// Attach or replace a named binding
    fn bind(&mut self, name: &str, value: Binding);

    /// Run once for one vertex or fragment
    ///
    /// `input` is flipped and ready to read; `output` is cleared and ready to
    /// write.
    fn execute(&mut self, input: &mut ShaderBuffer, output: &mut ShaderBuffer)
        -> Result<ShaderStatus>;
}

type ShaderFn =
    dyn FnMut(&Bindings, &mut ShaderBuffer, &mut ShaderBuffer) -> Result<ShaderStatus> + Send;

/// Shader unit backed by a closure
///
/// ```
/// use prism_raster::format::DataFormat;
/// use prism_raster::shader::{FnShader, ShaderStatus};
///
/// let red = FnShader::fragment(vec![DataFormat::VEC4], |_, _input, output| {
///     output.write_vec4([1.0, 0.0, 0.0, 1.0])?;
///     Ok(ShaderStatus::Emit)
/// });
/// ```
pub struct FnShader {
    stage: ShaderStage,
    output_format: Vec<DataFormat>,
    bindings: Bindings,
    body: Box<ShaderFn>,
}

impl FnShader {
    pub fn new<F>(stage: ShaderStage, output_format: Vec<DataFormat>, body: F) -> Self
    where
        F: FnMut(&Bindings, &mut ShaderBuffer, &mut ShaderBuffer) -> Result<ShaderStatus>
            + Send
            + 'static,
    {
        Self {
            stage,
            output_format,
            bindings: Bindings::default(),
            body: Box::new(body),
        }
    }

    pub fn vertex<F>(output_format: Vec<DataFormat>, body: F) -> Self
    where
        F: FnMut(&Bindings, &mut ShaderBuffer, &mut ShaderBuffer) -> Result<ShaderStatus>
            + Send
            + 'static,
    {
        Self::new(ShaderStage::Vertex, output_format, body)
    }

    pub fn fragment<F>(output_format: Vec<DataFormat>, body: F) -> Self
    where
        F: FnMut(&Bindings, &mut ShaderBuffer, &mut ShaderBuffer) -> Result<ShaderStatus>
            + Send
            + 'static,
    {
        Self::new(ShaderStage::Fragment, output_format, body)
    }

    pub fn bindings(&self) -> &Bindings {
        &self.bindings
    }
}

impl fmt::Debug for FnShader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnShader")
            .field("stage", &self.stage)
            .field("output_format", &self.output_format)
            .field("bindings", &self.bindings.len())
            .finish()
    }
}

impl ShaderUnit for FnShader {
    fn stage(&self) -> ShaderStage {
        self.stage
    }

    fn output_format(&self) -> &[DataFormat] {
        &self.output_format
    }

    fn bind(&mut self, name: &str, value: Binding) {
        self.bindings.set(name, value);
    }

    fn execute(
        &mut self,
        input: &mut ShaderBuffer,
        output: &mut ShaderBuffer,
    ) -> Result<ShaderStatus> {
        (self.body)(&self.bindings, input, output)
    }
}

/// A validated vertex + fragment pair
pub struct ShaderProgram {
    vertex: Box<dyn ShaderUnit>,
    fragment: Box<dyn ShaderUnit>,
}

impl ShaderProgram {
    /// Pair two units, checking their stages and that both outputs start with
    /// a `4 x Float` slot (clip position and RGBA color respectively)
    pub fn new(vertex: Box<dyn ShaderUnit>, fragment: Box<dyn ShaderUnit>) -> Result<Self> {
        if vertex.stage() != ShaderStage::Vertex {
            return Err(RasterError::StageMismatch {
                expected: ShaderStage::Vertex,
                found: vertex.stage(),
            });
        }
        if fragment.stage() != ShaderStage::Fragment {
            return Err(RasterError::StageMismatch {
                expected: ShaderStage::Fragment,
                found: fragment.stage(),
            });
        }
        match vertex.output_format().first() {
            Some(&DataFormat::VEC4) => {}
            other => return Err(RasterError::InvalidVertexOutput(describe(other))),
        }
        match fragment.output_format().first() {
            Some(&DataFormat::VEC4) => {}
            other => return Err(RasterError::InvalidFragmentOutput(describe(other))),
        }

        log(LogCategory::Shader, LogLevel::Debug, || {
            format!(
                "linked program: varyings {:?}, fragment outputs {:?}",
                vertex.output_format(),
                fragment.output_format()
            )
        });
        Ok(Self { vertex, fragment })
    }

    pub fn vertex(&self) -> &dyn ShaderUnit {
        self.vertex.as_ref()
    }

    pub fn fragment(&self) -> &dyn ShaderUnit {
        self.fragment.as_ref()
    }

    pub fn vertex_mut(&mut self) -> &mut dyn ShaderUnit {
        self.vertex.as_mut()
    }

    pub fn fragment_mut(&mut self) -> &mut dyn ShaderUnit {
        self.fragment.as_mut()
    }

    /// Both units at once, for the rasterizer's inner loops
    pub(crate) fn units_mut(&mut self) -> (&mut dyn ShaderUnit, &mut dyn ShaderUnit) {
        (self.vertex.as_mut(), self.fragment.as_mut())
    }

    /// Bind the same value on both stages
    pub fn bind(&mut self, name: &str, value: Binding) {
        self.vertex.bind(name, value.clone());
        self.fragment.bind(name, value);
    }
}

impl fmt::Debug for ShaderProgram {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShaderProgram")
            .field("varyings", &self.vertex.output_format())
            .field("outputs", &self.fragment.output_format())
            .finish()
    }
}

fn describe(format: Option<&DataFormat>) -> String {
    match format {
        Some(format) => format.to_string(),
        None => "no slots".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::ElementType;

    fn emit_vertex(formats: Vec<DataFormat>) -> Box<dyn ShaderUnit> {
        Box::new(FnShader::vertex(formats, |_, _, _| Ok(ShaderStatus::Emit)))
    }

    fn emit_fragment(formats: Vec<DataFormat>) -> Box<dyn ShaderUnit> {
        Box::new(FnShader::fragment(formats, |_, _, _| Ok(ShaderStatus::Emit)))
    }

    #[test]
    fn test_program_accepts_position_first() {
        let program = ShaderProgram::new(
            emit_vertex(vec![DataFormat::VEC4, DataFormat::VEC2]),
            emit_fragment(vec![DataFormat::VEC4]),
        );
        assert!(program.is_ok());
    }

    #[test]
    fn test_program_rejects_bad_position_slot() {
        let err = ShaderProgram::new(
            emit_vertex(vec![DataFormat::VEC3, DataFormat::VEC4]),
            emit_fragment(vec![DataFormat::VEC4]),
        )
        .unwrap_err();
        assert_eq!(err, RasterError::InvalidVertexOutput("3 x Float".to_string()));

        let err = ShaderProgram::new(emit_vertex(vec![]), emit_fragment(vec![DataFormat::VEC4]))
            .unwrap_err();
        assert_eq!(err, RasterError::InvalidVertexOutput("no slots".to_string()));

        let int_position = ShaderProgram::new(
            emit_vertex(vec![DataFormat::IVEC4]),
            emit_fragment(vec![DataFormat::VEC4]),
        );
        assert!(matches!(
            int_position,
            Err(RasterError::InvalidVertexOutput(_))
        ));
    }

    #[test]
    fn test_program_rejects_bad_color_slot() {
        let double = DataFormat::new(ElementType::Double, 4).unwrap();
        let err = ShaderProgram::new(
            emit_vertex(vec![DataFormat::VEC4]),
            emit_fragment(vec![double]),
        )
        .unwrap_err();
        assert!(matches!(err, RasterError::InvalidFragmentOutput(_)));
    }

    #[test]
    fn test_program_rejects_swapped_stages() {
        let err = ShaderProgram::new(
            emit_fragment(vec![DataFormat::VEC4]),
            emit_vertex(vec![DataFormat::VEC4]),
        )
        .unwrap_err();
        assert_eq!(
            err,
            RasterError::StageMismatch {
                expected: ShaderStage::Vertex,
                found: ShaderStage::Fragment
            }
        );
    }

    #[test]
    fn test_bindings_are_visible_to_the_body() {
        let mut unit = FnShader::fragment(vec![DataFormat::VEC4], |bindings, _, output| {
            let tint = bindings.vec4("tint")?;
            let alpha = bindings.float("alpha")?;
            output.write_vec4([tint[0], tint[1], tint[2], alpha])?;
            Ok(ShaderStatus::Emit)
        });
        let mut input = ShaderBuffer::new(&[DataFormat::VEC4]);
        let mut output = ShaderBuffer::new(&[DataFormat::VEC4]);

        let missing = unit.execute(&mut input, &mut output);
        assert_eq!(missing, Err(RasterError::MissingBinding("tint".to_string())));

        unit.bind("tint", Binding::Vec4([0.25, 0.5, 0.75, 1.0]));
        unit.bind("alpha", Binding::Float(0.5));
        output.clear();
        assert_eq!(unit.execute(&mut input, &mut output), Ok(ShaderStatus::Emit));
        output.flip();
        assert_eq!(output.read_vec4().unwrap(), [0.25, 0.5, 0.75, 0.5]);
    }

    #[test]
    fn test_binding_type_mismatch_is_missing() {
        let mut bindings = Bindings::default();
        bindings.set("mvp", Binding::Float(1.0));
        assert!(bindings.mat4("mvp").is_err());
        bindings.set("mvp", Binding::Mat4(Mat4::IDENTITY));
        assert_eq!(bindings.mat4("mvp"), Ok(Mat4::IDENTITY));
        assert_eq!(bindings.len(), 1);
    }

    #[test]
    fn test_vector_bindings() {
        let mut bindings = Bindings::default();
        bindings.set("offset", Binding::Vec2([0.5, -0.25]));
        bindings.set("light", Binding::Vec3([0.0, 1.0, 0.0]));
        assert_eq!(bindings.vec2("offset"), Ok([0.5, -0.25]));
        assert_eq!(bindings.vec3("light"), Ok([0.0, 1.0, 0.0]));
        assert!(bindings.vec2("light").is_err());
        assert!(bindings.vec3("offset").is_err());
    }

    #[test]
    fn test_program_bind_reaches_both_stages() {
        let vertex = FnShader::vertex(vec![DataFormat::VEC4], |b, _, _| {
            b.int("frame")?;
            Ok(ShaderStatus::Emit)
        });
        let fragment = FnShader::fragment(vec![DataFormat::VEC4], |b, _, _| {
            b.int("frame")?;
            Ok(ShaderStatus::Emit)
        });
        let mut program = ShaderProgram::new(Box::new(vertex), Box::new(fragment)).unwrap();
        program.bind("frame", Binding::Int(3));

        let mut input = ShaderBuffer::new(&[DataFormat::VEC4]);
        let mut output = ShaderBuffer::new(&[DataFormat::VEC4]);
        let (vertex, fragment) = program.units_mut();
        assert!(vertex.execute(&mut input, &mut output).is_ok());
        assert!(fragment.execute(&mut input, &mut output).is_ok());
    }
}
