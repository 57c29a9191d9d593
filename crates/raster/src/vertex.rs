//! Vertex attribute data and its conversion into shader input words
//!
//! Callers hand over packed little-endian attribute arrays, one per named
//! attribute, plus a `u32` index buffer. Before a draw the arrays are
//! unpacked once into an interleaved word array laid out exactly like the
//! vertex shader's input [`ShaderBuffer`], so fetching a vertex is a single
//! slice copy:
//!
//! | element | stored as                          |
//! |---------|------------------------------------|
//! | Float   | `f32` bits                         |
//! | Int     | `i32` bits                         |
//! | Byte    | sign-extended `i32`, int slot      |
//! | Short   | sign-extended `i32`, int slot      |
//! | Double  | narrowed to `f32`, float slot      |

use crate::error::{RasterError, Result};
use crate::format::{DataFormat, ElementType};
use crate::shader_buffer::ShaderBuffer;
use prism_core::logging::{log, LogCategory, LogLevel};

/// One named attribute array
#[derive(Debug, Clone, PartialEq)]
pub struct VertexAttribute {
    name: String,
    format: DataFormat,
    data: Vec<u8>,
}

impl VertexAttribute {
    pub fn new(name: &str, format: DataFormat, data: Vec<u8>) -> Self {
        Self {
            name: name.to_string(),
            format,
            data,
        }
    }

    /// Float attribute from unpacked values, `format.arity()` per vertex
    pub fn from_f32(name: &str, format: DataFormat, values: &[f32]) -> Self {
        let data = values.iter().flat_map(|v| v.to_le_bytes()).collect();
        Self::new(name, format, data)
    }

    pub fn from_i32(name: &str, format: DataFormat, values: &[i32]) -> Self {
        let data = values.iter().flat_map(|v| v.to_le_bytes()).collect();
        Self::new(name, format, data)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn format(&self) -> DataFormat {
        self.format
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Number of whole vertices in the array
    pub fn vertex_count(&self) -> usize {
        self.data.len() / self.format.byte_size()
    }

    pub fn validate(&self) -> Result<()> {
        let stride = self.format.byte_size();
        if self.data.len() % stride != 0 {
            return Err(RasterError::AttributeSize {
                name: self.name.clone(),
                len: self.data.len(),
                stride,
            });
        }
        Ok(())
    }

    /// Unpack vertex `vertex` into `out`, one word per component
    fn unpack_into(&self, vertex: usize, out: &mut [u32]) {
        let width = self.format.element().width();
        let start = vertex * self.format.byte_size();
        for (i, word) in out.iter_mut().enumerate() {
            let at = start + i * width;
            *word = decode(self.format.element(), &self.data[at..at + width]);
        }
    }
}

#[inline]
fn decode(element: ElementType, bytes: &[u8]) -> u32 {
    match element {
        ElementType::Float | ElementType::Int => {
            u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
        }
        ElementType::Byte => bytes[0] as i8 as i32 as u32,
        ElementType::Short => i16::from_le_bytes([bytes[0], bytes[1]]) as i32 as u32,
        ElementType::Double => {
            let mut raw = [0u8; 8];
            raw.copy_from_slice(&bytes[..8]);
            (f64::from_le_bytes(raw) as f32).to_bits()
        }
    }
}

/// Attribute arrays plus the index buffer for a draw
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VertexSource {
    attributes: Vec<VertexAttribute>,
    indices: Vec<u32>,
}

impl VertexSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_attribute(mut self, attribute: VertexAttribute) -> Self {
        self.attributes.push(attribute);
        self
    }

    pub fn with_indices(mut self, indices: Vec<u32>) -> Self {
        self.indices = indices;
        self
    }

    /// Index buffer `0..vertex_count`
    pub fn with_sequential_indices(mut self) -> Self {
        self.indices = (0..self.vertex_count() as u32).collect();
        self
    }

    pub fn push_attribute(&mut self, attribute: VertexAttribute) {
        self.attributes.push(attribute);
    }

    pub fn set_indices(&mut self, indices: Vec<u32>) {
        self.indices = indices;
    }

    pub fn attributes(&self) -> &[VertexAttribute] {
        &self.attributes
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    /// Vertices addressable by an index: the shortest attribute array
    pub fn vertex_count(&self) -> usize {
        self.attributes
            .iter()
            .map(VertexAttribute::vertex_count)
            .min()
            .unwrap_or(0)
    }

    /// Vertex shader input layout, in attribute order
    pub fn input_formats(&self) -> Vec<DataFormat> {
        self.attributes.iter().map(|a| a.format().internal()).collect()
    }

    /// Indices `offset..offset + count`, checked against the buffer length
    pub fn index_range(&self, offset: usize, count: usize) -> Result<&[u32]> {
        let end = offset
            .checked_add(count)
            .filter(|&end| end <= self.indices.len())
            .ok_or(RasterError::DrawRange {
                offset,
                count,
                available: self.indices.len(),
            })?;
        Ok(&self.indices[offset..end])
    }
}

/// Attribute arrays unpacked into interleaved shader input words
///
/// Owned by the rasterizer and refilled per draw; its allocation is reused.
#[derive(Debug, Clone, Default)]
pub struct VertexWords {
    words: Vec<u32>,
    stride: usize,
    vertex_count: usize,
}

impl VertexWords {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and unpack every attribute of `source`
    pub fn load(&mut self, source: &VertexSource) -> Result<()> {
        for attribute in source.attributes() {
            attribute.validate()?;
        }
        let counts = source.attributes().iter().map(VertexAttribute::vertex_count);
        if counts.clone().min() != counts.max() {
            log(LogCategory::Pipeline, LogLevel::Warn, || {
                format!(
                    "attribute arrays differ in length, using the shortest ({} vertices)",
                    source.vertex_count()
                )
            });
        }

        self.vertex_count = source.vertex_count();
        self.stride = source.attributes().iter().map(|a| a.format().arity()).sum();
        self.words.clear();
        self.words.resize(self.vertex_count * self.stride, 0);

        for vertex in 0..self.vertex_count {
            let mut at = vertex * self.stride;
            for attribute in source.attributes() {
                let arity = attribute.format().arity();
                attribute.unpack_into(vertex, &mut self.words[at..at + arity]);
                at += arity;
            }
        }
        Ok(())
    }

    pub fn vertex_count(&self) -> usize {
        self.vertex_count
    }

    /// Copy vertex `index` into a shader input buffer and rewind it
    #[inline]
    pub fn fetch(&self, index: u32, input: &mut ShaderBuffer) -> Result<()> {
        let i = index as usize;
        if i >= self.vertex_count {
            return Err(RasterError::IndexOutOfRange {
                index,
                vertex_count: self.vertex_count,
            });
        }
        let start = i * self.stride;
        input
            .words_mut()
            .copy_from_slice(&self.words[start..start + self.stride]);
        input.flip();
        Ok(())
    }
}
