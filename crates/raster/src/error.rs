//! Error type for the software pipeline
//!
//! Every variant is a programming error on the caller's side (bad formats,
//! bad indices, bad draw ranges) or an internal invariant violation. Geometry
//! that is merely degenerate or off-screen is skipped, never reported here.

use crate::format::ElementType;
use crate::shader::ShaderStage;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RasterError {
    #[error("Unsupported slot type {element:?} for a typed {accessor} accessor")]
    UnsupportedFormat {
        element: ElementType,
        accessor: &'static str,
    },
    #[error("Invalid arity {0}: formats carry 1 to 4 components")]
    InvalidArity(u8),
    #[error("Vertex shader output must start with a 4 x float position slot, found {0}")]
    InvalidVertexOutput(String),
    #[error("Fragment shader output must start with a 4 x float color slot, found {0}")]
    InvalidFragmentOutput(String),
    #[error("Expected a {expected:?} shader unit, got a {found:?} one")]
    StageMismatch {
        expected: ShaderStage,
        found: ShaderStage,
    },
    #[error("Unknown clip plane index {0}")]
    UnknownClipPlane(usize),
    #[error("Pixel write at ({x}, {y}) outside {width}x{height} surface")]
    PixelOutOfBounds {
        x: i64,
        y: i64,
        width: u32,
        height: u32,
    },
    #[error("Index {index} out of range for {vertex_count} vertices")]
    IndexOutOfRange { index: u32, vertex_count: usize },
    #[error("Attribute '{name}' holds {len} bytes, not a multiple of the {stride}-byte vertex stride")]
    AttributeSize {
        name: String,
        len: usize,
        stride: usize,
    },
    #[error("Draw range {offset}+{count} exceeds {available} indices")]
    DrawRange {
        offset: usize,
        count: usize,
        available: usize,
    },
    #[error("Shader binding '{0}' is missing or has the wrong type")]
    MissingBinding(String),
}

pub type Result<T> = std::result::Result<T, RasterError>;
