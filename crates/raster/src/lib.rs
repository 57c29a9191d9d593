//! CPU rasterization pipeline
//!
//! Vertex shading, homogeneous clipping, perspective-correct triangle, line
//! and point rasterization, depth testing and fragment shading, all driven
//! through a type-erased per-vertex word format ([`ShaderBuffer`]).
//!
//! ```
//! use prism_raster::{builtin_shaders, DataFormat, DrawMode, PipelineRenderer};
//! use prism_raster::{SoftwareRenderer, VertexAttribute, VertexSource};
//!
//! let mut renderer = SoftwareRenderer::with_size(4, 4);
//! let mut program = builtin_shaders::flat_program([1.0, 0.0, 0.0, 1.0]).unwrap();
//! let source = VertexSource::new()
//!     .with_attribute(VertexAttribute::from_f32(
//!         "position",
//!         DataFormat::VEC4,
//!         &[0.0, 0.0, 0.0, 1.0, 1.0, 0.0, 0.0, 1.0, 0.0, 1.0, 0.0, 1.0],
//!     ))
//!     .with_sequential_indices();
//! let stats = renderer
//!     .draw_all(&mut program, &source, DrawMode::Triangles)
//!     .unwrap();
//! assert_eq!(stats.fragments_written, 1);
//! ```

pub mod builtin_shaders;
pub mod clip;
pub mod config;
pub mod error;
pub mod format;
pub mod rasterizer;
pub mod renderer;
pub mod renderer_software;
pub mod shader;
pub mod shader_buffer;
pub mod surface;
pub mod texture;
pub mod vertex;

pub use config::{ConfigError, RenderConfig};
pub use error::{RasterError, Result};
pub use format::{DataFormat, ElementType};
pub use rasterizer::{DrawMode, DrawStats, Rasterizer};
pub use renderer::PipelineRenderer;
pub use renderer_software::SoftwareRenderer;
pub use shader::{Binding, FnShader, ShaderProgram, ShaderStage, ShaderStatus, ShaderUnit};
pub use shader_buffer::ShaderBuffer;
pub use surface::{Capability, RenderTarget, SoftwareSurface, Viewport};
pub use texture::{Filter, Sampler, Texture, Wrap};
pub use vertex::{VertexAttribute, VertexSource};
