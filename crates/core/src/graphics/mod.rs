//! Reusable graphics primitives shared by the rendering backends
//!
//! Color packing, the 16-bit depth plane and the 4×4 transform used by
//! vertex shaders.

pub mod color;
pub mod depth;
pub mod transform;

pub use color::ColorOps;
pub use depth::{DepthBuffer, DEPTH_FAR};
pub use transform::Mat4;
