//! Backend-neutral renderer trait
//!
//! Every rendering backend (the CPU rasterizer in `prism_raster`, or a
//! GPU-backed one living outside this workspace) exposes its output through
//! the same surface-level interface:
//!
//! ```text
//! caller (scene, draw calls) -> pipeline trait -> {Software, Hardware} backends
//!                                      |
//!                                      +-- Renderer (frame access, clear, resize)
//! ```
//!
//! Draw-call entry points depend on the shader and vertex types of a
//! particular pipeline, so they live in an extension trait next to those
//! types (`prism_raster::PipelineRenderer`). This trait only covers what a
//! presenter needs: read the finished frame, clear, resize.

use crate::types::Frame;

/// Output side of a rendering backend
pub trait Renderer: Send {
    /// Get the current color plane
    fn get_frame(&self) -> &Frame;

    /// Clear color (ARGB8888) and depth planes
    fn clear(&mut self, color: u32);

    /// Restore the backend to its freshly constructed state
    fn reset(&mut self);

    /// Human-readable backend name, e.g. "Software Rasterizer"
    fn name(&self) -> &str;

    /// Whether rasterization runs on a GPU
    fn is_hardware_accelerated(&self) -> bool {
        false
    }

    /// Recreate resolution-dependent planes
    fn resize(&mut self, width: u32, height: u32);
}
